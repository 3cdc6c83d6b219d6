// document.rs
use chrono::{DateTime, Utc};
use flow::{PendingUpload, UploadedArtifact};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Documento recibido en una petición, pendiente de subir.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentBlob {
  pub name: String,
  pub doc_type: String,
  /// Contenido binario; en JSON viaja como base64.
  #[serde(with = "base64_bytes")]
  pub content: Vec<u8>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content_type: Option<String>,
}

impl DocumentBlob {
  pub fn as_upload(&self) -> PendingUpload<'_> {
    PendingUpload { name: &self.name,
                    doc_type: &self.doc_type,
                    content: &self.content,
                    content_type: self.content_type.as_deref() }
  }
}

/// Fila de metadatos de un documento ya subido.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
  pub id: Uuid,
  pub name: String,
  pub storage_key: String,
  pub content_type: String,
  pub doc_type: String,
  pub created_at: DateTime<Utc>,
}

impl From<&UploadedArtifact> for DocumentRecord {
  fn from(a: &UploadedArtifact) -> Self {
    Self { id: Uuid::new_v4(),
           name: a.name.clone(),
           storage_key: a.storage_key.clone(),
           content_type: a.content_type.clone(),
           doc_type: a.doc_type.clone(),
           created_at: Utc::now() }
  }
}

/// Entidad a la que se vincula un documento.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DocumentOwner {
  Person(Uuid),
  Client(Uuid),
  Insurance(Uuid),
  Application(Uuid),
}

impl DocumentOwner {
  pub fn kind(&self) -> &'static str {
    match self {
      DocumentOwner::Person(_) => "person",
      DocumentOwner::Client(_) => "client",
      DocumentOwner::Insurance(_) => "insurance",
      DocumentOwner::Application(_) => "application",
    }
  }

  pub fn id(&self) -> Uuid {
    match self {
      DocumentOwner::Person(id)
      | DocumentOwner::Client(id)
      | DocumentOwner::Insurance(id)
      | DocumentOwner::Application(id) => *id,
    }
  }
}

/// (De)serialización de bytes como base64 estándar.
pub mod base64_bytes {
  use base64::engine::general_purpose::STANDARD;
  use base64::Engine as _;
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let s = String::deserialize(deserializer)?;
    STANDARD.decode(s.as_bytes()).map_err(serde::de::Error::custom)
  }
}
