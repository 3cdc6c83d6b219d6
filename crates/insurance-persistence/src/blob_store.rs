// blob_store.rs
//
// Object store sobre un directorio local: un fichero por key. La escritura
// pasa por un fichero temporal y un rename para que una key visible esté
// siempre completa.
use flow::{BlobStore, FlowError};
use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FsBlobStore {
  root: PathBuf,
}

impl FsBlobStore {
  pub fn new(root: impl Into<PathBuf>) -> Result<Self, FlowError> {
    let root = root.into();
    fs::create_dir_all(&root).map_err(|e| FlowError::Storage(format!("{}: {}", root.display(), e)))?;
    Ok(Self { root })
  }

  /// Directorio de `WORKFLOW_BLOB_DIR`, o `./blobs` si no está definida.
  pub fn from_env() -> Result<Self, FlowError> {
    dotenvy::dotenv().ok();
    let dir = std::env::var("WORKFLOW_BLOB_DIR").unwrap_or_else(|_| "blobs".into());
    Self::new(dir)
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn contains(&self, key: &str) -> bool {
    self.path_for(key).map(|p| p.is_file()).unwrap_or(false)
  }

  pub fn read(&self, key: &str) -> Result<Vec<u8>, FlowError> {
    let path = self.path_for(key)?;
    fs::read(&path).map_err(|e| blob_err(key, e))
  }

  // Las keys son nombres planos: nada de separadores ni rutas relativas.
  fn path_for(&self, key: &str) -> Result<PathBuf, FlowError> {
    if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
      return Err(FlowError::Blob { key: key.to_string(), message: "key inválida".into() });
    }
    Ok(self.root.join(key))
  }
}

fn blob_err(key: &str, e: std::io::Error) -> FlowError {
  FlowError::Blob { key: key.to_string(), message: e.to_string() }
}

impl BlobStore for FsBlobStore {
  fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> flow::Result<()> {
    let path = self.path_for(key)?;
    let tmp = self.root.join(format!(".{}.part", key));
    fs::write(&tmp, bytes).map_err(|e| blob_err(key, e))?;
    if let Err(e) = fs::rename(&tmp, &path) {
      let _ = fs::remove_file(&tmp);
      return Err(blob_err(key, e));
    }
    debug!("blob {} guardado ({} bytes, {})", key, bytes.len(), content_type);
    Ok(())
  }

  fn delete(&self, key: &str) -> flow::Result<()> {
    let path = self.path_for(key)?;
    match fs::remove_file(&path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(blob_err(key, e)),
    }
  }
}
