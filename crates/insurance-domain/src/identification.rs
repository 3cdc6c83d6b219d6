// identification.rs
//
// Ciclo de vida de la identificación de un cliente ante un proveedor y la
// decisión de reutilización cuando llega una referencia nueva.
use crate::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentificationStatus {
  New,
  InProgress,
  Identified,
  NotIdentified,
  Error,
}

impl IdentificationStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      IdentificationStatus::New => "new",
      IdentificationStatus::InProgress => "in_progress",
      IdentificationStatus::Identified => "identified",
      IdentificationStatus::NotIdentified => "not_identified",
      IdentificationStatus::Error => "error",
    }
  }
}

impl fmt::Display for IdentificationStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Un valor almacenado desconocido es un error interno; nunca se asume un
/// estado por defecto.
impl FromStr for IdentificationStatus {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "new" => Ok(IdentificationStatus::New),
      "in_progress" => Ok(IdentificationStatus::InProgress),
      "identified" => Ok(IdentificationStatus::Identified),
      "not_identified" => Ok(IdentificationStatus::NotIdentified),
      "error" => Ok(IdentificationStatus::Error),
      other => Err(DomainError::UnexpectedStatus(other.to_string())),
    }
  }
}

/// Qué hacer con una identificación existente al recibir una referencia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReuseDecision {
  /// Vincular la referencia a la identificación existente.
  AttachToExisting,
  /// Vincular y emitir un evento `identified` en el outbox.
  AttachAndNotify,
  /// Registrar de nuevo al cliente y abrir una identificación `new`; la
  /// anterior no se modifica.
  StartOver,
}

impl ReuseDecision {
  pub fn for_status(status: IdentificationStatus) -> Self {
    match status {
      IdentificationStatus::New | IdentificationStatus::InProgress => ReuseDecision::AttachToExisting,
      IdentificationStatus::Identified => ReuseDecision::AttachAndNotify,
      IdentificationStatus::NotIdentified | IdentificationStatus::Error => ReuseDecision::StartOver,
    }
  }
}

/// Identificación almacenada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentificationRecord {
  pub id: Uuid,
  /// Registro interno del cliente (tabla de clientes).
  pub client_id: Uuid,
  /// Id del cliente en el sistema que origina las peticiones.
  pub external_client_id: i64,
  pub provider_id: i64,
  pub provider: String,
  pub status: IdentificationStatus,
  pub created_at: DateTime<Utc>,
}

impl IdentificationRecord {
  /// Nueva identificación en estado `new`.
  pub fn new(client_id: Uuid, external_client_id: i64, provider_id: i64, provider: &str) -> Self {
    Self { id: Uuid::new_v4(),
           client_id,
           external_client_id,
           provider_id,
           provider: provider.to_string(),
           status: IdentificationStatus::New,
           created_at: Utc::now() }
  }
}

/// Evento pendiente de publicar, escrito en la misma transacción.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxEntry {
  pub id: Uuid,
  pub reference_id: i64,
  pub event: IdentificationStatus,
  pub created_at: DateTime<Utc>,
}

impl OutboxEntry {
  pub fn new(reference_id: i64, event: IdentificationStatus) -> Self {
    Self { id: Uuid::new_v4(), reference_id, event, created_at: Utc::now() }
  }
}
