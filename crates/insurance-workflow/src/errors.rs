use flow::ErrorKind;
use thiserror::Error;

// Errores comunes de los flujos de negocio.
//
// Este enum centraliza los errores que pueden ocurrir durante la
// ejecución de un flujo: errores del motor y del object store
// (`FlowError`), reglas de negocio y almacenamiento (`DomainError`) y
// errores de serialización.
#[derive(Error, Debug)]
pub enum WorkflowError {
  /// Errores originados por el motor compensable o el object store.
  #[error("Error de flujo: {0}")]
  Flow(#[from] flow::errors::FlowError),

  /// Reglas de negocio incumplidas y errores del almacenamiento relacional.
  #[error("Error de dominio: {0}")]
  Domain(#[from] insurance_domain::DomainError),

  /// Errores de serialización/deserialización JSON.
  #[error("Error de serialización: {0}")]
  Serialization(#[from] serde_json::Error),

  /// Configuración inválida (variables de entorno).
  #[error("Error de configuración: {0}")]
  Config(String),
}

impl WorkflowError {
  /// Tipo de error visible para el llamador.
  pub fn kind(&self) -> ErrorKind {
    match self {
      WorkflowError::Flow(e) => e.kind(),
      WorkflowError::Domain(e) => e.kind(),
      WorkflowError::Serialization(_) | WorkflowError::Config(_) => ErrorKind::Internal,
    }
  }

  /// Error de dominio subyacente, si lo hay.
  pub fn as_domain(&self) -> Option<&insurance_domain::DomainError> {
    match self {
      WorkflowError::Domain(e) => Some(e),
      _ => None,
    }
  }
}
