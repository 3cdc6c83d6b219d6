// errors.rs
use flow::{ErrorKind, FlowError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
  #[error("Producto {0} no encontrado")]
  ProductNotFound(i64),
  #[error("Producto {0} inactivo")]
  ProductInactive(i64),
  #[error("Identificación no encontrada: {0}")]
  IdentificationNotFound(String),
  #[error("Cliente no identificado (estado actual: {0})")]
  ClientNotIdentified(String),
  #[error("Suma asegurada {sum} fuera del rango [{min}, {max}]")]
  SumOutOfRange { sum: f64, min: f64, max: f64 },
  #[error("Participación inválida del beneficiario #{index}: {share}")]
  InvalidShare { index: usize, share: f64 },
  #[error("La suma de participaciones ({total}) supera el 100%")]
  ShareLimitExceeded { total: f64 },
  #[error("Edad {age} fuera del rango permitido [18, 86)")]
  AgeOutOfRange { age: i32 },
  #[error("El tipo de persona está vacío")]
  EmptyPersonType,
  #[error("Estado de identificación inesperado: {0}")]
  UnexpectedStatus(String),
  #[error("Proveedor '{0}' no encontrado")]
  ProviderNotFound(String),
  #[error("La referencia {0} ya está vinculada a una identificación")]
  ReferenceAlreadyUsed(i64),
  #[error("Ya existe una identificación para el cliente {client_id} con el proveedor '{provider}'")]
  IdentificationAlreadyExists { client_id: i64, provider: String },
  #[error("Póliza {0} no encontrada")]
  InsuranceNotFound(Uuid),
  #[error("Tipo de solicitud '{0}' no encontrado")]
  ApplicationTypeNotFound(String),
  #[error("Conflicto al resolver recurso compartido: {0}")]
  ResourceConflict(String),
  #[error("Error de almacenamiento: {0}")]
  Storage(String),
  #[error("Error de serialización: {0}")]
  SerializationError(String),
}

impl DomainError {
  /// Tipo de error visible para el llamador.
  pub fn kind(&self) -> ErrorKind {
    use DomainError::*;
    match self {
      ProductNotFound(_) | IdentificationNotFound(_) | ProviderNotFound(_) | InsuranceNotFound(_)
      | ApplicationTypeNotFound(_) => ErrorKind::NotFound,
      ProductInactive(_)
      | ClientNotIdentified(_)
      | SumOutOfRange { .. }
      | InvalidShare { .. }
      | ShareLimitExceeded { .. }
      | AgeOutOfRange { .. }
      | EmptyPersonType => ErrorKind::PreconditionFailed,
      ReferenceAlreadyUsed(_) | IdentificationAlreadyExists { .. } | ResourceConflict(_) => ErrorKind::Conflict,
      Storage(_) => ErrorKind::UpstreamFailure,
      UnexpectedStatus(_) | SerializationError(_) => ErrorKind::Internal,
    }
  }
}

impl From<serde_json::Error> for DomainError {
  fn from(e: serde_json::Error) -> Self {
    Self::SerializationError(e.to_string())
  }
}

impl From<FlowError> for DomainError {
  fn from(e: FlowError) -> Self {
    match e {
      FlowError::Conflict(m) => Self::ResourceConflict(m),
      other => Self::Storage(other.to_string()),
    }
  }
}
