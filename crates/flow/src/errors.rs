// Archivo: errors.rs
// Propósito: definir los errores del motor compensable, la taxonomía de
// tipos de error que ven los llamadores y el alias Result<T> usado por las
// APIs del crate.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Tipo de error expuesto al llamador, independiente del crate que lo
/// produjo. Los handlers HTTP/RPC mapean estos tipos a códigos de respuesta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Entidad referenciada inexistente (producto, identificación, póliza...).
    NotFound,
    /// Regla de negocio incumplida (estado, edad, límites, participaciones).
    PreconditionFailed,
    /// Duplicado (referencia ya usada, identificación ya existente).
    Conflict,
    /// Fallo del almacenamiento relacional o del object store.
    UpstreamFailure,
    /// El llamador canceló la invocación.
    Cancelled,
    /// Dato almacenado inesperado o invariante interna rota.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::PreconditionFailed => "precondition_failed",
            ErrorKind::Conflict => "conflict",
            ErrorKind::UpstreamFailure => "upstream_failure",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        };
        write!(f, "{}", s)
    }
}

/// Errores del motor de flujos compensables.
///
/// - `NotFound`: entidad no encontrada.
/// - `Conflict`: duplicado o conflicto de concurrencia.
/// - `Storage`: error al acceder al almacenamiento relacional.
/// - `Blob`: error del object store externo (S3, disco...).
/// - `Cancelled`: la invocación fue cancelada por el llamador.
#[derive(Error, Debug)]
pub enum FlowError {
    /// Entidad no encontrada.
    #[error("No encontrado: {0}")]
    NotFound(String),
    /// Conflicto (clave duplicada, versión).
    #[error("Conflicto: {0}")]
    Conflict(String),
    /// Error genérico de almacenamiento (BD, pool, transacción).
    #[error("Error de almacenamiento: {0}")]
    Storage(String),
    /// Error del object store al subir o borrar un documento.
    #[error("Error del object store ({key}): {message}")]
    Blob { key: String, message: String },
    /// Invocación cancelada antes de completar el paso indicado.
    #[error("Invocación cancelada antes del paso '{0}'")]
    Cancelled(String),
}

impl FlowError {
    /// Tipo de error visible para el llamador.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlowError::NotFound(_) => ErrorKind::NotFound,
            FlowError::Conflict(_) => ErrorKind::Conflict,
            FlowError::Storage(_) | FlowError::Blob { .. } => ErrorKind::UpstreamFailure,
            FlowError::Cancelled(_) => ErrorKind::Cancelled,
        }
    }

    pub fn blob(key: impl Into<String>, message: impl fmt::Display) -> Self {
        FlowError::Blob { key: key.into(), message: message.to_string() }
    }
}

/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, FlowError>;
