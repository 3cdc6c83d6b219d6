use crate::errors::WorkflowError;
use flow::FlowEngineConfig;
use insurance_domain::DEFAULT_DURATION_YEARS;
use serde::{Deserialize, Serialize};

/// Opciones de los servicios de negocio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
  /// Subir los documentos de cada lote en paralelo.
  pub parallel_uploads: bool,
  /// Duración de las pólizas nuevas, en años.
  pub default_duration_years: i32,
}

impl Default for WorkflowConfig {
  fn default() -> Self {
    Self { parallel_uploads: false, default_duration_years: DEFAULT_DURATION_YEARS }
  }
}

impl WorkflowConfig {
  /// Lee `WORKFLOW_PARALLEL_UPLOADS` (y `.env` si existe). Valores
  /// aceptados: `1/0`, `true/false`, `yes/no`.
  pub fn from_env() -> Result<Self, WorkflowError> {
    dotenvy::dotenv().ok();
    let mut cfg = Self::default();
    if let Ok(v) = std::env::var("WORKFLOW_PARALLEL_UPLOADS") {
      cfg.parallel_uploads = parse_bool(&v).ok_or_else(|| {
                                              WorkflowError::Config(format!("WORKFLOW_PARALLEL_UPLOADS inválido: '{}'", v))
                                            })?;
    }
    Ok(cfg)
  }

  pub fn engine_config(&self) -> FlowEngineConfig {
    FlowEngineConfig { parallel_uploads: self.parallel_uploads }
  }
}

fn parse_bool(v: &str) -> Option<bool> {
  match v.trim().to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Some(true),
    "0" | "false" | "no" | "off" | "" => Some(false),
    _ => None,
  }
}
