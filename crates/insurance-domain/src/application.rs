// application.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Solicitud presentada sobre una póliza existente.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
  pub id: Uuid,
  pub insurance_id: Uuid,
  pub application_type_id: i64,
  pub status: String,
  pub created_at: DateTime<Utc>,
}

impl Application {
  pub fn new(insurance_id: Uuid, application_type_id: i64) -> Self {
    Self { id: Uuid::new_v4(),
           insurance_id,
           application_type_id,
           status: "new".to_string(),
           created_at: Utc::now() }
  }
}
