// insurance.rs
use crate::catalog::Product;
use crate::identification::IdentificationRecord;
use crate::DomainError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Duración por defecto de una póliza nueva, en años.
pub const DEFAULT_DURATION_YEARS: i32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beneficiary {
  pub name: String,
  pub surname: String,
  #[serde(default)]
  pub patronymic: Option<String>,
  pub birth_date: NaiveDate,
  /// Porcentaje en [0, 100].
  pub share: f64,
  pub relation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceStatus {
  New,
  Active,
  Terminated,
}

impl InsuranceStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      InsuranceStatus::New => "new",
      InsuranceStatus::Active => "active",
      InsuranceStatus::Terminated => "terminated",
    }
  }
}

impl fmt::Display for InsuranceStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for InsuranceStatus {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "new" => Ok(InsuranceStatus::New),
      "active" => Ok(InsuranceStatus::Active),
      "terminated" => Ok(InsuranceStatus::Terminated),
      other => Err(DomainError::UnexpectedStatus(other.to_string())),
    }
  }
}

/// Póliza (entidad raíz del flujo de alta).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insurance {
  pub id: Uuid,
  pub requisites_id: Uuid,
  pub insured_person_id: Option<Uuid>,
  pub status: InsuranceStatus,
  pub currency: String,
  pub duration_years: i32,
  /// Id externo del cliente.
  pub client_id: i64,
  /// Identificación con la que se emitió la póliza.
  pub customer_id: Uuid,
  pub sum: f64,
  pub contract_number: String,
  pub product_id: i64,
  pub provider_id: i64,
  pub created_at: DateTime<Utc>,
}

impl Insurance {
  /// Construye una póliza nueva a partir del contexto validado.
  pub fn build(client_id: i64,
               sum: f64,
               product: &Product,
               identification: &IdentificationRecord,
               requisites_id: Uuid,
               insured_person_id: Option<Uuid>,
               duration_years: i32)
               -> Self {
    Self { id: Uuid::new_v4(),
           requisites_id,
           insured_person_id,
           status: InsuranceStatus::New,
           currency: product.currency.clone(),
           duration_years,
           client_id,
           customer_id: identification.id,
           sum,
           contract_number: contract_number(),
           product_id: product.id,
           provider_id: identification.provider_id,
           created_at: Utc::now() }
  }
}

/// Número de contrato de 12 dígitos.
pub fn contract_number() -> String {
  let n = Uuid::new_v4().as_u128() % 1_000_000_000_000;
  format!("{:012}", n)
}
