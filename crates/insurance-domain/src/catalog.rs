// catalog.rs
//
// Datos de catálogo que los flujos leen pero no crean: productos y
// requisitos bancarios (estos últimos con get-or-create por BIC).
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id: i64,
  pub provider_id: i64,
  pub provider_code: String,
  pub currency: String,
  pub min_sum: f64,
  pub max_sum: f64,
  pub active: bool,
}

impl Product {
  /// Límites inclusivos.
  pub fn accepts_sum(&self, sum: f64) -> bool {
    sum >= self.min_sum && sum <= self.max_sum
  }
}

/// Requisitos bancarios. La clave natural es `bic`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requisites {
  pub bic: String,
  pub bank_name: String,
  pub account: String,
  pub corr_account: String,
}
