// requests.rs
//
// Peticiones de entrada de los tres flujos. Son inmutables una vez que la
// invocación empieza.
use crate::catalog::Requisites;
use crate::document::DocumentBlob;
use crate::insurance::Beneficiary;
use crate::person::{InsuredPerson, Person};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateInsuranceRequest {
  pub client_id: i64,
  pub product_id: i64,
  pub insurance_sum: f64,
  pub requisites: Requisites,
  #[serde(default)]
  pub insured_person: InsuredPerson,
  #[serde(default)]
  pub beneficiaries: Vec<Beneficiary>,
}

/// Vincula una referencia externa (p. ej. un id de póliza del sistema de
/// origen) a la identificación del cliente ante el proveedor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachIdentificationRequest {
  pub reference_id: i64,
  pub client_id: i64,
  pub provider: String,
  pub person: Person,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterIdentificationRequest {
  pub client_id: i64,
  pub provider: String,
  pub person: Person,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateApplicationRequest {
  pub insurance_id: Uuid,
  pub client_id: i64,
  pub application_type: String,
  #[serde(default)]
  pub files: Vec<DocumentBlob>,
}
