// validation.rs
//
// Reglas de negocio puras. Cada regla tiene su propio error; ninguna toca
// almacenamiento.
use crate::catalog::Product;
use crate::identification::{IdentificationRecord, IdentificationStatus};
use crate::insurance::Beneficiary;
use crate::person::Person;
use crate::DomainError;
use chrono::NaiveDate;

pub const MIN_AGE: i32 = 18;
pub const MAX_AGE: i32 = 86;
/// Tolerancia al sumar participaciones en coma flotante.
pub const SHARE_EPSILON: f64 = 1e-9;

pub fn check_product_active(product: Option<Product>, product_id: i64) -> Result<Product, DomainError> {
  let product = product.ok_or(DomainError::ProductNotFound(product_id))?;
  if !product.active {
    return Err(DomainError::ProductInactive(product_id));
  }
  Ok(product)
}

pub fn check_identified(record: Option<IdentificationRecord>,
                        client_id: i64,
                        provider: &str)
                        -> Result<IdentificationRecord, DomainError> {
  let record =
    record.ok_or_else(|| DomainError::IdentificationNotFound(format!("cliente {} / proveedor {}", client_id, provider)))?;
  if record.status != IdentificationStatus::Identified {
    return Err(DomainError::ClientNotIdentified(record.status.to_string()));
  }
  Ok(record)
}

pub fn check_insurance_sum(sum: f64, product: &Product) -> Result<(), DomainError> {
  if !product.accepts_sum(sum) {
    return Err(DomainError::SumOutOfRange { sum, min: product.min_sum, max: product.max_sum });
  }
  Ok(())
}

pub fn check_beneficiary_shares(beneficiaries: &[Beneficiary]) -> Result<(), DomainError> {
  let mut total = 0.0;
  for (index, b) in beneficiaries.iter().enumerate() {
    if !(0.0..=100.0).contains(&b.share) {
      return Err(DomainError::InvalidShare { index, share: b.share });
    }
    total += b.share;
  }
  if total > 100.0 + SHARE_EPSILON {
    return Err(DomainError::ShareLimitExceeded { total });
  }
  Ok(())
}

/// Edad en [18, 86): el límite inferior es inclusivo y el superior no.
pub fn check_age(person: &Person, today: NaiveDate) -> Result<(), DomainError> {
  let age = person.age_on(today);
  if !(MIN_AGE..MAX_AGE).contains(&age) {
    return Err(DomainError::AgeOutOfRange { age });
  }
  Ok(())
}

pub fn check_person_type(person: &Person) -> Result<(), DomainError> {
  if person.person_type.trim().is_empty() {
    return Err(DomainError::EmptyPersonType);
  }
  Ok(())
}
