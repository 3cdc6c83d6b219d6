//! Resolución idempotente de recursos compartidos por clave natural.
//!
//! El patrón es buscar, insertar si falta y, si el insert choca con la
//! restricción de unicidad (otra transacción ganó la carrera), volver a
//! buscar y devolver el id del ganador. Un registro existente nunca se
//! sobrescribe.
use insurance_domain::{DomainError, InsertOutcome, Requisites, WorkflowScope};
use log::debug;
use uuid::Uuid;

/// Busca por clave natural en `ctx` y, si no existe, inserta.
pub fn resolve_or_create<C, F, I>(ctx: &mut C, key: &str, mut find: F, insert: I) -> Result<Uuid, DomainError>
  where C: ?Sized,
        F: FnMut(&mut C) -> Result<Option<Uuid>, DomainError>,
        I: FnOnce(&mut C) -> Result<InsertOutcome, DomainError>
{
  if let Some(id) = find(ctx)? {
    return Ok(id);
  }
  match insert(ctx)? {
    InsertOutcome::Inserted(id) => Ok(id),
    InsertOutcome::AlreadyExists => {
      debug!("clave '{}' insertada concurrentemente; se reutiliza la existente", key);
      find(ctx)?.ok_or_else(|| DomainError::ResourceConflict(format!("'{}' existe pero no es visible", key)))
    }
  }
}

/// Get-or-create de requisitos bancarios por BIC.
pub fn resolve_requisites<Sc: WorkflowScope>(scope: &mut Sc, requisites: &Requisites) -> Result<Uuid, DomainError> {
  resolve_or_create(scope,
                    &requisites.bic,
                    |s| s.find_requisites_by_bic(&requisites.bic),
                    |s| s.insert_requisites(requisites))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::Cell;

  #[test]
  fn existing_key_is_returned_without_insert() {
    let id = Uuid::new_v4();
    let out = resolve_or_create(&mut (), "bic", |_| Ok(Some(id)), |_| panic!("insert must not run")).unwrap();
    assert_eq!(out, id);
  }

  #[test]
  fn missing_key_is_inserted() {
    let id = Uuid::new_v4();
    let out = resolve_or_create(&mut (), "bic", |_| Ok(None), |_| Ok(InsertOutcome::Inserted(id))).unwrap();
    assert_eq!(out, id);
  }

  #[test]
  fn lost_race_refetches_the_winner() {
    let winner = Uuid::new_v4();
    let calls = Cell::new(0);
    let out = resolve_or_create(&mut (),
                                "bic",
                                |_| {
                                  calls.set(calls.get() + 1);
                                  // first lookup sees nothing, the re-fetch sees the winner
                                  Ok(if calls.get() == 1 { None } else { Some(winner) })
                                },
                                |_| Ok(InsertOutcome::AlreadyExists)).unwrap();
    assert_eq!(out, winner);
    assert_eq!(calls.get(), 2);
  }

  #[test]
  fn conflict_without_visible_row_is_an_error() {
    let err = resolve_or_create(&mut (), "bic", |_| Ok(None), |_| Ok(InsertOutcome::AlreadyExists)).unwrap_err();
    assert!(matches!(err, DomainError::ResourceConflict(_)));
  }
}
