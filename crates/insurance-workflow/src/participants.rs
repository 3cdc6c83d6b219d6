//! Alta de personas aseguradas y de registros de cliente, con sus
//! pasaportes y documentos.
use crate::documents::DocumentAttachmentCoordinator;
use crate::errors::WorkflowError;
use flow::Invocation;
use insurance_domain::validation::check_person_type;
use insurance_domain::{DocumentOwner, Person, WorkflowScope};
use uuid::Uuid;

/// Persona creada junto con los documentos que se le vincularon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPerson {
  pub person_id: Uuid,
  pub document_ids: Vec<Uuid>,
}

/// Persona asegurada: sube sus documentos, crea la persona y su pasaporte
/// y vincula los documentos a la persona.
pub fn store_insured_person<Sc: WorkflowScope>(inv: &mut Invocation<'_, Sc>,
                                               person: &Person)
                                               -> Result<StoredPerson, WorkflowError> {
  let document_ids = DocumentAttachmentCoordinator::store(inv, &person.documents)?;
  let scope = inv.scope();
  let person_id = scope.insert_person(person)?;
  scope.insert_passport(person_id, &person.passport)?;
  if !document_ids.is_empty() {
    scope.link_documents(DocumentOwner::Person(person_id), &document_ids)?;
  }
  Ok(StoredPerson { person_id, document_ids })
}

/// Registro del cliente ante un proveedor: crea el cliente con su pasaporte
/// y vincula al cliente los documentos subidos. Devuelve el id interno.
pub fn store_client_info<Sc: WorkflowScope>(inv: &mut Invocation<'_, Sc>,
                                            external_client_id: i64,
                                            person: &Person)
                                            -> Result<Uuid, WorkflowError> {
  check_person_type(person)?;
  let client_id = inv.scope().insert_client(external_client_id, person)?;
  DocumentAttachmentCoordinator::store_and_link(inv, DocumentOwner::Client(client_id), &person.documents)?;
  Ok(client_id)
}
