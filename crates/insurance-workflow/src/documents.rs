//! Subida de documentos y vinculación de sus filas de metadatos.
use crate::errors::WorkflowError;
use flow::{Invocation, PendingUpload};
use insurance_domain::{DocumentBlob, DocumentOwner, DocumentRecord, DomainError, WorkflowScope};
use log::debug;
use uuid::Uuid;

/// Coordina las dos mitades de un documento: el blob en el object store
/// (registrado en el log de compensación de la invocación) y su fila de
/// metadatos dentro de la transacción.
pub struct DocumentAttachmentCoordinator;

impl DocumentAttachmentCoordinator {
  /// Sube `docs` y, si todas las subidas terminan bien, inserta sus filas de
  /// metadatos. Devuelve los ids de las filas en el orden de entrada.
  pub fn store<Sc: WorkflowScope>(inv: &mut Invocation<'_, Sc>, docs: &[DocumentBlob]) -> Result<Vec<Uuid>, WorkflowError> {
    if docs.is_empty() {
      return Ok(Vec::new());
    }
    let pending: Vec<PendingUpload<'_>> = docs.iter().map(DocumentBlob::as_upload).collect();
    let artifacts = inv.upload(&pending)?;
    let records: Vec<DocumentRecord> = artifacts.iter().map(DocumentRecord::from).collect();
    inv.scope().insert_documents(&records)?;
    debug!("{} documentos registrados", records.len());
    Ok(records.into_iter().map(|r| r.id).collect())
  }

  /// `store` + vinculación de los documentos nuevos a `owner`.
  pub fn store_and_link<Sc: WorkflowScope>(inv: &mut Invocation<'_, Sc>,
                                           owner: DocumentOwner,
                                           docs: &[DocumentBlob])
                                           -> Result<Vec<Uuid>, WorkflowError> {
    let ids = Self::store(inv, docs)?;
    if !ids.is_empty() {
      inv.scope().link_documents(owner, &ids)?;
    }
    Ok(ids)
  }

  /// Vincula a la entidad raíz los documentos previos del cliente y los
  /// subidos en esta invocación, sin duplicados.
  pub fn link_to_root<Sc: WorkflowScope>(scope: &mut Sc,
                                         root: DocumentOwner,
                                         external_client_id: i64,
                                         new_ids: &[Uuid])
                                         -> Result<Vec<Uuid>, DomainError> {
    let mut ids = scope.client_document_ids(external_client_id)?;
    for id in new_ids {
      if !ids.contains(id) {
        ids.push(*id);
      }
    }
    if !ids.is_empty() {
      scope.link_documents(root, &ids)?;
    }
    debug!("{} documentos vinculados a {} {}", ids.len(), root.kind(), root.id());
    Ok(ids)
  }
}
