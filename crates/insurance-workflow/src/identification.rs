//! Registro de identificaciones y vinculación de referencias externas.
use crate::config::WorkflowConfig;
use crate::errors::WorkflowError;
use crate::participants::store_client_info;
use chrono::Utc;
use flow::{BlobStore, CancellationToken, Execution, FlowEngine, Invocation, Transactional};
use insurance_domain::validation::check_age;
use insurance_domain::{AttachIdentificationRequest, DomainError, IdentificationRecord, IdentificationStatus,
                       InsertOutcome, OutboxEntry, Person, RegisterIdentificationRequest, ReuseDecision,
                       WorkflowScope};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Camino seguido al vincular una referencia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttachOutcome {
  /// El cliente no tenía identificación: se creó una nueva.
  Started { identification_id: Uuid },
  /// Se reutilizó una identificación `new` / `in_progress`.
  Attached { identification_id: Uuid },
  /// Se reutilizó una identificación `identified` y se escribió el evento.
  AttachedAndNotified { identification_id: Uuid },
  /// La identificación previa había fallado: se abrió otra.
  Restarted { identification_id: Uuid, previous_id: Uuid },
}

impl AttachOutcome {
  pub fn identification_id(&self) -> Uuid {
    match self {
      AttachOutcome::Started { identification_id }
      | AttachOutcome::Attached { identification_id }
      | AttachOutcome::AttachedAndNotified { identification_id }
      | AttachOutcome::Restarted { identification_id, .. } => *identification_id,
    }
  }
}

pub struct IdentificationService<S>
  where S: Transactional
{
  engine: FlowEngine<S>,
}

impl<S> IdentificationService<S>
  where S: Transactional,
        S::Scope: WorkflowScope
{
  pub fn new(store: Arc<S>, blobs: Arc<dyn BlobStore>, config: WorkflowConfig) -> Self {
    Self { engine: FlowEngine::new(store, blobs, config.engine_config()) }
  }

  pub fn engine(&self) -> &FlowEngine<S> {
    &self.engine
  }

  /// Vincula `reference_id` a la identificación del cliente ante el
  /// proveedor, creándola o reabriéndola según su estado.
  pub fn attach_reference(&self,
                          req: &AttachIdentificationRequest,
                          cancel: &CancellationToken)
                          -> Result<AttachOutcome, WorkflowError> {
    self.attach_reference_with_report(req, cancel).result
  }

  pub fn attach_reference_with_report(&self,
                                      req: &AttachIdentificationRequest,
                                      cancel: &CancellationToken)
                                      -> Execution<AttachOutcome, WorkflowError> {
    let exec = self.engine.execute_with_report("attach_reference", cancel, |inv| -> Result<AttachOutcome, WorkflowError> {
      inv.step("validate", |_| check_age(&req.person, Utc::now().date_naive()).map_err(WorkflowError::from))?;

      let existing = inv.step("check_identification", |inv| {
                            inv.scope()
                               .find_identification(req.client_id, &req.provider)
                               .map_err(WorkflowError::from)
                          })?;

      let outcome = match existing {
        None => {
          let id = inv.step("start_identification", |inv| {
                        open_identification(inv, req.client_id, &req.provider, &req.person)
                      })?;
          AttachOutcome::Started { identification_id: id }
        }
        Some(record) => match ReuseDecision::for_status(record.status) {
          ReuseDecision::AttachToExisting => AttachOutcome::Attached { identification_id: record.id },
          ReuseDecision::AttachAndNotify => AttachOutcome::AttachedAndNotified { identification_id: record.id },
          ReuseDecision::StartOver => {
            let id = inv.step("restart_identification", |inv| {
                          open_identification(inv, req.client_id, &req.provider, &req.person)
                        })?;
            AttachOutcome::Restarted { identification_id: id, previous_id: record.id }
          }
        },
      };

      inv.step("attach_reference", |inv| {
           match inv.scope().insert_reference(req.reference_id, outcome.identification_id())? {
             InsertOutcome::Inserted(_) => Ok(()),
             InsertOutcome::AlreadyExists => Err(WorkflowError::from(DomainError::ReferenceAlreadyUsed(req.reference_id))),
           }
         })?;

      if let AttachOutcome::AttachedAndNotified { .. } = outcome {
        inv.step("notify", |inv| {
             inv.scope()
                .insert_outbox(&OutboxEntry::new(req.reference_id, IdentificationStatus::Identified))
                .map_err(WorkflowError::from)
           })?;
      }
      Ok(outcome)
    });
    if let Ok(outcome) = &exec.result {
      info!("referencia {} vinculada: {:?}", req.reference_id, outcome);
    }
    exec
  }

  /// Primer contacto del cliente con un proveedor: registra al cliente y
  /// abre una identificación `new`. Falla si ya existe una.
  pub fn register_identification(&self,
                                 req: &RegisterIdentificationRequest,
                                 cancel: &CancellationToken)
                                 -> Result<Uuid, WorkflowError> {
    self.engine.execute("register_identification", cancel, |inv| -> Result<Uuid, WorkflowError> {
      inv.step("validate", |_| check_age(&req.person, Utc::now().date_naive()).map_err(WorkflowError::from))?;
      inv.step("check_identification", |inv| {
           match inv.scope().find_identification(req.client_id, &req.provider)? {
             Some(_) => Err(WorkflowError::from(DomainError::IdentificationAlreadyExists { client_id: req.client_id,
                                                                                         provider: req.provider.clone() })),
             None => Ok(()),
           }
         })?;
      inv.step("start_identification", |inv| open_identification(inv, req.client_id, &req.provider, &req.person))
    })
  }
}

/// Registra al cliente (persona, pasaporte y documentos) y crea una
/// identificación nueva en estado `new`.
fn open_identification<Sc: WorkflowScope>(inv: &mut Invocation<'_, Sc>,
                                          external_client_id: i64,
                                          provider: &str,
                                          person: &Person)
                                          -> Result<Uuid, WorkflowError> {
  let provider_id = inv.scope()
                       .find_provider_id(provider)?
                       .ok_or_else(|| DomainError::ProviderNotFound(provider.to_string()))?;
  let client_id = store_client_info(inv, external_client_id, person)?;
  let record = IdentificationRecord::new(client_id, external_client_id, provider_id, provider);
  inv.scope().insert_identification(&record)?;
  Ok(record.id)
}
