//! Solicitudes sobre pólizas existentes.
use crate::config::WorkflowConfig;
use crate::documents::DocumentAttachmentCoordinator;
use crate::errors::WorkflowError;
use flow::{BlobStore, CancellationToken, Execution, FlowEngine, Transactional};
use insurance_domain::{Application, CreateApplicationRequest, DocumentOwner, DomainError, WorkflowScope};
use log::info;
use std::sync::Arc;
use uuid::Uuid;

pub struct ApplicationService<S>
  where S: Transactional
{
  engine: FlowEngine<S>,
}

impl<S> ApplicationService<S>
  where S: Transactional,
        S::Scope: WorkflowScope
{
  pub fn new(store: Arc<S>, blobs: Arc<dyn BlobStore>, config: WorkflowConfig) -> Self {
    Self { engine: FlowEngine::new(store, blobs, config.engine_config()) }
  }

  pub fn create_application(&self,
                            req: &CreateApplicationRequest,
                            cancel: &CancellationToken)
                            -> Result<Uuid, WorkflowError> {
    self.create_application_with_report(req, cancel).result
  }

  pub fn create_application_with_report(&self,
                                        req: &CreateApplicationRequest,
                                        cancel: &CancellationToken)
                                        -> Execution<Uuid, WorkflowError> {
    let exec = self.engine.execute_with_report("create_application", cancel, |inv| -> Result<Uuid, WorkflowError> {
      let type_id = inv.step("load_context", |inv| {
                          let scope = inv.scope();
                          let insurance = scope.find_insurance(req.insurance_id)?
                                               .ok_or(DomainError::InsuranceNotFound(req.insurance_id))?;
                          // la póliza debe pertenecer al cliente que presenta la solicitud
                          let identification = scope.find_identification_by_id(insurance.customer_id)?
                                                    .ok_or(DomainError::InsuranceNotFound(req.insurance_id))?;
                          if identification.external_client_id != req.client_id {
                            return Err(WorkflowError::from(DomainError::IdentificationNotFound(format!(
                              "la póliza {} no pertenece al cliente {}",
                              req.insurance_id, req.client_id
                            ))));
                          }
                          let type_id = scope.find_application_type_id(&req.application_type)?
                                             .ok_or_else(|| {
                                               DomainError::ApplicationTypeNotFound(req.application_type.clone())
                                             })?;
                          Ok(type_id)
                        })?;

      let application = Application::new(req.insurance_id, type_id);
      inv.step("persist_application", |inv| {
           inv.scope().insert_application(&application).map_err(WorkflowError::from)
         })?;

      inv.step("attach_documents", |inv| {
           let new_ids = DocumentAttachmentCoordinator::store(inv, &req.files)?;
           DocumentAttachmentCoordinator::link_to_root(inv.scope(),
                                                       DocumentOwner::Application(application.id),
                                                       req.client_id,
                                                       &new_ids)?;
           Ok::<_, WorkflowError>(())
         })?;
      Ok(application.id)
    });
    if let Ok(id) = &exec.result {
      info!("solicitud {} creada sobre la póliza {}", id, req.insurance_id);
    }
    exec
  }
}
