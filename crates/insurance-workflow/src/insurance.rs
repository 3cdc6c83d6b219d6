//! Alta de pólizas.
use crate::config::WorkflowConfig;
use crate::documents::DocumentAttachmentCoordinator;
use crate::errors::WorkflowError;
use crate::participants::store_insured_person;
use crate::resolver::resolve_requisites;
use chrono::Utc;
use flow::{BlobStore, CancellationToken, Execution, FlowEngine, Transactional};
use insurance_domain::validation::{check_age, check_beneficiary_shares, check_identified, check_insurance_sum,
                                   check_product_active};
use insurance_domain::{Beneficiary, CreateInsuranceRequest, DocumentOwner, Insurance, WorkflowScope};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Póliza leída junto con sus beneficiarios y documentos vinculados.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceView {
  pub insurance: Insurance,
  pub beneficiaries: Vec<Beneficiary>,
  pub document_ids: Vec<Uuid>,
}

pub struct InsuranceService<S>
  where S: Transactional
{
  engine: FlowEngine<S>,
  config: WorkflowConfig,
}

impl<S> InsuranceService<S>
  where S: Transactional,
        S::Scope: WorkflowScope
{
  pub fn new(store: Arc<S>, blobs: Arc<dyn BlobStore>, config: WorkflowConfig) -> Self {
    let engine = FlowEngine::new(store, blobs, config.engine_config());
    Self { engine, config }
  }

  pub fn engine(&self) -> &FlowEngine<S> {
    &self.engine
  }

  /// Crea una póliza. Devuelve su id.
  pub fn create_insurance(&self, req: &CreateInsuranceRequest, cancel: &CancellationToken) -> Result<Uuid, WorkflowError> {
    self.create_insurance_with_report(req, cancel).result
  }

  /// Igual que `create_insurance` pero con el detalle de la ejecución
  /// (pasos completados y compensación).
  pub fn create_insurance_with_report(&self,
                                      req: &CreateInsuranceRequest,
                                      cancel: &CancellationToken)
                                      -> Execution<Uuid, WorkflowError> {
    let duration = self.config.default_duration_years;
    let exec = self.engine.execute_with_report("create_insurance", cancel, |inv| -> Result<Uuid, WorkflowError> {
      // 1. producto e identificación del cliente ante el proveedor
      let (product, identification) = inv.step("load_context", |inv| {
                                             let scope = inv.scope();
                                             let product = check_product_active(scope.find_product(req.product_id)?,
                                                                                req.product_id)?;
                                             let found = scope.find_identification(req.client_id, &product.provider_code)?;
                                             let identification =
                                               check_identified(found, req.client_id, &product.provider_code)?;
                                             Ok::<_, WorkflowError>((product, identification))
                                           })?;

      // 2. reglas de negocio, antes de cualquier escritura o subida
      inv.step("validate", |_| {
           check_insurance_sum(req.insurance_sum, &product)?;
           check_beneficiary_shares(&req.beneficiaries)?;
           if let Some(person) = req.insured_person.as_person() {
             check_age(person, Utc::now().date_naive())?;
           }
           Ok::<_, WorkflowError>(())
         })?;

      // 3. recursos compartidos
      let requisites_id = inv.step("resolve_requisites", |inv| {
                               resolve_requisites(inv.scope(), &req.requisites).map_err(WorkflowError::from)
                             })?;

      // 4. persona asegurada (opcional)
      let insured = inv.step("insured_person", |inv| match req.insured_person.as_person() {
                           Some(person) => store_insured_person(inv, person).map(Some),
                           None => Ok(None),
                         })?;
      let (insured_person_id, person_docs) = match insured {
        Some(p) => (Some(p.person_id), p.document_ids),
        None => (None, Vec::new()),
      };

      // 5-6. póliza y beneficiarios
      let insurance = Insurance::build(req.client_id,
                                       req.insurance_sum,
                                       &product,
                                       &identification,
                                       requisites_id,
                                       insured_person_id,
                                       duration);
      inv.step("persist_insurance", |inv| {
           let scope = inv.scope();
           let beneficiary_ids = scope.insert_beneficiaries(&req.beneficiaries)?;
           scope.insert_insurance(&insurance)?;
           scope.link_beneficiaries(insurance.id, &beneficiary_ids)?;
           Ok::<_, WorkflowError>(())
         })?;

      // 7. documentos previos del cliente + documentos de la persona
      inv.step("attach_documents", |inv| {
           DocumentAttachmentCoordinator::link_to_root(inv.scope(),
                                                       DocumentOwner::Insurance(insurance.id),
                                                       req.client_id,
                                                       &person_docs).map_err(WorkflowError::from)
         })?;
      Ok(insurance.id)
    });
    if let Ok(id) = &exec.result {
      info!("póliza {} creada para el cliente {}", id, req.client_id);
    }
    exec
  }

  /// Lee una póliza con sus beneficiarios y documentos. La transacción de
  /// lectura se descarta al terminar.
  pub fn get_insurance(&self, id: Uuid) -> Result<InsuranceView, WorkflowError> {
    let store = self.engine.store();
    let mut scope = store.begin()?;
    let read = read_view(&mut scope, id);
    store.rollback(scope)?;
    read
  }
}

fn read_view<Sc: WorkflowScope>(scope: &mut Sc, id: Uuid) -> Result<InsuranceView, WorkflowError> {
  let insurance = scope.find_insurance(id)?
                       .ok_or(insurance_domain::DomainError::InsuranceNotFound(id))?;
  let beneficiaries = scope.beneficiaries_of(id)?;
  let document_ids = scope.document_ids_of(DocumentOwner::Insurance(id))?;
  Ok(InsuranceView { insurance, beneficiaries, document_ids })
}
