#![allow(dead_code)]

use chrono::{Duration, Months, NaiveDate, Utc};
use flow::stubs::InMemoryBlobStore;
use flow::{BlobStore, Transactional};
use insurance_domain::{Beneficiary, CreateInsuranceRequest, DocumentBlob, DocumentOwner, DocumentRecord, DomainStubs,
                       IdentificationRecord, IdentificationStatus, InMemoryWorkflowStore, InsuredPerson, Passport,
                       Person, Requisites, WorkflowScope};
use insurance_workflow::{ApplicationService, IdentificationService, InsuranceService, WorkflowConfig};
use std::sync::Arc;
use uuid::Uuid;

pub const CLIENT: i64 = 100;
pub const PROVIDER: &str = "acme";

pub struct Harness {
  pub store: Arc<InMemoryWorkflowStore>,
  pub blobs: Arc<InMemoryBlobStore>,
  pub insurance: InsuranceService<InMemoryWorkflowStore>,
  pub identification: IdentificationService<InMemoryWorkflowStore>,
  pub application: ApplicationService<InMemoryWorkflowStore>,
  baseline: usize,
}

impl Harness {
  pub fn new(store: InMemoryWorkflowStore) -> Self {
    Self::with_config(store, WorkflowConfig::default())
  }

  pub fn with_config(store: InMemoryWorkflowStore, config: WorkflowConfig) -> Self {
    let baseline = store.snapshot().unwrap().written_rows();
    let store = Arc::new(store);
    let blobs = Arc::new(InMemoryBlobStore::new());
    let dyn_blobs: Arc<dyn BlobStore> = blobs.clone();
    Self { insurance: InsuranceService::new(store.clone(), dyn_blobs.clone(), config.clone()),
           identification: IdentificationService::new(store.clone(), dyn_blobs.clone(), config.clone()),
           application: ApplicationService::new(store.clone(), dyn_blobs, config),
           store,
           blobs,
           baseline }
  }

  /// Rows written since the harness was built.
  pub fn rows(&self) -> usize {
    self.store.snapshot().unwrap().written_rows() - self.baseline
  }
}

/// Catalog plus an identification of `CLIENT` with `PROVIDER` in `status`.
pub fn store_with_identification(status: IdentificationStatus) -> (InMemoryWorkflowStore, IdentificationRecord) {
  let mut record = IdentificationRecord::new(Uuid::new_v4(), CLIENT, 10, PROVIDER);
  record.status = status;
  let store = DomainStubs::sample_store().with_identification(record.clone(), person_aged(35));
  (store, record)
}

/// Links `n` pre-existing documents to the client record of `record`.
pub fn seed_client_documents(store: &InMemoryWorkflowStore, record: &IdentificationRecord, n: usize) -> Vec<Uuid> {
  let mut scope = store.begin().unwrap();
  let docs: Vec<DocumentRecord> = (0..n).map(|i| DocumentRecord { id: Uuid::new_v4(),
                                                                  name: format!("prior-{}.pdf", i),
                                                                  storage_key: Uuid::new_v4().to_string(),
                                                                  content_type: "application/pdf".into(),
                                                                  doc_type: "scan".into(),
                                                                  created_at: Utc::now() })
                                        .collect();
  scope.insert_documents(&docs).unwrap();
  let ids: Vec<Uuid> = docs.iter().map(|d| d.id).collect();
  scope.link_documents(DocumentOwner::Client(record.client_id), &ids).unwrap();
  store.commit(scope).unwrap();
  ids
}

pub fn birth_date_for_age(years: u32) -> NaiveDate {
  let today = Utc::now().date_naive();
  today.checked_sub_months(Months::new(12 * years)).unwrap() - Duration::days(10)
}

pub fn doc(name: &str, content: &[u8]) -> DocumentBlob {
  DocumentBlob { name: name.to_string(), doc_type: "passport_scan".to_string(), content: content.to_vec(), content_type: None }
}

pub fn person_aged(years: u32) -> Person {
  Person { name: "Иван".into(),
           surname: "Петров".into(),
           patronymic: Some("Сергеевич".into()),
           person_type: "individual".into(),
           birth_date: birth_date_for_age(years),
           phone: "+79990000000".into(),
           email: "ivan@example.com".into(),
           registration_address: "Moscow".into(),
           actual_address: "Moscow".into(),
           postal_address: "Moscow".into(),
           passport: Passport { series: "4500".into(),
                                number: "123456".into(),
                                issued_by: "MVD".into(),
                                issue_date: NaiveDate::from_ymd_opt(2015, 3, 1).unwrap(),
                                department_code: "770-001".into() },
           citizenship_country_code: None,
           migration_card_number: None,
           residence_permit_number: None,
           documents: Vec::new() }
}

pub fn beneficiary(share: f64) -> Beneficiary {
  Beneficiary { name: "Anna".into(),
                surname: "Petrova".into(),
                patronymic: None,
                birth_date: NaiveDate::from_ymd_opt(2001, 2, 3).unwrap(),
                share,
                relation: "daughter".into() }
}

pub fn requisites(bic: &str) -> Requisites {
  Requisites { bic: bic.into(),
               bank_name: "Sberbank".into(),
               account: "40817810099910004312".into(),
               corr_account: "30101810400000000225".into() }
}

pub fn insurance_request(insured: InsuredPerson, beneficiaries: Vec<Beneficiary>) -> CreateInsuranceRequest {
  CreateInsuranceRequest { client_id: CLIENT,
                           product_id: DomainStubs::sample_product().id,
                           insurance_sum: 250_000.0,
                           requisites: requisites("044525225"),
                           insured_person: insured,
                           beneficiaries }
}
