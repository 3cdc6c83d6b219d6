mod common;

use common::*;
use flow::{CancellationToken, ErrorKind, Transactional};
use insurance_domain::{DomainError, IdentificationStatus, InsuranceStatus, InsuredPerson, WorkflowScope};
use insurance_workflow::{WorkflowConfig, WorkflowError};
use std::sync::Arc;
use std::thread;

fn domain_err(err: &WorkflowError) -> &DomainError {
  err.as_domain().expect("expected a domain error")
}

#[test]
fn over_allocated_shares_are_rejected_before_any_side_effect() {
  let (store, _) = store_with_identification(IdentificationStatus::Identified);
  let h = Harness::new(store);
  let mut person = person_aged(40);
  person.documents = vec![doc("passport.pdf", b"%PDF-1.4 passport")];
  let req = insurance_request(InsuredPerson::Present(person), vec![beneficiary(60.0), beneficiary(41.0)]);

  let err = h.insurance.create_insurance(&req, &CancellationToken::new()).unwrap_err();

  assert!(matches!(domain_err(&err), DomainError::ShareLimitExceeded { .. }));
  assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
  assert_eq!(h.blobs.put_attempts(), 0);
  assert_eq!(h.rows(), 0);
}

#[test]
fn single_full_beneficiary_with_one_document_commits_without_outbox_event() {
  let (store, ident) = store_with_identification(IdentificationStatus::Identified);
  let h = Harness::new(store);
  let mut person = person_aged(30);
  person.documents = vec![doc("passport.pdf", b"%PDF-1.4 passport")];
  let req = insurance_request(InsuredPerson::Present(person), vec![beneficiary(100.0)]);

  let id = h.insurance.create_insurance(&req, &CancellationToken::new()).unwrap();

  let tables = h.store.snapshot().unwrap();
  assert!(tables.outbox.is_empty());
  assert_eq!(h.blobs.len(), 1);
  assert_eq!(tables.documents.len(), 1);
  let stored = tables.documents.values().next().unwrap();
  assert!(h.blobs.contains(&stored.storage_key));
  assert_eq!(stored.content_type, "application/pdf");

  let view = h.insurance.get_insurance(id).unwrap();
  assert_eq!(view.insurance.status, InsuranceStatus::New);
  assert_eq!(view.insurance.currency, "RUB");
  assert_eq!(view.insurance.duration_years, 5);
  assert_eq!(view.insurance.customer_id, ident.id);
  assert_eq!(view.insurance.provider_id, ident.provider_id);
  assert_eq!(view.insurance.contract_number.len(), 12);
  assert!(view.insurance.insured_person_id.is_some());
  assert_eq!(view.beneficiaries.len(), 1);
  assert_eq!(view.beneficiaries[0].share, 100.0);
  assert_eq!(view.document_ids, vec![stored.id]);
}

#[test]
fn insured_person_documents_are_linked_to_person_and_insurance() {
  let (store, _) = store_with_identification(IdentificationStatus::Identified);
  let h = Harness::new(store);
  let mut person = person_aged(50);
  person.documents = vec![doc("a.pdf", b"%PDF-a"), doc("b.png", b"\x89PNG\r\n\x1a\nrest")];
  let id = h.insurance
            .create_insurance(&insurance_request(InsuredPerson::Present(person), vec![]),
                              &CancellationToken::new())
            .unwrap();

  let view = h.insurance.get_insurance(id).unwrap();
  let person_id = view.insurance.insured_person_id.unwrap();
  let mut scope = h.store.begin().unwrap();
  let person_docs = scope.document_ids_of(insurance_domain::DocumentOwner::Person(person_id)).unwrap();
  drop(scope);
  assert_eq!(person_docs.len(), 2);
  assert_eq!(view.document_ids, person_docs);
  assert_eq!(h.store.snapshot().unwrap().passports.iter().filter(|p| p.owner_id == person_id).count(), 1);
}

#[test]
fn absent_insured_person_skips_person_steps() {
  let (store, _) = store_with_identification(IdentificationStatus::Identified);
  let h = Harness::new(store);
  let exec = h.insurance
              .create_insurance_with_report(&insurance_request(InsuredPerson::Absent, vec![beneficiary(50.0)]),
                                            &CancellationToken::new());
  let id = exec.result.unwrap();
  let view = h.insurance.get_insurance(id).unwrap();
  assert!(view.insurance.insured_person_id.is_none());
  assert!(view.document_ids.is_empty());
  assert_eq!(h.blobs.put_attempts(), 0);
  assert!(h.store.snapshot().unwrap().persons.is_empty());
}

#[test]
fn prior_client_documents_are_attached_to_the_new_insurance() {
  let (store, ident) = store_with_identification(IdentificationStatus::Identified);
  let prior = seed_client_documents(&store, &ident, 2);
  let h = Harness::new(store);
  let mut person = person_aged(30);
  person.documents = vec![doc("new.pdf", b"%PDF-new")];

  let id = h.insurance
            .create_insurance(&insurance_request(InsuredPerson::Present(person), vec![]),
                              &CancellationToken::new())
            .unwrap();

  let view = h.insurance.get_insurance(id).unwrap();
  assert_eq!(view.document_ids.len(), 3);
  assert!(prior.iter().all(|d| view.document_ids.contains(d)));
}

#[test]
fn upload_failure_deletes_the_documents_already_uploaded() {
  let (store, _) = store_with_identification(IdentificationStatus::Identified);
  let h = Harness::new(store);
  h.blobs.fail_put_after(2);
  let mut person = person_aged(30);
  person.documents = vec![doc("1.pdf", b"%PDF-1"), doc("2.pdf", b"%PDF-2"), doc("3.pdf", b"%PDF-3")];

  let exec = h.insurance
              .create_insurance_with_report(&insurance_request(InsuredPerson::Present(person), vec![]),
                                            &CancellationToken::new());

  let err = exec.result.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
  assert_eq!(exec.compensation.unwrap().deleted.len(), 2);
  assert_eq!(h.blobs.deleted_keys().len(), 2);
  assert_eq!(h.blobs.len(), 0);
  assert_eq!(h.rows(), 0);
}

#[test]
fn parallel_uploads_are_compensated_too() {
  let (store, _) = store_with_identification(IdentificationStatus::Identified);
  let h = Harness::with_config(store, WorkflowConfig { parallel_uploads: true, ..WorkflowConfig::default() });
  h.blobs.fail_put_with_content(b"%PDF-2");
  let mut person = person_aged(30);
  person.documents = vec![doc("1.pdf", b"%PDF-1"), doc("2.pdf", b"%PDF-2"), doc("3.pdf", b"%PDF-3")];

  let res = h.insurance
             .create_insurance(&insurance_request(InsuredPerson::Present(person), vec![]),
                               &CancellationToken::new());

  assert!(res.is_err());
  assert_eq!(h.blobs.deleted_keys().len(), 2);
  assert_eq!(h.blobs.len(), 0);
  assert_eq!(h.rows(), 0);
}

#[test]
fn storage_failure_after_uploads_rolls_back_and_compensates() {
  let (store, _) = store_with_identification(IdentificationStatus::Identified);
  store.fail_on("insert_insurance");
  let h = Harness::new(store);
  let mut person = person_aged(30);
  person.documents = vec![doc("1.pdf", b"%PDF-1"), doc("2.pdf", b"%PDF-2")];

  let err = h.insurance
             .create_insurance(&insurance_request(InsuredPerson::Present(person), vec![beneficiary(10.0)]),
                               &CancellationToken::new())
             .unwrap_err();

  assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
  assert_eq!(h.blobs.put_attempts(), 2);
  assert_eq!(h.blobs.len(), 0);
  assert_eq!(h.rows(), 0);
}

#[test]
fn failed_commit_is_compensated() {
  let (store, _) = store_with_identification(IdentificationStatus::Identified);
  store.fail_on("commit");
  let h = Harness::new(store);
  let mut person = person_aged(30);
  person.documents = vec![doc("1.pdf", b"%PDF-1")];

  let res = h.insurance
             .create_insurance(&insurance_request(InsuredPerson::Present(person), vec![]),
                               &CancellationToken::new());

  assert!(res.is_err());
  assert_eq!(h.blobs.len(), 0);
  assert_eq!(h.rows(), 0);
}

#[test]
fn cancelled_request_writes_nothing() {
  let (store, _) = store_with_identification(IdentificationStatus::Identified);
  let h = Harness::new(store);
  let token = CancellationToken::new();
  token.cancel();
  let err = h.insurance.create_insurance(&insurance_request(InsuredPerson::Absent, vec![]), &token).unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Cancelled);
  assert_eq!(h.rows(), 0);
}

#[test]
fn context_preconditions() {
  // client not identified yet
  let (store, _) = store_with_identification(IdentificationStatus::InProgress);
  let h = Harness::new(store);
  let err = h.insurance.create_insurance(&insurance_request(InsuredPerson::Absent, vec![]), &CancellationToken::new()).unwrap_err();
  assert!(matches!(domain_err(&err), DomainError::ClientNotIdentified(_)));

  // no identification at all
  let h = Harness::new(insurance_domain::DomainStubs::sample_store());
  let err = h.insurance.create_insurance(&insurance_request(InsuredPerson::Absent, vec![]), &CancellationToken::new()).unwrap_err();
  assert!(matches!(domain_err(&err), DomainError::IdentificationNotFound(_)));
  assert_eq!(err.kind(), ErrorKind::NotFound);

  // inactive and unknown products
  let (store, _) = store_with_identification(IdentificationStatus::Identified);
  let h = Harness::new(store);
  let mut req = insurance_request(InsuredPerson::Absent, vec![]);
  req.product_id = 2;
  let err = h.insurance.create_insurance(&req, &CancellationToken::new()).unwrap_err();
  assert_eq!(domain_err(&err), &DomainError::ProductInactive(2));
  req.product_id = 99;
  let err = h.insurance.create_insurance(&req, &CancellationToken::new()).unwrap_err();
  assert_eq!(domain_err(&err), &DomainError::ProductNotFound(99));
  assert_eq!(h.rows(), 0);
}

#[test]
fn sum_and_age_limits() {
  let (store, _) = store_with_identification(IdentificationStatus::Identified);
  let h = Harness::new(store);

  let mut req = insurance_request(InsuredPerson::Absent, vec![]);
  req.insurance_sum = 5.0;
  let err = h.insurance.create_insurance(&req, &CancellationToken::new()).unwrap_err();
  assert!(matches!(domain_err(&err), DomainError::SumOutOfRange { .. }));

  let mut minor = person_aged(17);
  minor.documents = vec![doc("p.pdf", b"%PDF-x")];
  let req = insurance_request(InsuredPerson::Present(minor), vec![]);
  let err = h.insurance.create_insurance(&req, &CancellationToken::new()).unwrap_err();
  assert!(matches!(domain_err(&err), DomainError::AgeOutOfRange { age: 17 }));
  assert_eq!(h.blobs.put_attempts(), 0);
  assert_eq!(h.rows(), 0);
}

#[test]
fn existing_requisites_are_reused_and_never_overwritten() {
  let (store, _) = store_with_identification(IdentificationStatus::Identified);
  let h = Harness::new(store);
  let first = h.insurance
               .create_insurance(&insurance_request(InsuredPerson::Absent, vec![]), &CancellationToken::new())
               .unwrap();
  let mut req = insurance_request(InsuredPerson::Absent, vec![]);
  req.requisites.bank_name = "Renamed Bank".into();
  let second = h.insurance.create_insurance(&req, &CancellationToken::new()).unwrap();

  let a = h.insurance.get_insurance(first).unwrap().insurance;
  let b = h.insurance.get_insurance(second).unwrap().insurance;
  assert_eq!(a.requisites_id, b.requisites_id);
  let tables = h.store.snapshot().unwrap();
  assert_eq!(tables.requisites.len(), 1);
  assert_eq!(tables.requisites["044525225"].1.bank_name, "Sberbank");
}

#[test]
fn concurrent_requests_with_the_same_bic_share_one_requisites_row() {
  let (store, _) = store_with_identification(IdentificationStatus::Identified);
  let h = Arc::new(Harness::new(store));

  let handles: Vec<_> = (0..4).map(|_| {
                                let h = h.clone();
                                thread::spawn(move || {
                                  h.insurance
                                   .create_insurance(&insurance_request(InsuredPerson::Absent, vec![]),
                                                     &CancellationToken::new())
                                   .unwrap()
                                })
                              })
                              .collect();
  let ids: Vec<_> = handles.into_iter().map(|t| t.join().unwrap()).collect();

  let tables = h.store.snapshot().unwrap();
  assert_eq!(tables.requisites.len(), 1);
  assert_eq!(tables.insurances.len(), 4);
  let requisites_id = tables.requisites["044525225"].0;
  for id in ids {
    assert_eq!(tables.insurances[&id].requisites_id, requisites_id);
  }
}

#[test]
fn unknown_insurance_is_not_found() {
  let h = Harness::new(insurance_domain::DomainStubs::sample_store());
  let err = h.insurance.get_insurance(uuid::Uuid::new_v4()).unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}
