mod common;

use common::*;
use flow::{CancellationToken, ErrorKind};
use insurance_domain::{AttachIdentificationRequest, DocumentOwner, DomainError, DomainStubs, IdentificationStatus,
                       RegisterIdentificationRequest};
use insurance_workflow::AttachOutcome;

fn attach_request(reference_id: i64) -> AttachIdentificationRequest {
  let mut person = person_aged(33);
  person.documents = vec![doc("passport.pdf", b"%PDF-1.7 scan")];
  AttachIdentificationRequest { reference_id, client_id: CLIENT, provider: PROVIDER.into(), person }
}

#[test]
fn first_contact_creates_client_identification_and_reference() {
  let h = Harness::new(DomainStubs::sample_store());

  let outcome = h.identification.attach_reference(&attach_request(501), &CancellationToken::new()).unwrap();

  assert!(matches!(outcome, AttachOutcome::Started { .. }));
  let tables = h.store.snapshot().unwrap();
  assert_eq!(tables.identifications.len(), 1);
  let ident = &tables.identifications[0];
  assert_eq!(ident.id, outcome.identification_id());
  assert_eq!(ident.status, IdentificationStatus::New);
  assert_eq!(ident.provider_id, 10);
  assert_eq!(tables.references[&501], ident.id);
  assert_eq!(tables.clients.len(), 1);
  assert_eq!(tables.passports.len(), 1);
  // the uploaded scan belongs to the client record
  assert_eq!(h.blobs.len(), 1);
  assert_eq!(tables.document_links.len(), 1);
  assert_eq!(tables.document_links[0].0, DocumentOwner::Client(ident.client_id));
  assert!(tables.outbox.is_empty());
}

#[test]
fn identified_client_gets_exactly_one_outbox_event() {
  let (store, record) = store_with_identification(IdentificationStatus::Identified);
  let h = Harness::new(store);

  let outcome = h.identification.attach_reference(&attach_request(777), &CancellationToken::new()).unwrap();

  assert_eq!(outcome, AttachOutcome::AttachedAndNotified { identification_id: record.id });
  let tables = h.store.snapshot().unwrap();
  assert_eq!(tables.outbox.len(), 1);
  assert_eq!(tables.outbox[0].reference_id, 777);
  assert_eq!(tables.outbox[0].event, IdentificationStatus::Identified);
  assert_eq!(tables.references[&777], record.id);
  // no new client data stored
  assert_eq!(tables.identifications.len(), 1);
  assert_eq!(h.blobs.put_attempts(), 0);
}

#[test]
fn pending_identification_is_reused_silently() {
  for status in [IdentificationStatus::New, IdentificationStatus::InProgress] {
    let (store, record) = store_with_identification(status);
    let h = Harness::new(store);

    let outcome = h.identification.attach_reference(&attach_request(42), &CancellationToken::new()).unwrap();

    assert_eq!(outcome, AttachOutcome::Attached { identification_id: record.id });
    let tables = h.store.snapshot().unwrap();
    assert!(tables.outbox.is_empty());
    assert_eq!(tables.identifications.len(), 1);
    assert_eq!(tables.references[&42], record.id);
    assert_eq!(h.blobs.put_attempts(), 0);
  }
}

#[test]
fn failed_identification_starts_over_and_leaves_the_old_record_untouched() {
  for status in [IdentificationStatus::NotIdentified, IdentificationStatus::Error] {
    let (store, record) = store_with_identification(status);
    let h = Harness::new(store);

    let outcome = h.identification.attach_reference(&attach_request(9001), &CancellationToken::new()).unwrap();

    let new_id = match outcome {
      AttachOutcome::Restarted { identification_id, previous_id } => {
        assert_eq!(previous_id, record.id);
        identification_id
      }
      other => panic!("unexpected outcome {:?}", other),
    };
    let tables = h.store.snapshot().unwrap();
    assert_eq!(tables.identifications.len(), 2);
    let old = tables.identifications.iter().find(|r| r.id == record.id).unwrap();
    assert_eq!(old, &record);
    let fresh = tables.identifications.iter().find(|r| r.id == new_id).unwrap();
    assert_eq!(fresh.status, IdentificationStatus::New);
    assert_ne!(fresh.client_id, record.client_id);
    assert_eq!(tables.references[&9001], new_id);
    assert!(tables.outbox.is_empty());
    assert_eq!(h.blobs.len(), 1);
  }
}

#[test]
fn reused_reference_is_a_conflict_and_compensates_uploads() {
  let h = Harness::new(DomainStubs::sample_store());
  h.identification.attach_reference(&attach_request(5), &CancellationToken::new()).unwrap();
  let rows = h.rows();

  // a different client reusing the same reference takes the first-contact path
  let mut req = attach_request(5);
  req.client_id = CLIENT + 1;
  let err = h.identification.attach_reference(&req, &CancellationToken::new()).unwrap_err();

  assert_eq!(err.as_domain(), Some(&DomainError::ReferenceAlreadyUsed(5)));
  assert_eq!(err.kind(), ErrorKind::Conflict);
  assert_eq!(h.rows(), rows);
  assert_eq!(h.blobs.len(), 1);
  assert_eq!(h.blobs.deleted_keys().len(), 1);
}

#[test]
fn unknown_provider_is_not_found() {
  let h = Harness::new(DomainStubs::sample_store());
  let mut req = attach_request(1);
  req.provider = "initech".into();

  let err = h.identification.attach_reference(&req, &CancellationToken::new()).unwrap_err();

  assert_eq!(err.as_domain(), Some(&DomainError::ProviderNotFound("initech".into())));
  assert_eq!(err.kind(), ErrorKind::NotFound);
  assert_eq!(h.rows(), 0);
  assert_eq!(h.blobs.put_attempts(), 0);
}

#[test]
fn empty_person_type_stops_the_new_client_path() {
  let h = Harness::new(DomainStubs::sample_store());
  let mut req = attach_request(1);
  req.person.person_type = String::new();

  let err = h.identification.attach_reference(&req, &CancellationToken::new()).unwrap_err();

  assert_eq!(err.as_domain(), Some(&DomainError::EmptyPersonType));
  assert_eq!(h.rows(), 0);
}

#[test]
fn age_is_checked_before_looking_up_the_identification() {
  let (store, _) = store_with_identification(IdentificationStatus::Identified);
  let h = Harness::new(store);
  let mut req = attach_request(3);
  req.person.birth_date = birth_date_for_age(90);

  let err = h.identification.attach_reference(&req, &CancellationToken::new()).unwrap_err();

  assert!(matches!(err.as_domain(), Some(DomainError::AgeOutOfRange { age: 90 })));
  assert_eq!(h.rows(), 0);
}

#[test]
fn register_identification_only_on_first_contact() {
  let h = Harness::new(DomainStubs::sample_store());
  let req = RegisterIdentificationRequest { client_id: 300, provider: "globex".into(), person: person_aged(25) };

  let id = h.identification.register_identification(&req, &CancellationToken::new()).unwrap();
  let tables = h.store.snapshot().unwrap();
  assert_eq!(tables.identifications.len(), 1);
  assert_eq!(tables.identifications[0].id, id);
  assert_eq!(tables.identifications[0].provider_id, 20);
  assert!(tables.references.is_empty());
  let rows = h.rows();

  let err = h.identification.register_identification(&req, &CancellationToken::new()).unwrap_err();
  assert!(matches!(err.as_domain(), Some(DomainError::IdentificationAlreadyExists { client_id: 300, .. })));
  assert_eq!(err.kind(), ErrorKind::Conflict);
  assert_eq!(h.rows(), rows);
}
