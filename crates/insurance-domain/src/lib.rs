//! insurance-domain: entidades, reglas de negocio y contrato de
//! almacenamiento de los flujos de pólizas, identificaciones y solicitudes.
mod application;
mod catalog;
mod document;
mod domain_repository;
mod domain_stubs;
mod errors;
mod identification;
mod in_memory;
mod insurance;
mod person;
mod requests;
pub mod validation;

pub use application::Application;
pub use catalog::{Product, Requisites};
pub use document::{base64_bytes, DocumentBlob, DocumentOwner, DocumentRecord};
pub use domain_repository::{InsertOutcome, WorkflowScope};
pub use domain_stubs::DomainStubs;
pub use errors::DomainError;
pub use identification::{IdentificationRecord, IdentificationStatus, OutboxEntry, ReuseDecision};
pub use in_memory::{ClientRecord, InMemoryScope, InMemoryWorkflowStore, MemoryTables, PassportRecord};
pub use insurance::{contract_number, Beneficiary, Insurance, InsuranceStatus, DEFAULT_DURATION_YEARS};
pub use person::{InsuredPerson, Passport, Person};
pub use requests::{AttachIdentificationRequest,
                   CreateApplicationRequest,
                   CreateInsuranceRequest,
                   RegisterIdentificationRequest};
