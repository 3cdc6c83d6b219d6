//! insurance-workflow: flujos de negocio compensables
//!
//! Servicios que ejecutan, sobre `flow::FlowEngine`, el alta de pólizas
//! (`InsuranceService`), el registro de identificaciones y la vinculación
//! de referencias (`IdentificationService`) y el alta de solicitudes
//! (`ApplicationService`). Cada invocación corre en una transacción y
//! compensa los documentos subidos si no llega a confirmarse.

pub mod application;
pub mod config;
pub mod documents;
pub mod errors;
pub mod identification;
pub mod insurance;
pub mod participants;
pub mod resolver;

pub use application::ApplicationService;
pub use config::WorkflowConfig;
pub use documents::DocumentAttachmentCoordinator;
pub use errors::WorkflowError;
pub use identification::{AttachOutcome, IdentificationService};
pub use insurance::{InsuranceService, InsuranceView};
