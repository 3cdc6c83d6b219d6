//! Adaptadores de persistencia del motor de seguros.
//!
//! - `DieselWorkflowStore`: almacenamiento relacional (SQLite por defecto,
//!   Postgres con la feature `pg`) que implementa `flow::Transactional` y
//!   cuyo scope implementa `insurance_domain::WorkflowScope`.
//! - `FsBlobStore`: object store sobre un directorio local.

mod blob_store;
pub mod schema;
mod workflow_store;

pub use blob_store::FsBlobStore;
#[cfg(not(feature = "pg"))]
pub use workflow_store::new_sqlite_for_test;
pub use workflow_store::{new_from_env, DieselScope, DieselWorkflowStore, MIGRATIONS};
