//! Crate `flow`: motor de flujos transaccionales compensables
//!
//! Este crate define los contratos de almacenamiento que consume el motor
//! (`Transactional` para la base relacional y `BlobStore` para el object
//! store externo), el registro de compensación por invocación
//! (`CompensationLog`) y el ejecutor `FlowEngine`.
//!
//! Diseño resumido:
//! - Una invocación = una transacción. Todos los pasos escriben en el mismo
//!   scope y el motor lo confirma o lo deshace entero.
//! - Las subidas al object store no se pueden deshacer con la transacción;
//!   cada subida exitosa se anota en el `CompensationLog` y, si la
//!   invocación no se confirma, se borra (compensación).
//! - Los fallos de compensación se registran pero nunca sustituyen al error
//!   original.
//!
//! Ejemplo rápido:
//! ```rust
//! use flow::stubs::InMemoryBlobStore;
//! use flow::{BlobStore, CancellationToken, FlowEngine, FlowEngineConfig, FlowError, Transactional};
//! use std::sync::Arc;
//!
//! struct NoopStore;
//! impl Transactional for NoopStore {
//!     type Scope = ();
//!     fn begin(&self) -> flow::Result<()> { Ok(()) }
//!     fn commit(&self, _: ()) -> flow::Result<()> { Ok(()) }
//!     fn rollback(&self, _: ()) -> flow::Result<()> { Ok(()) }
//! }
//!
//! let blobs: Arc<dyn BlobStore> = Arc::new(InMemoryBlobStore::new());
//! let engine = FlowEngine::new(Arc::new(NoopStore), blobs, FlowEngineConfig::default());
//! let out: Result<u32, FlowError> = engine.execute("demo", &CancellationToken::new(), |inv| {
//!     inv.step("sumar", |_| Ok::<_, FlowError>(40 + 2))
//! });
//! assert_eq!(out.unwrap(), 42);
//! ```
pub mod compensation;
pub mod content_type;
pub mod engine;
pub mod errors;
pub mod repository;
pub mod stubs;
pub mod uploader;

pub use compensation::*;
pub use content_type::detect_content_type;
pub use engine::*;
pub use errors::*;
pub use repository::*;
pub use uploader::{new_storage_key, upload_documents, PendingUpload};
