// Archivo: repository.rs
// Propósito: definir los contratos que el motor consume de sus
// colaboradores externos: el almacenamiento transaccional (`Transactional`)
// y el object store no transaccional (`BlobStore`). Las implementaciones
// concretas viven en `stubs` (memoria) y en crates de persistencia.
use crate::errors::Result;

/// Almacenamiento relacional con transacciones.
///
/// El ciclo de vida de un `Scope` es:
///
/// 1. `begin()` abre la transacción y devuelve el scope.
/// 2. Los pasos del flujo operan sobre `&mut Scope`.
/// 3. `commit(scope)` confirma y consume el scope, o bien
///    `rollback(scope)` descarta todas las escrituras.
///
/// Si un `Scope` se descarta (drop) sin `commit`, la implementación DEBE
/// deshacer la transacción.
pub trait Transactional: Send + Sync {
    /// Transacción en curso. Las operaciones por entidad se definen en el
    /// trait de dominio que implemente el scope.
    type Scope: Send;

    /// Abre una transacción nueva.
    fn begin(&self) -> Result<Self::Scope>;

    /// Confirma todas las escrituras del scope.
    fn commit(&self, scope: Self::Scope) -> Result<()>;

    /// Descarta todas las escrituras del scope.
    fn rollback(&self, scope: Self::Scope) -> Result<()>;
}

/// Object store externo (S3, disco...). No participa en transacciones.
pub trait BlobStore: Send + Sync {
    /// Almacena `bytes` bajo `key`. Al volver `Ok` la key es borrable de
    /// inmediato.
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()>;

    /// Borra la key. Borrar una key inexistente no es un error.
    fn delete(&self, key: &str) -> Result<()>;
}

impl<B: BlobStore + ?Sized> BlobStore for std::sync::Arc<B> {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        (**self).put(key, bytes, content_type)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}
