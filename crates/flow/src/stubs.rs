// Archivo: stubs.rs
// Propósito: implementaciones en memoria para pruebas y wiring rápido.
//
// Incluye un object store en memoria (`InMemoryBlobStore`) con inyección de
// fallos para simular caídas parciales del almacenamiento externo. No es
// durable; se usa en demos y pruebas locales.
use crate::errors::{FlowError, Result};
use crate::repository::BlobStore;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Blob almacenado en memoria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Object store en memoria.
///
/// Fallos inyectables:
/// - `fail_put_after(n)`: las primeras `n` subidas funcionan, el resto falla.
/// - `fail_put_with_content(bytes)`: falla la subida cuyo contenido coincide.
/// - `fail_delete_of(key)`: el borrado de esa key falla (artefacto huérfano).
#[derive(Debug)]
pub struct InMemoryBlobStore {
    blobs: DashMap<String, StoredBlob>,
    put_attempts: AtomicUsize,
    /// Subidas permitidas antes de empezar a fallar (`usize::MAX` = sin límite).
    put_budget: AtomicUsize,
    failing_contents: Mutex<Vec<Vec<u8>>>,
    failing_deletes: DashMap<String, ()>,
    deleted: Mutex<Vec<String>>,
}

impl InMemoryBlobStore {
    /// Crea un object store vacío sin fallos configurados.
    pub fn new() -> Self {
        Self { blobs: DashMap::new(),
               put_attempts: AtomicUsize::new(0),
               put_budget: AtomicUsize::new(usize::MAX),
               failing_contents: Mutex::new(Vec::new()),
               failing_deletes: DashMap::new(),
               deleted: Mutex::new(Vec::new()) }
    }

    /// Las siguientes `n` subidas funcionan; a partir de ahí todas fallan.
    pub fn fail_put_after(&self, n: usize) {
        self.put_budget.store(n, Ordering::SeqCst);
    }

    pub fn fail_put_with_content(&self, content: &[u8]) {
        self.failing_contents.lock().unwrap_or_else(|e| e.into_inner()).push(content.to_vec());
    }

    pub fn fail_delete_of(&self, key: &str) {
        self.failing_deletes.insert(key.to_string(), ());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<StoredBlob> {
        self.blobs.get(key).map(|b| b.value().clone())
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Número total de llamadas a `put`, incluidas las fallidas.
    pub fn put_attempts(&self) -> usize {
        self.put_attempts.load(Ordering::SeqCst)
    }

    /// Keys borradas con éxito, en orden.
    pub fn deleted_keys(&self) -> Vec<String> {
        self.deleted.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn take_budget(&self) -> bool {
        self.put_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |b| match b {
                usize::MAX => Some(usize::MAX),
                0 => None,
                n => Some(n - 1),
            })
            .is_ok()
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        self.put_attempts.fetch_add(1, Ordering::SeqCst);
        let poisoned = self.failing_contents
                           .lock()
                           .unwrap_or_else(|e| e.into_inner())
                           .iter()
                           .any(|c| c.as_slice() == bytes);
        if poisoned || !self.take_budget() {
            return Err(FlowError::blob(key, "fallo simulado de subida"));
        }
        self.blobs.insert(key.to_string(),
                          StoredBlob { bytes: bytes.to_vec(), content_type: content_type.to_string() });
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        if self.failing_deletes.contains_key(key) {
            return Err(FlowError::blob(key, "fallo simulado de borrado"));
        }
        self.blobs.remove(key);
        self.deleted.lock().unwrap_or_else(|e| e.into_inner()).push(key.to_string());
        Ok(())
    }
}
