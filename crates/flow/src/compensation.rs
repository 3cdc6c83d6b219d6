// Archivo: compensation.rs
// Propósito: registro de compensación de una invocación. Guarda cada
// documento subido al object store para poder borrarlo si la transacción
// relacional no llega a confirmarse.
use crate::repository::BlobStore;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Documento escrito con éxito en el object store.
///
/// La `storage_key` es el único dato necesario para compensar (borrar).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedArtifact {
    pub storage_key: String,
    pub name: String,
    pub content_type: String,
    pub doc_type: String,
}

/// Registro ordenado y de solo-anexado de los artefactos subidos durante
/// una invocación.
///
/// Cada invocación crea su propia instancia; no se comparte entre
/// invocaciones ni se persiste. Tras el commit se descarta con `discard`;
/// tras un fallo se consume con `compensate`.
#[derive(Debug, Default)]
pub struct CompensationLog {
    entries: Vec<UploadedArtifact>,
}

/// Resultado de una compensación. Las keys que no se pudieron borrar
/// quedan huérfanas y las recoge un proceso de limpieza externo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationReport {
    pub deleted: Vec<String>,
    pub orphaned: Vec<OrphanedArtifact>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanedArtifact {
    pub storage_key: String,
    pub reason: String,
}

impl CompensationReport {
    pub fn is_clean(&self) -> bool {
        self.orphaned.is_empty()
    }
}

impl CompensationLog {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Anexa un artefacto ya subido.
    pub fn record(&mut self, artifact: UploadedArtifact) {
        self.entries.push(artifact);
    }

    pub fn entries(&self) -> &[UploadedArtifact] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Descarta el registro sin tocar el object store. Se usa tras un commit:
    /// los artefactos ya están referenciados por filas confirmadas.
    pub fn discard(self) -> usize {
        let n = self.entries.len();
        if n > 0 {
            debug!("commit confirmado; se conservan {} artefactos subidos", n);
        }
        n
    }

    /// Intenta borrar cada artefacto registrado, en orden de subida.
    ///
    /// Los fallos de borrado se registran en el log y en el reporte; nunca
    /// se propagan, para no ocultar el error original de la invocación.
    pub fn compensate(self, blobs: &dyn BlobStore) -> CompensationReport {
        let mut report = CompensationReport::default();
        for artifact in self.entries {
            match blobs.delete(&artifact.storage_key) {
                Ok(()) => {
                    debug!("compensado artefacto {} ({})", artifact.storage_key, artifact.name);
                    report.deleted.push(artifact.storage_key);
                }
                Err(e) => {
                    warn!("no se pudo compensar el artefacto {}; queda huérfano: {}",
                          artifact.storage_key, e);
                    report.orphaned.push(OrphanedArtifact { storage_key: artifact.storage_key,
                                                            reason: e.to_string() });
                }
            }
        }
        report
    }
}
