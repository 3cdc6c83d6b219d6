// Archivo: uploader.rs
// Propósito: subir un lote de documentos al object store registrando cada
// subida exitosa en el `CompensationLog` de la invocación.
//
// El registro forma parte del camino de éxito de cada subida: no existe un
// instante en el que un documento esté subido y todavía no registrado desde
// el punto de vista del llamador.
use crate::compensation::{CompensationLog, UploadedArtifact};
use crate::content_type::detect_content_type;
use crate::errors::{FlowError, Result};
use crate::repository::BlobStore;
use log::debug;
use rayon::prelude::*;
use uuid::Uuid;

/// Documento pendiente de subir.
#[derive(Debug, Clone, Copy)]
pub struct PendingUpload<'a> {
    pub name: &'a str,
    pub doc_type: &'a str,
    pub content: &'a [u8],
    /// Content type declarado; si falta se detecta por contenido.
    pub content_type: Option<&'a str>,
}

/// Genera una key de almacenamiento nueva y única.
pub fn new_storage_key() -> String {
    Uuid::new_v4().to_string()
}

fn upload_one(blobs: &dyn BlobStore, doc: &PendingUpload<'_>) -> Result<UploadedArtifact> {
    let key = new_storage_key();
    let content_type = doc.content_type
                          .map(str::to_string)
                          .unwrap_or_else(|| detect_content_type(doc.content).to_string());
    blobs.put(&key, doc.content, &content_type)
         .map_err(|e| match e {
             FlowError::Blob { .. } => e,
             other => FlowError::blob(key.clone(), other),
         })?;
    debug!("documento '{}' subido como {}", doc.name, key);
    Ok(UploadedArtifact { storage_key: key,
                          name: doc.name.to_string(),
                          content_type,
                          doc_type: doc.doc_type.to_string() })
}

/// Sube `docs` y devuelve los artefactos creados en el mismo orden.
///
/// Modo secuencial: se detiene en el primer fallo y devuelve ese error; el
/// `log` conserva los documentos subidos antes del fallo.
///
/// Modo paralelo (`parallel = true`): todas las subidas se lanzan a la vez;
/// cada subida completada se registra en el `log` antes de devolver el
/// resultado del lote, y se devuelve el primer error en orden de entrada.
pub fn upload_documents(blobs: &dyn BlobStore,
                        log: &mut CompensationLog,
                        docs: &[PendingUpload<'_>],
                        parallel: bool)
                        -> Result<Vec<UploadedArtifact>> {
    if !parallel || docs.len() < 2 {
        let mut out = Vec::with_capacity(docs.len());
        for doc in docs {
            let artifact = upload_one(blobs, doc)?;
            log.record(artifact.clone());
            out.push(artifact);
        }
        return Ok(out);
    }

    let results: Vec<Result<UploadedArtifact>> = docs.par_iter().map(|doc| upload_one(blobs, doc)).collect();

    let mut out = Vec::with_capacity(docs.len());
    let mut first_err = None;
    for res in results {
        match res {
            Ok(artifact) => {
                log.record(artifact.clone());
                out.push(artifact);
            }
            Err(e) => {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
    }
    match first_err {
        Some(e) => Err(e),
        None => Ok(out),
    }
}
