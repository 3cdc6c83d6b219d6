// Archivo: engine.rs
// Propósito: implementar `FlowEngine`, el ejecutor de flujos compensables.
//
// Un flujo es una secuencia ordenada de pasos que escriben dentro de UNA
// transacción relacional y que además pueden subir documentos a un object
// store no transaccional. El motor abre la transacción, ejecuta los pasos
// fail-fast, confirma si todo fue bien y, ante cualquier fallo, deshace la
// transacción y compensa (borra) cada documento subido en la invocación.
use crate::compensation::{CompensationLog, CompensationReport, UploadedArtifact};
use crate::errors::{FlowError, Result};
use crate::repository::{BlobStore, Transactional};
use crate::uploader::{upload_documents, PendingUpload};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Configuración del motor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEngineConfig {
    /// Subir los documentos de un lote en paralelo (rayon).
    pub parallel_uploads: bool,
}

/// Señal de cancelación compartida entre el llamador y la invocación.
///
/// El motor la consulta antes de cada paso y antes del commit; una
/// invocación cancelada se deshace y compensa igual que ante un error.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Estado de una invocación en curso: la transacción abierta, el registro de
/// compensación y el acceso al object store.
///
/// Se crea por invocación y no se comparte entre invocaciones.
pub struct Invocation<'a, Sc> {
    scope: Sc,
    blobs: &'a dyn BlobStore,
    log: CompensationLog,
    cancel: &'a CancellationToken,
    parallel_uploads: bool,
    completed: Vec<&'static str>,
}

impl<'a, Sc> Invocation<'a, Sc> {
    /// Transacción abierta de la invocación.
    pub fn scope(&mut self) -> &mut Sc {
        &mut self.scope
    }

    /// Registro de compensación (solo lectura).
    pub fn compensation_log(&self) -> &CompensationLog {
        &self.log
    }

    /// Pasos completados hasta ahora, en orden.
    pub fn completed_steps(&self) -> &[&'static str] {
        &self.completed
    }

    /// Falla con `Cancelled` si el llamador canceló la invocación.
    pub fn checkpoint(&self, before: &str) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(FlowError::Cancelled(before.to_string()));
        }
        Ok(())
    }

    /// Ejecuta un paso con nombre. Comprueba la cancelación antes de
    /// empezar; cualquier error corta el flujo en el llamador vía `?`.
    pub fn step<R, E, F>(&mut self, name: &'static str, f: F) -> std::result::Result<R, E>
        where F: FnOnce(&mut Self) -> std::result::Result<R, E>,
              E: From<FlowError> + fmt::Display
    {
        self.checkpoint(name)?;
        debug!("paso '{}' iniciado", name);
        let res = f(self);
        match &res {
            Ok(_) => self.completed.push(name),
            Err(e) => debug!("paso '{}' falló: {}", name, e),
        }
        res
    }

    /// Sube documentos al object store. Cada subida exitosa queda en el
    /// registro de compensación antes de que esta función retorne, también
    /// cuando otra subida del lote falla.
    pub fn upload(&mut self, docs: &[PendingUpload<'_>]) -> Result<Vec<UploadedArtifact>> {
        upload_documents(self.blobs, &mut self.log, docs, self.parallel_uploads)
    }
}

/// Resultado detallado de una ejecución.
#[derive(Debug)]
pub struct Execution<T, E> {
    pub result: std::result::Result<T, E>,
    /// Reporte de compensación; `None` si la transacción se confirmó o si no
    /// llegó a abrirse.
    pub compensation: Option<CompensationReport>,
    pub completed_steps: Vec<&'static str>,
}

/// Ejecutor de flujos compensables.
///
/// Responsabilidades:
/// - Abrir una transacción por invocación y cerrarla (commit / rollback)
/// - Ejecutar los pasos fail-fast a través de `Invocation::step`
/// - Compensar los documentos subidos cuando la transacción no se confirma
///
/// Los errores de rollback o de compensación se registran en el log y nunca
/// sustituyen al error original de la invocación.
pub struct FlowEngine<S>
    where S: Transactional
{
    store: Arc<S>,
    blobs: Arc<dyn BlobStore>,
    config: FlowEngineConfig,
}

impl<S> Clone for FlowEngine<S> where S: Transactional
{
    fn clone(&self) -> Self {
        Self { store: self.store.clone(), blobs: self.blobs.clone(), config: self.config.clone() }
    }
}

impl<S> FlowEngine<S> where S: Transactional
{
    /// Crea el motor inyectando el almacenamiento transaccional y el object
    /// store.
    pub fn new(store: Arc<S>, blobs: Arc<dyn BlobStore>, config: FlowEngineConfig) -> Self {
        Self { store, blobs, config }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    pub fn config(&self) -> &FlowEngineConfig {
        &self.config
    }

    /// Ejecuta `body` dentro de una transacción y devuelve su resultado.
    pub fn execute<T, E, F>(&self, workflow: &str, cancel: &CancellationToken, body: F) -> std::result::Result<T, E>
        where F: FnOnce(&mut Invocation<'_, S::Scope>) -> std::result::Result<T, E>,
              E: From<FlowError> + fmt::Display
    {
        self.execute_with_report(workflow, cancel, body).result
    }

    /// Igual que `execute` pero devuelve además el reporte de compensación y
    /// los pasos completados.
    pub fn execute_with_report<T, E, F>(&self, workflow: &str, cancel: &CancellationToken, body: F) -> Execution<T, E>
        where F: FnOnce(&mut Invocation<'_, S::Scope>) -> std::result::Result<T, E>,
              E: From<FlowError> + fmt::Display
    {
        let scope = match self.store.begin() {
            Ok(scope) => scope,
            Err(e) => {
                return Execution { result: Err(E::from(e)), compensation: None, completed_steps: Vec::new() };
            }
        };
        let mut inv = Invocation { scope,
                                   blobs: self.blobs.as_ref(),
                                   log: CompensationLog::new(),
                                   cancel,
                                   parallel_uploads: self.config.parallel_uploads,
                                   completed: Vec::new() };

        let outcome = match body(&mut inv) {
            Ok(value) => inv.checkpoint("commit").map(|_| value).map_err(E::from),
            Err(e) => Err(e),
        };
        let Invocation { scope, log, completed, .. } = inv;

        match outcome {
            Ok(value) => match self.store.commit(scope) {
                Ok(()) => {
                    info!("flujo '{}' confirmado tras {} pasos", workflow, completed.len());
                    log.discard();
                    Execution { result: Ok(value), compensation: None, completed_steps: completed }
                }
                Err(commit_err) => {
                    warn!("flujo '{}': commit fallido: {}", workflow, commit_err);
                    let report = self.compensate(workflow, log);
                    Execution { result: Err(E::from(commit_err)),
                                compensation: Some(report),
                                completed_steps: completed }
                }
            },
            Err(err) => {
                warn!("flujo '{}' abortado: {}", workflow, err);
                if let Err(rb) = self.store.rollback(scope) {
                    warn!("flujo '{}': rollback fallido: {}", workflow, rb);
                }
                let report = self.compensate(workflow, log);
                Execution { result: Err(err), compensation: Some(report), completed_steps: completed }
            }
        }
    }

    fn compensate(&self, workflow: &str, log: CompensationLog) -> CompensationReport {
        if log.is_empty() {
            return CompensationReport::default();
        }
        let report = log.compensate(self.blobs.as_ref());
        if !report.is_clean() {
            warn!("flujo '{}': {} artefactos huérfanos pendientes de limpieza",
                  workflow,
                  report.orphaned.len());
        }
        report
    }
}
