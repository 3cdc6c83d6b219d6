use flow::stubs::InMemoryBlobStore;
use flow::{BlobStore, CancellationToken, ErrorKind, FlowEngine, FlowEngineConfig, FlowError, PendingUpload, Transactional};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Minimal transactional store: a scope buffers rows, commit appends them.
#[derive(Default)]
struct RowStore {
  rows: Mutex<Vec<String>>,
  fail_commit: AtomicBool,
  rollbacks: AtomicUsize,
}

impl Transactional for RowStore {
  type Scope = Vec<String>;

  fn begin(&self) -> flow::Result<Vec<String>> {
    Ok(Vec::new())
  }

  fn commit(&self, scope: Vec<String>) -> flow::Result<()> {
    if self.fail_commit.load(Ordering::SeqCst) {
      return Err(FlowError::Storage("commit rechazado".into()));
    }
    self.rows.lock().unwrap().extend(scope);
    Ok(())
  }

  fn rollback(&self, _scope: Vec<String>) -> flow::Result<()> {
    self.rollbacks.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }
}

fn engine(parallel: bool) -> (FlowEngine<RowStore>, Arc<RowStore>, Arc<InMemoryBlobStore>) {
  let store = Arc::new(RowStore::default());
  let blobs = Arc::new(InMemoryBlobStore::new());
  let dyn_blobs: Arc<dyn BlobStore> = blobs.clone();
  let engine = FlowEngine::new(store.clone(), dyn_blobs, FlowEngineConfig { parallel_uploads: parallel });
  (engine, store, blobs)
}

fn docs() -> Vec<PendingUpload<'static>> {
  vec![PendingUpload { name: "p1.pdf", doc_type: "passport", content: b"%PDF-1", content_type: None },
       PendingUpload { name: "p2.pdf", doc_type: "passport", content: b"%PDF-2", content_type: None },
       PendingUpload { name: "p3.pdf", doc_type: "passport", content: b"%PDF-3", content_type: None }]
}

#[test]
fn successful_invocation_commits_and_keeps_uploads() {
  let (engine, store, blobs) = engine(false);
  let exec = engine.execute_with_report("ok", &CancellationToken::new(), |inv| {
                     let uploaded = inv.step("upload", |inv| inv.upload(&docs()))?;
                     inv.step("rows", |inv| {
                          for a in &uploaded {
                            inv.scope().push(a.storage_key.clone());
                          }
                          Ok::<_, FlowError>(uploaded.len())
                        })
                   });
  assert_eq!(exec.result.unwrap(), 3);
  assert!(exec.compensation.is_none());
  assert_eq!(exec.completed_steps, vec!["upload", "rows"]);
  assert_eq!(store.rows.lock().unwrap().len(), 3);
  assert_eq!(blobs.len(), 3);
  assert!(blobs.deleted_keys().is_empty());
}

#[test]
fn failing_step_rolls_back_and_deletes_every_upload() {
  let (engine, store, blobs) = engine(false);
  let exec = engine.execute_with_report("fail", &CancellationToken::new(), |inv| {
                     inv.step("write", |inv| {
                          inv.scope().push("row".into());
                          Ok::<_, FlowError>(())
                        })?;
                     inv.step("upload", |inv| inv.upload(&docs()))?;
                     inv.step("boom", |_| Err::<(), _>(FlowError::NotFound("producto 7".into())))
                   });
  let err = exec.result.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  let report = exec.compensation.unwrap();
  assert_eq!(report.deleted.len(), 3);
  assert!(report.is_clean());
  assert_eq!(blobs.len(), 0);
  assert!(store.rows.lock().unwrap().is_empty());
  assert_eq!(store.rollbacks.load(Ordering::SeqCst), 1);
  assert_eq!(exec.completed_steps, vec!["write", "upload"]);
}

#[test]
fn upload_failure_compensates_earlier_uploads_of_the_batch() {
  let (engine, _store, blobs) = engine(false);
  blobs.fail_put_after(2);
  let res: Result<(), FlowError> = engine.execute("partial", &CancellationToken::new(), |inv| {
                                            inv.step("upload", |inv| inv.upload(&docs())).map(|_| ())
                                          });
  assert!(matches!(res, Err(FlowError::Blob { .. })));
  assert_eq!(blobs.put_attempts(), 3);
  assert_eq!(blobs.deleted_keys().len(), 2);
  assert_eq!(blobs.len(), 0);
}

#[test]
fn parallel_upload_failure_compensates_completed_uploads() {
  let (engine, _store, blobs) = engine(true);
  blobs.fail_put_with_content(b"%PDF-2");
  let res: Result<(), FlowError> = engine.execute("parallel", &CancellationToken::new(), |inv| {
                                            inv.step("upload", |inv| inv.upload(&docs())).map(|_| ())
                                          });
  assert!(res.is_err());
  assert_eq!(blobs.deleted_keys().len(), 2);
  assert_eq!(blobs.len(), 0);
}

#[test]
fn compensation_failure_does_not_mask_original_error() {
  let (engine, _store, blobs) = engine(false);
  let exec = engine.execute_with_report("orphans", &CancellationToken::new(), |inv| {
                     let up = inv.step("upload", |inv| inv.upload(&docs()[..1]))?;
                     blobs.fail_delete_of(&up[0].storage_key);
                     inv.step("boom", |_| Err::<(), _>(FlowError::Conflict("referencia 9".into())))
                   });
  assert!(matches!(exec.result, Err(FlowError::Conflict(_))));
  let report = exec.compensation.unwrap();
  assert_eq!(report.orphaned.len(), 1);
  assert_eq!(blobs.len(), 1);
}

#[test]
fn cancelled_invocation_stops_before_next_step_and_compensates() {
  let (engine, store, blobs) = engine(false);
  let token = CancellationToken::new();
  let res: Result<(), FlowError> = engine.execute("cancel", &token, |inv| {
                                            inv.step("upload", |inv| inv.upload(&docs()))?;
                                            token.cancel();
                                            inv.step("never", |inv| {
                                                 inv.scope().push("row".into());
                                                 Ok(())
                                               })
                                          });
  let err = res.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Cancelled);
  assert_eq!(blobs.len(), 0);
  assert!(store.rows.lock().unwrap().is_empty());
}

#[test]
fn cancellation_after_last_step_prevents_commit() {
  let (engine, store, _blobs) = engine(false);
  let token = CancellationToken::new();
  let res: Result<(), FlowError> = engine.execute("late-cancel", &token, |inv| {
                                            inv.step("write", |inv| {
                                                 inv.scope().push("row".into());
                                                 Ok::<_, FlowError>(())
                                               })?;
                                            token.cancel();
                                            Ok(())
                                          });
  assert!(matches!(res, Err(FlowError::Cancelled(ref step)) if step == "commit"));
  assert!(store.rows.lock().unwrap().is_empty());
}

#[test]
fn failed_commit_is_compensated_like_a_step_failure() {
  let (engine, store, blobs) = engine(false);
  store.fail_commit.store(true, Ordering::SeqCst);
  let exec = engine.execute_with_report("commit-fail", &CancellationToken::new(), |inv| {
                     inv.step("upload", |inv| inv.upload(&docs())).map(|_| ())
                   });
  assert!(matches!(exec.result, Err(FlowError::Storage(_))));
  assert_eq!(exec.compensation.unwrap().deleted.len(), 3);
  assert_eq!(blobs.len(), 0);
}
