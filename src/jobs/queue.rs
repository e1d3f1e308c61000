use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::import::{ImportPipeline, ImportRequest};
use crate::store::Store;
use crate::types::{ImportJob, JobStatus};

struct QueuedImport {
    job: ImportJob,
    request: ImportRequest,
}

type Watchers = Arc<Mutex<HashMap<String, watch::Sender<JobStatus>>>>;

struct WorkerContext {
    store: Arc<dyn Store>,
    pipeline: ImportPipeline,
    watchers: Watchers,
}

/// In-process import queue.
///
/// Each submitted file becomes an `import_jobs` row before it is queued.
/// Workers take jobs one at a time; a job's rows run on the blocking pool.
pub struct ImportQueue {
    store: Arc<dyn Store>,
    sender: Mutex<Option<mpsc::UnboundedSender<QueuedImport>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    watchers: Watchers,
}

impl ImportQueue {
    /// Spawns `config.workers` workers on the current tokio runtime.
    pub fn start(store: Arc<dyn Store>, config: &AppConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let watchers: Watchers = Arc::new(Mutex::new(HashMap::new()));

        let ctx = Arc::new(WorkerContext {
            store: Arc::clone(&store),
            pipeline: ImportPipeline::new(Arc::clone(&store), config.max_import_bytes),
            watchers: Arc::clone(&watchers),
        });

        let workers: Vec<JoinHandle<()>> = (0..config.workers.max(1))
            .map(|worker_id| {
                let receiver = Arc::clone(&receiver);
                let ctx = Arc::clone(&ctx);
                tokio::spawn(async move {
                    tracing::info!("Import worker {} started", worker_id);
                    loop {
                        let next = receiver.lock().await.recv().await;
                        let Some(queued) = next else {
                            break;
                        };
                        ctx.process(worker_id, queued).await;
                    }
                    tracing::info!("Import worker {} stopped", worker_id);
                })
            })
            .collect();

        Self {
            store,
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            watchers,
        }
    }

    /// Records a queued job for `request` and hands it to the workers.
    pub fn submit(&self, request: ImportRequest) -> Result<ImportJob> {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(Error::QueueClosed)?;

        let (file_size, file_digest) = fingerprint(&request.file_buffer);
        let job = ImportJob {
            id: Uuid::new_v4().to_string(),
            file_name: request.file_name.clone(),
            file_size,
            file_digest,
            project_id: request.project_id.clone(),
            user_id: request.user_id.clone(),
            skip_duplicates: request.skip_duplicates,
            update_existing: request.update_existing,
            status: JobStatus::Queued,
            summary: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        };
        self.store.create_import_job(&job)?;

        let (tx, _) = watch::channel(JobStatus::Queued);
        self.watchers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(job.id.clone(), tx);

        tracing::info!(
            "Queued import job {} for {} ({} bytes)",
            job.id,
            job.file_name,
            job.file_size
        );

        let queued = QueuedImport {
            job: job.clone(),
            request,
        };
        if sender.send(queued).is_err() {
            let mut failed = job;
            failed.status = JobStatus::Failed;
            failed.error = Some(Error::QueueClosed.to_string());
            failed.finished_at = Some(Utc::now());
            self.store.update_import_job(&failed)?;
            self.watchers
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&failed.id);
            return Err(Error::QueueClosed);
        }

        Ok(job)
    }

    /// Waits until the job is completed or failed and returns its record.
    ///
    /// Jobs not submitted through this queue are returned as stored.
    pub async fn wait(&self, job_id: &str) -> Result<ImportJob> {
        let receiver = self
            .watchers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(job_id)
            .map(watch::Sender::subscribe);

        if let Some(mut receiver) = receiver {
            // A dropped sender means the worker is done; the store has the result.
            let _ = receiver.wait_for(|status| status.is_terminal()).await;
        }

        self.store.get_import_job(job_id)?.ok_or(Error::NotFound)
    }

    /// Stops accepting jobs and waits for workers to drain the queue.
    pub async fn shutdown(&self) {
        self.sender
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        let workers: Vec<_> = self
            .workers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();

        for worker in workers {
            if let Err(e) = worker.await {
                tracing::error!("Import worker ended abnormally: {}", e);
            }
        }
    }
}

impl WorkerContext {
    async fn process(&self, worker_id: usize, queued: QueuedImport) {
        let QueuedImport { mut job, request } = queued;

        tracing::info!(
            "Worker {} starting import job {} for file: {}",
            worker_id,
            job.id,
            job.file_name
        );
        job.status = JobStatus::Running;
        job.started_at = Some(Utc::now());
        self.save(&job);

        let pipeline = self.pipeline.clone();
        let outcome = tokio::task::spawn_blocking(move || pipeline.run(&request)).await;

        match outcome {
            Ok(Ok(summary)) => match serde_json::to_value(&summary) {
                Ok(value) => {
                    job.status = JobStatus::Completed;
                    job.summary = Some(value);
                }
                Err(e) => {
                    job.status = JobStatus::Failed;
                    job.error = Some(format!("failed to encode import summary: {e}"));
                }
            },
            Ok(Err(e)) => {
                job.status = JobStatus::Failed;
                job.error = Some(e.to_string());
            }
            Err(e) => {
                job.status = JobStatus::Failed;
                job.error = Some(format!("import task aborted: {e}"));
            }
        }
        job.finished_at = Some(Utc::now());

        match job.status {
            JobStatus::Completed => tracing::info!("Import job {} completed", job.id),
            _ => tracing::error!(
                "Import job {} failed: {}",
                job.id,
                job.error.as_deref().unwrap_or("unknown error")
            ),
        }
        self.save(&job);

        self.watchers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&job.id);
    }

    fn save(&self, job: &ImportJob) {
        if let Err(e) = self.store.update_import_job(job) {
            tracing::error!("Failed to record state of import job {}: {}", job.id, e);
        }
        if let Some(tx) = self
            .watchers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&job.id)
        {
            tx.send_replace(job.status);
        }
    }
}

/// Size and hex sha256 of the decoded file. Payloads that are not valid
/// base64 are fingerprinted as submitted; the worker reports the decode error.
fn fingerprint(file_buffer: &str) -> (i64, String) {
    let bytes = STANDARD
        .decode(file_buffer.trim())
        .unwrap_or_else(|_| file_buffer.as_bytes().to_vec());
    let digest = hex::encode(Sha256::digest(&bytes));
    (i64::try_from(bytes.len()).unwrap_or(i64::MAX), digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use tempfile::TempDir;

    fn setup(workers: usize) -> (TempDir, Arc<dyn Store>, ImportQueue) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        let store: Arc<dyn Store> = Arc::new(store);
        let config = AppConfig {
            workers,
            ..AppConfig::default()
        };
        let queue = ImportQueue::start(Arc::clone(&store), &config);
        (temp, store, queue)
    }

    #[test]
    fn test_fingerprint() {
        let (size, digest) = fingerprint(&STANDARD.encode("abc"));
        assert_eq!(size, 3);
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_submit_and_wait_completes() {
        let (_temp, store, queue) = setup(2);

        let csv = "Industry,Asset Class,Make,Model\nConstruction,Excavator,Volvo,A40G\n";
        let job = queue
            .submit(ImportRequest::from_bytes("assets.csv", csv.as_bytes(), "user-1"))
            .unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.file_size, csv.len() as i64);

        let done = queue.wait(&job.id).await.unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert!(done.started_at.is_some());
        assert!(done.finished_at.is_some());
        let summary = done.summary.unwrap();
        assert_eq!(summary["processed"], 1);
        assert_eq!(summary["total"], 1);

        assert_eq!(store.list_import_jobs(10).unwrap().len(), 1);
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_empty_file_fails_job() {
        let (_temp, _store, queue) = setup(1);

        let job = queue
            .submit(ImportRequest::from_bytes(
                "empty.csv",
                b"Industry,Asset Class,Make,Model\n",
                "user-1",
            ))
            .unwrap();
        let done = queue.wait(&job.id).await.unwrap();

        assert_eq!(done.status, JobStatus::Failed);
        assert_eq!(done.error.as_deref(), Some("CSV file is empty or invalid"));
        assert!(done.summary.is_none());
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_concurrent_jobs_share_taxonomy() {
        let (_temp, store, queue) = setup(4);

        let csv = "industry,assetName,makeName,modelName\n\
                   construction,excavator,volvo,a40g\n\
                   construction,excavator,cat,320\n";
        let mut ids = Vec::new();
        for i in 0..6 {
            let mut request =
                ImportRequest::from_bytes(format!("batch-{i}.csv"), csv.as_bytes(), "user-1");
            request.skip_duplicates = false;
            ids.push(queue.submit(request).unwrap().id);
        }

        for id in &ids {
            let done = queue.wait(id).await.unwrap();
            assert_eq!(done.status, JobStatus::Completed, "{:?}", done.error);
            assert_eq!(done.summary.unwrap()["errors"], 0);
        }

        assert_eq!(
            store.list_industries(&Default::default()).unwrap().len(),
            1
        );
        assert_eq!(store.list_makes(&Default::default()).unwrap().len(), 2);
        assert_eq!(store.equipment_stats(None).unwrap().total_equipments, 12);
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_rejected() {
        let (_temp, _store, queue) = setup(1);
        queue.shutdown().await;

        let result = queue.submit(ImportRequest::from_bytes("late.csv", b"x", "user-1"));
        assert!(matches!(result, Err(Error::QueueClosed)));
    }
}
