use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use card_scrub_inpaint::InpaintError;
use card_scrub_ocr::{OcrEngine, OcrError};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::report::{BatchSummary, FailureKind, ImageOutcome, ImageReport};
use crate::settings::Settings;
use crate::stage::{ImageFailure, ImageStage, PipelineConfig, is_supported_extension, process_image};

/// Builds one OCR engine handle per worker.
pub type EngineFactory = Arc<dyn Fn() -> Result<Box<dyn OcrEngine>, OcrError> + Send + Sync>;

pub fn engine_factory(settings: &Settings) -> EngineFactory {
    let configuration = settings.ocr_configuration();
    Arc::new(move || configuration.create_engine())
}

/// Cooperative stop signal. Workers finish the image they are on and then
/// stop taking new ones.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
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

#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started { total: usize, workers: usize },
    ImageStarted { input: PathBuf, worker: usize },
    ImageFinished(ImageReport),
    Cancelled { remaining: usize },
    Finished,
}

#[derive(Debug)]
pub enum BatchError {
    InputDir { path: PathBuf, source: io::Error },
    OutputDir { path: PathBuf, source: io::Error },
    Engine(OcrError),
    Inpaint(InpaintError),
    Worker(String),
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::InputDir { path, source } => {
                write!(
                    f,
                    "failed to read input directory {}: {}",
                    path.display(),
                    source
                )
            }
            BatchError::OutputDir { path, source } => {
                write!(
                    f,
                    "failed to create output directory {}: {}",
                    path.display(),
                    source
                )
            }
            BatchError::Engine(err) => write!(f, "OCR engine unavailable: {err}"),
            BatchError::Inpaint(err) => write!(f, "inpainting setup failed: {err}"),
            BatchError::Worker(message) => write!(f, "worker task failed: {message}"),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchError::InputDir { source, .. } => Some(source),
            BatchError::OutputDir { source, .. } => Some(source),
            BatchError::Engine(err) => Some(err),
            BatchError::Inpaint(err) => Some(err),
            BatchError::Worker(_) => None,
        }
    }
}

/// Supported image files directly inside `dir`, sorted by path.
pub async fn list_images(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let read_err = |source| BatchError::InputDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_err)?;
    let mut images = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        let path = entry.path();
        let is_file = entry.file_type().await.map_err(read_err)?.is_file();
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(is_supported_extension);
        if is_file && supported {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// Splits off images whose output path is already claimed by an earlier
/// image in `images`. The first claimant keeps the path; the rest fail.
fn claim_output_paths(
    pipeline: &PipelineConfig,
    images: Vec<PathBuf>,
) -> (Vec<PathBuf>, Vec<ImageReport>) {
    let mut owners: HashMap<PathBuf, PathBuf> = HashMap::with_capacity(images.len());
    let mut claimed = Vec::with_capacity(images.len());
    let mut clashes = Vec::new();
    for input in images {
        let output = pipeline.output_path(&input);
        if let Some(owner) = owners.get(&output) {
            let failure = ImageFailure::new(
                ImageStage::Saved,
                FailureKind::Process,
                format!(
                    "output {} is already written for {}",
                    output.display(),
                    owner.display()
                ),
            );
            clashes.push(ImageReport {
                input,
                outcome: ImageOutcome::Failed(failure),
            });
        } else {
            owners.insert(output, input.clone());
            claimed.push(input);
        }
    }
    (claimed, clashes)
}

enum WorkerMessage {
    Started { input: PathBuf, worker: usize },
    Finished(ImageReport),
}

/// Processes every supported image in `settings.io.input_dir`.
///
/// Per-image failures are recorded in the summary; only setup problems
/// (unreadable input directory, unusable output directory, missing OCR
/// engine, invalid inpainting parameters) return an error.
pub async fn run_batch<F>(
    settings: &Settings,
    engine_factory: EngineFactory,
    cancel: CancelToken,
    mut on_event: F,
) -> Result<BatchSummary, BatchError>
where
    F: FnMut(&BatchEvent),
{
    let pipeline = Arc::new(PipelineConfig::from_settings(settings).map_err(BatchError::Inpaint)?);
    let images = list_images(&settings.io.input_dir).await?;
    let mut summary = BatchSummary::default();
    if images.is_empty() {
        warn!(dir = %settings.io.input_dir.display(), "no images found");
        on_event(&BatchEvent::Started {
            total: 0,
            workers: 0,
        });
        on_event(&BatchEvent::Finished);
        return Ok(summary);
    }

    let (images, clashes) = claim_output_paths(&pipeline, images);

    create_dir(&pipeline.output_dir).await?;
    if let Some(debug_dir) = &pipeline.debug_dir {
        create_dir(debug_dir).await?;
    }

    let worker_count = settings.run.max_workers.clamp(1, images.len());
    let mut engines: Vec<Arc<dyn OcrEngine>> = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        let engine = engine_factory().map_err(BatchError::Engine)?;
        engines.push(Arc::from(engine));
    }
    let probe = Arc::clone(&engines[0]);
    tokio::task::spawn_blocking(move || probe.warm_up())
        .await
        .map_err(|err| BatchError::Worker(err.to_string()))?
        .map_err(BatchError::Engine)?;

    let total = images.len() + clashes.len();
    info!(
        total,
        workers = worker_count,
        engine = engines[0].name(),
        method = %settings.inpaint.method,
        "starting batch"
    );
    on_event(&BatchEvent::Started {
        total,
        workers: worker_count,
    });
    for report in clashes {
        warn!(path = %report.input.display(), "skipping image with a duplicate output path");
        summary.record(&report);
        on_event(&BatchEvent::ImageFinished(report));
    }

    let queue = Arc::new(Mutex::new(VecDeque::from(images)));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut handles = Vec::with_capacity(worker_count);
    for (worker, engine) in engines.into_iter().enumerate() {
        let queue = Arc::clone(&queue);
        let pipeline = Arc::clone(&pipeline);
        let cancel = cancel.clone();
        let tx = tx.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            loop {
                if cancel.is_cancelled() {
                    debug!(worker, "worker stopping after cancellation");
                    break;
                }
                let Some(input) = queue.lock().pop_front() else {
                    break;
                };
                if tx
                    .send(WorkerMessage::Started {
                        input: input.clone(),
                        worker,
                    })
                    .is_err()
                {
                    break;
                }
                let outcome = process_image(&pipeline, engine.as_ref(), &input);
                if tx
                    .send(WorkerMessage::Finished(ImageReport { input, outcome }))
                    .is_err()
                {
                    break;
                }
            }
        }));
    }
    drop(tx);

    while let Some(message) = rx.recv().await {
        let event = match message {
            WorkerMessage::Started { input, worker } => BatchEvent::ImageStarted { input, worker },
            WorkerMessage::Finished(report) => {
                summary.record(&report);
                BatchEvent::ImageFinished(report)
            }
        };
        on_event(&event);
    }

    for handle in handles {
        handle
            .await
            .map_err(|err| BatchError::Worker(err.to_string()))?;
    }

    let remaining = queue.lock().len();
    if remaining > 0 {
        summary.skipped = remaining;
        summary.cancelled = true;
        warn!(remaining, "batch cancelled");
        on_event(&BatchEvent::Cancelled { remaining });
    }
    info!(
        succeeded = summary.succeeded,
        unchanged = summary.unchanged,
        failed = summary.failed.len(),
        skipped = summary.skipped,
        "batch finished"
    );
    on_event(&BatchEvent::Finished);
    Ok(summary)
}

async fn create_dir(path: &Path) -> Result<(), BatchError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| BatchError::OutputDir {
            path: path.to_path_buf(),
            source,
        })
}
