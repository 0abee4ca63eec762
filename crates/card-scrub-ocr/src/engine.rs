use crate::{OcrError, OcrRequest, OcrResponse};

/// A text locator that turns an image into word boxes.
///
/// Engines are `Send + Sync` so a worker can own one behind a `Box`; the
/// batch driver never shares a single engine between workers.
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Probes the engine so misconfiguration surfaces before the first image.
    fn warm_up(&self) -> Result<(), OcrError> {
        Ok(())
    }

    fn recognize(&self, request: &OcrRequest<'_>) -> Result<OcrResponse, OcrError>;
}

/// Engine that never finds any text.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOcrEngine;

impl OcrEngine for NoopOcrEngine {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn recognize(&self, _request: &OcrRequest<'_>) -> Result<OcrResponse, OcrError> {
        Ok(OcrResponse::empty())
    }
}
