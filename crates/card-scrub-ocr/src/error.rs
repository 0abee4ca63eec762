use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine '{}' could not be started: {source}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("OCR engine exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("malformed OCR output at line {line}: {message}")]
    Malformed { line: usize, message: String },
    #[error("failed to encode image for OCR: {0}")]
    Encode(String),
    #[error("OCR backend error: {0}")]
    Backend(String),
}

impl OcrError {
    pub fn backend(message: impl Into<String>) -> Self {
        OcrError::Backend(message.into())
    }

    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        OcrError::Malformed {
            line,
            message: message.into(),
        }
    }
}
