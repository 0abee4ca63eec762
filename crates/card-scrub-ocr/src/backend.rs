use std::fmt;
use std::str::FromStr;

use crate::{NoopOcrEngine, OcrEngine, OcrError, TesseractConfig, TesseractEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Tesseract,
    Noop,
}

#[derive(Debug, Clone)]
pub struct Configuration {
    pub backend: Backend,
    pub tesseract: TesseractConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            backend: Backend::Tesseract,
            tesseract: TesseractConfig::default(),
        }
    }
}

impl Configuration {
    pub fn available_backends() -> Vec<Backend> {
        vec![Backend::Tesseract, Backend::Noop]
    }

    /// Builds a fresh engine handle. Each caller gets its own handle.
    pub fn create_engine(&self) -> Result<Box<dyn OcrEngine>, OcrError> {
        match self.backend {
            Backend::Tesseract => Ok(Box::new(TesseractEngine::with_config(
                self.tesseract.clone(),
            )?)),
            Backend::Noop => Ok(Box::new(NoopOcrEngine)),
        }
    }
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Tesseract => "tesseract",
            Backend::Noop => "noop",
        }
    }

    pub fn available() -> Vec<Backend> {
        Configuration::available_backends()
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tesseract" => Ok(Backend::Tesseract),
            "noop" => Ok(Backend::Noop),
            other => Err(OcrError::backend(format!("unknown OCR backend '{other}'"))),
        }
    }
}
