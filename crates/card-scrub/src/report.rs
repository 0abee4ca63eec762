use std::fmt;
use std::path::PathBuf;

use card_scrub_types::PixelRect;

use crate::stage::ImageFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Ocr,
    Process,
    Io,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Ocr => "ocr",
            FailureKind::Process => "process",
            FailureKind::Io => "io",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutcome {
    /// Text was found, inpainted and written to `output`.
    Succeeded {
        output: PathBuf,
        regions: Vec<PixelRect>,
    },
    /// Nothing matched; the source was copied or re-encoded to `output`.
    Unchanged { output: PathBuf },
    Failed(ImageFailure),
}

impl ImageOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ImageOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageReport {
    pub input: PathBuf,
    pub outcome: ImageOutcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub unchanged: usize,
    pub failed: Vec<(PathBuf, ImageFailure)>,
    /// Images never started because the run was cancelled.
    pub skipped: usize,
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn record(&mut self, report: &ImageReport) {
        match &report.outcome {
            ImageOutcome::Succeeded { .. } => self.succeeded += 1,
            ImageOutcome::Unchanged { .. } => self.unchanged += 1,
            ImageOutcome::Failed(failure) => {
                self.failed.push((report.input.clone(), failure.clone()));
            }
        }
    }

    pub fn processed(&self) -> usize {
        self.succeeded + self.unchanged + self.failed.len()
    }

    pub fn total(&self) -> usize {
        self.processed() + self.skipped
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Process exit status for this run: 1 when strict and something failed
    /// or the run was cut short, else 0.
    pub fn exit_status(&self, strict: bool) -> u8 {
        if strict && (self.has_failures() || self.cancelled) {
            1
        } else {
            0
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} images: {} cleaned, {} unchanged, {} failed, {} skipped",
            self.total(),
            self.succeeded,
            self.unchanged,
            self.failed.len(),
            self.skipped
        )?;
        for (path, failure) in &self.failed {
            write!(f, "\n  {}: {}", path.display(), failure)?;
        }
        Ok(())
    }
}
