mod tsv;

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use image::ImageFormat;
use tracing::debug;

pub use tsv::parse_tsv;

use crate::{OcrEngine, OcrError, OcrRequest, OcrResponse};

const DEFAULT_ENGINE_PATH: &str = "tesseract";
const DEFAULT_LANGUAGE: &str = "eng";

#[derive(Debug, Clone, PartialEq)]
pub struct TesseractConfig {
    pub engine_path: PathBuf,
    pub language: String,
    pub page_segmentation: Option<u8>,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            engine_path: PathBuf::from(DEFAULT_ENGINE_PATH),
            language: DEFAULT_LANGUAGE.to_string(),
            page_segmentation: None,
        }
    }
}

/// Runs the `tesseract` executable once per image and reads its TSV output.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    engine_path: PathBuf,
    language: String,
    page_segmentation: Option<u8>,
}

impl TesseractEngine {
    pub fn new() -> Result<Self, OcrError> {
        Self::with_config(TesseractConfig::default())
    }

    pub fn with_config(config: TesseractConfig) -> Result<Self, OcrError> {
        let language = config.language.trim();
        if language.is_empty() {
            return Err(OcrError::backend("tesseract language must not be empty"));
        }
        if config.engine_path.as_os_str().is_empty() {
            return Err(OcrError::backend("tesseract engine path must not be empty"));
        }
        Ok(Self {
            engine_path: config.engine_path,
            language: language.to_string(),
            page_segmentation: config.page_segmentation,
        })
    }

    pub fn engine_path(&self) -> &Path {
        &self.engine_path
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.engine_path);
        command.arg("stdin").arg("stdout");
        command.arg("-l").arg(&self.language);
        if let Some(psm) = self.page_segmentation {
            command.arg("--psm").arg(psm.to_string());
        }
        command.arg("tsv");
        command
    }

    fn unavailable(&self, source: std::io::Error) -> OcrError {
        OcrError::Unavailable {
            path: self.engine_path.clone(),
            source,
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn warm_up(&self) -> Result<(), OcrError> {
        let output = Command::new(&self.engine_path)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .map_err(|err| self.unavailable(err))?;
        if !output.status.success() {
            return Err(OcrError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let version = String::from_utf8_lossy(&output.stdout);
        debug!(
            engine = %self.engine_path.display(),
            version = version.lines().next().unwrap_or("").trim(),
            "tesseract available"
        );
        Ok(())
    }

    fn recognize(&self, request: &OcrRequest<'_>) -> Result<OcrResponse, OcrError> {
        let (width, height) = request.dimensions();
        if width == 0 || height == 0 {
            return Ok(OcrResponse::empty());
        }

        let mut encoded = Cursor::new(Vec::new());
        request
            .image()
            .write_to(&mut encoded, ImageFormat::Png)
            .map_err(|err| OcrError::Encode(err.to_string()))?;
        let encoded = encoded.into_inner();

        let mut child = self
            .command()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| self.unavailable(err))?;

        let Some(mut stdin) = child.stdin.take() else {
            return Err(OcrError::backend("tesseract stdin was not captured"));
        };

        // Feed stdin from a separate thread so a full stdout pipe cannot stall us.
        let output = thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(&encoded));
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
            (output, written)
        });
        let output = match output {
            (Ok(output), _) if !output.status.success() => {
                return Err(OcrError::Failed {
                    status: output.status.to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                });
            }
            (Ok(output), Ok(())) => output,
            (Ok(_), Err(err)) | (Err(err), _) => return Err(self.unavailable(err)),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let words = parse_tsv(&stdout)?;
        debug!(words = words.len(), width, height, "tesseract recognized words");
        Ok(OcrResponse::new(words))
    }
}
