pub mod matcher;
pub mod regions;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use card_scrub_inpaint::{InpaintError, Inpainter};
use card_scrub_ocr::{OcrEngine, OcrRequest};
use card_scrub_types::PixelRect;
use image::{DynamicImage, GenericImageView, ImageError, ImageFormat, Rgba};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tracing::{debug, error, info, warn};

use crate::report::{FailureKind, ImageOutcome};
use crate::settings::{DilationSettings, Padding, Settings};
use matcher::PhraseMatcher;

/// Image file extensions the pipeline reads and writes, lowercase.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

pub const DEBUG_DIR_NAME: &str = "debug";

const OVERLAY_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const OVERLAY_THICKNESS: u32 = 2;

pub fn is_supported_extension(extension: &str) -> bool {
    let lower = extension.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS.contains(&lower.as_str())
}

/// Steps an image moves through. A failure records the step that was being
/// attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageStage {
    Loaded,
    Located,
    Matched,
    Masked,
    Inpainted,
    Saved,
}

impl ImageStage {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageStage::Loaded => "load",
            ImageStage::Located => "ocr",
            ImageStage::Matched => "match",
            ImageStage::Masked => "mask",
            ImageStage::Inpainted => "inpaint",
            ImageStage::Saved => "save",
        }
    }
}

impl fmt::Display for ImageStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFailure {
    pub stage: ImageStage,
    pub kind: FailureKind,
    pub message: String,
}

impl ImageFailure {
    pub fn new(stage: ImageStage, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
        }
    }

    fn io(stage: ImageStage, err: std::io::Error) -> Self {
        Self::new(stage, FailureKind::Io, err.to_string())
    }

    fn image(stage: ImageStage, err: ImageError) -> Self {
        let kind = match err {
            ImageError::IoError(_) => FailureKind::Io,
            _ => FailureKind::Process,
        };
        Self::new(stage, kind, err.to_string())
    }
}

impl fmt::Display for ImageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed ({}): {}", self.stage, self.kind, self.message)
    }
}

impl std::error::Error for ImageFailure {}

/// Everything a worker needs to process one image, minus the OCR engine
/// which each worker owns.
#[derive(Clone)]
pub struct PipelineConfig {
    pub matcher: PhraseMatcher,
    pub padding: Padding,
    pub combine_threshold: u32,
    pub dilation: DilationSettings,
    pub inpainter: Arc<dyn Inpainter>,
    pub output_dir: PathBuf,
    pub output_extension: Option<String>,
    pub debug_dir: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self, InpaintError> {
        let matcher = PhraseMatcher::new(
            &settings.phrases,
            settings.matching.mode,
            settings.matching.fuzzy_distance,
        )
        .with_min_confidence(settings.ocr.min_confidence);
        let inpainter = settings.inpaint_configuration().create_inpainter()?;
        let debug_dir = settings
            .run
            .debug
            .then(|| settings.io.output_dir.join(DEBUG_DIR_NAME));
        Ok(Self {
            matcher,
            padding: settings.padding,
            combine_threshold: settings.matching.combine_threshold,
            dilation: settings.dilation,
            inpainter,
            output_dir: settings.io.output_dir.clone(),
            output_extension: settings.io.output_extension.clone(),
            debug_dir,
        })
    }

    /// Extension written for `input`: the configured override or the
    /// source's own extension.
    pub fn output_extension_for(&self, input: &Path) -> String {
        match &self.output_extension {
            Some(extension) => extension.clone(),
            None => input
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned())
                .unwrap_or_else(|| "png".to_string()),
        }
    }

    pub fn output_path(&self, input: &Path) -> PathBuf {
        let stem = file_stem(input);
        self.output_dir
            .join(format!("{stem}.{}", self.output_extension_for(input)))
    }

    pub fn debug_path(&self, input: &Path) -> Option<PathBuf> {
        let stem = file_stem(input);
        self.debug_dir.as_ref().map(|dir| {
            dir.join(format!("debug_{stem}.{}", self.output_extension_for(input)))
        })
    }
}

fn file_stem(input: &Path) -> String {
    input
        .file_stem()
        .unwrap_or(input.as_os_str())
        .to_string_lossy()
        .into_owned()
}

/// Runs one image through OCR, matching, masking and inpainting and writes
/// the result. Failures are logged and returned as an outcome; they never
/// panic or abort the caller.
pub fn process_image(config: &PipelineConfig, engine: &dyn OcrEngine, input: &Path) -> ImageOutcome {
    match run_stages(config, engine, input) {
        Ok(outcome) => outcome,
        Err(failure) => {
            error!(
                path = %input.display(),
                stage = %failure.stage,
                kind = %failure.kind,
                "{}",
                failure.message
            );
            ImageOutcome::Failed(failure)
        }
    }
}

fn run_stages(
    config: &PipelineConfig,
    engine: &dyn OcrEngine,
    input: &Path,
) -> Result<ImageOutcome, ImageFailure> {
    let source = image::open(input).map_err(|err| ImageFailure::image(ImageStage::Loaded, err))?;
    let (width, height) = source.dimensions();
    debug!(path = %input.display(), width, height, "loaded image");

    let rgb = source.to_rgb8();
    let response = engine
        .recognize(&OcrRequest::new(&rgb))
        .map_err(|err| ImageFailure::new(ImageStage::Located, FailureKind::Ocr, err.to_string()))?;
    debug!(path = %input.display(), words = response.words.len(), engine = engine.name(), "located text");

    let matches = config.matcher.find(&response.words);
    let rects = regions::plan_regions(
        &matches,
        config.padding,
        config.combine_threshold,
        width,
        height,
    );

    let output = config.output_path(input);
    if rects.is_empty() {
        info!(path = %input.display(), "no phrases found, keeping original");
        write_unchanged(config, input, &source, &output)?;
        write_debug_overlay(config, input, &source, &rects);
        return Ok(ImageOutcome::Unchanged { output });
    }

    let mask = regions::build_mask(&rects, width, height, &config.dilation);
    debug!(path = %input.display(), masked = mask.count(), "built mask");

    let working = if source.color().has_alpha() {
        DynamicImage::ImageRgba8(source.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(rgb)
    };
    let cleaned = config
        .inpainter
        .inpaint(&working, &mask)
        .map_err(|err| ImageFailure::new(ImageStage::Inpainted, FailureKind::Process, err.to_string()))?;

    save_image(&cleaned, &output, &config.output_extension_for(input))?;
    write_debug_overlay(config, input, &source, &rects);
    info!(path = %input.display(), output = %output.display(), regions = rects.len(), "removed text");
    Ok(ImageOutcome::Succeeded {
        output,
        regions: rects,
    })
}

fn write_unchanged(
    config: &PipelineConfig,
    input: &Path,
    source: &DynamicImage,
    output: &Path,
) -> Result<(), ImageFailure> {
    let source_extension = input
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    let target_extension = config.output_extension_for(input);
    if source_extension.as_deref() == Some(target_extension.to_ascii_lowercase().as_str()) {
        if is_same_file(input, output) {
            debug!(path = %input.display(), "output is the source file, leaving it in place");
            return Ok(());
        }
        fs::copy(input, output).map_err(|err| ImageFailure::io(ImageStage::Saved, err))?;
        return Ok(());
    }
    save_image(source, output, &target_extension)
}

/// Copying a file onto itself truncates it, so in-place runs compare the
/// resolved paths first. A missing output is never the same file.
fn is_same_file(input: &Path, output: &Path) -> bool {
    match (fs::canonicalize(input), fs::canonicalize(output)) {
        (Ok(input), Ok(output)) => input == output,
        _ => false,
    }
}

fn save_image(image: &DynamicImage, path: &Path, extension: &str) -> Result<(), ImageFailure> {
    let format = ImageFormat::from_extension(extension).ok_or_else(|| {
        ImageFailure::new(
            ImageStage::Saved,
            FailureKind::Process,
            format!("unsupported output extension '{extension}'"),
        )
    })?;
    let encodable = encodable_for(image, format);
    encodable
        .save_with_format(path, format)
        .map_err(|err| ImageFailure::image(ImageStage::Saved, err))
}

/// Converts to a pixel layout the target encoder accepts.
fn encodable_for(image: &DynamicImage, format: ImageFormat) -> DynamicImage {
    let has_alpha = image.color().has_alpha();
    match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ if has_alpha => DynamicImage::ImageRgba8(image.to_rgba8()),
        _ => DynamicImage::ImageRgb8(image.to_rgb8()),
    }
}

/// Draws the final mask rectangles on a copy of the source.
pub fn render_overlay(source: &DynamicImage, rects: &[PixelRect]) -> DynamicImage {
    let mut canvas = source.to_rgba8();
    for rect in rects {
        for inset in 0..OVERLAY_THICKNESS {
            let width = rect.width.saturating_sub(inset * 2);
            let height = rect.height.saturating_sub(inset * 2);
            if width == 0 || height == 0 {
                break;
            }
            let outline = Rect::at((rect.x + inset) as i32, (rect.y + inset) as i32).of_size(width, height);
            draw_hollow_rect_mut(&mut canvas, outline, OVERLAY_COLOR);
        }
    }
    DynamicImage::ImageRgba8(canvas)
}

fn write_debug_overlay(config: &PipelineConfig, input: &Path, source: &DynamicImage, rects: &[PixelRect]) {
    let Some(path) = config.debug_path(input) else {
        return;
    };
    let overlay = render_overlay(source, rects);
    if let Err(failure) = save_image(&overlay, &path, &config.output_extension_for(input)) {
        warn!(path = %path.display(), "failed to write debug overlay: {}", failure.message);
    }
}
