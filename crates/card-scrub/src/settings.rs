use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use card_scrub_inpaint::{Configuration as InpaintConfiguration, InpaintMethod};
use card_scrub_ocr::{Backend, Configuration as OcrConfiguration, TesseractConfig};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::cli::{CliArgs, CliSources};
use crate::stage::is_supported_extension;
use crate::stage::matcher::{DEFAULT_FUZZY_DISTANCE, MatchMode};

pub const DEFAULT_PHRASES: &[&str] = &[
    "Playtest Card — Not for sale",
    "WillieTanner Proxy e NOT FOR SALE",
    "Proxy e NOT FOR SALE",
    "« Not for Sale ¢ TTP Proxy ¢",
    "Not for Sale ¢ TTP Proxy ¢",
    "Custom Proxy « NOT FOR SALE",
    "Custom Proxy e NOT FOR SALE",
    "Playtest Card - Not for sale",
    "mpcautofill.com",
    "not for sanctioned play",
    "proxy by deelight",
    "Not for sale!",
    "Not for sale",
    "Playtest Card-",
    "Playtest Card -",
    "Playtest Card",
    "Custom Proxy",
    "TTP Proxy",
    "WillieTanner Proxy Not for sale",
    "WillieTanner Proxy",
    "PsilosX Proxy",
    "Proxy",
];

pub const DEFAULT_PAD_WIDTH: u32 = 8;
pub const DEFAULT_PAD_HEIGHT: u32 = 0;
pub const DEFAULT_DILATE: bool = true;
pub const DEFAULT_DILATION_KERNEL: u32 = 5;
pub const DEFAULT_DILATION_ITERATIONS: u32 = 1;
pub const MAX_DILATION_KERNEL: u32 = 511;
pub const DEFAULT_INPAINT_RADIUS: f64 = 3.0;
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";
pub const MAX_PAGE_SEGMENTATION: u8 = 13;
pub const DEFAULT_COMBINE_THRESHOLD: u32 = 50;
pub const DEFAULT_INPUT_DIR: &str = "input";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_MAX_WORKERS: usize = 1;

/// On-disk configuration document. Every key is optional; missing keys fall
/// back to built-in defaults. Unknown keys are rejected.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub phrases: Option<Vec<String>>,
    pub padding: Option<i64>,
    pub pad_width: Option<i64>,
    pub pad_height: Option<i64>,
    pub dilate: Option<bool>,
    pub dilation_kernel: Option<i64>,
    pub dilation_iterations: Option<i64>,
    pub inpaint_radius: Option<f64>,
    pub inpaint_method: Option<String>,
    pub ocr_backend: Option<String>,
    pub ocr_engine_path: Option<PathBuf>,
    pub ocr_language: Option<String>,
    pub ocr_psm: Option<i64>,
    pub min_confidence: Option<f32>,
    pub match_mode: Option<String>,
    pub fuzzy_distance: Option<i64>,
    pub combine_threshold: Option<i64>,
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub output_extension: Option<String>,
    pub max_workers: Option<i64>,
    pub debug: Option<bool>,
    pub strict: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Padding {
    pub horizontal: u32,
    pub vertical: u32,
}

impl Default for Padding {
    fn default() -> Self {
        Self {
            horizontal: DEFAULT_PAD_WIDTH,
            vertical: DEFAULT_PAD_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DilationSettings {
    pub enabled: bool,
    pub kernel: u32,
    pub iterations: u32,
}

impl DilationSettings {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl Default for DilationSettings {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_DILATE,
            kernel: DEFAULT_DILATION_KERNEL,
            iterations: DEFAULT_DILATION_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InpaintSettings {
    pub radius: f64,
    pub method: InpaintMethod,
}

impl Default for InpaintSettings {
    fn default() -> Self {
        Self {
            radius: DEFAULT_INPAINT_RADIUS,
            method: InpaintMethod::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrSettings {
    pub backend: Backend,
    /// Tesseract executable; `None` resolves `tesseract` from `PATH`.
    pub engine_path: Option<PathBuf>,
    pub language: String,
    pub page_segmentation: Option<u8>,
    pub min_confidence: Option<f32>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Tesseract,
            engine_path: None,
            language: DEFAULT_OCR_LANGUAGE.to_string(),
            page_segmentation: None,
            min_confidence: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSettings {
    pub mode: MatchMode,
    pub fuzzy_distance: u32,
    pub combine_threshold: u32,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            mode: MatchMode::default(),
            fuzzy_distance: DEFAULT_FUZZY_DISTANCE,
            combine_threshold: DEFAULT_COMBINE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoSettings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Lowercase extension without the dot; `None` keeps the source format.
    pub output_extension: Option<String>,
}

impl Default for IoSettings {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            output_extension: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub max_workers: usize,
    pub debug: bool,
    /// Failed images make the run exit non-zero.
    pub strict: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            debug: false,
            strict: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub phrases: Vec<String>,
    pub padding: Padding,
    pub dilation: DilationSettings,
    pub inpaint: InpaintSettings,
    pub ocr: OcrSettings,
    pub matching: MatchSettings,
    pub io: IoSettings,
    pub run: RunSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            phrases: DEFAULT_PHRASES.iter().map(|p| p.to_string()).collect(),
            padding: Padding::default(),
            dilation: DilationSettings::default(),
            inpaint: InpaintSettings::default(),
            ocr: OcrSettings::default(),
            matching: MatchSettings::default(),
            io: IoSettings::default(),
            run: RunSettings::default(),
        }
    }
}

impl Settings {
    /// Validates a configuration document on its own, without CLI overrides.
    pub fn from_file_config(
        file: FileConfig,
        config_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let resolved = merge(
            &CliArgs::default(),
            &CliSources::default(),
            file,
            config_path.map(Path::to_path_buf),
        )?;
        Ok(resolved.settings)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        Self::from_file_config(file, None)
    }

    pub fn to_file_config(&self) -> FileConfig {
        FileConfig {
            phrases: Some(self.phrases.clone()),
            padding: None,
            pad_width: Some(i64::from(self.padding.horizontal)),
            pad_height: Some(i64::from(self.padding.vertical)),
            dilate: Some(self.dilation.enabled),
            dilation_kernel: Some(i64::from(self.dilation.kernel)),
            dilation_iterations: Some(i64::from(self.dilation.iterations)),
            inpaint_radius: Some(self.inpaint.radius),
            inpaint_method: Some(self.inpaint.method.as_str().to_string()),
            ocr_backend: Some(self.ocr.backend.as_str().to_string()),
            ocr_engine_path: self.ocr.engine_path.clone(),
            ocr_language: Some(self.ocr.language.clone()),
            ocr_psm: self.ocr.page_segmentation.map(i64::from),
            min_confidence: self.ocr.min_confidence,
            match_mode: Some(self.matching.mode.as_str().to_string()),
            fuzzy_distance: Some(i64::from(self.matching.fuzzy_distance)),
            combine_threshold: Some(i64::from(self.matching.combine_threshold)),
            input_dir: Some(self.io.input_dir.clone()),
            output_dir: Some(self.io.output_dir.clone()),
            output_extension: self.io.output_extension.clone(),
            max_workers: Some(self.run.max_workers as i64),
            debug: Some(self.run.debug),
            strict: Some(self.run.strict),
        }
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(&self.to_file_config())
            .map_err(|source| ConfigError::Serialize { source })
    }

    pub fn ocr_configuration(&self) -> OcrConfiguration {
        let mut tesseract = TesseractConfig::default();
        if let Some(path) = &self.ocr.engine_path {
            tesseract.engine_path = path.clone();
        }
        tesseract.language = self.ocr.language.clone();
        tesseract.page_segmentation = self.ocr.page_segmentation;
        OcrConfiguration {
            backend: self.ocr.backend,
            tesseract,
        }
    }

    pub fn inpaint_configuration(&self) -> InpaintConfiguration {
        InpaintConfiguration {
            method: self.inpaint.method,
            radius: self.inpaint.radius,
        }
    }
}

#[derive(Debug)]
pub struct ResolvedSettings {
    pub settings: Settings,
    pub config_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Serialize {
        source: toml::ser::Error,
    },
    InvalidValue {
        path: Option<PathBuf>,
        field: &'static str,
        value: String,
    },
    NotFound {
        path: PathBuf,
    },
    MissingOcrEngine {
        path: PathBuf,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(
                    f,
                    "failed to read config file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "failed to parse config file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Serialize { source } => {
                write!(f, "failed to serialize configuration: {}", source)
            }
            ConfigError::InvalidValue { path, field, value } => {
                if let Some(path) = path {
                    write!(
                        f,
                        "invalid value '{}' for '{}' in {}",
                        value,
                        field,
                        path.display()
                    )
                } else {
                    write!(f, "invalid value '{}' for '{}'", value, field)
                }
            }
            ConfigError::NotFound { path } => {
                write!(f, "config file {} does not exist", path.display())
            }
            ConfigError::MissingOcrEngine { path } => {
                write!(f, "OCR engine {} does not exist", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Serialize { source } => Some(source),
            ConfigError::InvalidValue { .. } => None,
            ConfigError::NotFound { .. } => None,
            ConfigError::MissingOcrEngine { .. } => None,
        }
    }
}

pub fn resolve_settings(
    cli: &CliArgs,
    sources: &CliSources,
) -> Result<ResolvedSettings, ConfigError> {
    let (file, config_path) = load_config(cli.config.as_deref())?;
    merge(cli, sources, file, config_path)
}

fn load_config(path_override: Option<&Path>) -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
    if let Some(path) = path_override {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let config = load_file_config(path)?;
        return Ok((config, Some(path.to_path_buf())));
    }

    if let Some(project_path) = project_config_path()
        && project_path.exists()
    {
        let config = load_file_config(&project_path)?;
        return Ok((config, Some(project_path)));
    }

    let Some(default_path) = default_config_path() else {
        return Ok((FileConfig::default(), None));
    };
    if !default_path.exists() {
        return Ok((FileConfig::default(), None));
    }
    let config = load_file_config(&default_path)?;
    Ok((config, Some(default_path)))
}

pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(config)
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("rs", "card-scrub", "card-scrub")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    env::current_dir().ok().map(|dir| dir.join("config.toml"))
}

fn merge(
    cli: &CliArgs,
    sources: &CliSources,
    file: FileConfig,
    config_path: Option<PathBuf>,
) -> Result<ResolvedSettings, ConfigError> {
    let path = config_path.as_ref();

    let phrases = cli
        .phrases
        .clone()
        .or(file.phrases)
        .unwrap_or_else(|| Settings::default().phrases);

    let file_padding = optional_u32(file.padding, "padding", path)?;
    let file_pad_width = optional_u32(file.pad_width, "pad_width", path)?;
    let file_pad_height = optional_u32(file.pad_height, "pad_height", path)?;
    let padding = Padding {
        horizontal: cli
            .pad_width
            .or(cli.padding)
            .or(file_pad_width)
            .or(file_padding)
            .unwrap_or(DEFAULT_PAD_WIDTH),
        vertical: cli
            .pad_height
            .or(cli.padding)
            .or(file_pad_height)
            .or(file_padding)
            .unwrap_or(DEFAULT_PAD_HEIGHT),
    };

    let dilation_kernel = match cli.dilation_kernel {
        Some(value) => Some(value),
        None => optional_u32(file.dilation_kernel, "dilation_kernel", path)?,
    }
    .unwrap_or(DEFAULT_DILATION_KERNEL);
    if dilation_kernel > MAX_DILATION_KERNEL {
        return Err(invalid(
            cli.dilation_kernel.is_none().then_some(path).flatten(),
            "dilation_kernel",
            dilation_kernel,
        ));
    }
    let dilation = DilationSettings {
        enabled: !cli.no_dilate && file.dilate.unwrap_or(DEFAULT_DILATE),
        kernel: dilation_kernel,
        iterations: match cli.dilation_iterations {
            Some(value) => Some(value),
            None => optional_u32(file.dilation_iterations, "dilation_iterations", path)?,
        }
        .unwrap_or(DEFAULT_DILATION_ITERATIONS),
    };

    let inpaint = InpaintSettings {
        radius: resolve_radius(
            cli.inpaint_radius,
            file.inpaint_radius,
            !sources.inpaint_radius_from_cli,
            path,
        )?,
        method: resolve_named::<InpaintMethod>(
            cli.inpaint_method.clone(),
            file.inpaint_method,
            "inpaint_method",
            path,
        )?
        .unwrap_or_default(),
    };

    let ocr = OcrSettings {
        backend: resolve_named::<Backend>(
            cli.ocr_backend.clone(),
            file.ocr_backend,
            "ocr_backend",
            path,
        )?
        .unwrap_or(Backend::Tesseract),
        engine_path: resolve_engine_path(cli.ocr_engine_path.clone().or(file.ocr_engine_path))?,
        language: normalize_string(cli.ocr_language.clone())
            .or_else(|| normalize_string(file.ocr_language))
            .unwrap_or_else(|| DEFAULT_OCR_LANGUAGE.to_string()),
        page_segmentation: resolve_psm(cli.ocr_psm, file.ocr_psm, path)?,
        min_confidence: resolve_confidence(cli.min_confidence, file.min_confidence, path)?,
    };

    let matching = MatchSettings {
        mode: resolve_named::<MatchMode>(
            cli.match_mode.clone(),
            file.match_mode,
            "match_mode",
            path,
        )?
        .unwrap_or_default(),
        fuzzy_distance: match cli.fuzzy_distance {
            Some(value) => Some(value),
            None => optional_u32(file.fuzzy_distance, "fuzzy_distance", path)?,
        }
        .unwrap_or(DEFAULT_FUZZY_DISTANCE),
        combine_threshold: match cli.combine_threshold {
            Some(value) => Some(value),
            None => optional_u32(file.combine_threshold, "combine_threshold", path)?,
        }
        .unwrap_or(DEFAULT_COMBINE_THRESHOLD),
    };

    let io = IoSettings {
        input_dir: cli
            .input_dir
            .clone()
            .or(file.input_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_DIR)),
        output_dir: cli
            .output_dir
            .clone()
            .or(file.output_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        output_extension: resolve_output_extension(
            cli.output_extension.clone(),
            file.output_extension,
            path,
        )?,
    };

    let run = RunSettings {
        max_workers: resolve_max_workers(
            cli.max_workers,
            file.max_workers,
            !sources.max_workers_from_cli,
            path,
        )?,
        debug: cli.debug || file.debug.unwrap_or(false),
        strict: !cli.lenient && file.strict.unwrap_or(true),
    };

    let settings = Settings {
        phrases,
        padding,
        dilation,
        inpaint,
        ocr,
        matching,
        io,
        run,
    };

    Ok(ResolvedSettings {
        settings,
        config_path,
    })
}

fn invalid(path: Option<&PathBuf>, field: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        path: path.cloned(),
        field,
        value: value.to_string(),
    }
}

fn optional_u32(
    value: Option<i64>,
    field: &'static str,
    config_path: Option<&PathBuf>,
) -> Result<Option<u32>, ConfigError> {
    match value {
        None => Ok(None),
        Some(raw) => u32::try_from(raw)
            .map(Some)
            .map_err(|_| invalid(config_path, field, raw)),
    }
}

fn normalize_string(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn resolve_named<T: FromStr>(
    cli_value: Option<String>,
    file_value: Option<String>,
    field: &'static str,
    config_path: Option<&PathBuf>,
) -> Result<Option<T>, ConfigError> {
    if let Some(value) = normalize_string(cli_value) {
        return T::from_str(&value)
            .map(Some)
            .map_err(|_| invalid(None, field, value));
    }
    let Some(value) = normalize_string(file_value) else {
        return Ok(None);
    };
    T::from_str(&value)
        .map(Some)
        .map_err(|_| invalid(config_path, field, value))
}

fn resolve_radius(
    cli_value: f64,
    file_value: Option<f64>,
    use_file: bool,
    config_path: Option<&PathBuf>,
) -> Result<f64, ConfigError> {
    if use_file && let Some(value) = file_value {
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(config_path, "inpaint_radius", value));
        }
        return Ok(value);
    }
    if !use_file {
        return Ok(cli_value);
    }
    Ok(DEFAULT_INPAINT_RADIUS)
}

fn resolve_max_workers(
    cli_value: usize,
    file_value: Option<i64>,
    use_file: bool,
    config_path: Option<&PathBuf>,
) -> Result<usize, ConfigError> {
    if !use_file {
        return Ok(cli_value);
    }
    match file_value {
        None => Ok(DEFAULT_MAX_WORKERS),
        Some(value) if value >= 1 => {
            usize::try_from(value).map_err(|_| invalid(config_path, "max_workers", value))
        }
        Some(value) => Err(invalid(config_path, "max_workers", value)),
    }
}

fn resolve_psm(
    cli_value: Option<u8>,
    file_value: Option<i64>,
    config_path: Option<&PathBuf>,
) -> Result<Option<u8>, ConfigError> {
    if let Some(value) = cli_value {
        if value > MAX_PAGE_SEGMENTATION {
            return Err(invalid(None, "ocr_psm", value));
        }
        return Ok(Some(value));
    }
    match file_value {
        None => Ok(None),
        Some(value) => match u8::try_from(value) {
            Ok(psm) if psm <= MAX_PAGE_SEGMENTATION => Ok(Some(psm)),
            _ => Err(invalid(config_path, "ocr_psm", value)),
        },
    }
}

fn resolve_confidence(
    cli_value: Option<f32>,
    file_value: Option<f32>,
    config_path: Option<&PathBuf>,
) -> Result<Option<f32>, ConfigError> {
    let (value, path) = match (cli_value, file_value) {
        (Some(value), _) => (value, None),
        (None, Some(value)) => (value, config_path),
        (None, None) => return Ok(None),
    };
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(invalid(path, "min_confidence", value));
    }
    Ok(Some(value))
}

fn resolve_output_extension(
    cli_value: Option<String>,
    file_value: Option<String>,
    config_path: Option<&PathBuf>,
) -> Result<Option<String>, ConfigError> {
    let (raw, path) = match normalize_string(cli_value) {
        Some(value) => (value, None),
        None => match normalize_string(file_value) {
            Some(value) => (value, config_path),
            None => return Ok(None),
        },
    };
    let extension = raw.trim_start_matches('.').to_ascii_lowercase();
    if !is_supported_extension(&extension) {
        return Err(invalid(path, "output_extension", raw));
    }
    Ok(Some(extension))
}

/// A configured engine that names a path (rather than a bare command looked
/// up on `PATH`) must exist.
fn resolve_engine_path(value: Option<PathBuf>) -> Result<Option<PathBuf>, ConfigError> {
    let Some(path) = value else {
        return Ok(None);
    };
    if path.as_os_str().is_empty() {
        return Ok(None);
    }
    let looks_like_path = path.is_absolute() || path.components().count() > 1;
    if looks_like_path && !path.exists() {
        return Err(ConfigError::MissingOcrEngine { path });
    }
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(contents: &str) -> Result<Settings, ConfigError> {
        Settings::from_toml_str(contents)
    }

    #[test]
    fn empty_document_yields_defaults() {
        let settings = from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.padding.horizontal, 8);
        assert_eq!(settings.padding.vertical, 0);
        assert!(settings.dilation.enabled);
        assert_eq!(settings.inpaint.method, InpaintMethod::Telea);
        assert_eq!(settings.run.max_workers, 1);
        assert_eq!(settings.matching.combine_threshold, 50);
        assert_eq!(settings.ocr.backend, Backend::Tesseract);
        assert!(settings.phrases.iter().any(|p| p == "Not for sale"));
    }

    #[test]
    fn settings_round_trip_through_toml() {
        let settings = from_toml(
            r#"
            phrases = ["SET ID", "WATERMARK"]
            pad_width = 4
            pad_height = 2
            dilate = false
            dilation_kernel = 7
            dilation_iterations = 2
            inpaint_radius = 4.5
            inpaint_method = "ns"
            ocr_backend = "noop"
            ocr_language = "deu"
            ocr_psm = 11
            min_confidence = 42.5
            match_mode = "fuzzy"
            fuzzy_distance = 2
            combine_threshold = 50
            input_dir = "cards"
            output_dir = "clean"
            output_extension = ".PNG"
            max_workers = 6
            debug = true
            strict = false
            "#,
        )
        .unwrap();
        assert_eq!(settings.io.output_extension.as_deref(), Some("png"));
        assert_eq!(settings.inpaint.method, InpaintMethod::NavierStokes);
        assert_eq!(settings.ocr.backend, Backend::Noop);
        assert_eq!(settings.ocr_configuration().backend, Backend::Noop);

        let text = settings.to_toml_string().unwrap();
        let reloaded = from_toml(&text).unwrap();
        assert_eq!(reloaded, settings);

        let defaults = Settings::default();
        let reloaded = from_toml(&defaults.to_toml_string().unwrap()).unwrap();
        assert_eq!(reloaded, defaults);
    }

    #[test]
    fn padding_shorthand_sets_both_axes() {
        let settings = from_toml("padding = 5").unwrap();
        assert_eq!(
            settings.padding,
            Padding {
                horizontal: 5,
                vertical: 5
            }
        );
        let settings = from_toml("padding = 5\npad_height = 1").unwrap();
        assert_eq!(
            settings.padding,
            Padding {
                horizontal: 5,
                vertical: 1
            }
        );
    }

    #[test]
    fn cli_overrides_file_values() {
        let file = FileConfig {
            pad_width: Some(3),
            max_workers: Some(4),
            inpaint_radius: Some(6.0),
            debug: Some(false),
            strict: Some(true),
            ..Default::default()
        };
        let cli = CliArgs {
            pad_width: Some(11),
            max_workers: 2,
            inpaint_radius: 1.5,
            debug: true,
            lenient: true,
            ..Default::default()
        };
        let sources = CliSources {
            inpaint_radius_from_cli: true,
            max_workers_from_cli: true,
        };
        let settings = merge(&cli, &sources, file, None).unwrap().settings;
        assert_eq!(settings.padding.horizontal, 11);
        assert_eq!(settings.run.max_workers, 2);
        assert_eq!(settings.inpaint.radius, 1.5);
        assert!(settings.run.debug);
        assert!(!settings.run.strict);
    }

    #[test]
    fn file_values_win_over_cli_defaults() {
        let file = FileConfig {
            max_workers: Some(4),
            inpaint_radius: Some(6.0),
            ..Default::default()
        };
        let cli = CliArgs {
            max_workers: DEFAULT_MAX_WORKERS,
            inpaint_radius: DEFAULT_INPAINT_RADIUS,
            ..Default::default()
        };
        let settings = merge(&cli, &CliSources::default(), file, None)
            .unwrap()
            .settings;
        assert_eq!(settings.run.max_workers, 4);
        assert_eq!(settings.inpaint.radius, 6.0);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let cases = [
            ("pad_width = -1", "pad_width"),
            ("padding = -4", "padding"),
            ("dilation_kernel = 600", "dilation_kernel"),
            ("dilation_iterations = -2", "dilation_iterations"),
            ("inpaint_radius = 0.0", "inpaint_radius"),
            ("inpaint_radius = -3.0", "inpaint_radius"),
            ("inpaint_method = \"patchmatch\"", "inpaint_method"),
            ("match_mode = \"regex\"", "match_mode"),
            ("max_workers = 0", "max_workers"),
            ("output_extension = \"gif\"", "output_extension"),
            ("min_confidence = 140.0", "min_confidence"),
            ("ocr_psm = 14", "ocr_psm"),
            ("ocr_backend = \"paddle\"", "ocr_backend"),
            ("combine_threshold = -1", "combine_threshold"),
        ];
        for (document, expected) in cases {
            let err = from_toml(document).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { field, .. } if field == expected),
                "{document}: {err}"
            );
        }
    }

    #[test]
    fn missing_engine_path_is_reported() {
        let err = from_toml("ocr_engine_path = \"/definitely/not/here/tesseract\"").unwrap_err();
        assert!(matches!(err, ConfigError::MissingOcrEngine { .. }));
        let settings = from_toml("ocr_engine_path = \"tesseract5\"").unwrap();
        assert_eq!(settings.ocr.engine_path, Some(PathBuf::from("tesseract5")));
        assert_eq!(
            settings.ocr_configuration().tesseract.engine_path,
            PathBuf::from("tesseract5")
        );
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = from_toml("phrases = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn explicit_missing_config_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = load_config(Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));

        let present = dir.path().join("config.toml");
        fs::write(&present, "pad_width = 12\n").unwrap();
        let (file, path) = load_config(Some(&present)).unwrap();
        assert_eq!(file.pad_width, Some(12));
        assert_eq!(path, Some(present));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        for document in ["texts = [\"Proxy\"]", "kernel_size = 5", "tesseract_cmd = \"tesseract\""] {
            let err = from_toml(document).unwrap_err();
            assert!(matches!(err, ConfigError::Parse { .. }), "{document}: {err}");
        }
    }

    #[test]
    fn cli_selects_ocr_backend() {
        let file = FileConfig {
            ocr_backend: Some("tesseract".to_string()),
            ..Default::default()
        };
        let cli = CliArgs {
            ocr_backend: Some("NOOP".to_string()),
            ..Default::default()
        };
        let settings = merge(&cli, &CliSources::default(), file, None)
            .unwrap()
            .settings;
        assert_eq!(settings.ocr.backend, Backend::Noop);

        let cli = CliArgs {
            ocr_backend: Some("paddle".to_string()),
            ..Default::default()
        };
        let err = merge(&cli, &CliSources::default(), FileConfig::default(), None).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "ocr_backend",
                path: None,
                ..
            }
        ));
    }

    #[test]
    fn empty_phrase_list_is_allowed() {
        let settings = from_toml("phrases = []").unwrap();
        assert!(settings.phrases.is_empty());
    }
}
