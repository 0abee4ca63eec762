use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};

use crate::settings::{DEFAULT_INPAINT_RADIUS, DEFAULT_MAX_WORKERS};

#[derive(Debug, Default)]
pub struct CliSources {
    pub inpaint_radius_from_cli: bool,
    pub max_workers_from_cli: bool,
}

impl CliSources {
    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            inpaint_radius_from_cli: value_from_cli(matches, "inpaint_radius"),
            max_workers_from_cli: value_from_cli(matches, "max_workers"),
        }
    }
}

fn value_from_cli(matches: &ArgMatches, id: &str) -> bool {
    matches
        .value_source(id)
        .is_some_and(|source| matches!(source, ValueSource::CommandLine))
}

pub fn parse_cli() -> (CliArgs, CliSources) {
    let command = CliArgs::command();
    let matches = command.get_matches();
    let args = match CliArgs::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(err) => err.exit(),
    };
    let sources = CliSources::from_matches(&matches);
    (args, sources)
}

#[derive(Debug, Default, Parser)]
#[command(
    name = "card-scrub",
    about = "Find configured phrases on card images with OCR and inpaint them away",
    disable_help_subcommand = true
)]
pub struct CliArgs {
    /// Override the configuration file path
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long = "print-config")]
    pub print_config: bool,

    /// Print the available OCR backends and inpainting methods
    #[arg(long = "list-backends")]
    pub list_backends: bool,

    /// Phrases to remove (each value is one phrase)
    #[arg(long = "phrases", num_args = 1.., value_name = "PHRASE")]
    pub phrases: Option<Vec<String>>,

    /// Padding in pixels applied on every side of a match
    #[arg(long = "padding")]
    pub padding: Option<u32>,

    /// Horizontal padding in pixels (left and right)
    #[arg(long = "pad-width")]
    pub pad_width: Option<u32>,

    /// Vertical padding in pixels (top and bottom)
    #[arg(long = "pad-height")]
    pub pad_height: Option<u32>,

    /// Disable morphological dilation of the mask
    #[arg(long = "no-dilate")]
    pub no_dilate: bool,

    /// Side of the square dilation kernel in pixels
    #[arg(long = "dilation-kernel")]
    pub dilation_kernel: Option<u32>,

    /// Number of dilation passes
    #[arg(long = "dilation-iterations")]
    pub dilation_iterations: Option<u32>,

    /// Neighbourhood radius used by the inpainting method
    #[arg(
        long = "inpaint-radius",
        id = "inpaint_radius",
        default_value_t = DEFAULT_INPAINT_RADIUS,
        value_parser = parse_positive_f64
    )]
    pub inpaint_radius: f64,

    /// Inpainting method (telea, ns)
    #[arg(long = "inpaint-method")]
    pub inpaint_method: Option<String>,

    /// OCR backend (tesseract, noop)
    #[arg(long = "ocr-backend")]
    pub ocr_backend: Option<String>,

    /// Path or command name of the tesseract executable
    #[arg(long = "ocr-engine-path")]
    pub ocr_engine_path: Option<PathBuf>,

    /// OCR language code passed to the engine
    #[arg(long = "ocr-language")]
    pub ocr_language: Option<String>,

    /// Tesseract page segmentation mode (0-13)
    #[arg(long = "ocr-psm")]
    pub ocr_psm: Option<u8>,

    /// Ignore OCR words below this confidence (0-100)
    #[arg(long = "min-confidence")]
    pub min_confidence: Option<f32>,

    /// Word comparison policy (case-insensitive, exact, fuzzy)
    #[arg(long = "match-mode")]
    pub match_mode: Option<String>,

    /// Maximum edit distance per word in fuzzy mode
    #[arg(long = "fuzzy-distance")]
    pub fuzzy_distance: Option<u32>,

    /// Merge padded regions closer than this many pixels (0 disables)
    #[arg(long = "combine-threshold")]
    pub combine_threshold: Option<u32>,

    /// Directory scanned for input images
    #[arg(short = 'i', long = "input-dir")]
    pub input_dir: Option<PathBuf>,

    /// Directory receiving processed images
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Re-encode outputs with this extension instead of the source one
    #[arg(long = "output-extension")]
    pub output_extension: Option<String>,

    /// Number of images processed concurrently
    #[arg(
        short = 'j',
        long = "max-workers",
        id = "max_workers",
        default_value_t = DEFAULT_MAX_WORKERS,
        value_parser = parse_positive_usize
    )]
    pub max_workers: usize,

    /// Verbose logging and debug overlays
    #[arg(long = "debug")]
    pub debug: bool,

    /// Exit with status 0 even when some images failed
    #[arg(long = "lenient")]
    pub lenient: bool,
}

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|_| format!("'{value}' is not a valid number"))?;
    if parsed == 0 {
        return Err("value must be at least 1".into());
    }
    Ok(parsed)
}

fn parse_positive_f64(value: &str) -> Result<f64, String> {
    let parsed = value
        .parse::<f64>()
        .map_err(|_| format!("'{value}' is not a valid number"))?;
    if !parsed.is_finite() || parsed <= 0.0 {
        return Err("value must be a positive number".into());
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> (CliArgs, CliSources) {
        let matches = CliArgs::command()
            .try_get_matches_from(args)
            .expect("arguments parse");
        let cli = CliArgs::from_arg_matches(&matches).expect("arguments map");
        (cli, CliSources::from_matches(&matches))
    }

    #[test]
    fn defaults_are_not_marked_as_cli_values() {
        let (cli, sources) = parse(&["card-scrub"]);
        assert_eq!(cli.max_workers, DEFAULT_MAX_WORKERS);
        assert_eq!(cli.inpaint_radius, DEFAULT_INPAINT_RADIUS);
        assert!(!sources.max_workers_from_cli);
        assert!(!sources.inpaint_radius_from_cli);
        assert!(cli.phrases.is_none());
    }

    #[test]
    fn explicit_values_are_tracked() {
        let (cli, sources) = parse(&[
            "card-scrub",
            "--max-workers",
            "4",
            "--inpaint-radius",
            "5.5",
            "--phrases",
            "Not for sale",
            "Proxy",
            "--no-dilate",
        ]);
        assert_eq!(cli.max_workers, 4);
        assert_eq!(cli.inpaint_radius, 5.5);
        assert!(sources.max_workers_from_cli);
        assert!(sources.inpaint_radius_from_cli);
        assert_eq!(
            cli.phrases,
            Some(vec!["Not for sale".to_string(), "Proxy".to_string()])
        );
        assert!(cli.no_dilate);
    }

    #[test]
    fn backend_flag_is_passed_through() {
        let (cli, _) = parse(&["card-scrub", "--ocr-backend", "noop"]);
        assert_eq!(cli.ocr_backend.as_deref(), Some("noop"));
    }

    #[test]
    fn zero_workers_are_rejected() {
        assert!(
            CliArgs::command()
                .try_get_matches_from(["card-scrub", "--max-workers", "0"])
                .is_err()
        );
        assert!(parse_positive_usize("0").is_err());
        assert_eq!(parse_positive_usize("3"), Ok(3));
    }

    #[test]
    fn radius_must_be_positive() {
        assert!(parse_positive_f64("0").is_err());
        assert!(parse_positive_f64("-2").is_err());
        assert!(parse_positive_f64("abc").is_err());
        assert_eq!(parse_positive_f64("2.5"), Ok(2.5));
    }

    #[test]
    fn negative_padding_is_rejected_by_parser() {
        assert!(
            CliArgs::command()
                .try_get_matches_from(["card-scrub", "--pad-width", "-3"])
                .is_err()
        );
    }
}
