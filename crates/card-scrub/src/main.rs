use std::io;
use std::process::ExitCode;

use card_scrub::batch::{self, BatchEvent, CancelToken};
use card_scrub::cli::{CliArgs, CliSources, parse_cli};
use card_scrub::settings::resolve_settings;
use card_scrub::stage::matcher::MatchMode;
use card_scrub_inpaint::InpaintMethod;
use card_scrub_ocr::Backend;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const EXIT_FATAL: u8 = 2;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let (cli_args, cli_sources): (CliArgs, CliSources) = parse_cli();

    if cli_args.list_backends {
        display_available_backends();
        return ExitCode::SUCCESS;
    }

    let resolved = match resolve_settings(&cli_args, &cli_sources) {
        Ok(resolved) => resolved,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(EXIT_FATAL);
        }
    };
    let settings = resolved.settings;

    if cli_args.print_config {
        return match settings.to_toml_string() {
            Ok(text) => {
                print!("{text}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("error: {err}");
                ExitCode::from(EXIT_FATAL)
            }
        };
    }

    init_tracing(settings.run.debug);
    match &resolved.config_path {
        Some(path) => info!(path = %path.display(), "loaded configuration"),
        None => info!("no configuration file found, using defaults"),
    }

    let cancel = CancelToken::new();
    spawn_interrupt_handler(cancel.clone());

    let progress = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
    progress.set_style(progress_style());

    let factory = batch::engine_factory(&settings);
    let result = batch::run_batch(&settings, factory, cancel, |event| {
        render_event(&progress, event)
    })
    .await;

    match result {
        Ok(summary) => {
            progress.finish_and_clear();
            println!("{summary}");
            ExitCode::from(summary.exit_status(settings.run.strict))
        }
        Err(err) => {
            progress.abandon();
            error!("{err}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn spawn_interrupt_handler(cancel: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current images");
            cancel.cancel();
        }
    });
}

fn render_event(progress: &ProgressBar, event: &BatchEvent) {
    match event {
        BatchEvent::Started { total, workers } => {
            progress.set_length(*total as u64);
            progress.set_message(format!("{workers} worker(s)"));
        }
        BatchEvent::ImageStarted { input, .. } => {
            if let Some(name) = input.file_name() {
                progress.set_message(name.to_string_lossy().into_owned());
            }
        }
        BatchEvent::ImageFinished(_) => progress.inc(1),
        BatchEvent::Cancelled { remaining } => {
            progress.set_message(format!("cancelled, {remaining} skipped"));
        }
        BatchEvent::Finished => {}
    }
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
}

fn display_available_backends() {
    let ocr: Vec<_> = Backend::available().iter().map(|b| b.as_str()).collect();
    let methods: Vec<_> = InpaintMethod::available()
        .iter()
        .map(|m| m.as_str())
        .collect();
    let modes: Vec<_> = MatchMode::available().iter().map(|m| m.as_str()).collect();
    println!("ocr backends: {}", ocr.join(", "));
    println!("inpaint methods: {}", methods.join(", "));
    println!("match modes: {}", modes.join(", "));
}
