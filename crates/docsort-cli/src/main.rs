use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use docsort_core::config_file::{self, ConfigFile};
use docsort_core::{
    DEFAULT_EXTENSION, DEFAULT_LANGUAGE, MatchMode, ProgressEvent, RunConfig, TextExtractor,
};
use docsort_ocr::TesseractBackend;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

mod output;

use output::ColorMode;

/// Categories file looked up when none is configured.
const DEFAULT_CATEGORIES_FILE: &str = "categories.conf";

const REQUIREMENTS: &str = "\
Requirements:
  poppler-utils      renders the first page of each PDF (pdftoppm)
  tesseract-ocr      recognises the rendered text
  tesseract-ocr-por  language data for the default language; install the
                     package matching any other --lang code

Environment:
  DOCSORT_LANG, DOCSORT_CONFIG, DOCSORT_DEST override the config file.
  RUST_LOG controls diagnostic logging on stderr.";

/// Document Organizer - File PDF documents into category folders by their content
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, after_help = REQUIREMENTS)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify every PDF below a folder and move it into its category folder
    Organize {
        /// Folder to organize (default: directory of the executable)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// OCR language code, e.g. por, eng, por+eng
        #[arg(short, long)]
        lang: Option<String>,

        /// Categories file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Folder under which category folders are created
        /// (default: directory of the executable)
        #[arg(short, long)]
        dest: Option<PathBuf>,

        /// Require every keyword of a category to match, not just one
        #[arg(short, long)]
        match_all: bool,

        /// Show directories, files and extracted text as they are processed
        #[arg(short, long)]
        verbose: bool,

        /// Classify and report without creating folders or moving files
        #[arg(long)]
        dry_run: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Run OCR on a single PDF and print the recognised text
    TestOcr {
        /// Path to the PDF file
        file: PathBuf,

        /// OCR language code, e.g. por, eng, por+eng
        #[arg(short, long)]
        lang: Option<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// List the configured categories, optionally classifying a sample text
    Categories {
        /// Categories file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Report which category this text would be filed under
        #[arg(long)]
        text: Option<String>,

        /// Require every keyword of a category to match, not just one
        #[arg(short, long)]
        match_all: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let file_config = config_file::load_config();

    match cli.command {
        Command::Organize {
            path,
            lang,
            config,
            dest,
            match_all,
            verbose,
            dry_run,
            no_color,
        } => {
            init_tracing(verbose);
            let match_all = match_all || file_config.match_all().unwrap_or(false);
            let settings = OrganizeSettings {
                root: match path {
                    Some(path) => path,
                    None => executable_dir()?,
                },
                destination: match resolve_destination(dest, &file_config) {
                    Some(dest) => dest,
                    None => executable_dir()?,
                },
                categories_path: resolve_categories_path(config, &file_config),
                language: resolve_language(lang, &file_config),
                match_mode: MatchMode::from_match_all(match_all),
                verbose,
                dry_run,
            };
            organize(settings, &file_config, color_mode(no_color))
        }
        Command::TestOcr {
            file,
            lang,
            no_color,
        } => {
            init_tracing(false);
            let language = resolve_language(lang, &file_config);
            test_ocr(&file, &language, &file_config, color_mode(no_color))
        }
        Command::Categories {
            config,
            text,
            match_all,
            no_color,
        } => {
            init_tracing(false);
            let path = resolve_categories_path(config, &file_config);
            let match_all = match_all || file_config.match_all().unwrap_or(false);
            list_categories(
                &path,
                text.as_deref(),
                MatchMode::from_match_all(match_all),
                color_mode(no_color),
            )
        }
    }
}

/// Diagnostics go to stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,docsort=debug,docsort_core=debug,docsort_categories=debug,docsort_ocr=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn color_mode(no_color: bool) -> ColorMode {
    ColorMode(!no_color && std::io::stdout().is_terminal())
}

fn executable_dir() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("Error determining executable location")?;
    exe.parent()
        .map(Path::to_path_buf)
        .context("Executable has no parent directory")
}

// Resolve configuration: CLI flags > env vars > config file > defaults

fn resolve_language(flag: Option<String>, file_config: &ConfigFile) -> String {
    flag.or_else(|| std::env::var("DOCSORT_LANG").ok())
        .or_else(|| file_config.language().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}

fn resolve_categories_path(flag: Option<PathBuf>, file_config: &ConfigFile) -> PathBuf {
    flag.or_else(|| std::env::var("DOCSORT_CONFIG").ok().map(PathBuf::from))
        .or_else(|| file_config.categories_path().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CATEGORIES_FILE))
}

fn resolve_destination(flag: Option<PathBuf>, file_config: &ConfigFile) -> Option<PathBuf> {
    flag.or_else(|| std::env::var("DOCSORT_DEST").ok().map(PathBuf::from))
        .or_else(|| file_config.destination().map(PathBuf::from))
}

fn build_backend(file_config: &ConfigFile) -> TesseractBackend {
    let mut backend = TesseractBackend::new();
    if let Some(ocr) = &file_config.ocr {
        if let Some(program) = &ocr.pdftoppm {
            backend = backend.with_pdftoppm(program);
        }
        if let Some(program) = &ocr.tesseract {
            backend = backend.with_tesseract(program);
        }
        if let Some(dpi) = ocr.dpi {
            backend = backend.with_dpi(dpi);
        }
        if let Some(psm) = ocr.psm {
            backend = backend.with_psm(psm);
        }
    }
    backend
}

struct OrganizeSettings {
    root: PathBuf,
    destination: PathBuf,
    categories_path: PathBuf,
    language: String,
    match_mode: MatchMode,
    verbose: bool,
    dry_run: bool,
}

fn organize(
    settings: OrganizeSettings,
    file_config: &ConfigFile,
    color: ColorMode,
) -> anyhow::Result<()> {
    let mut writer = std::io::stdout();

    let categories = docsort_categories::load_categories(&settings.categories_path)
        .with_context(|| {
            format!(
                "Error loading categories from {}",
                settings.categories_path.display()
            )
        })?;

    let backend = build_backend(file_config);
    if !backend.is_available() {
        tracing::warn!("pdftoppm or tesseract could not be started; see --help for requirements");
    }

    let config = RunConfig {
        language: settings.language.clone(),
        match_mode: settings.match_mode,
        destination_root: settings.destination.clone(),
        extension: file_config
            .extension()
            .unwrap_or(DEFAULT_EXTENSION)
            .to_string(),
        verbose: settings.verbose,
        dry_run: settings.dry_run,
    };

    if settings.verbose {
        output::print_settings(
            &mut writer,
            &settings.root,
            &settings.destination,
            &settings.categories_path,
            &settings.language,
            settings.match_mode,
            settings.dry_run,
        )?;
    }

    // Spinner would interleave with verbose output, so only show it on quiet runs
    let spinner = (!settings.verbose && std::io::stdout().is_terminal()).then(|| {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    });

    let verbose = settings.verbose;
    let progress_cb = |event: ProgressEvent| {
        let print = || {
            let mut w = std::io::stdout().lock();
            let _ = output::print_progress(&mut w, &event, color, verbose);
            let _ = w.flush();
        };
        match &spinner {
            Some(bar) => {
                if let ProgressEvent::Processing { path, .. } = &event {
                    bar.set_message(path.display().to_string());
                }
                bar.suspend(print);
            }
            None => print(),
        }
    };

    let result = docsort_core::organize(
        &settings.root,
        &categories,
        &config,
        &backend,
        progress_cb,
    );
    if let Some(bar) = &spinner {
        bar.finish_and_clear();
    }
    let stats = result.context("Organization error")?;

    output::print_summary(&mut writer, &stats, settings.dry_run, color)?;
    Ok(())
}

fn test_ocr(
    file: &Path,
    language: &str,
    file_config: &ConfigFile,
    color: ColorMode,
) -> anyhow::Result<()> {
    if !file.is_file() {
        anyhow::bail!("File not found for OCR test: {}", file.display());
    }

    let backend = build_backend(file_config);
    let text = backend
        .extract_text(file, language)
        .with_context(|| format!("Error extracting text from {}", file.display()))?;

    let mut writer = std::io::stdout();
    output::print_ocr_test(&mut writer, file, language, &text, color)?;
    Ok(())
}

fn list_categories(
    path: &Path,
    text: Option<&str>,
    match_mode: MatchMode,
    color: ColorMode,
) -> anyhow::Result<()> {
    let categories = docsort_categories::load_categories(path)
        .with_context(|| format!("Error loading categories from {}", path.display()))?;

    let mut writer = std::io::stdout();
    output::print_categories(&mut writer, path, &categories, color)?;

    if let Some(text) = text {
        let lowered = text.to_lowercase();
        let matched = docsort_core::classify(&lowered, &categories, match_mode);
        output::print_classification(&mut writer, matched, match_mode, color)?;
    }
    Ok(())
}
