use std::io::Write;
use std::path::Path;

use docsort_core::{Category, MatchMode, ProgressEvent, RunStats};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_header(w: &mut dyn Write, title: &str, color: ColorMode) -> std::io::Result<()> {
    let sep = "=".repeat(60);
    if color.enabled() {
        writeln!(w, "{}", sep.bold())?;
        writeln!(w, "{}", title.bold())?;
        writeln!(w, "{}", sep.bold())?;
    } else {
        writeln!(w, "{}", sep)?;
        writeln!(w, "{}", title)?;
        writeln!(w, "{}", sep)?;
    }
    Ok(())
}

/// Print the resolved settings of an organize run.
pub fn print_settings(
    w: &mut dyn Write,
    root: &Path,
    destination: &Path,
    categories_path: &Path,
    language: &str,
    match_mode: MatchMode,
    dry_run: bool,
) -> std::io::Result<()> {
    writeln!(w, "Organizing:   {}", root.display())?;
    writeln!(w, "Destination:  {}", destination.display())?;
    writeln!(w, "Categories:   {}", categories_path.display())?;
    writeln!(w, "OCR language: {}", language)?;
    writeln!(w, "Matching:     {}", match_mode)?;
    if dry_run {
        writeln!(w, "Dry run: no folders are created and no files are moved")?;
    }
    writeln!(w)?;
    Ok(())
}

/// Print a real-time progress event.
///
/// Directory, file and extracted-text events are only shown when `verbose`.
pub fn print_progress(
    w: &mut dyn Write,
    event: &ProgressEvent,
    color: ColorMode,
    verbose: bool,
) -> std::io::Result<()> {
    match event {
        ProgressEvent::EnteringDirectory { path } => {
            if verbose {
                writeln!(w, "Entering directory: {}", path.display())?;
            }
        }
        ProgressEvent::Processing { path, size } => {
            if verbose {
                writeln!(w, "Processing file: {} ({} bytes)", display_name(path), size)?;
            }
        }
        ProgressEvent::Extracted { path, text } => {
            if verbose {
                let sep = "-".repeat(40);
                writeln!(w, "Text extracted from {}:", display_name(path))?;
                writeln!(w, "{}", sep)?;
                writeln!(w, "{}", text.trim_end())?;
                writeln!(w, "{}", sep)?;
                writeln!(w, "Extracted {} characters", text.chars().count())?;
            }
        }
        ProgressEvent::CategoryFolderCreated { path } => {
            if verbose {
                writeln!(w, "Created category folder: {}", path.display())?;
            }
        }
        ProgressEvent::Unclassified { path } => {
            let msg = format!(
                "Unclassified: {} (remains in original location)",
                display_name(path)
            );
            if color.enabled() {
                writeln!(w, "{}", msg.yellow())?;
            } else {
                writeln!(w, "{}", msg)?;
            }
        }
        ProgressEvent::Organized {
            source,
            destination,
            collisions,
            ..
        } => {
            let arrow = format!("{} \u{2192} {}", display_name(source), destination.display());
            if color.enabled() {
                write!(w, "{} {}", "Organized:".green(), arrow)?;
            } else {
                write!(w, "Organized: {}", arrow)?;
            }
            if *collisions > 0 {
                let note = format!("(renamed, {} taken)", collisions);
                if color.enabled() {
                    write!(w, " {}", note.dimmed())?;
                } else {
                    write!(w, " {}", note)?;
                }
            }
            writeln!(w)?;
        }
        ProgressEvent::WouldOrganize {
            source,
            destination,
            ..
        } => {
            let arrow = format!("{} \u{2192} {}", display_name(source), destination.display());
            if color.enabled() {
                writeln!(w, "{} {}", "Would organize:".cyan(), arrow)?;
            } else {
                writeln!(w, "Would organize: {}", arrow)?;
            }
        }
        ProgressEvent::AlreadyOrganized { path, category } => {
            let msg = format!("Already organized: {} ({})", display_name(path), category);
            if color.enabled() {
                writeln!(w, "{}", msg.dimmed())?;
            } else {
                writeln!(w, "{}", msg)?;
            }
        }
        ProgressEvent::ExtractionFailed { path, error } => {
            let msg = format!("Error processing {}: {}", display_name(path), error);
            if color.enabled() {
                writeln!(w, "{}", msg.red())?;
            } else {
                writeln!(w, "{}", msg)?;
            }
        }
        ProgressEvent::RelocationFailed {
            path,
            category,
            error,
        } => {
            let msg = format!(
                "Error moving {} to {}: {}",
                display_name(path),
                category,
                error
            );
            if color.enabled() {
                writeln!(w, "{}", msg.red())?;
            } else {
                writeln!(w, "{}", msg)?;
            }
        }
        ProgressEvent::DirectoryFailed { path, error } => {
            let msg = format!("Error processing directory {}: {}", path.display(), error);
            if color.enabled() {
                writeln!(w, "{}", msg.red())?;
            } else {
                writeln!(w, "{}", msg)?;
            }
        }
    }
    Ok(())
}

/// Print the end-of-run summary.
pub fn print_summary(
    w: &mut dyn Write,
    stats: &RunStats,
    dry_run: bool,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    print_header(w, "SUMMARY", color)?;

    writeln!(w, "  Directories visited: {}", stats.directories_visited)?;
    writeln!(w, "  Documents found: {}", stats.candidates)?;
    let organized_label = if dry_run { "Would organize" } else { "Organized" };
    if color.enabled() {
        writeln!(w, "  {}: {}", organized_label, stats.organized.green())?;
    } else {
        writeln!(w, "  {}: {}", organized_label, stats.organized)?;
    }
    if stats.already_organized > 0 {
        writeln!(w, "  Already organized: {}", stats.already_organized)?;
    }
    if color.enabled() && stats.unclassified > 0 {
        writeln!(w, "  Unclassified: {}", stats.unclassified.yellow())?;
    } else {
        writeln!(w, "  Unclassified: {}", stats.unclassified)?;
    }

    let failures = stats.failures();
    if failures > 0 {
        let msg = format!(
            "Errors: {} (extraction: {}, moving: {}, directories: {})",
            failures,
            stats.extraction_failures,
            stats.relocation_failures,
            stats.directory_failures
        );
        if color.enabled() {
            writeln!(w, "  {}", msg.red())?;
        } else {
            writeln!(w, "  {}", msg)?;
        }
    }
    writeln!(w)?;

    let done = if dry_run {
        "Dry run completed, nothing was moved."
    } else {
        "Organization completed successfully!"
    };
    if color.enabled() {
        writeln!(w, "{}", done.bold().green())?;
    } else {
        writeln!(w, "{}", done)?;
    }
    Ok(())
}

/// Print the text extracted by `test-ocr`.
pub fn print_ocr_test(
    w: &mut dyn Write,
    file: &Path,
    language: &str,
    text: &str,
    color: ColorMode,
) -> std::io::Result<()> {
    let title = format!("OCR TEST: {} ({})", display_name(file), language);
    print_header(w, &title, color)?;
    if text.trim().is_empty() {
        let msg = "(no text recognised)";
        if color.enabled() {
            writeln!(w, "{}", msg.dimmed())?;
        } else {
            writeln!(w, "{}", msg)?;
        }
    } else {
        writeln!(w, "{}", text.trim_end())?;
    }
    writeln!(w, "{}", "=".repeat(60))?;
    writeln!(w, "Extracted {} characters", text.chars().count())?;
    Ok(())
}

/// Print the parsed categories in precedence order.
pub fn print_categories(
    w: &mut dyn Write,
    source: &Path,
    categories: &[Category],
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(
        w,
        "{} categories loaded from {}",
        categories.len(),
        source.display()
    )?;
    writeln!(w)?;
    for (index, category) in categories.iter().enumerate() {
        if color.enabled() {
            writeln!(w, "{}. {}", index + 1, category.name().bold())?;
        } else {
            writeln!(w, "{}. {}", index + 1, category.name())?;
        }
        if category.is_matchable() {
            writeln!(w, "   {}", category.keywords().join(", "))?;
        } else {
            let msg = "(no keywords, never matches)";
            if color.enabled() {
                writeln!(w, "   {}", msg.yellow())?;
            } else {
                writeln!(w, "   {}", msg)?;
            }
        }
    }
    Ok(())
}

/// Print which category a sample text would be filed under.
pub fn print_classification(
    w: &mut dyn Write,
    matched: Option<&Category>,
    match_mode: MatchMode,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    match matched {
        Some(category) => {
            if color.enabled() {
                writeln!(
                    w,
                    "Sample text matches {} ({})",
                    category.name().green(),
                    match_mode
                )?;
            } else {
                writeln!(w, "Sample text matches {} ({})", category.name(), match_mode)?;
            }
        }
        None => {
            let msg = format!("Sample text matches no category ({})", match_mode);
            if color.enabled() {
                writeln!(w, "{}", msg.yellow())?;
            } else {
                writeln!(w, "{}", msg)?;
            }
        }
    }
    Ok(())
}
