use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use docsort_core::{ExtractError, TextExtractor};

/// Default Tesseract page segmentation mode: fully automatic, no OSD.
pub const DEFAULT_PSM: u8 = 3;

/// OCR-based implementation of [`TextExtractor`].
///
/// Renders the first page of a PDF to PNG with `pdftoppm` (poppler-utils)
/// inside a private temporary directory, then runs `tesseract` on that image
/// and returns its stdout. Both tools must be installed, along with the
/// Tesseract data for every language that is requested.
///
/// Neither subprocess has a timeout; a hung tool stalls the caller.
#[derive(Debug, Clone)]
pub struct TesseractBackend {
    pdftoppm: PathBuf,
    tesseract: PathBuf,
    /// Render resolution. `None` keeps the pdftoppm default (150 DPI).
    dpi: Option<u32>,
    psm: u8,
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self {
            pdftoppm: PathBuf::from("pdftoppm"),
            tesseract: PathBuf::from("tesseract"),
            dpi: None,
            psm: DEFAULT_PSM,
        }
    }
}

impl TesseractBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different rasterizer program name or path.
    pub fn with_pdftoppm(mut self, program: impl Into<PathBuf>) -> Self {
        self.pdftoppm = program.into();
        self
    }

    /// Use a different OCR program name or path.
    pub fn with_tesseract(mut self, program: impl Into<PathBuf>) -> Self {
        self.tesseract = program.into();
        self
    }

    /// Set the render resolution. Pass `0` to keep the pdftoppm default.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = if dpi > 0 { Some(dpi) } else { None };
        self
    }

    /// Set the Tesseract page segmentation mode.
    pub fn with_psm(mut self, psm: u8) -> Self {
        self.psm = psm;
        self
    }

    /// Whether both external tools can be started.
    pub fn is_available(&self) -> bool {
        let pdftoppm = Command::new(&self.pdftoppm).arg("-v").output().is_ok();
        let tesseract = Command::new(&self.tesseract)
            .arg("--version")
            .output()
            .is_ok();

        if !pdftoppm {
            tracing::debug!(program = %self.pdftoppm.display(), "pdftoppm not found - install poppler-utils");
        }
        if !tesseract {
            tracing::debug!(program = %self.tesseract.display(), "tesseract not found - install tesseract-ocr");
        }

        pdftoppm && tesseract
    }

    fn rasterize_args(&self, pdf: &Path, output_prefix: &Path) -> Vec<std::ffi::OsString> {
        let mut args: Vec<std::ffi::OsString> =
            vec!["-png".into(), "-f".into(), "1".into(), "-l".into(), "1".into()];
        if let Some(dpi) = self.dpi {
            args.push("-r".into());
            args.push(dpi.to_string().into());
        }
        args.push(pdf.into());
        args.push(output_prefix.into());
        args
    }

    fn ocr_args(&self, image: &Path, language: &str) -> Vec<std::ffi::OsString> {
        vec![
            image.into(),
            "stdout".into(),
            "-l".into(),
            language.into(),
            "--psm".into(),
            self.psm.to_string().into(),
        ]
    }
}

impl TextExtractor for TesseractBackend {
    fn extract_text(&self, path: &Path, language: &str) -> Result<String, ExtractError> {
        let temp_dir = tempfile::Builder::new().prefix("docsort-ocr").tempdir()?;
        let output_prefix = temp_dir.path().join("page");

        run_tool(&self.pdftoppm, &self.rasterize_args(path, &output_prefix))?;

        let image = first_page_image(temp_dir.path())?
            .ok_or_else(|| ExtractError::NoPageImage(path.display().to_string()))?;
        tracing::trace!(image = %image.display(), "rendered first page");

        let output = run_tool(&self.tesseract, &self.ocr_args(&image, language))?;
        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        tracing::debug!(path = %path.display(), language, chars = text.chars().count(), "OCR complete");
        Ok(text)
    }
}

/// Run `program` to completion, failing on a non-zero exit.
fn run_tool(program: &Path, args: &[std::ffi::OsString]) -> Result<Output, ExtractError> {
    let tool = tool_name(program);
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| ExtractError::Spawn {
            tool: tool.clone(),
            source: e,
        })?;

    if !output.status.success() {
        return Err(ExtractError::ToolFailed {
            tool,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

fn tool_name(program: &Path) -> String {
    program
        .file_name()
        .unwrap_or(program.as_os_str())
        .to_string_lossy()
        .into_owned()
}

/// First `page-*.png` in `dir`, in name order.
///
/// pdftoppm zero-pads the page number according to the page count, so the
/// exact file name is not known in advance.
fn first_page_image(dir: &Path) -> Result<Option<PathBuf>, ExtractError> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| is_page_image(p))
        .collect();
    images.sort();
    Ok(images.into_iter().next())
}

fn is_page_image(path: &Path) -> bool {
    let name = path.file_name().map(OsStr::to_string_lossy).unwrap_or_default();
    name.starts_with("page-") && name.ends_with(".png")
}
