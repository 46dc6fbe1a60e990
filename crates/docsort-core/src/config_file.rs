use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub ocr: Option<OcrConfig>,
    pub organize: Option<OrganizeConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Tesseract language code, e.g. `por`, `eng`, `por+eng`.
    pub language: Option<String>,
    pub dpi: Option<u32>,
    /// Tesseract page segmentation mode.
    pub psm: Option<u8>,
    /// Program name or path of the rasterizer.
    pub pdftoppm: Option<String>,
    /// Program name or path of the OCR engine.
    pub tesseract: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizeConfig {
    /// Path of the keyword-grouped categories file.
    pub categories: Option<String>,
    /// Folder under which category folders are created.
    pub destination: Option<String>,
    pub match_all: Option<bool>,
    pub extension: Option<String>,
}

/// Name of the per-directory config file.
pub const LOCAL_CONFIG_FILE: &str = ".docsort.toml";

/// Platform config directory path: `<config_dir>/docsort/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("docsort").join("config.toml"))
}

/// Load config by cascading CWD `.docsort.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(LOCAL_CONFIG_FILE));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed; parse errors are logged.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => {
            tracing::debug!(path = %path.display(), "loaded config file");
            Some(config)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Take a field from `overlay`, falling back to `base`.
fn pick<S, T>(overlay: Option<&S>, base: Option<&S>, field: impl Fn(&S) -> Option<T>) -> Option<T> {
    overlay.and_then(&field).or_else(|| base.and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (bo, oo) = (base.ocr.as_ref(), overlay.ocr.as_ref());
    let (bg, og) = (base.organize.as_ref(), overlay.organize.as_ref());
    ConfigFile {
        ocr: Some(OcrConfig {
            language: pick(oo, bo, |c| c.language.clone()),
            dpi: pick(oo, bo, |c| c.dpi),
            psm: pick(oo, bo, |c| c.psm),
            pdftoppm: pick(oo, bo, |c| c.pdftoppm.clone()),
            tesseract: pick(oo, bo, |c| c.tesseract.clone()),
        }),
        organize: Some(OrganizeConfig {
            categories: pick(og, bg, |c| c.categories.clone()),
            destination: pick(og, bg, |c| c.destination.clone()),
            match_all: pick(og, bg, |c| c.match_all),
            extension: pick(og, bg, |c| c.extension.clone()),
        }),
    }
}

impl ConfigFile {
    pub fn language(&self) -> Option<&str> {
        self.ocr.as_ref().and_then(|o| o.language.as_deref())
    }

    pub fn categories_path(&self) -> Option<&str> {
        self.organize.as_ref().and_then(|o| o.categories.as_deref())
    }

    pub fn destination(&self) -> Option<&str> {
        self.organize.as_ref().and_then(|o| o.destination.as_deref())
    }

    pub fn match_all(&self) -> Option<bool> {
        self.organize.as_ref().and_then(|o| o.match_all)
    }

    pub fn extension(&self) -> Option<&str> {
        self.organize.as_ref().and_then(|o| o.extension.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_parses() {
        let toml_str = "[ocr]\nlanguage = \"eng\"\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(parsed.language(), Some("eng"));
        assert!(parsed.organize.is_none());
        assert_eq!(parsed.match_all(), None);
    }

    #[test]
    fn organize_section_round_trip_toml() {
        let config = ConfigFile {
            organize: Some(OrganizeConfig {
                categories: Some("/etc/docsort/categories.conf".to_string()),
                match_all: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ConfigFile = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.categories_path(), Some("/etc/docsort/categories.conf"));
        assert_eq!(parsed.match_all(), Some(true));
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            ocr: Some(OcrConfig {
                language: Some("por".to_string()),
                dpi: Some(150),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            ocr: Some(OcrConfig {
                language: Some("eng".to_string()),
                ..Default::default()
            }),
            organize: Some(OrganizeConfig {
                destination: Some("/srv/sorted".to_string()),
                ..Default::default()
            }),
        };
        let merged = merge(base, overlay);
        assert_eq!(merged.language(), Some("eng"));
        assert_eq!(merged.ocr.as_ref().unwrap().dpi, Some(150));
        assert_eq!(merged.destination(), Some("/srv/sorted"));
    }

    #[test]
    fn merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            organize: Some(OrganizeConfig {
                extension: Some("tiff".to_string()),
                match_all: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        assert_eq!(merged.extension(), Some("tiff"));
        assert_eq!(merged.match_all(), Some(false));
    }

    #[test]
    fn unparsable_file_is_ignored() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ocr\nlanguage = ").unwrap();
        assert!(load_from_path(&path).is_none());
        assert!(load_from_path(&dir.path().join("missing.toml")).is_none());
    }
}
