use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file to load.
const CONFIG_ENV: &str = "AIRGAUGE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "airgauge.toml";

/// Server configuration, loaded from a TOML file. Every field has a
/// default so the server runs with no config file at all.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: String,
    /// Directory holding the front-end bundle served on non-API paths.
    pub frontend_dir: PathBuf,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tessdata directory for the Tesseract backend. None uses the system
    /// default search path.
    pub data_path: Option<String>,
    /// Recognition language passed to the engine.
    pub lang: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".into(),
            frontend_dir: PathBuf::from("frontend"),
            ocr: OcrConfig::default(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self { data_path: None, lang: "eng".into() }
    }
}

impl ServerConfig {
    /// Load config from `$AIRGAUGE_CONFIG` (default `airgauge.toml`),
    /// falling back to defaults when the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::from_path(Path::new(&path))
    }

    fn from_path(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_usable() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8000");
        assert_eq!(cfg.ocr.lang, "eng");
        assert!(cfg.ocr.data_path.is_none());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = ServerConfig::from_path(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(cfg.bind_addr, ServerConfig::default().bind_addr);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_addr = \"127.0.0.1:9001\"").unwrap();
        let cfg = ServerConfig::from_path(file.path()).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:9001");
        assert_eq!(cfg.frontend_dir, PathBuf::from("frontend"));
        assert_eq!(cfg.ocr.lang, "eng");
    }

    #[test]
    fn ocr_section_parses() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ocr]\ndata_path = \"/usr/share/tessdata\"\nlang = \"eng\"").unwrap();
        let cfg = ServerConfig::from_path(file.path()).unwrap();
        assert_eq!(cfg.ocr.data_path.as_deref(), Some("/usr/share/tessdata"));
    }
}
