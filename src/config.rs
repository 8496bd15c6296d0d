// Scanner configuration, TOML-backed
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Uploads above this size are rejected before any parsing.
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Below this many characters of native text the document is treated as
    /// scanned and the OCR fallback kicks in.
    #[serde(default = "default_min_native_text_chars")]
    pub min_native_text_chars: usize,

    /// Hard cap on OCR'd pages per document.
    #[serde(default = "default_max_ocr_pages")]
    pub max_ocr_pages: usize,

    /// Directory holding the TrOCR encoder/decoder and tokenizer files.
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,
}

fn default_max_file_size_mb() -> u64 { 20 }
fn default_min_native_text_chars() -> usize { 200 }
fn default_max_ocr_pages() -> usize { 10 }
fn default_model_dir() -> PathBuf { PathBuf::from("models") }

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            min_native_text_chars: default_min_native_text_chars(),
            max_ocr_pages: default_max_ocr_pages(),
            model_dir: default_model_dir(),
        }
    }
}

impl ScanConfig {
    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Load from the user config dir, then `chronyx.toml` in the working
    /// directory, then defaults.
    pub fn load() -> Self {
        for path in Self::candidate_paths() {
            if let Ok(content) = fs::read_to_string(&path) {
                match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => log::warn!("ignoring malformed config {}: {}", path.display(), e),
                }
            }
        }
        Self::default()
    }

    pub fn save(&self) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write("chronyx.toml", content)?;
        Ok(())
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("chronyx").join("config.toml"));
        }
        paths.push(PathBuf::from("chronyx.toml"));
        paths
    }
}
