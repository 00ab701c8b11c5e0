use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Context;

pub const DEFAULT_CONFIG_PATH: &str = "wizard.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardSettings {
    pub api_url: String,
    pub output_dir: PathBuf,
    pub document_file_name: String,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000".into(),
            output_dir: PathBuf::from("."),
            document_file_name: "PC1_Output.docx".into(),
        }
    }
}

impl WizardSettings {
    pub fn apply_overrides(
        &mut self,
        api_url: Option<String>,
        output_dir: Option<PathBuf>,
        document_file_name: Option<String>,
    ) {
        if let Some(v) = api_url {
            self.api_url = v;
        }
        if let Some(v) = output_dir {
            self.output_dir = v;
        }
        if let Some(v) = document_file_name {
            self.document_file_name = v;
        }
    }
}

/// Defaults, then the flat string table in `config_path` (if present), then
/// environment variables.
pub fn load_settings(config_path: &Path) -> anyhow::Result<WizardSettings> {
    let mut settings = WizardSettings::default();
    apply_file(&mut settings, config_path)?;
    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut WizardSettings, config_path: &Path) -> anyhow::Result<()> {
    let raw = match fs::read_to_string(config_path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
        Err(err) => {
            return Err(err).with_context(|| {
                format!("failed to read config file '{}'", config_path.display())
            })
        }
    };

    let file_cfg = toml::from_str::<HashMap<String, String>>(&raw)
        .with_context(|| format!("failed to parse config file '{}'", config_path.display()))?;

    if let Some(v) = file_cfg.get("api_url") {
        settings.api_url = v.clone();
    }
    if let Some(v) = file_cfg.get("output_dir") {
        settings.output_dir = PathBuf::from(v);
    }
    if let Some(v) = file_cfg.get("document_file_name") {
        settings.document_file_name = v.clone();
    }
    Ok(())
}

fn apply_env(settings: &mut WizardSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("WIZARD_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = lookup("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = lookup("WIZARD_OUTPUT_DIR") {
        settings.output_dir = PathBuf::from(v);
    }
    if let Some(v) = lookup("APP__OUTPUT_DIR") {
        settings.output_dir = PathBuf::from(v);
    }

    if let Some(v) = lookup("WIZARD_DOCUMENT_FILE_NAME") {
        settings.document_file_name = v;
    }
    if let Some(v) = lookup("APP__DOCUMENT_FILE_NAME") {
        settings.document_file_name = v;
    }
}
