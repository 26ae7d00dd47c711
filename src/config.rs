use anyhow::{Context, Result};
use console::style;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub model: String,
    pub instructions: String,
    pub max_tool_rounds: usize,
    pub backup_before_edit: bool,
    pub debug_tool_calls: bool,
    pub activity_preview_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            instructions: String::new(),
            max_tool_rounds: 8,
            backup_before_edit: true,
            debug_tool_calls: false,
            activity_preview_chars: 200,
        }
    }
}

pub fn load_or_create() -> Result<Config> {
    let xdg_dirs = xdg::BaseDirectories::new();
    let config_path = xdg_dirs.place_config_file("folio/config.toml")?;
    load_or_create_at(&config_path)
}

/// Loads the config at `config_path`, creating it with defaults when absent.
/// Keys that are missing or zeroed are filled in and written back, so the
/// file always lists every option.
pub fn load_or_create_at(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        let default_config = Config::default();
        let toml_string = toml::to_string_pretty(&default_config)?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(config_path, toml_string)?;

        eprintln!(
            "{}",
            style(format!("Created default config at: {}", config_path.display())).dim()
        );
        return Ok(default_config);
    }

    let config_string = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let config: Config = toml::from_str(&config_string)
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;

    let default_config = Config::default();
    let final_config = Config {
        model: if config.model.is_empty() {
            default_config.model
        } else {
            config.model
        },
        max_tool_rounds: if config.max_tool_rounds == 0 {
            default_config.max_tool_rounds
        } else {
            config.max_tool_rounds
        },
        activity_preview_chars: if config.activity_preview_chars == 0 {
            default_config.activity_preview_chars
        } else {
            config.activity_preview_chars
        },
        ..config
    };

    let final_toml_string = toml::to_string_pretty(&final_config)?;
    if final_toml_string != config_string {
        fs::write(config_path, final_toml_string)?;
    }

    Ok(final_config)
}
