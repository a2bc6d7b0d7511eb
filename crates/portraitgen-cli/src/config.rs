use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use portraitgen_comfy::{DEFAULT_BASE_URL, SubmitOptions, WorkflowSpec};
use portraitgen_generate::{PortraitTraversal, RoleBatch, UnitFilter};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
}

/// Optional `portraitgen.toml`. Every section and key may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub seed: Option<u64>,
    pub runs_dir: Option<PathBuf>,
    pub comfy: ComfySettings,
    pub portraits: PortraitTraversal,
    pub roles: RoleBatch,
    pub units: UnitSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComfySettings {
    pub base_url: String,
    pub delay_ms: u64,
    pub character: WorkflowSpec,
    #[serde(default = "WorkflowSpec::unit")]
    pub unit: WorkflowSpec,
}

impl Default for ComfySettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            delay_ms: 1_000,
            character: WorkflowSpec::character(),
            unit: WorkflowSpec::unit(),
        }
    }
}

impl ComfySettings {
    pub fn submit_options(&self) -> SubmitOptions {
        SubmitOptions {
            delay: Duration::from_millis(self.delay_ms),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitSettings {
    /// Unit table CSV.
    pub input: Option<PathBuf>,
    pub race: Option<String>,
    pub country: Option<String>,
    pub name: Option<String>,
}

impl UnitSettings {
    pub fn filter(&self) -> UnitFilter {
        UnitFilter {
            race: self.race.clone(),
            country: self.country.clone(),
            name: self.name.clone(),
        }
    }
}

/// Defaults when `path` is `None`; a named file must exist.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_settings(&content)
}

pub fn parse_settings(content: &str) -> Result<Settings, ConfigError> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use portraitgen_generate::Dimension;

    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = parse_settings("").expect("parse");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.comfy.unit.width, 600);
        assert_eq!(settings.portraits.max_combinations, 50);
    }

    #[test]
    fn sections_override_individual_keys() {
        let settings = parse_settings(
            r#"
seed = 42

[comfy]
base_url = "http://10.0.0.5:8188"
delay_ms = 0

[comfy.character]
checkpoint = "custom.safetensors"

[portraits]
race = "精灵"
hair_style = "all"
role = "random"
max_combinations = 10

[roles]
identity = "贵族"

[units]
country = "天界"
"#,
        )
        .expect("parse");

        assert_eq!(settings.seed, Some(42));
        assert_eq!(settings.comfy.submit_options().delay, Duration::ZERO);
        assert_eq!(settings.comfy.character.checkpoint, "custom.safetensors");
        assert_eq!(settings.comfy.character.width, 728);
        assert_eq!(settings.comfy.unit.height, 1200);
        assert_eq!(settings.portraits.race, Dimension::fixed("精灵"));
        assert_eq!(settings.portraits.hair_style, Dimension::All);
        assert_eq!(settings.portraits.role, Dimension::Random);
        assert_eq!(settings.portraits.hair_length, Dimension::fixed("长发"));
        assert_eq!(settings.roles.identity.as_deref(), Some("贵族"));
        assert_eq!(settings.roles.limit_per_identity, 5);
        assert_eq!(settings.units.filter().country.as_deref(), Some("天界"));
    }

    #[test]
    fn missing_named_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("portraitgen_{}.toml", uuid::Uuid::new_v4()));
        assert!(matches!(load_settings(Some(&path)), Err(ConfigError::Io { .. })));
    }
}
