//! Project settings
//!
//! Settings are read from the `extra.copycat` object of the project's
//! `composer.json`. If that object is missing, `.copycat/config.json` is
//! tried. Without either, defaults apply. A settings source that exists but
//! cannot be parsed aborts the run.

use std::fs;
use std::path::Path;

use log::info;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::defaults::{PACKAGE_MANIFEST, SETTINGS_EXTRA_KEY, SETTINGS_FILE};
use crate::error::{Error, Result};

/// Settings of the host project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    /// Namespace prefixes allowed to contribute patches. `None` allows all.
    #[serde(default)]
    pub whitelisted_namespaces: Option<Vec<String>>,
}

impl ProjectSettings {
    /// Load the settings of the project at `project_root`.
    pub fn load(project_root: &Path) -> Result<Self> {
        let manifest = project_root.join(PACKAGE_MANIFEST);
        if manifest.is_file() {
            let root: JsonValue = read_json(&manifest)?;
            if let Some(settings) = root
                .get("extra")
                .and_then(|extra| extra.get(SETTINGS_EXTRA_KEY))
                .filter(|settings| settings.is_object())
            {
                info!("Loaded settings from {} at extra.{}", PACKAGE_MANIFEST, SETTINGS_EXTRA_KEY);
                return from_value(settings.clone(), &manifest);
            }
        }

        let file = project_root.join(SETTINGS_FILE);
        if file.is_file() {
            info!("Loaded settings from {}", SETTINGS_FILE);
            return from_value(read_json(&file)?, &file);
        }

        Ok(Self::default())
    }

    /// Whether `namespace` passes the whitelist.
    pub fn allows(&self, namespace: &str) -> bool {
        match &self.whitelisted_namespaces {
            Some(prefixes) => prefixes.iter().any(|prefix| namespace.starts_with(prefix.as_str())),
            None => true,
        }
    }
}

fn read_json(path: &Path) -> Result<JsonValue> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| Error::Config {
        message: format!("{} is not valid JSON: {}", path.display(), e),
        hint: None,
    })
}

fn from_value(value: JsonValue, source: &Path) -> Result<ProjectSettings> {
    serde_json::from_value(value).map_err(|e| Error::Config {
        message: format!("invalid settings in {}: {}", source.display(), e),
        hint: Some("whitelistedNamespaces must be an array of namespace prefixes".to_string()),
    })
}
