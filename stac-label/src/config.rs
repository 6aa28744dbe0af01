use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stac_label_core::{AssemblerConfig, AssemblyRequest};
use subst::VariableMap;
use tracing::{info, warn};

/// Annotation file used when neither the command line nor the config file names one.
pub const DEFAULT_ANNOTATION_FILE: &str = "data.geojson";

pub type UnrecognizedValues = HashMap<String, serde_yaml::Value>;
pub type UnrecognizedKeys = HashSet<String>;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Unable to load config file {1}: {0}")]
    ConfigLoadError(#[source] std::io::Error, PathBuf),

    #[error("Unable to parse config file {1}: {0}")]
    ConfigParseError(#[source] subst::yaml::Error, PathBuf),

    #[error("Unable to serialize config: {0}")]
    ConfigSerializeError(#[from] serde_yaml::Error),
}

/// Settings read from a config file, overridden by command line arguments.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Describes the annotation file.
    pub item: ItemConfig,
    /// Where and how the item is written.
    pub output: OutputConfig,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

/// The `item` section.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemConfig {
    #[serde(flatten)]
    pub request: AssemblyRequest,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

/// The `output` section.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(flatten)]
    pub assembler: AssemblerConfig,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

pub fn copy_unrecognized_keys_from_config(
    result: &mut UnrecognizedKeys,
    prefix: &str,
    unrecognized: &UnrecognizedValues,
) {
    result.extend(unrecognized.keys().map(|k| format!("{prefix}{k}")));
}

impl Config {
    /// Keys of every section that are not used, as dotted paths.
    #[must_use]
    pub fn get_unrecognized_keys(&self) -> UnrecognizedKeys {
        let mut keys = UnrecognizedKeys::new();
        copy_unrecognized_keys_from_config(&mut keys, "", &self.unrecognized);
        copy_unrecognized_keys_from_config(&mut keys, "item.", &self.item.unrecognized);
        copy_unrecognized_keys_from_config(&mut keys, "output.", &self.output.unrecognized);
        keys
    }

    /// Warns about config keys that are not used, usually typos.
    pub fn warn_unrecognized(&self) {
        let mut keys: Vec<_> = self.get_unrecognized_keys().into_iter().collect();
        keys.sort();
        for key in keys {
            warn!("Ignoring unrecognized configuration key '{key}'");
        }
    }

    /// Fills in defaults that depend on the merged config.
    pub fn finalize(&mut self) {
        let item = &mut self.item.request;
        if item.annotation_path.as_os_str().is_empty() {
            info!("No annotation file given, using {DEFAULT_ANNOTATION_FILE}");
            item.annotation_path = PathBuf::from(DEFAULT_ANNOTATION_FILE);
        }
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Read config from a file
pub fn read_config<'a, M>(file_name: &Path, env: &'a M) -> ConfigResult<Config>
where
    M: VariableMap<'a>,
    M::Value: AsRef<str>,
{
    let contents = fs::read_to_string(file_name)
        .map_err(|e| ConfigError::ConfigLoadError(e, file_name.into()))?;
    parse_config(&contents, env, file_name)
}

/// Parse config from YAML, substituting `${VAR}` and `${VAR:default}` from `env`.
pub fn parse_config<'a, M>(contents: &str, env: &'a M, file_name: &Path) -> ConfigResult<Config>
where
    M: VariableMap<'a>,
    M::Value: AsRef<str>,
{
    subst::yaml::from_str(contents, env)
        .map_err(|e| ConfigError::ConfigParseError(e, file_name.into()))
}
