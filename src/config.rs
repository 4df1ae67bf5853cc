use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::diagnostics::CompileError;

pub const CONFIG_FILE: &str = "jmmc.toml";

/// Backend options, read from `jmmc.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    pub output: OutputConfig,
    pub optimize: OptimizeConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Prefix of every line inside a method body.
    pub indent: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { indent: "   ".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizeConfig {
    /// Fold `lit + lit` into one constant.
    pub fold_constants: bool,
    /// Lower `x = x + c` on an int local to `iinc`.
    pub increment: bool,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self { fold_constants: true, increment: true }
    }
}

impl BackendConfig {
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, CompileError> {
        toml::from_str(content).map_err(|e| {
            CompileError::config(format!("{CONFIG_FILE}: invalid config: {e}"), path.to_path_buf())
        })
    }

    /// Load an explicitly named config file. The file must exist.
    pub fn load(path: &Path) -> Result<Self, CompileError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CompileError::config(format!("{CONFIG_FILE}: could not read file: {e}"), path.to_path_buf())
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Load `<dir>/jmmc.toml` when present, defaults otherwise.
    pub fn discover(dir: &Path) -> Result<Self, CompileError> {
        match find_config(dir) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}

fn find_config(dir: &Path) -> Option<PathBuf> {
    let candidate = dir.join(CONFIG_FILE);
    if candidate.is_file() {
        Some(candidate)
    } else {
        None
    }
}
