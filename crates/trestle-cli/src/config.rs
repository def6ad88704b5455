// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `trestle.toml` configuration.
//!
//! ```toml
//! [parse]
//! max-depth = 500
//!
//! [log]
//! filter = "trestle_core=debug"
//! ```
//!
//! Every key is optional. Unknown keys are rejected so that typos do not
//! silently fall back to defaults.

use camino::{Utf8Path, Utf8PathBuf};
use miette::{Context, IntoDiagnostic, Result};
use serde::Deserialize;
use trestle_core::engine::ParseOptions;

/// File looked up in the working directory when `--config` is not given.
pub const CONFIG_FILE: &str = "trestle.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub parse: ParseOptions,
    pub log: LogConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct LogConfig {
    /// An `EnvFilter` directive used when neither `RUST_LOG` nor `-v` is
    /// given.
    pub filter: Option<String>,
}

/// Loads `explicit`, or `trestle.toml` from the working directory if it
/// exists, or the defaults.
pub fn load(explicit: Option<&Utf8Path>) -> Result<Config> {
    match explicit {
        Some(path) => load_file(path),
        None => {
            let default = Utf8PathBuf::from(CONFIG_FILE);
            if default.is_file() {
                load_file(&default)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn load_file(path: &Utf8Path) -> Result<Config> {
    let text = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read config '{path}'"))?;
    toml::from_str(&text)
        .into_diagnostic()
        .wrap_err_with(|| format!("Invalid config '{path}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use trestle_core::engine::DEFAULT_MAX_DEPTH;

    fn write_config(contents: &str) -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join(CONFIG_FILE)).unwrap();
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn reads_parse_and_log_sections() {
        let (_dir, path) = write_config("[parse]\nmax-depth = 64\n\n[log]\nfilter = \"trestle_core=trace\"\n");
        let config = load(Some(&path)).unwrap();
        assert_eq!(config.parse.max_depth, 64);
        assert_eq!(config.log.filter.as_deref(), Some("trestle_core=trace"));
    }

    #[test]
    fn empty_file_uses_defaults() {
        let (_dir, path) = write_config("");
        let config = load(Some(&path)).unwrap();
        assert_eq!(config.parse.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.log.filter.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let (_dir, path) = write_config("[parse]\nmax_depth = 64\n");
        let error = load(Some(&path)).unwrap_err();
        assert!(format!("{error:?}").contains("Invalid config"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("missing.toml")).unwrap();
        let error = load(Some(&path)).unwrap_err();
        assert!(format!("{error:?}").contains("Failed to read config"));
    }
}
