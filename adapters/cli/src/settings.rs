use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use lazor_rendering::ReportFormat;
use lazor_system_placement_search::SearchConfig;
use serde::Deserialize;

/// Settings file picked up from the working directory when `--config` is absent.
pub(crate) const DEFAULT_SETTINGS_FILE: &str = "lazor.toml";
const SUPPORTED_SETTINGS_VERSION: u32 = 1;

#[derive(Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SettingsFile {
    version: u32,
    #[serde(default)]
    search: SearchSection,
    #[serde(default)]
    output: OutputSection,
}

#[derive(Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchSection {
    max_candidates: Option<u64>,
    parallel: Option<bool>,
}

#[derive(Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
struct OutputSection {
    directory: Option<PathBuf>,
    format: Option<ReportFormat>,
}

/// Values supplied on the command line. `None` and `false` defer to the
/// settings file.
#[derive(Debug, Default)]
pub(crate) struct Overrides {
    pub(crate) max_candidates: Option<u64>,
    pub(crate) parallel: bool,
    pub(crate) output_dir: Option<PathBuf>,
    pub(crate) format: Option<ReportFormat>,
}

/// Effective settings after layering flags over the settings file over
/// built-in defaults.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) search: SearchConfig,
    pub(crate) output_dir: Option<PathBuf>,
    pub(crate) format: ReportFormat,
}

impl Settings {
    pub(crate) fn resolve(file: Option<SettingsFile>, overrides: Overrides) -> Self {
        let file = file.unwrap_or_default();
        Self {
            search: SearchConfig {
                max_candidates: overrides.max_candidates.or(file.search.max_candidates),
                parallel: overrides.parallel || file.search.parallel.unwrap_or(false),
                ..SearchConfig::default()
            },
            output_dir: overrides.output_dir.or(file.output.directory),
            format: overrides.format.or(file.output.format).unwrap_or_default(),
        }
    }
}

/// Loads the settings file.
///
/// An explicit path must exist. Without one, [`DEFAULT_SETTINGS_FILE`] in the
/// working directory is used when present.
pub(crate) fn load_settings(explicit: Option<&Path>) -> Result<Option<SettingsFile>> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_SETTINGS_FILE);
            if !fallback.is_file() {
                return Ok(None);
            }
            fallback
        }
    };

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    let settings = parse_settings(&contents)
        .with_context(|| format!("invalid settings file {}", path.display()))?;
    log::debug!("loaded settings from {}", path.display());
    Ok(Some(settings))
}

fn parse_settings(contents: &str) -> Result<SettingsFile> {
    let settings: SettingsFile =
        toml::from_str(contents).context("failed to parse settings toml contents")?;
    if settings.version != SUPPORTED_SETTINGS_VERSION {
        bail!(
            "unsupported settings version {}; expected {}",
            settings.version,
            SUPPORTED_SETTINGS_VERSION
        );
    }
    Ok(settings)
}
