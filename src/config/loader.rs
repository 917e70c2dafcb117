use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::core::CostmapConfig;

/// File name searched for in the working directory and its ancestors.
pub const CONFIG_FILE_NAME: &str = ".costmap.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Parse and validate config from a TOML string
pub fn parse_and_validate_config(contents: &str) -> Result<CostmapConfig, String> {
    let config = toml::from_str::<CostmapConfig>(contents)
        .map_err(|e| format!("Failed to parse {CONFIG_FILE_NAME}: {e}"))?;
    config
        .validate()
        .map_err(|e| format!("Invalid {CONFIG_FILE_NAME}: {e}"))?;
    Ok(config)
}

/// Load one specific file; `None` when it is missing or unusable.
///
/// A missing file is silent; unreadable or invalid files are logged.
pub fn try_load_config_from_path(config_path: &Path) -> Option<CostmapConfig> {
    let contents = fs::read_to_string(config_path)
        .map_err(|e| {
            if e.kind() != ErrorKind::NotFound {
                log::warn!("cannot read {}: {}", config_path.display(), e);
            }
        })
        .ok()?;

    parse_and_validate_config(&contents)
        .map(|config| {
            log::debug!("using configuration from {}", config_path.display());
            config
        })
        .map_err(|e| log::warn!("{e}; falling back to defaults"))
        .ok()
}

/// `start` and its ancestors, at most `max_depth` directories.
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| dir.parent().map(Path::to_path_buf)).take(max_depth)
}

/// Nearest `.costmap.toml` at or above `start`, or the defaults.
pub fn load_config_from(start: PathBuf) -> CostmapConfig {
    let found = directory_ancestors(start, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path));
    found.unwrap_or_else(|| {
        log::debug!("no {CONFIG_FILE_NAME} within {MAX_TRAVERSAL_DEPTH} directories");
        CostmapConfig::default()
    })
}

/// Configuration for the current working directory.
pub fn load_config() -> CostmapConfig {
    std::env::current_dir()
        .map(load_config_from)
        .unwrap_or_else(|e| {
            log::warn!("working directory unavailable ({e}); using default configuration");
            CostmapConfig::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CasePolicy;
    use tempfile::TempDir;

    #[test]
    fn finds_config_in_an_ancestor() {
        let root = TempDir::new().unwrap();
        fs::write(
            root.path().join(CONFIG_FILE_NAME),
            "[analysis]\ncase = \"best\"\n",
        )
        .unwrap();
        let nested = root.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let config = load_config_from(nested);
        assert_eq!(config.to_options().case_policy, CasePolicy::Best);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let root = TempDir::new().unwrap();
        fs::write(
            root.path().join(CONFIG_FILE_NAME),
            "[analysis]\nclosure_budget = 0\n",
        )
        .unwrap();
        assert_eq!(load_config_from(root.path().to_path_buf()), CostmapConfig::default());
    }

    #[test]
    fn ancestors_are_bounded() {
        let deep: PathBuf = (0..20).fold(PathBuf::from("/"), |p, i| p.join(i.to_string()));
        assert_eq!(directory_ancestors(deep, 10).count(), 10);
    }

    #[test]
    fn parse_reports_the_file_name() {
        let err = parse_and_validate_config("[analysis\n").unwrap_err();
        assert!(err.contains(CONFIG_FILE_NAME));
    }
}
