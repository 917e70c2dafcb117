use crate::config::CONFIG_FILE_NAME;
use crate::io;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG: &str = r#"# Costmap Configuration

[analysis]
# worst | best | average
case = "worst"
size_variable = "n"
closure_budget = 20
simplify_budget = 16
# default probability of a branch or loop guard in the average case
branch_probability = "1/2"
# closed-cost | row-count
branch_selection = "closed-cost"
# master | iteration | recursion-tree | characteristic-equation
# method = "master"

[output]
# terminal | json | markdown
default_format = "terminal"
"#;

pub fn init_config(force: bool) -> Result<()> {
    init_config_at(&PathBuf::from(CONFIG_FILE_NAME), force)?;
    println!("Created {CONFIG_FILE_NAME} configuration file");
    Ok(())
}

pub fn init_config_at(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }
    io::write_file(config_path, DEFAULT_CONFIG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_and_validate_config;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        let config = parse_and_validate_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.to_options().size_variable, "n");
    }

    #[test]
    fn existing_file_needs_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        init_config_at(&path, false).unwrap();
        assert!(init_config_at(&path, false).is_err());
        assert!(init_config_at(&path, true).is_ok());
    }
}
