//! `.costmap.toml` configuration.
//!
//! ```toml
//! [analysis]
//! case = "average"
//! branch_probability = "1/3"
//! method = "recursion-tree"
//!
//! [output]
//! default_format = "markdown"
//! ```

mod core;
mod loader;

pub use self::core::{parse_probability, AnalysisSettings, CostmapConfig, OutputConfig};
pub use loader::{
    directory_ancestors, load_config, load_config_from, parse_and_validate_config,
    try_load_config_from_path, CONFIG_FILE_NAME,
};
