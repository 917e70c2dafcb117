//! CLI command implementations.
//!
//! - **analyze**: derive the cost of one or more AST documents
//! - **classify** / **methods**: structural inspection (see [`inspect`])
//! - **init**: write a default `.costmap.toml`

pub mod analyze;
pub mod init;
pub mod inspect;

pub use analyze::{handle_analyze, AnalyzeConfig};
pub use inspect::{handle_classify, handle_methods};
