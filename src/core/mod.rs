pub mod options;
pub mod types;

pub use options::AnalysisOptions;
pub use types::{AlgorithmKind, CasePolicy, Note, NoteKind, RowKind};
