//! Common type definitions used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which execution scenario an analysis models.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CasePolicy {
    #[default]
    Worst,
    Best,
    Average,
}

impl CasePolicy {
    pub fn all() -> &'static [CasePolicy] {
        &[CasePolicy::Worst, CasePolicy::Best, CasePolicy::Average]
    }

    /// Get the display name for this policy
    pub fn display_name(&self) -> &'static str {
        match self {
            CasePolicy::Worst => "worst case",
            CasePolicy::Best => "best case",
            CasePolicy::Average => "average case",
        }
    }
}

impl fmt::Display for CasePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CasePolicy::Worst => write!(f, "worst"),
            CasePolicy::Best => write!(f, "best"),
            CasePolicy::Average => write!(f, "average"),
        }
    }
}

impl std::str::FromStr for CasePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "worst" | "worst-case" | "worst_case" => Ok(CasePolicy::Worst),
            "best" | "best-case" | "best_case" => Ok(CasePolicy::Best),
            "average" | "avg" | "average-case" | "average_case" => Ok(CasePolicy::Average),
            other => Err(format!("unknown case policy '{other}'")),
        }
    }
}

/// Structural shape of an algorithm, derived from its AST alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmKind {
    Iterative,
    Recursive,
    Hybrid,
    Unknown,
}

impl AlgorithmKind {
    /// Whether the recurrence solver should handle this kind.
    pub fn prefers_recurrence(&self) -> bool {
        matches!(self, AlgorithmKind::Recursive | AlgorithmKind::Hybrid)
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlgorithmKind::Iterative => "iterative",
            AlgorithmKind::Recursive => "recursive",
            AlgorithmKind::Hybrid => "hybrid",
            AlgorithmKind::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// Statement kind of a cost row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Decl,
    Assign,
    For,
    While,
    Repeat,
    If,
    Call,
    Return,
    Other,
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RowKind::Decl => "decl",
            RowKind::Assign => "assign",
            RowKind::For => "for",
            RowKind::While => "while",
            RowKind::Repeat => "repeat",
            RowKind::If => "if",
            RowKind::Call => "call",
            RowKind::Return => "return",
            RowKind::Other => "other",
        };
        write!(f, "{name}")
    }
}

/// Severity of an analysis note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Info,
    /// The engine substituted a symbolic placeholder and kept going.
    Degradation,
}

/// A remark attached to a successful result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub kind: NoteKind,
    pub message: String,
}

impl Note {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoteKind::Info,
            message: message.into(),
        }
    }

    pub fn degradation(message: impl Into<String>) -> Self {
        Self {
            kind: NoteKind::Degradation,
            message: message.into(),
        }
    }

    pub fn is_degradation(&self) -> bool {
        self.kind == NoteKind::Degradation
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NoteKind::Info => write!(f, "{}", self.message),
            NoteKind::Degradation => write!(f, "degraded: {}", self.message),
        }
    }
}
