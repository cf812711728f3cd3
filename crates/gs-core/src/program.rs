//! Program kind shared by the translator and its configuration

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of ARB assembly program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramKind {
    Vertex,
    Fragment,
}

impl ProgramKind {
    /// Select the kind from the legacy `vertex` flag
    pub fn from_vertex_flag(vertex: bool) -> Self {
        if vertex {
            Self::Vertex
        } else {
            Self::Fragment
        }
    }

    /// The 10-byte program signature (`!!ARBvp1.0` / `!!ARBfp1.0`)
    pub fn signature(self) -> &'static str {
        match self {
            Self::Vertex => "!!ARBvp1.0",
            Self::Fragment => "!!ARBfp1.0",
        }
    }

    /// The kind whose signature is the other one
    pub fn other(self) -> Self {
        match self {
            Self::Vertex => Self::Fragment,
            Self::Fragment => Self::Vertex,
        }
    }

    pub fn is_vertex(self) -> bool {
        self == Self::Vertex
    }
}

impl fmt::Display for ProgramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}
