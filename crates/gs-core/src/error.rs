//! Error types for glshim

use crate::program::ProgramKind;
use std::fmt;
use thiserror::Error;

/// Main error type for glshim
#[derive(Error, Debug)]
pub enum GlshimError {
    #[error("ARB translation error: {0}")]
    Arb(#[from] ArbError),

    #[error("Shader archive error: {0}")]
    Psa(#[from] PsaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Code generation phase a diagnostic belongs to
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Variable declarations (pre-phase)
    Declaration = 0,
    /// Instruction bodies
    Instruction = 1,
    /// Variable finalization (post-phase)
    PostProcess = 2,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declaration => write!(f, "declaration phase"),
            Self::Instruction => write!(f, "instruction phase"),
            Self::PostProcess => write!(f, "post-processing phase"),
        }
    }
}

/// Where a translation failure happened
///
/// A byte offset into the original program text when the failure maps to a
/// token or instruction, otherwise the generation phase that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    Offset(usize),
    Phase(Phase),
}

impl Locator {
    /// Collapse into the single integer slot used by the legacy entry point.
    ///
    /// Phase codes and byte offsets share the integer range there; callers
    /// must use the error kind to tell them apart.
    pub fn to_legacy(self) -> i32 {
        match self {
            Self::Offset(offset) => i32::try_from(offset).unwrap_or(i32::MAX),
            Self::Phase(phase) => phase as i32,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offset(offset) => write!(f, "byte {}", offset),
            Self::Phase(phase) => write!(f, "{}", phase),
        }
    }
}

/// ARB program translation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArbError {
    #[error("Program type mismatch: expected a {expected} program header")]
    HeaderMismatch { expected: ProgramKind },

    #[error("No ARB program header found")]
    HeaderMissing,

    #[error("Header line must be terminated before the program body")]
    Framing,

    #[error("Syntax error: {message}")]
    Syntax { message: String, offset: usize },

    #[error("Generation error: {message}")]
    Generation { message: String, locator: Locator },

    #[error("Resource error: {message}")]
    Resource { message: String },
}

impl ArbError {
    pub fn syntax(message: impl Into<String>, offset: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            offset,
        }
    }

    pub fn generation(message: impl Into<String>, locator: Locator) -> Self {
        Self::Generation {
            message: message.into(),
            locator,
        }
    }

    /// Locator as recorded by the failing component, `None` when the failure
    /// has no natural anchor.
    pub fn raw_locator(&self) -> Option<Locator> {
        match self {
            Self::HeaderMismatch { .. } | Self::HeaderMissing | Self::Framing => {
                Some(Locator::Offset(0))
            }
            Self::Syntax { offset, .. } => Some(Locator::Offset(*offset)),
            Self::Generation { locator, .. } => Some(*locator),
            Self::Resource { .. } => None,
        }
    }

    /// Resolved locator; unanchored failures fall back to offset 0.
    pub fn locator(&self) -> Locator {
        self.raw_locator().unwrap_or(Locator::Offset(0))
    }

    /// Message handed to the caller's diagnostic slot
    pub fn diagnostic(&self) -> String {
        match self.raw_locator() {
            Some(_) => self.to_string(),
            None => "conversion error".to_string(),
        }
    }
}

/// Precompiled shader archive errors
#[derive(Error, Debug)]
pub enum PsaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid archive signature")]
    BadSignature,

    #[error("Archive version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("Archive key size mismatch: found {found}, expected {expected}")]
    KeySizeMismatch { found: u32, expected: u32 },

    #[error("Archive truncated at byte {0}")]
    Truncated(usize),
}

/// Result type alias for glshim operations
pub type Result<T> = std::result::Result<T, GlshimError>;
