//! Core types for glshim
//!
//! This crate provides the error taxonomy, configuration, and logging
//! infrastructure shared by the ARB translator, the precompiled shader
//! archive and the command line front end.

pub mod config;
pub mod error;
pub mod logging;
pub mod program;

pub use config::{
    CacheConfig, Config, DebugConfig, LimitOverrides, LogLevel, TranslatorConfig, TranslatorLimits,
};
pub use error::{ArbError, GlshimError, Locator, Phase, PsaError, Result};
pub use program::ProgramKind;
