//! ARB assembly program translation for glshim
//!
//! Converts `!!ARBvp1.0` and `!!ARBfp1.0` programs into GLSL 1.20 source.

pub mod binding;
pub mod glsl_gen;
pub mod header;
pub mod lexer;
pub mod parser;
pub mod translate;
pub mod types;

pub use glsl_gen::{GlslGenerator, GlslWriter};
pub use translate::{convert_arb, locate, translate, ArbTranslator};
pub use types::{ProgramModel, SpecialCases};
