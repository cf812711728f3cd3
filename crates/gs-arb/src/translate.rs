//! Translation driver
//!
//! Runs header classification, tokenizer priming, statement parsing and
//! GLSL generation in order, stopping at the first error.

use crate::glsl_gen::GlslGenerator;
use crate::header;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::types::{ParseStatus, ProgramModel};
use gs_core::{ArbError, ProgramKind, TranslatorConfig};

/// ARB to GLSL translator
///
/// Holds only configuration; every call owns its own parser state, so one
/// translator can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct ArbTranslator {
    config: TranslatorConfig,
}

impl ArbTranslator {
    /// Create a new translator
    pub fn new(config: TranslatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Translate one program to GLSL 1.20
    pub fn translate(&self, source: &str, kind: ProgramKind) -> Result<String, ArbError> {
        let model = self.parse(source, kind)?;
        let glsl = GlslGenerator::new(&model, self.config.limits(kind)).generate()?;

        tracing::debug!(
            "Translated {} program: {} instructions, {} bytes of GLSL",
            kind,
            model.instructions.len(),
            glsl.len()
        );
        Ok(glsl)
    }

    /// Parse a program without generating code
    pub fn parse(&self, source: &str, kind: ProgramKind) -> Result<ProgramModel, ArbError> {
        let start = header::classify(source, kind)?;

        let mut lexer = Lexer::new(source, start);
        if !lexer.advance().is_trivia() {
            return Err(ArbError::Framing);
        }
        lexer.advance();

        let mut parser = Parser::new(kind, self.config.limits(kind));
        while parser.status() == ParseStatus::Running {
            parser.parse_token(&mut lexer);
            lexer.advance();
        }

        parser.finish().map_err(|err| clamp_offset(err, source.len()))
    }
}

/// Translate with the default limits
pub fn translate(source: &str, kind: ProgramKind) -> Result<String, ArbError> {
    ArbTranslator::default().translate(source, kind)
}

/// Slot-based entry point.
///
/// Resets `error_loc` to -1, then on failure stores the resolved locator and
/// replaces any message already in `error_msg`. On success both slots are
/// left as they are apart from the reset.
pub fn convert_arb(
    source: &str,
    vertex: bool,
    error_msg: &mut Option<String>,
    error_loc: &mut i32,
) -> Option<String> {
    *error_loc = -1;

    match translate(source, ProgramKind::from_vertex_flag(vertex)) {
        Ok(glsl) => Some(glsl),
        Err(err) => {
            *error_loc = err.locator().to_legacy();
            *error_msg = Some(err.diagnostic());
            None
        }
    }
}

/// 1-based line and column of a byte offset
pub fn locate(source: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }

    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

/// Keep syntax offsets inside the program text
fn clamp_offset(err: ArbError, len: usize) -> ArbError {
    match err {
        ArbError::Syntax { message, offset } if offset >= len => ArbError::Syntax {
            message,
            offset: len.saturating_sub(1),
        },
        other => other,
    }
}
