//! Program header classification

use gs_core::{ArbError, ProgramKind};

/// Prefix shared by every ARB program signature
pub const ARB_MARKER: &str = "!!ARB";

/// Find the expected signature and return the byte offset just past it.
///
/// The signature may appear anywhere in the text. When it is absent the
/// error tells a program of the wrong kind apart from text that is not an
/// ARB program at all.
pub fn classify(source: &str, kind: ProgramKind) -> Result<usize, ArbError> {
    let signature = kind.signature();

    if let Some(pos) = source.find(signature) {
        return Ok(pos + signature.len());
    }

    if source.contains(ARB_MARKER) {
        Err(ArbError::HeaderMismatch { expected: kind })
    } else {
        Err(ArbError::HeaderMissing)
    }
}

/// Guess the program kind from whichever signature appears first
pub fn detect_kind(source: &str) -> Option<ProgramKind> {
    let vp = source.find(ProgramKind::Vertex.signature());
    let fp = source.find(ProgramKind::Fragment.signature());
    match (vp, fp) {
        (Some(v), Some(f)) if f < v => Some(ProgramKind::Fragment),
        (Some(_), _) => Some(ProgramKind::Vertex),
        (None, Some(_)) => Some(ProgramKind::Fragment),
        (None, None) => None,
    }
}
