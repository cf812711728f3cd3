//! Precompiled shader archive for glshim
//!
//! Caches driver program binaries generated for fixed-function emulation
//! state so they survive across runs.

pub mod archive;
pub mod state;

pub use archive::{
    ProgramBinary, ShaderArchive, SharedShaderArchive, ARCHIVE_SIGNATURE, ARCHIVE_VERSION,
};
pub use state::{FpeFlags, FpeState, TextureUnitState, FPE_STATE_SIZE, FPE_TEXTURE_UNITS};
