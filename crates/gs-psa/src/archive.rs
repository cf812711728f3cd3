//! Precompiled shader archive with disk persistence
//!
//! Stores linked program binaries keyed by [`FpeState`] so a later run can
//! skip shader compilation for fixed-function state it has seen before.

use crate::state::{FpeState, FPE_STATE_SIZE};
use gs_core::PsaError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

/// Archive file signature
pub const ARCHIVE_SIGNATURE: &[u8; 32] = b"glshim PrecompiledShaderArchive\0";

/// Archive format version
pub const ARCHIVE_VERSION: u32 = 1;

/// Signature, version, entry count and key size
const HEADER_SIZE: usize = ARCHIVE_SIGNATURE.len() + 12;

/// Driver program binary as returned by `glGetProgramBinary`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramBinary {
    pub format: u32,
    pub data: Vec<u8>,
}

impl ProgramBinary {
    /// Create a new program binary
    pub fn new(format: u32, data: Vec<u8>) -> Self {
        Self { format, data }
    }
}

/// Archive shared between GL contexts
pub type SharedShaderArchive = Arc<RwLock<ShaderArchive>>;

/// In-memory archive of program binaries
#[derive(Debug, Default)]
pub struct ShaderArchive {
    entries: HashMap<Box<[u8]>, ProgramBinary>,
    dirty: bool,
}

impl ShaderArchive {
    /// Create a new, empty archive
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the archive for sharing
    pub fn into_shared(self) -> SharedShaderArchive {
        Arc::new(RwLock::new(self))
    }

    /// Find the binary stored for a state
    pub fn lookup(&self, state: &FpeState) -> Option<&ProgramBinary> {
        self.entries.get(state.key_bytes())
    }

    /// Store a binary, replacing any previous one for the same state
    pub fn insert(&mut self, state: FpeState, binary: ProgramBinary) {
        self.entries.insert(state.key_bytes().into(), binary);
        self.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.dirty = true;
        }
        self.entries.clear();
    }

    /// Entries changed since the last load or save
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replace the contents with an archive file.
    ///
    /// Any problem with the file leaves the archive empty and returns false.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> bool {
        let path = path.as_ref();
        self.dirty = false;

        match Self::read_file(path) {
            Ok(entries) => {
                tracing::debug!("Loaded {} shader binaries from {}", entries.len(), path.display());
                self.entries = entries;
                true
            }
            Err(e) => {
                tracing::debug!("Discarding shader archive {}: {}", path.display(), e);
                self.entries.clear();
                false
            }
        }
    }

    /// Write the archive to a file.
    ///
    /// The dirty flag is cleared even when writing fails.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> bool {
        let path = path.as_ref();
        self.dirty = false;

        match self.write_file(path) {
            Ok(()) => {
                tracing::debug!("Saved {} shader binaries to {}", self.entries.len(), path.display());
                true
            }
            Err(e) => {
                tracing::debug!("Failed to save shader archive {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Serialize in the on-disk format, entries ordered by key
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut keys: Vec<&Box<[u8]>> = self.entries.keys().collect();
        keys.sort();

        let payload: usize = self
            .entries
            .values()
            .map(|b| FPE_STATE_SIZE + 8 + b.data.len())
            .sum();
        let mut out = Vec::with_capacity(HEADER_SIZE + payload);

        out.extend_from_slice(ARCHIVE_SIGNATURE);
        out.extend_from_slice(&ARCHIVE_VERSION.to_le_bytes());
        out.extend_from_slice(&(keys.len() as u32).to_le_bytes());
        out.extend_from_slice(&(FPE_STATE_SIZE as u32).to_le_bytes());

        for key in keys {
            let binary = &self.entries[key];
            out.extend_from_slice(key);
            out.extend_from_slice(&binary.format.to_le_bytes());
            out.extend_from_slice(&(binary.data.len() as u32).to_le_bytes());
            out.extend_from_slice(&binary.data);
        }

        out
    }

    /// Parse the on-disk format
    pub fn from_bytes(data: &[u8]) -> Result<Self, PsaError> {
        let entries = Self::decode(data)?;
        Ok(Self {
            entries,
            dirty: false,
        })
    }

    fn read_file(path: &Path) -> Result<HashMap<Box<[u8]>, ProgramBinary>, PsaError> {
        let mut file = File::open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Self::decode(&data)
    }

    fn write_file(&self, path: &Path) -> Result<(), PsaError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = File::create(path)?;
        file.write_all(&self.to_bytes())?;
        Ok(())
    }

    fn decode(data: &[u8]) -> Result<HashMap<Box<[u8]>, ProgramBinary>, PsaError> {
        let mut reader = ByteReader::new(data);

        if reader.bytes(ARCHIVE_SIGNATURE.len())? != ARCHIVE_SIGNATURE {
            return Err(PsaError::BadSignature);
        }

        let version = reader.u32()?;
        if version != ARCHIVE_VERSION {
            return Err(PsaError::VersionMismatch {
                found: version,
                expected: ARCHIVE_VERSION,
            });
        }

        let count = reader.u32()?;
        let key_size = reader.u32()?;
        if key_size as usize != FPE_STATE_SIZE {
            return Err(PsaError::KeySizeMismatch {
                found: key_size,
                expected: FPE_STATE_SIZE as u32,
            });
        }

        let mut entries = HashMap::new();
        for _ in 0..count {
            let key = reader.bytes(FPE_STATE_SIZE)?;
            let format = reader.u32()?;
            let len = reader.u32()? as usize;
            let binary = reader.bytes(len)?;
            entries.insert(key.into(), ProgramBinary::new(format, binary.to_vec()));
        }

        Ok(entries)
    }
}

/// Bounds-checked little-endian reader
struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], PsaError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(PsaError::Truncated(self.data.len()))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32, PsaError> {
        let bytes = self.bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FpeFlags;

    fn lit_state() -> FpeState {
        FpeState::new().with_flags(FpeFlags::LIGHTING)
    }

    #[test]
    fn test_insert_lookup() {
        let mut archive = ShaderArchive::new();
        assert!(archive.is_empty());
        assert!(!archive.is_dirty());

        archive.insert(lit_state(), ProgramBinary::new(7, vec![1, 2, 3]));
        assert_eq!(archive.len(), 1);
        assert!(archive.is_dirty());
        assert_eq!(archive.lookup(&lit_state()).unwrap().data, vec![1, 2, 3]);
        assert!(archive.lookup(&FpeState::new()).is_none());
    }

    #[test]
    fn test_insert_replaces() {
        let mut archive = ShaderArchive::new();
        archive.insert(lit_state(), ProgramBinary::new(1, vec![1]));
        archive.insert(lit_state(), ProgramBinary::new(2, vec![2]));
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.lookup(&lit_state()).unwrap().format, 2);
    }

    #[test]
    fn test_bytes_roundtrip() {
        let mut archive = ShaderArchive::new();
        archive.insert(lit_state(), ProgramBinary::new(0x8741, vec![9; 16]));
        archive.insert(FpeState::new(), ProgramBinary::new(0x8741, Vec::new()));

        let bytes = archive.to_bytes();
        assert_eq!(&bytes[..32], ARCHIVE_SIGNATURE);
        let restored = ShaderArchive::from_bytes(&bytes).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.lookup(&lit_state()), archive.lookup(&lit_state()));
        assert!(!restored.is_dirty());
    }

    #[test]
    fn test_serialization_is_ordered() {
        let mut a = ShaderArchive::new();
        a.insert(lit_state(), ProgramBinary::new(1, vec![1]));
        a.insert(FpeState::new(), ProgramBinary::new(1, vec![2]));

        let mut b = ShaderArchive::new();
        b.insert(FpeState::new(), ProgramBinary::new(1, vec![2]));
        b.insert(lit_state(), ProgramBinary::new(1, vec![1]));

        assert_eq!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            ShaderArchive::from_bytes(b"short"),
            Err(PsaError::Truncated(5))
        ));

        let mut bytes = ShaderArchive::new().to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            ShaderArchive::from_bytes(&bytes),
            Err(PsaError::BadSignature)
        ));

        let mut bytes = ShaderArchive::new().to_bytes();
        bytes[32..36].copy_from_slice(&2u32.to_le_bytes());
        assert!(matches!(
            ShaderArchive::from_bytes(&bytes),
            Err(PsaError::VersionMismatch { found: 2, expected: 1 })
        ));

        let mut bytes = ShaderArchive::new().to_bytes();
        bytes[40..44].copy_from_slice(&4u32.to_le_bytes());
        assert!(matches!(
            ShaderArchive::from_bytes(&bytes),
            Err(PsaError::KeySizeMismatch { found: 4, .. })
        ));
    }

    #[test]
    fn test_truncated_entry() {
        let mut archive = ShaderArchive::new();
        archive.insert(lit_state(), ProgramBinary::new(1, vec![1, 2, 3, 4]));
        let bytes = archive.to_bytes();
        assert!(matches!(
            ShaderArchive::from_bytes(&bytes[..bytes.len() - 1]),
            Err(PsaError::Truncated(_))
        ));
    }

    #[test]
    fn test_clear_marks_dirty() {
        let mut archive = ShaderArchive::new();
        archive.clear();
        assert!(!archive.is_dirty());
        archive.insert(lit_state(), ProgramBinary::new(1, vec![]));
        archive.clear();
        assert!(archive.is_empty());
        assert!(archive.is_dirty());
    }
}
