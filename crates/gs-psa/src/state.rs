//! Fixed-function emulation state
//!
//! [`FpeState`] is the archive key. It is hashed and compared as raw bytes,
//! so every byte of the record must be deterministic: there is no implicit
//! padding and the explicit padding fields must stay zero. Multi-byte
//! fields are stored little endian so keys match across hosts.

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

/// Texture units tracked per state
pub const FPE_TEXTURE_UNITS: usize = 8;

/// Texture target codes for [`TextureUnitState::target`]
pub mod target {
    pub const DISABLED: u8 = 0;
    pub const TEX_1D: u8 = 1;
    pub const TEX_2D: u8 = 2;
    pub const TEX_3D: u8 = 3;
    pub const CUBE: u8 = 4;
    pub const RECT: u8 = 5;
}

/// Texture environment codes for [`TextureUnitState::env_mode`]
pub mod env_mode {
    pub const MODULATE: u8 = 0;
    pub const REPLACE: u8 = 1;
    pub const DECAL: u8 = 2;
    pub const BLEND: u8 = 3;
    pub const ADD: u8 = 4;
    pub const COMBINE: u8 = 5;
}

bitflags! {
    /// Pipeline switches folded into the state key
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FpeFlags: u32 {
        const LIGHTING = 1 << 0;
        const TWO_SIDED = 1 << 1;
        const COLOR_MATERIAL = 1 << 2;
        const SEPARATE_SPECULAR = 1 << 3;
        const NORMALIZE = 1 << 4;
        const RESCALE_NORMAL = 1 << 5;
        const FOG = 1 << 6;
        const ALPHA_TEST = 1 << 7;
        const POINT_SPRITE = 1 << 8;
        const FLAT_SHADING = 1 << 9;
    }
}

/// Per texture unit state
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
pub struct TextureUnitState {
    pub target: u8,
    pub env_mode: u8,
    pub combine_rgb: u8,
    pub combine_alpha: u8,
    /// Enabled texgen coordinates (bit 0 = S .. bit 3 = Q)
    pub texgen: u8,
    /// Non-identity texture matrix
    pub texture_matrix: u8,
    pub _pad: [u8; 2],
}

/// Fixed-function state that selects a generated program
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct FpeState {
    /// `FpeFlags` bits, little endian
    flags: [u8; 4],
    pub fog_mode: u8,
    pub fog_source: u8,
    pub alpha_func: u8,
    pub color_material_mode: u8,
    /// Enabled lights (bit n = light n)
    pub lights: u8,
    /// Enabled user clip planes (bit n = plane n)
    pub clip_planes: u8,
    pub _pad0: [u8; 2],
    pub texture: [TextureUnitState; FPE_TEXTURE_UNITS],
}

/// Size of a serialized key
pub const FPE_STATE_SIZE: usize = std::mem::size_of::<FpeState>();

impl FpeState {
    /// Create a new, all-zero state
    pub fn new() -> Self {
        Self::zeroed()
    }

    pub fn flags(&self) -> FpeFlags {
        FpeFlags::from_bits_truncate(u32::from_le_bytes(self.flags))
    }

    pub fn set_flags(&mut self, flags: FpeFlags) {
        self.flags = flags.bits().to_le_bytes();
    }

    pub fn with_flags(mut self, flags: FpeFlags) -> Self {
        self.set_flags(flags);
        self
    }

    /// Set one texture unit; out-of-range units are ignored
    pub fn with_texture(mut self, unit: usize, state: TextureUnitState) -> Self {
        if let Some(slot) = self.texture.get_mut(unit) {
            *slot = state;
        }
        self
    }

    /// Byte-exact archive key
    pub fn key_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Rebuild a state from key bytes
    pub fn from_key_bytes(bytes: &[u8]) -> Option<Self> {
        bytemuck::try_pod_read_unaligned(bytes).ok()
    }

    /// Reset the explicit padding so equal states produce equal keys
    pub fn normalize(&mut self) {
        self._pad0 = [0; 2];
        for unit in &mut self.texture {
            unit._pad = [0; 2];
        }
    }
}

impl Default for FpeState {
    fn default() -> Self {
        Self::new()
    }
}
