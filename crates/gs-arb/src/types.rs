//! ARB program model
//!
//! The parser accumulates variables and instructions into these types; the
//! GLSL generator consumes them.

use crate::binding::{InputBinding, OutputBinding, ParamBinding};
use bitflags::bitflags;
use gs_core::ProgramKind;
use std::collections::BTreeMap;

//=============================================================================
// OPCODES
//=============================================================================

/// ARB program opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Abs,
    Add,
    Arl,
    Cmp,
    Cos,
    Dp3,
    Dp4,
    Dph,
    Dst,
    Ex2,
    Exp,
    Flr,
    Frc,
    Kil,
    Lg2,
    Lit,
    Log,
    Lrp,
    Mad,
    Max,
    Min,
    Mov,
    Mul,
    Pow,
    Rcp,
    Rsq,
    Scs,
    Sge,
    Sin,
    Slt,
    Sub,
    Swz,
    Tex,
    Txb,
    Txp,
    Xpd,
}

/// Which program kinds accept an opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeAvailability {
    Both,
    VertexOnly,
    FragmentOnly,
}

/// Static operand shape of an opcode
#[derive(Debug, Clone, Copy)]
pub struct OpcodeInfo {
    pub mnemonic: &'static str,
    pub sources: usize,
    pub has_dst: bool,
    pub availability: OpcodeAvailability,
    /// Sources are read as scalars (first swizzle component)
    pub scalar_sources: bool,
}

impl Opcode {
    /// Look up an opcode by mnemonic (without `_SAT`)
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        let op = match name {
            "ABS" => Self::Abs,
            "ADD" => Self::Add,
            "ARL" => Self::Arl,
            "CMP" => Self::Cmp,
            "COS" => Self::Cos,
            "DP3" => Self::Dp3,
            "DP4" => Self::Dp4,
            "DPH" => Self::Dph,
            "DST" => Self::Dst,
            "EX2" => Self::Ex2,
            "EXP" => Self::Exp,
            "FLR" => Self::Flr,
            "FRC" => Self::Frc,
            "KIL" => Self::Kil,
            "LG2" => Self::Lg2,
            "LIT" => Self::Lit,
            "LOG" => Self::Log,
            "LRP" => Self::Lrp,
            "MAD" => Self::Mad,
            "MAX" => Self::Max,
            "MIN" => Self::Min,
            "MOV" => Self::Mov,
            "MUL" => Self::Mul,
            "POW" => Self::Pow,
            "RCP" => Self::Rcp,
            "RSQ" => Self::Rsq,
            "SCS" => Self::Scs,
            "SGE" => Self::Sge,
            "SIN" => Self::Sin,
            "SLT" => Self::Slt,
            "SUB" => Self::Sub,
            "SWZ" => Self::Swz,
            "TEX" => Self::Tex,
            "TXB" => Self::Txb,
            "TXP" => Self::Txp,
            "XPD" => Self::Xpd,
            _ => return None,
        };
        Some(op)
    }

    pub fn info(self) -> OpcodeInfo {
        use OpcodeAvailability::*;

        let (mnemonic, sources, has_dst, availability, scalar_sources) = match self {
            Self::Abs => ("ABS", 1, true, Both, false),
            Self::Add => ("ADD", 2, true, Both, false),
            Self::Arl => ("ARL", 1, true, VertexOnly, true),
            Self::Cmp => ("CMP", 3, true, FragmentOnly, false),
            Self::Cos => ("COS", 1, true, FragmentOnly, true),
            Self::Dp3 => ("DP3", 2, true, Both, false),
            Self::Dp4 => ("DP4", 2, true, Both, false),
            Self::Dph => ("DPH", 2, true, Both, false),
            Self::Dst => ("DST", 2, true, Both, false),
            Self::Ex2 => ("EX2", 1, true, Both, true),
            Self::Exp => ("EXP", 1, true, VertexOnly, true),
            Self::Flr => ("FLR", 1, true, Both, false),
            Self::Frc => ("FRC", 1, true, Both, false),
            Self::Kil => ("KIL", 1, false, FragmentOnly, false),
            Self::Lg2 => ("LG2", 1, true, Both, true),
            Self::Lit => ("LIT", 1, true, Both, false),
            Self::Log => ("LOG", 1, true, VertexOnly, true),
            Self::Lrp => ("LRP", 3, true, FragmentOnly, false),
            Self::Mad => ("MAD", 3, true, Both, false),
            Self::Max => ("MAX", 2, true, Both, false),
            Self::Min => ("MIN", 2, true, Both, false),
            Self::Mov => ("MOV", 1, true, Both, false),
            Self::Mul => ("MUL", 2, true, Both, false),
            Self::Pow => ("POW", 2, true, Both, true),
            Self::Rcp => ("RCP", 1, true, Both, true),
            Self::Rsq => ("RSQ", 1, true, Both, true),
            Self::Scs => ("SCS", 1, true, FragmentOnly, true),
            Self::Sge => ("SGE", 2, true, Both, false),
            Self::Sin => ("SIN", 1, true, FragmentOnly, true),
            Self::Slt => ("SLT", 2, true, Both, false),
            Self::Sub => ("SUB", 2, true, Both, false),
            Self::Swz => ("SWZ", 1, true, Both, false),
            Self::Tex => ("TEX", 1, true, FragmentOnly, false),
            Self::Txb => ("TXB", 1, true, FragmentOnly, false),
            Self::Txp => ("TXP", 1, true, FragmentOnly, false),
            Self::Xpd => ("XPD", 2, true, Both, false),
        };

        OpcodeInfo {
            mnemonic,
            sources,
            has_dst,
            availability,
            scalar_sources,
        }
    }

    pub fn available_in(self, kind: ProgramKind) -> bool {
        match self.info().availability {
            OpcodeAvailability::Both => true,
            OpcodeAvailability::VertexOnly => kind == ProgramKind::Vertex,
            OpcodeAvailability::FragmentOnly => kind == ProgramKind::Fragment,
        }
    }

    pub fn is_texture(self) -> bool {
        matches!(self, Self::Tex | Self::Txb | Self::Txp)
    }
}

//=============================================================================
// OPERANDS
//=============================================================================

/// Vector component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    X,
    Y,
    Z,
    W,
}

impl Component {
    pub const ALL: [Component; 4] = [Self::X, Self::Y, Self::Z, Self::W];

    /// Parse `xyzw`, and `rgba` when `allow_rgba` is set
    pub fn from_char(c: char, allow_rgba: bool) -> Option<Self> {
        match c {
            'x' => Some(Self::X),
            'y' => Some(Self::Y),
            'z' => Some(Self::Z),
            'w' => Some(Self::W),
            'r' if allow_rgba => Some(Self::X),
            'g' if allow_rgba => Some(Self::Y),
            'b' if allow_rgba => Some(Self::Z),
            'a' if allow_rgba => Some(Self::W),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::X => 'x',
            Self::Y => 'y',
            Self::Z => 'z',
            Self::W => 'w',
        }
    }
}

/// Source swizzle; a single-component suffix is stored replicated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swizzle(pub [Component; 4]);

impl Swizzle {
    pub const IDENTITY: Swizzle = Swizzle(Component::ALL);

    pub fn replicate(c: Component) -> Self {
        Self([c; 4])
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn first(&self) -> Component {
        self.0[0]
    }
}

impl Default for Swizzle {
    fn default() -> Self {
        Self::IDENTITY
    }
}

bitflags! {
    /// Destination write mask
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WriteMask: u8 {
        const X = 0x01;
        const Y = 0x02;
        const Z = 0x04;
        const W = 0x08;
    }
}

impl WriteMask {
    pub fn component(c: Component) -> Self {
        match c {
            Component::X => Self::X,
            Component::Y => Self::Y,
            Component::Z => Self::Z,
            Component::W => Self::W,
        }
    }

    /// Components in `xyzw` order
    pub fn components(self) -> impl Iterator<Item = Component> {
        Component::ALL
            .into_iter()
            .filter(move |c| self.contains(Self::component(*c)))
    }
}

/// One component of a `SWZ` extended swizzle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtSwizzleComponent {
    pub negate: bool,
    pub select: ExtSwizzleSelect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtSwizzleSelect {
    Zero,
    One,
    Component(Component),
}

/// Register reference of an operand
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegRef {
    /// Whole variable
    Var(usize),
    /// Absolute element of a PARAM array
    Element { var: usize, index: u32 },
    /// `array[addr.x + offset]`
    Relative { var: usize, addr: usize, offset: i32 },
    /// Inline constant
    Literal([f32; 4]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SrcOperand {
    pub negate: bool,
    pub reg: RegRef,
    pub swizzle: Swizzle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DstOperand {
    pub var: usize,
    pub mask: WriteMask,
}

/// Texture target of a sampling instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureTarget {
    Tex1D,
    Tex2D,
    Tex3D,
    Cube,
    Rect,
}

impl TextureTarget {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "1D" => Some(Self::Tex1D),
            "2D" => Some(Self::Tex2D),
            "3D" => Some(Self::Tex3D),
            "CUBE" => Some(Self::Cube),
            "RECT" => Some(Self::Rect),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRef {
    pub unit: u32,
    pub target: TextureTarget,
}

/// One decoded ARB instruction
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub saturate: bool,
    pub dst: Option<DstOperand>,
    pub srcs: Vec<SrcOperand>,
    /// Only for `SWZ`
    pub ext_swizzle: Option<[ExtSwizzleComponent; 4]>,
    /// Only for `TEX`/`TXB`/`TXP`
    pub texture: Option<TextureRef>,
    /// Byte offset of the opcode in the program text
    pub offset: usize,
}

//=============================================================================
// VARIABLES
//=============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum VariableKind {
    Temp,
    Address,
    Attrib(InputBinding),
    Param(ParamBinding),
    ParamArray(Vec<ParamBinding>),
    Output(OutputBinding),
}

impl VariableKind {
    pub fn is_readable(&self) -> bool {
        matches!(
            self,
            Self::Temp | Self::Attrib(_) | Self::Param(_) | Self::ParamArray(_)
        )
    }

    pub fn is_writable(&self) -> bool {
        matches!(self, Self::Temp | Self::Output(_))
    }
}

/// A declared or implicitly created program resource
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Declared name, or the binding text for implicit variables
    pub name: String,
    pub kind: VariableKind,
    pub offset: usize,
    pub implicit: bool,
}

//=============================================================================
// PROGRAM
//=============================================================================

/// Fog equation requested through `OPTION ARB_fog_*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FogType {
    #[default]
    None,
    Exp,
    Exp2,
    Linear,
}

/// Cross-cutting features detected while parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecialCases {
    /// Vertex program writes `result.fogcoord`
    pub has_fog_frag_coord: bool,
    /// Fragment program writes `result.depth`
    pub is_depth_replacing: bool,
    pub fog_type: FogType,
    pub position_invariant: bool,
}

/// Parser state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    Running,
    Done,
    Error,
}

/// Everything the parser accumulated for one program
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramModel {
    pub kind: ProgramKind,
    pub variables: Vec<Variable>,
    pub instructions: Vec<Instruction>,
    pub special: SpecialCases,
    /// Texture unit to target, in unit order
    pub samplers: BTreeMap<u32, TextureTarget>,
}

impl ProgramModel {
    pub fn new(kind: ProgramKind) -> Self {
        Self {
            kind,
            variables: Vec::new(),
            instructions: Vec::new(),
            special: SpecialCases::default(),
            samplers: BTreeMap::new(),
        }
    }
}
