//! Program bindings
//!
//! Bindings name the fixed-function state an ARB program reads from or
//! writes to: vertex/fragment attributes, `result.*` outputs, `state.*`
//! parameters and the program environment/local parameter banks.

/// Highest light index accepted in `state.light[n]`
pub const MAX_LIGHTS: u32 = 8;

/// Highest clip plane index accepted in `state.clip[n]`
pub const MAX_CLIP_PLANES: u32 = 6;

/// Color set selector (`.primary` / `.secondary`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSet {
    #[default]
    Primary,
    Secondary,
}

/// Face selector (`.front` / `.back`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Face {
    #[default]
    Front,
    Back,
}

/// Program input attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputBinding {
    VertexPosition,
    VertexNormal,
    VertexColor(ColorSet),
    VertexFogCoord,
    VertexTexCoord(u32),
    FragmentColor(ColorSet),
    FragmentTexCoord(u32),
    FragmentFogCoord,
    FragmentPosition,
}

impl InputBinding {
    pub fn is_vertex(self) -> bool {
        matches!(
            self,
            Self::VertexPosition
                | Self::VertexNormal
                | Self::VertexColor(_)
                | Self::VertexFogCoord
                | Self::VertexTexCoord(_)
        )
    }

    /// Conventional aliasing of `vertex.attrib[n]` onto the named attributes
    pub fn from_generic_attrib(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::VertexPosition),
            2 => Some(Self::VertexNormal),
            3 => Some(Self::VertexColor(ColorSet::Primary)),
            4 => Some(Self::VertexColor(ColorSet::Secondary)),
            5 => Some(Self::VertexFogCoord),
            8..=15 => Some(Self::VertexTexCoord(index - 8)),
            _ => None,
        }
    }
}

/// Program result register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputBinding {
    Position,
    Color { face: Face, set: ColorSet },
    TexCoord(u32),
    FogCoord,
    PointSize,
    FragColor,
    FragDepth,
}

impl OutputBinding {
    pub fn is_vertex(self) -> bool {
        !matches!(self, Self::FragColor | Self::FragDepth)
    }

    /// Outputs backed by a vec4 temporary that is copied into a scalar
    /// built-in once all instructions ran.
    pub fn needs_finalization(self) -> bool {
        matches!(self, Self::PointSize)
    }
}

/// Fixed-function matrix selected by `state.matrix.*`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixKind {
    ModelView,
    Projection,
    Mvp,
    Texture(u32),
}

/// Matrix modifier suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatrixModifier {
    #[default]
    Identity,
    Inverse,
    Transpose,
    InvTrans,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialProperty {
    Ambient,
    Diffuse,
    Specular,
    Emission,
    Shininess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightProperty {
    Ambient,
    Diffuse,
    Specular,
    Position,
    Attenuation,
    SpotDirection,
    Half,
}

/// A single vec4 of `state.*`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateBinding {
    MatrixRow {
        matrix: MatrixKind,
        modifier: MatrixModifier,
        row: u32,
    },
    Material {
        face: Face,
        property: MaterialProperty,
    },
    Light {
        light: u32,
        property: LightProperty,
    },
    LightModelAmbient,
    LightModelSceneColor(Face),
    LightProduct {
        light: u32,
        face: Face,
        property: MaterialProperty,
    },
    FogColor,
    FogParams,
    ClipPlane(u32),
    PointSize,
    PointAttenuation,
    TexEnvColor(u32),
    DepthRange,
}

/// Source of one PARAM vec4
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamBinding {
    Constant([f32; 4]),
    State(StateBinding),
    Env(u32),
    Local(u32),
}
