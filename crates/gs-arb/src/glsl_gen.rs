//! GLSL 1.20 code generator
//!
//! Emits one `main` for a parsed ARB program. Generation runs in fixed
//! phases: header and declarations, instructions, post-processing of
//! result registers, then the fog/depth/position epilogue.

use crate::binding::*;
use crate::types::*;
use gs_core::{ArbError, Locator, Phase, ProgramKind, TranslatorLimits};

type GResult<T> = Result<T, ArbError>;

//=============================================================================
// OUTPUT BUFFER
//=============================================================================

/// Growable output buffer with fallible growth
#[derive(Debug, Default)]
pub struct GlslWriter {
    buf: String,
    indent: usize,
    limit: Option<usize>,
}

impl GlslWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer that refuses to grow beyond `limit` bytes
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Append raw text
    pub fn push(&mut self, text: &str) -> GResult<()> {
        if let Some(limit) = self.limit {
            if self.buf.len() + text.len() > limit {
                return Err(ArbError::Resource {
                    message: format!("output exceeds {} bytes", limit),
                });
            }
        }
        self.buf
            .try_reserve(text.len())
            .map_err(|e| ArbError::Resource {
                message: format!("failed to grow output buffer: {}", e),
            })?;
        self.buf.push_str(text);
        Ok(())
    }

    /// Append one indented line
    pub fn line(&mut self, text: &str) -> GResult<()> {
        for _ in 0..self.indent {
            self.push("    ")?;
        }
        self.push(text)?;
        self.push("\n")
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

//=============================================================================
// GENERATOR
//=============================================================================

/// GLSL generator for one parsed program
pub struct GlslGenerator<'a> {
    model: &'a ProgramModel,
    limits: TranslatorLimits,
    out: GlslWriter,
}

impl<'a> GlslGenerator<'a> {
    /// Create a new generator
    pub fn new(model: &'a ProgramModel, limits: TranslatorLimits) -> Self {
        Self::with_writer(model, limits, GlslWriter::new())
    }

    /// Create a generator writing into a preconfigured buffer
    pub fn with_writer(model: &'a ProgramModel, limits: TranslatorLimits, out: GlslWriter) -> Self {
        Self { model, limits, out }
    }

    /// Run every phase and return the shader text
    pub fn generate(mut self) -> GResult<String> {
        let model = self.model;

        self.emit_header()?;
        self.emit_declarations()?;
        tracing::trace!("Declared {} variables", model.variables.len());

        for instr in &model.instructions {
            self.emit_instruction(instr)?;
        }
        tracing::trace!("Emitted {} instructions", model.instructions.len());

        self.emit_post_process()?;
        self.emit_epilogue()?;

        self.out.dedent();
        self.out.line("}")?;
        Ok(self.out.into_string())
    }

    fn is_vertex(&self) -> bool {
        self.model.kind == ProgramKind::Vertex
    }

    fn bank_prefix(&self) -> &'static str {
        if self.is_vertex() {
            "arb_vp"
        } else {
            "arb_fp"
        }
    }

    //=========================================================================
    // HEADER AND DECLARATIONS
    //=========================================================================

    fn emit_header(&mut self) -> GResult<()> {
        self.out.line("#version 120")?;
        if self.model.samplers.values().any(|t| *t == TextureTarget::Rect) {
            self.out.line("#extension GL_ARB_texture_rectangle : enable")?;
        }

        if self.is_vertex() {
            self.out.line("struct ARBAddress { int x; };")?;
        }

        let prefix = self.bank_prefix();
        self.out.line(&format!(
            "uniform vec4 {}_env[{}];",
            prefix, self.limits.max_env_params
        ))?;
        self.out.line(&format!(
            "uniform vec4 {}_local[{}];",
            prefix, self.limits.max_local_params
        ))?;

        let model = self.model;
        for (unit, target) in &model.samplers {
            self.out.line(&format!(
                "uniform {} arb_tex{};",
                sampler_type(*target),
                unit
            ))?;
        }

        self.out.line("void main() {")?;
        self.out.indent();
        Ok(())
    }

    fn emit_declarations(&mut self) -> GResult<()> {
        let special = self.model.special;
        if self.is_vertex() && special.has_fog_frag_coord {
            self.out.line("vec4 arb_FogFragCoord = vec4(0.0, 0.0, 0.0, 1.0);")?;
        }
        if !self.is_vertex() && special.is_depth_replacing {
            self.out.line("vec4 arb_FragDepth = vec4(gl_FragCoord.z);")?;
        }

        let model = self.model;
        for (index, var) in model.variables.iter().enumerate() {
            let name = self.var_name(index);
            let line = match &var.kind {
                VariableKind::Temp => format!("vec4 {} = vec4(0.0);", name),
                VariableKind::Address => {
                    if !self.is_vertex() {
                        return Err(declaration_error(format!(
                            "address register `{}` in a fragment program",
                            var.name
                        )));
                    }
                    format!("ARBAddress {} = ARBAddress(0);", name)
                }
                VariableKind::Attrib(binding) => {
                    if binding.is_vertex() != self.is_vertex() {
                        return Err(declaration_error(format!(
                            "attribute `{}` is not available in {} programs",
                            var.name, self.model.kind
                        )));
                    }
                    continue;
                }
                VariableKind::Param(binding) => {
                    let expr = self.param_expr(binding).map_err(declaration_error)?;
                    format!("vec4 {} = {};", name, expr)
                }
                VariableKind::ParamArray(items) => {
                    let exprs = items
                        .iter()
                        .map(|b| self.param_expr(b))
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(declaration_error)?;
                    format!(
                        "vec4 {}[{}] = vec4[{}]({});",
                        name,
                        items.len(),
                        items.len(),
                        exprs.join(", ")
                    )
                }
                VariableKind::Output(binding) if binding.needs_finalization() => {
                    format!("vec4 {} = vec4(0.0);", name)
                }
                VariableKind::Output(_) => continue,
            };
            self.out.line(&line)?;
        }

        Ok(())
    }

    //=========================================================================
    // INSTRUCTIONS
    //=========================================================================

    fn emit_instruction(&mut self, instr: &Instruction) -> GResult<()> {
        let fail = |message: String| ArbError::generation(message, Locator::Offset(instr.offset));

        if instr.opcode == Opcode::Kil {
            let a = operand(instr, 0)
                .and_then(|src| self.src_expr(src))
                .map_err(fail)?;
            let line = format!("if (any(lessThan({}, vec4(0.0)))) discard;", a);
            return self.out.line(&line);
        }

        let dst = instr
            .dst
            .ok_or_else(|| fail(format!("{} has no destination", instr.opcode.info().mnemonic)))?;

        if instr.opcode == Opcode::Arl {
            if self.variable_kind(dst.var) != Some(&VariableKind::Address) {
                return Err(fail("ARL must write an address register".to_string()));
            }
            let a = operand(instr, 0)
                .and_then(|src| self.src_scalar(src))
                .map_err(fail)?;
            let line = format!("{}.x = int(floor({}));", self.var_name(dst.var), a);
            return self.out.line(&line);
        }

        let target = self.dst_expr(dst.var).map_err(fail)?;
        let expr = self.opcode_expr(instr).map_err(fail)?;
        let expr = if instr.saturate {
            format!("clamp({}, 0.0, 1.0)", expr)
        } else {
            expr
        };

        let line = if dst.mask == WriteMask::all() {
            format!("{} = {};", target, expr)
        } else {
            let mask: String = dst.mask.components().map(Component::as_char).collect();
            format!("{}.{} = ({}).{};", target, mask, expr, mask)
        };
        self.out.line(&line)
    }

    fn opcode_expr(&self, instr: &Instruction) -> Result<String, String> {
        let info = instr.opcode.info();
        let src = |i: usize| {
            operand(instr, i).and_then(|src| {
                if info.scalar_sources {
                    self.src_scalar(src)
                } else {
                    self.src_expr(src)
                }
            })
        };

        let expr = match instr.opcode {
            Opcode::Abs => format!("abs({})", src(0)?),
            Opcode::Add => format!("({} + {})", src(0)?, src(1)?),
            Opcode::Cmp => format!(
                "mix({}, {}, vec4(lessThan({}, vec4(0.0))))",
                src(2)?,
                src(1)?,
                src(0)?
            ),
            Opcode::Cos => format!("vec4(cos({}))", src(0)?),
            Opcode::Dp3 => format!("vec4(dot({}.xyz, {}.xyz))", src(0)?, src(1)?),
            Opcode::Dp4 => format!("vec4(dot({}, {}))", src(0)?, src(1)?),
            Opcode::Dph => {
                let b = src(1)?;
                format!("vec4(dot({}.xyz, {}.xyz) + {}.w)", src(0)?, b, b)
            }
            Opcode::Dst => {
                let (a, b) = (src(0)?, src(1)?);
                format!("vec4(1.0, {}.y * {}.y, {}.z, {}.w)", a, b, a, b)
            }
            Opcode::Ex2 => format!("vec4(exp2({}))", src(0)?),
            Opcode::Exp => {
                let a = src(0)?;
                format!(
                    "vec4(exp2(floor({a})), fract({a}), exp2({a}), 1.0)",
                    a = a
                )
            }
            Opcode::Flr => format!("floor({})", src(0)?),
            Opcode::Frc => format!("fract({})", src(0)?),
            Opcode::Lg2 => format!("vec4(log2({}))", src(0)?),
            Opcode::Lit => {
                let a = src(0)?;
                format!(
                    "vec4(1.0, max({a}.x, 0.0), ({a}.x > 0.0) ? pow(max({a}.y, 0.0), clamp({a}.w, -128.0, 128.0)) : 0.0, 1.0)",
                    a = a
                )
            }
            Opcode::Log => {
                let a = src(0)?;
                format!(
                    "vec4(floor(log2(abs({a}))), abs({a}) / exp2(floor(log2(abs({a})))), log2(abs({a})), 1.0)",
                    a = a
                )
            }
            Opcode::Lrp => format!("mix({}, {}, {})", src(2)?, src(1)?, src(0)?),
            Opcode::Mad => format!("({} * {} + {})", src(0)?, src(1)?, src(2)?),
            Opcode::Max => format!("max({}, {})", src(0)?, src(1)?),
            Opcode::Min => format!("min({}, {})", src(0)?, src(1)?),
            Opcode::Mov => src(0)?,
            Opcode::Mul => format!("({} * {})", src(0)?, src(1)?),
            Opcode::Pow => format!("vec4(pow({}, {}))", src(0)?, src(1)?),
            Opcode::Rcp => format!("vec4(1.0 / {})", src(0)?),
            Opcode::Rsq => format!("vec4(inversesqrt(abs({})))", src(0)?),
            Opcode::Scs => {
                let a = src(0)?;
                format!("vec4(cos({}), sin({}), 0.0, 0.0)", a, a)
            }
            Opcode::Sge => format!("vec4(greaterThanEqual({}, {}))", src(0)?, src(1)?),
            Opcode::Sin => format!("vec4(sin({}))", src(0)?),
            Opcode::Slt => format!("vec4(lessThan({}, {}))", src(0)?, src(1)?),
            Opcode::Sub => format!("({} - {})", src(0)?, src(1)?),
            Opcode::Swz => {
                let ext = instr
                    .ext_swizzle
                    .ok_or_else(|| "SWZ without an extended swizzle".to_string())?;
                self.ext_swizzle_expr(operand(instr, 0)?, &ext)?
            }
            Opcode::Xpd => format!("vec4(cross({}.xyz, {}.xyz), 0.0)", src(0)?, src(1)?),
            Opcode::Tex | Opcode::Txb | Opcode::Txp => {
                let texture = instr
                    .texture
                    .ok_or_else(|| format!("{} without a texture unit", instr.opcode.info().mnemonic))?;
                texture_expr(instr.opcode, texture, &src(0)?)?
            }
            Opcode::Arl | Opcode::Kil => {
                return Err(format!(
                    "{} does not produce a value",
                    instr.opcode.info().mnemonic
                ))
            }
        };

        Ok(expr)
    }

    fn ext_swizzle_expr(&self, operand: &SrcOperand, ext: &[ExtSwizzleComponent; 4]) -> Result<String, String> {
        let base = self.reg_expr(&operand.reg)?;
        let parts: Vec<String> = ext
            .iter()
            .map(|comp| {
                let negate = comp.negate != operand.negate;
                let value = match comp.select {
                    ExtSwizzleSelect::Zero => return "0.0".to_string(),
                    ExtSwizzleSelect::One => "1.0".to_string(),
                    ExtSwizzleSelect::Component(c) => format!("{}.{}", base, c.as_char()),
                };
                if negate {
                    format!("-{}", value)
                } else {
                    value
                }
            })
            .collect();
        Ok(format!("vec4({})", parts.join(", ")))
    }

    //=========================================================================
    // POST-PROCESS AND EPILOGUE
    //=========================================================================

    fn emit_post_process(&mut self) -> GResult<()> {
        let model = self.model;
        for (index, var) in model.variables.iter().enumerate() {
            let VariableKind::Output(binding) = &var.kind else {
                continue;
            };
            if binding.is_vertex() != self.is_vertex() {
                return Err(ArbError::generation(
                    format!(
                        "result `{}` is not available in {} programs",
                        var.name, self.model.kind
                    ),
                    Locator::Phase(Phase::PostProcess),
                ));
            }
            if *binding == OutputBinding::PointSize {
                let line = format!("gl_PointSize = {}.x;", self.var_name(index));
                self.out.line(&line)?;
            }
        }
        Ok(())
    }

    fn emit_epilogue(&mut self) -> GResult<()> {
        let special = self.model.special;

        if self.is_vertex() && special.has_fog_frag_coord {
            self.out.line("gl_FogFragCoord = arb_FogFragCoord.x;")?;
        }
        if !self.is_vertex() && special.is_depth_replacing {
            self.out.line("gl_FragDepth = arb_FragDepth.z;")?;
        }

        let fog_factor = match special.fog_type {
            FogType::None => None,
            FogType::Exp => Some("exp(-gl_Fog.density * gl_FogFragCoord)"),
            FogType::Exp2 => Some(
                "exp(-(gl_Fog.density * gl_FogFragCoord) * (gl_Fog.density * gl_FogFragCoord))",
            ),
            FogType::Linear => Some("(gl_Fog.end - gl_FogFragCoord) * gl_Fog.scale"),
        };
        if let (Some(factor), false) = (fog_factor, self.is_vertex()) {
            self.out.line(&format!(
                "gl_FragColor.rgb = mix(gl_Fog.color.rgb, gl_FragColor.rgb, clamp({}, 0.0, 1.0));",
                factor
            ))?;
        }

        if self.is_vertex() && special.position_invariant {
            self.out.line("gl_Position = ftransform();")?;
        }
        Ok(())
    }

    //=========================================================================
    // EXPRESSIONS
    //=========================================================================

    fn variable_kind(&self, index: usize) -> Option<&VariableKind> {
        self.model.variables.get(index).map(|v| &v.kind)
    }

    /// GLSL identifier backing a variable
    fn var_name(&self, index: usize) -> String {
        match self.model.variables.get(index) {
            Some(var) if !var.implicit => user_ident(&var.name),
            _ => format!("arb_implicit{}", index),
        }
    }

    /// Readable expression for a whole variable
    fn var_read(&self, index: usize) -> Result<String, String> {
        let var = self
            .model
            .variables
            .get(index)
            .ok_or_else(|| format!("unknown variable {}", index))?;
        match &var.kind {
            VariableKind::Attrib(binding) => Ok(input_expr(*binding)),
            kind if kind.is_readable() => Ok(self.var_name(index)),
            _ => Err(format!("`{}` cannot be read", var.name)),
        }
    }

    /// Assignable expression for a destination variable
    fn dst_expr(&self, index: usize) -> Result<String, String> {
        let var = self
            .model
            .variables
            .get(index)
            .ok_or_else(|| format!("unknown variable {}", index))?;
        match &var.kind {
            VariableKind::Temp => Ok(self.var_name(index)),
            VariableKind::Output(binding) => Ok(match binding {
                OutputBinding::Position => "gl_Position".to_string(),
                OutputBinding::Color { face, set } => {
                    let face = match face {
                        Face::Front => "Front",
                        Face::Back => "Back",
                    };
                    let set = match set {
                        ColorSet::Primary => "",
                        ColorSet::Secondary => "Secondary",
                    };
                    format!("gl_{}{}Color", face, set)
                }
                OutputBinding::TexCoord(n) => format!("gl_TexCoord[{}]", n),
                OutputBinding::FogCoord => "arb_FogFragCoord".to_string(),
                OutputBinding::PointSize => self.var_name(index),
                OutputBinding::FragColor => "gl_FragColor".to_string(),
                OutputBinding::FragDepth => "arb_FragDepth".to_string(),
            }),
            _ => Err(format!("`{}` cannot be written", var.name)),
        }
    }

    fn reg_expr(&self, reg: &RegRef) -> Result<String, String> {
        match *reg {
            RegRef::Var(index) => self.var_read(index),
            RegRef::Element { var, index } => Ok(format!("{}[{}]", self.var_name(var), index)),
            RegRef::Relative { var, addr, offset } => {
                let base = format!("{}[{}.x", self.var_name(var), self.var_name(addr));
                Ok(match offset {
                    0 => format!("{}]", base),
                    o if o < 0 => format!("{} - {}]", base, -o),
                    o => format!("{} + {}]", base, o),
                })
            }
            RegRef::Literal(value) => Ok(vec4_literal(value)),
        }
    }

    /// Swizzled and negated vector source
    fn src_expr(&self, src: &SrcOperand) -> Result<String, String> {
        let mut expr = self.reg_expr(&src.reg)?;
        if !src.swizzle.is_identity() {
            expr.push('.');
            expr.extend(src.swizzle.0.iter().map(|c| c.as_char()));
        }
        Ok(negated(expr, src.negate))
    }

    /// First swizzle component of a source, as a float
    fn src_scalar(&self, src: &SrcOperand) -> Result<String, String> {
        let expr = format!("{}.{}", self.reg_expr(&src.reg)?, src.swizzle.first().as_char());
        Ok(negated(expr, src.negate))
    }

    fn param_expr(&self, binding: &ParamBinding) -> Result<String, String> {
        let prefix = self.bank_prefix();
        match *binding {
            ParamBinding::Constant(value) => Ok(vec4_literal(value)),
            ParamBinding::Env(n) if n < self.limits.max_env_params => {
                Ok(format!("{}_env[{}]", prefix, n))
            }
            ParamBinding::Local(n) if n < self.limits.max_local_params => {
                Ok(format!("{}_local[{}]", prefix, n))
            }
            ParamBinding::Env(n) => Err(format!("program.env[{}] out of range", n)),
            ParamBinding::Local(n) => Err(format!("program.local[{}] out of range", n)),
            ParamBinding::State(state) => state_expr(state),
        }
    }
}

/// GLSL identifier for a user-declared ARB name.
///
/// `_` becomes `_u` and `$` becomes `_d`, so distinct ARB names stay
/// distinct and never contain `__`. Generated identifiers never start with
/// `arb_u`.
fn user_ident(name: &str) -> String {
    let mut ident = String::with_capacity(name.len() + 8);
    ident.push_str("arb_u");
    for ch in name.chars() {
        match ch {
            '_' => ident.push_str("_u"),
            '$' => ident.push_str("_d"),
            c => ident.push(c),
        }
    }
    ident
}

fn operand(instr: &Instruction, index: usize) -> Result<&SrcOperand, String> {
    instr.srcs.get(index).ok_or_else(|| {
        format!(
            "{} is missing source operand {}",
            instr.opcode.info().mnemonic,
            index
        )
    })
}

fn declaration_error(message: String) -> ArbError {
    ArbError::generation(message, Locator::Phase(Phase::Declaration))
}

fn negated(expr: String, negate: bool) -> String {
    if negate {
        format!("(-{})", expr)
    } else {
        expr
    }
}

/// Float literal accepted by GLSL 1.20
fn float_literal(value: f32) -> String {
    format!("{:?}", value)
}

fn vec4_literal(value: [f32; 4]) -> String {
    let parts: Vec<String> = value.iter().map(|v| float_literal(*v)).collect();
    format!("vec4({})", parts.join(", "))
}

fn sampler_type(target: TextureTarget) -> &'static str {
    match target {
        TextureTarget::Tex1D => "sampler1D",
        TextureTarget::Tex2D => "sampler2D",
        TextureTarget::Tex3D => "sampler3D",
        TextureTarget::Cube => "samplerCube",
        TextureTarget::Rect => "sampler2DRect",
    }
}

fn texture_expr(opcode: Opcode, texture: TextureRef, coord: &str) -> Result<String, String> {
    let sampler = format!("arb_tex{}", texture.unit);
    let (func, swizzle) = match texture.target {
        TextureTarget::Tex1D => ("texture1D", "x"),
        TextureTarget::Tex2D => ("texture2D", "xy"),
        TextureTarget::Tex3D => ("texture3D", "xyz"),
        TextureTarget::Cube => ("textureCube", "xyz"),
        TextureTarget::Rect => ("texture2DRect", "xy"),
    };

    let expr = match (opcode, texture.target) {
        (Opcode::Txp, TextureTarget::Cube) => {
            format!("{}({}, {c}.xyz / {c}.w)", func, sampler, c = coord)
        }
        (Opcode::Txp, _) => format!("{}Proj({}, {})", func, sampler, coord),
        (Opcode::Txb, TextureTarget::Rect) => {
            return Err("TXB not supported on RECT textures".to_string())
        }
        (Opcode::Txb, _) => format!("{}({}, {c}.{}, {c}.w)", func, sampler, swizzle, c = coord),
        _ => format!("{}({}, {}.{})", func, sampler, coord, swizzle),
    };
    Ok(expr)
}

fn input_expr(binding: InputBinding) -> String {
    match binding {
        InputBinding::VertexPosition => "gl_Vertex".to_string(),
        InputBinding::VertexNormal => "vec4(gl_Normal, 1.0)".to_string(),
        InputBinding::VertexColor(ColorSet::Primary) => "gl_Color".to_string(),
        InputBinding::VertexColor(ColorSet::Secondary) => "gl_SecondaryColor".to_string(),
        InputBinding::VertexFogCoord => "vec4(gl_FogCoord, 0.0, 0.0, 1.0)".to_string(),
        InputBinding::VertexTexCoord(n) => format!("gl_MultiTexCoord{}", n),
        InputBinding::FragmentColor(ColorSet::Primary) => "gl_Color".to_string(),
        InputBinding::FragmentColor(ColorSet::Secondary) => "gl_SecondaryColor".to_string(),
        InputBinding::FragmentTexCoord(n) => format!("gl_TexCoord[{}]", n),
        InputBinding::FragmentFogCoord => "vec4(gl_FogFragCoord, 0.0, 0.0, 1.0)".to_string(),
        InputBinding::FragmentPosition => "gl_FragCoord".to_string(),
    }
}

fn matrix_row_expr(matrix: MatrixKind, modifier: MatrixModifier, row: u32) -> String {
    // GLSL indexes columns; row r of M is column r of transpose(M)
    let suffix = match modifier {
        MatrixModifier::Identity => "Transpose",
        MatrixModifier::Transpose => "",
        MatrixModifier::Inverse => "InverseTranspose",
        MatrixModifier::InvTrans => "Inverse",
    };
    match matrix {
        MatrixKind::ModelView => format!("gl_ModelViewMatrix{}[{}]", suffix, row),
        MatrixKind::Projection => format!("gl_ProjectionMatrix{}[{}]", suffix, row),
        MatrixKind::Mvp => format!("gl_ModelViewProjectionMatrix{}[{}]", suffix, row),
        MatrixKind::Texture(unit) => format!("gl_TextureMatrix{}[{}][{}]", suffix, unit, row),
    }
}

fn state_expr(state: StateBinding) -> Result<String, String> {
    let face_name = |face: Face| match face {
        Face::Front => "Front",
        Face::Back => "Back",
    };

    let expr = match state {
        StateBinding::MatrixRow {
            matrix,
            modifier,
            row,
        } => matrix_row_expr(matrix, modifier, row),
        StateBinding::Material { face, property } => {
            let material = format!("gl_{}Material", face_name(face));
            match property {
                MaterialProperty::Ambient => format!("{}.ambient", material),
                MaterialProperty::Diffuse => format!("{}.diffuse", material),
                MaterialProperty::Specular => format!("{}.specular", material),
                MaterialProperty::Emission => format!("{}.emission", material),
                MaterialProperty::Shininess => {
                    format!("vec4({}.shininess, 0.0, 0.0, 1.0)", material)
                }
            }
        }
        StateBinding::Light { light, property } => {
            let l = format!("gl_LightSource[{}]", light);
            match property {
                LightProperty::Ambient => format!("{}.ambient", l),
                LightProperty::Diffuse => format!("{}.diffuse", l),
                LightProperty::Specular => format!("{}.specular", l),
                LightProperty::Position => format!("{}.position", l),
                LightProperty::Attenuation => format!(
                    "vec4({l}.constantAttenuation, {l}.linearAttenuation, {l}.quadraticAttenuation, {l}.spotExponent)",
                    l = l
                ),
                LightProperty::SpotDirection => {
                    format!("vec4({l}.spotDirection, {l}.spotCosCutoff)", l = l)
                }
                LightProperty::Half => format!("vec4({}.halfVector.xyz, 1.0)", l),
            }
        }
        StateBinding::LightModelAmbient => "gl_LightModel.ambient".to_string(),
        StateBinding::LightModelSceneColor(face) => {
            format!("gl_{}LightModelProduct.sceneColor", face_name(face))
        }
        StateBinding::LightProduct {
            light,
            face,
            property,
        } => {
            let product = format!("gl_{}LightProduct[{}]", face_name(face), light);
            match property {
                MaterialProperty::Ambient => format!("{}.ambient", product),
                MaterialProperty::Diffuse => format!("{}.diffuse", product),
                MaterialProperty::Specular => format!("{}.specular", product),
                MaterialProperty::Emission | MaterialProperty::Shininess => {
                    return Err("light products only cover ambient, diffuse and specular".to_string())
                }
            }
        }
        StateBinding::FogColor => "gl_Fog.color".to_string(),
        StateBinding::FogParams => {
            "vec4(gl_Fog.density, gl_Fog.start, gl_Fog.end, gl_Fog.scale)".to_string()
        }
        StateBinding::ClipPlane(n) => format!("gl_ClipPlane[{}]", n),
        StateBinding::PointSize => {
            "vec4(gl_Point.size, gl_Point.sizeMin, gl_Point.sizeMax, gl_Point.fadeThresholdSize)"
                .to_string()
        }
        StateBinding::PointAttenuation => "vec4(gl_Point.distanceConstantAttenuation, gl_Point.distanceLinearAttenuation, gl_Point.distanceQuadraticAttenuation, 1.0)".to_string(),
        StateBinding::TexEnvColor(n) => format!("gl_TextureEnvColor[{}]", n),
        StateBinding::DepthRange => {
            "vec4(gl_DepthRange.near, gl_DepthRange.far, gl_DepthRange.diff, 1.0)".to_string()
        }
    };
    Ok(expr)
}
