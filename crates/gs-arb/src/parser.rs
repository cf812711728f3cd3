//! ARB program parser
//!
//! [`Parser::parse_token`] is driven one statement at a time by the
//! translator loop. Each call starts on the current token; a statement is
//! parsed to its terminating `;`, which stays current so the driver's next
//! advance moves past it.

use crate::binding::*;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::types::*;
use gs_core::{ArbError, ProgramKind, TranslatorLimits};
use std::collections::{BTreeMap, HashMap};

type PResult<T> = Result<T, ArbError>;

/// Words that cannot name a variable
const RESERVED: &[&str] = &[
    "ADDRESS", "ALIAS", "ATTRIB", "END", "OPTION", "OUTPUT", "PARAM", "TEMP", "fragment",
    "program", "result", "state", "texture", "vertex",
];

/// Relative addressing offsets accepted in `array[a0.x + n]`
const RELATIVE_OFFSET_RANGE: std::ops::RangeInclusive<i32> = -64..=63;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Usage {
    Src,
    Dst,
}

/// Statement parser and variable/instruction accumulator
pub struct Parser {
    kind: ProgramKind,
    limits: TranslatorLimits,
    status: ParseStatus,
    error: Option<ArbError>,
    variables: Vec<Variable>,
    instructions: Vec<Instruction>,
    special: SpecialCases,
    samplers: BTreeMap<u32, TextureTarget>,
    symbols: HashMap<String, usize>,
    precision_hint: bool,
    temp_count: u32,
    address_count: u32,
}

impl Parser {
    pub fn new(kind: ProgramKind, limits: TranslatorLimits) -> Self {
        Self {
            kind,
            limits,
            status: ParseStatus::Running,
            error: None,
            variables: Vec::new(),
            instructions: Vec::new(),
            special: SpecialCases::default(),
            samplers: BTreeMap::new(),
            symbols: HashMap::new(),
            precision_hint: false,
            temp_count: 0,
            address_count: 0,
        }
    }

    pub fn status(&self) -> ParseStatus {
        self.status
    }

    pub fn error(&self) -> Option<&ArbError> {
        self.error.as_ref()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn special(&self) -> SpecialCases {
        self.special
    }

    /// Process the statement starting at the current token.
    ///
    /// Does nothing once the parser reached `Done` or `Error`.
    pub fn parse_token(&mut self, lexer: &mut Lexer<'_>) {
        if self.status != ParseStatus::Running {
            return;
        }

        let token = lexer.current();
        let result = match token.kind {
            TokenKind::Newline | TokenKind::Whitespace => Ok(()),
            TokenKind::Eof => Err(ArbError::syntax(
                "unexpected end of program (missing END)",
                token.offset,
            )),
            TokenKind::Identifier => self.statement(lexer, token),
            _ => Err(unexpected(lexer, token, "a statement")),
        };

        if let Err(err) = result {
            self.error = Some(err);
            self.status = ParseStatus::Error;
        }
    }

    /// Hand over the accumulated program, or the error that stopped parsing
    pub fn finish(self) -> Result<ProgramModel, ArbError> {
        match self.status {
            ParseStatus::Done => Ok(ProgramModel {
                kind: self.kind,
                variables: self.variables,
                instructions: self.instructions,
                special: self.special,
                samplers: self.samplers,
            }),
            ParseStatus::Error => Err(self.error.unwrap_or_else(|| ArbError::Resource {
                message: "parser stopped without a diagnostic".to_string(),
            })),
            ParseStatus::Running => Err(ArbError::Resource {
                message: "parser did not reach END".to_string(),
            }),
        }
    }

    //=========================================================================
    // STATEMENTS
    //=========================================================================

    fn statement(&mut self, lexer: &mut Lexer<'_>, keyword: Token) -> PResult<()> {
        match lexer.text(keyword) {
            "END" => {
                self.status = ParseStatus::Done;
                Ok(())
            }
            "OPTION" => self.parse_option(lexer, keyword),
            "TEMP" => self.parse_register_list(lexer, VariableKind::Temp),
            "ADDRESS" => {
                if self.kind != ProgramKind::Vertex {
                    return Err(ArbError::syntax(
                        "ADDRESS registers are only available in vertex programs",
                        keyword.offset,
                    ));
                }
                self.parse_register_list(lexer, VariableKind::Address)
            }
            "ATTRIB" => self.parse_attrib(lexer),
            "PARAM" => self.parse_param(lexer),
            "OUTPUT" => self.parse_output(lexer),
            "ALIAS" => self.parse_alias(lexer),
            _ => self.parse_instruction(lexer, keyword),
        }
    }

    fn parse_option(&mut self, lexer: &mut Lexer<'_>, keyword: Token) -> PResult<()> {
        if !self.variables.is_empty() || !self.instructions.is_empty() {
            return Err(ArbError::syntax(
                "OPTION must precede all declarations and instructions",
                keyword.offset,
            ));
        }

        let (token, name) = expect_ident(lexer, "an option name")?;
        match (self.kind, name) {
            (ProgramKind::Vertex, "ARB_position_invariant") => {
                self.special.position_invariant = true;
            }
            (ProgramKind::Fragment, "ARB_fog_exp" | "ARB_fog_exp2" | "ARB_fog_linear") => {
                if self.special.fog_type != FogType::None {
                    return Err(ArbError::syntax("conflicting fog options", token.offset));
                }
                self.special.fog_type = match name {
                    "ARB_fog_exp" => FogType::Exp,
                    "ARB_fog_exp2" => FogType::Exp2,
                    _ => FogType::Linear,
                };
            }
            (
                ProgramKind::Fragment,
                "ARB_precision_hint_fastest" | "ARB_precision_hint_nicest",
            ) => {
                if self.precision_hint {
                    return Err(ArbError::syntax(
                        "conflicting precision hints",
                        token.offset,
                    ));
                }
                self.precision_hint = true;
            }
            _ => {
                return Err(ArbError::syntax(
                    format!("unknown option `{}`", name),
                    token.offset,
                ))
            }
        }

        expect(lexer, TokenKind::Semicolon, "';'")?;
        Ok(())
    }

    fn parse_register_list(&mut self, lexer: &mut Lexer<'_>, kind: VariableKind) -> PResult<()> {
        loop {
            let (token, name) = expect_ident(lexer, "a register name")?;
            self.declare(name, kind.clone(), token.offset)?;

            let next = lexer.advance_significant();
            match next.kind {
                TokenKind::Comma => continue,
                TokenKind::Semicolon => return Ok(()),
                _ => return Err(unexpected(lexer, next, "',' or ';'")),
            }
        }
    }

    fn parse_attrib(&mut self, lexer: &mut Lexer<'_>) -> PResult<()> {
        let (name_token, name) = expect_ident(lexer, "an attribute name")?;
        expect(lexer, TokenKind::Equals, "'='")?;

        let (root, root_name) = expect_ident(lexer, "an attribute binding")?;
        let binding = match root_name {
            "vertex" | "fragment" => self.parse_input_binding(lexer, root)?,
            _ => return Err(unexpected(lexer, root, "a vertex or fragment binding")),
        };

        expect(lexer, TokenKind::Semicolon, "';'")?;
        self.declare(name, VariableKind::Attrib(binding), name_token.offset)
    }

    fn parse_output(&mut self, lexer: &mut Lexer<'_>) -> PResult<()> {
        let (name_token, name) = expect_ident(lexer, "an output name")?;
        expect(lexer, TokenKind::Equals, "'='")?;

        let (root, root_name) = expect_ident(lexer, "a result binding")?;
        if root_name != "result" {
            return Err(unexpected(lexer, root, "a result binding"));
        }
        let binding = self.parse_output_binding(lexer, root)?;

        expect(lexer, TokenKind::Semicolon, "';'")?;
        self.declare(name, VariableKind::Output(binding), name_token.offset)
    }

    fn parse_alias(&mut self, lexer: &mut Lexer<'_>) -> PResult<()> {
        let (name_token, name) = expect_ident(lexer, "an alias name")?;
        expect(lexer, TokenKind::Equals, "'='")?;
        let (target_token, target) = expect_ident(lexer, "an existing name")?;
        let index = self.lookup(target, target_token.offset)?;
        expect(lexer, TokenKind::Semicolon, "';'")?;

        self.check_new_name(name, name_token.offset)?;
        self.symbols.insert(name.to_string(), index);
        Ok(())
    }

    fn parse_param(&mut self, lexer: &mut Lexer<'_>) -> PResult<()> {
        let (name_token, name) = expect_ident(lexer, "a parameter name")?;

        if lexer.peek_significant().kind != TokenKind::LBracket {
            expect(lexer, TokenKind::Equals, "'='")?;
            let first = lexer.advance_significant();
            let mut items = self.parse_param_item(lexer, first, false)?;
            expect(lexer, TokenKind::Semicolon, "';'")?;

            let binding = items.pop().ok_or_else(|| {
                ArbError::syntax("parameter binding produced no value", first.offset)
            })?;
            return self.declare(name, VariableKind::Param(binding), name_token.offset);
        }

        lexer.advance_significant();
        let size_token = lexer.advance_significant();
        let declared_size = match size_token.kind {
            TokenKind::Integer(size) => {
                expect(lexer, TokenKind::RBracket, "']'")?;
                Some((size, size_token))
            }
            TokenKind::RBracket => None,
            _ => return Err(unexpected(lexer, size_token, "an array size or ']'")),
        };

        expect(lexer, TokenKind::Equals, "'='")?;
        expect(lexer, TokenKind::LBrace, "'{'")?;

        let mut items = Vec::new();
        loop {
            let first = lexer.advance_significant();
            items.extend(self.parse_param_item(lexer, first, true)?);

            let next = lexer.advance_significant();
            match next.kind {
                TokenKind::Comma => continue,
                TokenKind::RBrace => break,
                _ => return Err(unexpected(lexer, next, "',' or '}'")),
            }
        }
        expect(lexer, TokenKind::Semicolon, "';'")?;

        if let Some((size, token)) = declared_size {
            if size as usize != items.len() {
                return Err(ArbError::syntax(
                    format!(
                        "parameter array `{}` declares {} elements but binds {}",
                        name,
                        size,
                        items.len()
                    ),
                    token.offset,
                ));
            }
        }
        if items.is_empty() {
            return Err(ArbError::syntax(
                "parameter array must bind at least one element",
                name_token.offset,
            ));
        }

        self.declare(name, VariableKind::ParamArray(items), name_token.offset)
    }

    fn parse_instruction(&mut self, lexer: &mut Lexer<'_>, op_token: Token) -> PResult<()> {
        let text = lexer.text(op_token);
        let (mnemonic, saturate) = match text.strip_suffix("_SAT") {
            Some(base) if self.kind == ProgramKind::Fragment => (base, true),
            _ => (text, false),
        };

        let opcode = Opcode::from_mnemonic(mnemonic)
            .filter(|op| op.available_in(self.kind))
            .filter(|op| !(saturate && *op == Opcode::Kil))
            .ok_or_else(|| {
                ArbError::syntax(
                    format!("unknown instruction `{}` in {} program", text, self.kind),
                    op_token.offset,
                )
            })?;

        if self.instructions.len() as u32 >= self.limits.max_instructions {
            return Err(ArbError::syntax(
                format!(
                    "too many instructions (max {})",
                    self.limits.max_instructions
                ),
                op_token.offset,
            ));
        }

        let info = opcode.info();
        let mut dst = None;
        let mut srcs = Vec::with_capacity(info.sources);
        let mut ext_swizzle = None;
        let mut texture = None;

        if info.has_dst {
            let first = lexer.advance_significant();
            dst = Some(self.parse_dst(lexer, first, opcode)?);
            expect(lexer, TokenKind::Comma, "','")?;
        }

        for i in 0..info.sources {
            if i > 0 {
                expect(lexer, TokenKind::Comma, "','")?;
            }
            let first = lexer.advance_significant();
            let src = self.parse_src(lexer, first, opcode == Opcode::Swz)?;
            if opcode == Opcode::Arl && matches!(src.reg, RegRef::Relative { .. }) {
                return Err(ArbError::syntax(
                    "ARL source cannot use relative addressing",
                    first.offset,
                ));
            }
            srcs.push(src);
        }

        if opcode == Opcode::Swz {
            ext_swizzle = Some(self.parse_ext_swizzle(lexer)?);
        }

        if opcode.is_texture() {
            expect(lexer, TokenKind::Comma, "','")?;
            texture = Some(self.parse_texture_ref(lexer)?);
        }

        expect(lexer, TokenKind::Semicolon, "';'")?;

        self.instructions.push(Instruction {
            opcode,
            saturate,
            dst,
            srcs,
            ext_swizzle,
            texture,
            offset: op_token.offset,
        });
        Ok(())
    }

    //=========================================================================
    // OPERANDS
    //=========================================================================

    fn parse_dst(&mut self, lexer: &mut Lexer<'_>, first: Token, opcode: Opcode) -> PResult<DstOperand> {
        let reg = self.parse_register(lexer, first, Usage::Dst)?;
        let RegRef::Var(var) = reg else {
            return Err(ArbError::syntax(
                "destination must be a temporary, address or output register",
                first.offset,
            ));
        };

        let is_address = self.variables[var].kind == VariableKind::Address;
        if is_address != (opcode == Opcode::Arl) {
            let message = if is_address {
                "address registers can only be written by ARL"
            } else {
                "ARL must write an address register"
            };
            return Err(ArbError::syntax(message, first.offset));
        }

        let mask = self.parse_write_mask(lexer)?;
        if is_address && mask != WriteMask::X && mask != WriteMask::all() {
            return Err(ArbError::syntax(
                "address registers only have an x component",
                first.offset,
            ));
        }

        match self.variables[var].kind {
            VariableKind::Output(OutputBinding::Position) if self.special.position_invariant => {
                return Err(ArbError::syntax(
                    "position-invariant programs cannot write result.position",
                    first.offset,
                ));
            }
            VariableKind::Output(OutputBinding::FogCoord) => {
                self.special.has_fog_frag_coord = true;
            }
            VariableKind::Output(OutputBinding::FragDepth) => {
                self.special.is_depth_replacing = true;
            }
            _ => {}
        }

        Ok(DstOperand {
            var,
            mask: if is_address { WriteMask::X } else { mask },
        })
    }

    fn parse_src(&mut self, lexer: &mut Lexer<'_>, first: Token, bare: bool) -> PResult<SrcOperand> {
        let (negate, reg_token) = match first.kind {
            TokenKind::Minus => (true, lexer.advance_significant()),
            TokenKind::Plus => (false, lexer.advance_significant()),
            _ => (false, first),
        };

        let reg = self.parse_register(lexer, reg_token, Usage::Src)?;
        let swizzle = if bare {
            Swizzle::IDENTITY
        } else {
            self.parse_swizzle(lexer)?
        };

        Ok(SrcOperand {
            negate,
            reg,
            swizzle,
        })
    }

    /// Register operand without swizzle or mask
    fn parse_register(&mut self, lexer: &mut Lexer<'_>, first: Token, usage: Usage) -> PResult<RegRef> {
        match first.kind {
            TokenKind::LBrace | TokenKind::Integer(_) | TokenKind::Float(_) if usage == Usage::Src => {
                let value = if first.kind == TokenKind::LBrace {
                    self.parse_vector_constant(lexer, first)?
                } else {
                    let scalar = number_value(first)?;
                    [scalar; 4]
                };
                Ok(RegRef::Literal(value))
            }
            TokenKind::Identifier => {
                let name = lexer.text(first);
                match name {
                    "vertex" | "fragment" | "state" | "program" | "result" => {
                        let kind = self.parse_implicit_binding(lexer, first, usage)?;
                        let text = lexer.slice(first.offset, lexer.current().end()).to_string();
                        Ok(RegRef::Var(self.implicit_variable(text, kind, first.offset)))
                    }
                    _ => {
                        let var = self.lookup(name, first.offset)?;
                        self.parse_named_register(lexer, first, var, usage)
                    }
                }
            }
            _ => Err(unexpected(lexer, first, "a register")),
        }
    }

    fn parse_named_register(
        &mut self,
        lexer: &mut Lexer<'_>,
        first: Token,
        var: usize,
        usage: Usage,
    ) -> PResult<RegRef> {
        let kind = &self.variables[var].kind;
        let name = &self.variables[var].name;

        match usage {
            Usage::Src if !kind.is_readable() => {
                return Err(ArbError::syntax(
                    format!("`{}` cannot be used as a source operand", name),
                    first.offset,
                ));
            }
            Usage::Dst if !kind.is_writable() && *kind != VariableKind::Address => {
                return Err(ArbError::syntax(
                    format!("`{}` is read-only", name),
                    first.offset,
                ));
            }
            _ => {}
        }

        let array_len = match kind {
            VariableKind::ParamArray(items) => Some(items.len() as u32),
            _ => None,
        };
        let has_index = lexer.peek_significant().kind == TokenKind::LBracket;

        match (array_len, has_index) {
            (None, false) => Ok(RegRef::Var(var)),
            (None, true) => Err(ArbError::syntax(
                format!("`{}` is not an array", name),
                first.offset,
            )),
            (Some(_), false) => Err(ArbError::syntax(
                format!("array `{}` must be indexed", name),
                first.offset,
            )),
            (Some(len), true) => {
                lexer.advance_significant();
                let index_token = lexer.advance_significant();
                let reg = match index_token.kind {
                    TokenKind::Integer(index) => {
                        if index >= len {
                            return Err(ArbError::syntax(
                                format!("index {} out of range for array of {}", index, len),
                                index_token.offset,
                            ));
                        }
                        RegRef::Element { var, index }
                    }
                    TokenKind::Identifier => self.parse_relative_index(lexer, index_token, var)?,
                    _ => return Err(unexpected(lexer, index_token, "an array index")),
                };
                expect(lexer, TokenKind::RBracket, "']'")?;
                Ok(reg)
            }
        }
    }

    /// `a0.x`, `a0.x + 3`, `a0.x - 2` inside an array subscript
    fn parse_relative_index(&self, lexer: &mut Lexer<'_>, addr_token: Token, var: usize) -> PResult<RegRef> {
        if self.kind != ProgramKind::Vertex {
            return Err(ArbError::syntax(
                "relative addressing is only available in vertex programs",
                addr_token.offset,
            ));
        }

        let addr = self.lookup(lexer.text(addr_token), addr_token.offset)?;
        if self.variables[addr].kind != VariableKind::Address {
            return Err(ArbError::syntax(
                format!("`{}` is not an address register", lexer.text(addr_token)),
                addr_token.offset,
            ));
        }

        expect(lexer, TokenKind::Dot, "'.'")?;
        let (comp_token, comp) = expect_ident(lexer, "'x'")?;
        if comp != "x" {
            return Err(ArbError::syntax(
                "address registers only have an x component",
                comp_token.offset,
            ));
        }

        let next = lexer.peek_significant();
        let offset = match next.kind {
            TokenKind::Plus | TokenKind::Minus => {
                lexer.advance_significant();
                let value_token = lexer.advance_significant();
                let TokenKind::Integer(value) = value_token.kind else {
                    return Err(unexpected(lexer, value_token, "an integer offset"));
                };
                let value = i32::try_from(value).unwrap_or(i32::MAX);
                let offset = if next.kind == TokenKind::Minus { -value } else { value };
                if !RELATIVE_OFFSET_RANGE.contains(&offset) {
                    return Err(ArbError::syntax(
                        format!("relative offset {} out of range", offset),
                        value_token.offset,
                    ));
                }
                offset
            }
            _ => 0,
        };

        Ok(RegRef::Relative { var, addr, offset })
    }

    fn parse_swizzle(&mut self, lexer: &mut Lexer<'_>) -> PResult<Swizzle> {
        let Some((token, text)) = self.component_suffix(lexer) else {
            return Ok(Swizzle::IDENTITY);
        };

        let comps = self.components(text, token)?;
        match comps.as_slice() {
            [c] => Ok(Swizzle::replicate(*c)),
            [a, b, c, d] => Ok(Swizzle([*a, *b, *c, *d])),
            _ => Err(ArbError::syntax(
                format!("invalid swizzle `{}`", text),
                token.offset,
            )),
        }
    }

    fn parse_write_mask(&mut self, lexer: &mut Lexer<'_>) -> PResult<WriteMask> {
        let Some((token, text)) = self.component_suffix(lexer) else {
            return Ok(WriteMask::all());
        };

        let mut mask = WriteMask::empty();
        let mut last = None;
        for comp in self.components(text, token)? {
            let index = comp as usize;
            if last.is_some_and(|prev| index <= prev) {
                return Err(ArbError::syntax(
                    format!("invalid write mask `{}`", text),
                    token.offset,
                ));
            }
            last = Some(index);
            mask |= WriteMask::component(comp);
        }
        Ok(mask)
    }

    /// Consume `.ident` if present
    fn component_suffix<'src>(&self, lexer: &mut Lexer<'src>) -> Option<(Token, &'src str)> {
        if lexer.peek_significant().kind != TokenKind::Dot {
            return None;
        }
        lexer.advance_significant();
        let token = lexer.advance_significant();
        Some((token, lexer.text(token)))
    }

    fn components(&self, text: &str, token: Token) -> PResult<Vec<Component>> {
        let allow_rgba = self.kind == ProgramKind::Fragment;
        let comps: Option<Vec<Component>> = text
            .chars()
            .map(|c| Component::from_char(c, allow_rgba))
            .collect();

        let xyzw = text.chars().all(|c| "xyzw".contains(c));
        let rgba = text.chars().all(|c| "rgba".contains(c));
        match comps {
            Some(comps) if !comps.is_empty() && (xyzw || rgba) => Ok(comps),
            _ => Err(ArbError::syntax(
                format!("invalid component selector `{}`", text),
                token.offset,
            )),
        }
    }

    fn parse_ext_swizzle(&mut self, lexer: &mut Lexer<'_>) -> PResult<[ExtSwizzleComponent; 4]> {
        let allow_rgba = self.kind == ProgramKind::Fragment;
        let mut out = [ExtSwizzleComponent {
            negate: false,
            select: ExtSwizzleSelect::Zero,
        }; 4];

        for slot in out.iter_mut() {
            expect(lexer, TokenKind::Comma, "','")?;
            let mut token = lexer.advance_significant();
            let mut negate = false;
            if matches!(token.kind, TokenKind::Minus | TokenKind::Plus) {
                negate = token.kind == TokenKind::Minus;
                token = lexer.advance_significant();
            }

            let select = match token.kind {
                TokenKind::Integer(0) => ExtSwizzleSelect::Zero,
                TokenKind::Integer(1) => ExtSwizzleSelect::One,
                TokenKind::Identifier => {
                    let mut chars = lexer.text(token).chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => Component::from_char(c, allow_rgba)
                            .map(ExtSwizzleSelect::Component)
                            .ok_or_else(|| unexpected(lexer, token, "a swizzle component"))?,
                        _ => return Err(unexpected(lexer, token, "a swizzle component")),
                    }
                }
                _ => return Err(unexpected(lexer, token, "0, 1 or a component")),
            };

            *slot = ExtSwizzleComponent { negate, select };
        }

        Ok(out)
    }

    /// `texture[n], TARGET` (or bare `texture` for unit 0)
    fn parse_texture_ref(&mut self, lexer: &mut Lexer<'_>) -> PResult<TextureRef> {
        let (token, name) = expect_ident(lexer, "a texture image unit")?;
        if name != "texture" {
            return Err(unexpected(lexer, token, "a texture image unit"));
        }
        let unit = self.optional_index(lexer)?.map(|(unit, _)| unit).unwrap_or(0);
        if unit >= self.limits.max_texture_units {
            return Err(ArbError::syntax(
                format!(
                    "texture unit {} out of range (max {})",
                    unit, self.limits.max_texture_units
                ),
                token.offset,
            ));
        }

        expect(lexer, TokenKind::Comma, "','")?;
        let (target_token, target_name) = expect_ident(lexer, "a texture target")?;
        let target = TextureTarget::from_name(target_name)
            .ok_or_else(|| unexpected(lexer, target_token, "1D, 2D, 3D, CUBE or RECT"))?;

        match self.samplers.get(&unit) {
            Some(existing) if *existing != target => {
                return Err(ArbError::syntax(
                    format!("texture unit {} used with conflicting targets", unit),
                    target_token.offset,
                ));
            }
            _ => {
                self.samplers.insert(unit, target);
            }
        }

        Ok(TextureRef { unit, target })
    }

    //=========================================================================
    // BINDINGS
    //=========================================================================

    fn parse_implicit_binding(&mut self, lexer: &mut Lexer<'_>, root: Token, usage: Usage) -> PResult<VariableKind> {
        let name = lexer.text(root);
        match (name, usage) {
            ("vertex" | "fragment", Usage::Src) => {
                Ok(VariableKind::Attrib(self.parse_input_binding(lexer, root)?))
            }
            ("state" | "program", Usage::Src) => {
                let mut items = self.parse_param_item(lexer, root, false)?;
                let binding = items
                    .pop()
                    .ok_or_else(|| ArbError::syntax("binding produced no value", root.offset))?;
                Ok(VariableKind::Param(binding))
            }
            ("result", Usage::Dst) => Ok(VariableKind::Output(self.parse_output_binding(lexer, root)?)),
            ("result", Usage::Src) => Err(ArbError::syntax(
                "result registers cannot be read",
                root.offset,
            )),
            _ => Err(ArbError::syntax(
                format!("`{}` bindings are read-only", name),
                root.offset,
            )),
        }
    }

    fn parse_input_binding(&mut self, lexer: &mut Lexer<'_>, root: Token) -> PResult<InputBinding> {
        let is_vertex = lexer.text(root) == "vertex";
        if is_vertex != (self.kind == ProgramKind::Vertex) {
            return Err(ArbError::syntax(
                format!("`{}` bindings are not available in {} programs", lexer.text(root), self.kind),
                root.offset,
            ));
        }

        expect(lexer, TokenKind::Dot, "'.'")?;
        let (token, name) = expect_ident(lexer, "an attribute")?;

        let binding = match (is_vertex, name) {
            (true, "position") => InputBinding::VertexPosition,
            (true, "normal") => InputBinding::VertexNormal,
            (true, "fogcoord") => InputBinding::VertexFogCoord,
            (true, "color") => InputBinding::VertexColor(self.optional_color_set(lexer)),
            (true, "texcoord") => InputBinding::VertexTexCoord(self.texcoord_index(lexer, token)?),
            (true, "attrib") => {
                let (index, index_token) = self.required_index(lexer)?;
                InputBinding::from_generic_attrib(index).ok_or_else(|| {
                    ArbError::syntax(
                        format!("generic vertex attribute {} is not supported", index),
                        index_token.offset,
                    )
                })?
            }
            (false, "position") => InputBinding::FragmentPosition,
            (false, "fogcoord") => InputBinding::FragmentFogCoord,
            (false, "color") => InputBinding::FragmentColor(self.optional_color_set(lexer)),
            (false, "texcoord") => InputBinding::FragmentTexCoord(self.texcoord_index(lexer, token)?),
            _ => {
                return Err(ArbError::syntax(
                    format!("unknown attribute binding `{}`", name),
                    token.offset,
                ))
            }
        };

        Ok(binding)
    }

    fn parse_output_binding(&mut self, lexer: &mut Lexer<'_>, _root: Token) -> PResult<OutputBinding> {
        expect(lexer, TokenKind::Dot, "'.'")?;
        let (token, name) = expect_ident(lexer, "a result register")?;

        let binding = match (self.kind, name) {
            (ProgramKind::Vertex, "position") => OutputBinding::Position,
            (ProgramKind::Vertex, "fogcoord") => OutputBinding::FogCoord,
            (ProgramKind::Vertex, "pointsize") => OutputBinding::PointSize,
            (ProgramKind::Vertex, "texcoord") => OutputBinding::TexCoord(self.texcoord_index(lexer, token)?),
            (ProgramKind::Vertex, "color") => {
                let face = match self.peek_suffix(lexer, &["front", "back"]) {
                    Some("back") => Face::Back,
                    _ => Face::Front,
                };
                let set = self.optional_color_set(lexer);
                OutputBinding::Color { face, set }
            }
            (ProgramKind::Fragment, "color") => OutputBinding::FragColor,
            (ProgramKind::Fragment, "depth") => OutputBinding::FragDepth,
            _ => {
                return Err(ArbError::syntax(
                    format!("unknown result binding `{}` in {} program", name, self.kind),
                    token.offset,
                ))
            }
        };

        Ok(binding)
    }

    /// One PARAM initializer; multi-valued items only when `multi` is set
    fn parse_param_item(&mut self, lexer: &mut Lexer<'_>, first: Token, multi: bool) -> PResult<Vec<ParamBinding>> {
        match first.kind {
            TokenKind::LBrace => Ok(vec![ParamBinding::Constant(
                self.parse_vector_constant(lexer, first)?,
            )]),
            TokenKind::Minus | TokenKind::Plus | TokenKind::Integer(_) | TokenKind::Float(_) => {
                let value = self.parse_signed_number(lexer, first)?;
                Ok(vec![ParamBinding::Constant([value; 4])])
            }
            TokenKind::Identifier if lexer.text(first) == "state" => {
                let items = self.parse_state_binding(lexer, first)?;
                if !multi && items.len() != 1 {
                    return Err(ArbError::syntax(
                        "binding names more than one vector; use a PARAM array",
                        first.offset,
                    ));
                }
                Ok(items.into_iter().map(ParamBinding::State).collect())
            }
            TokenKind::Identifier if lexer.text(first) == "program" => {
                self.parse_program_param(lexer, first, multi)
            }
            _ => Err(unexpected(lexer, first, "a parameter binding")),
        }
    }

    /// `program.env[a]`, `program.local[a..b]`
    fn parse_program_param(&mut self, lexer: &mut Lexer<'_>, root: Token, multi: bool) -> PResult<Vec<ParamBinding>> {
        expect(lexer, TokenKind::Dot, "'.'")?;
        let (token, bank) = expect_ident(lexer, "env or local")?;
        let (is_env, limit) = match bank {
            "env" => (true, self.limits.max_env_params),
            "local" => (false, self.limits.max_local_params),
            _ => return Err(unexpected(lexer, token, "env or local")),
        };

        let (start, end, range_token) = self.index_range(lexer)?;
        if !multi && start != end {
            return Err(ArbError::syntax(
                "parameter ranges are only allowed in PARAM arrays",
                root.offset,
            ));
        }
        if end >= limit {
            return Err(ArbError::syntax(
                format!("program.{}[{}] out of range (max {})", bank, end, limit),
                range_token.offset,
            ));
        }

        Ok((start..=end)
            .map(|i| if is_env { ParamBinding::Env(i) } else { ParamBinding::Local(i) })
            .collect())
    }

    fn parse_state_binding(&mut self, lexer: &mut Lexer<'_>, _root: Token) -> PResult<Vec<StateBinding>> {
        expect(lexer, TokenKind::Dot, "'.'")?;
        let (token, group) = expect_ident(lexer, "a state group")?;

        let single = |b: StateBinding| -> PResult<Vec<StateBinding>> { Ok(vec![b]) };
        match group {
            "matrix" => self.parse_matrix_binding(lexer),
            "material" => {
                let face = self.optional_face(lexer);
                expect(lexer, TokenKind::Dot, "'.'")?;
                let property = self.material_property(lexer, true)?;
                single(StateBinding::Material { face, property })
            }
            "light" => {
                let (light, index_token) = self.required_index(lexer)?;
                check_index(light, MAX_LIGHTS, "light", index_token)?;
                expect(lexer, TokenKind::Dot, "'.'")?;
                let (prop_token, prop) = expect_ident(lexer, "a light property")?;
                let property = match prop {
                    "ambient" => LightProperty::Ambient,
                    "diffuse" => LightProperty::Diffuse,
                    "specular" => LightProperty::Specular,
                    "position" => LightProperty::Position,
                    "attenuation" => LightProperty::Attenuation,
                    "spot" => {
                        expect(lexer, TokenKind::Dot, "'.'")?;
                        let (dir_token, dir) = expect_ident(lexer, "direction")?;
                        if dir != "direction" {
                            return Err(unexpected(lexer, dir_token, "direction"));
                        }
                        LightProperty::SpotDirection
                    }
                    "half" => LightProperty::Half,
                    _ => return Err(unexpected(lexer, prop_token, "a light property")),
                };
                single(StateBinding::Light { light, property })
            }
            "lightmodel" => {
                expect(lexer, TokenKind::Dot, "'.'")?;
                let (prop_token, prop) = expect_ident(lexer, "a light model property")?;
                match prop {
                    "ambient" => single(StateBinding::LightModelAmbient),
                    "scenecolor" => single(StateBinding::LightModelSceneColor(Face::Front)),
                    "front" | "back" => {
                        expect(lexer, TokenKind::Dot, "'.'")?;
                        let (sc_token, sc) = expect_ident(lexer, "scenecolor")?;
                        if sc != "scenecolor" {
                            return Err(unexpected(lexer, sc_token, "scenecolor"));
                        }
                        let face = if prop == "back" { Face::Back } else { Face::Front };
                        single(StateBinding::LightModelSceneColor(face))
                    }
                    _ => Err(unexpected(lexer, prop_token, "a light model property")),
                }
            }
            "lightprod" => {
                let (light, index_token) = self.required_index(lexer)?;
                check_index(light, MAX_LIGHTS, "light", index_token)?;
                let face = self.optional_face(lexer);
                expect(lexer, TokenKind::Dot, "'.'")?;
                let property = self.material_property(lexer, false)?;
                single(StateBinding::LightProduct { light, face, property })
            }
            "fog" => {
                expect(lexer, TokenKind::Dot, "'.'")?;
                let (prop_token, prop) = expect_ident(lexer, "color or params")?;
                match prop {
                    "color" => single(StateBinding::FogColor),
                    "params" => single(StateBinding::FogParams),
                    _ => Err(unexpected(lexer, prop_token, "color or params")),
                }
            }
            "clip" => {
                let (plane, index_token) = self.required_index(lexer)?;
                check_index(plane, MAX_CLIP_PLANES, "clip plane", index_token)?;
                expect(lexer, TokenKind::Dot, "'.'")?;
                let (prop_token, prop) = expect_ident(lexer, "plane")?;
                if prop != "plane" {
                    return Err(unexpected(lexer, prop_token, "plane"));
                }
                single(StateBinding::ClipPlane(plane))
            }
            "point" => {
                expect(lexer, TokenKind::Dot, "'.'")?;
                let (prop_token, prop) = expect_ident(lexer, "size or attenuation")?;
                match prop {
                    "size" => single(StateBinding::PointSize),
                    "attenuation" => single(StateBinding::PointAttenuation),
                    _ => Err(unexpected(lexer, prop_token, "size or attenuation")),
                }
            }
            "texenv" => {
                let unit = match self.optional_index(lexer)? {
                    Some((unit, index_token)) => {
                        check_index(unit, self.limits.max_texture_coords, "texture environment", index_token)?;
                        unit
                    }
                    None => 0,
                };
                expect(lexer, TokenKind::Dot, "'.'")?;
                let (prop_token, prop) = expect_ident(lexer, "color")?;
                if prop != "color" {
                    return Err(unexpected(lexer, prop_token, "color"));
                }
                single(StateBinding::TexEnvColor(unit))
            }
            "depth" => {
                expect(lexer, TokenKind::Dot, "'.'")?;
                let (prop_token, prop) = expect_ident(lexer, "range")?;
                if prop != "range" {
                    return Err(unexpected(lexer, prop_token, "range"));
                }
                single(StateBinding::DepthRange)
            }
            _ => Err(ArbError::syntax(
                format!("unsupported state binding `state.{}`", group),
                token.offset,
            )),
        }
    }

    fn parse_matrix_binding(&mut self, lexer: &mut Lexer<'_>) -> PResult<Vec<StateBinding>> {
        expect(lexer, TokenKind::Dot, "'.'")?;
        let (token, name) = expect_ident(lexer, "a matrix name")?;

        let matrix = match name {
            "modelview" => {
                if let Some((index, index_token)) = self.optional_index(lexer)? {
                    if index != 0 {
                        return Err(ArbError::syntax(
                            "only modelview matrix 0 is supported",
                            index_token.offset,
                        ));
                    }
                }
                MatrixKind::ModelView
            }
            "projection" => MatrixKind::Projection,
            "mvp" => MatrixKind::Mvp,
            "texture" => {
                let unit = match self.optional_index(lexer)? {
                    Some((unit, index_token)) => {
                        check_index(unit, self.limits.max_texture_coords, "texture matrix", index_token)?;
                        unit
                    }
                    None => 0,
                };
                MatrixKind::Texture(unit)
            }
            _ => {
                return Err(ArbError::syntax(
                    format!("unsupported matrix `{}`", name),
                    token.offset,
                ))
            }
        };

        let modifier = match self.peek_suffix(lexer, &["inverse", "transpose", "invtrans"]) {
            Some("inverse") => MatrixModifier::Inverse,
            Some("transpose") => MatrixModifier::Transpose,
            Some("invtrans") => MatrixModifier::InvTrans,
            _ => MatrixModifier::Identity,
        };

        let (start, end) = match self.peek_suffix(lexer, &["row"]) {
            Some(_) => {
                let (start, end, range_token) = self.index_range(lexer)?;
                check_index(end, 4, "matrix row", range_token)?;
                (start, end)
            }
            None => (0, 3),
        };

        Ok((start..=end)
            .map(|row| StateBinding::MatrixRow {
                matrix,
                modifier,
                row,
            })
            .collect())
    }

    //=========================================================================
    // HELPERS
    //=========================================================================

    /// Consume `.word` when `word` is one of `accepted`
    fn peek_suffix(&self, lexer: &mut Lexer<'_>, accepted: &[&'static str]) -> Option<&'static str> {
        let mut probe = lexer.clone();
        if probe.advance_significant().kind != TokenKind::Dot {
            return None;
        }
        let word = probe.advance_significant();
        if word.kind != TokenKind::Identifier {
            return None;
        }
        let found = accepted.iter().find(|w| **w == probe.text(word)).copied()?;
        *lexer = probe;
        Some(found)
    }

    fn optional_color_set(&self, lexer: &mut Lexer<'_>) -> ColorSet {
        match self.peek_suffix(lexer, &["primary", "secondary"]) {
            Some("secondary") => ColorSet::Secondary,
            _ => ColorSet::Primary,
        }
    }

    fn optional_face(&self, lexer: &mut Lexer<'_>) -> Face {
        match self.peek_suffix(lexer, &["front", "back"]) {
            Some("back") => Face::Back,
            _ => Face::Front,
        }
    }

    fn material_property(&self, lexer: &mut Lexer<'_>, with_extra: bool) -> PResult<MaterialProperty> {
        let (token, prop) = expect_ident(lexer, "a material property")?;
        match (prop, with_extra) {
            ("ambient", _) => Ok(MaterialProperty::Ambient),
            ("diffuse", _) => Ok(MaterialProperty::Diffuse),
            ("specular", _) => Ok(MaterialProperty::Specular),
            ("emission", true) => Ok(MaterialProperty::Emission),
            ("shininess", true) => Ok(MaterialProperty::Shininess),
            _ => Err(unexpected(lexer, token, "a material property")),
        }
    }

    fn texcoord_index(&self, lexer: &mut Lexer<'_>, token: Token) -> PResult<u32> {
        let (index, index_token) = self.optional_index(lexer)?.unwrap_or((0, token));
        check_index(index, self.limits.max_texture_coords, "texture coordinate set", index_token)?;
        Ok(index)
    }

    /// `[n]` if the next token opens a subscript
    fn optional_index(&self, lexer: &mut Lexer<'_>) -> PResult<Option<(u32, Token)>> {
        if lexer.peek_significant().kind != TokenKind::LBracket {
            return Ok(None);
        }
        self.required_index(lexer).map(Some)
    }

    fn required_index(&self, lexer: &mut Lexer<'_>) -> PResult<(u32, Token)> {
        expect(lexer, TokenKind::LBracket, "'['")?;
        let token = lexer.advance_significant();
        let TokenKind::Integer(index) = token.kind else {
            return Err(unexpected(lexer, token, "an integer index"));
        };
        expect(lexer, TokenKind::RBracket, "']'")?;
        Ok((index, token))
    }

    /// `[a]` or `[a..b]`, returned inclusive
    fn index_range(&self, lexer: &mut Lexer<'_>) -> PResult<(u32, u32, Token)> {
        expect(lexer, TokenKind::LBracket, "'['")?;
        let token = lexer.advance_significant();
        let TokenKind::Integer(start) = token.kind else {
            return Err(unexpected(lexer, token, "an integer index"));
        };

        let next = lexer.advance_significant();
        let end = match next.kind {
            TokenKind::RBracket => return Ok((start, start, token)),
            TokenKind::DotDot => {
                let end_token = lexer.advance_significant();
                let TokenKind::Integer(end) = end_token.kind else {
                    return Err(unexpected(lexer, end_token, "an integer index"));
                };
                end
            }
            _ => return Err(unexpected(lexer, next, "']' or '..'")),
        };
        expect(lexer, TokenKind::RBracket, "']'")?;

        if end < start {
            return Err(ArbError::syntax(
                format!("invalid index range {}..{}", start, end),
                token.offset,
            ));
        }
        Ok((start, end, token))
    }

    /// `{x[, y[, z[, w]]]}`; missing components default from (0, 0, 0, 1)
    fn parse_vector_constant(&self, lexer: &mut Lexer<'_>, open: Token) -> PResult<[f32; 4]> {
        let mut value = [0.0, 0.0, 0.0, 1.0];
        let mut count = 0;

        loop {
            let token = lexer.advance_significant();
            if count == 4 {
                return Err(unexpected(lexer, token, "'}'"));
            }
            value[count] = self.parse_signed_number(lexer, token)?;
            count += 1;

            let next = lexer.advance_significant();
            match next.kind {
                TokenKind::Comma => continue,
                TokenKind::RBrace => break,
                _ => return Err(unexpected(lexer, next, "',' or '}'")),
            }
        }

        tracing::trace!("Vector constant at {}: {:?}", open.offset, value);
        Ok(value)
    }

    fn parse_signed_number(&self, lexer: &mut Lexer<'_>, first: Token) -> PResult<f32> {
        let (sign, token) = match first.kind {
            TokenKind::Minus => (-1.0, lexer.advance_significant()),
            TokenKind::Plus => (1.0, lexer.advance_significant()),
            _ => (1.0, first),
        };
        match token.kind {
            TokenKind::Integer(_) | TokenKind::Float(_) => Ok(sign * number_value(token)?),
            _ => Err(unexpected(lexer, token, "a number")),
        }
    }

    fn check_new_name(&self, name: &str, offset: usize) -> PResult<()> {
        if RESERVED.contains(&name) || Opcode::from_mnemonic(name.trim_end_matches("_SAT")).is_some() {
            return Err(ArbError::syntax(
                format!("`{}` is a reserved word", name),
                offset,
            ));
        }
        if self.symbols.contains_key(name) {
            return Err(ArbError::syntax(
                format!("redeclaration of `{}`", name),
                offset,
            ));
        }
        Ok(())
    }

    fn declare(&mut self, name: &str, kind: VariableKind, offset: usize) -> PResult<()> {
        self.check_new_name(name, offset)?;

        match kind {
            VariableKind::Temp => {
                if self.temp_count >= self.limits.max_temporaries {
                    return Err(ArbError::syntax(
                        format!("too many temporaries (max {})", self.limits.max_temporaries),
                        offset,
                    ));
                }
                self.temp_count += 1;
            }
            VariableKind::Address => {
                if self.address_count >= self.limits.max_address_registers {
                    return Err(ArbError::syntax(
                        format!(
                            "too many address registers (max {})",
                            self.limits.max_address_registers
                        ),
                        offset,
                    ));
                }
                self.address_count += 1;
            }
            _ => {}
        }

        let index = self.variables.len();
        self.variables.push(Variable {
            name: name.to_string(),
            kind,
            offset,
            implicit: false,
        });
        self.symbols.insert(name.to_string(), index);
        Ok(())
    }

    /// Reuse or append the implicit variable for a binding named inline
    fn implicit_variable(&mut self, text: String, kind: VariableKind, offset: usize) -> usize {
        if let Some(index) = self
            .variables
            .iter()
            .position(|v| v.implicit && v.kind == kind)
        {
            return index;
        }

        self.variables.push(Variable {
            name: text,
            kind,
            offset,
            implicit: true,
        });
        self.variables.len() - 1
    }

    fn lookup(&self, name: &str, offset: usize) -> PResult<usize> {
        self.symbols.get(name).copied().ok_or_else(|| {
            ArbError::syntax(format!("undeclared identifier `{}`", name), offset)
        })
    }
}

fn number_value(token: Token) -> PResult<f32> {
    let value = match token.kind {
        TokenKind::Integer(v) => v as f32,
        TokenKind::Float(v) => v,
        _ => return Err(ArbError::syntax("expected a number", token.offset)),
    };
    if !value.is_finite() {
        return Err(ArbError::syntax("constant out of range", token.offset));
    }
    Ok(value)
}

fn check_index(index: u32, limit: u32, what: &str, token: Token) -> PResult<()> {
    if index >= limit {
        return Err(ArbError::syntax(
            format!("{} index {} out of range (max {})", what, index, limit),
            token.offset,
        ));
    }
    Ok(())
}

fn describe(lexer: &Lexer<'_>, token: Token) -> String {
    match token.kind {
        TokenKind::Eof => "end of program".to_string(),
        TokenKind::Newline => "end of line".to_string(),
        _ => format!("'{}'", lexer.text(token)),
    }
}

fn unexpected(lexer: &Lexer<'_>, token: Token, wanted: &str) -> ArbError {
    ArbError::syntax(
        format!("expected {} but found {}", wanted, describe(lexer, token)),
        token.offset,
    )
}

fn expect(lexer: &mut Lexer<'_>, kind: TokenKind, wanted: &str) -> PResult<Token> {
    let token = lexer.advance_significant();
    if token.kind == kind {
        Ok(token)
    } else {
        Err(unexpected(lexer, token, wanted))
    }
}

fn expect_ident<'src>(lexer: &mut Lexer<'src>, wanted: &str) -> PResult<(Token, &'src str)> {
    let token = lexer.advance_significant();
    if token.kind == TokenKind::Identifier {
        Ok((token, lexer.text(token)))
    } else {
        Err(unexpected(lexer, token, wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(kind: ProgramKind, body: &str) -> Parser {
        let mut lexer = Lexer::new(body, 0);
        lexer.advance();
        let mut parser = Parser::new(kind, TranslatorLimits::for_kind(kind));
        while parser.status() == ParseStatus::Running {
            parser.parse_token(&mut lexer);
            lexer.advance();
        }
        parser
    }

    fn parse_ok(kind: ProgramKind, body: &str) -> ProgramModel {
        parse(kind, body).finish().expect("program should parse")
    }

    fn parse_err(kind: ProgramKind, body: &str) -> (String, usize) {
        match parse(kind, body).finish() {
            Err(ArbError::Syntax { message, offset }) => (message, offset),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_program() {
        let model = parse_ok(ProgramKind::Fragment, "END\n");
        assert!(model.variables.is_empty());
        assert!(model.instructions.is_empty());
        assert_eq!(model.special, SpecialCases::default());
    }

    #[test]
    fn test_declarations_in_order() {
        let model = parse_ok(
            ProgramKind::Vertex,
            "TEMP a, b;\nADDRESS a0;\nPARAM c = {1, 2};\nATTRIB p = vertex.position;\nEND",
        );
        let names: Vec<&str> = model.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "a0", "c", "p"]);
        assert_eq!(
            model.variables[3].kind,
            VariableKind::Param(ParamBinding::Constant([1.0, 2.0, 0.0, 1.0]))
        );
        assert_eq!(
            model.variables[4].kind,
            VariableKind::Attrib(InputBinding::VertexPosition)
        );
    }

    #[test]
    fn test_instruction_operands() {
        let model = parse_ok(ProgramKind::Vertex, "TEMP r;\nMAD r.xy, -r.yxzw, {2}.x, r;\nEND");
        let instr = &model.instructions[0];
        assert_eq!(instr.opcode, Opcode::Mad);
        assert_eq!(instr.offset, 8);
        let dst = instr.dst.unwrap();
        assert_eq!(dst.mask, WriteMask::X | WriteMask::Y);
        assert!(instr.srcs[0].negate);
        assert_eq!(
            instr.srcs[0].swizzle,
            Swizzle([Component::Y, Component::X, Component::Z, Component::W])
        );
        assert_eq!(instr.srcs[1].reg, RegRef::Literal([2.0, 0.0, 0.0, 1.0]));
        assert_eq!(instr.srcs[1].swizzle, Swizzle::replicate(Component::X));
    }

    #[test]
    fn test_implicit_bindings_are_deduplicated() {
        let model = parse_ok(
            ProgramKind::Vertex,
            "MOV result.position, vertex.position;\nMOV result.color, vertex.position;\nEND",
        );
        let implicit: Vec<&Variable> = model.variables.iter().filter(|v| v.implicit).collect();
        assert_eq!(implicit.len(), 3);
        assert_eq!(implicit[0].name, "result.position");
        assert_eq!(implicit[1].name, "vertex.position");
    }

    #[test]
    fn test_param_arrays() {
        let model = parse_ok(
            ProgramKind::Vertex,
            "PARAM mvp[4] = { state.matrix.mvp };\nPARAM e[] = { program.env[2..4], 0.5 };\nEND",
        );
        let VariableKind::ParamArray(rows) = &model.variables[0].kind else {
            panic!("expected array");
        };
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows[3],
            ParamBinding::State(StateBinding::MatrixRow {
                matrix: MatrixKind::Mvp,
                modifier: MatrixModifier::Identity,
                row: 3
            })
        );
        let VariableKind::ParamArray(items) = &model.variables[1].kind else {
            panic!("expected array");
        };
        assert_eq!(
            items.as_slice(),
            &[
                ParamBinding::Env(2),
                ParamBinding::Env(3),
                ParamBinding::Env(4),
                ParamBinding::Constant([0.5; 4])
            ]
        );
    }

    #[test]
    fn test_array_size_mismatch() {
        let (message, _) = parse_err(ProgramKind::Vertex, "PARAM m[3] = { state.matrix.mvp };\nEND");
        assert!(message.contains("declares 3 elements"));
    }

    #[test]
    fn test_relative_addressing() {
        let model = parse_ok(
            ProgramKind::Vertex,
            "ADDRESS a0;\nPARAM c[2] = { {1}, {2} };\nTEMP r;\nARL a0.x, r.x;\nMOV r, c[a0.x + 1];\nEND",
        );
        assert_eq!(
            model.instructions[1].srcs[0].reg,
            RegRef::Relative {
                var: 1,
                addr: 0,
                offset: 1
            }
        );
    }

    #[test]
    fn test_options_set_special_cases() {
        let model = parse_ok(ProgramKind::Fragment, "OPTION ARB_fog_exp2;\nEND");
        assert_eq!(model.special.fog_type, FogType::Exp2);

        let model = parse_ok(ProgramKind::Vertex, "OPTION ARB_position_invariant;\nEND");
        assert!(model.special.position_invariant);
    }

    #[test]
    fn test_outputs_set_special_cases() {
        let model = parse_ok(ProgramKind::Vertex, "MOV result.fogcoord, vertex.fogcoord;\nEND");
        assert!(model.special.has_fog_frag_coord);

        let model = parse_ok(ProgramKind::Fragment, "MOV result.depth, fragment.position;\nEND");
        assert!(model.special.is_depth_replacing);
    }

    #[test]
    fn test_conflicting_fog_options() {
        let (message, offset) = parse_err(ProgramKind::Fragment, "OPTION ARB_fog_exp;\nOPTION ARB_fog_linear;\nEND");
        assert_eq!(message, "conflicting fog options");
        assert_eq!(offset, 27);
    }

    #[test]
    fn test_unknown_opcode_offset() {
        let (message, offset) = parse_err(ProgramKind::Fragment, "TEMP r;\n  FOO r, r;\nEND");
        assert!(message.contains("FOO"));
        assert_eq!(offset, 10);
    }

    #[test]
    fn test_wrong_program_opcode() {
        let (message, _) = parse_err(ProgramKind::Vertex, "TEMP r;\nTEX r, r, texture[0], 2D;\nEND");
        assert!(message.contains("unknown instruction `TEX`"));
    }

    #[test]
    fn test_saturate_only_in_fragment() {
        let model = parse_ok(ProgramKind::Fragment, "MOV_SAT result.color, fragment.color;\nEND");
        assert!(model.instructions[0].saturate);
        parse_err(ProgramKind::Vertex, "MOV_SAT result.color, vertex.color;\nEND");
    }

    #[test]
    fn test_redeclaration_and_undeclared() {
        let (message, offset) = parse_err(ProgramKind::Vertex, "TEMP a;\nTEMP a;\nEND");
        assert_eq!(message, "redeclaration of `a`");
        assert_eq!(offset, 13);

        let (message, _) = parse_err(ProgramKind::Vertex, "MOV result.position, nope;\nEND");
        assert_eq!(message, "undeclared identifier `nope`");
    }

    #[test]
    fn test_missing_end() {
        let body = "TEMP a;\n";
        let (message, offset) = parse_err(ProgramKind::Vertex, body);
        assert!(message.contains("missing END"));
        assert_eq!(offset, body.len());
    }

    #[test]
    fn test_sampler_targets() {
        let model = parse_ok(
            ProgramKind::Fragment,
            "TEMP r;\nTEX r, fragment.texcoord[1], texture[1], 2D;\nTXP r, r, texture[3], CUBE;\nEND",
        );
        assert_eq!(model.samplers.get(&1), Some(&TextureTarget::Tex2D));
        assert_eq!(model.samplers.get(&3), Some(&TextureTarget::Cube));

        let (message, _) = parse_err(
            ProgramKind::Fragment,
            "TEMP r;\nTEX r, r, texture[0], 2D;\nTEX r, r, texture[0], 3D;\nEND",
        );
        assert!(message.contains("conflicting targets"));
    }

    #[test]
    fn test_write_to_attribute_rejected() {
        let (message, _) = parse_err(ProgramKind::Vertex, "ATTRIB p = vertex.position;\nMOV p, p;\nEND");
        assert_eq!(message, "`p` is read-only");
    }

    #[test]
    fn test_position_invariant_blocks_position_write() {
        let (message, _) = parse_err(
            ProgramKind::Vertex,
            "OPTION ARB_position_invariant;\nMOV result.position, vertex.position;\nEND",
        );
        assert!(message.contains("position-invariant"));
    }

    #[test]
    fn test_swz_extended_swizzle() {
        let model = parse_ok(ProgramKind::Vertex, "TEMP r;\nSWZ r, r, -y, x, 0, 1;\nEND");
        let ext = model.instructions[0].ext_swizzle.unwrap();
        assert!(ext[0].negate);
        assert_eq!(ext[0].select, ExtSwizzleSelect::Component(Component::Y));
        assert_eq!(ext[2].select, ExtSwizzleSelect::Zero);
        assert_eq!(ext[3].select, ExtSwizzleSelect::One);
    }

    #[test]
    fn test_limits_enforced() {
        let mut limits = TranslatorLimits::vertex();
        limits.max_temporaries = 1;
        let mut lexer = Lexer::new("TEMP a, b;\nEND", 0);
        lexer.advance();
        let mut parser = Parser::new(ProgramKind::Vertex, limits);
        while parser.status() == ParseStatus::Running {
            parser.parse_token(&mut lexer);
            lexer.advance();
        }
        assert_eq!(parser.status(), ParseStatus::Error);
        // Accumulated state survives the error
        assert_eq!(parser.variables().len(), 1);
    }

    #[test]
    fn test_alias() {
        let model = parse_ok(ProgramKind::Vertex, "TEMP a;\nALIAS b = a;\nMOV b, a;\nEND");
        assert_eq!(model.variables.len(), 1);
        assert_eq!(model.instructions[0].dst.unwrap().var, 0);
    }
}
