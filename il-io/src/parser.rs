//! Recursive-descent parser for the textual IL format (spec grammar §4.3).
//!
//! Errors are accumulated rather than aborting on the first failure: after a
//! malformed line the parser recovers to the next plausible boundary (the
//! next block label, or the next top-level item) so a single pass can report
//! every diagnostic in a file, matching the batch-reporting contract CLI
//! tools rely on.

use std::collections::HashMap;

use il::{
    BasicBlock, BlockParam, Extern, Function, Global, GlobalInit, Instruction, Module,
    OperandParseKind, Opcode, Param, Type, Value,
};
use il_support::{Diagnostic, Diagnostics, SourceLoc};

use crate::lexer::{LexError, Lexer, Token, TokenKind};

pub fn parse_module(source: &str, file_id: u32) -> Result<Module, Diagnostics> {
    let tokens = match Lexer::new(source).tokenize() {
        Ok(tokens) => tokens,
        Err(e) => {
            let mut diags = Diagnostics::new();
            diags.push(lex_error_to_diagnostic(e, file_id));
            return Err(diags);
        }
    };
    let mut parser = Parser { tokens, pos: 0, file_id, diags: Diagnostics::new() };
    let module = parser.parse_module();
    if parser.diags.has_errors() {
        parser.diags.sort_by_location();
        Err(parser.diags)
    } else {
        Ok(module)
    }
}

fn lex_error_to_diagnostic(e: LexError, file_id: u32) -> Diagnostic {
    Diagnostic::error(e.message, SourceLoc::new(file_id, e.line, e.column)).with_code("io.bad-format")
}

/// Tracks whether a `%name` seen within a function has actually been bound
/// (by a result, a block parameter, or a function parameter) or only used.
struct TempEntry {
    id: u32,
    bound: bool,
    first_use: SourceLoc,
}

/// A branch-argument bundle whose target block might not be defined yet at
/// the point of use; checked against the real parameter count once the
/// whole function has been parsed (spec.md §4.3.4).
struct PendingBranch {
    label: String,
    arg_count: usize,
    loc: SourceLoc,
}

struct FnState {
    temps: HashMap<String, TempEntry>,
    next_id: u32,
    blocks_defined: HashMap<String, usize>,
    pending: Vec<PendingBranch>,
}

impl FnState {
    fn new() -> Self {
        Self { temps: HashMap::new(), next_id: 0, blocks_defined: HashMap::new(), pending: Vec::new() }
    }

    fn resolve(&mut self, name: &str, loc: SourceLoc) -> u32 {
        if let Some(entry) = self.temps.get(name) {
            return entry.id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.temps.insert(name.to_string(), TempEntry { id, bound: false, first_use: loc });
        id
    }

    fn bind(&mut self, name: &str, loc: SourceLoc) -> (u32, Option<Diagnostic>) {
        if let Some(entry) = self.temps.get_mut(name) {
            if entry.bound {
                return (
                    entry.id,
                    Some(Diagnostic::error(format!("duplicate result name '%{name}'"), loc).with_code("io.bad-format")),
                );
            }
            entry.bound = true;
            return (entry.id, None);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.temps.insert(name.to_string(), TempEntry { id, bound: true, first_use: loc });
        (id, None)
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    file_id: u32,
    diags: Diagnostics,
}

impl Parser {
    fn loc(&self) -> SourceLoc {
        let t = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        SourceLoc::new(self.file_id, t.line, t.column)
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.tokens[self.pos.min(self.tokens.len() - 1)].kind.clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        kind
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline) {
            self.advance();
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        self.diags.push(Diagnostic::error(message, self.loc()).with_code("io.bad-format"));
    }

    /// Skips to the next newline (and past it), used to recover after a
    /// malformed line at top level or inside a function body.
    fn recover_to_next_line(&mut self) {
        while !matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Eof) {
            self.advance();
        }
        if matches!(self.peek_kind(), TokenKind::Newline) {
            self.advance();
        }
    }

    fn expect_ident(&mut self, expected: &str) -> bool {
        if let TokenKind::Ident(s) = self.peek_kind() {
            if s == expected {
                self.advance();
                return true;
            }
        }
        self.error(format!("expected '{expected}'"));
        false
    }

    fn expect(&mut self, kind: &TokenKind) -> bool {
        if std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind) {
            self.advance();
            true
        } else {
            self.error(format!("unexpected token, expected {kind:?}"));
            false
        }
    }

    fn parse_module(&mut self) -> Module {
        let mut module = Module::new();
        self.skip_newlines();
        if self.expect_ident("il") {
            module.version = self.parse_version_text();
        }
        self.skip_newlines();

        while !self.at_eof() {
            self.skip_newlines();
            if self.at_eof() {
                break;
            }
            match self.peek_kind().clone() {
                TokenKind::Ident(kw) if kw == "extern" => {
                    if let Some(e) = self.parse_extern() {
                        module.add_extern(e);
                    }
                }
                TokenKind::Ident(kw) if kw == "global" => {
                    if let Some(g) = self.parse_global() {
                        module.add_global(g);
                    }
                }
                TokenKind::Ident(kw) if kw == "func" => {
                    if let Some(f) = self.parse_function() {
                        module.add_function(f);
                    }
                }
                TokenKind::Ident(kw) if kw == "target" => {
                    self.advance();
                    if let TokenKind::Ident(name) = self.peek_kind().clone() {
                        self.advance();
                        module.target = Some(name);
                    }
                    self.recover_to_next_line();
                }
                TokenKind::Eof => break,
                _ => {
                    self.error("expected 'extern', 'global', 'func', or 'target'");
                    self.recover_to_next_line();
                }
            }
        }
        module
    }

    fn parse_version_text(&mut self) -> String {
        match self.advance() {
            TokenKind::FloatLit(v) => format!("{v}"),
            TokenKind::IntLit(v) => format!("{v}"),
            TokenKind::Ident(s) => s,
            _ => {
                self.error("expected version after 'il'");
                "0.1".to_string()
            }
        }
    }

    fn parse_type(&mut self) -> Option<Type> {
        if let TokenKind::Ident(name) = self.peek_kind().clone() {
            self.advance();
            if let Some(ty) = Type::from_mnemonic(&name) {
                return Some(ty);
            }
            self.error(format!("unknown type '{name}'"));
            return None;
        }
        self.error("expected a type");
        None
    }

    fn parse_extern(&mut self) -> Option<Extern> {
        self.advance(); // 'extern'
        if !self.expect(&TokenKind::At(String::new())) {
            self.recover_to_next_line();
            return None;
        }
        let name = match self.tokens[self.pos - 1].kind.clone() {
            TokenKind::At(n) => n,
            _ => unreachable!(),
        };
        self.expect(&TokenKind::LParen);
        let mut params = Vec::new();
        if !matches!(self.peek_kind(), TokenKind::RParen) {
            loop {
                if let Some(ty) = self.parse_type() {
                    params.push(ty);
                }
                if matches!(self.peek_kind(), TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(&TokenKind::RParen);
        self.expect(&TokenKind::Arrow);
        let ret = self.parse_type().unwrap_or(Type::Void);
        self.recover_to_next_line();
        Some(Extern { name, ret, params })
    }

    fn parse_global(&mut self) -> Option<Global> {
        self.advance(); // 'global'
        let ty = self.parse_type()?;
        if !self.expect(&TokenKind::At(String::new())) {
            self.recover_to_next_line();
            return None;
        }
        let name = match self.tokens[self.pos - 1].kind.clone() {
            TokenKind::At(n) => n,
            _ => unreachable!(),
        };
        self.expect(&TokenKind::Eq);
        let init = match self.peek_kind().clone() {
            TokenKind::StrLit(bytes) => {
                self.advance();
                GlobalInit::Bytes(bytes)
            }
            TokenKind::Ident(kw) if kw == "zeroinitializer" => {
                self.advance();
                GlobalInit::ZeroedOfType(ty)
            }
            _ => {
                self.error("expected a string literal or 'zeroinitializer'");
                GlobalInit::ZeroedOfType(ty)
            }
        };
        self.recover_to_next_line();
        Some(Global { name, init })
    }

    fn parse_function(&mut self) -> Option<Function> {
        self.advance(); // 'func'
        if !self.expect(&TokenKind::At(String::new())) {
            self.recover_to_next_line();
            return None;
        }
        let name = match self.tokens[self.pos - 1].kind.clone() {
            TokenKind::At(n) => n,
            _ => unreachable!(),
        };

        let mut state = FnState::new();
        self.expect(&TokenKind::LParen);
        let mut params = Vec::new();
        if !matches!(self.peek_kind(), TokenKind::RParen) {
            loop {
                let ty = self.parse_type().unwrap_or(Type::Void);
                let pname = self.expect_percent_name();
                let loc = self.loc();
                let (id, dup) = state.bind(&pname, loc);
                if let Some(d) = dup {
                    self.diags.push(d);
                }
                params.push(Param { id, name: pname, ty });
                if matches!(self.peek_kind(), TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(&TokenKind::RParen);
        self.expect(&TokenKind::Arrow);
        let ret = self.parse_type().unwrap_or(Type::Void);
        self.skip_newlines();
        self.expect(&TokenKind::LBrace);
        self.skip_newlines();

        let mut func = Function::new(name, ret, params);
        for p in &func.params {
            func.value_names.insert(p.id, p.name.clone());
        }

        while !matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
            self.parse_block(&mut func, &mut state);
            self.skip_newlines();
        }
        self.expect(&TokenKind::RBrace);
        self.skip_newlines();

        for pending in &state.pending {
            match state.blocks_defined.get(&pending.label) {
                None => {
                    self.diags.push(
                        Diagnostic::error(format!("unknown block '{}'", pending.label), pending.loc)
                            .with_code("io.bad-format"),
                    );
                }
                Some(&param_count) => {
                    if param_count != pending.arg_count {
                        self.diags.push(
                            Diagnostic::error(
                                format!(
                                    "branch to '{}' supplies {} argument(s), expected {}",
                                    pending.label, pending.arg_count, param_count
                                ),
                                pending.loc,
                            )
                            .with_code("io.bad-format"),
                        );
                    }
                }
            }
        }
        for (name, entry) in &state.temps {
            if !entry.bound {
                self.diags.push(
                    Diagnostic::error(format!("unknown value '%{name}'"), entry.first_use).with_code("io.bad-format"),
                );
            }
        }

        Some(func)
    }

    fn expect_percent_name(&mut self) -> String {
        if let TokenKind::Percent(name) = self.peek_kind().clone() {
            self.advance();
            name
        } else {
            self.error("expected '%name'");
            String::new()
        }
    }

    /// Heuristic lookahead: a line is a block header iff it is a bare
    /// identifier (optionally followed by a parenthesized parameter list)
    /// terminated by a colon, rather than an instruction.
    fn is_block_header_line(&self) -> bool {
        if !matches!(self.peek_kind(), TokenKind::Ident(_)) {
            return false;
        }
        let mut i = self.pos;
        // skip the label identifier
        i += 1;
        if matches!(self.tokens.get(i).map(|t| &t.kind), Some(TokenKind::LParen)) {
            let mut depth = 1;
            i += 1;
            while depth > 0 {
                match self.tokens.get(i).map(|t| &t.kind) {
                    Some(TokenKind::LParen) => depth += 1,
                    Some(TokenKind::RParen) => depth -= 1,
                    Some(TokenKind::Newline) | Some(TokenKind::Eof) | None => return false,
                    _ => {}
                }
                i += 1;
            }
        }
        matches!(self.tokens.get(i).map(|t| &t.kind), Some(TokenKind::Colon))
    }

    fn parse_block(&mut self, func: &mut Function, state: &mut FnState) {
        if !self.is_block_header_line() {
            self.error("expected a block label");
            self.recover_to_next_line();
            return;
        }
        let label = match self.advance() {
            TokenKind::Ident(s) => s,
            _ => unreachable!(),
        };
        let mut params = Vec::new();
        if matches!(self.peek_kind(), TokenKind::LParen) {
            self.advance();
            if !matches!(self.peek_kind(), TokenKind::RParen) {
                loop {
                    let ty = self.parse_type().unwrap_or(Type::Void);
                    let pname = self.expect_percent_name();
                    let loc = self.loc();
                    let (id, dup) = state.bind(&pname, loc);
                    if let Some(d) = dup {
                        self.diags.push(d);
                    }
                    params.push(BlockParam { id, name: Some(pname), ty });
                    if matches!(self.peek_kind(), TokenKind::Comma) {
                        self.advance();
                        continue;
                    }
                    break;
                }
            }
            self.expect(&TokenKind::RParen);
        }
        self.expect(&TokenKind::Colon);
        self.skip_newlines();

        let is_duplicate = state.blocks_defined.contains_key(&label);
        if is_duplicate {
            self.error(format!("duplicate block label '{label}'"));
        } else {
            state.blocks_defined.insert(label.clone(), params.len());
        }
        for p in &params {
            if let Some(name) = &p.name {
                func.value_names.insert(p.id, name.clone());
            }
        }

        let mut block = BasicBlock::new(label).with_params(params);
        let mut current_loc = SourceLoc::UNKNOWN;

        loop {
            self.skip_newlines();
            if matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
                break;
            }
            if self.is_block_header_line() {
                break;
            }
            if let TokenKind::Ident(kw) = self.peek_kind().clone() {
                if kw == ".loc" {
                    self.advance();
                    let file = self.parse_u32_lit();
                    let line = self.parse_u32_lit();
                    let column = self.parse_u32_lit();
                    current_loc = SourceLoc::new(file, line, column);
                    self.recover_to_next_line();
                    continue;
                }
            }
            if block.terminated {
                self.error("unreachable instruction after block terminator");
                self.recover_to_next_line();
                continue;
            }
            if let Some(instr) = self.parse_instruction(state, current_loc) {
                block.append(instr);
            } else {
                self.recover_to_next_line();
            }
        }

        if !is_duplicate {
            func.add_block(block);
        }
    }

    fn parse_u32_lit(&mut self) -> u32 {
        match self.advance() {
            TokenKind::IntLit(v) => v as u32,
            _ => {
                self.error("expected an integer literal");
                0
            }
        }
    }

    fn parse_instruction(&mut self, state: &mut FnState, loc: SourceLoc) -> Option<Instruction> {
        let mut result_name: Option<String> = None;
        let mut result_ty: Option<Type> = None;
        if matches!(self.peek_kind(), TokenKind::Percent(_)) {
            let name = self.expect_percent_name();
            if matches!(self.peek_kind(), TokenKind::Colon) {
                self.advance();
                result_ty = self.parse_type();
            }
            self.expect(&TokenKind::Eq);
            result_name = Some(name);
        }

        let mnemonic = match self.peek_kind().clone() {
            TokenKind::Ident(s) => s,
            _ => {
                self.error("expected an opcode");
                return None;
            }
        };
        let Some(op) = Opcode::from_mnemonic(&mnemonic) else {
            self.error(format!("unknown opcode '{mnemonic}'"));
            return None;
        };
        self.advance();

        let mut instr = Instruction::new(op, result_ty.unwrap_or(Type::Void)).with_loc(loc);
        let specs = op.info().parse;

        let mut prev_was_type_immediate = false;
        let mut first = true;
        for spec in specs.iter() {
            if matches!(spec.kind, OperandParseKind::None) {
                break;
            }
            if !first && !prev_was_type_immediate {
                if matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Eof) {
                    break;
                }
                self.expect(&TokenKind::Comma);
            }
            // `ret` may legally omit its single optional value.
            if op == Opcode::Ret && matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Eof) {
                break;
            }
            match spec.kind {
                OperandParseKind::TypeImmediate => {
                    if let Some(ty) = self.parse_type() {
                        instr.ty = ty;
                    }
                    prev_was_type_immediate = true;
                }
                OperandParseKind::Value => {
                    if let Some(v) = self.parse_value(state) {
                        instr.operands.push(v);
                    }
                    prev_was_type_immediate = false;
                }
                OperandParseKind::BranchTarget => {
                    self.parse_branch_target(state, &mut instr);
                    prev_was_type_immediate = false;
                }
                OperandParseKind::Call => {
                    self.parse_call(op, &mut instr, state);
                    prev_was_type_immediate = false;
                }
                OperandParseKind::Switch => {
                    self.parse_switch(state, &mut instr);
                    prev_was_type_immediate = false;
                }
                OperandParseKind::None => unreachable!(),
            }
            first = false;
        }

        if let Some(name) = result_name {
            let (id, dup) = state.bind(&name, loc);
            if let Some(d) = dup {
                self.diags.push(d);
            }
            instr.result = Some(id);
        }

        self.recover_to_next_line();
        Some(instr)
    }

    fn parse_value(&mut self, state: &mut FnState) -> Option<Value> {
        let loc = self.loc();
        match self.peek_kind().clone() {
            TokenKind::Percent(name) => {
                self.advance();
                Some(Value::Temp(state.resolve(&name, loc)))
            }
            TokenKind::At(name) => {
                self.advance();
                Some(Value::GlobalAddr(name))
            }
            TokenKind::IntLit(v) => {
                self.advance();
                Some(Value::ConstInt(v))
            }
            TokenKind::FloatLit(v) => {
                self.advance();
                Some(Value::ConstFloat(v))
            }
            TokenKind::StrLit(bytes) => {
                self.advance();
                Some(Value::ConstStr(bytes))
            }
            TokenKind::Ident(word) => {
                self.advance();
                match word.to_ascii_lowercase().as_str() {
                    "true" => Some(Value::ConstBool(true)),
                    "false" => Some(Value::ConstBool(false)),
                    "null" => Some(Value::ConstNull),
                    "nan" => Some(Value::ConstFloat(f64::NAN)),
                    "inf" => Some(Value::ConstFloat(f64::INFINITY)),
                    "-inf" => Some(Value::ConstFloat(f64::NEG_INFINITY)),
                    "-nan" => Some(Value::ConstFloat(-f64::NAN)),
                    _ => {
                        self.error(format!("unexpected identifier '{word}' where a value was expected"));
                        None
                    }
                }
            }
            _ => {
                self.error("expected a value");
                None
            }
        }
    }

    fn parse_branch_target(&mut self, state: &mut FnState, instr: &mut Instruction) {
        let loc = self.loc();
        let label = match self.peek_kind().clone() {
            TokenKind::Caret(name) => {
                self.advance();
                name
            }
            _ => {
                self.error("expected a branch target '^label'");
                return;
            }
        };
        let mut args = Vec::new();
        if matches!(self.peek_kind(), TokenKind::LParen) {
            self.advance();
            if !matches!(self.peek_kind(), TokenKind::RParen) {
                loop {
                    if let Some(v) = self.parse_value(state) {
                        args.push(v);
                    }
                    if matches!(self.peek_kind(), TokenKind::Comma) {
                        self.advance();
                        continue;
                    }
                    break;
                }
            }
            self.expect(&TokenKind::RParen);
        }
        state.pending.push(PendingBranch { label: label.clone(), arg_count: args.len(), loc });
        instr.labels.push(label);
        instr.br_args.push(args);
    }

    fn parse_call(&mut self, op: Opcode, instr: &mut Instruction, state: &mut FnState) {
        if op == Opcode::Call {
            let name = match self.peek_kind().clone() {
                TokenKind::At(name) => {
                    self.advance();
                    name
                }
                _ => {
                    self.error("expected '@callee' after call");
                    return;
                }
            };
            instr.callee = Some(name);
        } else if let Some(callee) = self.parse_value(state) {
            instr.operands.push(callee);
        }
        self.expect(&TokenKind::LParen);
        if !matches!(self.peek_kind(), TokenKind::RParen) {
            loop {
                if let Some(v) = self.parse_value(state) {
                    instr.operands.push(v);
                }
                if matches!(self.peek_kind(), TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(&TokenKind::RParen);
    }

    fn parse_switch(&mut self, state: &mut FnState, instr: &mut Instruction) {
        let default_loc = self.loc();
        let default = match self.peek_kind().clone() {
            TokenKind::Caret(name) => {
                self.advance();
                name
            }
            _ => {
                self.error("expected default branch target '^label'");
                return;
            }
        };
        state.pending.push(PendingBranch { label: default.clone(), arg_count: 0, loc: default_loc });
        instr.labels.push(default);
        instr.br_args.push(Vec::new());

        while matches!(self.peek_kind(), TokenKind::Comma) {
            self.advance();
            if let Some(v) = self.parse_value(state) {
                instr.operands.push(v);
            }
            self.expect(&TokenKind::Arrow);
            let loc = self.loc();
            match self.peek_kind().clone() {
                TokenKind::Caret(name) => {
                    self.advance();
                    state.pending.push(PendingBranch { label: name.clone(), arg_count: 0, loc });
                    instr.labels.push(name);
                    instr.br_args.push(Vec::new());
                }
                _ => {
                    self.error("expected case branch target '^label'");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scenario_1_arithmetic() {
        let src = "il 0.1\nfunc @main() -> i64 {\nentry:\n  %0 = add i64 40, 2\n  %1 = sub i64 %0, 1\n  ret %1\n}\n";
        let module = parse_module(src, 1).expect("parses cleanly");
        let f = module.find_function("main").unwrap();
        assert_eq!(f.blocks.len(), 1);
        assert_eq!(f.blocks[0].instructions.len(), 3);
    }

    #[test]
    fn parses_branch_args_and_block_params() {
        let src = "il 0.1\nfunc @sum(i64 %n) -> i64 {\nentry:\n  br ^loop(%n, 0)\nloop(i64 %i, i64 %acc):\n  %zero = icmp.eq i64 %i, 0\n  cbr %zero, ^done(%acc), ^cont\ncont:\n  %i1 = sub i64 %i, 1\n  %acc1 = add i64 %acc, %i\n  br ^loop(%i1, %acc1)\ndone(i64 %r):\n  ret %r\n}\n";
        let module = parse_module(src, 1).expect("parses cleanly");
        let f = module.find_function("sum").unwrap();
        assert_eq!(f.blocks.len(), 4);
        assert_eq!(f.find_block("loop").unwrap().params.len(), 2);
    }

    #[test]
    fn rejects_mismatched_branch_arg_count() {
        let src = "il 0.1\nfunc @f() -> i64 {\nentry:\n  br ^loop(1)\nloop(i64 %a, i64 %b):\n  ret %a\n}\n";
        let err = parse_module(src, 1).unwrap_err();
        assert!(err.iter().any(|d| d.message.contains("expected 2")));
    }

    #[test]
    fn rejects_unknown_block() {
        let src = "il 0.1\nfunc @f() -> i64 {\nentry:\n  br ^nope\n}\n";
        let err = parse_module(src, 1).unwrap_err();
        assert!(err.iter().any(|d| d.message.contains("unknown block 'nope'")));
    }

    #[test]
    fn parses_switch_with_default() {
        let src = "il 0.1\nfunc @f(i32 %x) -> i64 {\nentry:\n  switch.i32 %x, ^def, 1 -> ^one, 2 -> ^two\none:\n  ret 100\ntwo:\n  ret 200\ndef:\n  ret -1\n}\n";
        let module = parse_module(src, 1).expect("parses cleanly");
        let f = module.find_function("f").unwrap();
        let switch = &f.blocks[0].instructions[0];
        assert_eq!(switch.labels, vec!["def", "one", "two"]);
    }

    #[test]
    fn parses_eh_scenario() {
        let src = "il 0.1\nfunc @main() -> i64 {\nentry:\n  eh.push ^handler\n  %a = sdiv.chk0 i64 10, 0\n  eh.pop\n  ret 0\nhandler:\n  %tok = eh.entry\n  resume.next\n}\n";
        let module = parse_module(src, 1).expect("parses cleanly");
        assert_eq!(module.find_function("main").unwrap().blocks.len(), 2);
    }
}
