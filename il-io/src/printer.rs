//! Textual serializer: the structural inverse of [`crate::parser`]. Printing
//! a parsed module and re-parsing the result reproduces the same data model
//! up to block-parameter/temp naming choices already captured in
//! `Function::value_names` (spec.md §4.3.5).

use il::{
    BasicBlock, Extern, Function, Global, GlobalInit, Instruction, Module, Opcode,
    OperandParseKind, Value,
};
use il_support::SourceLoc;

pub fn print_module(module: &Module) -> String {
    let mut out = String::new();
    out.push_str(&format!("il {}\n", module.version));
    if let Some(target) = &module.target {
        out.push_str(&format!("target {target}\n"));
    }
    for e in &module.externs {
        print_extern(&mut out, e);
    }
    for g in &module.globals {
        print_global(&mut out, g);
    }
    for f in &module.functions {
        print_function(&mut out, f);
    }
    out
}

fn print_extern(out: &mut String, e: &Extern) {
    out.push_str("extern @");
    out.push_str(&e.name);
    out.push('(');
    for (i, ty) in e.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(ty.mnemonic());
    }
    out.push_str(") -> ");
    out.push_str(e.ret.mnemonic());
    out.push('\n');
}

/// String-literal globals are always declared `str`; only zero-initialized
/// globals carry an explicit declared type, since a byte blob's shape is
/// otherwise implicit in its contents.
fn global_type(g: &Global) -> &'static str {
    match &g.init {
        GlobalInit::Bytes(_) => "str",
        GlobalInit::ZeroedOfType(ty) => ty.mnemonic(),
    }
}

fn print_global(out: &mut String, g: &Global) {
    out.push_str("global ");
    out.push_str(global_type(g));
    out.push_str(" @");
    out.push_str(&g.name);
    out.push_str(" = ");
    match &g.init {
        GlobalInit::Bytes(bytes) => print_string_literal(out, bytes),
        GlobalInit::ZeroedOfType(_) => out.push_str("zeroinitializer"),
    }
    out.push('\n');
}

fn print_function(out: &mut String, f: &Function) {
    out.push_str("func @");
    out.push_str(&f.name);
    out.push('(');
    for (i, p) in f.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(p.ty.mnemonic());
        out.push_str(" %");
        out.push_str(&p.name);
    }
    out.push_str(") -> ");
    out.push_str(f.ret.mnemonic());
    out.push_str(" {\n");
    for block in &f.blocks {
        print_block(out, f, block);
    }
    out.push_str("}\n");
}

fn print_block(out: &mut String, f: &Function, block: &BasicBlock) {
    out.push_str(&block.label);
    if !block.params.is_empty() {
        out.push('(');
        for (i, p) in block.params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(p.ty.mnemonic());
            out.push_str(" %");
            out.push_str(p.name.as_deref().unwrap_or("_"));
        }
        out.push(')');
    }
    out.push_str(":\n");

    let mut current_loc = SourceLoc::UNKNOWN;
    for instr in &block.instructions {
        if instr.loc != current_loc && !instr.loc.is_unknown() {
            out.push_str(&format!("  .loc {} {} {}\n", instr.loc.file_id, instr.loc.line, instr.loc.column));
            current_loc = instr.loc;
        }
        out.push_str("  ");
        print_instruction(out, f, instr);
        out.push('\n');
    }
}

fn print_instruction(out: &mut String, f: &Function, instr: &Instruction) {
    if let Some(result) = instr.result {
        out.push('%');
        out.push_str(&value_name(f, result));
        out.push_str(" = ");
    }
    out.push_str(instr.op.mnemonic());

    let specs = instr.op.info().parse;
    let mut operand_idx = 0usize;
    let mut label_idx = 0usize;
    let mut printed_any = false;
    let mut prev_was_type_immediate = false;

    for spec in specs.iter() {
        if matches!(spec.kind, OperandParseKind::None) {
            break;
        }
        if instr.op == Opcode::Ret && instr.operands.is_empty() {
            break;
        }
        if !printed_any || prev_was_type_immediate {
            out.push(' ');
        } else {
            out.push_str(", ");
        }

        match spec.kind {
            OperandParseKind::TypeImmediate => {
                out.push_str(instr.ty.mnemonic());
                prev_was_type_immediate = true;
            }
            OperandParseKind::Value => {
                print_value(out, f, &instr.operands[operand_idx]);
                operand_idx += 1;
                prev_was_type_immediate = false;
            }
            OperandParseKind::BranchTarget => {
                print_branch_target(out, f, &instr.labels[label_idx], &instr.br_args[label_idx]);
                label_idx += 1;
                prev_was_type_immediate = false;
            }
            OperandParseKind::Call => {
                print_call(out, f, instr, &mut operand_idx);
                prev_was_type_immediate = false;
            }
            OperandParseKind::Switch => {
                print_switch(out, f, instr, &mut operand_idx, &mut label_idx);
                prev_was_type_immediate = false;
            }
            OperandParseKind::None => unreachable!(),
        }
        printed_any = true;
    }
}

fn print_call(out: &mut String, f: &Function, instr: &Instruction, operand_idx: &mut usize) {
    if let Some(callee) = &instr.callee {
        out.push('@');
        out.push_str(callee);
    } else {
        print_value(out, f, &instr.operands[*operand_idx]);
        *operand_idx += 1;
    }
    out.push('(');
    let mut first = true;
    while *operand_idx < instr.operands.len() {
        if !first {
            out.push_str(", ");
        }
        print_value(out, f, &instr.operands[*operand_idx]);
        *operand_idx += 1;
        first = false;
    }
    out.push(')');
}

fn print_switch(out: &mut String, f: &Function, instr: &Instruction, operand_idx: &mut usize, label_idx: &mut usize) {
    out.push('^');
    out.push_str(&instr.labels[*label_idx]);
    *label_idx += 1;
    while *label_idx < instr.labels.len() {
        out.push_str(", ");
        print_value(out, f, &instr.operands[*operand_idx]);
        *operand_idx += 1;
        out.push_str(" -> ^");
        out.push_str(&instr.labels[*label_idx]);
        *label_idx += 1;
    }
}

fn print_branch_target(out: &mut String, f: &Function, label: &str, args: &[Value]) {
    out.push('^');
    out.push_str(label);
    if !args.is_empty() {
        out.push('(');
        for (i, v) in args.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            print_value(out, f, v);
        }
        out.push(')');
    }
}

fn print_value(out: &mut String, f: &Function, v: &Value) {
    match v {
        Value::Temp(id) => {
            out.push('%');
            out.push_str(&value_name(f, *id));
        }
        Value::ConstInt(i) => out.push_str(&i.to_string()),
        Value::ConstFloat(x) => {
            if x.is_nan() {
                out.push_str(if x.is_sign_negative() { "-nan" } else { "nan" });
            } else if x.is_infinite() {
                out.push_str(if *x < 0.0 { "-inf" } else { "inf" });
            } else {
                out.push_str(&format!("{x}"));
            }
        }
        Value::ConstBool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::ConstStr(bytes) => print_string_literal(out, bytes),
        Value::ConstNull => out.push_str("null"),
        Value::GlobalAddr(name) => {
            out.push('@');
            out.push_str(name);
        }
    }
}

fn value_name(f: &Function, id: u32) -> String {
    f.value_names.get(&id).cloned().unwrap_or_else(|| id.to_string())
}

fn print_string_literal(out: &mut String, bytes: &[u8]) {
    out.push('"');
    let mut i = 0;
    while i < bytes.len() {
        if let Ok(s) = std::str::from_utf8(&bytes[i..]) {
            if let Some(c) = s.chars().next() {
                match c {
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    '\\' => out.push_str("\\\\"),
                    '"' => out.push_str("\\\""),
                    c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
                    c => out.push(c),
                }
                i += c.len_utf8();
                continue;
            }
        }
        out.push_str(&format!("\\x{:02x}", bytes[i]));
        i += 1;
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_module;

    #[test]
    fn round_trips_arithmetic_scenario() {
        let src = "il 0.1\nfunc @main() -> i64 {\nentry:\n  %0 = add i64 40, 2\n  %1 = sub i64 %0, 1\n  ret %1\n}\n";
        let module = parse_module(src, 1).unwrap();
        let printed = print_module(&module);
        let reparsed = parse_module(&printed, 1).unwrap();
        assert_eq!(reparsed.functions[0].blocks[0].instructions.len(), module.functions[0].blocks[0].instructions.len());
    }

    #[test]
    fn round_trips_branch_args_and_block_params() {
        let src = "il 0.1\nfunc @sum(i64 %n) -> i64 {\nentry:\n  br ^loop(%n, 0)\nloop(i64 %i, i64 %acc):\n  %zero = icmp.eq i64 %i, 0\n  cbr %zero, ^done(%acc), ^cont\ncont:\n  %i1 = sub i64 %i, 1\n  %acc1 = add i64 %acc, %i\n  br ^loop(%i1, %acc1)\ndone(i64 %r):\n  ret %r\n}\n";
        let module = parse_module(src, 1).unwrap();
        let printed = print_module(&module);
        let reparsed = parse_module(&printed, 1).expect("printed form parses cleanly");
        assert_eq!(reparsed.functions[0].blocks.len(), 4);
    }

    #[test]
    fn round_trips_switch() {
        let src = "il 0.1\nfunc @f(i32 %x) -> i64 {\nentry:\n  switch.i32 %x, ^def, 1 -> ^one, 2 -> ^two\none:\n  ret 100\ntwo:\n  ret 200\ndef:\n  ret -1\n}\n";
        let module = parse_module(src, 1).unwrap();
        let printed = print_module(&module);
        assert!(printed.contains("switch.i32 %x, ^def, 1 -> ^one, 2 -> ^two"));
    }

    #[test]
    fn round_trips_string_global() {
        let src = "il 0.1\nglobal str @greeting = \"hi\\n\"\nfunc @main() -> i64 {\nentry:\n  ret 0\n}\n";
        let module = parse_module(src, 1).unwrap();
        let printed = print_module(&module);
        assert!(printed.contains("global str @greeting = \"hi\\n\""));
    }
}
