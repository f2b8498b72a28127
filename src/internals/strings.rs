// String literals and related parsing words (spec ss4.5). `s"`/`s\"` and
// `."`/`.("`/`abort"` all share the same delimited-parse shape: consume a
// leading space, then scan to a closing delimiter with optional escape
// processing.

use crate::error::VmError;
use crate::kernel::Vm;

fn skip_one_space(vm: &mut Vm) {
    if vm.tib_in < vm.tib.len() && vm.tib.as_bytes()[vm.tib_in] == b' ' {
        vm.tib_in += 1;
    }
}

/// Escape table from spec ss4.5: `n r t " \ 0 a b e`; anything else
/// passes through literally.
fn map_escape(c: char) -> char {
    match c {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        '"' => '"',
        '\\' => '\\',
        '0' => '\0',
        'a' => '\u{07}',
        'b' => '\u{08}',
        'e' => '\u{1b}',
        other => other,
    }
}

fn parse_delimited(vm: &mut Vm, delim: u8, escapes: bool) -> String {
    let bytes = vm.tib.as_bytes();
    let mut i = vm.tib_in;
    let mut out = String::new();
    while i < bytes.len() {
        let b = bytes[i];
        if b == delim {
            i += 1;
            break;
        }
        if escapes && b == b'\\' && i + 1 < bytes.len() {
            i += 1;
            out.push(map_escape(bytes[i] as char));
            i += 1;
        } else {
            out.push(b as char);
            i += 1;
        }
    }
    vm.tib_in = i;
    out
}

/// Compiles (or, interpretively, stages) a parsed string so later code
/// can push `(addr, len)`. In compile state this emits `(s")`, the
/// length, and the cell-aligned bytes; in interpret state it copies the
/// bytes into the pad and pushes the address pair directly.
fn emit_string(vm: &mut Vm, s: &str) {
    if vm.compiling() {
        let xt = vm.helpers.s_quote as i64;
        vm.comma(xt);
        vm.comma(s.len() as i64);
        for b in s.bytes() {
            vm.c_comma(b);
        }
        vm.align();
    } else {
        let addr = vm.pad_start;
        for (i, b) in s.bytes().enumerate() {
            vm.arena[addr + i] = b;
        }
        push!(vm, addr as i64);
        push!(vm, s.len() as i64);
    }
}

pub fn s_quote(vm: &mut Vm) {
    skip_one_space(vm);
    let s = parse_delimited(vm, b'"', false);
    emit_string(vm, &s);
}

pub fn s_backslash_quote(vm: &mut Vm) {
    skip_one_space(vm);
    let s = parse_delimited(vm, b'"', true);
    emit_string(vm, &s);
}

pub fn dot_quote(vm: &mut Vm) {
    skip_one_space(vm);
    let s = parse_delimited(vm, b'"', false);
    if vm.compiling() {
        let xt = vm.helpers.s_quote as i64;
        vm.comma(xt);
        vm.comma(s.len() as i64);
        for b in s.bytes() {
            vm.c_comma(b);
        }
        vm.align();
        match vm.dict.find("type") {
            Some(type_xt) => vm.comma(type_xt as i64),
            None => vm.report(VmError::Other("\".: type is not yet defined".to_owned())),
        }
    } else {
        print!("{s}");
    }
}

pub fn dot_paren(vm: &mut Vm) {
    let s = parse_delimited(vm, b')', false);
    print!("{s}");
}

/// `abort"` compiles a conditional abort: pop the flag at runtime, and
/// if nonzero, print the inline message and abort.
pub fn abort_quote(vm: &mut Vm) {
    skip_one_space(vm);
    let s = parse_delimited(vm, b'"', false);
    if vm.compiling() {
        let zbranch_xt = vm.helpers.zbranch as i64;
        vm.comma(zbranch_xt);
        let patch_at = vm.here;
        vm.comma(0);
        let s_quote_xt = vm.helpers.s_quote as i64;
        vm.comma(s_quote_xt);
        vm.comma(s.len() as i64);
        for b in s.bytes() {
            vm.c_comma(b);
        }
        vm.align();
        match vm.dict.find("(abort-msg)") {
            Some(xt) => vm.comma(xt as i64),
            None => vm.report(VmError::Other("abort\": (abort-msg) missing".to_owned())),
        }
        let here = vm.here as i64;
        vm.cell_write(patch_at, here);
    } else {
        let flag = pop!(vm, "abort\"");
        if flag != 0 {
            vm.report(VmError::Other(s));
        }
    }
}

/// `(abort-msg)`: runtime companion of `abort"`, consumes the `(addr,
/// len)` pair `(s")` just pushed and aborts with it as the message.
pub fn abort_msg_runtime(vm: &mut Vm) {
    let len = pop!(vm, "(abort-msg)") as usize;
    let addr = pop!(vm, "(abort-msg)") as usize;
    let msg = String::from_utf8_lossy(&vm.arena[addr..addr + len]).into_owned();
    vm.report(VmError::Other(msg));
}

/// `char`: parses the next name and pushes its first byte.
pub fn char_word(vm: &mut Vm) {
    let tok = super::outer::next_token(vm);
    let val = tok.as_deref().and_then(|t| t.bytes().next()).unwrap_or(0) as i64;
    push!(vm, val);
}

/// `[char]`: like `char`, but compiles the value as a literal.
pub fn bracket_char(vm: &mut Vm) {
    let tok = super::outer::next_token(vm);
    let val = tok.as_deref().and_then(|t| t.bytes().next()).unwrap_or(0) as i64;
    if vm.compiling() {
        let lit_xt = vm.helpers.lit as i64;
        vm.comma(lit_xt);
        vm.comma(val);
    } else {
        push!(vm, val);
    }
}

/// `parse-name ( "name" -- c-addr u )`: parses the next whitespace
/// delimited token and stages it in the pad.
pub fn parse_name(vm: &mut Vm) {
    let bytes = vm.tib.as_bytes();
    let mut i = vm.tib_in;
    while i < bytes.len() && bytes[i] == b' ' {
        i += 1;
    }
    let start = i;
    while i < bytes.len() && bytes[i] != b' ' {
        i += 1;
    }
    let tok = vm.tib[start..i].to_owned();
    vm.tib_in = i;
    let addr = vm.pad_start;
    for (k, b) in tok.bytes().enumerate() {
        vm.arena[addr + k] = b;
    }
    push!(vm, addr as i64);
    push!(vm, tok.len() as i64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s_backslash_quote_processes_escapes() {
        let mut vm = Vm::new();
        vm.tib = "s\\\" a\\nb\" type".to_owned();
        vm.tib_in = 3; // position right after `s\"` as the tokenizer would leave it
        s_backslash_quote(&mut vm);
        let len = vm.pop().unwrap() as usize;
        let addr = vm.pop().unwrap() as usize;
        let got = String::from_utf8_lossy(&vm.arena[addr..addr + len]).into_owned();
        assert_eq!(got, "a\nb");
    }

    #[test]
    fn parse_name_reads_one_token() {
        let mut vm = Vm::new();
        vm.tib = "  hello world".to_owned();
        vm.tib_in = 0;
        parse_name(&mut vm);
        let len = vm.pop().unwrap() as usize;
        let addr = vm.pop().unwrap() as usize;
        assert_eq!(&vm.arena[addr..addr + len], b"hello");
    }
}
