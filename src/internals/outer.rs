// The outer interpreter: tokenizes a line, looks each word up, and
// either executes it, compiles it, or falls back to parsing it as a
// number. This is the per-token policy of spec ss4.2.

use crate::error::VmError;
use crate::kernel::Vm;

/// Pulls one whitespace-delimited token starting at `vm.tib_in`,
/// advancing it past the token. `None` at end of line.
pub fn next_token(vm: &mut Vm) -> Option<String> {
    let bytes = vm.tib.as_bytes();
    let mut i = vm.tib_in;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if i >= bytes.len() {
        vm.tib_in = i;
        return None;
    }
    let start = i;
    while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    let tok = vm.tib[start..i].to_owned();
    vm.tib_in = i;
    Some(tok)
}

/// Parses `token` as a number in `vm`'s current base, honoring the
/// prefixes `$`/`#`/`%`/`0x`/`0X` and an optional leading `-`.
pub fn parse_number(vm: &Vm, token: &str) -> Option<i64> {
    let (neg, rest) = match token.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, token),
    };
    if rest.is_empty() {
        return None;
    }
    let (radix, digits): (u32, &str) = if let Some(d) = rest.strip_prefix('$') {
        (16, d)
    } else if let Some(d) = rest.strip_prefix('#') {
        (10, d)
    } else if let Some(d) = rest.strip_prefix('%') {
        (2, d)
    } else if let Some(d) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        (16, d)
    } else {
        (vm.base().clamp(2, 36) as u32, rest)
    };
    if digits.is_empty() {
        return None;
    }
    i64::from_str_radix(digits, radix)
        .ok()
        .map(|v| if neg { -v } else { v })
}

/// Steps 1-5 of spec ss4.2 for a single token.
pub fn interpret_token(vm: &mut Vm, token: &str) {
    if let Some(xt) = vm.dict.find(token) {
        let immediate = vm.dict.entry(xt).immediate;
        if !vm.compiling() || immediate {
            super::inner::execute(vm, xt);
        } else {
            vm.comma(xt as i64);
        }
        return;
    }
    if let Some(n) = parse_number(vm, token) {
        if vm.compiling() {
            let lit_xt = vm.helpers.lit as i64;
            vm.comma(lit_xt);
            vm.comma(n);
        } else if let Err(e) = vm.push(n) {
            vm.report(e);
        }
        return;
    }
    vm.report(VmError::UndefinedWord {
        word: token.to_owned(),
    });
}

/// `s>number? ( addr u -- n flag )`: spec ss4.5 parsing helper -- attempts
/// a full numeric parse of the given span using the same rules as the
/// outer interpreter's own number parsing, reporting success as a flag.
pub fn s_number_q(vm: &mut Vm) {
    let len = pop!(vm, "s>number?") as usize;
    let addr = pop!(vm, "s>number?") as usize;
    let text = String::from_utf8_lossy(&vm.arena[addr..addr + len]).into_owned();
    match parse_number(vm, &text) {
        Some(n) => {
            push!(vm, n);
            push!(vm, crate::kernel::TRUE);
        }
        None => {
            push!(vm, 0);
            push!(vm, crate::kernel::FALSE);
        }
    }
}

/// `>number ( ud addr1 u1 -- ud2 addr2 u2 )`: accumulates as many leading
/// digits (in the current base) from the span as possible into `ud`,
/// returning the updated accumulator and the unconverted remainder. Our
/// cells are single-width, so `ud` is the plain single-cell accumulator
/// rather than a double-cell pair (spec ss9: no double-cell arithmetic
/// anywhere else in this engine either).
pub fn to_number(vm: &mut Vm) {
    let u1 = pop!(vm, ">number") as usize;
    let addr1 = pop!(vm, ">number") as usize;
    let mut acc = pop!(vm, ">number");
    let base = vm.base().clamp(2, 36) as u32;
    let mut consumed = 0usize;
    for &b in &vm.arena[addr1..addr1 + u1] {
        match (b as char).to_digit(base) {
            Some(d) => {
                acc = acc.wrapping_mul(base as i64).wrapping_add(d as i64);
                consumed += 1;
            }
            None => break,
        }
    }
    push!(vm, acc);
    push!(vm, (addr1 + consumed) as i64);
    push!(vm, (u1 - consumed) as i64);
}

/// Loads `line` into the text input buffer and interprets it token by
/// token, stopping early on abort or an explicit `bye`. Clears any abort
/// left over from a previous line first -- `Vm::abort` only needs the
/// flag to unwind the call it fired in, and the outer loop (REPL, file
/// inclusion, `-e`) is expected to keep going with the next line.
pub fn eval_line(vm: &mut Vm, line: &str) {
    vm.tib = line.to_owned();
    vm.tib_in = 0;
    vm.abort_flag = false;
    while !vm.abort_flag && !vm.should_exit {
        match next_token(vm) {
            Some(tok) => interpret_token(vm, &tok),
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizer_splits_on_whitespace() {
        let mut vm = Vm::new();
        vm.tib = "  1   2 +  ".to_owned();
        vm.tib_in = 0;
        assert_eq!(next_token(&mut vm).as_deref(), Some("1"));
        assert_eq!(next_token(&mut vm).as_deref(), Some("2"));
        assert_eq!(next_token(&mut vm).as_deref(), Some("+"));
        assert_eq!(next_token(&mut vm), None);
    }

    #[test]
    fn parse_number_honors_prefixes_and_sign() {
        let vm = Vm::new();
        assert_eq!(parse_number(&vm, "42"), Some(42));
        assert_eq!(parse_number(&vm, "-42"), Some(-42));
        assert_eq!(parse_number(&vm, "$ff"), Some(255));
        assert_eq!(parse_number(&vm, "0xff"), Some(255));
        assert_eq!(parse_number(&vm, "%101"), Some(5));
        assert_eq!(parse_number(&vm, "#10"), Some(10));
        assert_eq!(parse_number(&vm, "abc"), None);
    }

    #[test]
    fn eval_line_runs_arithmetic() {
        let mut vm = Vm::new();
        eval_line(&mut vm, "1 2 3 + *");
        assert_eq!(vm.pop().unwrap(), 9);
    }

    #[test]
    fn to_number_accumulates_leading_digits_and_stops_at_first_non_digit() {
        let mut vm = Vm::new();
        let addr = vm.here;
        for (i, b) in b"123x".iter().enumerate() {
            vm.arena[addr + i] = *b;
        }
        vm.push(0).unwrap();
        vm.push(addr as i64).unwrap();
        vm.push(4).unwrap();
        to_number(&mut vm);
        let rem_u = vm.pop().unwrap();
        let rem_addr = vm.pop().unwrap();
        let acc = vm.pop().unwrap();
        assert_eq!(acc, 123);
        assert_eq!(rem_addr, addr as i64 + 3);
        assert_eq!(rem_u, 1);
    }

    #[test]
    fn s_number_q_reports_failure_for_non_numeric_text() {
        let mut vm = Vm::new();
        let addr = vm.here;
        for (i, b) in b"xyz".iter().enumerate() {
            vm.arena[addr + i] = *b;
        }
        vm.push(addr as i64).unwrap();
        vm.push(3).unwrap();
        s_number_q(&mut vm);
        assert_eq!(vm.pop().unwrap(), crate::kernel::FALSE);
    }
}
