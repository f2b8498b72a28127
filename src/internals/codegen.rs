// The optional C code-generation path (spec ss4.6). A pure function of
// (dictionary, arena, cached helper XTs): it performs no mutation of the
// VM, matching spec's "this component must be a pure function" contract.
//
// Grounded cell-for-cell on `examples/original_source/engine/tcc.c`'s
// `codegen_word`/`codegen_all` -- the C runtime header, the primitive
// translation table, and the degrade-to-comment fallback are all ported
// directly from there, since neither the teacher nor any other pack repo
// implements a Forth-to-C generator. The embedded-TinyCC half of that
// file (`tcc_compile_and_run`, gated behind `WITH_TCC` even upstream) is
// out of scope: no pack repo links an in-memory C compiler, so this
// engine only ever prints the generated source (spec ss4.6: "When the C
// compiler is absent, the engine may only print the generated source").

use crate::dictionary::Handler;
use crate::kernel::{Vm, CELL_SIZE};

const C_RUNTIME_HEADER: &str = r#"#include <stdint.h>
#include <stdio.h>

typedef int64_t cell_t;
#define STACK_SIZE 256
static cell_t stack[STACK_SIZE];
static cell_t *sp = stack + STACK_SIZE;
static cell_t rstack[STACK_SIZE];
static cell_t *rsp = rstack + STACK_SIZE;

#define TOS (sp[0])
#define NOS (sp[1])
#define PUSH(x) (*--sp = (x))
#define POP() (*sp++)
#define DROP() (sp++)

static void f_dup(void) { cell_t x = TOS; PUSH(x); }
static void f_drop(void) { DROP(); }
static void f_swap(void) { cell_t t = TOS; TOS = NOS; NOS = t; }
static void f_over(void) { PUSH(NOS); }
static void f_rot(void) { cell_t x = sp[2]; sp[2] = sp[1]; sp[1] = TOS; TOS = x; }
static void f_nip(void) { NOS = TOS; DROP(); }
static void f_tuck(void) { cell_t t = TOS; TOS = NOS; NOS = t; PUSH(t); }

static void f_add(void) { NOS += TOS; DROP(); }
static void f_sub(void) { NOS -= TOS; DROP(); }
static void f_mul(void) { NOS *= TOS; DROP(); }
static void f_div(void) { NOS /= TOS; DROP(); }
static void f_mod(void) { NOS %= TOS; DROP(); }
static void f_neg(void) { TOS = -TOS; }
static void f_abs(void) { if (TOS < 0) TOS = -TOS; }

static void f_and(void) { NOS &= TOS; DROP(); }
static void f_or(void) { NOS |= TOS; DROP(); }
static void f_xor(void) { NOS ^= TOS; DROP(); }
static void f_invert(void) { TOS = ~TOS; }
static void f_lshift(void) { NOS <<= TOS; DROP(); }
static void f_rshift(void) { NOS >>= TOS; DROP(); }

static void f_eq(void) { NOS = (NOS == TOS) ? -1 : 0; DROP(); }
static void f_ne(void) { NOS = (NOS != TOS) ? -1 : 0; DROP(); }
static void f_lt(void) { NOS = (NOS < TOS) ? -1 : 0; DROP(); }
static void f_gt(void) { NOS = (NOS > TOS) ? -1 : 0; DROP(); }
static void f_0eq(void) { TOS = (TOS == 0) ? -1 : 0; }
static void f_0lt(void) { TOS = (TOS < 0) ? -1 : 0; }
static void f_0gt(void) { TOS = (TOS > 0) ? -1 : 0; }

static void f_fetch(void) { TOS = *(cell_t*)(intptr_t)TOS; }
static void f_store(void) { *(cell_t*)(intptr_t)TOS = NOS; sp += 2; }
static void f_cfetch(void) { TOS = *(unsigned char*)(intptr_t)TOS; }
static void f_cstore(void) { *(unsigned char*)(intptr_t)TOS = (unsigned char)NOS; sp += 2; }

static void f_tor(void) { *--rsp = POP(); }
static void f_fromr(void) { PUSH(*rsp++); }
static void f_rfetch(void) { PUSH(*rsp); }

static void f_dot(void) { printf("%lld ", (long long)POP()); }
static void f_cr(void) { printf("\n"); }
static void f_emit(void) { putchar((int)POP()); }

"#;

/// Non-identifier characters become `_`, matching `tcc.c`'s sanitizer.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// The primitive-name -> C helper translation table (spec ss4.6 step 3).
/// Anything not listed here degrades to a comment marker.
fn primitive_helper(name: &str) -> Option<&'static str> {
    Some(match name {
        "dup" => "f_dup",
        "drop" => "f_drop",
        "swap" => "f_swap",
        "over" => "f_over",
        "rot" => "f_rot",
        "nip" => "f_nip",
        "tuck" => "f_tuck",
        "+" => "f_add",
        "-" => "f_sub",
        "*" => "f_mul",
        "/" => "f_div",
        "mod" => "f_mod",
        "negate" => "f_neg",
        "abs" => "f_abs",
        "and" => "f_and",
        "or" => "f_or",
        "xor" => "f_xor",
        "invert" => "f_invert",
        "lshift" => "f_lshift",
        "rshift" => "f_rshift",
        "=" => "f_eq",
        "<>" => "f_ne",
        "<" => "f_lt",
        ">" => "f_gt",
        "0=" => "f_0eq",
        "0<" => "f_0lt",
        "0>" => "f_0gt",
        "@" => "f_fetch",
        "!" => "f_store",
        "c@" => "f_cfetch",
        "c!" => "f_cstore",
        ">r" => "f_tor",
        "r>" => "f_fromr",
        "r@" => "f_rfetch",
        "." => "f_dot",
        "cr" => "f_cr",
        "emit" => "f_emit",
        _ => return None,
    })
}

/// Helper XTs that carry a variable-length or fixed inline operand after
/// them in the compiled stream. Every one of these must be recognized so
/// the walker can skip its operand correctly -- an unrecognized XT here
/// would desync the rest of the traversal (reading operand bytes back as
/// if they were XTs), which is a correctness bug `tcc.c`'s C pointer
/// arithmetic papers over but a bounds-checked Rust `Vec` index would
/// turn into a panic.
fn emit_word_body(vm: &Vm, xt: usize, out: &mut String) {
    let entry = vm.dict.entry(xt);
    let c_name = sanitize(&entry.name);
    out.push_str(&format!("static void word_{c_name}(void) {{\n"));

    let h = &vm.helpers;
    let mut ip = entry.param as usize;
    loop {
        let sub_xt = vm.cell_read(ip) as usize;
        ip += CELL_SIZE;

        if sub_xt == h.exit {
            break;
        } else if sub_xt == h.lit {
            let val = vm.cell_read(ip);
            ip += CELL_SIZE;
            out.push_str(&format!("    PUSH({val}LL);\n"));
        } else if sub_xt == h.branch {
            let offset = vm.cell_read(ip);
            ip += CELL_SIZE;
            out.push_str(&format!("    goto L{};\n", offset));
        } else if sub_xt == h.zbranch {
            let offset = vm.cell_read(ip);
            ip += CELL_SIZE;
            out.push_str(&format!("    if (POP() == 0) goto L{};\n", offset));
        } else if sub_xt == h.s_quote {
            let n = vm.cell_read(ip).max(0) as usize;
            let padded = (n + CELL_SIZE - 1) / CELL_SIZE * CELL_SIZE;
            ip += CELL_SIZE + padded;
            out.push_str("    /* string literal omitted from C translation */\n");
        } else if sub_xt == h.qdo || sub_xt == h.loop_ || sub_xt == h.plusloop {
            ip += CELL_SIZE;
            out.push_str(&format!("    /* TODO: {} (loop control) */\n", vm.dict.entry(sub_xt).name));
        } else if sub_xt == h.do_ || sub_xt == h.does {
            out.push_str(&format!("    /* TODO: {} (loop control) */\n", vm.dict.entry(sub_xt).name));
        } else if sub_xt >= vm.dict.len() {
            out.push_str(&format!("    /* TODO: unresolved xt {sub_xt} */\n"));
        } else {
            let sub = vm.dict.entry(sub_xt);
            if let Some(helper) = primitive_helper(&sub.name) {
                out.push_str(&format!("    {helper}();\n"));
            } else if matches!(sub.handler, Handler::Colon) {
                out.push_str(&format!("    word_{}();\n", sanitize(&sub.name)));
            } else {
                out.push_str(&format!("    /* TODO: {} */\n", sub.name));
            }
        }
    }
    out.push_str("}\n\n");
}

/// Walks the finalized dictionary and arena and emits a standalone C
/// translation unit. Reads only; never mutates `vm`.
pub fn generate(vm: &Vm) -> String {
    let mut out = String::new();
    out.push_str(C_RUNTIME_HEADER);

    let colons: Vec<usize> = vm
        .dict
        .iter()
        .filter(|(_, e)| matches!(e.handler, Handler::Colon))
        .map(|(xt, _)| xt)
        .collect();

    for &xt in &colons {
        out.push_str(&format!(
            "static void word_{}(void);\n",
            sanitize(&vm.dict.entry(xt).name)
        ));
    }
    out.push('\n');

    for &xt in &colons {
        emit_word_body(vm, xt, &mut out);
    }

    out.push_str("void forth_main(void) {\n");
    if let Some(&last) = colons.last() {
        out.push_str(&format!("    word_{}();\n", sanitize(&vm.dict.entry(last).name)));
    }
    out.push_str("}\n");
    out
}

/// `emit-c ( -- )`: prints the generated C source for the current
/// dictionary to stdout.
pub fn emit_c(vm: &mut Vm) {
    print!("{}", generate(vm));
}

/// `jit ( -- )`: spec ss4.6's in-memory compile-and-run path. No pack
/// dependency embeds a C compiler, so this always reports unavailability,
/// matching `tcc.c`'s own behavior when built without `WITH_TCC`.
pub fn jit(vm: &mut Vm) {
    vm.msg.warning(
        "jit",
        "JIT not available (no embedded C compiler linked in this build)",
        None::<i64>,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internals::outer::eval_line;

    #[test]
    fn generates_forward_declarations_and_bodies_for_colon_words() {
        let mut vm = Vm::new();
        crate::internals::builtins::register_all(&mut vm);
        eval_line(&mut vm, ": sq dup * ; : cube dup sq * ;");
        assert!(!vm.abort_flag);
        let c = generate(&vm);
        assert!(c.contains("static void word_sq(void);"));
        assert!(c.contains("static void word_cube(void);"));
        assert!(c.contains("word_sq();"));
        assert!(c.contains("void forth_main(void) {\n    word_cube();\n}"));
    }

    #[test]
    fn unknown_primitives_degrade_to_a_comment_marker() {
        let mut vm = Vm::new();
        crate::internals::builtins::register_all(&mut vm);
        eval_line(&mut vm, ": greet s\" hi\" type ;");
        assert!(!vm.abort_flag);
        let c = generate(&vm);
        assert!(c.contains("TODO"));
    }
}
