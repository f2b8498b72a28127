// The single registration list: wires every primitive group into a fresh
// dictionary, in the teacher's `add_builtins` style (a flat sequence of
// `vm.add_primitive(name, fn, doc)` calls, grouped by module with a
// comment banner per group). Called once from `Vm::new()`.
//
// The nine runtime-helper primitives (spec ss4.1) go first so their XTs
// land as the lowest dictionary indices and get cached onto `vm.helpers`
// immediately, exactly as `internals::inner`'s doc comment requires.

use super::{
    arithmetic, comparison, compiler, concurrency, console, inner, logic, memory, numeric_output,
    outer, stack_ops, strings, system,
};
use crate::kernel::{HelperXts, Vm};

pub fn register_all(vm: &mut Vm) {
    register_helpers(vm);

    // ----- arithmetic -----
    vm.add_primitive("+", arithmetic::add, "( n1 n2 -- n3 )");
    vm.add_primitive("-", arithmetic::sub, "( n1 n2 -- n3 )");
    vm.add_primitive("*", arithmetic::mul, "( n1 n2 -- n3 )");
    vm.add_primitive("/", arithmetic::div, "( n1 n2 -- n3 )");
    vm.add_primitive("mod", arithmetic::modulo, "( n1 n2 -- n3 )");
    vm.add_primitive("/mod", arithmetic::slash_mod, "( n1 n2 -- rem quot )");
    vm.add_primitive("negate", arithmetic::negate, "( n -- -n )");
    vm.add_primitive("abs", arithmetic::abs, "( n -- u )");
    vm.add_primitive("min", arithmetic::min, "( n1 n2 -- n3 )");
    vm.add_primitive("max", arithmetic::max, "( n1 n2 -- n3 )");
    vm.add_primitive("1+", arithmetic::one_plus, "( n -- n+1 )");
    vm.add_primitive("1-", arithmetic::one_minus, "( n -- n-1 )");
    vm.add_primitive("*/", arithmetic::star_slash, "( n1 n2 n3 -- n4 )");

    // ----- stack -----
    vm.add_primitive("dup", stack_ops::dup, "( a -- a a )");
    vm.add_primitive("drop", stack_ops::drop_, "( a -- )");
    vm.add_primitive("swap", stack_ops::swap, "( a b -- b a )");
    vm.add_primitive("over", stack_ops::over, "( a b -- a b a )");
    vm.add_primitive("rot", stack_ops::rot, "( a b c -- b c a )");
    vm.add_primitive("-rot", stack_ops::minus_rot, "( a b c -- c a b )");
    vm.add_primitive("nip", stack_ops::nip, "( a b -- b )");
    vm.add_primitive("tuck", stack_ops::tuck, "( a b -- b a b )");
    vm.add_primitive("?dup", stack_ops::qdup, "( a -- a a | 0 )");
    vm.add_primitive("2dup", stack_ops::two_dup, "( a b -- a b a b )");
    vm.add_primitive("2drop", stack_ops::two_drop, "( a b -- )");
    vm.add_primitive("2swap", stack_ops::two_swap, "( a b c d -- c d a b )");
    vm.add_primitive("2over", stack_ops::two_over, "( a b c d -- a b c d a b )");
    vm.add_primitive(">r", stack_ops::to_r, "( a -- ) ( r: -- a )");
    vm.add_primitive("r>", stack_ops::r_from, "( -- a ) ( r: a -- )");
    vm.add_primitive("r@", stack_ops::r_fetch, "( -- a ) ( r: a -- a )");
    vm.add_primitive("2>r", stack_ops::two_to_r, "( a b -- ) ( r: -- a b )");
    vm.add_primitive("2r>", stack_ops::two_r_from, "( -- a b ) ( r: a b -- )");
    vm.add_primitive("2r@", stack_ops::two_r_fetch, "( -- a b ) ( r: a b -- a b )");
    vm.add_primitive("depth", stack_ops::depth, "( -- n )");
    vm.add_primitive("pick", stack_ops::pick, "( xu ... x0 u -- xu ... x0 xu )");

    // ----- comparison -----
    vm.add_primitive("=", comparison::eq, "( a b -- flag )");
    vm.add_primitive("<>", comparison::ne, "( a b -- flag )");
    vm.add_primitive("<", comparison::lt, "( a b -- flag )");
    vm.add_primitive(">", comparison::gt, "( a b -- flag )");
    vm.add_primitive("u<", comparison::u_lt, "( u1 u2 -- flag )");
    vm.add_primitive("0=", comparison::zero_eq, "( n -- flag )");
    vm.add_primitive("0<", comparison::zero_lt, "( n -- flag )");
    vm.add_primitive("0>", comparison::zero_gt, "( n -- flag )");

    // ----- logic -----
    vm.add_primitive("and", logic::and, "( a b -- c )");
    vm.add_primitive("or", logic::or, "( a b -- c )");
    vm.add_primitive("xor", logic::xor, "( a b -- c )");
    vm.add_primitive("invert", logic::invert, "( a -- ~a )");
    vm.add_primitive("lshift", logic::lshift, "( a n -- a<<n )");
    vm.add_primitive("rshift", logic::rshift, "( a n -- a>>n )");

    // ----- memory -----
    vm.add_primitive("@", memory::fetch, "( addr -- n )");
    vm.add_primitive("!", memory::store, "( n addr -- )");
    vm.add_primitive("c@", memory::c_fetch, "( addr -- c )");
    vm.add_primitive("c!", memory::c_store, "( c addr -- )");
    vm.add_primitive("+!", memory::plus_store, "( n addr -- )");
    vm.add_primitive("here", memory::here, "( -- addr )");
    vm.add_primitive("allot", memory::allot, "( n -- )");
    vm.add_primitive("cells", memory::cells, "( n -- n*cell )");
    vm.add_primitive("cell+", memory::cell_plus, "( addr -- addr+cell )");
    vm.add_primitive(",", memory::comma, "( n -- )");
    vm.add_primitive("c,", memory::c_comma, "( c -- )");
    vm.add_primitive("move", memory::move_, "( src dst n -- )");
    vm.add_primitive("fill", memory::fill, "( addr n c -- )");
    vm.add_primitive("/string", memory::slash_string, "( addr u n -- addr2 u2 )");
    vm.add_primitive("count", memory::count, "( c-addr -- addr u )");

    // ----- compiler / meta -----
    vm.add_primitive(":", compiler::colon, "( \"name\" -- )");
    let xt = vm.add_primitive(";", compiler::semicolon, "( -- )");
    vm.make_immediate(xt);
    vm.add_primitive("immediate", compiler::immediate, "( -- )");
    let xt = vm.add_primitive("[", compiler::left_bracket, "( -- )");
    vm.make_immediate(xt);
    vm.add_primitive("]", compiler::right_bracket, "( -- )");
    vm.add_primitive("state", compiler::state, "( -- addr )");
    vm.add_primitive("'", compiler::tick, "( \"name\" -- xt )");
    let xt = vm.add_primitive("[']", compiler::bracket_tick, "( \"name\" -- )");
    vm.make_immediate(xt);
    vm.add_primitive("execute", compiler::execute, "( xt -- )");
    vm.add_primitive(">body", compiler::to_body, "( xt -- addr )");
    vm.add_primitive("create", compiler::create, "( \"name\" -- )");
    vm.add_primitive("find", compiler::find, "( addr u -- xt 1 | xt -1 | addr u 0 )");
    let xt = vm.add_primitive("literal", compiler::literal, "( n -- )");
    vm.make_immediate(xt);
    vm.add_primitive("compile,", compiler::compile_comma, "( xt -- )");
    let xt = vm.add_primitive("postpone", compiler::postpone, "( \"name\" -- )");
    vm.make_immediate(xt);
    let xt = vm.add_primitive("does>", compiler::does_compile, "( -- )");
    vm.make_immediate(xt);
    let xt = vm.add_primitive("recurse", compiler::recurse, "( -- )");
    vm.make_immediate(xt);
    let xt = vm.add_primitive("exit", compiler::user_exit, "( -- )");
    vm.make_immediate(xt);

    // ----- control flow (all IMMEDIATE) -----
    for (name, f) in [
        ("if", compiler::if_ as fn(&mut Vm)),
        ("else", compiler::else_),
        ("then", compiler::then_),
        ("begin", compiler::begin_),
        ("while", compiler::while_),
        ("repeat", compiler::repeat_),
        ("until", compiler::until_),
        ("again", compiler::again_),
        ("do", compiler::do_),
        ("?do", compiler::qdo_),
        ("loop", compiler::loop_),
        ("+loop", compiler::plusloop_),
        ("case", compiler::case_),
        ("of", compiler::of_),
        ("endof", compiler::endof_),
        ("endcase", compiler::endcase_),
    ] {
        let xt = vm.add_primitive(name, f, "( -- ) IMMEDIATE");
        vm.make_immediate(xt);
    }
    vm.add_primitive("i", compiler::i_word, "( -- n ) ( r: ... -- ... )");
    vm.add_primitive("j", compiler::j_word, "( -- n ) ( r: ... -- ... )");
    vm.add_primitive("unloop", compiler::unloop, "( -- ) ( r: ... -- )");

    // ----- strings -----
    // s"/s\"/."/.(/abort" all parse trailing source text at the point
    // they're encountered, whether interpreting or compiling, so they
    // must run immediately rather than being compiled as ordinary calls.
    for (name, f) in [
        ("s\"", strings::s_quote as fn(&mut Vm)),
        ("s\\\"", strings::s_backslash_quote),
        (".\"", strings::dot_quote),
        (".(", strings::dot_paren),
        ("abort\"", strings::abort_quote),
    ] {
        let xt = vm.add_primitive(name, f, "( \"ccc<quote>\" -- )");
        vm.make_immediate(xt);
    }
    vm.add_primitive("(abort-msg)", strings::abort_msg_runtime, "( addr u -- )");
    vm.add_primitive("char", strings::char_word, "( \"name\" -- c )");
    let xt = vm.add_primitive("[char]", strings::bracket_char, "( \"name\" -- )");
    vm.make_immediate(xt);
    vm.add_primitive("parse-name", strings::parse_name, "( \"name\" -- addr u )");

    // ----- numeric output -----
    vm.add_primitive(".", numeric_output::dot, "( n -- )");
    vm.add_primitive("u.", numeric_output::u_dot, "( u -- )");
    vm.add_primitive(".s", numeric_output::dot_s, "( -- )");
    vm.add_primitive("<#", numeric_output::less_number_sign, "( -- )");
    vm.add_primitive("#", numeric_output::number_sign, "( ud -- ud )");
    vm.add_primitive("#s", numeric_output::number_sign_s, "( ud -- 0 )");
    vm.add_primitive("hold", numeric_output::hold, "( c -- )");
    vm.add_primitive("sign", numeric_output::sign, "( n -- )");
    vm.add_primitive("#>", numeric_output::number_sign_greater, "( ud -- addr u )");

    // ----- parsing helpers -----
    vm.add_primitive("s>number?", outer::s_number_q, "( addr u -- n flag )");
    vm.add_primitive(">number", outer::to_number, "( ud addr1 u1 -- ud2 addr2 u2 )");

    // ----- I/O -----
    vm.add_primitive("emit", console::emit, "( c -- )");
    vm.add_primitive("type", console::type_, "( addr u -- )");
    vm.add_primitive("cr", console::cr, "( -- )");
    vm.add_primitive("key", console::key, "( -- c )");
    vm.add_primitive("accept", console::accept, "( addr u -- u2 )");
    vm.add_primitive("open-file", console::open_file, "( addr u fam -- file-id ior )");
    vm.add_primitive("create-file", console::create_file, "( addr u fam -- file-id ior )");
    vm.add_primitive("close-file", console::close_file, "( file-id -- ior )");
    vm.add_primitive("write-file", console::write_file, "( addr u file-id -- ior )");
    vm.add_primitive("read-line", console::read_line, "( addr u1 file-id -- u2 flag ior )");
    vm.add_primitive("emit-file", console::emit_file, "( c file-id -- ior )");
    vm.add_primitive("flush-file", console::flush_file, "( file-id -- ior )");
    vm.add_primitive("r/o", console::r_o, "( -- fam )");
    vm.add_primitive("w/o", console::w_o, "( -- fam )");
    vm.add_primitive("r/w", console::r_w, "( -- fam )");
    vm.add_primitive("throw", console::throw, "( n -- )");
    vm.add_primitive("stdout", console::stdout_, "( -- file-id )");
    vm.add_primitive("slurp-file", console::slurp_file, "( addr u -- addr2 u2 )");

    // ----- system -----
    vm.add_primitive("system", system::system, "( addr u -- )");
    vm.add_primitive("bye", system::bye, "( n -- )");
    vm.add_primitive("getenv", system::getenv, "( addr u -- addr2 u2 )");
    vm.add_primitive("include", system::include, "( \"name\" -- )");
    vm.add_primitive("require", system::require, "( \"name\" -- )");
    vm.add_primitive("included", system::included, "( addr u -- )");
    vm.add_primitive("base", system::base, "( -- addr )");
    vm.add_primitive("decimal", system::decimal, "( -- )");
    vm.add_primitive("hex", system::hex, "( -- )");
    let xt = vm.add_primitive("\\", system::backslash_comment, "( -- ) IMMEDIATE");
    vm.make_immediate(xt);
    let xt = vm.add_primitive("(", system::paren_comment, "( -- ) IMMEDIATE");
    vm.make_immediate(xt);
    vm.add_primitive("true", system::true_, "( -- -1 )");
    vm.add_primitive("false", system::false_, "( -- 0 )");
    vm.add_primitive("bl", system::bl, "( -- 32 )");
    vm.add_primitive("cell", system::cell, "( -- 8 )");

    // ----- concurrency -----
    vm.add_primitive("spawn", concurrency::spawn, "( xt -- id )");
    vm.add_primitive("wait", concurrency::wait, "( id -- value )");
    vm.add_primitive("wait-all", concurrency::wait_all, "( -- )");
    vm.add_primitive("thread-done?", concurrency::thread_done, "( id -- flag )");
    vm.add_primitive("nproc", concurrency::nproc, "( -- n )");

    // ----- C code generator -----
    vm.add_primitive("emit-c", super::codegen::emit_c, "( -- )");
    vm.add_primitive("jit", super::codegen::jit, "( -- )");
}

/// Registers the runtime-helper primitives and caches their XTs onto
/// `vm.helpers`. Must run before anything else so the XTs stay the
/// lowest integers in the dictionary (spec ss4.1).
fn register_helpers(vm: &mut Vm) {
    let lit = vm.add_primitive("(lit)", inner::lit, "( -- n )");
    let branch = vm.add_primitive("(branch)", inner::branch, "( -- )");
    let zbranch = vm.add_primitive("(0branch)", inner::zbranch, "( flag -- )");
    let exit = vm.add_primitive("(exit)", inner::exit_, "( -- )");
    let s_quote = vm.add_primitive("(s\")", inner::s_quote_runtime, "( -- addr u )");
    let do_ = vm.add_primitive("(do)", inner::do_runtime, "( limit index -- )");
    let qdo = vm.add_primitive("(?do)", inner::qdo_runtime, "( limit index -- )");
    let loop_ = vm.add_primitive("(loop)", inner::loop_runtime, "( -- )");
    let plusloop = vm.add_primitive("(+loop)", inner::plusloop_runtime, "( step -- )");
    let does = vm.add_primitive("(does>)", inner::does_runtime, "( -- )");
    vm.helpers = HelperXts {
        lit,
        branch,
        zbranch,
        exit,
        s_quote,
        do_,
        qdo,
        loop_,
        plusloop,
        does,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internals::outer::eval_line;

    #[test]
    fn helpers_land_on_the_lowest_ten_indices() {
        let vm = Vm::new();
        let mut xts = [
            vm.helpers.lit,
            vm.helpers.branch,
            vm.helpers.zbranch,
            vm.helpers.exit,
            vm.helpers.s_quote,
            vm.helpers.do_,
            vm.helpers.qdo,
            vm.helpers.loop_,
            vm.helpers.plusloop,
            vm.helpers.does,
        ];
        xts.sort_unstable();
        assert_eq!(xts, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn a_representative_primitive_from_every_group_is_registered() {
        let mut vm = Vm::new();
        for name in [
            "+", "dup", "=", "and", "@", ":", "if", "s\"", ".", "s>number?", "emit", "bye",
            "spawn", "emit-c",
        ] {
            assert!(vm.dict.find(name).is_some(), "{name} missing");
        }
        eval_line(&mut vm, "1 2 + .");
        assert!(!vm.abort_flag);
    }

    #[test]
    fn re_registering_does_not_break_dispatch() {
        let mut vm = Vm::new();
        register_all(&mut vm);
        eval_line(&mut vm, "3 4 + .");
        assert!(!vm.abort_flag);
    }
}
