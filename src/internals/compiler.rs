// `:`/`;`, the control-flow metacompiler table, and the CREATE/DOES>
// defining-word protocol (spec ss4.3). The compile-time stack of patch
// addresses is colocated with the regular data stack, per spec ss9 --
// callers must balance it before `;`.
//
// Every compile-time word here is grounded cell-for-cell on
// `examples/original_source/engine/prims.c`'s control-flow section; the
// teacher's own `compiler.rs` never implements control flow (its Forth
// bootstraps that in a `.fs` file instead), so these have no teacher
// counterpart to imitate beyond the shared `pop!`/`push!` macro style.

use crate::dictionary::{DictEntry, Handler};
use crate::error::VmError;
use crate::kernel::Vm;

fn must_find(vm: &mut Vm, name: &str) -> i64 {
    match vm.dict.find(name) {
        Some(xt) => xt as i64,
        None => {
            vm.report(VmError::Other(format!("{name} is not yet defined")));
            0
        }
    }
}

// ----- : ; immediate [ ] state -----

pub fn colon(vm: &mut Vm) {
    let name = match super::outer::next_token(vm) {
        Some(t) => t,
        None => {
            vm.report(VmError::Other(": requires a name".to_owned()));
            return;
        }
    };
    vm.align();
    let xt = vm.dict.add(DictEntry {
        name,
        immediate: false,
        hidden: true,
        handler: Handler::Colon,
        param: vm.here as i64,
        does: None,
        doc: String::new(),
    });
    vm.creating = Some(xt);
    vm.set_compiling(true);
}

/// IMMEDIATE.
pub fn semicolon(vm: &mut Vm) {
    let exit_xt = vm.helpers.exit as i64;
    vm.comma(exit_xt);
    if let Some(xt) = vm.creating.take() {
        vm.dict.entry_mut(xt).hidden = false;
    }
    vm.set_compiling(false);
}

pub fn immediate(vm: &mut Vm) {
    if let Some(xt) = vm.dict.latest() {
        vm.make_immediate(xt);
    }
}

/// IMMEDIATE.
pub fn left_bracket(vm: &mut Vm) {
    vm.set_compiling(false);
}

pub fn right_bracket(vm: &mut Vm) {
    vm.set_compiling(true);
}

/// `state ( -- addr )`: the arena address holding the compile-state cell.
pub fn state(vm: &mut Vm) {
    push!(vm, crate::kernel::STATE_ADDR as i64);
}

// ----- ' ['] execute >body -----

pub fn tick(vm: &mut Vm) {
    let name = match super::outer::next_token(vm) {
        Some(t) => t,
        None => {
            vm.report(VmError::Other("' requires a name".to_owned()));
            return;
        }
    };
    match vm.dict.find(&name) {
        Some(xt) => push!(vm, xt as i64),
        None => vm.report(VmError::UndefinedWord { word: name }),
    }
}

/// IMMEDIATE.
pub fn bracket_tick(vm: &mut Vm) {
    let name = match super::outer::next_token(vm) {
        Some(t) => t,
        None => {
            vm.report(VmError::Other("['] requires a name".to_owned()));
            return;
        }
    };
    let xt = match vm.dict.find(&name) {
        Some(xt) => xt,
        None => {
            vm.report(VmError::UndefinedWord { word: name });
            return;
        }
    };
    let lit_xt = vm.helpers.lit as i64;
    vm.comma(lit_xt);
    vm.comma(xt as i64);
}

pub fn execute(vm: &mut Vm) {
    let xt = pop!(vm, "execute");
    if xt < 0 || xt as usize >= vm.dict.len() {
        vm.report(VmError::Other("execute: invalid xt".to_owned()));
        return;
    }
    super::inner::execute(vm, xt as usize);
}

pub fn to_body(vm: &mut Vm) {
    let xt = pop!(vm, ">body");
    if xt < 0 || xt as usize >= vm.dict.len() {
        vm.report(VmError::Other(">body: invalid xt".to_owned()));
        return;
    }
    let param = vm.dict.entry(xt as usize).param;
    push!(vm, param);
}

// ----- create find literal compile, postpone does> recurse -----

pub fn create(vm: &mut Vm) {
    let name = match super::outer::next_token(vm) {
        Some(t) => t,
        None => {
            vm.report(VmError::Other("create requires a name".to_owned()));
            return;
        }
    };
    vm.align();
    let xt = vm.dict.add(DictEntry {
        name,
        immediate: false,
        hidden: false,
        handler: Handler::Variable,
        param: vm.here as i64,
        does: None,
        doc: String::new(),
    });
    vm.creating = Some(xt);
}

/// `find ( addr u -- xt 1 | xt -1 | addr u 0 )`, matching the teacher's
/// addr/len string convention rather than a counted string.
pub fn find(vm: &mut Vm) {
    let len = pop!(vm, "find") as usize;
    let addr = pop!(vm, "find") as usize;
    let name = String::from_utf8_lossy(&vm.arena[addr..addr + len]).into_owned();
    match vm.dict.find(&name) {
        Some(xt) => {
            let immediate = vm.dict.entry(xt).immediate;
            push!(vm, xt as i64);
            push!(vm, if immediate { 1 } else { -1 });
        }
        None => {
            push!(vm, addr as i64);
            push!(vm, len as i64);
            push!(vm, 0);
        }
    }
}

/// IMMEDIATE.
pub fn literal(vm: &mut Vm) {
    let v = pop!(vm, "literal");
    let lit_xt = vm.helpers.lit as i64;
    vm.comma(lit_xt);
    vm.comma(v);
}

pub fn compile_comma(vm: &mut Vm) {
    let xt = pop!(vm, "compile,");
    vm.comma(xt);
}

/// IMMEDIATE. Immediate words compile their XT directly; non-immediate
/// words compile `(lit) xt compile,` so the append happens at the
/// surrounding word's own runtime instead of at POSTPONE's compile time.
pub fn postpone(vm: &mut Vm) {
    let name = match super::outer::next_token(vm) {
        Some(t) => t,
        None => {
            vm.report(VmError::Other("postpone requires a name".to_owned()));
            return;
        }
    };
    let xt = match vm.dict.find(&name) {
        Some(xt) => xt,
        None => {
            vm.report(VmError::Other(format!("postpone: {name} not found")));
            return;
        }
    };
    if vm.dict.entry(xt).immediate {
        vm.comma(xt as i64);
    } else {
        let lit_xt = vm.helpers.lit as i64;
        vm.comma(lit_xt);
        vm.comma(xt as i64);
        let cc_xt = must_find(vm, "compile,");
        vm.comma(cc_xt);
    }
}

/// `does> ( -- )` IMMEDIATE: compile-time half of the DOES> protocol --
/// compiles a call to the `(does>)` runtime helper into the current
/// definition. That primitive (in `internals::inner`) does the actual
/// rewrite of the CREATEd entry when the defining word runs.
pub fn does_compile(vm: &mut Vm) {
    let does_xt = vm.helpers.does as i64;
    vm.comma(does_xt);
}

/// IMMEDIATE.
pub fn recurse(vm: &mut Vm) {
    match vm.dict.latest() {
        Some(xt) => vm.comma(xt as i64),
        None => vm.report(VmError::Other("recurse: not in a definition".to_owned())),
    }
}

/// IMMEDIATE. Only compiles `(exit)` in compile state; a no-op when
/// typed interactively, matching the original's "EXIT compile (exit)
/// for user use" comment.
pub fn user_exit(vm: &mut Vm) {
    if vm.compiling() {
        let exit_xt = vm.helpers.exit as i64;
        vm.comma(exit_xt);
    }
}

// ----- control flow: if/else/then, begin/while/repeat/until/again -----
// All IMMEDIATE. Stack effects documented per spec ss4.3's table.

pub fn if_(vm: &mut Vm) {
    let xt = vm.helpers.zbranch as i64;
    vm.comma(xt);
    push!(vm, vm.here as i64);
    vm.comma(0);
}

pub fn else_(vm: &mut Vm) {
    let xt = vm.helpers.branch as i64;
    vm.comma(xt);
    let fwd2 = vm.here as i64;
    vm.comma(0);
    let fwd1 = pop!(vm, "else") as usize;
    let here = vm.here as i64;
    vm.cell_write(fwd1, here);
    push!(vm, fwd2);
}

pub fn then_(vm: &mut Vm) {
    let fwd = pop!(vm, "then") as usize;
    let here = vm.here as i64;
    vm.cell_write(fwd, here);
}

pub fn begin_(vm: &mut Vm) {
    push!(vm, vm.here as i64);
}

/// `while ( dest -- orig dest )`: the 0branch's own placeholder ends up
/// on top so REPEAT patches it last, with BEGIN's back-ref restored
/// beneath for the unconditional branch.
pub fn while_(vm: &mut Vm) {
    let xt = vm.helpers.zbranch as i64;
    vm.comma(xt);
    let orig = vm.here as i64;
    vm.comma(0);
    let dest = pop!(vm, "while");
    push!(vm, orig);
    push!(vm, dest);
}

pub fn repeat_(vm: &mut Vm) {
    let back = pop!(vm, "repeat");
    let orig = pop!(vm, "repeat") as usize;
    let xt = vm.helpers.branch as i64;
    vm.comma(xt);
    vm.comma(back);
    let here = vm.here as i64;
    vm.cell_write(orig, here);
}

pub fn until_(vm: &mut Vm) {
    let back = pop!(vm, "until");
    let xt = vm.helpers.zbranch as i64;
    vm.comma(xt);
    vm.comma(back);
}

pub fn again_(vm: &mut Vm) {
    let back = pop!(vm, "again");
    let xt = vm.helpers.branch as i64;
    vm.comma(xt);
    vm.comma(back);
}

// ----- do / ?do / loop / +loop / i / j / unloop -----

pub fn do_(vm: &mut Vm) {
    let xt = vm.helpers.do_ as i64;
    vm.comma(xt);
    push!(vm, 0); // no forward ref for DO -- only ?DO needs one
    push!(vm, vm.here as i64);
}

pub fn qdo_(vm: &mut Vm) {
    let xt = vm.helpers.qdo as i64;
    vm.comma(xt);
    let orig = vm.here as i64;
    vm.comma(0);
    push!(vm, orig);
    push!(vm, vm.here as i64);
}

pub fn loop_(vm: &mut Vm) {
    let back = pop!(vm, "loop");
    let orig = pop!(vm, "loop");
    let xt = vm.helpers.loop_ as i64;
    vm.comma(xt);
    vm.comma(back);
    if orig != 0 {
        let here = vm.here as i64;
        vm.cell_write(orig as usize, here);
    }
}

pub fn plusloop_(vm: &mut Vm) {
    let back = pop!(vm, "+loop");
    let orig = pop!(vm, "+loop");
    let xt = vm.helpers.plusloop as i64;
    vm.comma(xt);
    vm.comma(back);
    if orig != 0 {
        let here = vm.here as i64;
        vm.cell_write(orig as usize, here);
    }
}

/// Not IMMEDIATE: reads the return stack directly, same as any other
/// runtime word, rather than compiling anything.
pub fn i_word(vm: &mut Vm) {
    match vm.top_r() {
        Ok(v) => push!(vm, v),
        Err(e) => vm.report(e),
    }
}

/// The enclosing loop's index sits two cells below the current one's on
/// the return stack (skipping the current index and its limit).
pub fn j_word(vm: &mut Vm) {
    let idx = vm.rsp + 2;
    if idx >= vm.rstack.len() {
        vm.report(VmError::StackUnderflow { word: "j" });
        return;
    }
    push!(vm, vm.rstack[idx]);
}

pub fn unloop(vm: &mut Vm) {
    pop_r!(vm);
    pop_r!(vm);
}

// ----- case / of / endof / endcase -----

pub fn case_(vm: &mut Vm) {
    push!(vm, 0); // sentinel
}

/// `of`: compiles `over = (0branch) <placeholder> drop`.
pub fn of_(vm: &mut Vm) {
    let over_xt = must_find(vm, "over");
    let eq_xt = must_find(vm, "=");
    let drop_xt = must_find(vm, "drop");
    vm.comma(over_xt);
    vm.comma(eq_xt);
    let zbranch_xt = vm.helpers.zbranch as i64;
    vm.comma(zbranch_xt);
    let orig = vm.here as i64;
    vm.comma(0);
    vm.comma(drop_xt);
    push!(vm, orig);
}

/// `endof`: compiles `(branch) <placeholder>`, resolves the matching
/// OF's 0branch to here, and leaves its own placeholder for ENDCASE.
pub fn endof_(vm: &mut Vm) {
    let xt = vm.helpers.branch as i64;
    vm.comma(xt);
    let fwd = vm.here as i64;
    vm.comma(0);
    let orig = pop!(vm, "endof") as usize;
    let here = vm.here as i64;
    vm.cell_write(orig, here);
    push!(vm, fwd);
}

/// `endcase`: compiles `drop`, then patches every pending ENDOF
/// placeholder down to CASE's sentinel.
pub fn endcase_(vm: &mut Vm) {
    let drop_xt = must_find(vm, "drop");
    vm.comma(drop_xt);
    let here = vm.here as i64;
    loop {
        let v = pop!(vm, "endcase");
        if v == 0 {
            break;
        }
        vm.cell_write(v as usize, here);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internals::outer::eval_line;

    fn prep(vm: &mut Vm) {
        // mirrors builtins::register_all ordering for the handful of
        // names these tests compile against directly
        crate::internals::builtins::register_all(vm);
    }

    #[test]
    fn colon_semicolon_define_a_callable_word() {
        let mut vm = Vm::new();
        prep(&mut vm);
        eval_line(&mut vm, ": sq dup * ;");
        assert!(!vm.abort_flag);
        eval_line(&mut vm, "5 sq");
        assert_eq!(vm.pop().unwrap(), 25);
    }

    #[test]
    fn if_else_then_selects_a_branch() {
        let mut vm = Vm::new();
        prep(&mut vm);
        eval_line(&mut vm, ": sgn dup 0< if drop -1 else dup 0> if drop 1 else drop 0 then then ;");
        assert!(!vm.abort_flag, "{:?}", vm.abort_flag);
        eval_line(&mut vm, "-7 sgn");
        assert_eq!(vm.pop().unwrap(), -1);
        eval_line(&mut vm, "0 sgn");
        assert_eq!(vm.pop().unwrap(), 0);
        eval_line(&mut vm, "42 sgn");
        assert_eq!(vm.pop().unwrap(), 1);
    }

    #[test]
    fn qdo_loop_with_i_sums_a_range() {
        let mut vm = Vm::new();
        prep(&mut vm);
        eval_line(&mut vm, ": ssum 0 swap 0 ?do i + loop ;");
        assert!(!vm.abort_flag);
        eval_line(&mut vm, "100 ssum");
        assert_eq!(vm.pop().unwrap(), 4950);
    }

    #[test]
    fn qdo_with_equal_bounds_runs_zero_times() {
        let mut vm = Vm::new();
        prep(&mut vm);
        eval_line(&mut vm, ": cnt 0 swap 0 ?do 1+ loop ;");
        assert!(!vm.abort_flag);
        eval_line(&mut vm, "0 cnt");
        assert_eq!(vm.pop().unwrap(), 0);
    }

    #[test]
    fn create_does_builds_a_defining_word() {
        let mut vm = Vm::new();
        prep(&mut vm);
        eval_line(&mut vm, ": const create , does> @ ;");
        assert!(!vm.abort_flag);
        eval_line(&mut vm, "42 const life");
        assert!(!vm.abort_flag);
        eval_line(&mut vm, "life");
        assert_eq!(vm.pop().unwrap(), 42);
    }

    #[test]
    fn begin_until_counts_down() {
        let mut vm = Vm::new();
        prep(&mut vm);
        eval_line(&mut vm, ": countdown begin 1- dup 0= until ;");
        eval_line(&mut vm, "5 countdown");
        assert_eq!(vm.pop().unwrap(), 0);
    }

    #[test]
    fn case_of_endof_endcase_dispatches() {
        let mut vm = Vm::new();
        prep(&mut vm);
        // the fall-through (unmatched) path still has the selector on the
        // stack when it reaches the default clause; ENDCASE only ever
        // compiles a single trailing DROP, so a default that wants to
        // leave its own value behind has to swap the selector on top of
        // it first, so ENDCASE's DROP discards the selector instead.
        eval_line(&mut vm, ": classify case 1 of 100 endof 2 of 200 endof 999 swap endcase ;");
        assert!(!vm.abort_flag);
        eval_line(&mut vm, "1 classify");
        assert_eq!(vm.pop().unwrap(), 100);
        eval_line(&mut vm, "2 classify");
        assert_eq!(vm.pop().unwrap(), 200);
        eval_line(&mut vm, "3 classify");
        assert_eq!(vm.pop().unwrap(), 999);
    }

    #[test]
    fn recurse_compiles_a_call_to_the_current_definition() {
        let mut vm = Vm::new();
        prep(&mut vm);
        eval_line(&mut vm, ": count-to-zero dup 0= if drop else 1- recurse then ;");
        assert!(!vm.abort_flag);
        eval_line(&mut vm, "5 count-to-zero");
        assert_eq!(vm.pop().unwrap(), 0);
    }
}
