// The inner interpreter: threaded-code dispatch. `execute` runs an XT to
// completion (including every colon word it calls); the runtime-helper
// primitives that make up the compiled form of control flow, literals
// and string runs live here too, since they exist purely to be fetched
// and dispatched by this loop.

use crate::dictionary::{Handler, Xt};
use crate::kernel::{Vm, CELL_SIZE};

/// Runs `xt` to completion. A primitive/variable/constant XT completes
/// synchronously inside `enter`; a colon or does-derived XT needs the
/// dispatch loop to walk its body.
pub fn execute(vm: &mut Vm, xt: Xt) {
    let entry_rsp = vm.rsp;
    if !enter(vm, xt) {
        return;
    }
    while vm.rsp < entry_rsp && !vm.abort_flag && !vm.should_exit {
        step(vm);
    }
}

/// Dispatches one XT. Returns `true` if the dispatch loop must keep
/// running (the XT pushed a return address and jumped into a body),
/// `false` if it already ran to completion.
fn enter(vm: &mut Vm, xt: Xt) -> bool {
    let entry = vm.dict.entry(xt);
    let handler = entry.handler;
    let param = entry.param;
    let does = entry.does;
    match handler {
        Handler::Primitive(f) => {
            f(vm);
            false
        }
        Handler::Variable | Handler::Constant => {
            if let Err(e) = vm.push(param) {
                vm.report(e);
            }
            false
        }
        Handler::Colon => {
            let ret = vm.ip as i64;
            if let Err(e) = vm.push_r(ret) {
                vm.report(e);
                return false;
            }
            vm.ip = param as usize;
            true
        }
        Handler::DoesDerived => {
            if let Err(e) = vm.push(param) {
                vm.report(e);
                return false;
            }
            let ret = vm.ip as i64;
            if let Err(e) = vm.push_r(ret) {
                vm.report(e);
                return false;
            }
            vm.ip = does.unwrap_or(0);
            true
        }
    }
}

/// Fetches the cell at IP, advances IP by one cell, dispatches it.
fn step(vm: &mut Vm) {
    let cell = vm.cell_read(vm.ip);
    vm.ip += CELL_SIZE;
    enter(vm, cell as usize);
}

// ----- runtime-helper primitives (spec ss4.1) -----
// These are registered first by `builtins::register_all` so their XTs
// are cached on `vm.helpers` and never looked up by name again.

pub fn lit(vm: &mut Vm) {
    let v = vm.cell_read(vm.ip);
    vm.ip += CELL_SIZE;
    if let Err(e) = vm.push(v) {
        vm.report(e);
    }
}

pub fn branch(vm: &mut Vm) {
    let target = vm.cell_read(vm.ip);
    vm.ip = target as usize;
}

pub fn zbranch(vm: &mut Vm) {
    let target = vm.cell_read(vm.ip);
    match vm.pop() {
        Ok(0) => vm.ip = target as usize,
        Ok(_) => vm.ip += CELL_SIZE,
        Err(e) => vm.report(e),
    }
}

pub fn exit_(vm: &mut Vm) {
    match vm.pop_r() {
        Ok(addr) => vm.ip = addr as usize,
        Err(e) => vm.report(e),
    }
}

/// `(s")` runtime: the length is the inline cell, the bytes follow
/// immediately and are cell-aligned, matching how `strings::emit_string`
/// compiles them.
pub fn s_quote_runtime(vm: &mut Vm) {
    let n = vm.cell_read(vm.ip);
    let addr = vm.ip + CELL_SIZE;
    let len = n.max(0) as usize;
    let padded = (len + CELL_SIZE - 1) / CELL_SIZE * CELL_SIZE;
    vm.ip = addr + padded;
    if let Err(e) = vm.push(addr as i64) {
        vm.report(e);
        return;
    }
    if let Err(e) = vm.push(n) {
        vm.report(e);
    }
}

/// `(do)`: pops (index, limit) -- index is on top since it was pushed
/// last by `limit index do` -- pushes (limit, index) onto the return
/// stack so `i`/`j` read the index off the top.
pub fn do_runtime(vm: &mut Vm) {
    let index = match vm.pop() {
        Ok(v) => v,
        Err(e) => {
            vm.report(e);
            return;
        }
    };
    let limit = match vm.pop() {
        Ok(v) => v,
        Err(e) => {
            vm.report(e);
            return;
        }
    };
    if let Err(e) = vm.push_r(limit) {
        vm.report(e);
        return;
    }
    if let Err(e) = vm.push_r(index) {
        vm.report(e);
    }
}

/// `(?do)`: like `(do)`, but an inline skip target follows immediately
/// and is taken when index already equals limit (a zero-trip loop).
pub fn qdo_runtime(vm: &mut Vm) {
    let skip_target = vm.cell_read(vm.ip);
    vm.ip += CELL_SIZE;
    let index = match vm.pop() {
        Ok(v) => v,
        Err(e) => {
            vm.report(e);
            return;
        }
    };
    let limit = match vm.pop() {
        Ok(v) => v,
        Err(e) => {
            vm.report(e);
            return;
        }
    };
    if index == limit {
        vm.ip = skip_target as usize;
    } else {
        if let Err(e) = vm.push_r(limit) {
            vm.report(e);
            return;
        }
        if let Err(e) = vm.push_r(index) {
            vm.report(e);
        }
    }
}

/// `(loop)`: increments index; terminates (discarding the loop frame and
/// falling through) when the new index reaches limit, else branches back
/// to the inline back-reference.
pub fn loop_runtime(vm: &mut Vm) {
    let backref = vm.cell_read(vm.ip);
    vm.ip += CELL_SIZE;
    let index = match vm.pop_r() {
        Ok(v) => v,
        Err(e) => {
            vm.report(e);
            return;
        }
    };
    let limit = match vm.pop_r() {
        Ok(v) => v,
        Err(e) => {
            vm.report(e);
            return;
        }
    };
    let new_index = index + 1;
    if new_index != limit {
        if let Err(e) = vm.push_r(limit) {
            vm.report(e);
            return;
        }
        if let Err(e) = vm.push_r(new_index) {
            vm.report(e);
            return;
        }
        vm.ip = backref as usize;
    }
}

/// `(+loop)`: adds a popped step to the index; terminates on exact
/// equality with limit, or when the step crossed the limit boundary
/// (sign(old-limit) != sign(new-limit), and that also differs from
/// sign(step) -- spec ss4.3).
pub fn plusloop_runtime(vm: &mut Vm) {
    let backref = vm.cell_read(vm.ip);
    vm.ip += CELL_SIZE;
    let step = match vm.pop() {
        Ok(v) => v,
        Err(e) => {
            vm.report(e);
            return;
        }
    };
    let old_index = match vm.pop_r() {
        Ok(v) => v,
        Err(e) => {
            vm.report(e);
            return;
        }
    };
    let limit = match vm.pop_r() {
        Ok(v) => v,
        Err(e) => {
            vm.report(e);
            return;
        }
    };
    let new_index = old_index.wrapping_add(step);
    let sign_old = (old_index - limit).signum();
    let sign_new = (new_index - limit).signum();
    let sign_step = step.signum();
    let terminate = new_index == limit || (sign_old != sign_new && sign_old != sign_step);
    if !terminate {
        if let Err(e) = vm.push_r(limit) {
            vm.report(e);
            return;
        }
        if let Err(e) = vm.push_r(new_index) {
            vm.report(e);
            return;
        }
        vm.ip = backref as usize;
    }
}

/// `(does>)`: rewrites the most recently created entry into a
/// does-derived word whose shared trailing code starts here, then exits
/// the defining word the same way `(exit)` does.
pub fn does_runtime(vm: &mut Vm) {
    let does_offset = vm.ip;
    if let Some(xt) = vm.dict.latest() {
        let entry = vm.dict.entry_mut(xt);
        entry.handler = Handler::DoesDerived;
        entry.does = Some(does_offset);
    }
    match vm.pop_r() {
        Ok(addr) => vm.ip = addr as usize,
        Err(e) => vm.report(e),
    }
}
