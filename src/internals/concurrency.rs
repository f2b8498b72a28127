// Native OS-thread concurrency (spec ss4.4). Grounded in
// `examples/original_source/engine/spawn.c`'s pthread-based slot table,
// reworked around `std::thread`: a spawned word runs to completion on a
// cloned `Vm` and its `JoinHandle<i64>` return value *is* the captured
// top-of-stack, so there's no separate result field to shepherd by hand
// the way the C slot struct needs one.
//
// The one piece of state genuinely shared across threads is the `done`
// flag `thread-done?` polls without blocking; that alone is behind a
// mutex, matching spec ss4.4's "a single mutex protects the slot table
// (allocation and the done flag)".

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::error::VmError;
use crate::kernel::{Vm, FALSE, MAX_THREADS, TRUE};

pub struct ThreadTable {
    done_flags: Arc<Mutex<Vec<bool>>>,
    handles: Vec<Option<JoinHandle<i64>>>,
    /// Set on a successful `wait`, cleared on reuse by `spawn`; lets
    /// `wait` tell "never spawned" apart from "already waited".
    waited: Vec<bool>,
    next: usize,
}

impl ThreadTable {
    pub fn new() -> ThreadTable {
        ThreadTable {
            done_flags: Arc::new(Mutex::new(vec![false; MAX_THREADS])),
            handles: (0..MAX_THREADS).map(|_| None).collect(),
            waited: vec![false; MAX_THREADS],
            next: 0,
        }
    }
}

impl Default for ThreadTable {
    fn default() -> ThreadTable {
        ThreadTable::new()
    }
}

/// `spawn ( xt -- id )`.
pub fn spawn(vm: &mut Vm) {
    let xt = pop!(vm, "spawn");
    if xt < 0 || xt as usize >= vm.dict.len() {
        vm.report(VmError::Other("spawn: invalid xt".to_owned()));
        return;
    }
    let xt = xt as usize;

    let mut id = None;
    for i in 0..MAX_THREADS {
        let idx = (vm.threads.next + i) % MAX_THREADS;
        if vm.threads.handles[idx].is_none() {
            id = Some(idx);
            vm.threads.next = (idx + 1) % MAX_THREADS;
            break;
        }
    }
    let id = match id {
        Some(id) => id,
        None => {
            vm.msg.error("spawn", "no free thread slot", None::<i64>);
            push!(vm, -1);
            return;
        }
    };

    let mut child = vm.clone_for_spawn();
    let done_flags = vm.threads.done_flags.clone();
    {
        let mut flags = done_flags.lock().unwrap();
        flags[id] = false;
    }
    vm.threads.waited[id] = false;

    let handle = std::thread::spawn(move || {
        super::inner::execute(&mut child, xt);
        let result = child.pop().unwrap_or(0);
        done_flags.lock().unwrap()[id] = true;
        result
    });
    vm.threads.handles[id] = Some(handle);
    push!(vm, id as i64);
}

/// `wait ( id -- value )`.
pub fn wait(vm: &mut Vm) {
    let id = pop!(vm, "wait");
    if id < 0 || id as usize >= MAX_THREADS {
        vm.report(VmError::InvalidThreadId(id));
        return;
    }
    let idx = id as usize;
    let handle = match vm.threads.handles[idx].take() {
        Some(h) => h,
        None => {
            if vm.threads.waited[idx] {
                vm.report(VmError::AlreadyWaited(id));
            } else {
                vm.report(VmError::InvalidThreadId(id));
            }
            return;
        }
    };
    let result = handle.join().unwrap_or(0);
    vm.threads.waited[idx] = true;
    push!(vm, result);
}

/// `wait-all ( -- )`.
pub fn wait_all(vm: &mut Vm) {
    for idx in 0..MAX_THREADS {
        if let Some(handle) = vm.threads.handles[idx].take() {
            let _ = handle.join();
            vm.threads.waited[idx] = true;
        }
    }
}

/// `thread-done? ( id -- flag )`: an invalid id reads as done, matching
/// the original's "invalid = done" convention.
pub fn thread_done(vm: &mut Vm) {
    let id = pop!(vm, "thread-done?");
    if id < 0 || id as usize >= MAX_THREADS || vm.threads.handles[id as usize].is_none() {
        push!(vm, TRUE);
        return;
    }
    let flags = vm.threads.done_flags.lock().unwrap();
    push!(vm, if flags[id as usize] { TRUE } else { FALSE });
}

/// `nproc ( -- n )`.
pub fn nproc(vm: &mut Vm) {
    let n = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    push!(vm, n as i64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internals::outer::eval_line;

    #[test]
    fn spawn_wait_roundtrips_a_constant_word() {
        let mut vm = Vm::new();
        crate::internals::builtins::register_all(&mut vm);
        eval_line(&mut vm, ": work 123 ;");
        eval_line(&mut vm, "' work spawn wait");
        assert_eq!(vm.pop().unwrap(), 123);
    }

    #[test]
    fn two_spawns_run_concurrently_and_both_complete() {
        let mut vm = Vm::new();
        crate::internals::builtins::register_all(&mut vm);
        eval_line(&mut vm, ": work2 1000 0 do loop 7 ;");
        eval_line(&mut vm, "' work2 spawn ' work2 spawn wait swap wait +");
        assert_eq!(vm.pop().unwrap(), 14);
    }

    #[test]
    fn wait_on_unspawned_id_is_an_error() {
        let mut vm = Vm::new();
        crate::internals::builtins::register_all(&mut vm);
        eval_line(&mut vm, "5 wait");
        assert!(vm.abort_flag);
    }

    #[test]
    fn nproc_reports_at_least_one() {
        let mut vm = Vm::new();
        nproc(&mut vm);
        assert!(vm.pop().unwrap() >= 1);
    }
}
