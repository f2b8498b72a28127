// The virtual machine: arena, stacks, dictionary, and the bits of state
// the inner/outer interpreters need to share. This merges the two
// half-finished designs found in the teacher repo (a `Kernel`/
// `ForthRuntime` split that never got wired up, and a working but
// monolithic `TF`) into one consistent struct, per DESIGN.md.

use std::time::Instant;

use crate::config::Config;
use crate::dictionary::{DictEntry, Dictionary, Handler, Xt};
use crate::error::{VmError, VmResult};
use crate::files::FileHandle;
use crate::messages::Msg;

pub const DSTACK_SIZE: usize = 256;
pub const RSTACK_SIZE: usize = 256;
pub const MEM_SIZE: usize = 1024 * 1024;
pub const TIB_SIZE: usize = 1024;
pub const PAD_SIZE: usize = 4096;
pub const MAX_FILES: usize = 16;
pub const MAX_THREADS: usize = 64;
pub const CELL_SIZE: usize = 8;

pub const TRUE: i64 = -1;
pub const FALSE: i64 = 0;

/// Offsets within the first 64 reserved bytes of the arena (spec.md ss3:
/// "first 64 bytes reserved for VM-level scratch (base, state mirror)").
/// Compile state and numeric base live here rather than as plain Rust
/// fields so that Forth's `state`/`base` words can hand out a real
/// arena address for `@`/`!`, matching every other variable.
pub const STATE_ADDR: usize = 0;
pub const BASE_ADDR: usize = 8;

/// Execution tokens registered before anything else, so they stay low
/// integers; cached here rather than re-looked-up on every dispatch.
#[derive(Default, Clone, Copy)]
pub struct HelperXts {
    pub lit: Xt,
    pub branch: Xt,
    pub zbranch: Xt,
    pub exit: Xt,
    pub s_quote: Xt,
    pub do_: Xt,
    pub qdo: Xt,
    pub loop_: Xt,
    pub plusloop: Xt,
    pub does: Xt,
}

pub struct Vm {
    // data space
    pub arena: Vec<u8>,
    pub here: usize,

    // stacks: dsp/rsp are one-past-top, predecremented on push
    pub dstack: Vec<i64>,
    pub dsp: usize,
    pub rstack: Vec<i64>,
    pub rsp: usize,

    // inner interpreter
    pub ip: usize,
    pub dict: Dictionary,
    pub helpers: HelperXts,

    // outer interpreter / compiler
    pub tib: String,
    pub tib_in: usize,
    pub creating: Option<Xt>,

    // pictured numeric output
    pub pad_start: usize,
    pub hld: usize,

    // input source nesting: empty == reading from the top-level REPL
    pub reader: Vec<FileHandle>,
    pub loaded_paths: Vec<std::path::PathBuf>,

    // explicitly opened files, indexed by file-id
    pub files: Vec<Option<FileHandle>>,

    // lifecycle
    pub abort_flag: bool,
    pub should_exit: bool,
    pub exit_code: i32,

    pub msg: Msg,
    pub timer: Instant,

    pub threads: crate::internals::concurrency::ThreadTable,
}

impl Vm {
    pub fn new() -> Vm {
        let mut vm = Vm {
            arena: vec![0u8; MEM_SIZE],
            here: 64, // spec.md: first 64 bytes reserved for VM-level scratch
            dstack: vec![0i64; DSTACK_SIZE],
            dsp: DSTACK_SIZE,
            rstack: vec![0i64; RSTACK_SIZE],
            rsp: RSTACK_SIZE,
            ip: 0,
            dict: Dictionary::new(),
            helpers: HelperXts::default(),
            tib: String::new(),
            tib_in: 0,
            creating: None,
            pad_start: 0,
            hld: 0,
            reader: Vec::new(),
            loaded_paths: Vec::new(),
            files: (0..MAX_FILES).map(|_| None).collect(),
            abort_flag: false,
            should_exit: false,
            exit_code: 0,
            msg: Msg::new(),
            timer: Instant::now(),
            threads: crate::internals::concurrency::ThreadTable::new(),
        };
        vm.pad_start = MEM_SIZE - PAD_SIZE;
        vm.set_compiling(false);
        vm.set_base(10);
        crate::internals::builtins::register_all(&mut vm);
        vm
    }

    pub fn with_config(config: &Config) -> Vm {
        let mut vm = Vm::new();
        vm.msg.set_level(config.debug_level);
        vm
    }

    /// A snapshot clone for a spawned worker thread: dictionary and the
    /// whole arena (simpler and still cheap at `MEM_SIZE` bytes than
    /// tracking an exact used-prefix), cached helper XTs, and the set of
    /// already-`require`d paths. Fresh stacks, fresh reader/file state,
    /// fresh thread table -- spec.md ss4.4/ss9: "Child VMs are deep copies
    /// of the parent ... Fresh stacks are allocated."
    pub fn clone_for_spawn(&self) -> Vm {
        Vm {
            arena: self.arena.clone(),
            here: self.here,
            dstack: vec![0i64; DSTACK_SIZE],
            dsp: DSTACK_SIZE,
            rstack: vec![0i64; RSTACK_SIZE],
            rsp: RSTACK_SIZE,
            ip: 0,
            dict: self.dict.clone(),
            helpers: self.helpers,
            tib: String::new(),
            tib_in: 0,
            creating: None,
            pad_start: self.pad_start,
            hld: 0,
            reader: Vec::new(),
            loaded_paths: self.loaded_paths.clone(),
            files: (0..MAX_FILES).map(|_| None).collect(),
            abort_flag: false,
            should_exit: false,
            exit_code: 0,
            msg: {
                let mut m = Msg::new();
                m.set_level(self.msg.get_level());
                m
            },
            timer: Instant::now(),
            threads: crate::internals::concurrency::ThreadTable::new(),
        }
    }

    // ----- compile state / numeric base (arena-backed, spec.md ss3) -----

    pub fn compiling(&self) -> bool {
        self.cell_read(STATE_ADDR) != FALSE
    }

    pub fn set_compiling(&mut self, value: bool) {
        self.cell_write(STATE_ADDR, if value { TRUE } else { FALSE });
    }

    pub fn base(&self) -> i64 {
        self.cell_read(BASE_ADDR)
    }

    pub fn set_base(&mut self, value: i64) {
        self.cell_write(BASE_ADDR, value);
    }

    // ----- stacks -----

    pub fn push(&mut self, value: i64) -> VmResult<()> {
        if self.dsp == 0 {
            return Err(VmError::StackOverflow { word: "push" });
        }
        self.dsp -= 1;
        self.dstack[self.dsp] = value;
        Ok(())
    }

    pub fn pop(&mut self) -> VmResult<i64> {
        if self.dsp >= DSTACK_SIZE {
            return Err(VmError::StackUnderflow { word: "pop" });
        }
        let v = self.dstack[self.dsp];
        self.dsp += 1;
        Ok(v)
    }

    pub fn top(&self) -> VmResult<i64> {
        if self.dsp >= DSTACK_SIZE {
            return Err(VmError::StackUnderflow { word: "top" });
        }
        Ok(self.dstack[self.dsp])
    }

    pub fn depth(&self) -> usize {
        DSTACK_SIZE - self.dsp
    }

    pub fn push_r(&mut self, value: i64) -> VmResult<()> {
        if self.rsp == 0 {
            return Err(VmError::StackOverflow { word: "push_r" });
        }
        self.rsp -= 1;
        self.rstack[self.rsp] = value;
        Ok(())
    }

    pub fn pop_r(&mut self) -> VmResult<i64> {
        if self.rsp >= RSTACK_SIZE {
            return Err(VmError::StackUnderflow { word: "pop_r" });
        }
        let v = self.rstack[self.rsp];
        self.rsp += 1;
        Ok(v)
    }

    pub fn top_r(&self) -> VmResult<i64> {
        if self.rsp >= RSTACK_SIZE {
            return Err(VmError::StackUnderflow { word: "top_r" });
        }
        Ok(self.rstack[self.rsp])
    }

    // ----- arena -----

    /// Aligns HERE up to the next cell boundary. spec.md requires every
    /// cell append to be preceded by this.
    pub fn align(&mut self) {
        let rem = self.here % CELL_SIZE;
        if rem != 0 {
            self.here += CELL_SIZE - rem;
        }
    }

    pub fn cell_read(&self, addr: usize) -> i64 {
        let bytes: [u8; 8] = self.arena[addr..addr + CELL_SIZE].try_into().unwrap();
        i64::from_le_bytes(bytes)
    }

    pub fn cell_write(&mut self, addr: usize, value: i64) {
        self.arena[addr..addr + CELL_SIZE].copy_from_slice(&value.to_le_bytes());
    }

    /// `,` -- aligns, writes a cell at HERE, advances HERE.
    pub fn comma(&mut self, value: i64) {
        self.align();
        self.cell_write(self.here, value);
        self.here += CELL_SIZE;
    }

    /// `c,` -- writes a single byte at HERE, advances HERE by one.
    pub fn c_comma(&mut self, value: u8) {
        self.arena[self.here] = value;
        self.here += 1;
    }

    pub fn allot(&mut self, n: i64) {
        if n >= 0 {
            self.here += n as usize;
        } else {
            self.here -= (-n) as usize;
        }
    }

    // ----- dictionary helpers -----

    pub fn add_primitive(&mut self, name: &str, code: fn(&mut Vm), doc: &str) -> Xt {
        self.dict.add(DictEntry {
            name: name.to_owned(),
            immediate: false,
            hidden: false,
            handler: Handler::Primitive(code),
            param: 0,
            does: None,
            doc: doc.to_owned(),
        })
    }

    pub fn make_immediate(&mut self, xt: Xt) {
        self.dict.entry_mut(xt).immediate = true;
    }

    // ----- lifecycle -----

    /// The single abort path: print the diagnostic, reset both stacks,
    /// leave compile state, close nested source handles, return to the
    /// outer loop. spec.md ss7. `abort_flag` only needs to survive long
    /// enough to unwind the current `eval_line` call -- `eval_line`
    /// clears it on entry, so the next line (the next REPL prompt, or
    /// the next queued `-e`/file action) starts fresh.
    pub fn abort(&mut self, reason: &str) {
        self.msg.error("abort", reason, None::<i64>);
        self.dsp = DSTACK_SIZE;
        self.rsp = RSTACK_SIZE;
        self.set_compiling(false);
        self.creating = None;
        self.reader.clear();
        self.abort_flag = true;
    }

    /// Convenience for primitives that use `?` internally: format a
    /// `VmError` and route it through the single abort path.
    pub fn report(&mut self, err: VmError) {
        self.abort(&err.to_string());
    }
}

impl Default for Vm {
    fn default() -> Vm {
        Vm::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_roundtrips() {
        let mut vm = Vm::new();
        vm.push(42).unwrap();
        assert_eq!(vm.pop().unwrap(), 42);
    }

    #[test]
    fn pop_on_empty_stack_is_underflow() {
        let mut vm = Vm::new();
        assert!(matches!(vm.pop(), Err(VmError::StackUnderflow { .. })));
    }

    #[test]
    fn depth_tracks_pushes() {
        let mut vm = Vm::new();
        assert_eq!(vm.depth(), 0);
        vm.push(1).unwrap();
        vm.push(2).unwrap();
        assert_eq!(vm.depth(), 2);
    }

    #[test]
    fn comma_aligns_and_advances_here() {
        let mut vm = Vm::new();
        vm.here = 65; // misaligned on purpose
        vm.comma(99);
        assert_eq!(vm.here % CELL_SIZE, 0);
        let written_at = vm.here - CELL_SIZE;
        assert_eq!(vm.cell_read(written_at), 99);
    }

    #[test]
    fn abort_resets_stacks_and_compile_state() {
        let mut vm = Vm::new();
        vm.push(1).unwrap();
        vm.set_compiling(true);
        vm.abort("test");
        assert_eq!(vm.depth(), 0);
        assert!(!vm.compiling());
        assert!(vm.abort_flag);
    }
}
