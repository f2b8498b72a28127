// System-level words: shelling out, environment access, file inclusion,
// numeric base, and the two comment forms (spec ss4.5). Grounded in
// `examples/original_source/engine/io.c`'s `p_include`/`p_require`/
// `p_system`/`p_getenv`/`p_backslash`/`p_paren`.

use std::path::{Path, PathBuf};

use crate::error::VmError;
use crate::files::FileHandle;
use crate::kernel::Vm;

/// `~/` and bare `~` expand against `HOME`; anything else passes through.
pub fn expand_path(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return Path::new(&home).join(rest);
        }
    } else if raw == "~" {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home);
        }
    }
    PathBuf::from(raw)
}

/// Pushes a source context and interprets the file line by line, popping
/// the context again on EOF or abort. Mirrors `vm_load_file` in
/// `original_source/engine/vm.c`. `pub(crate)` so `main.rs` can load the
/// command-line source-file arguments the same way `include` does.
pub(crate) fn load_file(vm: &mut Vm, path: &Path) {
    let handle = match FileHandle::open(path, crate::files::FileMode::ReadOnly) {
        Ok(h) => h,
        Err(e) => {
            vm.report(VmError::Io(e));
            return;
        }
    };
    vm.reader.push(handle);
    loop {
        let line = match vm.reader.last_mut() {
            Some(r) => r.get_line(),
            None => None,
        };
        let line = match line {
            Some(l) => l,
            None => break,
        };
        super::outer::eval_line(vm, &line);
        if vm.abort_flag || vm.should_exit {
            break;
        }
    }
    if !vm.reader.is_empty() {
        vm.reader.pop();
    }
}

fn take_filename_token(vm: &mut Vm, word: &'static str) -> Option<String> {
    match super::outer::next_token(vm) {
        Some(t) => Some(t),
        None => {
            vm.report(VmError::Other(format!("{word} requires a filename")));
            None
        }
    }
}

/// `include ( "name" -- )`: always (re)loads.
pub fn include(vm: &mut Vm) {
    let name = match take_filename_token(vm, "include") {
        Some(n) => n,
        None => return,
    };
    let path = expand_path(&name);
    load_file(vm, &path);
}

/// `require ( "name" -- )`: loads once per resolved absolute path.
pub fn require(vm: &mut Vm) {
    let name = match take_filename_token(vm, "require") {
        Some(n) => n,
        None => return,
    };
    let path = expand_path(&name);
    let resolved = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
    if vm.loaded_paths.contains(&resolved) {
        return;
    }
    vm.loaded_paths.push(resolved);
    load_file(vm, &path);
}

/// `included ( addr u -- )`: the programmatic form of `include`.
pub fn included(vm: &mut Vm) {
    let len = pop!(vm, "included") as usize;
    let addr = pop!(vm, "included") as usize;
    let name = String::from_utf8_lossy(&vm.arena[addr..addr + len]).into_owned();
    let path = expand_path(&name);
    load_file(vm, &path);
}

/// `system ( addr u -- )`: runs a shell command, discarding its status.
pub fn system(vm: &mut Vm) {
    let len = pop!(vm, "system") as usize;
    let addr = pop!(vm, "system") as usize;
    let cmd = String::from_utf8_lossy(&vm.arena[addr..addr + len]).into_owned();
    if let Err(e) = std::process::Command::new("sh").arg("-c").arg(&cmd).status() {
        vm.msg.warning("system", &e.to_string(), None::<i64>);
    }
}

/// `bye ( n -- )`: orderly shutdown; `n` is optional and becomes the
/// process exit code if present.
pub fn bye(vm: &mut Vm) {
    if let Ok(code) = vm.pop() {
        vm.exit_code = code as i32;
    }
    vm.should_exit = true;
}

/// `getenv ( addr u -- addr2 u2 )`: copies the named variable's value
/// into the arena at HERE; an empty span if unset.
pub fn getenv(vm: &mut Vm) {
    let len = pop!(vm, "getenv") as usize;
    let addr = pop!(vm, "getenv") as usize;
    let name = String::from_utf8_lossy(&vm.arena[addr..addr + len]).into_owned();
    let value = std::env::var(&name).unwrap_or_default();
    let dest = vm.here;
    vm.arena[dest..dest + value.len()].copy_from_slice(value.as_bytes());
    vm.here += value.len();
    push!(vm, dest as i64);
    push!(vm, value.len() as i64);
}

/// `base ( -- addr )`: the arena cell holding the current numeric base.
pub fn base(vm: &mut Vm) {
    push!(vm, crate::kernel::BASE_ADDR as i64);
}

pub fn decimal(vm: &mut Vm) {
    vm.set_base(10);
}

pub fn hex(vm: &mut Vm) {
    vm.set_base(16);
}

/// `\` IMMEDIATE: skips the rest of the current input line.
pub fn backslash_comment(vm: &mut Vm) {
    vm.tib_in = vm.tib.len();
}

/// `(` IMMEDIATE: skips up to (and including) the closing `)`.
pub fn paren_comment(vm: &mut Vm) {
    match vm.tib[vm.tib_in..].find(')') {
        Some(i) => vm.tib_in += i + 1,
        None => vm.tib_in = vm.tib.len(),
    }
}

pub fn true_(vm: &mut Vm) {
    push!(vm, crate::kernel::TRUE);
}

pub fn false_(vm: &mut Vm) {
    push!(vm, crate::kernel::FALSE);
}

pub fn bl(vm: &mut Vm) {
    push!(vm, b' ' as i64);
}

pub fn cell(vm: &mut Vm) {
    push!(vm, crate::kernel::CELL_SIZE as i64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_path_rewrites_leading_tilde() {
        std::env::set_var("HOME", "/home/tester");
        assert_eq!(expand_path("~/x.fs"), PathBuf::from("/home/tester/x.fs"));
        assert_eq!(expand_path("plain.fs"), PathBuf::from("plain.fs"));
    }

    #[test]
    fn require_loads_a_path_only_once() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("fifth-require-{}.fs", std::process::id()));
        std::fs::write(&path, ": bumped 1 counter +! ;\nbumped\n").unwrap();
        let mut vm = Vm::new();
        crate::internals::outer::eval_line(&mut vm, "create counter 0 ,");
        vm.tib = path.to_string_lossy().into_owned();
        vm.tib_in = 0;
        require(&mut vm);
        vm.tib = path.to_string_lossy().into_owned();
        vm.tib_in = 0;
        require(&mut vm);
        crate::internals::outer::eval_line(&mut vm, "counter @");
        assert_eq!(vm.pop().unwrap(), 1);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn backslash_comment_consumes_rest_of_line() {
        let mut vm = Vm::new();
        vm.tib = "dup \\ trailing comment".to_owned();
        vm.tib_in = 4;
        backslash_comment(&mut vm);
        assert_eq!(vm.tib_in, vm.tib.len());
    }
}
