// Character and file I/O words (spec ss4.5): `emit type cr key accept
// open-file create-file close-file write-file read-line emit-file
// flush-file r/o w/o r/w throw stdout slurp-file`. Grounded in the
// teacher's `internals/console.rs` (`f_emit_p`/`f_key`/`f_accept`/
// `f_open_file`/`f_close_file`/`f_read_line`), generalized to the full
// word list and reworked around `files::FileHandle` returning
// `io::Result` instead of `Option`.

use std::io::{self, Read, Write};

use crate::error::VmError;
use crate::files::{FileHandle, FileMode};
use crate::kernel::{Vm, FALSE, MAX_FILES, TRUE};

/// Sentinel file-id for `stdout`: distinct from any real slot index (which
/// are always `>= 0` and `< MAX_FILES`) and from the `-1` `r/w` constant,
/// a different namespace entirely.
pub const STDOUT_ID: i64 = -2;

fn read_string(vm: &Vm, addr: usize, len: usize) -> String {
    String::from_utf8_lossy(&vm.arena[addr..addr + len]).into_owned()
}

// ----- character I/O -----

pub fn emit(vm: &mut Vm) {
    let c = pop!(vm, "emit");
    print!("{}", (c as u8) as char);
}

pub fn type_(vm: &mut Vm) {
    let len = pop!(vm, "type") as usize;
    let addr = pop!(vm, "type") as usize;
    print!("{}", read_string(vm, addr, len));
}

pub fn cr(_vm: &mut Vm) {
    println!();
}

/// `key ( -- c )`: one raw byte from stdin, blocking.
pub fn key(vm: &mut Vm) {
    let mut buf = [0u8; 1];
    match io::stdin().read(&mut buf[..]) {
        Ok(1) => push!(vm, buf[0] as i64),
        _ => push!(vm, 0),
    }
}

/// `accept ( addr u -- u2 )`: reads one line (at most `u` characters) from
/// stdin into the arena at `addr`, returning the actual count.
pub fn accept(vm: &mut Vm) {
    let max_len = pop!(vm, "accept") as usize;
    let addr = pop!(vm, "accept") as usize;
    let mut line = String::new();
    let n = io::stdin().read_line(&mut line).unwrap_or(0);
    if n == 0 {
        push!(vm, 0);
        return;
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    let len = line.len().min(max_len);
    vm.arena[addr..addr + len].copy_from_slice(&line.as_bytes()[..len]);
    push!(vm, len as i64);
}

// ----- file I/O -----

fn free_slot(vm: &Vm) -> Option<usize> {
    vm.files.iter().position(|f| f.is_none())
}

/// `open-file ( addr u fam -- file-id ior )`.
pub fn open_file(vm: &mut Vm) {
    let fam = pop!(vm, "open-file");
    let len = pop!(vm, "open-file") as usize;
    let addr = pop!(vm, "open-file") as usize;
    let name = read_string(vm, addr, len);
    let slot = match free_slot(vm) {
        Some(s) => s,
        None => {
            push!(vm, 0);
            push!(vm, -1);
            return;
        }
    };
    match FileHandle::open(&super::system::expand_path(&name), FileMode::from_fam(fam)) {
        Ok(fh) => {
            vm.files[slot] = Some(fh);
            push!(vm, slot as i64);
            push!(vm, 0);
        }
        Err(_) => {
            push!(vm, 0);
            push!(vm, -1);
        }
    }
}

/// `create-file ( addr u fam -- file-id ior )`.
pub fn create_file(vm: &mut Vm) {
    let _fam = pop!(vm, "create-file");
    let len = pop!(vm, "create-file") as usize;
    let addr = pop!(vm, "create-file") as usize;
    let name = read_string(vm, addr, len);
    let slot = match free_slot(vm) {
        Some(s) => s,
        None => {
            push!(vm, 0);
            push!(vm, -1);
            return;
        }
    };
    match FileHandle::create(&super::system::expand_path(&name)) {
        Ok(fh) => {
            vm.files[slot] = Some(fh);
            push!(vm, slot as i64);
            push!(vm, 0);
        }
        Err(_) => {
            push!(vm, 0);
            push!(vm, -1);
        }
    }
}

/// `close-file ( file-id -- ior )`.
pub fn close_file(vm: &mut Vm) {
    let id = pop!(vm, "close-file");
    if id >= 0 && (id as usize) < MAX_FILES && vm.files[id as usize].is_some() {
        vm.files[id as usize] = None;
        push!(vm, 0);
    } else {
        push!(vm, -1);
    }
}

/// `write-file ( addr u file-id -- ior )`. `file-id` may be `stdout`.
pub fn write_file(vm: &mut Vm) {
    let id = pop!(vm, "write-file");
    let len = pop!(vm, "write-file") as usize;
    let addr = pop!(vm, "write-file") as usize;
    let s = read_string(vm, addr, len);
    if id == STDOUT_ID {
        print!("{s}");
        push!(vm, 0);
        return;
    }
    if id < 0 || id as usize >= MAX_FILES {
        push!(vm, -1);
        return;
    }
    match vm.files[id as usize].as_mut() {
        Some(fh) => push!(vm, if fh.write_str(&s).is_ok() { 0 } else { -1 }),
        None => push!(vm, -1),
    }
}

/// `emit-file ( c file-id -- ior )`.
pub fn emit_file(vm: &mut Vm) {
    let id = pop!(vm, "emit-file");
    let c = pop!(vm, "emit-file") as u8;
    if id == STDOUT_ID {
        print!("{}", c as char);
        push!(vm, 0);
        return;
    }
    if id < 0 || id as usize >= MAX_FILES {
        push!(vm, -1);
        return;
    }
    match vm.files[id as usize].as_mut() {
        Some(fh) => push!(vm, if fh.write_str(&(c as char).to_string()).is_ok() { 0 } else { -1 }),
        None => push!(vm, -1),
    }
}

/// `flush-file ( file-id -- ior )`.
pub fn flush_file(vm: &mut Vm) {
    let id = pop!(vm, "flush-file");
    if id == STDOUT_ID {
        push!(vm, if io::stdout().flush().is_ok() { 0 } else { -1 });
        return;
    }
    if id < 0 || id as usize >= MAX_FILES {
        push!(vm, -1);
        return;
    }
    match vm.files[id as usize].as_mut() {
        Some(fh) => push!(vm, if fh.flush().is_ok() { 0 } else { -1 }),
        None => push!(vm, -1),
    }
}

/// `read-line ( addr u1 file-id -- u2 flag ior )`: `flag` is true while a
/// line was actually read, false at EOF.
pub fn read_line(vm: &mut Vm) {
    let id = pop!(vm, "read-line");
    let max_len = pop!(vm, "read-line") as usize;
    let addr = pop!(vm, "read-line") as usize;
    if id < 0 || id as usize >= MAX_FILES {
        push!(vm, 0);
        push!(vm, FALSE);
        push!(vm, -1);
        return;
    }
    match vm.files[id as usize].as_mut() {
        Some(fh) => match fh.get_line() {
            Some(line) => {
                let len = line.len().min(max_len);
                vm.arena[addr..addr + len].copy_from_slice(&line.as_bytes()[..len]);
                push!(vm, len as i64);
                push!(vm, TRUE);
                push!(vm, 0);
            }
            None => {
                push!(vm, 0);
                push!(vm, FALSE);
                push!(vm, 0);
            }
        },
        None => {
            push!(vm, 0);
            push!(vm, FALSE);
            push!(vm, -1);
        }
    }
}

/// `slurp-file ( addr u -- addr2 u2 )`: the named file's entire contents,
/// copied into the arena at HERE.
pub fn slurp_file(vm: &mut Vm) {
    let len = pop!(vm, "slurp-file") as usize;
    let addr = pop!(vm, "slurp-file") as usize;
    let name = read_string(vm, addr, len);
    let path = super::system::expand_path(&name);
    let contents = match FileHandle::open(&path, FileMode::ReadOnly).and_then(|mut fh| fh.slurp()) {
        Ok(s) => s,
        Err(e) => {
            vm.report(VmError::Io(e));
            return;
        }
    };
    let dest = vm.here;
    vm.arena[dest..dest + contents.len()].copy_from_slice(contents.as_bytes());
    vm.here += contents.len();
    push!(vm, dest as i64);
    push!(vm, contents.len() as i64);
}

// ----- fam constants, stdout, throw -----

pub fn r_o(vm: &mut Vm) {
    push!(vm, 0);
}

pub fn w_o(vm: &mut Vm) {
    push!(vm, 1);
}

pub fn r_w(vm: &mut Vm) {
    push!(vm, -1);
}

pub fn stdout_(vm: &mut Vm) {
    push!(vm, STDOUT_ID);
}

/// `throw ( n -- )`: a no-op for `n = 0`; otherwise aborts with the
/// numeric code, spec ss7's "User-signalled" error.
pub fn throw(vm: &mut Vm) {
    let n = pop!(vm, "throw");
    if n != 0 {
        vm.report(VmError::UserThrow(n));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internals::outer::eval_line;

    #[test]
    fn write_file_to_stdout_id_succeeds() {
        let mut vm = Vm::new();
        crate::internals::builtins::register_all(&mut vm);
        eval_line(&mut vm, "s\" hi\" stdout write-file");
        assert_eq!(vm.pop().unwrap(), 0);
    }

    #[test]
    fn create_write_read_roundtrips_through_a_real_file() {
        let mut vm = Vm::new();
        crate::internals::builtins::register_all(&mut vm);
        let dir = std::env::temp_dir();
        let path = dir.join(format!("fifth-console-{}.txt", std::process::id()));
        let path_str = path.to_string_lossy().into_owned();
        eval_line(&mut vm, &format!("s\" {path_str}\" r/w create-file"));
        let ior = vm.pop().unwrap();
        let fid = vm.pop().unwrap();
        assert_eq!(ior, 0);
        eval_line(&mut vm, "s\" hello\"");
        vm.push(fid).unwrap();
        write_file(&mut vm);
        assert_eq!(vm.pop().unwrap(), 0);
        vm.push(fid).unwrap();
        close_file(&mut vm);
        assert_eq!(vm.pop().unwrap(), 0);

        eval_line(&mut vm, &format!("s\" {path_str}\" slurp-file"));
        let len = vm.pop().unwrap() as usize;
        let addr = vm.pop().unwrap() as usize;
        assert_eq!(&vm.arena[addr..addr + len], b"hello");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn throw_with_nonzero_code_aborts() {
        let mut vm = Vm::new();
        crate::internals::builtins::register_all(&mut vm);
        eval_line(&mut vm, "5 throw");
        assert!(vm.abort_flag);
    }

    #[test]
    fn throw_with_zero_is_a_no_op() {
        let mut vm = Vm::new();
        crate::internals::builtins::register_all(&mut vm);
        eval_line(&mut vm, "0 throw");
        assert!(!vm.abort_flag);
    }
}
