// Data-stack and return-stack shuffling words (spec ss4.5).

use crate::error::VmError;
use crate::kernel::{Vm, DSTACK_SIZE};

pub fn dup(vm: &mut Vm) {
    let a = match vm.top() {
        Ok(v) => v,
        Err(e) => {
            vm.report(e);
            return;
        }
    };
    push!(vm, a);
}

pub fn drop_(vm: &mut Vm) {
    let _ = pop!(vm, "drop");
}

pub fn swap(vm: &mut Vm) {
    let b = pop!(vm, "swap");
    let a = pop!(vm, "swap");
    push!(vm, b);
    push!(vm, a);
}

pub fn over(vm: &mut Vm) {
    let b = pop!(vm, "over");
    let a = pop!(vm, "over");
    push!(vm, a);
    push!(vm, b);
    push!(vm, a);
}

pub fn rot(vm: &mut Vm) {
    let c = pop!(vm, "rot");
    let b = pop!(vm, "rot");
    let a = pop!(vm, "rot");
    push!(vm, b);
    push!(vm, c);
    push!(vm, a);
}

pub fn minus_rot(vm: &mut Vm) {
    let c = pop!(vm, "-rot");
    let b = pop!(vm, "-rot");
    let a = pop!(vm, "-rot");
    push!(vm, c);
    push!(vm, a);
    push!(vm, b);
}

pub fn nip(vm: &mut Vm) {
    let b = pop!(vm, "nip");
    let _a = pop!(vm, "nip");
    push!(vm, b);
}

pub fn tuck(vm: &mut Vm) {
    let b = pop!(vm, "tuck");
    let a = pop!(vm, "tuck");
    push!(vm, b);
    push!(vm, a);
    push!(vm, b);
}

pub fn qdup(vm: &mut Vm) {
    let a = match vm.top() {
        Ok(v) => v,
        Err(e) => {
            vm.report(e);
            return;
        }
    };
    if a != 0 {
        push!(vm, a);
    }
}

pub fn two_dup(vm: &mut Vm) {
    let b = pop!(vm, "2dup");
    let a = pop!(vm, "2dup");
    push!(vm, a);
    push!(vm, b);
    push!(vm, a);
    push!(vm, b);
}

pub fn two_drop(vm: &mut Vm) {
    let _ = pop!(vm, "2drop");
    let _ = pop!(vm, "2drop");
}

pub fn two_swap(vm: &mut Vm) {
    let d = pop!(vm, "2swap");
    let c = pop!(vm, "2swap");
    let b = pop!(vm, "2swap");
    let a = pop!(vm, "2swap");
    push!(vm, c);
    push!(vm, d);
    push!(vm, a);
    push!(vm, b);
}

pub fn two_over(vm: &mut Vm) {
    let d = pop!(vm, "2over");
    let c = pop!(vm, "2over");
    let b = pop!(vm, "2over");
    let a = pop!(vm, "2over");
    push!(vm, a);
    push!(vm, b);
    push!(vm, c);
    push!(vm, d);
    push!(vm, a);
    push!(vm, b);
}

pub fn to_r(vm: &mut Vm) {
    let a = pop!(vm, ">r");
    push_r!(vm, a);
}

pub fn r_from(vm: &mut Vm) {
    let a = pop_r!(vm);
    push!(vm, a);
}

pub fn r_fetch(vm: &mut Vm) {
    let a = match vm.top_r() {
        Ok(v) => v,
        Err(e) => {
            vm.report(e);
            return;
        }
    };
    push!(vm, a);
}

pub fn two_to_r(vm: &mut Vm) {
    let b = pop!(vm, "2>r");
    let a = pop!(vm, "2>r");
    push_r!(vm, a);
    push_r!(vm, b);
}

pub fn two_r_from(vm: &mut Vm) {
    let b = pop_r!(vm);
    let a = pop_r!(vm);
    push!(vm, a);
    push!(vm, b);
}

pub fn two_r_fetch(vm: &mut Vm) {
    let b = pop_r!(vm);
    let a = pop_r!(vm);
    push_r!(vm, a);
    push_r!(vm, b);
    push!(vm, a);
    push!(vm, b);
}

pub fn depth(vm: &mut Vm) {
    push!(vm, vm.depth() as i64);
}

/// `xu ... x1 x0 u -- xu ... x1 x0 xu`
pub fn pick(vm: &mut Vm) {
    let n = pop!(vm, "pick");
    if n < 0 {
        vm.report(VmError::Other("pick: negative index".to_owned()));
        return;
    }
    let idx = vm.dsp + n as usize;
    if idx >= DSTACK_SIZE {
        vm.report(VmError::StackUnderflow { word: "pick" });
        return;
    }
    let v = vm.dstack[idx];
    push!(vm, v);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rot_cycles_three_deep() {
        let mut vm = Vm::new();
        vm.push(1).unwrap();
        vm.push(2).unwrap();
        vm.push(3).unwrap();
        rot(&mut vm);
        assert_eq!(vm.pop().unwrap(), 1);
        assert_eq!(vm.pop().unwrap(), 3);
        assert_eq!(vm.pop().unwrap(), 2);
    }

    #[test]
    fn to_r_and_r_from_roundtrip() {
        let mut vm = Vm::new();
        vm.push(99).unwrap();
        to_r(&mut vm);
        assert_eq!(vm.depth(), 0);
        r_from(&mut vm);
        assert_eq!(vm.pop().unwrap(), 99);
    }

    #[test]
    fn pick_reads_without_removing() {
        let mut vm = Vm::new();
        vm.push(10).unwrap();
        vm.push(20).unwrap();
        vm.push(30).unwrap();
        vm.push(2).unwrap();
        pick(&mut vm);
        assert_eq!(vm.pop().unwrap(), 10);
        assert_eq!(vm.depth(), 3);
    }
}
