// Bitwise logic primitives (spec ss4.5).

use crate::kernel::Vm;

pub fn and(vm: &mut Vm) {
    pop2_push1!(vm, |a, b| a & b);
}

pub fn or(vm: &mut Vm) {
    pop2_push1!(vm, |a, b| a | b);
}

pub fn xor(vm: &mut Vm) {
    pop2_push1!(vm, |a, b| a ^ b);
}

pub fn invert(vm: &mut Vm) {
    pop1_push1!(vm, |a| !a);
}

pub fn lshift(vm: &mut Vm) {
    pop2_push1!(vm, |a, n| a.wrapping_shl(n as u32 & 63));
}

pub fn rshift(vm: &mut Vm) {
    pop2_push1!(vm, |a, n| ((a as u64).wrapping_shr(n as u32 & 63)) as i64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rshift_is_logical_not_arithmetic() {
        let mut vm = Vm::new();
        vm.push(-1).unwrap();
        vm.push(60).unwrap();
        rshift(&mut vm);
        assert_eq!(vm.pop().unwrap(), 0xf);
    }
}
