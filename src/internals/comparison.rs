// Comparison primitives (spec ss4.5). True is all-ones (-1), false is 0.

use crate::kernel::{Vm, FALSE, TRUE};

pub fn eq(vm: &mut Vm) {
    pop2_push1!(vm, |a, b| if a == b { TRUE } else { FALSE });
}

pub fn ne(vm: &mut Vm) {
    pop2_push1!(vm, |a, b| if a != b { TRUE } else { FALSE });
}

pub fn lt(vm: &mut Vm) {
    pop2_push1!(vm, |a, b| if a < b { TRUE } else { FALSE });
}

pub fn gt(vm: &mut Vm) {
    pop2_push1!(vm, |a, b| if a > b { TRUE } else { FALSE });
}

pub fn u_lt(vm: &mut Vm) {
    pop2_push1!(vm, |a, b| if (a as u64) < (b as u64) { TRUE } else { FALSE });
}

pub fn zero_eq(vm: &mut Vm) {
    pop1_push1!(vm, |a| if a == 0 { TRUE } else { FALSE });
}

pub fn zero_lt(vm: &mut Vm) {
    pop1_push1!(vm, |a| if a < 0 { TRUE } else { FALSE });
}

pub fn zero_gt(vm: &mut Vm) {
    pop1_push1!(vm, |a| if a > 0 { TRUE } else { FALSE });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_less_than_treats_negative_as_large() {
        let mut vm = Vm::new();
        vm.push(-1).unwrap(); // u64::MAX
        vm.push(1).unwrap();
        u_lt(&mut vm);
        assert_eq!(vm.pop().unwrap(), FALSE);
    }

    #[test]
    fn equality_pushes_all_ones_on_match() {
        let mut vm = Vm::new();
        vm.push(7).unwrap();
        vm.push(7).unwrap();
        eq(&mut vm);
        assert_eq!(vm.pop().unwrap(), TRUE);
    }
}
