// `.`/`u.`/`.s` and the pictured-numeric-output words (spec ss4.5). Our
// cells are single-width, so the pictured-output accumulator here works
// on one unsigned `i64` rather than a double-cell value -- the engine
// has no double-cell arithmetic anywhere else either (see DESIGN.md).

use crate::kernel::{Vm, DSTACK_SIZE, PAD_SIZE};

const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn to_radix_unsigned(mut v: u64, radix: u32) -> String {
    if v == 0 {
        return "0".to_owned();
    }
    let mut buf = Vec::new();
    while v > 0 {
        buf.push(DIGITS[(v % radix as u64) as usize]);
        v /= radix as u64;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap()
}

fn format_unsigned(v: u64, base: i64) -> String {
    to_radix_unsigned(v, base.clamp(2, 36) as u32)
}

fn format_signed(v: i64, base: i64) -> String {
    if v < 0 {
        format!("-{}", to_radix_unsigned(v.unsigned_abs(), base.clamp(2, 36) as u32))
    } else {
        to_radix_unsigned(v as u64, base.clamp(2, 36) as u32)
    }
}

pub fn dot(vm: &mut Vm) {
    let v = pop!(vm, ".");
    let base = vm.base();
    print!("{} ", format_signed(v, base));
}

pub fn u_dot(vm: &mut Vm) {
    let v = pop!(vm, "u.");
    let base = vm.base();
    print!("{} ", format_unsigned(v as u64, base));
}

pub fn dot_s(vm: &mut Vm) {
    let base = vm.base();
    print!("<{}> ", vm.depth());
    for i in (vm.dsp..DSTACK_SIZE).rev() {
        print!("{} ", format_signed(vm.dstack[i], base));
    }
}

pub fn less_number_sign(vm: &mut Vm) {
    vm.hld = vm.pad_start + PAD_SIZE;
}

pub fn number_sign(vm: &mut Vm) {
    let v = pop!(vm, "#") as u64;
    let base = vm.base().clamp(2, 36) as u64;
    let digit = (v % base) as usize;
    vm.hld -= 1;
    vm.arena[vm.hld] = DIGITS[digit];
    push!(vm, (v / base) as i64);
}

pub fn number_sign_s(vm: &mut Vm) {
    loop {
        number_sign(vm);
        if vm.abort_flag {
            return;
        }
        let v = match vm.top() {
            Ok(v) => v,
            Err(e) => {
                vm.report(e);
                return;
            }
        };
        if v == 0 {
            break;
        }
    }
}

pub fn hold(vm: &mut Vm) {
    let c = pop!(vm, "hold") as u8;
    vm.hld -= 1;
    vm.arena[vm.hld] = c;
}

pub fn sign(vm: &mut Vm) {
    let flag = pop!(vm, "sign");
    if flag < 0 {
        vm.hld -= 1;
        vm.arena[vm.hld] = b'-';
    }
}

pub fn number_sign_greater(vm: &mut Vm) {
    let _remaining = pop!(vm, "#>");
    push!(vm, vm.hld as i64);
    push!(vm, (vm.pad_start + PAD_SIZE - vm.hld) as i64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pictured_output_emits_digits_high_to_low() {
        let mut vm = Vm::new();
        less_number_sign(&mut vm);
        vm.push(255).unwrap();
        number_sign_s(&mut vm);
        sign(&mut vm);
        number_sign_greater(&mut vm);
        let len = vm.pop().unwrap() as usize;
        let addr = vm.pop().unwrap() as usize;
        assert_eq!(&vm.arena[addr..addr + len], b"255");
    }

    #[test]
    fn sign_prepends_minus_for_negative_flag() {
        let mut vm = Vm::new();
        less_number_sign(&mut vm);
        vm.push(42).unwrap();
        number_sign_s(&mut vm);
        vm.push(-1).unwrap();
        sign(&mut vm);
        number_sign_greater(&mut vm);
        let len = vm.pop().unwrap() as usize;
        let addr = vm.pop().unwrap() as usize;
        assert_eq!(&vm.arena[addr..addr + len], b"-42");
    }
}
