// Stack-guard helpers shared by every primitive-group module. The teacher
// duplicates an equivalent set (`stack_ok!`/`pop!`/`push!`/`pop2_push1!`/
// `pop1_push1!`) independently in each of `internals/general.rs`,
// `compiler.rs`, `console.rs`, `debug.rs`; centralized here once instead
// (see DESIGN.md).
//
// Every primitive's signature is `fn(&mut Vm)`: there is no `Result`
// return to propagate, so a failed pop/push routes through `Vm::report`
// and returns out of the primitive early, same as the teacher's macros.

macro_rules! pop {
    ($vm:expr, $word:expr) => {
        match $vm.pop() {
            Ok(v) => v,
            Err(e) => {
                let _ = $word;
                $vm.report(e);
                return;
            }
        }
    };
}

macro_rules! pop_r {
    ($vm:expr) => {
        match $vm.pop_r() {
            Ok(v) => v,
            Err(e) => {
                $vm.report(e);
                return;
            }
        }
    };
}

macro_rules! push {
    ($vm:expr, $value:expr) => {
        if let Err(e) = $vm.push($value) {
            $vm.report(e);
            return;
        }
    };
}

macro_rules! push_r {
    ($vm:expr, $value:expr) => {
        if let Err(e) = $vm.push_r($value) {
            $vm.report(e);
            return;
        }
    };
}

/// Pops two cells (`b` then `a`, so `a b` reads left-to-right as written
/// on the stack) and pushes the result of applying `$body` to them.
macro_rules! pop2_push1 {
    ($vm:expr, |$a:ident, $b:ident| $body:expr) => {{
        let $b = pop!($vm, "");
        let $a = pop!($vm, "");
        push!($vm, $body);
    }};
}

macro_rules! pop1_push1 {
    ($vm:expr, |$a:ident| $body:expr) => {{
        let $a = pop!($vm, "");
        push!($vm, $body);
    }};
}
