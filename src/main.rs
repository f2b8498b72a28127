// CLI entry point and REPL (spec.md ss6). Processes `Config::actions` in
// command-line order, then -- unless a file or `-e` already called `bye`
// -- falls into an interactive loop reading lines from stdin, printing
// the `ok`/`compiled` prompt policy after each one.

use std::io::{self, Write};
use std::path::Path;

use fifth::config::{Action, Config};
use fifth::internals::{outer, system};
use fifth::kernel::Vm;

fn run_action(vm: &mut Vm, action: &Action) {
    match action {
        Action::LoadFile(path) => system::load_file(vm, Path::new(path)),
        Action::Eval(code) => outer::eval_line(vm, code),
    }
}

fn print_prompt(vm: &Vm) {
    if vm.compiling() {
        println!("compiled");
    } else {
        println!("ok");
    }
}

fn repl(vm: &mut Vm) {
    let mut line = String::new();
    loop {
        if vm.should_exit {
            break;
        }
        line.clear();
        let n = match io::stdin().read_line(&mut line) {
            Ok(n) => n,
            Err(_) => break,
        };
        if n == 0 {
            break; // EOF
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        outer::eval_line(vm, &line);
        if vm.should_exit {
            break;
        }
        print_prompt(vm);
        io::stdout().flush().ok();
    }
}

fn main() {
    let mut config = Config::new();
    config.process_args();

    let mut vm = Vm::with_config(&config);

    for action in &config.actions {
        run_action(&mut vm, action);
        if vm.should_exit {
            break;
        }
    }

    if !vm.should_exit {
        repl(&mut vm);
    }

    std::process::exit(vm.exit_code);
}
