// System configuration and command-line processing. Builder-style
// `clap::Command`, same idiom as the teacher's `config.rs`, generalized
// to the CLI surface spec.md ss6 actually names.

use clap::{arg, Command};

use crate::messages::DebugLevel;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One unit of work from the command line, in the order it appeared.
/// Positional file arguments and repeated `-e` flags interleave freely
/// (spec.md ss6A), so we recover their relative order from clap's
/// argument indices rather than processing each flag group separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    LoadFile(String),
    Eval(String),
}

pub struct Config {
    pub debug_level: DebugLevel,
    pub actions: Vec<Action>,
}

impl Config {
    pub fn new() -> Config {
        Config {
            debug_level: DebugLevel::Error,
            actions: Vec::new(),
        }
    }

    /// `process_args` handles command-line argument processing using clap.
    pub fn process_args(&mut self) -> &Config {
        let arguments = Command::new("fifth")
            .version(VERSION)
            .about("A minimal, self-contained Forth engine")
            .arg(arg!([files] ... "Forth source files to load, in order").required(false))
            .arg(
                arg!(-e --eval <CODE> "Interpret CODE immediately")
                    .required(false)
                    .action(clap::ArgAction::Append),
            )
            .arg(
                arg!(--debuglevel <VALUE>)
                    .required(false)
                    .value_parser(["error", "warning", "info", "debug"]),
            )
            .get_matches();

        if let Some(level) = arguments.get_one::<String>("debuglevel") {
            self.debug_level = match level.as_str() {
                "debug" => DebugLevel::Debug,
                "info" => DebugLevel::Info,
                "warning" => DebugLevel::Warning,
                _ => DebugLevel::Error,
            };
        }

        // Recover command-line order across the two repeatable sources
        // so `a.fs -e "1 ."  b.fs` runs a.fs, then the eval, then b.fs.
        let mut indexed: Vec<(usize, Action)> = Vec::new();
        if let Some(files) = arguments.get_many::<String>("files") {
            let idx = arguments.indices_of("files").unwrap();
            for (i, f) in idx.zip(files) {
                indexed.push((i, Action::LoadFile(f.clone())));
            }
        }
        if let Some(evals) = arguments.get_many::<String>("eval") {
            let idx = arguments.indices_of("eval").unwrap();
            for (i, e) in idx.zip(evals) {
                indexed.push((i, Action::Eval(e.clone())));
            }
        }
        indexed.sort_by_key(|(i, _)| *i);
        self.actions = indexed.into_iter().map(|(_, a)| a).collect();
        self
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_config_defaults_to_error_level_and_no_actions() {
        let config = Config::new();
        assert_eq!(config.debug_level, DebugLevel::Error);
        assert!(config.actions.is_empty());
    }
}
