// Diagnostic sink used throughout the engine. Every primitive and
// interpreter stage reports through a `Msg` rather than writing to
// stderr directly, so the verbosity threshold is a single knob.

use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugLevel {
    Error,
    Warning,
    Info,
    Debug,
}

pub struct Msg {
    level: DebugLevel,
}

impl Msg {
    pub fn new() -> Msg {
        Msg {
            level: DebugLevel::Error,
        }
    }

    pub fn set_level(&mut self, level: DebugLevel) {
        self.level = level;
    }

    pub fn get_level(&self) -> DebugLevel {
        self.level
    }

    fn emit<T: Display>(&self, level: DebugLevel, context: &str, text: &str, detail: Option<T>) {
        if level > self.level {
            return;
        }
        match detail {
            Some(d) => eprintln!("{:?} [{}]: {} ({})", level, context, text, d),
            None => eprintln!("{:?} [{}]: {}", level, context, text),
        }
    }

    /// Always shown regardless of level: the engine's single abort path
    /// routes its diagnostic through this.
    pub fn error<T: Display>(&self, context: &str, text: &str, detail: Option<T>) {
        self.emit(DebugLevel::Error, context, text, detail);
    }

    pub fn warning<T: Display>(&self, context: &str, text: &str, detail: Option<T>) {
        self.emit(DebugLevel::Warning, context, text, detail);
    }

    pub fn info<T: Display>(&self, context: &str, text: &str, detail: Option<T>) {
        self.emit(DebugLevel::Info, context, text, detail);
    }

    pub fn debug<T: Display>(&self, context: &str, text: &str, detail: Option<T>) {
        self.emit(DebugLevel::Debug, context, text, detail);
    }
}

impl Default for Msg {
    fn default() -> Msg {
        Msg::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_level_is_error() {
        let msg = Msg::new();
        assert_eq!(msg.get_level(), DebugLevel::Error);
    }

    #[test]
    fn set_level_roundtrips() {
        let mut msg = Msg::new();
        msg.set_level(DebugLevel::Debug);
        assert_eq!(msg.get_level(), DebugLevel::Debug);
    }

    #[test]
    fn ordering_places_error_first() {
        assert!(DebugLevel::Error < DebugLevel::Warning);
        assert!(DebugLevel::Warning < DebugLevel::Info);
        assert!(DebugLevel::Info < DebugLevel::Debug);
    }
}
