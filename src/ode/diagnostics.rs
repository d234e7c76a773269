use std::fmt;

use log::{error, info, warn};

use super::error::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub stage: Stage,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let level = match self.level {
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        };
        write!(f, "[{}] {}: {}", level, self.stage, self.message)
    }
}

/// Side channel every stage reports to. Entries are also forwarded to the
/// `log` facade.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: Level, stage: Stage, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            level,
            stage,
            message: message.into(),
        };
        match level {
            Level::Info => info!("{diagnostic}"),
            Level::Warning => warn!("{diagnostic}"),
            Level::Error => error!("{diagnostic}"),
        }
        self.entries.push(diagnostic);
    }

    pub fn info(&mut self, stage: Stage, message: impl Into<String>) {
        self.push(Level::Info, stage, message)
    }

    pub fn error(&mut self, stage: Stage, message: impl Into<String>) {
        self.push(Level::Error, stage, message)
    }

    pub fn entries(&self) -> &[Diagnostic] {
        self.entries.as_slice()
    }

    /// True if any stage reported under `stage`, i.e. the stage was entered.
    pub fn reached(&self, stage: Stage) -> bool {
        self.entries.iter().any(|d| d.stage == stage)
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.level == Level::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Diagnostics, Level};
    use crate::ode::Stage;

    #[test]
    fn records_stage_and_level() {
        let mut diags = Diagnostics::new();
        assert!(diags.is_empty());
        diags.info(Stage::Engine, "running");
        diags.error(Stage::Engine, "exit status 1");
        assert!(diags.reached(Stage::Engine));
        assert!(!diags.reached(Stage::Classification));
        assert!(diags.has_errors());
        assert_eq!(diags.entries()[1].level, Level::Error);
        assert_eq!(
            diags.entries()[1].to_string(),
            "[error] symbolic engine: exit status 1"
        );
    }
}
