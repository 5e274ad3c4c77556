//! Transient notices: the terminal surface every engine error ends at.
//!
//! Nothing here is fatal — a notice is printed and the session carries
//! on, possibly in a stale-but-consistent state.

use console::style;

use crate::errors::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Map an engine error to its notice level: validation and
    /// precondition failures are warnings (nothing was sent or changed),
    /// the no-rollback paths warn that local and remote state may have
    /// drifted, and remote rejections are errors.
    pub fn from_engine_error(err: &EngineError) -> Self {
        match err {
            EngineError::Validation(_) | EngineError::Precondition(_) => {
                Self::warning(err.to_string())
            }
            EngineError::RenameMigration { .. } => Self::warning(err.to_string()),
            EngineError::Remote(_) => Self::error(err.to_string()),
        }
    }

    pub fn emit(&self) {
        match self.level {
            NoticeLevel::Info => println!("{}", self.message),
            NoticeLevel::Success => println!("{} {}", style("✓").green(), self.message),
            NoticeLevel::Warning => {
                eprintln!("{} {}", style("warning:").yellow().bold(), self.message)
            }
            NoticeLevel::Error => eprintln!("{} {}", style("error:").red().bold(), self.message),
        }
    }
}
