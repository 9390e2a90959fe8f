use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Fatal,
}

/// A problem noticed while reading inputs or assembling groups that did not stop the run.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(msg: impl Into<String>) -> Self {
        Self { severity: Severity::Warning, message: msg.into() }
    }
    pub fn fatal(msg: impl Into<String>) -> Self {
        Self { severity: Severity::Fatal, message: msg.into() }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("annotation line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("region '{region}' occurs more than once in the genome")]
    DuplicateRegion { region: String },

    #[error("group '{group}' is inconsistent: {reason}")]
    InconsistentGroup { group: String, reason: String },

    #[error("group '{group}' refers to region '{region}' which is not in the genome")]
    UnknownRegion { group: String, region: String },

    /// Offsets are 0-based inclusive, as stored in the feature record.
    #[error("group '{group}': interval [{start}, {stop}] is outside region of length {length}")]
    CoordinateOutOfRange { group: String, start: i64, stop: i64, length: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse { line, message: message.into() }
    }

    /// True for failures caused by the content of the inputs rather than by reading them.
    pub fn is_data_error(&self) -> bool {
        !matches!(self, ExtractError::Io(_))
    }

    /// Whether lenient mode may skip the offending line or group and carry on.
    pub fn is_skippable(&self) -> bool {
        self.is_data_error() && !matches!(self, ExtractError::DuplicateRegion { .. })
    }
}
