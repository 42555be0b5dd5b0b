//! LTH-prefixed error types with structured error codes, plus the fault
//! descriptors used for per-phase error injection.

#![allow(missing_docs)]

use std::path::PathBuf;

use thiserror::Error;

use crate::contract::Phase;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Top-level error type for the load-test harness.
#[derive(Debug, Clone, Error)]
pub enum HarnessError {
    #[error("[LTH-1001] invalid settings: {details}")]
    InvalidSettings { details: String },

    #[error("[LTH-1002] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[LTH-2001] no fixture registered for {method} {url}")]
    UnmatchedUrl { method: String, url: String },

    #[error("[LTH-2002] fixture series for {url} is exhausted")]
    ExhaustedFixture { url: String },

    #[error("[LTH-2003] unsupported method {method}: only GET/POST/PATCH have fixture tables")]
    UnsupportedMethod { method: String },

    #[error("[LTH-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[LTH-3002] IO failure at {path}: {details}")]
    Io { path: PathBuf, details: String },

    #[error("[LTH-3900] runtime failure: {details}")]
    Runtime { details: String },

    #[error("[LTH-4001] injected {kind} fault in {phase}: {message}")]
    Injected {
        phase: Phase,
        kind: FaultKind,
        message: String,
    },

    #[error("[LTH-4002] canned {kind} transport fault: {message}")]
    Canned { kind: FaultKind, message: String },
}

impl HarnessError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidSettings { .. } => "LTH-1001",
            Self::ConfigParse { .. } => "LTH-1002",
            Self::UnmatchedUrl { .. } => "LTH-2001",
            Self::ExhaustedFixture { .. } => "LTH-2002",
            Self::UnsupportedMethod { .. } => "LTH-2003",
            Self::Serialization { .. } => "LTH-2101",
            Self::Io { .. } => "LTH-3002",
            Self::Runtime { .. } => "LTH-3900",
            Self::Injected { .. } => "LTH-4001",
            Self::Canned { .. } => "LTH-4002",
        }
    }

    /// Whether this error signals a test-authoring bug (bad fixture setup)
    /// rather than an injected or runtime failure.
    #[must_use]
    pub const fn is_fixture_bug(&self) -> bool {
        matches!(
            self,
            Self::UnmatchedUrl { .. }
                | Self::ExhaustedFixture { .. }
                | Self::UnsupportedMethod { .. }
                | Self::InvalidSettings { .. }
        )
    }

    /// The phase this error was injected into, if it is an injected fault.
    #[must_use]
    pub const fn injected_phase(&self) -> Option<Phase> {
        match self {
            Self::Injected { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            details: source.to_string(),
        }
    }
}

impl From<serde_json::Error> for HarnessError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for HarnessError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

/// The kind of a registered fault descriptor. Stands in for the arbitrary
/// exception types tests inject; assertions match on the kind instead of
/// downcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// User-initiated interruption (Ctrl-C analogue).
    Interrupt,
    /// Generic runtime failure.
    Runtime,
    /// Bad value passed across a seam.
    Value,
    /// Configuration problem detected mid-run.
    Config,
    /// Simulated network failure.
    Network,
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Interrupt => "interrupt",
            Self::Runtime => "runtime",
            Self::Value => "value",
            Self::Config => "config",
            Self::Network => "network",
        };
        f.write_str(name)
    }
}

/// A registered error descriptor: what to raise, resolved at setup time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultSpec {
    pub kind: FaultKind,
    pub message: String,
}

impl FaultSpec {
    #[must_use]
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Materialize the descriptor as an injected-phase error.
    #[must_use]
    pub fn into_error(self, phase: Phase) -> HarnessError {
        HarnessError::Injected {
            phase,
            kind: self.kind,
            message: self.message,
        }
    }

    /// Materialize the descriptor as a canned transport fault.
    #[must_use]
    pub fn into_canned(self) -> HarnessError {
        HarnessError::Canned {
            kind: self.kind,
            message: self.message,
        }
    }
}
