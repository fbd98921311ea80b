use std::path::PathBuf;

use thiserror::Error;

use crate::platform::{Attribute, Pid};

/// Failure reported by the accessibility provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AxError {
    #[error("accessibility access is disabled for this process")]
    PermissionDenied,
    #[error("process does not expose an accessible application")]
    NotAccessible,
    #[error("attribute {0} is not available")]
    AttributeUnavailable(Attribute),
    #[error("attribute {0} cannot be written")]
    Unwritable(Attribute),
    #[error("accessibility call failed with status {0}")]
    Failure(i32),
}

/// A lifecycle event referenced something the manager never registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DesyncError {
    #[error("no application registered for pid {0}")]
    UnknownApplication(Pid),
    #[error("no application registered with title '{0}'")]
    UnknownTitle(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("hotkey '{name}' is malformed: '{value}' (expected modifiers followed by a key code)")]
    MalformedHotkey { name: String, value: String },
    #[error("hotkey '{name}' uses unknown modifier '{modifier}'")]
    UnknownModifier { name: String, modifier: String },
    #[error("hotkey '{name}' uses unknown key '{key}'")]
    UnknownKey { name: String, key: String },
    #[error("unknown hotkey action '{0}'")]
    UnknownAction(String),
    #[error("split ratio must be between 0 and 1, got {0}")]
    InvalidRatio(f64),
    #[error("layout {field} must be at most {max}, got {value}", max = crate::config::MAX_SPACING)]
    InvalidSpacing { field: &'static str, value: u32 },
    #[error("minimum size for '{0}' must be non-zero")]
    InvalidMinSize(String),
}
