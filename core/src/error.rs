// ferry/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

use crate::core::context::HookType;
use crate::store::StoreRequirement;

/// Broad failure categories. Every [`FerryError`] belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Wrong phase, missing or invalid options, unsupported store capability.
  Configuration,
  /// No store could be derived from any fallback tier.
  StoreResolution,
  /// Read/write/parse failure against a concrete backend.
  BackendIo,
  /// Malformed artifact shape.
  Transform,
  /// Failure raised by a host-provided hook.
  Hook,
}

#[derive(Debug, Error)]
pub enum FerryError {
  #[error("Configuration error for hook '{hook_name}': {message}")]
  Configuration { hook_name: String, message: String },

  #[error("The '{hook_name}' hook should only be used as a '{expected}' hook")]
  WrongPhase { hook_name: String, expected: HookType },

  #[error("The '{hook_name}' hook requires a store with {required} addressing")]
  UnsupportedStore {
    hook_name: String,
    required: StoreRequirement,
  },

  #[error("No hook registered under the name '{hook_name}'")]
  UnknownHook { hook_name: String },

  #[error("Invalid options for hook '{hook_name}': {source}")]
  InvalidOptions {
    hook_name: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("Cannot find store for hook {hook_name}")]
  StoreNotFound { hook_name: String },

  #[error("Unknown store '{id}'")]
  UnknownStore { id: String },

  #[error("Store '{id}' already exists")]
  StoreAlreadyExists { id: String },

  #[error("I/O error during '{operation}' on '{key}': {source}")]
  Io {
    operation: &'static str,
    key: String,
    #[source]
    source: std::io::Error,
  },

  #[error("Key '{key}' not found in store '{store}'")]
  KeyNotFound { store: String, key: String },

  #[error("Key '{key}' is not a relative path inside store '{store}'")]
  InvalidKey { store: String, key: String },

  #[error("Failed to parse {format} artifact '{key}': {message}")]
  Parse {
    format: &'static str,
    key: String,
    message: String,
  },

  #[error("Failed to serialize {format} artifact: {message}")]
  Serialize { format: &'static str, message: String },

  #[error("Template '{template}' failed to render: {source}")]
  Template {
    template: String,
    #[source]
    source: minijinja::Error,
  },

  #[error("Transform error in hook '{hook_name}': {message}")]
  Transform { hook_name: String, message: String },

  #[error("Invalid job configuration: {0}")]
  Config(String),

  #[error("Error in host-provided hook. Source: {source}")]
  Hook {
    #[source]
    source: AnyhowError,
  },
}

impl FerryError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      FerryError::Configuration { .. }
      | FerryError::WrongPhase { .. }
      | FerryError::UnsupportedStore { .. }
      | FerryError::UnknownHook { .. }
      | FerryError::InvalidOptions { .. }
      | FerryError::Config(_) => ErrorKind::Configuration,
      FerryError::StoreNotFound { .. } | FerryError::UnknownStore { .. } | FerryError::StoreAlreadyExists { .. } => {
        ErrorKind::StoreResolution
      }
      FerryError::Io { .. }
      | FerryError::KeyNotFound { .. }
      | FerryError::InvalidKey { .. }
      | FerryError::Parse { .. }
      | FerryError::Serialize { .. }
      | FerryError::Template { .. } => ErrorKind::BackendIo,
      FerryError::Transform { .. } => ErrorKind::Transform,
      FerryError::Hook { .. } => ErrorKind::Hook,
    }
  }

  pub(crate) fn configuration(hook_name: &str, message: impl Into<String>) -> Self {
    FerryError::Configuration {
      hook_name: hook_name.to_string(),
      message: message.into(),
    }
  }

  pub(crate) fn transform(hook_name: &str, message: impl Into<String>) -> Self {
    FerryError::Transform {
      hook_name: hook_name.to_string(),
      message: message.into(),
    }
  }

  pub(crate) fn io(source: std::io::Error, operation: &'static str, key: impl Into<String>) -> Self {
    FerryError::Io {
      operation,
      key: key.into(),
      source,
    }
  }
}

// Host hooks usually bubble up anyhow errors; unwrap them when they already carry a FerryError.
impl From<AnyhowError> for FerryError {
  fn from(err: AnyhowError) -> Self {
    match err.downcast::<FerryError>() {
      Ok(ferry_err) => ferry_err,
      Err(err) => FerryError::Hook { source: err },
    }
  }
}

pub type FerryResult<T, E = FerryError> = std::result::Result<T, E>;
