// ferry/src/hooks/utils.rs

//! Housekeeping hooks: `clearData`, `clearOutputs` and `basicAuth`.

use crate::core::context::HookType;
use crate::core::hook::{hook_fn, sync_hook_fn, HookFn};
use crate::error::FerryError;
use crate::hooks::DEFAULT_DATA_PATH;
use crate::store::StoreLookup;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{event, Level};

pub const CLEAR_DATA: &str = "clearData";
pub const CLEAR_OUTPUTS: &str = "clearOutputs";
pub const BASIC_AUTH: &str = "basicAuth";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClearDataOptions {
  pub data_path: Option<String>,
}

/// Drops the artifact at the data path, freeing it once it has been persisted.
pub fn clear_data(options: ClearDataOptions) -> HookFn {
  let data_path = options.data_path.unwrap_or_else(|| DEFAULT_DATA_PATH.to_string());
  sync_hook_fn(move |ctx| {
    if ctx.unset_path(&data_path).is_some() {
      event!(Level::DEBUG, data_path = %data_path, "Artifact cleared.");
    }
    Ok(())
  })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClearOutputsOptions {
  pub store_path: Option<String>,
}

/// Removes every artifact listed in the output manifest from the resolved
/// store, then empties the manifest.
pub fn clear_outputs(options: ClearOutputsOptions) -> HookFn {
  let options = Arc::new(options);
  hook_fn(move |ctx_data| {
    let options = options.clone();
    async move {
      ctx_data.with(|ctx| ctx.ensure_phase(CLEAR_OUTPUTS, HookType::After))?;
      let store = StoreLookup::new(CLEAR_OUTPUTS)
        .config_path(options.store_path.as_deref())
        .resolve(&ctx_data)
        .await?;
      let keys: Vec<String> = ctx_data.with(|ctx| ctx.outputs.iter().map(|o| o.id.clone()).collect());
      for key in &keys {
        store.remove(key).await?;
      }
      event!(Level::DEBUG, store_id = store.id(), removed = keys.len(), "Outputs cleared.");
      ctx_data.update(|ctx| ctx.outputs.clear());
      Ok(())
    }
  })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BasicAuthOptions {
  /// Header the credentials are written to.
  #[serde(rename = "type")]
  pub header: String,
}

impl Default for BasicAuthOptions {
  fn default() -> Self {
    BasicAuthOptions {
      header: "Authorization".to_string(),
    }
  }
}

/// Turns `input.options.auth.{user,password}` into a basic authentication
/// header under `input.options.headers`. Does nothing when no credentials are
/// configured.
pub fn basic_auth(options: BasicAuthOptions) -> HookFn {
  sync_hook_fn(move |ctx| {
    ctx.ensure_phase(BASIC_AUTH, HookType::Before)?;
    let Some(auth) = ctx.get_path("input.options.auth") else {
      event!(Level::DEBUG, "No credentials configured, skipping.");
      return Ok(());
    };
    let credential = |field: &str| auth.get(field).and_then(Value::as_str).unwrap_or_default().to_string();
    let (user, password) = (credential("user"), credential("password"));
    if user.is_empty() {
      return Err(FerryError::configuration(BASIC_AUTH, "'input.options.auth.user' is missing"));
    }
    let encoded = STANDARD.encode(format!("{}:{}", user, password));
    let header = format!("input.options.headers.{}", options.header);
    ctx.set_path(&header, Value::String(format!("Basic {}", encoded)))
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::context::HookContext;
  use crate::core::context_data::ContextData;
  use serde_json::json;

  #[tokio::test]
  async fn basic_auth_sets_header() {
    let ctx = ContextData::new(
      HookContext::new(HookType::Before, "task")
        .with_input(json!({ "id": "task", "options": { "auth": { "user": "Aladdin", "password": "open sesame" } } })),
    );
    basic_auth(BasicAuthOptions::default())(ctx.clone()).await.unwrap();
    let header = ctx.with(|c| c.get_path("input.options.headers.Authorization").cloned());
    assert_eq!(header, Some(json!("Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==")));
  }

  #[tokio::test]
  async fn clear_data_removes_artifact() {
    let ctx = ContextData::new(HookContext::new(HookType::After, "task").with_data(json!([1, 2])));
    clear_data(ClearDataOptions::default())(ctx.clone()).await.unwrap();
    assert!(ctx.with(|c| c.get_path("output.data").is_none()));
  }
}
