// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use bytes::Bytes;
use ferry::{
  hook_fn, sync_hook_fn, ContextData, FerryError, FerryResult, HookContext, HookFn, HookRegistry, HookType,
  ObjectClient, WriteParams,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

// --- Common Hook Creators ---

/// Appends `label` to the `output.log` array.
pub fn logging_hook(label: &'static str) -> HookFn {
  sync_hook_fn(move |ctx: &mut HookContext| {
    HOOK_EXEC_COUNTER.fetch_add(1, Ordering::SeqCst);
    if !ctx.get_path("output.log").map_or(false, Value::is_array) {
      ctx.set_path("output.log", json!([]))?;
    }
    if let Some(Value::Array(entries)) = ctx.get_path_mut("output.log") {
      entries.push(json!(label));
    }
    tracing::debug!(target: "test_hooks", hook = label, "executed");
    Ok(())
  })
}

/// Logs like [`logging_hook`] after yielding to the runtime, so ordering holds
/// across await points too.
pub fn async_logging_hook(label: &'static str) -> HookFn {
  let inner = logging_hook(label);
  hook_fn(move |ctx: ContextData<HookContext>| {
    let inner = inner.clone();
    async move {
      tokio::time::sleep(std::time::Duration::from_millis(5)).await;
      inner(ctx).await
    }
  })
}

pub fn failing_hook(label: &'static str) -> HookFn {
  sync_hook_fn(move |_ctx: &mut HookContext| {
    HOOK_EXEC_COUNTER.fetch_add(1, Ordering::SeqCst);
    tracing::warn!(target: "test_hooks", hook = label, "failing");
    Err(anyhow::anyhow!("{} failed", label).into())
  })
}

/// Registry with the built-ins plus `log` (configured by `{ "label": ... }`)
/// and `fail` test hooks.
pub fn test_registry() -> HookRegistry {
  let registry = HookRegistry::with_builtins();
  registry.register_hook("log", |config: &Value| {
    let label = config.get("label").and_then(Value::as_str).unwrap_or("log").to_string();
    let label: &'static str = Box::leak(label.into_boxed_str());
    Ok(logging_hook(label))
  });
  registry.register_hook("fail", |_config: &Value| Ok(failing_hook("fail")));
  registry
}

pub fn logged(ctx: &ContextData<HookContext>) -> Vec<String> {
  ctx.with(|c| {
    c.get_path("output.log")
      .and_then(Value::as_array)
      .map(|entries| entries.iter().filter_map(|e| e.as_str().map(str::to_string)).collect())
      .unwrap_or_default()
  })
}

pub fn after_context(id: &str) -> ContextData<HookContext> {
  ContextData::new(HookContext::new(HookType::After, id))
}

// --- In-memory object storage client for bucket stores ---
#[derive(Debug, Default)]
pub struct MockObjectClient {
  pub objects: Mutex<HashMap<(String, String), Bytes>>,
}

#[async_trait]
impl ObjectClient for MockObjectClient {
  async fn get_object(&self, bucket: &str, key: &str) -> FerryResult<Option<Bytes>> {
    Ok(self.objects.lock().get(&(bucket.to_string(), key.to_string())).cloned())
  }

  async fn put_object(&self, bucket: &str, key: &str, body: Bytes, _params: &WriteParams) -> FerryResult<()> {
    self.objects.lock().insert((bucket.to_string(), key.to_string()), body);
    Ok(())
  }

  async fn head_object(&self, bucket: &str, key: &str) -> FerryResult<bool> {
    Ok(self.objects.lock().contains_key(&(bucket.to_string(), key.to_string())))
  }

  async fn delete_object(&self, bucket: &str, key: &str) -> FerryResult<()> {
    self.objects.lock().remove(&(bucket.to_string(), key.to_string()));
    Ok(())
  }
}

pub fn error_message(err: &FerryError) -> String {
  err.to_string()
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Atomic counter for checking execution counts ---
pub static HOOK_EXEC_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));

pub fn reset_counters() {
  HOOK_EXEC_COUNTER.store(0, Ordering::SeqCst);
}

pub fn hook_exec_count() -> usize {
  HOOK_EXEC_COUNTER.load(Ordering::SeqCst)
}
