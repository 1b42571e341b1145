// ferry/examples/json_pipeline.rs

use ferry::{ContextData, FerryError, HookContext, HookRegistry, HookSpec, HookType, MemoryStore, Store};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), FerryError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- JSON Pipeline Example ---");

  // 1. Declare the after hooks the way a job file would.
  let spec = HookSpec::from_json_str(
    r#"{
      "after": {
        "transformJson": {
          "mapping": { "position.lon": "longitude", "position.lat": "latitude" },
          "omit": ["internal"]
        },
        "convertToGeoJson": {},
        "writeJson": { "outputType": "final" }
      }
    }"#,
  )?;

  // 2. Bind them against the built-in hooks.
  let registry = HookRegistry::with_builtins();
  let pipeline = registry.activate_hooks(&spec)?;
  info!(hooks = ?pipeline.names(HookType::After), "Pipeline activated.");

  // 3. Prepare a task context with an in-memory output store.
  let store = Arc::new(MemoryStore::new("memory"));
  let ctx = ContextData::new(HookContext::new(HookType::Before, "flights").with_store(store.clone()));

  // 4. Run: before hooks, the primary action, then after hooks.
  pipeline
    .run(ctx.clone(), |ctx: ContextData<HookContext>| async move {
      // Stand-in for the fetch a real task would perform.
      ctx.update(|c| {
        c.set_path(
          "output.data",
          json!([
            { "callsign": "AFR123", "position": { "lon": 1.44, "lat": 43.6 }, "altitude": 10000, "internal": true },
            { "callsign": "GROUND", "position": { "lon": 0, "lat": 0 }, "internal": true }
          ]),
        )
      })
    })
    .await?;

  // 5. Inspect what was written.
  let written = store.read("flights.json").await?;
  info!("Written artifact: {}", String::from_utf8_lossy(&written));
  for output in ctx.read().outputs.iter() {
    info!(id = %output.id, kind = ?output.kind, "Output recorded.");
  }

  Ok(())
}
