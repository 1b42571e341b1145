// ferry/examples/custom_hook.rs

use ferry::hooks::parse_options;
use ferry::{hook_fn, ContextData, FerryError, FerryResult, HookContext, HookRegistry, HookSpec, HookType};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

// 1. Options for the custom hook, parsed from its configuration object.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StampOptions {
  field: Option<String>,
  value: String,
}

#[tokio::main]
async fn main() -> Result<(), FerryError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Custom Hook Example ---");

  // 2. Register the hook factory next to the built-ins.
  let registry = HookRegistry::with_builtins();
  registry.register_hook_for_phase("stamp", HookType::After, |config| {
    let options: StampOptions = parse_options("stamp", config)?;
    let path = format!("output.data.{}", options.field.as_deref().unwrap_or("stamp"));
    Ok(hook_fn(move |ctx: ContextData<HookContext>| {
      let path = path.clone();
      let value = options.value.clone();
      async move { ctx.update(|c| c.set_path(&path, json!(value))) }
    }))
  });

  // 3. A bad configuration is rejected at activation time.
  let bad = HookSpec::new().after("stamp", json!({ "value": 42 }));
  if let Err(e) = registry.activate_hooks(&bad) {
    warn!("Activation refused as expected: {}", e);
  }

  // 4. A good one runs alongside a built-in.
  let spec = HookSpec::new()
    .after("stamp", json!({ "field": "source", "value": "example" }))
    .after("transformJson", json!({ "merge": { "version": 2 } }));
  let pipeline = registry.activate_hooks(&spec)?;

  let ctx = ContextData::new(HookContext::new(HookType::After, "task").with_data(json!({ "name": "demo" })));
  let result: FerryResult<()> = pipeline.run_after(ctx.clone()).await;
  result?;

  let data = ctx.with(|c| c.get_path("output.data").cloned());
  info!("Final data: {:?}", data);
  Ok(())
}
