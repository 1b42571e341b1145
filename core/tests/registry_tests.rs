// tests/registry_tests.rs
mod common;

use common::*;
use ferry::{ErrorKind, FerryError, HookRegistry, HookSpec, HookType};
use serde_json::{json, Value};
use std::sync::Arc;

#[test]
fn test_registry_activates_custom_hook_instance() {
  setup_tracing();
  let registry = HookRegistry::new();
  let custom = logging_hook("custom");
  let handed_out = custom.clone();
  registry.register_hook("myHook", move |_config: &Value| Ok(handed_out.clone()));

  let spec = HookSpec::new().after("myHook", json!({}));
  let pipeline = registry.activate_hooks(&spec).unwrap();

  let activated = pipeline.hooks(HookType::After).next().expect("one after hook");
  assert!(Arc::ptr_eq(activated, &custom));
  assert!(pipeline.phase(HookType::Before).is_empty());
}

#[test]
fn test_registry_registration_overrides_builtin() {
  setup_tracing();
  let registry = HookRegistry::with_builtins();
  let replacement = logging_hook("replacement");
  let handed_out = replacement.clone();
  registry.register_hook("writeJson", move |_config: &Value| Ok(handed_out.clone()));

  let pipeline = registry
    .activate_hooks(&HookSpec::new().after("writeJson", Value::Null))
    .unwrap();
  assert!(Arc::ptr_eq(pipeline.hooks(HookType::After).next().unwrap(), &replacement));
  // The phase hint goes away with the built-in registration.
  assert_eq!(registry.phase_hint("writeJson"), None);
}

#[test]
fn test_registry_unknown_hook_fails_activation() {
  setup_tracing();
  let registry = test_registry();
  let spec = HookSpec::new().before("log", json!({})).after("noSuchHook", json!({}));

  let err = registry.activate_hooks(&spec).unwrap_err();
  assert!(matches!(err, FerryError::UnknownHook { ref hook_name } if hook_name == "noSuchHook"));
  assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_registry_rejects_malformed_options() {
  setup_tracing();
  let registry = test_registry();
  let spec = HookSpec::new().after("transformJson", json!({ "pick": "not-a-list" }));

  let err = registry.activate_hooks(&spec).unwrap_err();
  assert!(matches!(err, FerryError::InvalidOptions { ref hook_name, .. } if hook_name == "transformJson"));
  assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_registry_keeps_declaration_order() {
  setup_tracing();
  let registry = test_registry();
  let spec = HookSpec::from_json_str(
    r#"{
      "before": { "basicAuth": {}, "log": { "label": "b" } },
      "after": { "transformJson": { "mapping": { "a": "b" } }, "log": {}, "writeJson": {}, "clearData": {} }
    }"#,
  )
  .unwrap();

  let pipeline = registry.activate_hooks(&spec).unwrap();
  assert_eq!(pipeline.names(HookType::Before), vec!["basicAuth", "log"]);
  assert_eq!(
    pipeline.names(HookType::After),
    vec!["transformJson", "log", "writeJson", "clearData"]
  );
}

#[test]
fn test_registry_lists_builtins() {
  let registry = HookRegistry::with_builtins();
  let names = registry.names();
  for expected in [
    "basicAuth",
    "clearData",
    "clearOutputs",
    "convertToGeoJson",
    "mergeJson",
    "readCSV",
    "readJson",
    "readXML",
    "readYAML",
    "transformJson",
    "writeCSV",
    "writeJson",
    "writeTemplate",
    "writeYAML",
  ] {
    assert!(names.iter().any(|n| n == expected), "missing built-in {}", expected);
  }
}

#[test]
fn test_registry_template_without_file_fails_activation() {
  let registry = HookRegistry::with_builtins();
  let err = registry
    .activate_hooks(&HookSpec::new().after("writeTemplate", json!({})))
    .unwrap_err();
  assert!(matches!(err, FerryError::Configuration { ref hook_name, .. } if hook_name == "writeTemplate"));
}
