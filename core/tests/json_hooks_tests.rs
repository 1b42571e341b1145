// tests/json_hooks_tests.rs
mod common;

use common::*;
use ferry::hooks::geojson::{convert_to_geojson, ConvertToGeoJsonOptions};
use ferry::hooks::json::{
  merge_json, read_json, transform_json, write_json, MergeJsonOptions, ReadJsonOptions, TransformJsonOptions,
  WriteJsonOptions,
};
use ferry::hooks::utils::{clear_data, clear_outputs, ClearDataOptions, ClearOutputsOptions};
use ferry::{ContextData, ErrorKind, FsStore, HookContext, HookType, Store, StoreHandle};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

fn fixtures() -> StoreHandle {
  Arc::new(FsStore::new(
    "fixtures",
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("data"),
  ))
}

fn transform(options: Value) -> TransformJsonOptions {
  serde_json::from_value(options).unwrap()
}

#[tokio::test]
async fn test_write_then_read_json_round_trip() {
  setup_tracing();
  let dir = tempfile::tempdir().unwrap();
  let store: StoreHandle = Arc::new(FsStore::create("output", dir.path()).await.unwrap());
  let ctx = ContextData::new(
    HookContext::new(HookType::After, "x")
      .with_store(store.clone())
      .with_data(json!([{ "a": 1 }])),
  );

  write_json(WriteJsonOptions::default())(ctx.clone()).await.unwrap();
  assert!(dir.path().join("x.json").exists());
  {
    let guard = ctx.read();
    assert_eq!(guard.outputs.len(), 1);
    assert_eq!(guard.outputs[0].id, "x.json");
    assert_eq!(guard.outputs[0].kind, None);
  }

  clear_data(ClearDataOptions::default())(ctx.clone()).await.unwrap();
  assert!(ctx.read().get_path("output.data").is_none());

  read_json(ReadJsonOptions::default())(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().get_path("output.data"), Some(&json!([{ "a": 1 }])));

  clear_outputs(ClearOutputsOptions::default())(ctx.clone()).await.unwrap();
  assert!(!dir.path().join("x.json").exists());
  assert!(ctx.read().outputs.is_empty());
}

#[tokio::test]
async fn test_write_json_records_output_type_and_custom_path() {
  setup_tracing();
  let dir = tempfile::tempdir().unwrap();
  let store: StoreHandle = Arc::new(FsStore::create("output", dir.path()).await.unwrap());
  let ctx = ContextData::new(
    HookContext::new(HookType::After, "report")
      .with_store(store.clone())
      .with_output(json!({ "id": "report", "summary": { "count": 3 } })),
  );
  let options = WriteJsonOptions {
    data_path: Some("output.summary".to_string()),
    output_type: Some("intermediate".to_string()),
    ..Default::default()
  };
  write_json(options)(ctx.clone()).await.unwrap();

  let written: Value = serde_json::from_slice(&store.read("report.json").await.unwrap()).unwrap();
  assert_eq!(written, json!({ "count": 3 }));
  assert_eq!(ctx.read().outputs[0].kind.as_deref(), Some("intermediate"));
}

#[tokio::test]
async fn test_read_json_uses_id_with_extension_verbatim() {
  setup_tracing();
  let ctx = ContextData::new(
    HookContext::new(HookType::After, "flights.json")
      .with_store(fixtures()),
  );
  read_json(ReadJsonOptions::default())(ctx.clone()).await.unwrap();
  let count = ctx.with(|c| c.get_path("output.data").and_then(Value::as_array).map(Vec::len));
  assert_eq!(count, Some(4));
}

#[tokio::test]
async fn test_read_json_missing_artifact_is_backend_error() {
  setup_tracing();
  let ctx = ContextData::new(HookContext::new(HookType::After, "absent").with_store(fixtures()));
  let err = read_json(ReadJsonOptions::default())(ctx).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::BackendIo);
}

#[tokio::test]
async fn test_transform_moves_nested_value_and_picks() {
  setup_tracing();
  let ctx = ContextData::new(
    HookContext::new(HookType::After, "t").with_data(json!([{ "nested": { "value": 20 }, "other": 1 }])),
  );
  let hook = transform_json(transform(json!({ "mapping": { "nested.value": "value" }, "pick": ["value"] }))).unwrap();
  hook(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().get_path("output.data"), Some(&json!([{ "value": 20 }])));
}

#[tokio::test]
async fn test_transform_maps_nested_value_and_picks_listed_fields() {
  setup_tracing();
  let ctx = ContextData::new(HookContext::new(HookType::After, "json").with_data(json!([
    { "nested": { "value": 20 }, "speed": 10, "time": "2018-05-31 13:25:13.431" }
  ])));
  let hook = transform_json(transform(json!({
    "mapping": { "nested.value": "value" },
    "pick": ["speed", "time", "value"]
  })))
  .unwrap();
  hook(ctx.clone()).await.unwrap();

  let data = ctx.with(|c| c.get_path("output.data").cloned().unwrap());
  let element = data[0].as_object().unwrap();
  assert_eq!(element["value"], json!(20));
  assert!(!element.contains_key("nested"));
  let mut keys: Vec<&str> = element.keys().map(String::as_str).collect();
  keys.sort();
  assert_eq!(keys, vec!["speed", "time", "value"]);
}

#[tokio::test]
async fn test_transform_chained_mapping_erases_every_source() {
  setup_tracing();
  let ctx = ContextData::new(HookContext::new(HookType::After, "t").with_data(json!([{ "a": 1, "b": 2 }])));
  let hook = transform_json(transform(json!({ "mapping": { "a": "b", "b": "c" } }))).unwrap();
  hook(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().get_path("output.data"), Some(&json!([{ "c": 1 }])));
}

#[tokio::test]
async fn test_transform_full_option_set() {
  setup_tracing();
  let ctx = ContextData::new(HookContext::new(HookType::After, "json").with_data(json!({
    "first": { "speed": 10, "nested": { "value": 20 }, "notPicked": "first", "omitted": "first" },
    "second": { "speed": 30, "nested": { "value": 40 }, "notPicked": "second", "omitted": "second" }
  })));
  let hook = transform_json(transform(json!({
    "toArray": true,
    "mapping": { "nested.value": "value" },
    "pick": ["speed", "value", "omitted"],
    "omit": ["omitted"],
    "merge": { "new": "new" }
  })))
  .unwrap();
  hook(ctx.clone()).await.unwrap();

  let data = ctx.with(|c| c.get_path("output.data").cloned().unwrap());
  assert_eq!(
    data,
    json!([
      { "speed": 10, "value": 20, "new": "new" },
      { "speed": 30, "value": 40, "new": "new" }
    ])
  );
}

#[tokio::test]
async fn test_transform_keeps_single_object_shape() {
  setup_tracing();
  let ctx = ContextData::new(HookContext::new(HookType::After, "t").with_data(json!({ "a": { "b": 1 } })));
  let hook = transform_json(transform(json!({ "mapping": { "a.b": "bbox[0]" } }))).unwrap();
  hook(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().get_path("output.data"), Some(&json!({ "a": {}, "bbox": [1] })));
}

#[tokio::test]
async fn test_transform_rejects_scalar_artifact() {
  setup_tracing();
  let ctx = ContextData::new(HookContext::new(HookType::After, "t").with_data(json!("text")));
  let hook = transform_json(transform(json!({ "mapping": { "a": "b" } }))).unwrap();
  let err = hook(ctx).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Transform);
}

#[tokio::test]
async fn test_geojson_drops_unusable_positions() {
  setup_tracing();
  let ctx = ContextData::new(
    HookContext::new(HookType::After, "flights.json").with_store(fixtures()),
  );
  read_json(ReadJsonOptions::default())(ctx.clone()).await.unwrap();
  convert_to_geojson(ConvertToGeoJsonOptions::default())(ctx.clone()).await.unwrap();

  let collection = ctx.with(|c| c.get_path("output.data").cloned().unwrap());
  assert_eq!(collection["type"], "FeatureCollection");
  let features = collection["features"].as_array().unwrap();
  assert_eq!(features.len(), 2);
  assert_eq!(features[0]["geometry"]["coordinates"], json!([1.44, 43.6, 10000.0]));
  assert_eq!(features[0]["properties"]["callsign"], "AFR123");
  // Non-numeric altitude falls back to 0.
  assert_eq!(features[1]["geometry"]["coordinates"], json!([2.35, 48.85, 0.0]));
}

#[tokio::test]
async fn test_geojson_default_field_names() {
  setup_tracing();
  let ctx = ContextData::new(HookContext::new(HookType::After, "t").with_data(json!([
    { "longitude": 1.5, "latitude": 43.6, "altitude": 100, "name": "kept" },
    { "longitude": 1.5, "latitude": 0, "altitude": 100, "name": "equator" }
  ])));
  convert_to_geojson(ConvertToGeoJsonOptions::default())(ctx.clone()).await.unwrap();

  let features = ctx.with(|c| c.get_path("output.data.features").cloned().unwrap());
  assert_eq!(features.as_array().map(Vec::len), Some(1));
  assert_eq!(
    features[0],
    json!({
      "type": "Feature",
      "geometry": { "type": "Point", "coordinates": [1.5, 43.6, 100.0] },
      "properties": { "longitude": 1.5, "latitude": 43.6, "altitude": 100, "name": "kept" }
    })
  );
}

#[tokio::test]
async fn test_geojson_custom_coordinate_paths() {
  setup_tracing();
  let ctx = ContextData::new(HookContext::new(HookType::After, "t").with_data(json!([
    { "position": { "x": 5, "y": 6 } },
    { "position": { "x": 5, "y": 0 } }
  ])));
  let options = ConvertToGeoJsonOptions {
    longitude: "position.x".to_string(),
    latitude: "position.y".to_string(),
    ..Default::default()
  };
  convert_to_geojson(options)(ctx.clone()).await.unwrap();
  let features = ctx.with(|c| c.get_path("output.data.features").cloned().unwrap());
  assert_eq!(features.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_merge_json_combines_results_in_order() {
  setup_tracing();
  let ctx = ContextData::new(HookContext::new(HookType::After, "merge").with_output(json!([
    { "id": "a", "data": { "layers": { "roads": { "visible": true } }, "version": 1 } },
    { "id": "b", "data": { "layers": { "rivers": { "visible": false } }, "version": 2 } },
    { "id": "c" }
  ])));
  merge_json(MergeJsonOptions::default())(ctx.clone()).await.unwrap();

  assert_eq!(
    ctx.read().output,
    json!({
      "data": {
        "layers": { "roads": { "visible": true }, "rivers": { "visible": false } },
        "version": 2
      }
    })
  );
}

#[tokio::test]
async fn test_merge_json_requires_result_array() {
  setup_tracing();
  let ctx = ContextData::new(HookContext::new(HookType::After, "merge").with_data(json!({})));
  let err = merge_json(MergeJsonOptions::default())(ctx).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Transform);
}
