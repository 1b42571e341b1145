// ferry/src/hooks/geojson.rs

use crate::core::context::HookType;
use crate::core::hook::{hook_fn, HookFn};
use crate::core::value_path::ValuePath;
use crate::error::FerryError;
use crate::hooks::DEFAULT_DATA_PATH;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{event, Level};

pub const CONVERT_TO_GEOJSON: &str = "convertToGeoJson";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConvertToGeoJsonOptions {
  pub data_path: Option<String>,
  pub longitude: String,
  pub latitude: String,
  pub altitude: String,
}

impl Default for ConvertToGeoJsonOptions {
  fn default() -> Self {
    ConvertToGeoJsonOptions {
      data_path: None,
      longitude: "longitude".to_string(),
      latitude: "latitude".to_string(),
      altitude: "altitude".to_string(),
    }
  }
}

/// Replaces the artifact with a `FeatureCollection` holding one point feature
/// per element that has a usable position.
///
/// Coordinates are coerced to numbers the way loosely typed feeds expect:
/// numeric strings parse, booleans are 1 or 0, missing values and `null` are 0
/// and anything else is not a number. Elements whose latitude or longitude is
/// 0 or not a number are dropped. The element itself becomes the feature's
/// properties.
pub fn convert_to_geojson(options: ConvertToGeoJsonOptions) -> HookFn {
  let paths = Arc::new(CoordinatePaths {
    longitude: ValuePath::parse(&options.longitude),
    latitude: ValuePath::parse(&options.latitude),
    altitude: ValuePath::parse(&options.altitude),
  });
  let data_path = Arc::new(options.data_path.unwrap_or_else(|| DEFAULT_DATA_PATH.to_string()));

  hook_fn(move |ctx_data| {
    let paths = paths.clone();
    let data_path = data_path.clone();
    async move {
      ctx_data.update(|ctx| {
        ctx.ensure_phase(CONVERT_TO_GEOJSON, HookType::After)?;
        let elements: Vec<Value> = match ctx.get_path(&data_path) {
          None | Some(Value::Null) => Vec::new(),
          Some(Value::Array(items)) => items.clone(),
          Some(object @ Value::Object(_)) => vec![object.clone()],
          Some(other) => {
            return Err(FerryError::transform(
              CONVERT_TO_GEOJSON,
              format!("artifact must be an object or an array, got {}", other),
            ))
          }
        };
        let total = elements.len();
        let features: Vec<Value> = elements.into_iter().filter_map(|e| paths.feature(e)).collect();
        event!(Level::DEBUG, total, kept = features.len(), "Converted elements to GeoJSON features.");
        ctx.set_path(&data_path, json!({ "type": "FeatureCollection", "features": features }))
      })
    }
  })
}

#[derive(Debug)]
struct CoordinatePaths {
  longitude: ValuePath,
  latitude: ValuePath,
  altitude: ValuePath,
}

impl CoordinatePaths {
  fn feature(&self, element: Value) -> Option<Value> {
    let lon = coerce_number(self.longitude.get(&element));
    let lat = coerce_number(self.latitude.get(&element));
    if !is_usable(lon) || !is_usable(lat) {
      return None;
    }
    let alt = coerce_number(self.altitude.get(&element));
    let alt = if alt.is_nan() { 0.0 } else { alt };
    Some(json!({
      "type": "Feature",
      "geometry": { "type": "Point", "coordinates": [lon, lat, alt] },
      "properties": element,
    }))
  }
}

fn is_usable(coordinate: f64) -> bool {
  coordinate != 0.0 && !coordinate.is_nan()
}

fn coerce_number(value: Option<&Value>) -> f64 {
  match value {
    None | Some(Value::Null) => 0.0,
    Some(Value::Bool(b)) => {
      if *b {
        1.0
      } else {
        0.0
      }
    }
    Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
    Some(Value::String(s)) => {
      let trimmed = s.trim();
      if trimmed.is_empty() {
        0.0
      } else {
        trimmed.parse().unwrap_or(f64::NAN)
      }
    }
    Some(_) => f64::NAN,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn default_paths() -> CoordinatePaths {
    let options = ConvertToGeoJsonOptions::default();
    CoordinatePaths {
      longitude: ValuePath::parse(&options.longitude),
      latitude: ValuePath::parse(&options.latitude),
      altitude: ValuePath::parse(&options.altitude),
    }
  }

  #[test]
  fn coercion_follows_loose_numeric_rules() {
    assert_eq!(coerce_number(Some(&json!("43.5"))), 43.5);
    assert_eq!(coerce_number(Some(&json!(true))), 1.0);
    assert_eq!(coerce_number(None), 0.0);
    assert_eq!(coerce_number(Some(&json!(""))), 0.0);
    assert!(coerce_number(Some(&json!("north"))).is_nan());
  }

  #[test]
  fn zero_latitude_is_dropped() {
    let paths = default_paths();
    assert!(paths.feature(json!({ "longitude": 1.0, "latitude": 0 })).is_none());
    assert!(paths.feature(json!({ "longitude": "x", "latitude": 2 })).is_none());
  }

  #[test]
  fn feature_keeps_element_as_properties() {
    let paths = default_paths();
    let feature = paths.feature(json!({ "longitude": "1.5", "latitude": 2, "name": "a" })).unwrap();
    assert_eq!(feature["geometry"]["coordinates"], json!([1.5, 2.0, 0.0]));
    assert_eq!(feature["properties"]["name"], "a");
  }
}
