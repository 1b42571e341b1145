// ferry/src/core/value_path.rs

//! Dotted/bracketed paths into JSON values (`nested.value`, `bbox[0]`, `a[1].b`).
//!
//! Reads never fail: a path that does not resolve yields `None`. Writes create
//! the intermediate containers they need, choosing an array when the next
//! segment is an index and an object otherwise.

use serde_json::{Map, Value};
use std::fmt;
use tracing::{event, Level};

/// Largest array slot a write may create; writes past it are dropped.
pub const MAX_WRITE_INDEX: usize = 1 << 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
  Key(String),
  Index(usize),
}

impl PathSegment {
  fn as_index(&self) -> Option<usize> {
    match self {
      PathSegment::Index(i) => Some(*i),
      PathSegment::Key(k) => k.parse().ok(),
    }
  }

  fn as_key(&self) -> String {
    match self {
      PathSegment::Key(k) => k.clone(),
      PathSegment::Index(i) => i.to_string(),
    }
  }
}

/// Returned by [`ValuePath::resolve`] when a path walks through a scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathError {
  pub path: String,
  pub segment: String,
}

impl fmt::Display for PathError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "path '{}' traverses a scalar at '{}'", self.path, self.segment)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuePath {
  raw: String,
  segments: Vec<PathSegment>,
}

impl ValuePath {
  pub fn parse(raw: &str) -> Self {
    let mut segments = Vec::new();
    let mut buf = String::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
      match c {
        '.' => {
          if !buf.is_empty() {
            segments.push(PathSegment::Key(std::mem::take(&mut buf)));
          }
        }
        '[' => {
          if !buf.is_empty() {
            segments.push(PathSegment::Key(std::mem::take(&mut buf)));
          }
          let mut inner = String::new();
          for c in chars.by_ref() {
            if c == ']' {
              break;
            }
            inner.push(c);
          }
          let inner = inner.trim_matches(|c| c == '"' || c == '\'');
          segments.push(match inner.parse::<usize>() {
            Ok(i) => PathSegment::Index(i),
            Err(_) => PathSegment::Key(inner.to_string()),
          });
        }
        _ => buf.push(c),
      }
    }
    if !buf.is_empty() {
      segments.push(PathSegment::Key(buf));
    }
    ValuePath {
      raw: raw.to_string(),
      segments,
    }
  }

  pub(crate) fn from_segments(segments: &[PathSegment]) -> Self {
    let raw = segments
      .iter()
      .map(|s| match s {
        PathSegment::Key(k) => k.clone(),
        PathSegment::Index(i) => format!("[{}]", i),
      })
      .collect::<Vec<_>>()
      .join(".")
      .replace(".[", "[");
    ValuePath {
      raw,
      segments: segments.to_vec(),
    }
  }

  pub fn as_str(&self) -> &str {
    &self.raw
  }

  pub fn segments(&self) -> &[PathSegment] {
    &self.segments
  }

  pub fn is_empty(&self) -> bool {
    self.segments.is_empty()
  }

  pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
    self.resolve(root).ok().flatten()
  }

  /// Like [`ValuePath::get`], but distinguishes a missing key (`Ok(None)`) from
  /// a path that runs into a string, number or boolean before its last segment.
  pub fn resolve<'a>(&self, root: &'a Value) -> Result<Option<&'a Value>, PathError> {
    let mut current = root;
    for segment in &self.segments {
      current = match current {
        Value::Object(map) => match map.get(&segment.as_key()) {
          Some(v) => v,
          None => return Ok(None),
        },
        Value::Array(items) => match segment.as_index().and_then(|i| items.get(i)) {
          Some(v) => v,
          None => return Ok(None),
        },
        Value::Null => return Ok(None),
        _ => {
          return Err(PathError {
            path: self.raw.clone(),
            segment: segment.as_key(),
          })
        }
      };
    }
    Ok(Some(current))
  }

  pub fn get_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Value> {
    let mut current = root;
    for segment in &self.segments {
      current = match current {
        Value::Object(map) => map.get_mut(&segment.as_key())?,
        Value::Array(items) => items.get_mut(segment.as_index()?)?,
        _ => return None,
      };
    }
    Some(current)
  }

  /// Writes `value` at this path. A path holding an index above
  /// [`MAX_WRITE_INDEX`] writes nothing.
  pub fn set(&self, root: &mut Value, value: Value) {
    if self.segments.iter().any(|s| matches!(s, PathSegment::Index(i) if *i > MAX_WRITE_INDEX)) {
      event!(Level::WARN, path = %self.raw, "Array index out of range, write dropped.");
      return;
    }
    set_in(root, &self.segments, value);
  }

  /// Removes the value at this path and returns it. Array slots are nulled
  /// rather than removed so sibling indexes stay stable.
  pub fn unset(&self, root: &mut Value) -> Option<Value> {
    let (last, parents) = self.segments.split_last()?;
    let parent = ValuePath::from_segments(parents).get_mut(root)?;
    match parent {
      Value::Object(map) => map.shift_remove(&last.as_key()),
      Value::Array(items) => {
        let slot = items.get_mut(last.as_index()?)?;
        Some(std::mem::replace(slot, Value::Null))
      }
      _ => None,
    }
  }
}

impl fmt::Display for ValuePath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.raw)
  }
}

impl From<&str> for ValuePath {
  fn from(raw: &str) -> Self {
    ValuePath::parse(raw)
  }
}

fn set_in(target: &mut Value, segments: &[PathSegment], value: Value) {
  let Some((head, rest)) = segments.split_first() else {
    *target = value;
    return;
  };

  if let Value::Object(map) = &mut *target {
    let child = map.entry(head.as_key()).or_insert(Value::Null);
    set_in(child, rest, value);
    return;
  }
  if let (Value::Array(items), Some(index)) = (&mut *target, head.as_index()) {
    if index > MAX_WRITE_INDEX {
      event!(Level::WARN, index, "Array index out of range, write dropped.");
      return;
    }
    if items.len() <= index {
      items.resize(index + 1, Value::Null);
    }
    set_in(&mut items[index], rest, value);
    return;
  }

  let mut child = Value::Null;
  set_in(&mut child, rest, value);
  *target = match head {
    PathSegment::Index(index) => {
      let mut items = vec![Value::Null; index + 1];
      items[*index] = child;
      Value::Array(items)
    }
    PathSegment::Key(key) => {
      let mut map = Map::new();
      map.insert(key.clone(), child);
      Value::Object(map)
    }
  };
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn parses_dots_and_brackets() {
    let path = ValuePath::parse("layers[0].dimensions.time");
    assert_eq!(
      path.segments(),
      &[
        PathSegment::Key("layers".into()),
        PathSegment::Index(0),
        PathSegment::Key("dimensions".into()),
        PathSegment::Key("time".into()),
      ]
    );
  }

  #[test]
  fn get_reads_nested_values_and_array_slots() {
    let value = json!({ "nested": { "value": 20 }, "bbox": [1, 2, 3, 4] });
    assert_eq!(ValuePath::parse("nested.value").get(&value), Some(&json!(20)));
    assert_eq!(ValuePath::parse("bbox[2]").get(&value), Some(&json!(3)));
    assert_eq!(ValuePath::parse("bbox.3").get(&value), Some(&json!(4)));
    assert_eq!(ValuePath::parse("missing.value").get(&value), None);
  }

  #[test]
  fn resolve_rejects_walking_through_scalars() {
    let value = json!({ "speed": 10 });
    let err = ValuePath::parse("speed.knots").resolve(&value).unwrap_err();
    assert_eq!(err.segment, "knots");
    assert_eq!(ValuePath::parse("other.knots").resolve(&value), Ok(None));
  }

  #[test]
  fn set_creates_arrays_for_index_segments() {
    let mut value = json!({});
    ValuePath::parse("bbox[1]").set(&mut value, json!(35.6));
    assert_eq!(value, json!({ "bbox": [null, 35.6] }));
    ValuePath::parse("a.b").set(&mut value, json!(true));
    assert_eq!(value["a"], json!({ "b": true }));
  }

  #[test]
  fn set_replaces_scalar_intermediates() {
    let mut value = json!({ "nested": 3 });
    ValuePath::parse("nested.value").set(&mut value, json!(1));
    assert_eq!(value, json!({ "nested": { "value": 1 } }));
  }

  #[test]
  fn out_of_range_indexes_are_not_written() {
    let mut value = json!({ "list": [1] });
    ValuePath::parse("a[18446744073709551615]").set(&mut value, json!(1));
    ValuePath::parse("list[99999999]").set(&mut value, json!(2));
    ValuePath::parse("list.99999999").set(&mut value, json!(3));
    assert_eq!(value, json!({ "list": [1] }));
  }

  #[test]
  fn unset_removes_keys_and_nulls_array_slots() {
    let mut value = json!({ "nested": { "value": 20, "keep": 1 }, "list": [1, 2] });
    assert_eq!(ValuePath::parse("nested.value").unset(&mut value), Some(json!(20)));
    assert_eq!(ValuePath::parse("list[0]").unset(&mut value), Some(json!(1)));
    assert_eq!(value, json!({ "nested": { "keep": 1 }, "list": [null, 2] }));
    assert_eq!(ValuePath::parse("nested.absent.deeper").unset(&mut value), None);
  }
}
