// ferry/src/hooks/xml.rs

//! `readXML`: parses an XML document into a JSON mapping.
//!
//! The mapping follows the usual "no forced arrays" convention:
//! - the document becomes `{ <root name>: <root value> }`;
//! - an element without attributes or children becomes its text (`""` when empty);
//! - otherwise it becomes an object where attributes sit under `"$"`, non-blank
//!   text under `"_"` and children under their tag names;
//! - a child tag becomes an array only when it actually repeats.

use crate::core::hook::{hook_fn, HookFn};
use crate::error::FerryError;
use crate::hooks::{read_artifact, store_value};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{event, Level};

pub const READ_XML: &str = "readXML";

const ATTRIBUTES_KEY: &str = "$";
const TEXT_KEY: &str = "_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReadXmlOptions {
  pub data_path: Option<String>,
  pub store_path: Option<String>,
}

/// Reads the task's XML document from a path- or buffer-addressable store.
pub fn read_xml(options: ReadXmlOptions) -> HookFn {
  let options = Arc::new(options);
  hook_fn(move |ctx_data| {
    let options = options.clone();
    async move {
      let (key, bytes) = read_artifact(READ_XML, &ctx_data, options.store_path.as_deref(), &[".xml"]).await?;
      let json = std::str::from_utf8(&bytes)
        .map_err(|e| format!("document is not valid UTF-8: {}", e))
        .and_then(xml_to_json)
        .map_err(|message| FerryError::Parse {
          format: "XML",
          key,
          message,
        })?;
      store_value(&ctx_data, options.data_path.as_deref(), json)
    }
  })
}

#[derive(Debug, Default)]
struct Element {
  name: String,
  attributes: Map<String, Value>,
  children: Map<String, Value>,
  text: String,
}

impl Element {
  fn open(start: &BytesStart<'_>) -> Result<Self, String> {
    let mut attributes = Map::new();
    for attribute in start.attributes() {
      let attribute = attribute.map_err(|e| e.to_string())?;
      let value = attribute.unescape_value().map_err(|e| e.to_string())?;
      attributes.insert(
        String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
        Value::String(value.into_owned()),
      );
    }
    Ok(Element {
      name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
      attributes,
      ..Default::default()
    })
  }

  fn add_child(&mut self, name: String, value: Value) {
    match self.children.get_mut(&name) {
      Some(Value::Array(repeated)) => repeated.push(value),
      Some(existing) => {
        let first = existing.take();
        *existing = Value::Array(vec![first, value]);
      }
      None => {
        self.children.insert(name, value);
      }
    }
  }

  fn close(self) -> (String, Value) {
    if self.attributes.is_empty() && self.children.is_empty() {
      return (self.name, Value::String(self.text));
    }
    let mut object = Map::new();
    if !self.attributes.is_empty() {
      object.insert(ATTRIBUTES_KEY.to_string(), Value::Object(self.attributes));
    }
    if !self.text.trim().is_empty() {
      object.insert(TEXT_KEY.to_string(), Value::String(self.text));
    }
    object.extend(self.children);
    (self.name, Value::Object(object))
  }
}

/// Converts an XML document into its JSON mapping.
pub fn xml_to_json(xml: &str) -> Result<Value, String> {
  let mut reader = Reader::from_str(xml);
  let mut stack: Vec<Element> = Vec::new();

  loop {
    match reader.read_event().map_err(|e| format!("at position {}: {}", reader.buffer_position(), e))? {
      Event::Start(start) => stack.push(Element::open(&start)?),
      Event::Empty(start) => {
        let (name, value) = Element::open(&start)?.close();
        match stack.last_mut() {
          Some(parent) => parent.add_child(name, value),
          None => return Ok(root(name, value)),
        }
      }
      Event::Text(text) => {
        if let Some(current) = stack.last_mut() {
          current.text.push_str(&text.unescape().map_err(|e| e.to_string())?);
        }
      }
      Event::CData(data) => {
        if let Some(current) = stack.last_mut() {
          current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
        }
      }
      Event::End(_) => {
        let element = stack.pop().ok_or_else(|| "unbalanced closing tag".to_string())?;
        let (name, value) = element.close();
        match stack.last_mut() {
          Some(parent) => parent.add_child(name, value),
          None => {
            event!(Level::TRACE, root = %name, "XML document converted.");
            return Ok(root(name, value));
          }
        }
      }
      Event::Eof => return Err("document has no root element".to_string()),
      _ => {}
    }
  }
}

fn root(name: String, value: Value) -> Value {
  let mut document = Map::new();
  document.insert(name, value);
  Value::Object(document)
}
