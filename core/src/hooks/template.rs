// ferry/src/hooks/template.rs

use crate::core::context::HookType;
use crate::core::hook::{hook_fn, HookFn};
use crate::error::{FerryError, FerryResult};
use crate::hooks::{load_value, write_artifact};
use crate::store::{StoreLookup, StoreRequirement, WriteParams};
use bytes::Bytes;
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::{event, Level};

pub const WRITE_TEMPLATE: &str = "writeTemplate";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WriteTemplateOptions {
  pub data_path: Option<String>,
  pub store_path: Option<String>,
  pub template_store_path: Option<String>,
  /// Template name, relative to the template store.
  pub template_file: Option<String>,
  pub output_type: Option<String>,
}

/// Renders `templateFile` from the template store with the artifact and writes
/// the result as `<input.id><template extension>`.
///
/// Both stores must be path-addressable. Templates use Jinja syntax; an object
/// artifact exposes its keys as top-level variables, any other artifact is
/// available as `data`.
pub fn write_template(options: WriteTemplateOptions) -> FerryResult<HookFn> {
  let template_file = options
    .template_file
    .clone()
    .ok_or_else(|| FerryError::configuration(WRITE_TEMPLATE, "missing 'templateFile' option"))?;
  let extension = Path::new(&template_file)
    .extension()
    .map(|ext| format!(".{}", ext.to_string_lossy()))
    .unwrap_or_default();
  let options = Arc::new(options);
  let template_file = Arc::new(template_file);
  let extension = Arc::new(extension);

  Ok(hook_fn(move |ctx_data| {
    let options = options.clone();
    let template_file = template_file.clone();
    let extension = extension.clone();
    async move {
      let id = ctx_data.with(|ctx| {
        ctx.ensure_phase(WRITE_TEMPLATE, HookType::After)?;
        ctx.require_id(WRITE_TEMPLATE)
      })?;
      let store = StoreLookup::new(WRITE_TEMPLATE)
        .config_path(options.store_path.as_deref())
        .require(StoreRequirement::Path)
        .resolve(&ctx_data)
        .await?;
      let template_store = StoreLookup::template(WRITE_TEMPLATE)
        .config_path(options.template_store_path.as_deref())
        .require(StoreRequirement::Path)
        .resolve(&ctx_data)
        .await?;

      event!(Level::DEBUG, template = %template_file, %id, "Rendering template.");
      let source = template_store.read(&template_file).await?;
      let source = String::from_utf8_lossy(&source);
      let data = ctx_data.with(|ctx| load_value(ctx, options.data_path.as_deref()));
      let rendered = render(&template_file, &source, data)?;

      write_artifact(
        WRITE_TEMPLATE,
        &ctx_data,
        &store,
        format!("{}{}", id, extension),
        Bytes::from(rendered),
        &WriteParams::default(),
        options.output_type.clone(),
      )
      .await
    }
  }))
}

fn render(name: &str, source: &str, data: Value) -> FerryResult<String> {
  let context = match data {
    Value::Object(_) => data,
    other => json!({ "data": other }),
  };
  Environment::new()
    .render_str(source, context)
    .map_err(|source| FerryError::Template {
      template: name.to_string(),
      source,
    })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn object_keys_are_template_variables() {
    let out = render("t.txt", "{{ name }}: {{ items | length }}", json!({ "name": "x", "items": [1, 2] })).unwrap();
    assert_eq!(out, "x: 2");
  }

  #[test]
  fn arrays_are_exposed_as_data() {
    let out = render("t.csv", "{% for v in data %}{{ v }};{% endfor %}", json!([1, 2])).unwrap();
    assert_eq!(out, "1;2;");
  }

  #[test]
  fn missing_template_file_is_a_configuration_error() {
    let err = write_template(WriteTemplateOptions::default()).err().unwrap();
    assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
  }
}
