// ferry/src/hooks/csv.rs

//! `readCSV` and `writeCSV`.

use crate::core::context::HookType;
use crate::core::hook::{hook_fn, HookFn};
use crate::core::value_path::ValuePath;
use crate::error::FerryError;
use crate::hooks::{load_value, read_artifact, store_value, write_artifact};
use crate::store::{StoreLookup, WriteParams};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::sync::Arc;
use tracing::{event, Level};

pub const READ_CSV: &str = "readCSV";
pub const WRITE_CSV: &str = "writeCSV";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReadCsvOptions {
  pub data_path: Option<String>,
  pub store_path: Option<String>,
  /// First row names the columns; records become objects keyed by them.
  pub headers: bool,
  /// Numeric and boolean cells are converted instead of kept as strings.
  pub dynamic_typing: bool,
  pub delimiter: char,
}

impl Default for ReadCsvOptions {
  fn default() -> Self {
    ReadCsvOptions {
      data_path: None,
      store_path: None,
      headers: true,
      dynamic_typing: false,
      delimiter: ',',
    }
  }
}

pub fn read_csv(options: ReadCsvOptions) -> HookFn {
  let options = Arc::new(options);
  hook_fn(move |ctx_data| {
    let options = options.clone();
    async move {
      let (key, bytes) = read_artifact(READ_CSV, &ctx_data, options.store_path.as_deref(), &[".csv"]).await?;
      let rows = parse_csv(&bytes, &options).map_err(|e| FerryError::Parse {
        format: "CSV",
        key,
        message: e.to_string(),
      })?;
      event!(Level::DEBUG, rows = rows.len(), "CSV parsed.");
      store_value(&ctx_data, options.data_path.as_deref(), Value::Array(rows))
    }
  })
}

fn parse_csv(bytes: &[u8], options: &ReadCsvOptions) -> Result<Vec<Value>, ::csv::Error> {
  let mut reader = ::csv::ReaderBuilder::new()
    .has_headers(options.headers)
    .delimiter(options.delimiter as u8)
    .flexible(true)
    .from_reader(bytes);
  let cell = |raw: &str| {
    if options.dynamic_typing {
      typed_cell(raw)
    } else {
      Value::String(raw.to_string())
    }
  };

  let headers = if options.headers {
    Some(reader.headers()?.clone())
  } else {
    None
  };
  let mut rows = Vec::new();
  for record in reader.records() {
    let record = record?;
    let row = match &headers {
      Some(headers) => Value::Object(
        headers
          .iter()
          .zip(record.iter())
          .map(|(name, raw)| (name.to_string(), cell(raw)))
          .collect::<Map<String, Value>>(),
      ),
      None => Value::Array(record.iter().map(cell).collect()),
    };
    rows.push(row);
  }
  Ok(rows)
}

fn typed_cell(raw: &str) -> Value {
  let trimmed = raw.trim();
  match trimmed {
    "" => return Value::Null,
    "true" | "TRUE" => return Value::Bool(true),
    "false" | "FALSE" => return Value::Bool(false),
    _ => {}
  }
  if let Ok(int) = trimmed.parse::<i64>() {
    return Value::Number(int.into());
  }
  trimmed
    .parse::<f64>()
    .ok()
    .and_then(Number::from_f64)
    .map(Value::Number)
    .unwrap_or_else(|| Value::String(raw.to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WriteCsvOptions {
  pub data_path: Option<String>,
  pub store_path: Option<String>,
  pub output_type: Option<String>,
  pub storage_options: WriteParams,
  /// Column paths; defaults to the keys of the first record.
  pub fields: Option<Vec<String>>,
  pub delimiter: char,
}

impl Default for WriteCsvOptions {
  fn default() -> Self {
    WriteCsvOptions {
      data_path: None,
      store_path: None,
      output_type: None,
      storage_options: WriteParams::default(),
      fields: None,
      delimiter: ',',
    }
  }
}

/// Writes the artifact's records as `<input.id>.csv` with a header row.
pub fn write_csv(options: WriteCsvOptions) -> HookFn {
  let options = Arc::new(options);
  hook_fn(move |ctx_data| {
    let options = options.clone();
    async move {
      let id = ctx_data.with(|ctx| {
        ctx.ensure_phase(WRITE_CSV, HookType::After)?;
        ctx.require_id(WRITE_CSV)
      })?;
      let store = StoreLookup::new(WRITE_CSV)
        .config_path(options.store_path.as_deref())
        .resolve(&ctx_data)
        .await?;
      let records = match ctx_data.with(|ctx| load_value(ctx, options.data_path.as_deref())) {
        Value::Array(items) => items,
        single => vec![single],
      };
      let bytes = render_csv(&records, &options).map_err(|message| FerryError::Serialize { format: "CSV", message })?;
      let mut params = options.storage_options.clone();
      params.content_type.get_or_insert_with(|| "text/csv".to_string());
      write_artifact(
        WRITE_CSV,
        &ctx_data,
        &store,
        format!("{}.csv", id),
        Bytes::from(bytes),
        &params,
        options.output_type.clone(),
      )
      .await
    }
  })
}

fn render_csv(records: &[Value], options: &WriteCsvOptions) -> Result<Vec<u8>, String> {
  let fields: Vec<String> = match &options.fields {
    Some(fields) => fields.clone(),
    None => records
      .first()
      .and_then(Value::as_object)
      .map(|first| first.keys().cloned().collect())
      .unwrap_or_default(),
  };
  let paths: Vec<ValuePath> = fields.iter().map(|f| ValuePath::parse(f)).collect();

  let mut writer = ::csv::WriterBuilder::new()
    .delimiter(options.delimiter as u8)
    .from_writer(Vec::new());
  writer.write_record(&fields).map_err(|e| e.to_string())?;
  for record in records {
    let row: Vec<String> = paths.iter().map(|path| cell_text(path.get(record))).collect();
    writer.write_record(&row).map_err(|e| e.to_string())?;
  }
  writer.into_inner().map_err(|e| e.to_string())
}

fn cell_text(value: Option<&Value>) -> String {
  match value {
    None | Some(Value::Null) => String::new(),
    Some(Value::String(s)) => s.clone(),
    Some(other) => other.to_string(),
  }
}
