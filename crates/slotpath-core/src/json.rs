// JSON bridging for value graphs.
// Highlights:
// - `to_json` renders any `Value`, bounded by `JsonOpts`; pointers and `Any`
//   holders are transparent, records keep their field order.
// - `from_json` builds a graph whose every slot is `Any`-typed, so any JSON
//   value can later be assigned into it.
// - `load_json_file` / `write_json_file` wrap both with file I/O.
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::value::{FloatWidth, IntWidth, List, Record, RecordType, Type, Value};

#[derive(Debug, Clone, Copy)]
pub struct JsonOpts {
    pub max_array_elems: usize,
    pub max_depth: usize,
}

impl Default for JsonOpts {
    fn default() -> Self {
        Self {
            max_array_elems: 128,
            max_depth: 16,
        }
    }
}

impl JsonOpts {
    /// No truncation and no depth cut; for writing documents back out.
    pub const fn lossless() -> Self {
        Self {
            max_array_elems: usize::MAX,
            max_depth: usize::MAX,
        }
    }
}

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot encode JSON: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("empty file: {0}")]
    Empty(PathBuf),
}

/// Name shared by the record types `from_json` creates for objects.
pub const OBJECT_RECORD: &str = "object";

pub fn to_json(value: &Value, opts: JsonOpts) -> serde_json::Value {
    render(value, 1, &opts)
}

fn render(v: &Value, depth: usize, opts: &JsonOpts) -> serde_json::Value {
    let child = |v: &Value| {
        if depth >= opts.max_depth {
            serde_json::Value::Null
        } else {
            render(v, depth + 1, opts)
        }
    };
    match v {
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(_, n) => json!(*n),
        Value::Uint(_, n) => json!(*n),
        Value::Float(_, x) => serde_json::Number::from_f64(*x)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Str(s) => json!(s),
        Value::Record(r) => {
            let fields = &r.record_type().fields;
            let mut map = serde_json::Map::with_capacity(fields.len());
            for (def, val) in fields.iter().zip(r.values()) {
                map.insert(def.name.clone(), child(val));
            }
            serde_json::Value::Object(map)
        }
        Value::Seq(list) | Value::Array(list) => {
            let items = list.items();
            let max = opts.max_array_elems.min(items.len());
            let mut arr = Vec::with_capacity(max + 1);
            arr.extend(items.iter().take(max).map(&child));
            if items.len() > max {
                arr.push(json!({"$truncated": true, "$omitted": items.len() - max}));
            }
            serde_json::Value::Array(arr)
        }
        Value::Map(m) if m.is_nil() => serde_json::Value::Null,
        Value::Map(m) => {
            let mut map = serde_json::Map::with_capacity(m.len());
            for (k, val) in m.iter() {
                map.insert(k.to_string(), child(val));
            }
            serde_json::Value::Object(map)
        }
        Value::Ptr { to: Some(inner), .. } | Value::Any(Some(inner)) => render(inner, depth, opts),
        Value::Ptr { to: None, .. } | Value::Any(None) => serde_json::Value::Null,
    }
}

/// Builds a value graph from JSON. Objects become records named
/// [`OBJECT_RECORD`] with `Any`-typed fields, arrays become `Any` sequences,
/// and `null` becomes an empty `Any`.
pub fn from_json(js: &serde_json::Value) -> Value {
    match js {
        serde_json::Value::Null => Value::Any(None),
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(IntWidth::W64, i)
            } else if let Some(u) = n.as_u64() {
                Value::Uint(IntWidth::W64, u)
            } else {
                Value::Float(FloatWidth::F64, n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::Str(s.clone()),
        serde_json::Value::Array(items) => Value::Seq(List::with_items(
            Type::Any,
            items.iter().map(|it| hold(from_json(it))).collect(),
        )),
        serde_json::Value::Object(obj) => {
            let ty: Arc<RecordType> = obj
                .keys()
                .fold(RecordType::new(OBJECT_RECORD), |rt, k| rt.field(k.as_str(), Type::Any))
                .shared();
            let mut record = Record::zero(&ty);
            for (i, val) in obj.values().enumerate() {
                record.values_mut()[i] = hold(from_json(val));
            }
            Value::Record(record)
        }
    }
}

fn hold(v: Value) -> Value {
    match v {
        Value::Any(_) => v,
        concrete => Value::any(concrete),
    }
}

pub fn load_json_file(path: &Path) -> Result<Value, JsonError> {
    let data = fs::read(path).map_err(|source| JsonError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(JsonError::Empty(path.to_path_buf()));
    }
    let js: serde_json::Value = serde_json::from_slice(&data).map_err(|source| JsonError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = data.len(), "loaded json document");
    Ok(from_json(&js))
}

pub fn write_json_file(path: &Path, value: &Value, opts: JsonOpts) -> Result<(), JsonError> {
    let s = serde_json::to_string_pretty(&to_json(value, opts))?;
    fs::write(path, s).map_err(|source| JsonError::Io {
        path: path.to_path_buf(),
        source,
    })
}
