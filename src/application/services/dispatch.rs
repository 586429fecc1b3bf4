//! Payload dispatch service
//!
//! Reads a JSON description of a nested batch, moves it to a device and
//! renders the result back as JSON. Tensors are written as
//! `{"$tensor": {"shape": [..], "device": ".."}}`; `device` defaults to cpu.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{to_device, Device, DeviceTransfer, Payload};
use crate::infrastructure::traits::FileSystem;

const TENSOR_TAG: &str = "$tensor";

/// Shape-only stand-in for a framework tensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorHandle {
    pub shape: Vec<usize>,
    #[serde(default)]
    pub device: Device,
}

impl DeviceTransfer for TensorHandle {
    fn to_device(&self, device: Device) -> Self {
        Self {
            shape: self.shape.clone(),
            device,
        }
    }
}

/// Service moving JSON-described payloads between devices.
pub struct DispatchService {
    fs: Arc<dyn FileSystem>,
}

impl DispatchService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Load the payload in `path`, move it to `device`, return it as JSON.
    pub fn dispatch_file(&self, path: &Path, device: Device) -> ApplicationResult<Value> {
        debug!("dispatch_file: path={} device={}", path.display(), device);
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read payload", path)?;
        let value: Value = serde_json::from_str(&content).map_err(|e| ApplicationError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let payload = payload_from_json(&value).map_err(|message| ApplicationError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        let moved = to_device(&payload, device)?;
        Ok(payload_to_json(&moved))
    }
}

/// Interpret JSON as a payload; `null` is the only opaque value.
pub fn payload_from_json(value: &Value) -> Result<Payload<TensorHandle>, String> {
    Ok(match value {
        Value::Object(map) if map.len() == 1 && map.contains_key(TENSOR_TAG) => {
            let tensor: TensorHandle = serde_json::from_value(map[TENSOR_TAG].clone())
                .map_err(|e| format!("bad tensor: {}", e))?;
            Payload::Tensor(tensor)
        }
        Value::Object(map) => Payload::Map(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), payload_from_json(v)?)))
                .collect::<Result<IndexMap<_, _>, String>>()?,
        ),
        Value::Array(items) => Payload::List(
            items
                .iter()
                .map(payload_from_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Payload::Int(i),
            None => Payload::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => Payload::Str(s.clone()),
        Value::Bool(b) => Payload::Bool(*b),
        Value::Null => Payload::opaque("null", "NoneType"),
    })
}

pub fn payload_to_json(payload: &Payload<TensorHandle>) -> Value {
    match payload {
        Payload::Bool(b) => json!(b),
        Payload::Int(i) => json!(i),
        Payload::Float(x) => json!(x),
        Payload::Str(s) => json!(s),
        Payload::Tensor(t) => json!({ TENSOR_TAG: { "shape": t.shape, "device": t.device.to_string() } }),
        Payload::Tuple(items) | Payload::List(items) => {
            Value::Array(items.iter().map(payload_to_json).collect())
        }
        Payload::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), payload_to_json(v)))
                .collect::<Map<_, _>>(),
        ),
        Payload::Opaque { repr, type_name } => json!({ "$opaque": { "repr": repr, "type": type_name } }),
    }
}
