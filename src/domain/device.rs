//! Moving nested payloads onto a compute device
//!
//! A training step usually receives its batch as a nest of tensors inside
//! tuples, lists and maps, mixed with plain scalars. [`to_device`] rebuilds
//! such a nest with every tensor moved and everything else left alone.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, DomainResult};

/// Compute device a tensor can live on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Device {
    #[default]
    Cpu,
    Cuda(usize),
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda(ordinal) => write!(f, "cuda:{}", ordinal),
        }
    }
}

impl FromStr for Device {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cpu" => Ok(Device::Cpu),
            "cuda" => Ok(Device::Cuda(0)),
            other => other
                .strip_prefix("cuda:")
                .and_then(|n| n.parse::<usize>().ok())
                .map(Device::Cuda)
                .ok_or_else(|| DomainError::InvalidDevice(other.to_string())),
        }
    }
}

impl TryFrom<String> for Device {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Device> for String {
    fn from(device: Device) -> Self {
        device.to_string()
    }
}

/// Anything that can produce a copy of itself on another device.
pub trait DeviceTransfer: Sized {
    fn to_device(&self, device: Device) -> Self;
}

/// Nested batch payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<T> {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tensor(T),
    Tuple(Vec<Payload<T>>),
    List(Vec<Payload<T>>),
    Map(IndexMap<String, Payload<T>>),
    /// A value of a type the dispatch does not know how to move.
    Opaque { repr: String, type_name: String },
}

impl<T> Payload<T> {
    pub fn opaque(repr: impl Into<String>, type_name: impl Into<String>) -> Self {
        Payload::Opaque {
            repr: repr.into(),
            type_name: type_name.into(),
        }
    }
}

/// Move every tensor in `payload` to `device`, preserving the nesting.
///
/// Fails on the first [`Payload::Opaque`] found; no partial result is
/// returned.
pub fn to_device<T: DeviceTransfer>(payload: &Payload<T>, device: Device) -> DomainResult<Payload<T>> {
    Ok(match payload {
        Payload::Tensor(t) => Payload::Tensor(t.to_device(device)),
        Payload::Tuple(items) => Payload::Tuple(to_device_all(items, device)?),
        Payload::List(items) => Payload::List(to_device_all(items, device)?),
        Payload::Map(entries) => Payload::Map(
            entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), to_device(v, device)?)))
                .collect::<DomainResult<IndexMap<_, _>>>()?,
        ),
        Payload::Bool(b) => Payload::Bool(*b),
        Payload::Int(i) => Payload::Int(*i),
        Payload::Float(x) => Payload::Float(*x),
        Payload::Str(s) => Payload::Str(s.clone()),
        Payload::Opaque { repr, type_name } => {
            return Err(DomainError::UnsupportedType {
                value: repr.clone(),
                type_name: type_name.clone(),
            })
        }
    })
}

fn to_device_all<T: DeviceTransfer>(items: &[Payload<T>], device: Device) -> DomainResult<Vec<Payload<T>>> {
    items.iter().map(|item| to_device(item, device)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;

    #[derive(Debug, Clone, PartialEq)]
    struct FakeTensor {
        id: u32,
        device: Device,
    }

    impl DeviceTransfer for FakeTensor {
        fn to_device(&self, device: Device) -> Self {
            Self {
                id: self.id,
                device,
            }
        }
    }

    fn tensor(id: u32) -> Payload<FakeTensor> {
        Payload::Tensor(FakeTensor {
            id,
            device: Device::Cpu,
        })
    }

    #[test]
    fn given_map_of_list_and_scalar_when_moving_then_only_tensors_change() {
        let gpu = Device::Cuda(0);
        let batch = Payload::Map(indexmap! {
            "x".to_string() => Payload::List(vec![tensor(1), tensor(2)]),
            "y".to_string() => Payload::Int(3),
        });

        let moved = to_device(&batch, gpu).unwrap();

        let expected = Payload::Map(indexmap! {
            "x".to_string() => Payload::List(vec![
                Payload::Tensor(FakeTensor { id: 1, device: gpu }),
                Payload::Tensor(FakeTensor { id: 2, device: gpu }),
            ]),
            "y".to_string() => Payload::Int(3),
        });
        assert_eq!(moved, expected);
    }

    #[test]
    fn given_tuple_when_moving_then_kind_is_preserved() {
        let batch = Payload::Tuple(vec![
            tensor(7),
            Payload::Str("label".into()),
            Payload::Float(0.5),
            Payload::Bool(true),
        ]);
        let moved = to_device(&batch, Device::Cuda(1)).unwrap();
        match moved {
            Payload::Tuple(items) => {
                assert_eq!(items.len(), 4);
                assert_eq!(items[1], Payload::Str("label".into()));
                assert_eq!(items[2], Payload::Float(0.5));
                assert_eq!(items[3], Payload::Bool(true));
            }
            other => panic!("expected tuple, got {:?}", other),
        }
    }

    #[test]
    fn given_nested_opaque_when_moving_then_fails_naming_value_and_type() {
        let batch = Payload::List(vec![tensor(1), Payload::List(vec![Payload::opaque("<Foo>", "Foo")])]);
        let err = to_device(&batch, Device::Cpu).unwrap_err();
        assert_eq!(err.to_string(), "'<Foo>' has unsupported type 'Foo'");
    }

    #[test]
    fn given_device_strings_when_parsing_then_round_trip_display() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("cuda".parse::<Device>().unwrap(), Device::Cuda(0));
        assert_eq!("cuda:3".parse::<Device>().unwrap().to_string(), "cuda:3");
        assert!(matches!(
            "tpu".parse::<Device>(),
            Err(DomainError::InvalidDevice(_))
        ));
    }
}
