//! Running-average meters for training metrics

use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use indexmap::IndexMap;
use itertools::Itertools;
use serde_json::Value;
use tracing::warn;

use crate::domain::error::DomainError;

/// A value reported for a metric.
///
/// Non-numeric values are accepted so that a bad report does not stop
/// training; see [`AverageMeter::update_weighted`].
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
    NonNumeric { type_name: String },
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Int(i) => Some(*i as f64),
            MetricValue::Float(x) => Some(*x),
            MetricValue::NonNumeric { .. } => None,
        }
    }

    fn type_name(&self) -> &str {
        match self {
            MetricValue::Int(_) => "int",
            MetricValue::Float(_) => "float",
            MetricValue::NonNumeric { type_name } => type_name,
        }
    }

    fn non_numeric(type_name: &str) -> Self {
        MetricValue::NonNumeric {
            type_name: type_name.to_string(),
        }
    }
}

macro_rules! metric_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for MetricValue {
            fn from(v: $t) -> Self {
                MetricValue::Int(v as i64)
            }
        })*
    };
}

metric_from_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! metric_from_wide_uint {
    ($($t:ty),*) => {
        $(impl From<$t> for MetricValue {
            fn from(v: $t) -> Self {
                i64::try_from(v)
                    .map(MetricValue::Int)
                    .unwrap_or(MetricValue::Float(v as f64))
            }
        })*
    };
}

metric_from_wide_uint!(u64, usize);

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

impl From<f32> for MetricValue {
    fn from(v: f32) -> Self {
        MetricValue::Float(v as f64)
    }
}

/// Booleans count as 1 and 0.
impl From<bool> for MetricValue {
    fn from(b: bool) -> Self {
        MetricValue::Int(b as i64)
    }
}

impl From<&str> for MetricValue {
    fn from(_: &str) -> Self {
        MetricValue::non_numeric("str")
    }
}

impl From<String> for MetricValue {
    fn from(_: String) -> Self {
        MetricValue::non_numeric("str")
    }
}

impl From<&Value> for MetricValue {
    fn from(v: &Value) -> Self {
        match v {
            Value::Number(n) => match n.as_i64() {
                Some(i) => MetricValue::Int(i),
                None => n
                    .as_f64()
                    .map(MetricValue::Float)
                    .unwrap_or_else(|| MetricValue::non_numeric("number")),
            },
            Value::Null => MetricValue::non_numeric("null"),
            Value::Bool(b) => MetricValue::from(*b),
            Value::String(_) => MetricValue::non_numeric("str"),
            Value::Array(_) => MetricValue::non_numeric("array"),
            Value::Object(_) => MetricValue::non_numeric("object"),
        }
    }
}

impl From<Value> for MetricValue {
    fn from(v: Value) -> Self {
        MetricValue::from(&v)
    }
}

/// Fixed-point rendering of meter values: `[:][width][.precision]f`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeterFormat {
    pub width: usize,
    pub precision: usize,
}

impl MeterFormat {
    pub const DEFAULT_PRECISION: usize = 6;

    /// Format used for meters created by an [`AverageMeterGroup`].
    pub const GROUP: MeterFormat = MeterFormat {
        width: 4,
        precision: Self::DEFAULT_PRECISION,
    };

    pub fn render(&self, value: f64) -> String {
        if value.is_nan() {
            return format!("{:>w$}", "nan", w = self.width);
        }
        format!("{:>w$.p$}", value, w = self.width, p = self.precision)
    }
}

impl Default for MeterFormat {
    fn default() -> Self {
        Self {
            width: 0,
            precision: Self::DEFAULT_PRECISION,
        }
    }
}

impl fmt::Display for MeterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(":")?;
        if self.width > 0 {
            write!(f, "{}", self.width)?;
        }
        if self.precision != Self::DEFAULT_PRECISION {
            write!(f, ".{}", self.precision)?;
        }
        f.write_str("f")
    }
}

impl FromStr for MeterFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidMeterFormat(s.to_string());
        let spec = s.strip_prefix(':').unwrap_or(s);
        let spec = spec.strip_suffix('f').ok_or_else(invalid)?;
        let (width, precision) = match spec.split_once('.') {
            Some((w, p)) => (w, Some(p)),
            None => (spec, None),
        };
        let width = if width.is_empty() {
            0
        } else {
            width.parse().map_err(|_| invalid())?
        };
        let precision = match precision {
            Some(p) => p.parse().map_err(|_| invalid())?,
            None => Self::DEFAULT_PRECISION,
        };
        Ok(Self { width, precision })
    }
}

/// Tracks the latest value, running sum, count and mean of one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct AverageMeter {
    name: String,
    format: MeterFormat,
    val: f64,
    sum: f64,
    count: u64,
    avg: f64,
}

impl AverageMeter {
    pub fn new(name: impl Into<String>, format: MeterFormat) -> Self {
        Self {
            name: name.into(),
            format,
            val: 0.0,
            sum: 0.0,
            count: 0,
            avg: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.val = 0.0;
        self.sum = 0.0;
        self.count = 0;
        self.avg = 0.0;
    }

    pub fn update(&mut self, value: impl Into<MetricValue>) {
        self.update_weighted(value, 1);
    }

    /// Record `value` as if it had been observed `n` times.
    ///
    /// A non-numeric value is logged and recorded as NaN, which then
    /// poisons `sum` and `avg`.
    pub fn update_weighted(&mut self, value: impl Into<MetricValue>, n: u64) {
        let value = value.into();
        let v = value.as_f64().unwrap_or_else(|| {
            warn!(
                meter = %self.name,
                "Values passed to AverageMeter must be number, not {}.",
                value.type_name()
            );
            f64::NAN
        });
        self.val = v;
        self.sum += v * n as f64;
        self.count += n;
        if self.count > 0 {
            self.avg = self.sum / self.count as f64;
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn val(&self) -> f64 {
        self.val
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn avg(&self) -> f64 {
        self.avg
    }

    /// `<name>: <avg>`
    pub fn summary(&self) -> String {
        format!("{}: {}", self.name, self.format.render(self.avg))
    }
}

/// `<name> <val> (<avg>)`
impl fmt::Display for AverageMeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            self.name,
            self.format.render(self.val),
            self.format.render(self.avg)
        )
    }
}

/// Meters keyed by metric name, in first-seen order.
#[derive(Debug, Clone)]
pub struct AverageMeterGroup {
    format: MeterFormat,
    meters: IndexMap<String, AverageMeter>,
}

impl Default for AverageMeterGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl AverageMeterGroup {
    pub fn new() -> Self {
        Self::with_format(MeterFormat::GROUP)
    }

    pub fn with_format(format: MeterFormat) -> Self {
        Self {
            format,
            meters: IndexMap::new(),
        }
    }

    /// Feed one value per metric, creating meters for unseen names.
    pub fn update<I, K, V>(&mut self, data: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<MetricValue>,
    {
        let format = self.format;
        for (name, value) in data {
            self.meters
                .entry(name.into())
                .or_insert_with_key(|name| AverageMeter::new(name.clone(), format))
                .update(value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&AverageMeter> {
        self.meters.get(name)
    }

    pub fn len(&self) -> usize {
        self.meters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AverageMeter> {
        self.meters.values()
    }

    pub fn reset(&mut self) {
        self.meters.values_mut().for_each(AverageMeter::reset);
    }

    pub fn summary(&self) -> String {
        self.meters.values().map(AverageMeter::summary).join("  ")
    }
}

impl Index<&str> for AverageMeterGroup {
    type Output = AverageMeter;

    fn index(&self, name: &str) -> &Self::Output {
        &self.meters[name]
    }
}

impl fmt::Display for AverageMeterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.meters.values().join("  "))
    }
}
