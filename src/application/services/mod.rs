//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem)
//! but are themselves concrete structs, not traits.

mod dispatch;
mod metrics;
mod search_space;

pub use dispatch::{payload_from_json, payload_to_json, DispatchService, TensorHandle};
pub use metrics::MetricsService;
pub use search_space::{MutableSpec, SearchSpaceService, SearchSpaceSpec};
