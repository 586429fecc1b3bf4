//! Domain layer: search-space tree and training-loop helpers
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod counter;
pub mod device;
pub mod error;
pub mod meter;
pub mod mutable;
pub mod tree;
pub mod tree_traits;

pub use counter::{global_mutable_counting, IdGenerator};
pub use device::{to_device, Device, DeviceTransfer, Payload};
pub use error::{DomainError, DomainResult};
pub use meter::{AverageMeter, AverageMeterGroup, MeterFormat, MetricValue};
pub use mutable::{Choice, Mutable, MutableKind};
pub use tree::{MutableRef, SearchSpaceTree, Traversal, TraversalOrder, TreeNode};
pub use tree_traits::TreeNodeConvert;
