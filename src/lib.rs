//! Helpers for neural architecture search
//!
//! - [`domain::SearchSpaceTree`]: ordered tree of decision points with
//!   pre/post-order, optionally deduplicated traversal
//! - [`domain::IdGenerator`]: monotonic ids for auto-named mutables
//! - [`domain::to_device`]: move nested batch payloads to a device
//! - [`domain::AverageMeterGroup`]: running averages of training metrics

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use domain::{
    global_mutable_counting, to_device, AverageMeter, AverageMeterGroup, Choice, Device,
    DomainError, IdGenerator, Mutable, MutableKind, Payload, SearchSpaceTree, TraversalOrder,
};
