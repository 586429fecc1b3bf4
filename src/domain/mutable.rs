//! Mutable entities: the architecture decision points a search space is made of

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::counter::IdGenerator;
use crate::domain::error::DomainError;

/// Kind of a decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutableKind {
    /// Choose one operator out of several candidates
    LayerChoice,
    /// Choose a subset of inputs
    InputChoice,
    /// Groups other mutables; becomes an inner node of the tree
    MutableScope,
}

impl MutableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutableKind::LayerChoice => "LayerChoice",
            MutableKind::InputChoice => "InputChoice",
            MutableKind::MutableScope => "MutableScope",
        }
    }
}

impl fmt::Display for MutableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MutableKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "layer_choice" | "LayerChoice" => Ok(MutableKind::LayerChoice),
            "input_choice" | "InputChoice" => Ok(MutableKind::InputChoice),
            "mutable_scope" | "MutableScope" => Ok(MutableKind::MutableScope),
            other => Err(DomainError::UnknownMutableKind(other.to_string())),
        }
    }
}

/// Capability set the search-space tree needs from an entity.
///
/// The key must be stable and unique across the search space; two entities
/// with the same key are considered the same decision point.
pub trait Mutable: fmt::Debug {
    fn key(&self) -> &str;

    fn kind(&self) -> MutableKind;
}

/// Plain decision point with a list of candidate labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub key: String,
    pub kind: MutableKind,
    pub candidates: Vec<String>,
}

impl Choice {
    pub fn new(key: impl Into<String>, kind: MutableKind) -> Self {
        Self {
            key: key.into(),
            kind,
            candidates: Vec::new(),
        }
    }

    /// Create a choice keyed `<Kind><n>` with `n` drawn from `ids`.
    pub fn auto_named(kind: MutableKind, ids: &IdGenerator) -> Self {
        Self::new(ids.next_name(kind.as_str()), kind)
    }

    pub fn with_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidates = candidates.into_iter().map(Into::into).collect();
        self
    }
}

impl Mutable for Choice {
    fn key(&self) -> &str {
        &self.key
    }

    fn kind(&self) -> MutableKind {
        self.kind
    }
}
