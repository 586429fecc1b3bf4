//! Search space loading service
//!
//! Builds a [`SearchSpaceTree`] from a TOML description of nested mutables.

use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use generational_arena::Index;
use serde::Deserialize;
use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{Choice, IdGenerator, MutableKind, MutableRef, SearchSpaceTree};
use crate::infrastructure::traits::FileSystem;

/// Top level of a search space description file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchSpaceSpec {
    #[serde(default)]
    pub mutables: Vec<MutableSpec>,
}

/// One decision point and, for scopes, the decision points nested in it.
#[derive(Debug, Clone, Deserialize)]
pub struct MutableSpec {
    /// Auto-named `<Kind><n>` when omitted
    pub key: Option<String>,
    pub kind: MutableKind,
    #[serde(default)]
    pub candidates: Vec<String>,
    #[serde(default)]
    pub children: Vec<MutableSpec>,
}

/// Service turning search space descriptions into trees.
pub struct SearchSpaceService {
    fs: Arc<dyn FileSystem>,
    ids: Arc<IdGenerator>,
}

impl SearchSpaceService {
    pub fn new(fs: Arc<dyn FileSystem>, ids: Arc<IdGenerator>) -> Self {
        Self { fs, ids }
    }

    /// Read and parse `path`, then build the tree.
    pub fn load(&self, path: &Path) -> ApplicationResult<SearchSpaceTree> {
        debug!("load: path={}", path.display());
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read search space", path)?;
        let spec: SearchSpaceSpec =
            toml::from_str(&content).map_err(|e| ApplicationError::Parse {
                path: path.to_path_buf(),
                message: e.message().to_string(),
            })?;
        self.build(&spec).map_err(|e| match e {
            ApplicationError::Parse { message, .. } => ApplicationError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Build a tree from an already parsed description.
    ///
    /// Children keep their declaration order. Only scopes may have children.
    pub fn build(&self, spec: &SearchSpaceSpec) -> ApplicationResult<SearchSpaceTree> {
        let mut tree = SearchSpaceTree::new();
        let root = tree.root();
        let mut stack: Vec<(&MutableSpec, Index)> =
            spec.mutables.iter().rev().map(|m| (m, root)).collect();

        while let Some((current, parent_idx)) = stack.pop() {
            if !current.children.is_empty() && current.kind != MutableKind::MutableScope {
                return Err(ApplicationError::Parse {
                    path: Default::default(),
                    message: format!(
                        "{} '{}' has children; only mutable_scope may nest mutables",
                        current.kind,
                        current.key.as_deref().unwrap_or("<unnamed>")
                    ),
                });
            }

            let mutable = self.instantiate(current);
            debug!("build: adding {} ({})", mutable.key(), mutable.kind());
            let current_idx = tree.add_child(parent_idx, mutable)?;

            for child in current.children.iter().rev() {
                stack.push((child, current_idx));
            }
        }

        debug!("build: {} nodes, depth {}", tree.len(), tree.depth());
        Ok(tree)
    }

    fn instantiate(&self, spec: &MutableSpec) -> MutableRef {
        let choice = match &spec.key {
            Some(key) => Choice::new(key.clone(), spec.kind),
            None => Choice::auto_named(spec.kind, &self.ids),
        };
        Rc::new(choice.with_candidates(spec.candidates.iter().cloned()))
    }
}
