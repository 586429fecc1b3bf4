//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{DispatchService, MetricsService, SearchSpaceService};
use crate::config::Settings;
use crate::domain::IdGenerator;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    pub search_space: SearchSpaceService,
    pub metrics: MetricsService,
    pub dispatch: DispatchService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let settings = Arc::new(settings);
        // Auto-named mutables count from 1 per container
        let search_space = SearchSpaceService::new(Arc::clone(&fs), Arc::new(IdGenerator::new()));
        let metrics = MetricsService::new(Arc::clone(&fs));
        let dispatch = DispatchService::new(Arc::clone(&fs));

        Self {
            settings,
            fs,
            search_space,
            metrics,
            dispatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::{MutableSpec, SearchSpaceSpec};
    use crate::domain::MutableKind;

    fn anonymous_layer() -> SearchSpaceSpec {
        SearchSpaceSpec {
            mutables: vec![MutableSpec {
                key: None,
                kind: MutableKind::LayerChoice,
                candidates: Vec::new(),
                children: Vec::new(),
            }],
        }
    }

    #[test]
    fn given_two_containers_when_auto_naming_then_each_counts_from_one() {
        let first = ServiceContainer::new(Settings::default());
        let second = ServiceContainer::new(Settings::default());

        let a = first.search_space.build(&anonymous_layer()).unwrap();
        let b = first.search_space.build(&anonymous_layer()).unwrap();
        let c = second.search_space.build(&anonymous_layer()).unwrap();

        assert_eq!(a.leaf_keys(), vec!["LayerChoice1"]);
        assert_eq!(b.leaf_keys(), vec!["LayerChoice2"]);
        assert_eq!(c.leaf_keys(), vec!["LayerChoice1"]);
    }
}
