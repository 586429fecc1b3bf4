//! Shared test setup: logging and small search-space fixtures

use std::env;
use std::rc::Rc;
use std::sync::Once;

use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::{Choice, MutableKind, MutableRef, SearchSpaceTree};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "nasutil=trace");
        }
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");

    // The config crate is chatty at trace level
    let noisy_modules = ["config"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// A layer choice keyed `key`.
pub fn layer(key: &str) -> MutableRef {
    Rc::new(Choice::new(key, MutableKind::LayerChoice))
}

/// A scope keyed `key`.
pub fn scope(key: &str) -> MutableRef {
    Rc::new(Choice::new(key, MutableKind::MutableScope))
}

/// Root with children `a` and `b`, where `a` holds `c`.
pub fn sample_tree() -> SearchSpaceTree {
    let mut tree = SearchSpaceTree::new();
    let root = tree.root();
    let a = tree.add_child(root, scope("a")).expect("root exists");
    tree.add_child(a, layer("c")).expect("a exists");
    tree.add_child(root, layer("b")).expect("root exists");
    tree
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_setup() {
        init_test_setup();
        init_test_setup();
    }

    #[test]
    fn given_sample_tree_then_has_four_nodes() {
        let tree = sample_tree();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.leaf_keys(), vec!["c", "b"]);
    }
}
