//! Helpers shared by the integration suites that need a real database.
//!
//! Each file under `tests/` is its own crate, so suites pull this in with
//! `mod support;`.

pub mod embedded_postgres;

/// True when `SKIP_TEST_CLUSTER` is `1`, `true` or `yes` (any case).
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Skip quietly when the environment opted out of embedded clusters,
/// otherwise fail loudly so a broken CI host is not mistaken for a pass.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("embedded cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}
