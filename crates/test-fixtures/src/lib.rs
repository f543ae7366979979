//! Test fixtures for the expression vector engine: an in-memory backing
//! store with fault injection, and loaders for golden scenarios.
//!
//! Golden scenario files live under `golden/` in this crate.

pub mod scenario;
pub mod store;

use std::path::PathBuf;

use serde::de::DeserializeOwned;

pub use scenario::{Installed, ProbeFixture, ScenarioFixture, SeedStore, SubCohortFixture};
pub use store::InMemoryStore;

/// Root directory of the golden fixture files.
fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("golden")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Check that a fixture file exists.
pub fn fixture_exists(relative_path: &str) -> bool {
    fixtures_root().join(relative_path).exists()
}

/// The two-channel, 3 probe × 2 sample scenario.
pub fn two_channel_scenario() -> ScenarioFixture {
    load_fixture("two_channel_scenario.json")
}

/// Assert two double vectors are equal, treating NaN as equal to NaN.
///
/// # Panics
/// Panics with both vectors on mismatch.
pub fn assert_nan_eq(actual: &[f64], expected: &[f64]) {
    let same = actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(a, e)| (a.is_nan() && e.is_nan()) || a == e);
    assert!(same, "vectors differ: actual {actual:?}, expected {expected:?}");
}
