//! Test fixture loader for Verity golden datasets.
//!
//! Provides typed deserialization of the fixture JSON files and helpers for
//! loading them in tests across crates.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use verity_core::Answer;

/// Root directory of the test-fixtures folder.
fn fixtures_root() -> PathBuf {
    // Works from any crate in the workspace: walk up to find test-fixtures.
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let mut path = PathBuf::from(&manifest_dir);

    while !path.join("test-fixtures").exists() {
        if !path.pop() {
            panic!(
                "Could not find test-fixtures directory from CARGO_MANIFEST_DIR={}",
                manifest_dir
            );
        }
    }
    path.join("test-fixtures")
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

/// Get the absolute path to a fixture file.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}

/// List all JSON files in a fixture subdirectory, sorted by path.
pub fn list_fixtures(subdir: &str) -> Vec<PathBuf> {
    let dir = fixtures_root().join(subdir);
    if !dir.exists() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)
        .unwrap_or_else(|e| panic!("Failed to read directory {}: {}", dir.display(), e))
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                Some(path)
            } else {
                None
            }
        })
        .collect();
    files.sort();
    files
}

// ---------------------------------------------------------------------------
// Dawid & Skene (1979) patient table
// ---------------------------------------------------------------------------

pub const PATIENTS_1979: &str = "dawid_skene/patients_1979.json";

/// `ratings[patient][observer]` lists every rating that observer gave the
/// patient (observer 1 rated each patient three times).
#[derive(Debug, Clone, Deserialize)]
pub struct PatientsFixture {
    pub source: String,
    pub ratings: Vec<Vec<Vec<u32>>>,
    pub expected: BTreeMap<String, ExpectedEstimate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpectedEstimate {
    pub class_priors: BTreeMap<String, f64>,
    pub labels: BTreeMap<String, String>,
    pub error_rates: Vec<ExpectedErrorRate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpectedErrorRate {
    pub participant: String,
    pub answered: String,
    pub truth: String,
    pub rate: f64,
}

impl PatientsFixture {
    /// One answer per rating. Observers and patients are numbered from 1.
    pub fn answers(&self) -> Vec<Answer> {
        let mut answers = Vec::new();
        for (patient, observers) in self.ratings.iter().enumerate() {
            for (observer, ratings) in observers.iter().enumerate() {
                for rating in ratings {
                    answers.push(Answer::new(
                        (observer + 1).to_string(),
                        (patient + 1).to_string(),
                        rating.to_string(),
                    ));
                }
            }
        }
        answers
    }

    /// Expected values for one EM schedule: `full`, `fast` or `hybrid`.
    pub fn expected(&self, mode: &str) -> &ExpectedEstimate {
        self.expected
            .get(mode)
            .unwrap_or_else(|| panic!("No expected values for mode {}", mode))
    }
}

pub fn load_patients() -> PatientsFixture {
    load_fixture(PATIENTS_1979)
}

// ---------------------------------------------------------------------------
// CrowdTruth boundary sets
// ---------------------------------------------------------------------------

pub const CROWDTRUTH_BOUNDARY_SETS: &str = "crowdtruth/boundary_sets.json";

#[derive(Debug, Clone, Deserialize)]
pub struct BoundarySets {
    pub source: String,
    /// The closed vocabulary offered to every worker.
    pub vocabulary: Vec<String>,
    pub scenarios: Vec<BoundaryScenario>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// Every worker picks the same choice on every question.
    Agree,
    /// Every worker picks a different choice on every question.
    Disagree,
    /// One worker picks one choice, everyone else another.
    Outlier,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoundaryScenario {
    pub kind: ScenarioKind,
    pub workers: usize,
    #[serde(default)]
    pub outlier: Option<String>,
    pub answers: Vec<Answer>,
}

impl BoundarySets {
    pub fn of_kind(&self, kind: ScenarioKind) -> impl Iterator<Item = &BoundaryScenario> {
        self.scenarios.iter().filter(move |s| s.kind == kind)
    }
}

pub fn load_boundary_sets() -> BoundarySets {
    load_fixture(CROWDTRUTH_BOUNDARY_SETS)
}

// ---------------------------------------------------------------------------
// Dog-breed regression sets (optional, not shipped)
// ---------------------------------------------------------------------------

pub const DOG_DIR: &str = "dog";

/// One dog-breed dataset and its reference truth assignment.
#[derive(Debug, Clone, Deserialize)]
pub struct DogDataset {
    pub answers: Vec<Answer>,
    pub truth: BTreeMap<String, String>,
}

/// Every `dog/dataset_<n>.json` present, in path order. Empty when the
/// reference files have not been placed in the fixtures directory.
pub fn load_dog_datasets() -> Vec<(PathBuf, DogDataset)> {
    list_fixtures(DOG_DIR)
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("dataset_"))
        })
        .map(|path| {
            let relative = format!(
                "{}/{}",
                DOG_DIR,
                path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
            );
            let dataset = load_fixture(&relative);
            (path, dataset)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_root_exists() {
        assert!(fixtures_root().exists(), "test-fixtures directory not found");
    }

    #[test]
    fn all_golden_files_exist() {
        for f in [PATIENTS_1979, CROWDTRUTH_BOUNDARY_SETS] {
            assert!(fixture_exists(f), "Missing fixture: {}", f);
        }
    }

    #[test]
    fn patients_table_shape() {
        let fixture = load_patients();
        assert_eq!(fixture.ratings.len(), 45);
        assert!(fixture.ratings.iter().all(|row| row.len() == 5));
        assert!(fixture.ratings.iter().all(|row| row[0].len() == 3));
        // 45 patients x (3 + 4) ratings.
        assert_eq!(fixture.answers().len(), 315);
        for mode in ["full", "fast", "hybrid"] {
            let expected = fixture.expected(mode);
            assert_eq!(expected.labels.len(), 45);
            assert_eq!(expected.class_priors.len(), 4);
        }
    }

    #[test]
    fn boundary_sets_cover_two_to_ten_workers() {
        let sets = load_boundary_sets();
        assert_eq!(sets.vocabulary.len(), 26);
        let agree: Vec<usize> = sets.of_kind(ScenarioKind::Agree).map(|s| s.workers).collect();
        assert_eq!(agree, (2..=10).collect::<Vec<_>>());
        let outlier: Vec<usize> = sets.of_kind(ScenarioKind::Outlier).map(|s| s.workers).collect();
        assert_eq!(outlier, (3..=10).collect::<Vec<_>>());
        for scenario in &sets.scenarios {
            // Three questions per scenario, one answer per worker each.
            assert_eq!(scenario.answers.len(), scenario.workers * 3);
        }
    }

    #[test]
    fn missing_subdirectory_lists_nothing() {
        assert!(list_fixtures("does-not-exist").is_empty());
    }
}
