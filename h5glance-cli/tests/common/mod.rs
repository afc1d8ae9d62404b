//! Common test utilities for CLI integration tests.
//!
//! Provides an isolated temporary directory holding a sample container
//! snapshot, and command builders for both binaries.

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A sample file: two nested datasets under `group1`, a 3-D dataset at the
/// root, two attributes on `group1` and a hard link back to
/// `/group1/subgroup1`.
pub const SAMPLE_SNAPSHOT: &str = r#"{
  "filename": "sample.h5",
  "root": {
    "children": {
      "group1": {
        "type": "group",
        "attrs": {
          "string": "foo",
          "array": [[0.0, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 0.0]]
        },
        "children": {
          "subgroup1": {
            "type": "group",
            "children": {
              "dataset1": {"type": "dataset", "dtype": "<u8", "shape": [200]}
            }
          },
          "subgroup2": {
            "type": "group",
            "children": {
              "dataset1": {"type": "dataset", "dtype": "<i2", "shape": [12]}
            }
          }
        }
      },
      "dataset2": {"type": "dataset", "dtype": "<f4", "shape": [2, 128, 500]},
      "synonyms": {
        "type": "group",
        "children": {
          "folder": {"type": "hardlink", "target": "/group1/subgroup1"}
        }
      }
    }
  }
}
"#;

/// Test environment with an isolated temporary directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the temporary directory
    pub temp_path: PathBuf,
    /// Path to the sample snapshot inside the directory
    pub sample: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment with the sample snapshot written out.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();
        let sample = temp_path.join("sample.json");
        std::fs::write(&sample, SAMPLE_SNAPSHOT).expect("Failed to write sample");

        Self {
            temp_dir,
            temp_path,
            sample,
        }
    }

    /// The `h5glance` binary with a clean colour and logging environment.
    pub fn view(&self) -> Command {
        let mut cmd = Command::cargo_bin("h5glance").expect("Failed to find h5glance binary");
        cmd.env_remove("H5GLANCE_COLORS").env_remove("H5GLANCE_LOG_MODE");
        cmd
    }

    /// The `h5glance-html` binary with a clean colour and logging environment.
    pub fn html(&self) -> Command {
        let mut cmd =
            Command::cargo_bin("h5glance-html").expect("Failed to find h5glance-html binary");
        cmd.env_remove("H5GLANCE_COLORS").env_remove("H5GLANCE_LOG_MODE");
        cmd
    }

    /// Get the temp path.
    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// Write a file with the given contents and return its path.
    pub fn write_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_path.join(name);
        std::fs::write(&path, contents).expect("Failed to write test file");
        path
    }

    /// The root label the tree view gives the sample file.
    pub fn sample_label(&self) -> String {
        self.sample.display().to_string()
    }
}
