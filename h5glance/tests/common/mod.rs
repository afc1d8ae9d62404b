//! Common test utilities for integration tests.
//!
//! This module provides fixture containers shared by the integration tests:
//! the layout mirrors a small experiment file with nested groups, a hard
//! link alias and a mix of attributes.

use std::path::PathBuf;

use h5glance::{Array, Datatype, MemoryContainer, Scalar, Value};

/// Builds the sample container used across the integration tests.
///
/// ```text
/// sample.h5
/// ├group1                (attrs: string='foo', array=zeros(3, 4))
/// │ ├subgroup1
/// │ │ └dataset1          uint64, 200
/// │ └subgroup2
/// │   └dataset1          int16, 12
/// ├dataset2              float32, 2 × 128 × 500
/// └synonyms
///   └folder              hard link to /group1/subgroup1
/// ```
#[allow(dead_code)]
pub fn sample_container() -> MemoryContainer {
    let mut file = MemoryContainer::new("sample.h5");
    file.create_dataset("/group1/subgroup1/dataset1", Datatype::uint(64), &[200])
        .unwrap();
    file.create_dataset("/group1/subgroup2/dataset1", Datatype::int(16), &[12])
        .unwrap();
    file.create_dataset("/dataset2", Datatype::float(32), &[2, 128, 500])
        .unwrap();
    file.set_attr_str("/group1", "string", "foo").unwrap();
    file.set_attr(
        "/group1",
        "array",
        Datatype::float(64),
        Value::Array(Array::filled(vec![3, 4], &Scalar::Float(0.0))),
    )
    .unwrap();
    file.link_hard("/synonyms/folder", "/group1/subgroup1").unwrap();
    file
}

/// A deeper container for depth and property checks: `width` groups per
/// level, `depth` levels, one dataset in every group.
#[allow(dead_code)]
pub fn wide_container(width: usize, depth: usize) -> MemoryContainer {
    let mut file = MemoryContainer::new("wide.h5");
    let mut frontier = vec![String::new()];
    for _ in 0..depth {
        let mut next = Vec::new();
        for parent in &frontier {
            for i in 0..width {
                let group = format!("{parent}/g{i}");
                file.create_group(&group).unwrap();
                file.create_dataset(&format!("{group}/data"), Datatype::int(32), &[i as u64 + 1])
                    .unwrap();
                next.push(group);
            }
        }
        frontier = next;
    }
    file
}

/// JSON snapshot describing the same layout as [`sample_container`].
#[allow(dead_code)]
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

/// Writes [`SAMPLE_SNAPSHOT`] to `sample.json` in a fresh temporary
/// directory. Keep the directory alive while the file is in use.
#[allow(dead_code)]
pub fn write_sample_snapshot() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("sample.json");
    std::fs::write(&path, SAMPLE_SNAPSHOT).expect("Failed to write snapshot");
    (dir, path)
}
