// Harbor - S3-compatible replicating reverse proxy
// Copyright (C) 2026 Harbor Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Cross-platform path utilities for tests.
//!
//! Provides utilities to handle path differences between Windows and Unix
//! systems, ensuring tests work consistently across platforms.

use std::env;
use std::path::{Path, PathBuf};

/// Cross-platform path utilities for tests.
pub struct TestPaths;

impl TestPaths {
    /// Get the workspace root directory.
    ///
    /// Walks up from the current directory or `CARGO_MANIFEST_DIR` to find the workspace
    /// root (the directory whose `Cargo.toml` declares `[workspace]`).
    pub fn project_root() -> PathBuf {
        let start = env::var("CARGO_MANIFEST_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::current_dir().expect("Failed to get current directory"));

        let mut current = start.as_path();

        loop {
            let cargo_toml = current.join("Cargo.toml");
            if cargo_toml.exists() {
                if let Ok(content) = std::fs::read_to_string(&cargo_toml) {
                    if content.contains("[workspace]") {
                        return current.to_path_buf();
                    }
                }
            }

            if let Some(parent) = current.parent() {
                current = parent;
            } else {
                return start;
            }
        }
    }

    /// Normalize a path for cross-platform comparison.
    ///
    /// Uses `dunce` to handle Windows UNC paths (`\\?\`) and ensures consistent path
    /// separators.
    pub fn normalize(path: &Path) -> PathBuf {
        dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }

    /// Convert a path to a string suitable for command-line arguments or config file values.
    pub fn to_arg_string(path: &Path) -> String {
        Self::normalize(path).to_string_lossy().into_owned()
    }

    /// Create a platform-independent path from components.
    pub fn join_components(components: &[&str]) -> PathBuf {
        let mut path = PathBuf::new();
        for component in components {
            path.push(component);
        }
        path
    }
}

/// Assert that two paths are equal after normalization.
///
/// Handles platform-specific path differences.
#[macro_export]
macro_rules! assert_paths_eq {
    ($left:expr, $right:expr) => {
        assert_eq!(
            $crate::TestPaths::normalize($left),
            $crate::TestPaths::normalize($right),
            "Paths are not equal"
        );
    };
    ($left:expr, $right:expr, $($arg:tt)+) => {
        assert_eq!(
            $crate::TestPaths::normalize($left),
            $crate::TestPaths::normalize($right),
            $($arg)+
        );
    };
}
