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

//! Request body fixtures for replication and body-limit tests.

/// Test fixture generators for request bodies.
pub struct TestFixtures;

impl TestFixtures {
    /// A small text body.
    pub fn text_file(content: &str) -> Vec<u8> {
        content.as_bytes().to_vec()
    }

    /// A body of the given size with predictable, varied content.
    pub fn binary_file(size: usize) -> Vec<u8> {
        (0..size).map(|i| (i % 256) as u8).collect()
    }

    /// A body of the given size for testing body-limit rejection and streaming, built from a
    /// repeating pattern rather than held as one large literal.
    pub fn large_file(target_size: usize) -> Vec<u8> {
        let pattern = b"Harbor replication test payload\n";
        let repeats = (target_size / pattern.len()) + 1;
        pattern.repeat(repeats).into_iter().take(target_size).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_file_creation() {
        let data = TestFixtures::binary_file(1024);
        assert_eq!(data.len(), 1024);
    }

    #[test]
    fn test_large_file_creation() {
        let size = 1024 * 1024; // 1 MB
        let data = TestFixtures::large_file(size);
        assert_eq!(data.len(), size);
    }
}
