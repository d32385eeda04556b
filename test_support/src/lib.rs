//! ABOUTME: Shared testing utilities and helper functions
//! ABOUTME: Common test fixtures used across signbridge crates

/// Simple test helper function to demonstrate cross-crate testing
pub fn create_test_id() -> String {
    "test-id-123".to_string()
}

/// Helper for creating temporary directories in tests
pub fn temp_dir_path() -> std::path::PathBuf {
    std::env::temp_dir().join("signbridge-test")
}

/// Minimal JPEG byte sequence for screenshot fixtures.
///
/// Starts with the JFIF SOI marker so anything sniffing content treats it as
/// an image; the payload itself is filler.
pub fn fake_jpeg_bytes() -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.extend_from_slice(b"signbridge test frame");
    bytes.extend_from_slice(&[0xFF, 0xD9]);
    bytes
}
