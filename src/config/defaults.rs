//! Default values for configuration fields

/// Verify TLS certificates unless explicitly disabled
pub fn default_ssl_verify() -> bool {
    true
}

/// Maximum number of entries per zip part
pub fn default_max_count() -> usize {
    1000
}

/// Maximum cumulative uncompressed bytes per zip part (1 GB)
pub fn default_max_size() -> u64 {
    1_000_000_000
}

/// Seconds between activity poll attempts
pub fn default_poll_interval() -> u64 {
    3
}
