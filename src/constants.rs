/// Configuration file read when no path is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "param.json";

/// Poll interval used when the configuration does not set one (milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;

/// Query marker selecting the CSV rendition of the HAProxy stats page
pub const CSV_QUERY_MARKER: &str = ";csv";

/// Prefix HAProxy puts in front of the CSV header line
pub const HEADER_PREFIX: &str = "# ";

/// Role column value of a front-end aggregate row
pub const ROLE_FRONTEND: &str = "FRONTEND";

/// Role column value of a back-end aggregate row
pub const ROLE_BACKEND: &str = "BACKEND";

/// Initial capacity for the per-cycle output buffer
pub const OUTPUT_CAPACITY: usize = 4096;
