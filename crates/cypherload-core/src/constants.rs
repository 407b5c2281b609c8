/// Default number of statements per transactional batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Maximum execution attempts for one batch (first try plus retries).
pub const MAX_BATCH_ATTEMPTS: u32 = 3;

/// Upper bound on the exponential retry backoff, in seconds.
pub const BACKOFF_CAP_SECS: u64 = 30;

/// How long a health check result stays valid before a new probe is issued.
pub const HEALTH_CHECK_INTERVAL_SECS: u64 = 300;

/// Round-trip timeout for the health probe query.
pub const PROBE_TIMEOUT_SECS: u64 = 5;

/// Timeout for establishing the initial driver connection.
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Statements are truncated to this many characters in errors and logs.
pub const STATEMENT_PREVIEW_CHARS: usize = 200;

/// `file_path` sentinel reported when validating in-memory statement lists.
pub const IN_MEMORY_PATH: &str = "<in_memory>";

/// Records deleted per round when clearing the database before an upload.
pub const CLEAR_BATCH_SIZE: i64 = 10_000;

/// Directory under `$HOME` holding the global config file.
pub const DEFAULT_CONFIG_DIR: &str = ".cypherload";
