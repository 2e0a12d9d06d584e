/*!
 * Proxy Limits and Constants
 *
 * Centralized location for the fixed values of the proxy subsystem.
 * Organized by component so each knob has exactly one home.
 */

use std::time::Duration;

// =============================================================================
// TOKEN CACHE
// =============================================================================

/// Lifetime of a registered proxy reference (5 minutes)
/// Set once at registration, never extended
pub const TOKEN_TTL: Duration = Duration::from_secs(5 * 60);

/// Longest accepted token lifetime (30 days)
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Initial capacity of the token map
pub const TOKEN_CACHE_INITIAL_CAPACITY: usize = 256;

/// Interval of the optional background sweep in the service binary
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Longest accepted sweep interval (1 day)
pub const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

// =============================================================================
// ADDRESS SPACE
// =============================================================================

/// Scheme of shared content references
pub const CONTENT_SCHEME: &str = "content";

/// Suffix appended to the host identity to form the proxy authority
pub const PROXY_AUTHORITY_SUFFIX: &str = ".blackbox.FileProxy";

/// Suffix appended to the host identity to form the host file-provider authority
pub const FILE_PROVIDER_AUTHORITY_SUFFIX: &str = ".blackbox.FileProvider";

/// First path segment of every proxy reference (`/t/<token>`)
pub const TOKEN_PATH_SEGMENT: &str = "t";

/// Host identity used when nothing else is configured
pub const DEFAULT_HOST_IDENTITY: &str = "io.fileproxy.host";

// =============================================================================
// METADATA
// =============================================================================

/// Display name used when neither metadata nor the path yield one
pub const PLACEHOLDER_DISPLAY_NAME: &str = "shared.bin";

/// Mime type of last resort
pub const OCTET_STREAM: &str = "application/octet-stream";

// =============================================================================
// STREAMING
// =============================================================================

/// Copy buffer for the sequential pipe fallback (64KB)
pub const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Capacity of the in-process pipe ring (256KB)
/// Four copy buffers in flight before the writer blocks
pub const PIPE_CAPACITY: usize = 4 * COPY_BUFFER_SIZE;

/// Scratch buffer used by the default skip primitive (8KB)
pub const SKIP_SCRATCH_SIZE: usize = 8 * 1024;

/// Name of the dedicated streaming worker thread
pub const DEFAULT_WORKER_NAME: &str = "file-proxy-worker";

/// Operations slower than this are logged at warn level
pub const SLOW_OPERATION_THRESHOLD: Duration = Duration::from_millis(10);
