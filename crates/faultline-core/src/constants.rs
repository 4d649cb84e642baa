//! Default limits and tuning constants for the engine.

/// Minimum normalized confidence for a category to appear in results.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.3;

/// Maximum number of classifier result-cache entries.
pub const CLASSIFY_CACHE_CAPACITY: u64 = 1000;

/// Chunk size for streamed scanning (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Bytes of the previous chunk prefixed to the next one so matches
/// spanning a chunk boundary are still found.
pub const DEFAULT_CHUNK_OVERLAP: usize = 1024;

/// Inputs larger than this are scanned with the parallel worker pool (5 MB).
pub const PARALLEL_SCAN_THRESHOLD: u64 = 5 * 1024 * 1024;

/// Line numbers outside 1..=MAX_LINE_NUMBER are treated as false positives.
pub const MAX_LINE_NUMBER: u32 = 100_000;

/// Template cache entries expire after this many seconds even if never
/// invalidated.
pub const TEMPLATE_CACHE_TTL_SECS: u64 = 3600;

/// Maximum entries per template cache level.
pub const TEMPLATE_CACHE_CAPACITY: u64 = 256;

/// Window within which repeated change events for one path collapse into
/// a single reload.
pub const DEBOUNCE_WINDOW_MS: u64 = 200;

/// Suggestions are generated from at most this many top-confidence matches.
pub const SUGGESTION_CATEGORIES: usize = 3;

/// Cap on the ranked suggestion list.
pub const MAX_SUGGESTIONS: usize = 5;

/// Name of the built-in fallback template.
pub const GENERAL_TEMPLATE_NAME: &str = "general";

/// Key prefix under which user-directory templates are stored so they
/// shadow but never delete built-ins of the same base name.
pub const USER_NAMESPACE: &str = "user.";
