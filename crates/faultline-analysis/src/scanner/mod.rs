//! Chunked log scanner.
//!
//! Scans arbitrarily large inputs in fixed-size chunks with an overlap
//! region so matches spanning a chunk boundary are still found. Hits are
//! collapsed to the longest one at each absolute start offset, which both
//! removes overlap duplicates and discards matches cut short by a chunk
//! edge, so a chunked scan aggregates to the same matches as classifying
//! the whole input in one piece (for matches no longer than the overlap).

pub mod cancellation;

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use faultline_core::constants::{
    DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_CONFIDENCE_THRESHOLD,
    PARALLEL_SCAN_THRESHOLD,
};
use faultline_core::{EngineConfig, ErrorMatch, ScanError};

use crate::catalog::{PatternCatalog, RawHit};
use crate::classify::severity::KeywordPresence;
pub use cancellation::ScanCancellation;

/// Tuning for one scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub chunk_size: usize,
    pub overlap: usize,
    /// Files at least this many bytes are scanned with a worker pool.
    pub parallel_threshold: u64,
    /// Stop collecting raw hits once this many have been seen.
    pub max_matches: Option<usize>,
    pub threshold: f64,
    pub cancellation: ScanCancellation,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
            parallel_threshold: PARALLEL_SCAN_THRESHOLD,
            max_matches: None,
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            cancellation: ScanCancellation::new(),
        }
    }
}

impl ScanOptions {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
            parallel_threshold: config.parallel_threshold,
            max_matches: config.max_matches,
            threshold: config.confidence_threshold,
            cancellation: ScanCancellation::new(),
        }
    }
}

/// Result of one scan.
#[derive(Debug)]
pub struct ScanOutcome {
    pub matches: Vec<ErrorMatch>,
    /// Non-fatal problems observed during the scan (undecodable chunks,
    /// truncation by the match cap).
    pub warnings: Vec<String>,
    pub chunks_scanned: usize,
    pub bytes_scanned: u64,
}

/// One scanned chunk's contribution, merged after the fact.
struct ChunkScan {
    hits: Vec<RawHit>,
    presence: KeywordPresence,
    warnings: Vec<String>,
    /// Logical bytes this chunk covered, excluding the overlap re-read.
    bytes: u64,
}

/// The chunked scanner.
pub struct Scanner {
    catalog: Arc<PatternCatalog>,
}

impl Scanner {
    pub fn new(catalog: Arc<PatternCatalog>) -> Self {
        Self { catalog }
    }

    /// Scan a file, choosing the streaming or parallel path by size.
    pub fn scan_path(&self, path: &Path, options: &ScanOptions) -> Result<ScanOutcome, ScanError> {
        let io_err = |source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        };
        let len = std::fs::metadata(path).map_err(io_err)?.len();

        if len >= options.parallel_threshold {
            debug!(path = %path.display(), len, "parallel scan");
            self.scan_file_parallel(path, len, options)
        } else {
            debug!(path = %path.display(), len, "streaming scan");
            let file = File::open(path).map_err(io_err)?;
            self.scan_reader(file, options)
        }
    }

    /// Scan an in-memory string. Used for inputs already held in memory;
    /// equivalent to [`Scanner::scan_reader`] over the same bytes.
    pub fn scan_str(&self, text: &str, options: &ScanOptions) -> Result<ScanOutcome, ScanError> {
        self.scan_reader(std::io::Cursor::new(text.as_bytes()), options)
    }

    /// Stream chunks from `reader`, carrying the overlap tail and any
    /// incomplete trailing UTF-8 sequence into the next chunk.
    pub fn scan_reader<R: Read>(
        &self,
        mut reader: R,
        options: &ScanOptions,
    ) -> Result<ScanOutcome, ScanError> {
        let chunk_size = options.chunk_size.max(options.overlap * 2).max(64);
        let mut buf = vec![0u8; chunk_size];
        // Bytes re-presented at the head of the next chunk.
        let mut carry: Vec<u8> = Vec::new();
        let mut total_read: u64 = 0;
        let mut presence = KeywordPresence::default();
        let mut hits: Vec<RawHit> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();
        let mut chunks = 0usize;
        let mut capped = false;

        loop {
            if options.cancellation.is_cancelled() {
                return Err(ScanError::Cancelled);
            }

            let n = read_some(&mut reader, &mut buf)?;
            if n == 0 {
                if carry_has_incomplete_tail(&carry) {
                    warnings.push("input ends with an incomplete UTF-8 sequence".to_string());
                }
                break;
            }

            let chunk_base = total_read as usize - carry.len();
            total_read += n as u64;
            let mut chunk = std::mem::take(&mut carry);
            chunk.extend_from_slice(&buf[..n]);

            match decode_chunk(&chunk) {
                Decoded::Invalid { at } => {
                    warnings.push(format!(
                        "skipped undecodable chunk at byte {}",
                        chunk_base + at
                    ));
                }
                Decoded::Text { text, tail } => {
                    presence.observe(text);
                    self.catalog.hits_in(text, chunk_base, &mut hits);
                    // Carry the overlap window plus the incomplete tail.
                    let valid_len = chunk.len() - tail;
                    let mut start = valid_len.saturating_sub(options.overlap);
                    while start < valid_len && !text.is_char_boundary(start) {
                        start += 1;
                    }
                    carry.extend_from_slice(&chunk[start..]);
                }
            }

            chunks += 1;
            if let Some(max) = options.max_matches {
                if hits.len() >= max {
                    capped = true;
                    break;
                }
            }
        }

        self.finish(hits, presence, warnings, chunks, total_read, capped, options)
    }

    /// Parallel scan: each worker reads its own slice of the file.
    fn scan_file_parallel(
        &self,
        path: &Path,
        len: u64,
        options: &ScanOptions,
    ) -> Result<ScanOutcome, ScanError> {
        let chunk_size = options.chunk_size.max(options.overlap * 2).max(64) as u64;
        let chunk_count = len.div_ceil(chunk_size) as usize;

        let hit_count = AtomicUsize::new(0);
        let scans: Vec<Option<ChunkScan>> = (0..chunk_count)
            .into_par_iter()
            .map(|index| -> Result<Option<ChunkScan>, ScanError> {
                if options.cancellation.is_cancelled() {
                    return Err(ScanError::Cancelled);
                }
                // Once the cap is reached, remaining chunks are skipped;
                // chunks already in flight still complete.
                if let Some(max) = options.max_matches {
                    if hit_count.load(Ordering::Relaxed) >= max {
                        return Ok(None);
                    }
                }
                let logical_start = index as u64 * chunk_size;
                let logical_end = (logical_start + chunk_size).min(len);
                // Reach back into the previous chunk so boundary-spanning
                // matches are seen by this worker.
                let read_start = logical_start.saturating_sub(options.overlap as u64);
                let mut scan =
                    self.scan_slice_of(path, read_start, logical_end, index == chunk_count - 1)?;
                scan.bytes = logical_end - logical_start;
                hit_count.fetch_add(scan.hits.len(), Ordering::Relaxed);
                Ok(Some(scan))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut presence = KeywordPresence::default();
        let mut hits: Vec<RawHit> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();
        let mut chunks_scanned = 0usize;
        let mut bytes_scanned = 0u64;
        let mut capped = false;
        for scan in scans.into_iter().flatten() {
            chunks_scanned += 1;
            bytes_scanned += scan.bytes;
            presence.crisis |= scan.presence.crisis;
            presence.moderate |= scan.presence.moderate;
            warnings.extend(scan.warnings);
            if capped {
                continue;
            }
            hits.extend(scan.hits);
            if let Some(max) = options.max_matches {
                if hits.len() >= max {
                    capped = true;
                }
            }
        }

        self.finish(
            hits,
            presence,
            warnings,
            chunks_scanned,
            bytes_scanned,
            capped,
            options,
        )
    }

    fn scan_slice_of(
        &self,
        path: &Path,
        read_start: u64,
        read_end: u64,
        is_last: bool,
    ) -> Result<ChunkScan, ScanError> {
        let io_err = |source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut file = File::open(path).map_err(io_err)?;
        file.seek(SeekFrom::Start(read_start)).map_err(io_err)?;
        let mut bytes = vec![0u8; (read_end - read_start) as usize];
        file.read_exact(&mut bytes).map_err(io_err)?;

        // A slice starting mid-codepoint begins with continuation bytes.
        let lead = bytes
            .iter()
            .take(3)
            .take_while(|b| (**b & 0b1100_0000) == 0b1000_0000)
            .count();
        let base = read_start as usize + lead;

        let mut scan = ChunkScan {
            hits: Vec::new(),
            presence: KeywordPresence::default(),
            warnings: Vec::new(),
            bytes: 0,
        };

        match decode_chunk(&bytes[lead..]) {
            Decoded::Invalid { at } => {
                scan.warnings
                    .push(format!("skipped undecodable chunk at byte {}", base + at));
            }
            Decoded::Text { text, tail } => {
                // An incomplete tail is re-read by the next worker's
                // overlap; only the final chunk has nobody after it.
                if tail > 0 && is_last {
                    scan.warnings
                        .push("input ends with an incomplete UTF-8 sequence".to_string());
                }
                scan.presence.observe(text);
                self.catalog.hits_in(text, base, &mut scan.hits);
            }
        }

        Ok(scan)
    }

    /// Merge raw hits into final matches: dedup overlap duplicates,
    /// collapse presence-only patterns to their earliest hit, re-order to
    /// pattern-major, then score.
    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        mut hits: Vec<RawHit>,
        presence: KeywordPresence,
        mut warnings: Vec<String>,
        chunks_scanned: usize,
        bytes_scanned: u64,
        capped: bool,
        options: &ScanOptions,
    ) -> Result<ScanOutcome, ScanError> {
        if options.cancellation.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        // Pattern-major, then by position, longest first at each start;
        // the kept subsequence is identical to whole-input order.
        hits.sort_by(|a, b| {
            (a.pattern, a.start)
                .cmp(&(b.pattern, b.start))
                .then(b.end.cmp(&a.end))
        });

        let mut seen: FxHashSet<(usize, usize)> = FxHashSet::default();
        let mut boolean_seen: FxHashSet<usize> = FxHashSet::default();
        let patterns = self.catalog.patterns();
        hits.retain(|hit| {
            // One hit per start: a shorter hit there is the same match cut
            // off at a chunk edge, re-found in full by the overlap.
            if !seen.insert((hit.pattern, hit.start)) {
                return false;
            }
            if patterns[hit.pattern].capture_names.is_empty() {
                // Presence-only patterns count once, at the earliest hit.
                return boolean_seen.insert(hit.pattern);
            }
            true
        });

        if capped {
            if let Some(max) = options.max_matches {
                hits.truncate(max);
                warnings.push(format!("match cap of {max} reached; scan truncated"));
            }
        }

        let matches = crate::classify::aggregate(&self.catalog, presence, &hits, options.threshold);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "scan finished with warnings");
        }

        Ok(ScanOutcome {
            matches,
            warnings,
            chunks_scanned,
            bytes_scanned,
        })
    }
}

enum Decoded<'a> {
    /// Valid text, possibly with `tail` incomplete trailing bytes cut off.
    Text { text: &'a str, tail: usize },
    /// Invalid bytes in the interior of the chunk.
    Invalid { at: usize },
}

fn decode_chunk(bytes: &[u8]) -> Decoded<'_> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Decoded::Text { text, tail: 0 },
        Err(e) => match e.error_len() {
            // A sequence cut off by the chunk boundary.
            None => {
                let valid = e.valid_up_to();
                // Safe: from_utf8 validated this prefix.
                let text = unsafe { std::str::from_utf8_unchecked(&bytes[..valid]) };
                Decoded::Text {
                    text,
                    tail: bytes.len() - valid,
                }
            }
            Some(_) => Decoded::Invalid {
                at: e.valid_up_to(),
            },
        },
    }
}

fn carry_has_incomplete_tail(carry: &[u8]) -> bool {
    std::str::from_utf8(carry).is_err()
}

fn read_some<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, ScanError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(ScanError::Io {
                    path: Default::default(),
                    source: e,
                })
            }
        }
    }
    Ok(filled)
}
