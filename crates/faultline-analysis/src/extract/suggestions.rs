//! Ranked remediation suggestions.

use faultline_core::constants::{MAX_SUGGESTIONS, SUGGESTION_CATEGORIES};
use faultline_core::{dedup_preserving_order, ErrorCategory, ErrorMatch};

/// First-step remediation hints per category, most useful first.
fn hints(category: ErrorCategory) -> &'static [&'static str] {
    use ErrorCategory::*;
    match category {
        TypeScript => &[
            "Check type annotations on the reported symbol",
            "Run tsc with --noEmit to list all type errors",
            "Verify tsconfig.json strictness settings",
        ],
        JavaScript => &[
            "Add a guard before accessing the failing property",
            "Check that the value is initialized before use",
        ],
        Python => &[
            "Read the last frame of the traceback for the failing line",
            "Check argument types passed to the failing call",
        ],
        Memory => &[
            "Increase the heap limit or reduce working-set size",
            "Look for unbounded growth in caches or accumulators",
            "Check recursion depth for runaway recursion",
        ],
        Network => &[
            "Verify the target service is up and reachable",
            "Check CORS headers on the server response",
            "Confirm hostnames and ports in configuration",
        ],
        React => &[
            "Ensure hooks are called unconditionally at the top level",
            "Check for state updates during render",
        ],
        Vue => &["Register the component before using it in a template"],
        Angular => &["Look up the NG error code in the Angular error reference"],
        Django => &[
            "Run pending migrations",
            "Check the database connection settings",
        ],
        FastApi => &[
            "Compare the request body against the pydantic model",
            "Check path and query parameter types",
        ],
        Database => &[
            "Verify the connection string and credentials",
            "Check that the referenced table or column exists",
        ],
        Docker => &[
            "Inspect the daemon logs for the failing container",
            "Check the Dockerfile step that failed to build",
        ],
        Cicd => &["Open the failing job log at the first ##[error] line"],
        Build => &[
            "Reinstall dependencies and clear the build cache",
            "Check for version conflicts in the lockfile",
        ],
        Security => &[
            "Verify credentials and token expiry",
            "Check role and permission assignments",
        ],
        Async => &["Check for missing awaits and timeout settings"],
        General => &["Search the message text for the failing component"],
    }
}

/// Build the ranked suggestion list for a classified input.
///
/// Takes hints from the highest-confidence categories (at most
/// [`SUGGESTION_CATEGORIES`] of them), deduplicates, and caps the list at
/// [`MAX_SUGGESTIONS`]. `matches` must already be sorted by confidence.
pub fn for_matches(matches: &[ErrorMatch]) -> Vec<String> {
    let mut out: Vec<String> = matches
        .iter()
        .take(SUGGESTION_CATEGORIES)
        .flat_map(|m| hints(m.category).iter().map(|s| s.to_string()))
        .collect();
    dedup_preserving_order(&mut out);
    out.truncate(MAX_SUGGESTIONS);
    out
}
