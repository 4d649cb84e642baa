//! Structural extractors.
//!
//! These run independently of classification and never fail: malformed
//! input just yields fewer facts. Regexes are compiled once; the sets are
//! fixed at build time so a compile failure would be a programming error.

pub mod stack_trace;
pub mod suggestions;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use faultline_core::{dedup_preserving_order, EnvironmentInfo, ErrorMatch, ExtractedInfo};
use faultline_core::constants::MAX_LINE_NUMBER;

fn ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .expect("builtin extractor pattern is valid")
}

const SOURCE_EXTS: &str = "ts|tsx|js|jsx|py|java|cpp|c|h|rs|go|rb|php|swift|kt|vue|svelte";

static FILE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        ci(&format!(
            r#"(?:File |at |from |in )["']?([^\s"':]+\.(?:{SOURCE_EXTS}))["']?"#
        )),
        ci(&format!(
            r"([A-Za-z0-9_$./\\-]+\.(?:{SOURCE_EXTS}))(?:[\s:]|$)"
        )),
    ]
});

static LINE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        ci(r"\bline\s+(\d+)"),
        ci(r":(\d+)(?::\d+)?"),
        ci(r"\bon line (\d+)"),
        ci(r"\[(\d+),\s*\d+\]"),
        ci(r"\bL(\d+)\b"),
    ]
});

static FUNCTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        ci(r"\bat\s+([A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*)\s*\("),
        ci(r#"File\s+"[^"]+",\s+line\s+\d+,\s+in\s+(\w+)"#),
        ci(r"\bfunction\s+(\w+)"),
        ci(r"\bdef\s+(\w+)"),
    ]
});

static VARIABLE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        ci(r#"['"](\w+)['"] is not defined"#),
        ci(r#"Cannot read prop(?:erty)? ['"](\w+)['"]"#),
        ci(r#"Cannot access ['"](\w+)['"] before initialization"#),
        ci(r#"Property ['"](\w+)['"] does not exist"#),
        ci(r#"name ['"](\w+)['"] is not defined"#),
    ]
});

static URL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        ci(r#"https?://[^\s'"<>]+"#),
        ci(r"/api/[\w/]+"),
        ci(r"/v\d+/[\w/]+"),
        ci(r"localhost:\d+[\w/]*"),
    ]
});

static ERROR_CODE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        ci(r"\bTS(\d{4})\b"),
        ci(r"(?:status|code):\s*(\d{3})\b"),
        ci(r"(?:errno|code):\s*([A-Z_]{3,})"),
        ci(r"SQLSTATE\[(\w+)\]"),
        ci(r"\b(?:ERROR|ERR)[_-]([A-Z0-9_]+)"),
        ci(r"\b([A-Z]\w+Error)\b"),
    ]
});

static TIMESTAMP_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        ci(r"\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?"),
        ci(r"\d{2}/\d{2}/\d{4}\s+\d{2}:\d{2}:\d{2}"),
        ci(r"\[\d{2}:\d{2}:\d{2}\]"),
    ]
});

static NODE_VERSION: Lazy<Regex> = Lazy::new(|| ci(r"node[:\s]+v?([\d.]+)"));
static PYTHON_VERSION: Lazy<Regex> = Lazy::new(|| ci(r"python[:\s]+v?([\d.]+)"));
static ENV_VAR: Lazy<Regex> =
    Lazy::new(|| ci(r#"(?:process\.env\.|ENV\[|os\.environ\[)['"]?(\w+)"#));

// (needle set, canonical name); first hit wins.
const OS_HINTS: &[(&[&str], &str)] = &[
    (&["darwin", "macos", "mac os"], "macos"),
    (&["windows", "win32", "win64"], "windows"),
    (&["linux", "ubuntu", "debian", "centos", "fedora"], "linux"),
];

/// Run every structural extractor over `text`.
///
/// Never fails; all list fields come back de-duplicated in first-seen
/// order. Suggestions are filled in by [`extract_with_matches`] since they
/// derive from classification output.
pub fn extract(text: &str) -> ExtractedInfo {
    let mut info = ExtractedInfo {
        files: collect_group(&FILE_PATTERNS, text),
        line_numbers: collect_lines(text),
        functions: collect_group(&FUNCTION_PATTERNS, text),
        variables: collect_group(&VARIABLE_PATTERNS, text),
        urls: collect_urls(text),
        error_codes: collect_group(&ERROR_CODE_PATTERNS, text),
        timestamps: collect_whole(&TIMESTAMP_PATTERNS, text),
        stack_traces: stack_trace::parse_all(text),
        environment: extract_environment(text),
        suggestions: Vec::new(),
        extra: Default::default(),
    };
    info.dedup();
    info
}

/// [`extract`] plus facts merged in from classifier matches and the
/// ranked suggestion list derived from the top categories.
pub fn extract_with_matches(text: &str, matches: &[ErrorMatch]) -> ExtractedInfo {
    let mut info = extract(text);
    for m in matches {
        for (name, values) in &m.extracted {
            info.absorb(name, values);
        }
    }
    info.suggestions = suggestions::for_matches(matches);
    info.dedup();
    info
}

fn collect_group(patterns: &[Regex], text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for pattern in patterns {
        for caps in pattern.captures_iter(text) {
            if let Some(g) = caps.get(1) {
                out.push(g.as_str().to_string());
            }
        }
    }
    out
}

fn collect_whole(patterns: &[Regex], text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for pattern in patterns {
        for m in pattern.find_iter(text) {
            out.push(m.as_str().to_string());
        }
    }
    out
}

fn collect_lines(text: &str) -> Vec<u32> {
    let mut out = Vec::new();
    for pattern in LINE_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            if let Some(g) = caps.get(1) {
                if let Ok(n) = g.as_str().parse::<u32>() {
                    if n >= 1 && n <= MAX_LINE_NUMBER {
                        out.push(n);
                    }
                }
            }
        }
    }
    out
}

fn collect_urls(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for (idx, pattern) in URL_PATTERNS.iter().enumerate() {
        for m in pattern.find_iter(text) {
            let url = m.as_str().trim_end_matches([')', ']', '.', ',']);
            // API-endpoint patterns overlap full URLs; skip fragments that
            // are already part of a collected URL.
            if idx > 0 && out.iter().any(|u: &String| u.contains(url)) {
                continue;
            }
            out.push(url.to_string());
        }
    }
    out
}

fn extract_environment(text: &str) -> EnvironmentInfo {
    let lower = text.to_lowercase();
    let os = OS_HINTS
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
        .map(|(_, name)| name.to_string());

    EnvironmentInfo {
        os,
        node_version: NODE_VERSION
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|g| g.as_str().trim_end_matches('.').to_string()),
        python_version: PYTHON_VERSION
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|g| g.as_str().trim_end_matches('.').to_string()),
        env_variables: {
            let mut vars = collect_group(std::slice::from_ref(&*ENV_VAR), text);
            dedup_preserving_order(&mut vars);
            vars
        },
    }
}
