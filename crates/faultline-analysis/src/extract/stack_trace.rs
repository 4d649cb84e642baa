//! Line-based stack trace parsers.
//!
//! Python and JavaScript traces have a rigid enough line grammar that
//! walking lines beats one giant multiline regex, and it keeps the raw
//! slice of each trace intact for reporting.

use once_cell::sync::Lazy;
use regex::Regex;

use faultline_core::{Language, StackFrame, StackTrace};

static PY_FRAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*File\s+"([^"]+)",\s+line\s+(\d+)(?:,\s+in\s+(\S+))?"#)
        .expect("python frame pattern is valid")
});

static JS_FRAME_FULL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*at\s+(.+?)\s+\((.+?):(\d+):(\d+)\)\s*$")
        .expect("js frame pattern is valid")
});

static JS_FRAME_BARE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*at\s+(.+?):(\d+):(\d+)\s*$").expect("js bare frame pattern is valid")
});

static JS_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\w*(?:Error|Exception)\b").expect("js head pattern is valid")
});

/// Find and parse every recognizable stack trace in `text`.
pub fn parse_all(text: &str) -> Vec<StackTrace> {
    let lines: Vec<&str> = text.lines().collect();
    let mut traces = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].trim_start().starts_with("Traceback (most recent call last):") {
            let (trace, next) = parse_python(&lines, i);
            if !trace.frames.is_empty() {
                traces.push(trace);
            }
            i = next;
        } else if JS_HEAD.is_match(lines[i]) && is_js_frame(lines.get(i + 1)) {
            let (trace, next) = parse_javascript(&lines, i);
            if !trace.frames.is_empty() {
                traces.push(trace);
            }
            i = next;
        } else {
            i += 1;
        }
    }

    traces
}

fn is_js_frame(line: Option<&&str>) -> bool {
    line.is_some_and(|l| JS_FRAME_FULL.is_match(l) || JS_FRAME_BARE.is_match(l))
}

fn parse_python(lines: &[&str], start: usize) -> (StackTrace, usize) {
    let mut frames = Vec::new();
    let mut i = start + 1;

    while i < lines.len() {
        let Some(caps) = PY_FRAME.captures(lines[i]) else {
            // The exception line ("ValueError: ...") or unrelated text ends
            // the frame list.
            if frames.is_empty() || !lines[i].trim().is_empty() {
                break;
            }
            i += 1;
            continue;
        };

        let line = caps
            .get(2)
            .and_then(|g| g.as_str().parse::<u32>().ok())
            .unwrap_or(0);
        let mut frame = StackFrame {
            file: caps[1].to_string(),
            line,
            column: None,
            function: caps.get(3).map_or_else(
                || "<module>".to_string(),
                |g| g.as_str().to_string(),
            ),
            code: None,
        };

        // The source line, if present, is indented deeper on the next line.
        if let Some(next) = lines.get(i + 1) {
            if !PY_FRAME.is_match(next) && next.starts_with("    ") && !next.trim().is_empty() {
                frame.code = Some(next.trim().to_string());
                i += 1;
            }
        }

        frames.push(frame);
        i += 1;
    }

    // Skip the closing exception line so it is part of the raw slice.
    let mut end = i;
    if end < lines.len() && !lines[end].trim().is_empty() && !lines[end].starts_with(' ') {
        end += 1;
    }

    (
        StackTrace {
            language: Language::Python,
            frames,
            raw: lines[start..end].join("\n"),
        },
        end,
    )
}

fn parse_javascript(lines: &[&str], start: usize) -> (StackTrace, usize) {
    let mut frames = Vec::new();
    let mut i = start + 1;

    while i < lines.len() {
        if let Some(caps) = JS_FRAME_FULL.captures(lines[i]) {
            frames.push(StackFrame {
                file: caps[2].to_string(),
                line: caps[3].parse().unwrap_or(0),
                column: caps[4].parse().ok(),
                function: caps[1].to_string(),
                code: None,
            });
        } else if let Some(caps) = JS_FRAME_BARE.captures(lines[i]) {
            frames.push(StackFrame {
                file: caps[1].to_string(),
                line: caps[2].parse().unwrap_or(0),
                column: caps[3].parse().ok(),
                function: "<anonymous>".to_string(),
                code: None,
            });
        } else {
            break;
        }
        i += 1;
    }

    (
        StackTrace {
            language: Language::JavaScript,
            frames,
            raw: lines[start..i].join("\n"),
        },
        i,
    )
}
