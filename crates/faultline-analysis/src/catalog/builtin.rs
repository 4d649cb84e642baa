//! Builtin pattern table.
//!
//! Weights express relative diagnostic importance: explicit error codes
//! outweigh generic keyword hits.

use faultline_core::ErrorCategory;

use super::PatternSpec;

fn spec(
    pattern: &str,
    category: ErrorCategory,
    weight: f64,
    capture_names: &[&str],
    multiline: bool,
) -> PatternSpec {
    PatternSpec {
        pattern: pattern.to_string(),
        category,
        weight,
        capture_names: capture_names.iter().map(|s| s.to_string()).collect(),
        multiline,
    }
}

pub(super) fn builtin_specs() -> Vec<PatternSpec> {
    use ErrorCategory::*;

    vec![
        // TypeScript
        spec(
            r"(?:error )?TS(\d{4}):\s*(.+?)$",
            TypeScript,
            2.0,
            &["error_code", "message"],
            false,
        ),
        spec(
            r#"Type\s+['"`](.+?)['"`]\s+is not assignable to type\s+['"`](.+?)['"`]"#,
            TypeScript,
            1.5,
            &["source_type", "target_type"],
            false,
        ),
        spec(
            r#"Cannot find module\s+['"`](.+?)['"`]"#,
            TypeScript,
            1.5,
            &["module_name"],
            false,
        ),
        spec(
            r#"Property\s+['"`](\w+)['"`]\s+does not exist on type\s+['"`](.+?)['"`]"#,
            TypeScript,
            1.5,
            &["property", "type"],
            false,
        ),
        // JavaScript
        spec(
            r"(TypeError|ReferenceError|SyntaxError|RangeError):\s*(.+?)$",
            JavaScript,
            2.0,
            &["error_type", "message"],
            false,
        ),
        spec(
            r#"Cannot read prop(?:erty)?\s+['"`]?(\w+)['"`]?\s+of\s+(undefined|null)"#,
            JavaScript,
            1.8,
            &["property", "object_type"],
            false,
        ),
        spec(
            r"UnhandledPromiseRejectionWarning:\s*(.+)",
            JavaScript,
            1.7,
            &["message"],
            false,
        ),
        // Python
        spec(
            r"Traceback \(most recent call last\):",
            Python,
            2.0,
            &[],
            false,
        ),
        spec(
            r#"File\s+"([^"]+)",\s+line\s+(\d+),\s+in\s+(\w+)"#,
            Python,
            1.5,
            &["file", "line", "function"],
            false,
        ),
        spec(
            r"(\w+Error):\s*(.+?)$",
            Python,
            1.8,
            &["error_type", "message"],
            false,
        ),
        spec(
            r"async def\s+\w+.*?await.*?(?:asyncio\.)?(?:TimeoutError|CancelledError)",
            Async,
            1.6,
            &[],
            true,
        ),
        // Memory
        spec(r"JavaScript heap out of memory", Memory, 2.5, &[], false),
        spec(
            r"FATAL ERROR:.*?Allocation failed.*?process out of memory",
            Memory,
            2.5,
            &[],
            true,
        ),
        spec(r"Maximum call stack size exceeded", Memory, 2.0, &[], false),
        spec(
            r"java\.lang\.OutOfMemoryError:\s*(.+)",
            Memory,
            2.5,
            &["heap_space"],
            false,
        ),
        // Network
        spec(
            r"CORS (?:policy|error):.*?(?:Access-Control-Allow-Origin|blocked)",
            Network,
            2.0,
            &[],
            true,
        ),
        spec(
            r"(ERR_CONNECTION_REFUSED|ECONNREFUSED|ETIMEDOUT|ENOTFOUND)",
            Network,
            2.0,
            &["error_code"],
            false,
        ),
        spec(r"fetch failed", Network, 1.8, &[], false),
        spec(
            r#"WebSocket connection to\s+['"`](.+?)['"`]\s+failed"#,
            Network,
            1.8,
            &["url"],
            false,
        ),
        // React
        spec(
            r"Invalid hook call.*?Hooks can only be called inside",
            React,
            2.0,
            &[],
            true,
        ),
        spec(r"Too many re-renders\.\s*React limits", React, 2.0, &[], false),
        spec(
            r"Objects are not valid as a React child.*?found:\s*(.+)",
            React,
            1.8,
            &["object_type"],
            true,
        ),
        // Vue
        spec(
            r"\[Vue warn\]:\s*(.+?)$",
            Vue,
            1.8,
            &["message"],
            false,
        ),
        spec(
            r"Unknown custom element:\s*<(.+?)>",
            Vue,
            1.7,
            &["component"],
            false,
        ),
        // Angular
        spec(r"NG\d{4}:\s*(.+)", Angular, 2.0, &["message"], false),
        // Django
        spec(
            r"django\.(?:core|db|utils)\.exceptions\.(\w+):\s*(.+)",
            Django,
            2.0,
            &["exception_type", "message"],
            false,
        ),
        spec(
            r"OperationalError:.*?no such table:\s*(\w+)",
            Django,
            1.8,
            &["table_name"],
            false,
        ),
        // FastAPI
        spec(
            r"fastapi\.exceptions\.(\w+):\s*(.+)",
            FastApi,
            2.0,
            &["exception_type", "message"],
            false,
        ),
        spec(
            r"pydantic\.error_wrappers\.ValidationError.*?(\d+)\s+validation errors?",
            FastApi,
            1.8,
            &["error_count"],
            true,
        ),
        // Database
        spec(
            r"(?:psycopg2|mysql|sqlite3)\.(?:\w+\.)?(\w+Error):\s*(.+)",
            Database,
            2.0,
            &["error_type", "message"],
            false,
        ),
        spec(
            r"SQLSTATE\[(\w+)\].*?:\s*(.+)",
            Database,
            2.0,
            &["sql_state", "message"],
            false,
        ),
        spec(r"MongoError:\s*(.+)", Database, 1.8, &["message"], false),
        // Docker
        spec(
            r"docker:\s*Error response from daemon:\s*(.+)",
            Docker,
            2.0,
            &["message"],
            false,
        ),
        spec(
            r#"ERROR:\s*Service\s+['"`](\w+)['"`]\s+failed to build:\s*(.+)"#,
            Docker,
            2.0,
            &["service", "reason"],
            false,
        ),
        spec(
            r"container_linux\.go:\d+:.*?(?:starting container process|exec).*?:\s*(.+)",
            Docker,
            1.8,
            &["message"],
            false,
        ),
        // CI/CD and build
        spec(r"##\[error\](.+)", Cicd, 2.0, &["message"], false),
        spec(
            r#"The job was canceled because\s+"(.+?)""#,
            Cicd,
            1.8,
            &["reason"],
            false,
        ),
        spec(r"npm ERR!\s+(.+?)$", Build, 1.8, &["message"], false),
        spec(
            r"ERROR:\s*Failed to build\s+(.+)",
            Build,
            2.0,
            &["target"],
            false,
        ),
        spec(r"Module build failed|Failed to compile", Build, 1.5, &[], false),
        // Security
        spec(
            r"(?:authentication failed|unauthorized|forbidden|security vulnerability)",
            Security,
            1.8,
            &[],
            false,
        ),
    ]
}
