//! Human-readable descriptions for common error codes.

/// Look up a short description for an error code seen in logs.
pub fn describe_error_code(code: &str) -> Option<&'static str> {
    let described = match code {
        // TypeScript compiler
        "2322" | "TS2322" => "type is not assignable",
        "2339" | "TS2339" => "property does not exist on type",
        "2345" | "TS2345" => "argument type mismatch",
        "2304" | "TS2304" => "cannot find name",
        "2307" | "TS2307" => "cannot find module",
        "2552" | "TS2552" => "cannot find name, did you mean",
        // Node / socket errno
        "ECONNREFUSED" => "connection refused by the target host",
        "ETIMEDOUT" => "connection timed out",
        "ENOTFOUND" => "DNS lookup failed",
        "ECONNRESET" => "connection reset by peer",
        "EADDRINUSE" => "address already in use",
        "EACCES" => "permission denied",
        "ENOENT" => "no such file or directory",
        // HTTP status
        "400" => "bad request",
        "401" => "unauthorized",
        "403" => "forbidden",
        "404" => "not found",
        "429" => "too many requests",
        "500" => "internal server error",
        "502" => "bad gateway",
        "503" => "service unavailable",
        "504" => "gateway timeout",
        _ => return None,
    };
    Some(described)
}

/// minijinja filter form: unknown codes get a fixed placeholder so the
/// template never renders an empty parenthetical.
pub fn describe_code_filter(code: String) -> String {
    describe_error_code(&code)
        .map(str::to_string)
        .unwrap_or_else(|| "unrecognized code".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(describe_error_code("2322"), Some("type is not assignable"));
        assert_eq!(
            describe_error_code("ECONNREFUSED"),
            Some("connection refused by the target host")
        );
        assert_eq!(describe_error_code("503"), Some("service unavailable"));
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(describe_error_code("XYZ999"), None);
        assert_eq!(describe_code_filter("XYZ999".to_string()), "unrecognized code");
    }
}
