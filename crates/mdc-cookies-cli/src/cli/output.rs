//! Output mode flags and shared printing helpers.
//!
//! Global flags are published through environment variables by `main` so
//! every subcommand can check them without threading a context around.

const JSON_VAR: &str = "MDC_COOKIES_JSON";
const VERBOSE_VAR: &str = "MDC_COOKIES_VERBOSE";

pub fn set_json() {
    std::env::set_var(JSON_VAR, "1");
}

pub fn set_verbose() {
    std::env::set_var(VERBOSE_VAR, "1");
}

/// Whether machine-readable output was requested.
pub fn is_json() -> bool {
    std::env::var_os(JSON_VAR).is_some()
}

pub fn is_verbose() -> bool {
    std::env::var_os(VERBOSE_VAR).is_some()
}

/// Pretty-print a JSON value to stdout.
pub fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("  Error: failed to encode JSON: {e}"),
    }
}

/// A title underlined with `=` to its own width.
pub fn heading(title: &str) -> String {
    format!("{title}\n{}", "=".repeat(title.chars().count()))
}

/// `[OK]` or `[!!]`.
pub fn marker(ok: bool) -> &'static str {
    if ok {
        "[OK]"
    } else {
        "[!!]"
    }
}
