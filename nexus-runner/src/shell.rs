//! Shell quoting for values interpolated into step commands

/// Quotes a single argument for `sh -c`
///
/// Plain words pass through; anything else is wrapped in single quotes with
/// embedded quotes escaped.
pub fn quote_arg(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }

    const SHELL_META: &[char] = &[
        ' ', '\t', '\n', '\'', '"', '\\', '$', '`', '!', '*', '?', '[', ']', '(', ')', '{', '}',
        '<', '>', '|', '&', ';', '#', '~',
    ];

    if !arg.contains(SHELL_META) {
        return arg.to_string();
    }

    format!("'{}'", arg.replace('\'', "'\\''"))
}
