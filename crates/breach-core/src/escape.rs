//! MySQL string-literal escaping
//!
//! Output is safe between single quotes. `%` and `_` are escaped as well so
//! imported values stay literal when later matched with LIKE.

/// Escape raw text for embedding in a single-quoted SQL literal.
///
/// Not idempotent: escaping twice doubles every backslash.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\u{8}' => out.push_str("\\b"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{1a}' => out.push_str("\\Z"),
            '\'' | '"' | '\\' | '%' | '_' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
