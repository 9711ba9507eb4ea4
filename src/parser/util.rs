use std::collections::HashSet;

lazy_static! {
    /// Identifiers that strict mode code may not bind.
    pub static ref STRICT_RESERVED_WORDS: HashSet<&'static str> = [
        "implements",
        "interface",
        "package",
        "private",
        "protected",
        "public",
        "static",
        "eval",
        "arguments",
    ]
    .iter()
    .cloned()
    .collect();
}

pub const DEFAULT_EXPORT_BINDING: &str = "*default*";

/// 1-based line and column of a byte offset.
pub fn line_col(source: &str, index: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, c) in source.char_indices() {
        if i >= index {
            break;
        }
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Strips the quotes of a string literal token and resolves its escape sequences.
pub fn unescape_string_literal(raw: &str) -> Result<String, String> {
    let inner = if raw.len() >= 2 { &raw[1..raw.len() - 1] } else { "" };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some(e) => e,
            None => return Err("unterminated escape sequence".to_string()),
        };
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{0008}'),
            'f' => out.push('\u{000C}'),
            'v' => out.push('\u{000B}'),
            '0' if !chars.peek().map_or(false, |n| n.is_ascii_digit()) => out.push('\0'),
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                out.push(code_point(&hex, 2)?);
            }
            'u' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    let mut hex = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(h) => hex.push(h),
                            None => return Err("unterminated unicode escape".to_string()),
                        }
                    }
                    out.push(code_point(&hex, hex.len().max(1))?);
                } else {
                    let hex: String = chars.by_ref().take(4).collect();
                    out.push(code_point(&hex, 4)?);
                }
            }
            // Line continuation.
            '\n' | '\u{2028}' | '\u{2029}' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

fn code_point(hex: &str, expected_len: usize) -> Result<char, String> {
    if hex.len() != expected_len || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("invalid escape sequence '{}'", hex));
    }
    u32::from_str_radix(hex, 16)
        .ok()
        .and_then(std::char::from_u32)
        .ok_or_else(|| format!("invalid code point '{}'", hex))
}

/// Value of a numeric literal token.
pub fn parse_numeric_literal(raw: &str) -> Result<f64, String> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16)
            .map(|v| v as f64)
            .or_else(|_| {
                // Too large for u64, fold digit by digit.
                hex.chars().try_fold(0f64, |acc, c| {
                    c.to_digit(16)
                        .map(|d| acc * 16.0 + d as f64)
                        .ok_or_else(|| format!("invalid hex literal '{}'", raw))
                })
            });
    }
    let normalized = if raw.ends_with('.') {
        format!("{}0", raw)
    } else if raw.starts_with('.') {
        format!("0{}", raw)
    } else {
        raw.to_string()
    };
    normalized
        .parse::<f64>()
        .map_err(|_| format!("invalid numeric literal '{}'", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_common_escapes() {
        assert_eq!(
            unescape_string_literal(r#""a\nb\t\"c\"""#).unwrap(),
            "a\nb\t\"c\""
        );
        assert_eq!(unescape_string_literal(r"'\x41B\u{43}'").unwrap(), "ABC");
    }

    #[test]
    fn rejects_broken_unicode_escape() {
        assert!(unescape_string_literal(r"'\u00G1'").is_err());
    }

    #[test]
    fn numeric_literal_forms() {
        assert_eq!(parse_numeric_literal("0x1F").unwrap(), 31.0);
        assert_eq!(parse_numeric_literal("1.").unwrap(), 1.0);
        assert_eq!(parse_numeric_literal(".5").unwrap(), 0.5);
        assert_eq!(parse_numeric_literal("2e3").unwrap(), 2000.0);
    }

    #[test]
    fn line_col_counts_newlines() {
        assert_eq!(line_col("ab\ncd", 4), (2, 2));
        assert_eq!(line_col("ab", 0), (1, 1));
    }
}
