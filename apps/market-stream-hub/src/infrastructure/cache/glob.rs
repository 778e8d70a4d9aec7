//! Redis-style glob patterns compiled to anchored regular expressions.
//!
//! Supports `*`, `?`, `[...]` classes (with `^` or `!` negation and ranges)
//! and `\` escapes.

use regex::Regex;

use crate::application::ports::CacheError;

/// Compile a glob pattern.
///
/// # Errors
///
/// Returns [`CacheError::InvalidPattern`] for an unterminated class.
pub fn compile(pattern: &str) -> Result<Regex, CacheError> {
    let invalid = |message: &str| CacheError::InvalidPattern {
        pattern: pattern.to_string(),
        message: message.to_string(),
    };

    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');

    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' => match chars.next() {
                Some(escaped) => push_literal(&mut out, escaped),
                None => push_literal(&mut out, '\\'),
            },
            '[' => {
                out.push('[');
                let mut first = true;
                let mut closed = false;
                while let Some(cc) = chars.next() {
                    match cc {
                        ']' if !first => {
                            closed = true;
                            break;
                        }
                        '^' | '!' if first => out.push('^'),
                        '-' if !first => out.push('-'),
                        '\\' => {
                            let escaped = chars.next().ok_or_else(|| invalid("dangling escape"))?;
                            push_literal(&mut out, escaped);
                        }
                        other => push_literal(&mut out, other),
                    }
                    first = false;
                }
                if !closed {
                    return Err(invalid("unterminated character class"));
                }
                out.push(']');
            }
            other => push_literal(&mut out, other),
        }
    }

    out.push('$');
    Regex::new(&out).map_err(|e| invalid(&e.to_string()))
}

fn push_literal(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}
