//! Quoted-string codec.
//!
//! Strings are the only value type that may carry arbitrary bytes, so they
//! are fenced by `"` and backslash-escaped. `\n` and `\r` decode to the
//! control characters; any other escaped byte decodes to itself. A raw `;`
//! or `:` inside the quotes is corrupt input, not data.

use super::{ParseCursor, Value};
use crate::error::ParseError;
use crate::Result;

impl Value for String {
    fn load(&mut self, cur: &mut ParseCursor<'_>) -> Result<()> {
        self.clear();
        load_quoted(cur, self)
    }

    fn save(&self, out: &mut String) -> bool {
        out.push('"');
        escape_into(out, self);
        out.push('"');
        true
    }

    fn is_default(&self, reference: &Self) -> bool {
        self == reference
    }
}

/// Decodes one quoted string at the cursor into `out`.
pub(crate) fn load_quoted(cur: &mut ParseCursor<'_>, out: &mut String) -> Result<()> {
    cur.expect(b'"')?;

    let line = cur.line();
    let bytes = line.as_bytes();
    let mut collected: Vec<u8> = Vec::new();
    let mut idx = cur.pos();
    let mut span_start = idx;

    loop {
        let Some(&byte) = bytes.get(idx) else {
            return Err(ParseError::MissingDelimiter('"'));
        };
        match byte {
            b'\\' => {
                collected.extend_from_slice(&bytes[span_start..idx]);
                let Some(&escaped) = bytes.get(idx + 1) else {
                    return Err(ParseError::MissingDelimiter('"'));
                };
                collected.push(match escaped {
                    b'n' => b'\n',
                    b'r' => b'\r',
                    other => other,
                });
                idx += 2;
                span_start = idx;
            }
            b'"' => {
                collected.extend_from_slice(&bytes[span_start..idx]);
                idx += 1;
                break;
            }
            b';' | b':' => return Err(ParseError::UnexpectedCharacter(byte as char)),
            _ => idx += 1,
        }
    }

    cur.advance(idx - cur.pos());
    // Removing ASCII backslashes from valid UTF-8 cannot break it, but keep
    // the failure path an ordinary parse error all the same.
    let text =
        String::from_utf8(collected).map_err(|_| ParseError::BadTerm("Bad string"))?;
    out.push_str(&text);
    Ok(())
}

/// Appends `value` with every structurally significant byte escaped.
pub(crate) fn escape_into(out: &mut String, value: &str) {
    let bytes = value.as_bytes();
    let mut span_start = 0;
    for (idx, &byte) in bytes.iter().enumerate() {
        let escaped = match byte {
            b'\n' => "\\n",
            b'\r' => "\\r",
            b'"' => "\\\"",
            b';' => "\\;",
            b':' => "\\:",
            b'[' => "\\[",
            b']' => "\\]",
            b',' => "\\,",
            b'%' => "\\%",
            b'\\' => "\\\\",
            _ => continue,
        };
        if span_start < idx {
            out.push_str(&value[span_start..idx]);
        }
        out.push_str(escaped);
        span_start = idx + 1;
    }
    if span_start < value.len() {
        out.push_str(&value[span_start..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every byte the writer must escape.
    const NEEDS_ESCAPE: &[u8] = b"\n\r\";:[],%\\";

    fn load(input: &str) -> Result<(String, usize)> {
        let mut cur = ParseCursor::new(input);
        let mut value = String::new();
        value.load(&mut cur)?;
        Ok((value, cur.pos()))
    }

    fn save(value: &str) -> String {
        let mut out = String::new();
        assert!(value.to_string().save(&mut out));
        out
    }

    #[rstest::rstest]
    #[case(r#""hello""#, "hello")]
    #[case(r#""""#, "")]
    #[case(r#""a\nb""#, "a\nb")]
    #[case(r#""a\rb""#, "a\rb")]
    #[case(r#""q\"t""#, "q\"t")]
    #[case(r#""p\\q""#, "p\\q")]
    #[case(r#""\;\:\[\]\,\%""#, ";:[],%")]
    #[case("\"caf\u{e9}\"", "caf\u{e9}")]
    fn test_load(#[case] input: &str, #[case] expected: &str) {
        let (value, pos) = load(input).unwrap();
        assert_eq!(value, expected);
        assert_eq!(pos, input.len());
    }

    #[rstest::rstest]
    fn test_load_stops_after_closing_quote() {
        let (value, pos) = load(r#""ab";X:1;"#).unwrap();
        assert_eq!(value, "ab");
        assert_eq!(pos, 4);
    }

    #[rstest::rstest]
    #[case("noquote")]
    #[case("")]
    fn test_load_requires_opening_quote(#[case] input: &str) {
        assert!(matches!(
            load(input),
            Err(ParseError::MissingDelimiter('"'))
        ));
    }

    #[rstest::rstest]
    #[case(r#""abc"#)]
    #[case(r#""abc\"#)]
    fn test_load_unterminated(#[case] input: &str) {
        assert!(matches!(
            load(input),
            Err(ParseError::MissingDelimiter('"'))
        ));
    }

    #[rstest::rstest]
    #[case("\"a;b\"", ';')]
    #[case("\"a:b\"", ':')]
    fn test_raw_separator_inside_quotes(#[case] input: &str, #[case] bad: char) {
        match load(input) {
            Err(ParseError::UnexpectedCharacter(ch)) => assert_eq!(ch, bad),
            other => panic!("expected UnexpectedCharacter, got {other:?}"),
        }
    }

    #[rstest::rstest]
    #[case("plain", "\"plain\"")]
    #[case("a\nb", "\"a\\nb\"")]
    #[case("x;y:z", "\"x\\;y\\:z\"")]
    #[case("50%", "\"50\\%\"")]
    #[case("[a,b]", "\"\\[a\\,b\\]\"")]
    #[case("back\\slash", "\"back\\\\slash\"")]
    fn test_save(#[case] value: &str, #[case] expected: &str) {
        assert_eq!(save(value), expected);
    }

    #[rstest::rstest]
    fn test_every_special_byte_round_trips() {
        for &byte in NEEDS_ESCAPE {
            let original = format!("a{}b", byte as char);
            let encoded = save(&original);
            let (decoded, _) = load(&encoded).unwrap();
            assert_eq!(decoded, original, "byte {byte:#x}");
        }
    }
}
