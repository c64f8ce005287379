//! Wire codec for ckb animation commands.
//!
//! Every line is up to three space separated tokens. Each token is
//! percent-escaped the way the ckb host escapes it: the RFC 3986 unreserved
//! set plus `{`, `}` and `=` pass through, every other byte becomes `%XX`.
//! The host relies on the extra pass-through characters (GUIDs and
//! `name=value` preset pairs), so a stricter encoder breaks it.
//! `~` also passes through, unlike the older Python plugin helper, which
//! wrote it as `%7E`; the host decodes both forms.

use crate::error::ProtocolError;
use std::fmt;

/// Maximum number of tokens in one command line
pub const MAX_FIELDS: usize = 3;

// ── Command ──────────────────────────────────────────────────────────

/// One decoded protocol line: `verb [param [value]]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    verb: String,
    param: Option<String>,
    value: Option<String>,
}

impl Command {
    pub fn new(verb: impl Into<String>, param: Option<String>, value: Option<String>) -> Self {
        Self {
            verb: verb.into(),
            param,
            value,
        }
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn param(&self) -> Option<&str> {
        self.param.as_deref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// True when both the verb and the param match, e.g. `is("begin", "run")`.
    pub fn is(&self, verb: &str, param: &str) -> bool {
        self.verb == verb && self.param.as_deref() == Some(param)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.verb)?;
        if let Some(param) = &self.param {
            write!(f, " {param}")?;
        }
        if let Some(value) = &self.value {
            write!(f, " {value}")?;
        }
        Ok(())
    }
}

// ── Encoding ─────────────────────────────────────────────────────────

/// Bytes that are written verbatim.
fn is_passthrough(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~' | b'{' | b'}' | b'=')
}

/// Percent-escape a single token.
pub fn encode_field(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for &b in field.as_bytes() {
        if is_passthrough(b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// Escape every field and join them with single spaces.
///
/// The result never contains a newline, since `\n` is escaped to `%0A`.
pub fn encode<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| encode_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Decoding ─────────────────────────────────────────────────────────

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Undo percent escaping on a raw token, then decode it as UTF-8.
pub fn decode_field(raw: &[u8]) -> Result<String, ProtocolError> {
    let lossy = || String::from_utf8_lossy(raw).into_owned();

    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            let hi = raw.get(i + 1).copied().and_then(hex_value);
            let lo = raw.get(i + 2).copied().and_then(hex_value);
            let (Some(hi), Some(lo)) = (hi, lo) else {
                return Err(ProtocolError::InvalidEscape { token: lossy() });
            };
            bytes.push((hi << 4) | lo);
            i += 3;
        } else {
            bytes.push(raw[i]);
            i += 1;
        }
    }

    String::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8 { token: lossy() })
}

/// Split a line into at most [`MAX_FIELDS`] raw tokens.
///
/// Leading whitespace is skipped and tokens are separated by runs of
/// whitespace. Splitting stops after the second separator, so the last
/// token keeps any embedded (and trailing) whitespace.
fn split_tokens(line: &[u8]) -> Vec<&[u8]> {
    let mut tokens = Vec::with_capacity(MAX_FIELDS);
    let mut rest = line;

    loop {
        let start = rest.iter().position(|&b| !is_space(b)).unwrap_or(rest.len());
        rest = &rest[start..];
        if rest.is_empty() {
            break;
        }
        if tokens.len() == MAX_FIELDS - 1 {
            tokens.push(rest);
            break;
        }
        let end = rest.iter().position(|&b| is_space(b)).unwrap_or(rest.len());
        tokens.push(&rest[..end]);
        rest = &rest[end..];
    }

    tokens
}

/// Decode one input line into a [`Command`].
///
/// Trailing newlines are stripped first. Missing trailing fields come back
/// as `None`; an empty line decodes to an empty verb.
pub fn decode(line: &[u8]) -> Result<Command, ProtocolError> {
    let end = line.iter().rposition(|&b| b != b'\n').map_or(0, |p| p + 1);
    let mut fields = split_tokens(&line[..end])
        .into_iter()
        .map(decode_field)
        .collect::<Result<Vec<_>, _>>()?
        .into_iter();

    Ok(Command {
        verb: fields.next().unwrap_or_default(),
        param: fields.next(),
        value: fields.next(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_keeps_braces_and_equals() {
        assert_eq!(
            encode_field("{E0BBA19E-C328-4C0E-8E3C-A06D5722B4FB}"),
            "{E0BBA19E-C328-4C0E-8E3C-A06D5722B4FB}"
        );
        assert_eq!(encode_field("duration=2.0"), "duration=2.0");
    }

    #[test]
    fn test_encode_escapes_reserved() {
        assert_eq!(encode_field("Wave color:"), "Wave%20color%3A");
        assert_eq!(encode_field("%25"), "%2525");
        assert_eq!(encode_field("a/b,c"), "a%2Fb%2Cc");
        assert_eq!(encode_field("é"), "%C3%A9");
        assert_eq!(encode_field("line\nbreak"), "line%0Abreak");
    }

    #[test]
    fn test_encode_joins_fields() {
        assert_eq!(encode(&["argb", "esc", "ffff00ff"]), "argb esc ffff00ff");
        assert_eq!(encode(&["begin", "run"]), "begin run");
    }

    #[test]
    fn test_decode_pads_missing_fields() {
        let cmd = decode(b"frame\n").unwrap();
        assert_eq!(cmd.verb(), "frame");
        assert_eq!(cmd.param(), None);
        assert_eq!(cmd.value(), None);

        let cmd = decode(b"begin keymap\n").unwrap();
        assert!(cmd.is("begin", "keymap"));
        assert_eq!(cmd.value(), None);
    }

    #[test]
    fn test_decode_third_token_keeps_whitespace() {
        let cmd = decode(b"param color 0:ffff0000 100:ff0000ff\n").unwrap();
        assert_eq!(cmd.param(), Some("color"));
        assert_eq!(cmd.value(), Some("0:ffff0000 100:ff0000ff"));
    }

    #[test]
    fn test_decode_collapses_whitespace_runs() {
        let cmd = decode(b"  key \t A   0,0").unwrap();
        assert_eq!(cmd.verb(), "key");
        assert_eq!(cmd.param(), Some("A"));
        assert_eq!(cmd.value(), Some("0,0"));
    }

    #[test]
    fn test_decode_unescapes() {
        let cmd = decode(b"param prefix Wave%20color%3A\n").unwrap();
        assert_eq!(cmd.value(), Some("Wave color:"));
        let cmd = decode(b"key %C3%A9 1,2").unwrap();
        assert_eq!(cmd.param(), Some("é"));
    }

    #[test]
    fn test_decode_empty_line() {
        let cmd = decode(b"\n").unwrap();
        assert_eq!(cmd.verb(), "");
        assert_eq!(cmd.param(), None);
    }

    #[test]
    fn test_decode_rejects_bad_escape() {
        assert!(matches!(
            decode(b"key %G1 0,0"),
            Err(ProtocolError::InvalidEscape { .. })
        ));
        assert!(matches!(
            decode(b"key abc%4"),
            Err(ProtocolError::InvalidEscape { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_bad_utf8() {
        assert!(matches!(
            decode(b"key %FF%FE 0,0"),
            Err(ProtocolError::InvalidUtf8 { .. })
        ));
    }

    #[test]
    fn test_roundtrip_reserved_characters() {
        let fields = ["preset", "Vertical rainbow", "angle:180/%,x"];
        let cmd = decode(encode(&fields).as_bytes()).unwrap();
        assert_eq!(cmd.verb(), fields[0]);
        assert_eq!(cmd.param(), Some(fields[1]));
        assert_eq!(cmd.value(), Some(fields[2]));
    }

    #[test]
    fn test_command_display() {
        let cmd = Command::new("key", Some("A".into()), Some("1,2".into()));
        assert_eq!(cmd.to_string(), "key A 1,2");
    }
}
