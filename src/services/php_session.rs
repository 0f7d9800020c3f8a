//! Decoder for the PHP `php` session serialization format.
//!
//! FORMAT
//! ======
//! A session file is a flat sequence of `<key>|<value>` entries with no
//! separator between them. Each value uses PHP's `serialize()` encoding:
//!
//! ```text
//! loggedin|b:1;username|s:5:"alice";roles|a:1:{i:0;s:5:"admin";}
//! ```
//!
//! Only reading is supported. The welcome page observes sessions written by
//! the login handler and never writes one back.

/// Nested arrays/objects deeper than this are rejected.
const MAX_DEPTH: usize = 64;

/// Upper bound on capacity reserved up front for a declared element count.
const MAX_PREALLOC: usize = 64;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced while decoding a session payload. Offsets are byte positions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unexpected end of input at byte {offset}")]
    UnexpectedEof { offset: usize },

    #[error("unknown type tag {tag:?} at byte {offset}")]
    UnknownTag { tag: char, offset: usize },

    #[error("invalid length at byte {offset}")]
    InvalidLength { offset: usize },

    #[error("invalid number at byte {offset}")]
    InvalidNumber { offset: usize },

    #[error("expected {expected:?} at byte {offset}")]
    Expected { expected: char, offset: usize },

    #[error("nesting too deep at byte {offset}")]
    TooDeep { offset: usize },
}

// =============================================================================
// VALUES
// =============================================================================

/// A decoded PHP value.
#[derive(Debug, Clone, PartialEq)]
pub enum PhpValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// PHP strings are byte strings; no encoding is assumed.
    Str(Vec<u8>),
    Array(Vec<(PhpValue, PhpValue)>),
    Object { class: String, properties: Vec<(PhpValue, PhpValue)> },
    /// `E:` enum case, kept as its `Class:Case` name.
    Enum(String),
    /// `C:` object with a custom `Serializable` payload, kept undecoded.
    Custom { class: String, payload: Vec<u8> },
    /// `r:`/`R:` back-reference into the value table. Left unresolved.
    Reference(i64),
}

impl PhpValue {
    /// PHP boolean conversion, as used by `if ($value)`.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null | Self::Reference(_) => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !(s.is_empty() || s.as_slice() == b"0"),
            Self::Array(items) => !items.is_empty(),
            Self::Object { .. } | Self::Enum(_) | Self::Custom { .. } => true,
        }
    }
}

/// Top-level entries of a decoded session, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionData {
    entries: Vec<(String, PhpValue)>,
}

impl SessionData {
    /// Value stored under `key`. A repeated key resolves to its last occurrence.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PhpValue> {
        self.entries.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

// =============================================================================
// DECODER
// =============================================================================

/// Decode a complete session payload.
///
/// # Errors
///
/// Returns a [`DecodeError`] describing the first malformed byte.
pub fn decode(input: &[u8]) -> Result<SessionData, DecodeError> {
    let mut decoder = Decoder { input, pos: 0 };
    let mut entries = Vec::new();

    while decoder.pos < input.len() {
        let key_start = decoder.pos;
        let key = decoder.take_until(b'|')?;
        // Older PHP versions write `!key|` for a variable unset in this request; it has no value.
        if let Some(unset) = key.strip_prefix(b"!") {
            let unset = String::from_utf8_lossy(unset);
            entries.retain(|(k, _): &(String, PhpValue)| *k != unset);
            continue;
        }
        if key.is_empty() {
            return Err(DecodeError::Expected { expected: '|', offset: key_start });
        }
        let key = String::from_utf8_lossy(key).into_owned();
        let value = decoder.value(0)?;
        entries.push((key, value));
    }

    Ok(SessionData { entries })
}

struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    fn value(&mut self, depth: usize) -> Result<PhpValue, DecodeError> {
        if depth > MAX_DEPTH {
            return Err(DecodeError::TooDeep { offset: self.pos });
        }

        let tag_offset = self.pos;
        let tag = self.next()?;
        match tag {
            b'N' => {
                self.expect(b';')?;
                Ok(PhpValue::Null)
            }
            b'b' => {
                self.expect(b':')?;
                let offset = self.pos;
                match self.take_until(b';')? {
                    b"0" => Ok(PhpValue::Bool(false)),
                    b"1" => Ok(PhpValue::Bool(true)),
                    _ => Err(DecodeError::InvalidNumber { offset }),
                }
            }
            b'i' => {
                self.expect(b':')?;
                Ok(PhpValue::Int(self.number(b';')?))
            }
            b'd' => {
                self.expect(b':')?;
                Ok(PhpValue::Float(self.float()?))
            }
            b's' => {
                self.expect(b':')?;
                let bytes = self.quoted()?;
                self.expect(b';')?;
                Ok(PhpValue::Str(bytes.to_vec()))
            }
            b'a' => {
                self.expect(b':')?;
                let count = self.length(b':')?;
                Ok(PhpValue::Array(self.members(count, depth)?))
            }
            b'O' => {
                self.expect(b':')?;
                let class = String::from_utf8_lossy(self.quoted()?).into_owned();
                self.expect(b':')?;
                let count = self.length(b':')?;
                let properties = self.members(count, depth)?;
                Ok(PhpValue::Object { class, properties })
            }
            b'E' => {
                self.expect(b':')?;
                let case = String::from_utf8_lossy(self.quoted()?).into_owned();
                self.expect(b';')?;
                Ok(PhpValue::Enum(case))
            }
            b'C' => {
                self.expect(b':')?;
                let class = String::from_utf8_lossy(self.quoted()?).into_owned();
                self.expect(b':')?;
                let len = self.length(b':')?;
                self.expect(b'{')?;
                let payload = self.take(len)?.to_vec();
                self.expect(b'}')?;
                Ok(PhpValue::Custom { class, payload })
            }
            b'r' | b'R' => {
                self.expect(b':')?;
                Ok(PhpValue::Reference(self.number(b';')?))
            }
            other => Err(DecodeError::UnknownTag { tag: char::from(other), offset: tag_offset }),
        }
    }

    /// `{<key><value>...}` with exactly `count` pairs.
    fn members(&mut self, count: usize, depth: usize) -> Result<Vec<(PhpValue, PhpValue)>, DecodeError> {
        self.expect(b'{')?;
        let mut members = Vec::with_capacity(count.min(MAX_PREALLOC));
        for _ in 0..count {
            let key_offset = self.pos;
            let key = self.value(depth + 1)?;
            if !matches!(key, PhpValue::Int(_) | PhpValue::Str(_)) {
                return Err(DecodeError::UnknownTag { tag: char::from(self.input[key_offset]), offset: key_offset });
            }
            let value = self.value(depth + 1)?;
            members.push((key, value));
        }
        self.expect(b'}')?;
        Ok(members)
    }

    /// `<len>:"<bytes>"` where `len` counts bytes.
    fn quoted(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.length(b':')?;
        self.expect(b'"')?;
        let bytes = self.take(len)?;
        self.expect(b'"')?;
        Ok(bytes)
    }

    /// Exactly `len` raw bytes.
    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let start = self.pos;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= self.input.len())
            .ok_or(DecodeError::UnexpectedEof { offset: self.input.len() })?;
        self.pos = end;
        Ok(&self.input[start..end])
    }

    fn length(&mut self, terminator: u8) -> Result<usize, DecodeError> {
        let offset = self.pos;
        let raw = self.take_until(terminator)?;
        std::str::from_utf8(raw)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(DecodeError::InvalidLength { offset })
    }

    fn number(&mut self, terminator: u8) -> Result<i64, DecodeError> {
        let offset = self.pos;
        let raw = self.take_until(terminator)?;
        std::str::from_utf8(raw)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(DecodeError::InvalidNumber { offset })
    }

    fn float(&mut self) -> Result<f64, DecodeError> {
        let offset = self.pos;
        let raw = self.take_until(b';')?;
        match raw {
            b"INF" => Ok(f64::INFINITY),
            b"-INF" => Ok(f64::NEG_INFINITY),
            b"NAN" => Ok(f64::NAN),
            _ => std::str::from_utf8(raw)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or(DecodeError::InvalidNumber { offset }),
        }
    }

    /// Bytes up to (not including) `delim`; consumes the delimiter.
    fn take_until(&mut self, delim: u8) -> Result<&'a [u8], DecodeError> {
        let rest = &self.input[self.pos..];
        let Some(idx) = rest.iter().position(|b| *b == delim) else {
            return Err(DecodeError::UnexpectedEof { offset: self.input.len() });
        };
        let taken = &rest[..idx];
        self.pos += idx + 1;
        Ok(taken)
    }

    fn next(&mut self) -> Result<u8, DecodeError> {
        let byte = *self
            .input
            .get(self.pos)
            .ok_or(DecodeError::UnexpectedEof { offset: self.pos })?;
        self.pos += 1;
        Ok(byte)
    }

    fn expect(&mut self, expected: u8) -> Result<(), DecodeError> {
        let offset = self.pos;
        match self.next()? {
            b if b == expected => Ok(()),
            _ => Err(DecodeError::Expected { expected: char::from(expected), offset }),
        }
    }
}

#[cfg(test)]
#[path = "php_session_test.rs"]
mod tests;
