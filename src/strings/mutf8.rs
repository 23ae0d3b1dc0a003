use std::{borrow::Cow, fmt};

use thiserror::Error;

/// What to do with malformed input while decoding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Fail with a [`DecodeError`] at the first malformed sequence.
    #[default]
    Strict,
    /// Substitute U+FFFD for each malformed sequence.
    Replace,
    /// Drop malformed sequences.
    Ignore,
}

/// The kind of malformation found by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// A literal `0x00` byte; NUL is always encoded as `C0 80`.
    EmbeddedZero,
    /// A byte that can't start a sequence (`0xF0..=0xFF`).
    InvalidLeadByte,
    /// A continuation byte (`10xxxxxx`) where a sequence should start.
    UnexpectedContinuation,
    /// A multi-byte sequence interrupted by a non-continuation byte.
    InvalidContinuation,
    /// A multi-byte sequence cut off by the end of the input.
    Incomplete,
    /// A surrogate half without its partner; not representable in a `str`.
    UnpairedSurrogate,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DecodeErrorKind::EmbeddedZero => "embedded zero byte",
            DecodeErrorKind::InvalidLeadByte => "invalid start byte",
            DecodeErrorKind::UnexpectedContinuation => "unexpected continuation byte",
            DecodeErrorKind::InvalidContinuation => "invalid continuation byte",
            DecodeErrorKind::Incomplete => "unexpected end of data",
            DecodeErrorKind::UnpairedSurrogate => "unpaired surrogate",
        })
    }
}

/// Modified UTF-8 input could not be decoded.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("can't decode modified UTF-8 byte 0x{byte:02x} at offset {offset}: {kind}")]
pub struct DecodeError {
    /// What went wrong
    pub kind: DecodeErrorKind,
    /// Offset of the offending byte
    pub offset: usize,
    /// The offending byte
    pub byte: u8,
}

/// Encode a string as Java's modified UTF-8.
///
/// U+0000 becomes `C0 80` and characters outside the BMP become a 6 byte
/// surrogate pair, so the output never contains a zero byte.
pub fn encode(s: &str) -> Cow<'_, [u8]> {
    cesu8::to_java_cesu8(s)
}

/// Decode modified UTF-8, failing on malformed input.
pub fn decode(bytes: &[u8]) -> Result<Cow<'_, str>, DecodeError> {
    decode_with(bytes, DecodeMode::Strict)
}

/// Decode modified UTF-8 with the given error handling.
pub fn decode_with(bytes: &[u8], mode: DecodeMode) -> Result<Cow<'_, str>, DecodeError> {
    if bytes.iter().all(|&b| (0x01..0x80).contains(&b)) {
        // Plain ASCII (minus NUL) is identical in both encodings.
        if let Ok(s) = std::str::from_utf8(bytes) {
            return Ok(Cow::Borrowed(s));
        }
    }

    let mut out = String::with_capacity(bytes.len());
    let mut pos = 0;
    while pos < bytes.len() {
        match next_unit(bytes, pos) {
            Ok((unit, len)) => {
                if (0xD800..0xDC00).contains(&unit) {
                    // High surrogate: the low half must follow as another
                    // three byte sequence.
                    if let Ok((low, low_len)) = next_unit(bytes, pos + len) {
                        if (0xDC00..0xE000).contains(&low) {
                            let c = 0x10000 + (((unit - 0xD800) << 10) | (low - 0xDC00));
                            if let Some(c) = char::from_u32(c) {
                                out.push(c);
                            }
                            pos += len + low_len;
                            continue;
                        }
                    }
                    fail(&mut out, mode, DecodeErrorKind::UnpairedSurrogate, bytes, pos)?;
                } else if let Some(c) = char::from_u32(unit) {
                    out.push(c);
                } else {
                    fail(&mut out, mode, DecodeErrorKind::UnpairedSurrogate, bytes, pos)?;
                }
                pos += len;
            }
            Err((kind, skip)) => {
                fail(&mut out, mode, kind, bytes, pos)?;
                pos += skip;
            }
        }
    }

    Ok(Cow::Owned(out))
}

fn fail(
    out: &mut String,
    mode: DecodeMode,
    kind: DecodeErrorKind,
    bytes: &[u8],
    offset: usize,
) -> Result<(), DecodeError> {
    match mode {
        DecodeMode::Strict => Err(DecodeError {
            kind,
            offset,
            byte: bytes[offset],
        }),
        DecodeMode::Replace => {
            out.push(char::REPLACEMENT_CHARACTER);
            Ok(())
        }
        DecodeMode::Ignore => Ok(()),
    }
}

fn is_continuation(b: u8) -> bool {
    b & 0xC0 == 0x80
}

/// Decodes one UTF-16 code unit starting at `pos`.
///
/// On failure, returns the error kind and how many bytes to skip before
/// resuming.
fn next_unit(bytes: &[u8], pos: usize) -> Result<(u32, usize), (DecodeErrorKind, usize)> {
    let Some(&lead) = bytes.get(pos) else {
        return Err((DecodeErrorKind::Incomplete, 0));
    };
    let (len, init) = match lead {
        0x00 => return Err((DecodeErrorKind::EmbeddedZero, 1)),
        0x01..=0x7F => return Ok((lead as u32, 1)),
        0x80..=0xBF => return Err((DecodeErrorKind::UnexpectedContinuation, 1)),
        0xC0..=0xDF => (2, (lead & 0x1F) as u32),
        0xE0..=0xEF => (3, (lead & 0x0F) as u32),
        0xF0..=0xFF => return Err((DecodeErrorKind::InvalidLeadByte, 1)),
    };

    let mut unit = init;
    for i in 1..len {
        match bytes.get(pos + i) {
            None => return Err((DecodeErrorKind::Incomplete, bytes.len() - pos)),
            Some(&b) if !is_continuation(b) => return Err((DecodeErrorKind::InvalidContinuation, i)),
            Some(&b) => unit = (unit << 6) | (b & 0x3F) as u32,
        }
    }
    Ok((unit, len))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encode_boundaries() {
        assert_eq!(&*encode("\u{0}"), &[0xC0, 0x80]);
        assert_eq!(&*encode("A"), &[0x41]);
        assert_eq!(&*encode("\u{10000}"), &[0xED, 0xA0, 0x80, 0xED, 0xB0, 0x80]);
        assert_eq!(&*encode("é"), "é".as_bytes());
        assert!(!encode("a\u{0}b\u{1F600}").contains(&0));
    }

    #[test]
    fn round_trip() {
        for s in [
            "",
            "hello",
            "\u{0}",
            "nul\u{0}in\u{0}middle",
            "\u{7FF}\u{800}\u{FFFF}",
            "\u{10000}",
            "emoji \u{1F600} and \u{10FFFF}",
            "mixed é 中文 \u{0} \u{1D11E}",
        ] {
            let encoded = encode(s);
            assert_eq!(decode(&encoded).unwrap(), s, "round trip of {s:?}");
        }
    }

    #[test]
    fn borrowed_for_ascii() {
        assert!(matches!(decode(b"plain").unwrap(), Cow::Borrowed("plain")));
    }

    #[test]
    fn rejects_with_offsets() {
        let cases: &[(&[u8], DecodeErrorKind, usize)] = &[
            (&[0xFF], DecodeErrorKind::InvalidLeadByte, 0),
            (&[0x80], DecodeErrorKind::UnexpectedContinuation, 0),
            (&[0xC0], DecodeErrorKind::Incomplete, 0),
            (&[0x00], DecodeErrorKind::EmbeddedZero, 0),
            (b"ab\x00", DecodeErrorKind::EmbeddedZero, 2),
            (b"abc\xE4\xB8", DecodeErrorKind::Incomplete, 3),
            (b"a\xC3A", DecodeErrorKind::InvalidContinuation, 1),
            (&[0x41, 0xED, 0xA0, 0x80], DecodeErrorKind::UnpairedSurrogate, 1),
        ];
        for &(input, kind, offset) in cases {
            let err = decode(input).unwrap_err();
            assert_eq!((err.kind, err.offset), (kind, offset), "input {input:x?}");
            assert_eq!(err.byte, input[offset]);
        }
    }

    #[test]
    fn replace_and_ignore() {
        for input in [&[0xFF][..], &[0x80], &[0xC0], &[0x00]] {
            assert_eq!(decode_with(input, DecodeMode::Replace).unwrap(), "\u{FFFD}");
            assert_eq!(decode_with(input, DecodeMode::Ignore).unwrap(), "");
        }
        assert_eq!(
            decode_with(b"a\xC3Ab", DecodeMode::Replace).unwrap(),
            "a\u{FFFD}Ab"
        );
        assert_eq!(decode_with(b"a\xC3Ab", DecodeMode::Ignore).unwrap(), "aAb");
    }

    #[test]
    fn error_message() {
        let err = decode(&[0x41, 0xFF]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "can't decode modified UTF-8 byte 0xff at offset 1: invalid start byte"
        );
    }
}
