//! Byte-oriented filters and the bytes-to-text boundary.
//!
//! `frombase64`, `fromhex` and the gzip pair produce bytes. A placeholder
//! holding bytes must pass through `utf8`, `utf16`, `base64` or `hex`
//! before it can be written out.

use super::{expect_text, FilterContext, FilterFault};
use crate::scanner::snippet;
use crate::value::FilterValue;
use ::base64::{engine::general_purpose, Engine as _};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

type Outcome = Result<FilterValue, FilterFault>;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

pub(super) fn base64(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    Ok(general_purpose::STANDARD.encode(value.as_bytes()).into())
}

pub(super) fn frombase64(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    let text = expect_text(value)?;
    let encoded = text.trim();
    general_purpose::STANDARD
        .decode(encoded)
        .map(FilterValue::Bytes)
        .map_err(|e| FilterFault::BadInput(format!("'{}' is not valid Base64 ({e})", snippet(encoded))))
}

pub(super) fn hex(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    let bytes = value.as_bytes();
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(HEX_DIGITS[(b >> 4) as usize] as char);
        out.push(HEX_DIGITS[(b & 0x0f) as usize] as char);
    }
    Ok(out.into())
}

fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

pub(super) fn fromhex(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    let text = expect_text(value)?;
    let digits = text.trim().as_bytes();
    if digits.len() % 2 != 0 {
        return Err(FilterFault::BadInput(format!(
            "hex string has odd length {}",
            digits.len()
        )));
    }
    digits
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| match (hex_nibble(pair[0]), hex_nibble(pair[1])) {
            (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
            _ => Err(FilterFault::BadInput(format!(
                "invalid hex digits '{}' at position {}",
                String::from_utf8_lossy(pair),
                i * 2
            ))),
        })
        .collect::<Result<Vec<u8>, _>>()
        .map(FilterValue::Bytes)
}

pub(super) fn gzip(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(value.as_bytes())
        .and_then(|_| encoder.finish())
        .map(FilterValue::Bytes)
        .map_err(|e| FilterFault::BadInput(format!("gzip compression failed ({e})")))
}

pub(super) fn gunzip(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    let bytes = value.into_bytes();
    let mut out = Vec::new();
    GzDecoder::new(bytes.as_slice())
        .read_to_end(&mut out)
        .map_err(|e| FilterFault::BadInput(format!("not valid gzip data ({e})")))?;
    Ok(FilterValue::Bytes(out))
}

/// Strict UTF-8 decode. Text passes through unchanged.
pub(super) fn utf8(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    match value {
        FilterValue::Text(s) => Ok(s.into()),
        FilterValue::Bytes(b) => String::from_utf8(b)
            .map(FilterValue::Text)
            .map_err(|e| FilterFault::BadInput(format!("bytes are not valid UTF-8 ({e})"))),
    }
}

/// UTF-16LE decode, dropping a leading byte-order mark. Text passes
/// through unchanged.
pub(super) fn utf16(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    let bytes = match value {
        FilterValue::Text(s) => return Ok(s.into()),
        FilterValue::Bytes(b) => b,
    };
    if bytes.len() % 2 != 0 {
        return Err(FilterFault::BadInput(format!(
            "UTF-16 data has odd length {}",
            bytes.len()
        )));
    }
    let units: Vec<u16> = bytes.chunks_exact(2).map(|p| u16::from_le_bytes([p[0], p[1]])).collect();
    let units = units.strip_prefix(&[0xFEFFu16]).unwrap_or(&units);
    String::from_utf16(units)
        .map(FilterValue::Text)
        .map_err(|_| FilterFault::BadInput("bytes are not valid UTF-16".to_string()))
}
