//! String-literal escapes for C#, Java and C.
//!
//! All three share one escape/unescape routine driven by a [`Dialect`]
//! table. Non-ASCII characters are never escaped, so the output stays
//! readable and `from*(esc*(x)) == x` holds for every string.

use super::{expect_text, FilterContext, FilterFault};
use crate::value::FilterValue;
use std::iter::Peekable;
use std::str::Chars;

type Outcome = Result<FilterValue, FilterFault>;

/// What a numeric escape produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    /// A character code point.
    Char,
    /// A single raw byte (C strings are byte arrays).
    Byte,
}

struct Dialect {
    /// `(character, escape letter)` pairs, e.g. `('\n', 'n')`.
    simple: &'static [(char, char)],
    /// Letters accepted after `\` that stand for themselves.
    identity: &'static [char],
    /// Control characters are written as `\ooo` rather than `\uXXXX`.
    octal_controls: bool,
    /// `\x` escape and how many hex digits it may take.
    hex: Option<(Unit, usize)>,
    octal: Option<Unit>,
    /// Three octal digits only when the first is 0-3, as in Java.
    octal_lead_limit: bool,
    /// `\UXXXXXXXX`
    long_unicode: bool,
    /// `\uuuu0041` is legal (Java).
    repeated_u: bool,
}

const CSHARP: Dialect = Dialect {
    simple: &[
        ('\\', '\\'),
        ('"', '"'),
        ('\'', '\''),
        ('\0', '0'),
        ('\u{7}', 'a'),
        ('\u{8}', 'b'),
        ('\u{c}', 'f'),
        ('\n', 'n'),
        ('\r', 'r'),
        ('\t', 't'),
        ('\u{b}', 'v'),
    ],
    identity: &[],
    octal_controls: false,
    hex: Some((Unit::Char, 4)),
    octal: None,
    octal_lead_limit: false,
    long_unicode: true,
    repeated_u: false,
};

const JAVA: Dialect = Dialect {
    simple: &[
        ('\\', '\\'),
        ('"', '"'),
        ('\'', '\''),
        ('\u{8}', 'b'),
        ('\u{c}', 'f'),
        ('\n', 'n'),
        ('\r', 'r'),
        ('\t', 't'),
    ],
    identity: &[],
    octal_controls: false,
    hex: None,
    octal: Some(Unit::Char),
    octal_lead_limit: true,
    long_unicode: false,
    repeated_u: true,
};

const C: Dialect = Dialect {
    simple: &[
        ('\\', '\\'),
        ('"', '"'),
        ('\'', '\''),
        ('\u{7}', 'a'),
        ('\u{8}', 'b'),
        ('\u{c}', 'f'),
        ('\n', 'n'),
        ('\r', 'r'),
        ('\t', 't'),
        ('\u{b}', 'v'),
    ],
    identity: &['?'],
    octal_controls: true,
    hex: Some((Unit::Byte, usize::MAX)),
    octal: Some(Unit::Byte),
    octal_lead_limit: false,
    long_unicode: true,
    repeated_u: false,
};

fn escape(text: &str, dialect: &Dialect) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if let Some(&(_, letter)) = dialect.simple.iter().find(|(raw, _)| *raw == c) {
            out.push('\\');
            out.push(letter);
        } else if c.is_ascii_control() {
            if dialect.octal_controls {
                out.push_str(&format!("\\{:03o}", c as u32));
            } else {
                out.push_str(&format!("\\u{:04X}", c as u32));
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn bad(reason: impl Into<String>) -> FilterFault {
    FilterFault::BadInput(reason.into())
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

fn read_digits(chars: &mut Peekable<Chars<'_>>, radix: u32, max: usize) -> (u32, usize) {
    let mut value: u32 = 0;
    let mut count = 0;
    while count < max {
        let Some(digit) = chars.peek().and_then(|c| c.to_digit(radix)) else {
            break;
        };
        value = value.saturating_mul(radix).saturating_add(digit);
        chars.next();
        count += 1;
    }
    (value, count)
}

fn read_hex(chars: &mut Peekable<Chars<'_>>, exact: usize, escape: char) -> Result<u32, FilterFault> {
    let (value, count) = read_digits(chars, 16, exact);
    if count != exact {
        return Err(bad(format!("'\\{escape}' needs {exact} hex digits")));
    }
    Ok(value)
}

fn code_point(code: u32) -> Result<char, FilterFault> {
    char::from_u32(code).ok_or_else(|| bad(format!("U+{code:X} is not a valid character")))
}

/// Reads the four digits after `\u`, pairing a high surrogate with a
/// following `\uXXXX` low surrogate.
fn read_utf16_unit(chars: &mut Peekable<Chars<'_>>, dialect: &Dialect) -> Result<char, FilterFault> {
    if dialect.repeated_u {
        while chars.peek() == Some(&'u') {
            chars.next();
        }
    }
    let high = read_hex(chars, 4, 'u')?;
    if !(0xD800..=0xDBFF).contains(&high) {
        return code_point(high);
    }

    let mut look = chars.clone();
    if look.next() == Some('\\') && look.next() == Some('u') {
        let low = read_hex(&mut look, 4, 'u')?;
        if (0xDC00..=0xDFFF).contains(&low) {
            *chars = look;
            return code_point(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00));
        }
    }
    Err(bad(format!("unpaired surrogate \\u{high:04X}")))
}

fn push_unit(out: &mut Vec<u8>, unit: Unit, value: u32) -> Result<(), FilterFault> {
    match unit {
        Unit::Char => push_char(out, code_point(value)?),
        Unit::Byte => {
            let byte = u8::try_from(value).map_err(|_| bad(format!("escape value {value:#X} does not fit in a byte")))?;
            out.push(byte);
        }
    }
    Ok(())
}

fn unescape(text: &str, dialect: &Dialect) -> Result<String, FilterFault> {
    let mut out = Vec::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            push_char(&mut out, c);
            continue;
        }
        let Some(e) = chars.next() else {
            return Err(bad("trailing backslash"));
        };
        if let Some(&(raw, _)) = dialect.simple.iter().find(|(_, letter)| *letter == e) {
            push_char(&mut out, raw);
            continue;
        }
        if dialect.identity.contains(&e) {
            push_char(&mut out, e);
            continue;
        }
        match (e, dialect.hex, dialect.octal) {
            ('u', _, _) => push_char(&mut out, read_utf16_unit(&mut chars, dialect)?),
            ('U', _, _) if dialect.long_unicode => {
                let code = read_hex(&mut chars, 8, 'U')?;
                push_char(&mut out, code_point(code)?);
            }
            ('x', Some((unit, max)), _) => {
                let (value, count) = read_digits(&mut chars, 16, max);
                if count == 0 {
                    return Err(bad("'\\x' needs at least one hex digit"));
                }
                push_unit(&mut out, unit, value)?;
            }
            ('0'..='7', _, Some(unit)) => {
                let first = e.to_digit(8).unwrap_or_default();
                let max = if dialect.octal_lead_limit && first > 3 { 1 } else { 2 };
                let (rest, count) = read_digits(&mut chars, 8, max);
                let value = first * 8u32.pow(count as u32) + rest;
                if value > 0o377 {
                    return Err(bad(format!("octal escape \\{value:o} is out of range")));
                }
                push_unit(&mut out, unit, value)?;
            }
            _ => return Err(bad(format!("unknown escape sequence '\\{e}'"))),
        }
    }

    String::from_utf8(out).map_err(|_| bad("escaped bytes are not valid UTF-8"))
}

pub(super) fn esccs(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    Ok(escape(&expect_text(value)?, &CSHARP).into())
}

pub(super) fn fromesccs(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    Ok(unescape(&expect_text(value)?, &CSHARP)?.into())
}

pub(super) fn escjava(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    Ok(escape(&expect_text(value)?, &JAVA).into())
}

pub(super) fn fromescjava(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    Ok(unescape(&expect_text(value)?, &JAVA)?.into())
}

pub(super) fn escc(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    Ok(escape(&expect_text(value)?, &C).into())
}

pub(super) fn fromescc(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    Ok(unescape(&expect_text(value)?, &C)?.into())
}

#[cfg(test)]
mod tests {
    use crate::filters::{run, run_text, FilterFault};

    const SAMPLES: [&str; 5] = [
        "plain text",
        "line1\nline2\t\"quoted\" 'single' \\ back",
        "\u{0}\u{1}\u{7}\u{8}\u{b}\u{c}\u{1b}\u{7f}",
        "Grüße, 東京 🚀",
        r"C:\Program Files\app?",
    ];

    #[test]
    fn test_round_trips() {
        for (enc, dec) in [("esccs", "fromesccs"), ("escjava", "fromescjava"), ("escc", "fromescc")] {
            for sample in SAMPLES {
                let escaped = run_text(enc, sample, &[]);
                assert_eq!(run_text(dec, &escaped, &[]), sample, "{enc}/{dec} on {sample:?}");
            }
        }
    }

    #[test]
    fn test_escape_forms() {
        assert_eq!(run_text("esccs", "a\tb\"c\u{0}", &[]), r#"a\tb\"c\0"#);
        assert_eq!(run_text("escjava", "\u{0}\u{7f}", &[]), r"\u0000\u007F");
        assert_eq!(run_text("escc", "\u{1b}[0m\n", &[]), r"\033[0m\n");
        assert_eq!(run_text("escc", "é", &[]), "é");
    }

    #[test]
    fn test_unescape_numeric_forms() {
        assert_eq!(run_text("fromesccs", r"\x41\u00e9\U0001F680", &[]), "Aé🚀");
        assert_eq!(run_text("fromescjava", r"\uD83D\uDE80 \101 \uuu0042", &[]), "🚀 A B");
        assert_eq!(run_text("fromescc", r"\xC3\xA9 \101\?", &[]), "é A?");
    }

    #[test]
    fn test_unescape_errors() {
        assert!(matches!(run("fromescjava", r"\q", &[]), Err(FilterFault::BadInput(_))));
        assert!(matches!(run("fromescjava", r"\uD83D", &[]), Err(FilterFault::BadInput(_))));
        assert!(matches!(run("fromesccs", "abc\\", &[]), Err(FilterFault::BadInput(_))));
        assert!(matches!(run("fromescc", r"\xFF", &[]), Err(FilterFault::BadInput(_))));
        assert!(matches!(run("fromescc", r"\x100", &[]), Err(FilterFault::BadInput(_))));
        assert!(matches!(run("fromesccs", r"\u12", &[]), Err(FilterFault::BadInput(_))));
        assert!(matches!(run("fromescc", r"\400", &[]), Err(FilterFault::BadInput(_))));
    }

    #[test]
    fn test_java_octal_takes_two_digits_above_three() {
        assert_eq!(run_text("fromescjava", r"\400", &[]), " 0");
        assert_eq!(run_text("fromescjava", r"\377\7", &[]), "\u{ff}\u{7}");
    }
}
