//! URL, XML and registry-script encodings.

use super::{expect_text, FilterContext, FilterFault};
use crate::value::FilterValue;

type Outcome = Result<FilterValue, FilterFault>;

/// Percent-encodes everything outside the RFC 3986 unreserved set.
pub(super) fn urlenc(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    Ok(urlencoding::encode(&expect_text(value)?).into_owned().into())
}

pub(super) fn urldec(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    let text = expect_text(value)?;
    urlencoding::decode(&text)
        .map(|s| s.into_owned().into())
        .map_err(|e| FilterFault::BadInput(format!("percent-decoded bytes are not UTF-8 ({e})")))
}

pub(super) fn xmlenc(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    let text = expect_text(value)?;
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    Ok(out.into())
}

/// The five predefined XML entities and numeric references. Anything else
/// after `&` is kept as written.
fn is_xml_reference(name: &str) -> bool {
    if name.contains(|c: char| c == '&' || c.is_whitespace()) {
        return false;
    }
    matches!(name, "amp" | "lt" | "gt" | "quot" | "apos") || name.starts_with('#')
}

pub(super) fn xmldec(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    let text = expect_text(value)?;
    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_str();
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail[1..].find(';') {
            Some(semi) if is_xml_reference(&tail[1..semi + 1]) => {
                let reference = &tail[..semi + 2];
                out.push_str(&html_escape::decode_html_entities(reference));
                rest = &tail[semi + 2..];
            }
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Ok(out.into())
}

/// Quotes for a `.reg` string value: `"` becomes `\"`.
pub(super) fn regq(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    Ok(expect_text(value)?.replace('"', "\\\"").into())
}

/// Escapes both `\` and `"` for a `.reg` string value.
pub(super) fn regesc(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    let text = expect_text(value)?;
    Ok(text.replace('\\', "\\\\").replace('"', "\\\"").into())
}
