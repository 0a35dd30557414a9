//! Case, whitespace and literal-edit filters.

use super::{expect_text, FilterContext, FilterFault};
use crate::value::FilterValue;

type Outcome = Result<FilterValue, FilterFault>;

fn is_trim_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Keeps `c` when its case mapping is not a single character, so the
/// length in characters never changes (`ß` stays `ß`).
fn single(c: char, mut mapped: impl Iterator<Item = char>) -> char {
    match (mapped.next(), mapped.next()) {
        (Some(m), None) => m,
        _ => c,
    }
}

pub(super) fn lower(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    let text = expect_text(value)?;
    Ok(text.chars().map(|c| single(c, c.to_lowercase())).collect::<String>().into())
}

pub(super) fn upper(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    let text = expect_text(value)?;
    Ok(text.chars().map(|c| single(c, c.to_uppercase())).collect::<String>().into())
}

pub(super) fn trim(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    Ok(expect_text(value)?.trim_matches(is_trim_space).into())
}

pub(super) fn append(value: FilterValue, args: &[String], _: &FilterContext) -> Outcome {
    let mut text = expect_text(value)?;
    text.push_str(&args[0]);
    Ok(text.into())
}

pub(super) fn prepend(value: FilterValue, args: &[String], _: &FilterContext) -> Outcome {
    let text = expect_text(value)?;
    Ok(format!("{}{}", args[0], text).into())
}

/// Replaces every non-overlapping occurrence, left to right. An empty
/// pattern leaves the input untouched.
pub(super) fn replace(value: FilterValue, args: &[String], _: &FilterContext) -> Outcome {
    let text = expect_text(value)?;
    if args[0].is_empty() {
        return Ok(text.into());
    }
    Ok(text.replace(&args[0], &args[1]).into())
}

pub(super) fn default(value: FilterValue, args: &[String], _: &FilterContext) -> Outcome {
    let text = expect_text(value)?;
    if text.is_empty() {
        Ok(args[0].clone().into())
    } else {
        Ok(text.into())
    }
}
