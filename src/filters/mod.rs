//! The fixed filter catalogue and its lookup table.
//!
//! Every filter is a pure function from a [`FilterValue`] and its string
//! arguments to a new [`FilterValue`]. Text-consuming filters reject bytes;
//! byte-consuming filters accept text through its UTF-8 encoding.

mod binary;
mod escape;
mod markup;
mod path;
mod text;

use crate::value::FilterValue;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single filter invocation failed. The expander attaches the
/// filter name and template position.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterFault {
    #[error("expects {expected}, got {got}")]
    Arity { expected: String, got: usize },

    #[error("invalid argument '{arg}': {reason}")]
    BadArgument { arg: String, reason: String },

    #[error("invalid input: {0}")]
    BadInput(String),

    #[error("expects text but received binary data, decode it first with 'utf8' or 'utf16'")]
    ExpectedText,

    #[error("the working directory is unknown, absolute paths cannot be resolved")]
    NoWorkingDirectory,
}

/// Host flavour used by the `pathos*` filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    pub fn host() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }
}

/// Inputs the path filters need from outside the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterContext {
    /// Base for the `*abs` path filters.
    pub cwd: PathBuf,
    pub platform: Platform,
}

impl FilterContext {
    pub fn new(cwd: impl Into<PathBuf>, platform: Platform) -> Self {
        Self { cwd: cwd.into(), platform }
    }

    /// Current working directory and host platform. When the working
    /// directory cannot be read it is left empty and the `*abs` filters fail
    /// with [`FilterFault::NoWorkingDirectory`].
    pub fn from_host() -> Self {
        let cwd = match std::env::current_dir() {
            Ok(cwd) => cwd,
            Err(e) => {
                log::warn!("Cannot read the working directory: {}", e);
                PathBuf::new()
            }
        };
        Self::new(cwd, Platform::host())
    }
}

impl Default for FilterContext {
    fn default() -> Self {
        Self::from_host()
    }
}

type FilterFn = fn(FilterValue, &[String], &FilterContext) -> Result<FilterValue, FilterFault>;

/// One catalogue entry.
pub struct Filter {
    pub name: &'static str,
    min_args: usize,
    max_args: usize,
    run: FilterFn,
}

impl Filter {
    const fn new(name: &'static str, min_args: usize, max_args: usize, run: FilterFn) -> Self {
        Self { name, min_args, max_args, run }
    }

    /// Checks the argument count without running the filter.
    pub fn check_arity(&self, got: usize) -> Result<(), FilterFault> {
        if (self.min_args..=self.max_args).contains(&got) {
            return Ok(());
        }
        let expected = match (self.min_args, self.max_args) {
            (0, 0) => "no arguments".to_string(),
            (1, 1) => "1 argument".to_string(),
            (min, max) if min == max => format!("{min} arguments"),
            (min, max) => format!("{min} to {max} arguments"),
        };
        Err(FilterFault::Arity { expected, got })
    }

    pub fn apply(
        &self,
        value: FilterValue,
        args: &[String],
        ctx: &FilterContext,
    ) -> Result<FilterValue, FilterFault> {
        self.check_arity(args.len())?;
        (self.run)(value, args, ctx)
    }
}

static CATALOGUE: &[Filter] = &[
    Filter::new("lower", 0, 0, text::lower),
    Filter::new("upper", 0, 0, text::upper),
    Filter::new("trim", 0, 0, text::trim),
    Filter::new("append", 1, 1, text::append),
    Filter::new("prepend", 1, 1, text::prepend),
    Filter::new("replace", 2, 2, text::replace),
    Filter::new("default", 1, 1, text::default),
    Filter::new("pathwin", 0, 0, path::pathwin),
    Filter::new("pathwinabs", 0, 0, path::pathwinabs),
    Filter::new("pathlinux", 0, 0, path::pathlinux),
    Filter::new("pathlinuxabs", 0, 0, path::pathlinuxabs),
    Filter::new("pathos", 0, 0, path::pathos),
    Filter::new("pathosabs", 0, 0, path::pathosabs),
    Filter::new("pathappend", 1, 1, path::pathappend),
    Filter::new("pathquote", 0, 0, path::pathquote),
    Filter::new("urlenc", 0, 0, markup::urlenc),
    Filter::new("urldec", 0, 0, markup::urldec),
    Filter::new("xmlenc", 0, 0, markup::xmlenc),
    Filter::new("xmldec", 0, 0, markup::xmldec),
    Filter::new("regq", 0, 0, markup::regq),
    Filter::new("regesc", 0, 0, markup::regesc),
    Filter::new("esccs", 0, 0, escape::esccs),
    Filter::new("fromesccs", 0, 0, escape::fromesccs),
    Filter::new("escjava", 0, 0, escape::escjava),
    Filter::new("fromescjava", 0, 0, escape::fromescjava),
    Filter::new("escc", 0, 0, escape::escc),
    Filter::new("fromescc", 0, 0, escape::fromescc),
    Filter::new("base64", 0, 0, binary::base64),
    Filter::new("frombase64", 0, 0, binary::frombase64),
    Filter::new("hex", 0, 0, binary::hex),
    Filter::new("fromhex", 0, 0, binary::fromhex),
    Filter::new("gzip", 0, 0, binary::gzip),
    Filter::new("gunzip", 0, 0, binary::gunzip),
    Filter::new("utf8", 0, 0, binary::utf8),
    Filter::new("utf16", 0, 0, binary::utf16),
];

/// Name lookup over the catalogue.
pub struct Registry {
    filters: HashMap<&'static str, &'static Filter>,
}

impl Registry {
    pub fn new() -> Self {
        Self { filters: CATALOGUE.iter().map(|f| (f.name, f)).collect() }
    }

    pub fn get(&self, name: &str) -> Option<&'static Filter> {
        self.filters.get(name).copied()
    }

    /// All filter names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.filters.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Unwraps text or fails with [`FilterFault::ExpectedText`].
fn expect_text(value: FilterValue) -> Result<String, FilterFault> {
    value.into_text().ok_or(FilterFault::ExpectedText)
}

#[cfg(test)]
pub(crate) fn run(name: &str, input: impl Into<FilterValue>, args: &[&str]) -> Result<FilterValue, FilterFault> {
    let ctx = FilterContext::new("/work/dir", Platform::Unix);
    run_with(&ctx, name, input, args)
}

#[cfg(test)]
pub(crate) fn run_with(
    ctx: &FilterContext,
    name: &str,
    input: impl Into<FilterValue>,
    args: &[&str],
) -> Result<FilterValue, FilterFault> {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    Registry::new().get(name).expect("known filter").apply(input.into(), &args, ctx)
}

#[cfg(test)]
pub(crate) fn run_text(name: &str, input: &str, args: &[&str]) -> String {
    match run(name, input, args) {
        Ok(FilterValue::Text(s)) => s,
        other => panic!("{name}({input:?}) did not produce text: {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry() {
        let registry = Registry::new();
        assert!(registry.get("lower").is_some());
        assert!(registry.get("frombase64").is_some());
        assert!(registry.get("not_a_real_filter").is_none());
        assert_eq!(registry.names().len(), CATALOGUE.len());
    }

    #[test]
    fn test_arity_is_checked() {
        let err = run("replace", "abc", &["a"]).unwrap_err();
        assert_eq!(err, FilterFault::Arity { expected: "2 arguments".into(), got: 1 });
        assert_eq!(err.to_string(), "expects 2 arguments, got 1");

        let err = run("upper", "abc", &["x"]).unwrap_err();
        assert_eq!(err.to_string(), "expects no arguments, got 1");
    }

    #[test]
    fn test_text_filters_reject_bytes() {
        let err = run("upper", vec![0xffu8, 0x00], &[]).unwrap_err();
        assert_eq!(err, FilterFault::ExpectedText);
    }
}
