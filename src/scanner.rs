//! Single forward pass over template text.
//!
//! The scanner splits a template into literal runs and raw placeholders
//! without looking inside the placeholders. Escaped markers (`\{{`, `\}}`,
//! `\{\{`, `\}\}`) come out as their own literal segments with the
//! backslash consumed.

use crate::error::{Error, Position, Result};

pub const OPEN_MARKER: &str = "{{";
pub const CLOSE_MARKER: &str = "}}";

/// Escape sequences recognised outside placeholders and their literal output.
const ESCAPES: [(&str, &str); 4] = [
    ("\\{\\{", OPEN_MARKER),
    ("\\}\\}", CLOSE_MARKER),
    ("\\{{", OPEN_MARKER),
    ("\\}}", CLOSE_MARKER),
];

/// A `{{ ... }}` span as found in the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPlaceholder<'a> {
    /// Whole placeholder including both markers.
    pub raw: &'a str,
    /// Text between the markers.
    pub interior: &'a str,
    /// Byte offset of the opening marker.
    pub start: usize,
    /// Byte offset of the first interior byte.
    pub interior_start: usize,
}

/// A segment of template text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text to emit verbatim.
    Literal(&'a str),
    /// Placeholder to parse and resolve.
    Placeholder(RawPlaceholder<'a>),
}

/// Lazy segment iterator. Stops after the first error.
pub struct Scanner<'a> {
    source: &'a str,
    pos: usize,
    failed: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0, failed: false }
    }

    fn escape_at(rest: &str) -> Option<(usize, &'static str)> {
        ESCAPES
            .iter()
            .find(|(seq, _)| rest.starts_with(seq))
            .map(|(seq, out)| (seq.len(), *out))
    }

    fn is_boundary(rest: &str) -> bool {
        rest.starts_with(OPEN_MARKER)
            || (rest.starts_with('\\') && Self::escape_at(rest).is_some())
    }

    /// Finds the closing marker for a placeholder whose interior starts at
    /// `from`. Quoted filter arguments (a `"` right after `:`) are skipped
    /// so they may contain `}}`.
    fn find_close(&self, from: usize) -> Option<usize> {
        let bytes = self.source.as_bytes();
        let mut i = from;
        let mut quoted = false;
        while i < bytes.len() {
            let b = bytes[i];
            if quoted {
                match b {
                    b'\\' => i += 1,
                    b'"' => quoted = false,
                    _ => {}
                }
            } else if b == b'"' && i > from && bytes[i - 1] == b':' {
                quoted = true;
            } else if b == b'}' && bytes.get(i + 1) == Some(&b'}') {
                return Some(i);
            }
            i += 1;
        }
        None
    }

    fn placeholder(&mut self) -> Result<Segment<'a>> {
        let start = self.pos;
        let interior_start = start + OPEN_MARKER.len();
        match self.find_close(interior_start) {
            Some(close) => {
                let end = close + CLOSE_MARKER.len();
                self.pos = end;
                Ok(Segment::Placeholder(RawPlaceholder {
                    raw: &self.source[start..end],
                    interior: &self.source[interior_start..close],
                    start,
                    interior_start,
                }))
            }
            None => Err(Error::UnterminatedPlaceholder {
                position: Position::locate(self.source, start),
                snippet: snippet(&self.source[start..]),
            }),
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Segment<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.source.len() {
            return None;
        }
        let rest = &self.source[self.pos..];

        if let Some((len, out)) = Self::escape_at(rest) {
            self.pos += len;
            return Some(Ok(Segment::Literal(out)));
        }
        if rest.starts_with(OPEN_MARKER) {
            let segment = self.placeholder();
            self.failed = segment.is_err();
            return Some(segment);
        }

        // Markers and escapes are ASCII, so every candidate index is a char boundary.
        let len = rest
            .char_indices()
            .skip(1)
            .find(|(i, _)| Self::is_boundary(&rest[*i..]))
            .map_or(rest.len(), |(i, _)| i);
        self.pos += len;
        Some(Ok(Segment::Literal(&rest[..len])))
    }
}

/// Short excerpt of `text` for error messages: at most one line, 32 chars.
pub fn snippet(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    let mut out: String = line.chars().take(32).collect();
    if out.len() < line.len() {
        out.push_str("...");
    }
    out
}

/// Scans `source` into segments.
pub fn scan(source: &str) -> Scanner<'_> {
    Scanner::new(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(source: &str) -> Vec<Segment<'_>> {
        scan(source).collect::<Result<Vec<_>>>().unwrap()
    }

    fn flatten(segments: &[Segment<'_>]) -> String {
        segments
            .iter()
            .map(|s| match s {
                Segment::Literal(t) => t.to_string(),
                Segment::Placeholder(p) => format!("<{}>", p.interior.trim()),
            })
            .collect()
    }

    #[test]
    fn literal_passthrough() {
        let segs = collect("no tokens here");
        assert_eq!(segs, vec![Segment::Literal("no tokens here")]);
    }

    #[test]
    fn simple_placeholder() {
        let segs = collect("color={{ var.bg }}!");
        assert_eq!(flatten(&segs), "color=<var.bg>!");
        match segs[1] {
            Segment::Placeholder(p) => {
                assert_eq!(p.start, 6);
                assert_eq!(p.interior_start, 8);
                assert_eq!(p.raw, "{{ var.bg }}");
            }
            _ => panic!("Expected placeholder"),
        }
    }

    #[test]
    fn escaped_markers_are_literal() {
        let segs = collect(r"\{{ literal \}} and \{\{ x \}\}");
        assert_eq!(flatten(&segs), "{{ literal }} and {{ x }}");
        assert!(segs.iter().all(|s| matches!(s, Segment::Literal(_))));
    }

    #[test]
    fn lone_backslash_is_literal() {
        let segs = collect(r"C:\temp\{x}");
        assert_eq!(flatten(&segs), r"C:\temp\{x}");
    }

    #[test]
    fn multiline_placeholder() {
        let segs = collect("a {{\n var.x\n | upper\n}} b");
        assert_eq!(flatten(&segs), "a <var.x\n | upper> b");
    }

    #[test]
    fn quoted_argument_may_contain_close_marker() {
        let segs = collect(r#"{{ var.x | append:"}}" }}tail"#);
        assert_eq!(flatten(&segs), r#"<var.x | append:"}}">tail"#);
    }

    #[test]
    fn unterminated_placeholder_reports_offset() {
        let err = scan("ok\noops {{ var.x").collect::<Result<Vec<_>>>().unwrap_err();
        match err {
            Error::UnterminatedPlaceholder { position, snippet } => {
                assert_eq!(position.offset, 8);
                assert_eq!(position.line, 2);
                assert_eq!(snippet, "{{ var.x");
            }
            other => panic!("Expected UnterminatedPlaceholder, got {other:?}"),
        }
    }

    #[test]
    fn stray_close_marker_is_literal() {
        let segs = collect("a }} b");
        assert_eq!(flatten(&segs), "a }} b");
    }
}
