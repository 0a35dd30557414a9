//! Path normalisation filters.
//!
//! Input separators may be `\` or `/` in any mix. Output uses the target
//! style only. `.` segments and repeated separators collapse, `..` pops
//! the previous segment and never climbs above a root.

use super::{expect_text, FilterContext, FilterFault, Platform};
use crate::value::FilterValue;

type Outcome = Result<FilterValue, FilterFault>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Windows,
    Linux,
}

impl Style {
    fn separator(self) -> char {
        match self {
            Style::Windows => '\\',
            Style::Linux => '/',
        }
    }

    fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Windows => Style::Windows,
            Platform::Unix => Style::Linux,
        }
    }
}

fn is_separator(c: char) -> bool {
    c == '\\' || c == '/'
}

/// Root part of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root {
    None,
    /// `\` or `/`
    Separator,
    /// `\\server` or `//server`
    Unc,
    /// `C:` with or without a following separator
    Drive { letter: char, rooted: bool },
}

#[derive(Debug)]
struct SplitPath<'a> {
    root: Root,
    segments: Vec<&'a str>,
}

impl<'a> SplitPath<'a> {
    fn parse(path: &'a str) -> Self {
        let mut chars = path.chars();
        let (root, rest) = match (chars.next(), chars.next()) {
            (Some(letter), Some(':')) if letter.is_ascii_alphabetic() => {
                let rest = &path[2..];
                let rooted = rest.starts_with(is_separator);
                (Root::Drive { letter, rooted }, rest)
            }
            (Some(a), Some(b)) if is_separator(a) && is_separator(b) => (Root::Unc, &path[2..]),
            (Some(a), _) if is_separator(a) => (Root::Separator, &path[1..]),
            _ => (Root::None, path),
        };

        let mut split = Self { root, segments: Vec::new() };
        split.push_all(rest);
        split
    }

    fn is_rooted(&self) -> bool {
        !matches!(self.root, Root::None)
    }

    fn push_all(&mut self, rest: &'a str) {
        for segment in rest.split(is_separator) {
            match segment {
                "" | "." => {}
                ".." => match self.segments.last() {
                    Some(&last) if last != ".." => {
                        self.segments.pop();
                    }
                    _ if self.is_rooted() => {}
                    _ => self.segments.push(".."),
                },
                other => self.segments.push(other),
            }
        }
    }

    fn render(&self, style: Style) -> String {
        let sep = style.separator();
        let mut out = String::new();
        match (self.root, style) {
            (Root::None, _) => {}
            (Root::Separator, _) => out.push(sep),
            (Root::Unc, _) => {
                out.push(sep);
                out.push(sep);
            }
            (Root::Drive { letter, rooted }, Style::Windows) => {
                out.push(letter);
                out.push(':');
                if rooted {
                    out.push(sep);
                }
            }
            (Root::Drive { letter, .. }, Style::Linux) => {
                out.push('/');
                out.push(letter.to_ascii_lowercase());
                if !self.segments.is_empty() {
                    out.push('/');
                }
            }
        }

        out.push_str(&self.segments.join(&sep.to_string()));
        if out.is_empty() {
            out.push('.');
        }
        out
    }
}

fn normalize(input: &str, style: Style, cwd: Option<&str>) -> String {
    let path = SplitPath::parse(input);
    let path = match (cwd, path.root) {
        (Some(cwd), Root::None) => {
            let mut base = SplitPath::parse(cwd);
            base.push_all(input);
            base
        }
        (Some(_), Root::Drive { letter, rooted: false }) => {
            let mut rooted = SplitPath { root: Root::Drive { letter, rooted: true }, segments: Vec::new() };
            rooted.push_all(&input[2..]);
            rooted
        }
        // `\foo` is relative to the drive or share of the working directory.
        (Some(cwd), Root::Separator) if style == Style::Windows => {
            let base = SplitPath::parse(cwd);
            let mut rooted = match base.root {
                Root::Drive { letter, .. } => {
                    SplitPath { root: Root::Drive { letter, rooted: true }, segments: Vec::new() }
                }
                Root::Unc => SplitPath {
                    root: Root::Unc,
                    segments: base.segments.iter().take(2).copied().collect(),
                },
                Root::None | Root::Separator => SplitPath { root: Root::Separator, segments: Vec::new() },
            };
            rooted.push_all(input);
            rooted
        }
        _ => path,
    };
    path.render(style)
}

fn path_filter(value: FilterValue, style: Style, absolute: bool, ctx: &FilterContext) -> Outcome {
    let text = expect_text(value)?;
    if !absolute {
        return Ok(normalize(&text, style, None).into());
    }
    if ctx.cwd.as_os_str().is_empty() {
        return Err(FilterFault::NoWorkingDirectory);
    }
    let cwd = ctx.cwd.to_string_lossy();
    Ok(normalize(&text, style, Some(cwd.as_ref())).into())
}

pub(super) fn pathwin(value: FilterValue, _: &[String], ctx: &FilterContext) -> Outcome {
    path_filter(value, Style::Windows, false, ctx)
}

pub(super) fn pathwinabs(value: FilterValue, _: &[String], ctx: &FilterContext) -> Outcome {
    path_filter(value, Style::Windows, true, ctx)
}

pub(super) fn pathlinux(value: FilterValue, _: &[String], ctx: &FilterContext) -> Outcome {
    path_filter(value, Style::Linux, false, ctx)
}

pub(super) fn pathlinuxabs(value: FilterValue, _: &[String], ctx: &FilterContext) -> Outcome {
    path_filter(value, Style::Linux, true, ctx)
}

pub(super) fn pathos(value: FilterValue, _: &[String], ctx: &FilterContext) -> Outcome {
    path_filter(value, Style::for_platform(ctx.platform), false, ctx)
}

pub(super) fn pathosabs(value: FilterValue, _: &[String], ctx: &FilterContext) -> Outcome {
    path_filter(value, Style::for_platform(ctx.platform), true, ctx)
}

/// Joins one segment with exactly one separator. The separator already
/// used by the input wins; otherwise the host separator is used.
pub(super) fn pathappend(value: FilterValue, args: &[String], ctx: &FilterContext) -> Outcome {
    let base = expect_text(value)?;
    let sep = match (base.contains('\\'), base.contains('/')) {
        (true, false) => '\\',
        (false, true) | (true, true) => '/',
        (false, false) => Style::for_platform(ctx.platform).separator(),
    };
    let segment: String = args[0]
        .trim_start_matches(is_separator)
        .chars()
        .map(|c| if is_separator(c) { sep } else { c })
        .collect();
    if base.is_empty() {
        return Ok(segment.into());
    }

    let mut out = base.trim_end_matches(is_separator).to_string();
    if out.is_empty() || (out.ends_with(':') && base.len() > out.len()) {
        // Keep a bare root such as "/" or "C:\".
        out = base[..out.len() + 1].to_string();
    } else {
        out.push(sep);
    }
    out.push_str(&segment);
    Ok(out.into())
}

pub(super) fn pathquote(value: FilterValue, _: &[String], _: &FilterContext) -> Outcome {
    let text = expect_text(value)?;
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        Ok(text.into())
    } else {
        Ok(format!("\"{text}\"").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{run_text, run_with};

    fn text_with(ctx: &FilterContext, name: &str, input: &str, args: &[&str]) -> String {
        run_with(ctx, name, input, args).unwrap().into_text().unwrap()
    }

    #[test]
    fn test_pathwin() {
        assert_eq!(run_text("pathwin", "a/b\\c", &[]), r"a\b\c");
        assert_eq!(run_text("pathwin", r"C:\x\\y\.\z\..\w", &[]), r"C:\x\y\w");
        assert_eq!(run_text("pathwin", "../a/./b/", &[]), r"..\a\b");
        assert_eq!(run_text("pathwin", r"\\server\share\dir", &[]), r"\\server\share\dir");
        assert_eq!(run_text("pathwin", "a/..", &[]), ".");
        assert_eq!(run_text("pathwin", r"C:\..\x", &[]), r"C:\x");
    }

    #[test]
    fn test_pathlinux() {
        assert_eq!(run_text("pathlinux", r"dir\sub\..\file.txt", &[]), "dir/file.txt");
        assert_eq!(run_text("pathlinux", r"C:\Users\me", &[]), "/c/Users/me");
        assert_eq!(run_text("pathlinux", r"D:\", &[]), "/d");
        assert_eq!(run_text("pathlinux", "//a//b/", &[]), "//a/b");
        assert_eq!(run_text("pathlinux", "/../x", &[]), "/x");
    }

    #[test]
    fn test_absolute_variants() {
        let ctx = FilterContext::new("/work/dir", Platform::Unix);
        assert_eq!(text_with(&ctx, "pathlinuxabs", "../other/./f", &[]), "/work/other/f");
        assert_eq!(text_with(&ctx, "pathlinuxabs", "/etc/hosts", &[]), "/etc/hosts");
        assert_eq!(text_with(&ctx, "pathwinabs", "sub", &[]), r"\work\dir\sub");

        let ctx = FilterContext::new(r"C:\work", Platform::Windows);
        assert_eq!(text_with(&ctx, "pathwinabs", r"..\x", &[]), r"C:\x");
        assert_eq!(text_with(&ctx, "pathlinuxabs", "x", &[]), "/c/work/x");
        assert_eq!(text_with(&ctx, "pathwinabs", "D:rel", &[]), r"D:\rel");
        assert_eq!(text_with(&ctx, "pathwinabs", r"\foo", &[]), r"C:\foo");
        assert_eq!(text_with(&ctx, "pathosabs", "/etc", &[]), r"C:\etc");

        let share = FilterContext::new(r"\\server\share\dir", Platform::Windows);
        assert_eq!(text_with(&share, "pathwinabs", r"\x\..\y", &[]), r"\\server\share\y");
    }

    #[test]
    fn test_absolute_variants_need_working_directory() {
        let ctx = FilterContext::new("", Platform::Unix);
        assert_eq!(run_with(&ctx, "pathlinuxabs", "rel/x", &[]), Err(FilterFault::NoWorkingDirectory));
        assert_eq!(text_with(&ctx, "pathlinux", "rel/x", &[]), "rel/x");
    }

    #[test]
    fn test_pathos_follows_platform() {
        let unix = FilterContext::new("/w", Platform::Unix);
        let windows = FilterContext::new(r"C:\w", Platform::Windows);
        assert_eq!(text_with(&unix, "pathos", r"a\b", &[]), "a/b");
        assert_eq!(text_with(&windows, "pathos", "a/b", &[]), r"a\b");
        assert_eq!(text_with(&windows, "pathosabs", "a", &[]), r"C:\w\a");
    }

    #[test]
    fn test_pathappend() {
        assert_eq!(run_text("pathappend", "/usr/", &["/bin"]), "/usr/bin");
        assert_eq!(run_text("pathappend", r"C:\tools", &["bin/x"]), r"C:\tools\bin\x");
        assert_eq!(run_text("pathappend", "/", &["etc"]), "/etc");
        assert_eq!(run_text("pathappend", r"C:\", &["x"]), r"C:\x");
        assert_eq!(run_text("pathappend", "", &["x"]), "x");
        assert_eq!(run_text("pathappend", "rel", &["x"]), "rel/x");
    }

    #[test]
    fn test_pathquote() {
        assert_eq!(run_text("pathquote", r"C:\Program Files", &[]), r#""C:\Program Files""#);
        assert_eq!(run_text("pathquote", r#""already""#, &[]), r#""already""#);
        assert_eq!(run_text("pathquote", "\"", &[]), "\"\"\"");
    }
}
