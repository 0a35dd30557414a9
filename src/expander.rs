//! Expansion driver.
//!
//! Scans the template, parses each placeholder, resolves its head, runs
//! the filter pipeline and emits the result. Output is produced segment by
//! segment; any failure aborts the whole call with a single error.

use std::io::Write;

use log::{Level, LevelFilter};

use crate::constants::DIAGNOSTICS_TARGET;
use crate::encoding::{EncodedWriter, OutputEncoding};
use crate::error::{Error, Position, Result};
use crate::filters::{Filter, FilterContext, Registry};
use crate::parser::{parse_placeholder, Head, ParsedPlaceholder};
use crate::resolver::{EnvironmentView, Scope, Unresolved, VariableTable};
use crate::scanner::{scan, snippet, RawPlaceholder, Segment};
use crate::value::FilterValue;

/// Per-call diagnostics switch. Records go to the installed `log` backend
/// under [`DIAGNOSTICS_TARGET`], and only up to `level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostics {
    pub level: LevelFilter,
}

impl Diagnostics {
    pub fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    pub fn off() -> Self {
        Self::new(LevelFilter::Off)
    }

    pub fn allows(&self, level: Level) -> bool {
        level <= self.level
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::off()
    }
}

macro_rules! diag {
    ($diagnostics:expr, $level:expr, $($arg:tt)+) => {
        if $diagnostics.allows($level) {
            log::log!(target: DIAGNOSTICS_TARGET, $level, $($arg)+);
        }
    };
}

/// Everything about an expansion call besides the template and scope.
#[derive(Debug, Clone, Default)]
pub struct ExpandOptions {
    pub encoding: OutputEncoding,
    pub diagnostics: Diagnostics,
    pub filter_context: FilterContext,
}

impl ExpandOptions {
    pub fn with_encoding(mut self, encoding: OutputEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_filter_context(mut self, filter_context: FilterContext) -> Self {
        self.filter_context = filter_context;
        self
    }
}

/// Expands templates against one variable table and environment view.
pub struct Expander<'a> {
    scope: Scope<'a>,
    registry: Registry,
    options: ExpandOptions,
}

impl<'a> Expander<'a> {
    pub fn new(variables: &'a VariableTable, environment: &'a EnvironmentView) -> Self {
        Self {
            scope: Scope::new(variables, environment),
            registry: Registry::new(),
            options: ExpandOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExpandOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ExpandOptions {
        &self.options
    }

    /// Expands `template` into a string.
    ///
    /// # Errors
    /// Any parse, resolution, filter or binary-output error; nothing is
    /// returned on failure.
    pub fn expand(&self, template: &str) -> Result<String> {
        let mut out = String::with_capacity(template.len());
        self.drive(template, |chunk| {
            out.push_str(chunk);
            Ok(())
        })?;
        Ok(out)
    }

    /// Streams the expansion of `template` into `out` using the configured
    /// encoding, and returns the writer.
    ///
    /// On error `out` may already hold a prefix of the output; callers that
    /// write files should stage into a temporary file (see
    /// [`crate::processor`]).
    pub fn expand_to<W: Write>(&self, template: &str, out: W) -> Result<W> {
        self.expand_encoded(template, out, self.options.encoding)
    }

    /// Like [`Expander::expand_to`] with an explicit encoding for this call.
    pub fn expand_encoded<W: Write>(&self, template: &str, out: W, encoding: OutputEncoding) -> Result<W> {
        let mut writer = EncodedWriter::new(out, encoding);
        self.drive(template, |chunk| writer.write_str(chunk).map_err(Error::IoError))?;
        Ok(writer.finish()?)
    }

    /// Scans and parses `template` and checks filter names and argument
    /// counts without resolving anything. Returns the placeholder count.
    pub fn check(&self, template: &str) -> Result<usize> {
        let mut count = 0;
        for segment in scan(template) {
            if let Segment::Placeholder(raw) = segment? {
                let parsed = parse_placeholder(template, &raw)?;
                self.compile(template, &parsed)?;
                count += 1;
            }
        }
        Ok(count)
    }

    fn drive(&self, template: &str, mut emit: impl FnMut(&str) -> Result<()>) -> Result<()> {
        let diagnostics = self.options.diagnostics;
        let mut placeholders = 0usize;

        for segment in scan(template) {
            match segment? {
                Segment::Literal(text) => {
                    diag!(diagnostics, Level::Trace, "literal: {} bytes", text.len());
                    emit(text)?;
                }
                Segment::Placeholder(raw) => {
                    let value = self.evaluate(template, &raw)?;
                    diag!(
                        diagnostics,
                        Level::Debug,
                        "placeholder at {}: '{}' -> '{}'",
                        Position::locate(template, raw.start),
                        raw.raw,
                        snippet(&value)
                    );
                    placeholders += 1;
                    emit(&value)?;
                }
            }
        }

        diag!(diagnostics, Level::Debug, "expanded {} placeholders", placeholders);
        Ok(())
    }

    /// Looks up every filter of the pipeline and checks its arity.
    fn compile(&self, template: &str, parsed: &ParsedPlaceholder) -> Result<Vec<&'static Filter>> {
        parsed
            .pipeline
            .iter()
            .map(|call| {
                let position = || Position::locate(template, call.offset);
                let filter = self.registry.get(&call.name).ok_or_else(|| Error::UnknownFilter {
                    position: position(),
                    filter: call.name.clone(),
                })?;
                filter.check_arity(call.args.len()).map_err(|fault| Error::FilterError {
                    position: position(),
                    filter: call.name.clone(),
                    reason: fault.to_string(),
                })?;
                Ok(filter)
            })
            .collect()
    }

    fn evaluate(&self, template: &str, raw: &RawPlaceholder<'_>) -> Result<String> {
        let parsed = parse_placeholder(template, raw)?;
        let filters = self.compile(template, &parsed)?;

        let head = self.scope.resolve(&parsed.head).map_err(|missing| {
            let position = Position::locate(template, parsed.head_offset);
            match missing {
                Unresolved::Variable(name) => Error::UndefinedVariable { position, name },
                Unresolved::Environment(name) => Error::UndefinedEnvironmentVariable { position, name },
            }
        })?;

        let mut value = FilterValue::Text(head.to_string());
        for (call, filter) in parsed.pipeline.iter().zip(filters) {
            value = filter
                .apply(value, &call.args, &self.options.filter_context)
                .map_err(|fault| Error::FilterError {
                    position: Position::locate(template, call.offset),
                    filter: call.name.clone(),
                    reason: fault.to_string(),
                })?;
            diag!(
                self.options.diagnostics,
                Level::Trace,
                "{} {} -> {}",
                head_label(&parsed.head),
                call.name,
                value.kind()
            );
        }

        value.into_text().ok_or_else(|| Error::BinaryOutput {
            position: Position::locate(template, raw.start),
            snippet: snippet(raw.raw),
        })
    }
}

fn head_label(head: &Head) -> String {
    match head {
        Head::Variable(name) => format!("var.{name}"),
        Head::Environment(name) => format!("env.{name}"),
    }
}
