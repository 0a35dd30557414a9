//! Template file processing.
//! Maps template paths to output targets, expands them and writes the
//! results. File outputs are staged in a temporary file next to the target
//! and only moved into place after a successful expansion.

use crate::constants::TEMPLATE_EXTENSION;
use crate::encoding::{EncodedWriter, OutputEncoding};
use crate::error::{Error, Result};
use crate::expander::Expander;
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::{debug, error, info};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Where an expanded template goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl std::fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputTarget::Stdout => write!(f, "<stdout>"),
            OutputTarget::File(path) => write!(f, "'{}'", path.display()),
        }
    }
}

/// One template to expand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub template: PathBuf,
    pub target: OutputTarget,
}

/// Returns true for `name.ext.tpl` and `name.tpl`.
pub fn is_template_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().extension().and_then(|e| e.to_str()) == Some(TEMPLATE_EXTENSION)
}

/// Output path for a template: the relative path under `output_dir` with
/// the `.tpl` extension removed.
pub fn resolve_target_path<P: AsRef<Path>, Q: AsRef<Path>>(relative: P, output_dir: Q) -> PathBuf {
    let relative = relative.as_ref();
    let target = output_dir.as_ref().join(relative);
    if is_template_file(relative) {
        target.with_extension("")
    } else {
        target
    }
}

/// Compiles `--exclude` patterns.
pub fn build_excludes(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(
            Glob::new(pattern)
                .map_err(|e| Error::ConfigError(format!("invalid exclude pattern '{pattern}': {e}")))?,
        );
    }
    builder
        .build()
        .map_err(|e| Error::ConfigError(format!("exclude patterns failed to build: {e}")))
}

/// Turns command-line inputs into jobs.
///
/// # Arguments
/// * `inputs` - Template files or directories
/// * `output` - Output file, only valid with one template file
/// * `output_dir` - Output directory for directories or several templates
/// * `excludes` - Patterns matched against paths relative to an input directory
///
/// # Errors
/// * `Error::ConfigError` if the combination of inputs and outputs is ambiguous
pub fn collect_jobs(
    inputs: &[PathBuf],
    output: Option<&Path>,
    output_dir: Option<&Path>,
    excludes: &GlobSet,
) -> Result<Vec<Job>> {
    if output.is_some() && output_dir.is_some() {
        return Err(Error::ConfigError("use either --output or --output-dir, not both".into()));
    }

    if let [single] = inputs {
        if single.is_file() && output_dir.is_none() {
            let target = output.map_or(OutputTarget::Stdout, |p| OutputTarget::File(p.to_path_buf()));
            return Ok(vec![Job { template: single.clone(), target }]);
        }
    }
    if output.is_some() {
        return Err(Error::ConfigError("--output needs exactly one template file".into()));
    }
    let output_dir = output_dir.ok_or_else(|| {
        Error::ConfigError("several templates or a template directory need --output-dir".into())
    })?;

    let mut jobs = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).sort_by_file_name() {
                let entry = entry.map_err(|e| Error::IoError(e.into()))?;
                let path = entry.path();
                let relative = path
                    .strip_prefix(input)
                    .map_err(|e| Error::ConfigError(e.to_string()))?;
                if !entry.file_type().is_file() || !is_template_file(path) {
                    continue;
                }
                if excludes.is_match(relative) {
                    debug!("Skipping excluded template {}", relative.display());
                    continue;
                }
                jobs.push(Job {
                    template: path.to_path_buf(),
                    target: OutputTarget::File(resolve_target_path(relative, output_dir)),
                });
            }
        } else if input.is_file() {
            let name = input.file_name().map(PathBuf::from).unwrap_or_default();
            jobs.push(Job {
                template: input.clone(),
                target: OutputTarget::File(resolve_target_path(name, output_dir)),
            });
        } else {
            return Err(Error::ConfigError(format!(
                "template path '{}' does not exist",
                input.display()
            )));
        }
    }
    Ok(jobs)
}

/// Expands jobs with one shared expander.
pub struct Processor<'a> {
    expander: &'a Expander<'a>,
    encoding: Option<OutputEncoding>,
    force: bool,
}

impl<'a> Processor<'a> {
    /// `encoding` of `None` picks the encoding per output path.
    pub fn new(expander: &'a Expander<'a>, encoding: Option<OutputEncoding>, force: bool) -> Self {
        Self { expander, encoding, force }
    }

    fn encoding_for(&self, target: &OutputTarget) -> OutputEncoding {
        match (self.encoding, target) {
            (Some(encoding), _) => encoding,
            (None, OutputTarget::File(path)) => OutputEncoding::for_path(path),
            (None, OutputTarget::Stdout) => OutputEncoding::Utf8,
        }
    }

    /// Expands one job and writes its output.
    pub fn process(&self, job: &Job) -> Result<()> {
        debug!("Expanding {} into {}", job.template.display(), job.target);
        let template = fs::read_to_string(&job.template)?;
        let encoding = self.encoding_for(&job.target);

        match &job.target {
            OutputTarget::Stdout => {
                // Expand fully first so a failure prints nothing.
                let text = self.expander.expand(&template)?;
                let mut writer = EncodedWriter::new(std::io::stdout().lock(), encoding);
                writer.write_str(&text)?;
                drop(writer.finish()?);
                Ok(())
            }
            OutputTarget::File(path) => self.write_file(&template, path, encoding),
        }
    }

    fn write_file(&self, template: &str, path: &Path, encoding: OutputEncoding) -> Result<()> {
        if path.exists() && !self.force {
            return Err(Error::OutputExistsError { path: path.display().to_string() });
        }
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let staged = NamedTempFile::new_in(&parent)?;
        let mut writer = self.expander.expand_encoded(template, BufWriter::new(staged), encoding)?;
        writer.flush()?;
        let staged = writer.into_inner().map_err(|e| Error::IoError(e.into_error()))?;
        staged.persist(path).map_err(|e| Error::IoError(e.error))?;
        Ok(())
    }

    /// Only parses the job's template.
    pub fn check(&self, job: &Job) -> Result<usize> {
        let template = fs::read_to_string(&job.template)?;
        self.expander.check(&template)
    }

    /// Runs every job. Without `keep_going` the first failure is returned;
    /// with it, failures are logged and summarised in `Error::BatchError`.
    pub fn run(&self, jobs: &[Job], keep_going: bool, check_only: bool) -> Result<()> {
        let mut failed = 0;
        for job in jobs {
            let outcome = if check_only {
                self.check(job).map(|n| {
                    info!("{}: {} placeholders ok", job.template.display(), n);
                })
            } else {
                self.process(job)
            };
            match outcome {
                Ok(()) => {
                    if let OutputTarget::File(path) = &job.target {
                        if !check_only {
                            println!("Expanded: '{}'", path.display());
                        }
                    }
                }
                Err(e) if keep_going => {
                    error!("{}: {}", job.template.display(), e);
                    failed += 1;
                }
                Err(e) => {
                    error!("{}: failed", job.template.display());
                    return Err(e);
                }
            }
        }

        if failed > 0 {
            return Err(Error::BatchError { failed, total: jobs.len() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_template_file() {
        assert!(is_template_file("config.json.tpl"));
        assert!(is_template_file("dir/readme.tpl"));
        assert!(!is_template_file("config.json"));
        assert!(!is_template_file("tpl"));
    }

    #[test]
    fn test_resolve_target_path() {
        assert_eq!(
            resolve_target_path("sub/app.conf.tpl", "/out"),
            PathBuf::from("/out/sub/app.conf")
        );
        assert_eq!(resolve_target_path("notes.txt", "/out"), PathBuf::from("/out/notes.txt"));
    }

    #[test]
    fn test_build_excludes() {
        let set = build_excludes(&["drafts/**".to_string(), "*.bak.tpl".to_string()]).unwrap();
        assert!(set.is_match("drafts/a.tpl"));
        assert!(set.is_match("x.bak.tpl"));
        assert!(!set.is_match("keep.tpl"));
        assert!(build_excludes(&["[".to_string()]).is_err());
    }

    #[test]
    fn test_output_and_output_dir_conflict() {
        let err = collect_jobs(
            &[PathBuf::from("a.tpl")],
            Some(Path::new("a")),
            Some(Path::new("out")),
            &GlobSet::empty(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
