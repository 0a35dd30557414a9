//! Command-line interface implementation for tplexpand.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, CommandFactory, Parser};
use std::path::PathBuf;

use crate::config::parse_assignment;
use crate::encoding::OutputEncoding;
use crate::resolver::EnvCase;

/// Command-line arguments structure for tplexpand.
#[derive(Parser, Debug)]
#[command(author, version, about = "tplexpand: expand {{ var.X | filter }} placeholders in text templates", long_about = None)]
pub struct Args {
    /// Template files or directories of `.tpl` files
    #[arg(value_name = "TEMPLATE", required = true)]
    pub templates: Vec<PathBuf>,

    /// Output file for a single template (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for template directories or several templates
    #[arg(short = 'd', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Define a variable, may be repeated. Overrides variables files.
    #[arg(short = 'D', long = "var", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub vars: Vec<(String, String)>,

    /// JSON or YAML file of variables, may be repeated
    #[arg(long = "vars-file", value_name = "FILE")]
    pub vars_files: Vec<PathBuf>,

    /// Output encoding. Without it `.reg` outputs are UTF-16LE and
    /// everything else is UTF-8.
    #[arg(long, value_enum)]
    pub encoding: Option<OutputEncoding>,

    /// How `env.NAME` lookups treat case (platform default when omitted)
    #[arg(long, value_enum)]
    pub env_case: Option<EnvCase>,

    /// Glob of template paths to skip in directory mode, may be repeated
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Overwrite existing output files
    #[arg(short, long)]
    pub force: bool,

    /// Continue with the remaining templates after a failure
    #[arg(short, long)]
    pub keep_going: bool,

    /// Only parse templates and check filter names and arguments
    #[arg(long)]
    pub check: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let args = Args::try_parse_from([
            "tplexpand",
            "a.tpl",
            "-D",
            "Name=x",
            "--var",
            "Other=y=z",
            "--vars-file",
            "vars.yml",
            "--encoding",
            "utf8-bom",
            "--env-case",
            "insensitive",
            "-o",
            "out.txt",
            "-f",
        ])
        .unwrap();
        assert_eq!(args.templates, vec![PathBuf::from("a.tpl")]);
        assert_eq!(
            args.vars,
            vec![
                ("Name".to_string(), "x".to_string()),
                ("Other".to_string(), "y=z".to_string())
            ]
        );
        assert_eq!(args.encoding, Some(OutputEncoding::Utf8Bom));
        assert_eq!(args.env_case, Some(EnvCase::Insensitive));
        assert_eq!(args.output, Some(PathBuf::from("out.txt")));
        assert!(args.force);
        assert!(!args.keep_going);
    }

    #[test]
    fn test_bad_assignment_rejected() {
        assert!(Args::try_parse_from(["tplexpand", "a.tpl", "-D", "novalue"]).is_err());
    }

    #[test]
    fn test_template_required() {
        let err = Args::try_parse_from(["tplexpand"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }
}
