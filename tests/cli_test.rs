use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use tplexpand::cli::Args;
use tplexpand::encoding::OutputEncoding;

fn make_args(args: &[&str]) -> Vec<OsString> {
    let mut res = vec![OsString::from("tplexpand")];
    res.extend(args.iter().map(OsString::from));
    res
}

#[test]
fn test_basic_args() {
    let parsed = Args::try_parse_from(make_args(&["./config.json.tpl"])).unwrap();

    assert_eq!(parsed.templates, vec![PathBuf::from("./config.json.tpl")]);
    assert_eq!(parsed.output, None);
    assert_eq!(parsed.output_dir, None);
    assert_eq!(parsed.encoding, None);
    assert!(parsed.vars.is_empty());
    assert!(!parsed.force);
    assert!(!parsed.verbose);
    assert!(!parsed.check);
}

#[test]
fn test_all_flags() {
    let args = make_args(&[
        "--force",
        "--verbose",
        "--keep-going",
        "--check",
        "--output-dir",
        "./out",
        "--exclude",
        "drafts/**",
        "--exclude",
        "*.bak.tpl",
        "./templates",
        "./more",
    ]);
    let parsed = Args::try_parse_from(args).unwrap();

    assert!(parsed.force);
    assert!(parsed.verbose);
    assert!(parsed.keep_going);
    assert!(parsed.check);
    assert_eq!(parsed.output_dir, Some(PathBuf::from("./out")));
    assert_eq!(parsed.exclude, vec!["drafts/**", "*.bak.tpl"]);
    assert_eq!(parsed.templates.len(), 2);
}

#[test]
fn test_short_flags() {
    let args = make_args(&["-f", "-v", "-k", "-d", "out", "-D", "A=1", "-D", "B=", "t.tpl"]);
    let parsed = Args::try_parse_from(args).unwrap();

    assert!(parsed.force);
    assert!(parsed.verbose);
    assert!(parsed.keep_going);
    assert_eq!(parsed.vars, vec![("A".to_string(), "1".to_string()), ("B".to_string(), String::new())]);
}

#[test]
fn test_encoding_values() {
    let parsed = Args::try_parse_from(make_args(&["--encoding", "utf16le", "t.tpl"])).unwrap();
    assert_eq!(parsed.encoding, Some(OutputEncoding::Utf16Le));
    assert!(Args::try_parse_from(make_args(&["--encoding", "latin1", "t.tpl"])).is_err());
}

#[test]
fn test_missing_args() {
    assert!(Args::try_parse_from(make_args(&[])).is_err());
    assert!(Args::try_parse_from(make_args(&["--var", "A=1"])).is_err());
}
