use std::io;

use tplexpand::error::{Error, Position};
use tplexpand::expander::Expander;
use tplexpand::resolver::{EnvCase, EnvironmentView, VariableTable};

#[test]
fn test_error_conversion() {
    let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let err: Error = io_err.into();

    match err {
        Error::IoError(_) => (),
        _ => panic!("Expected IoError variant"),
    }
}

#[test]
fn test_error_display() {
    let err = Error::ConfigError("invalid config".to_string());
    assert_eq!(err.to_string(), "Configuration error: invalid config.");

    let err = Error::BatchError { failed: 2, total: 5 };
    assert_eq!(err.to_string(), "2 of 5 templates failed to expand.");
}

#[test]
fn test_messages_name_kind_token_and_position() {
    let vars = VariableTable::new();
    let env = EnvironmentView::from_pairs(EnvCase::Sensitive, Vec::<(String, String)>::new());
    let expander = Expander::new(&vars, &env);

    let err = expander.expand("line one\nvalue: {{ var.Nope }}").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Undefined variable 'Nope' at line 2, column 11 (offset 19)."
    );
    assert_eq!(err.position(), Some(Position { offset: 19, line: 2, column: 11 }));

    let err = expander.expand("{{ var.x").unwrap_err();
    assert!(err.to_string().starts_with("Unterminated placeholder at line 1, column 1"));
    assert!(err.to_string().contains("'{{ var.x'"));

    assert_eq!(Error::ConfigError("x".into()).position(), None);
}
