//! tplexpand expands `{{ var.NAME | filter:arg }}` placeholders in text
//! templates. Values come from a variable table or the process
//! environment and pass through a pipeline of named filters.

/// Command-line interface module for the tplexpand binary
pub mod cli;

/// Variables files (JSON or YAML) and `NAME=VALUE` assignments
pub mod config;

pub mod constants;

/// Output encodings (UTF-8, UTF-8 with BOM, UTF-16LE)
pub mod encoding;

/// Error types and handling for tplexpand
pub mod error;

/// Expansion driver combining scanning, parsing, resolution and filters
pub mod expander;

/// Filter catalogue and registry
pub mod filters;

/// Placeholder interior parsing
pub mod parser;

/// Template file processing and batch runs
/// Maps `.tpl` inputs to outputs and writes them atomically
pub mod processor;

/// Variable table and environment lookups
pub mod resolver;

/// Splits template text into literals and raw placeholders
pub mod scanner;

/// Values flowing through filter pipelines
pub mod value;
