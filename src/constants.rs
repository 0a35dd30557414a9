//! Common constants used throughout tplexpand.

/// Extension marking template files in directory mode
pub const TEMPLATE_EXTENSION: &str = "tpl";

/// Output extensions that default to UTF-16LE (registry scripts)
pub const UTF16_EXTENSIONS: [&str; 1] = ["reg"];

/// Log target for per-placeholder diagnostics
pub const DIAGNOSTICS_TARGET: &str = "tplexpand::expand";
