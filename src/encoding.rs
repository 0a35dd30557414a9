//! Output text encodings.

use std::borrow::Cow;
use std::io::{self, Write};
use std::path::Path;

use crate::constants::UTF16_EXTENSIONS;

/// Encoding applied to expanded text on its way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputEncoding {
    #[default]
    #[value(name = "utf8")]
    Utf8,
    #[value(name = "utf8-bom")]
    Utf8Bom,
    /// Little-endian UTF-16 with a byte-order mark
    #[value(name = "utf16le")]
    Utf16Le,
}

impl OutputEncoding {
    /// Picks the encoding for an output file by extension: registry
    /// scripts (`.reg`) are UTF-16LE, everything else UTF-8.
    pub fn for_path<P: AsRef<Path>>(path: P) -> Self {
        let is_utf16 = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| UTF16_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)));
        if is_utf16 {
            OutputEncoding::Utf16Le
        } else {
            OutputEncoding::Utf8
        }
    }

    /// Byte-order mark written once before any text.
    pub fn preamble(self) -> &'static [u8] {
        match self {
            OutputEncoding::Utf8 => &[],
            OutputEncoding::Utf8Bom => &[0xEF, 0xBB, 0xBF],
            OutputEncoding::Utf16Le => &[0xFF, 0xFE],
        }
    }

    pub fn encode(self, text: &str) -> Cow<'_, [u8]> {
        match self {
            OutputEncoding::Utf8 | OutputEncoding::Utf8Bom => Cow::Borrowed(text.as_bytes()),
            OutputEncoding::Utf16Le => {
                Cow::Owned(text.encode_utf16().flat_map(u16::to_le_bytes).collect())
            }
        }
    }
}

/// Writer that encodes text chunks as they arrive and emits the
/// preamble exactly once.
pub struct EncodedWriter<W: Write> {
    inner: W,
    encoding: OutputEncoding,
    started: bool,
}

impl<W: Write> EncodedWriter<W> {
    pub fn new(inner: W, encoding: OutputEncoding) -> Self {
        Self { inner, encoding, started: false }
    }

    fn start(&mut self) -> io::Result<()> {
        if !self.started {
            self.started = true;
            self.inner.write_all(self.encoding.preamble())?;
        }
        Ok(())
    }

    pub fn write_str(&mut self, text: &str) -> io::Result<()> {
        self.start()?;
        if text.is_empty() {
            return Ok(());
        }
        self.inner.write_all(&self.encoding.encode(text))
    }

    /// Flushes and returns the underlying writer. The preamble is written
    /// even when no text was.
    pub fn finish(mut self) -> io::Result<W> {
        self.start()?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_path() {
        assert_eq!(OutputEncoding::for_path("tweak.reg"), OutputEncoding::Utf16Le);
        assert_eq!(OutputEncoding::for_path("TWEAK.REG"), OutputEncoding::Utf16Le);
        assert_eq!(OutputEncoding::for_path("config.json"), OutputEncoding::Utf8);
        assert_eq!(OutputEncoding::for_path("noext"), OutputEncoding::Utf8);
    }

    #[test]
    fn test_utf16_writer() {
        let mut writer = EncodedWriter::new(Vec::new(), OutputEncoding::Utf16Le);
        writer.write_str("h").unwrap();
        writer.write_str("é").unwrap();
        let bytes = writer.finish().unwrap();
        assert_eq!(bytes, vec![0xFF, 0xFE, b'h', 0, 0xE9, 0]);
    }

    #[test]
    fn test_bom_written_once_even_when_empty() {
        let writer = EncodedWriter::new(Vec::new(), OutputEncoding::Utf8Bom);
        assert_eq!(writer.finish().unwrap(), vec![0xEF, 0xBB, 0xBF]);

        let mut writer = EncodedWriter::new(Vec::new(), OutputEncoding::Utf8Bom);
        writer.write_str("a").unwrap();
        writer.write_str("b").unwrap();
        assert_eq!(writer.finish().unwrap(), b"\xEF\xBB\xBFab".to_vec());
    }
}
