//! Line-oriented input and byte-sink output adapters.
//!
//! The runtimes only ever need four things from an input: append the next
//! line (terminator stripped, CRLF and bare LF both accepted), report
//! end-of-input, rewind, and tell which line was read last. Output is a plain
//! byte sink; the section writer hands it data in batches.

use std::io::{self, BufRead, Read, Seek, SeekFrom, Write};

use memchr::memchr;

/// Line-at-a-time reader over the input being parsed.
pub trait TextInput {
    /// Appends the next line to `buf`, without its terminator. At end of
    /// input nothing is appended.
    fn read_line(&mut self, buf: &mut String) -> io::Result<()>;

    /// True once the input is exhausted.
    fn eof(&mut self) -> bool;

    /// Repositions the input. Seeking to byte 0 resets the line counter.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64>;

    /// Number of the line read last, 1-based. Zero before the first read.
    fn line_number(&self) -> u64;
}

/// Byte sink receiving the canonical serialization.
pub trait TextOutput {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;
}

impl TextOutput for Vec<u8> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Adapter turning any [`std::io::Write`] into a [`TextOutput`].
pub struct WriterOutput<W: Write>(pub W);

impl<W: Write> TextOutput for WriterOutput<W> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.0.write_all(bytes)
    }
}

/// Input over an in-memory string.
pub struct StrInput<'a> {
    data: &'a str,
    pos: usize,
    line: u64,
}

impl<'a> StrInput<'a> {
    pub fn new(data: &'a str) -> Self {
        Self { data, pos: 0, line: 0 }
    }
}

impl TextInput for StrInput<'_> {
    fn read_line(&mut self, buf: &mut String) -> io::Result<()> {
        let bytes = self.data.as_bytes();
        if self.pos >= bytes.len() {
            return Ok(());
        }
        let (mut end, next) = match memchr(b'\n', &bytes[self.pos..]) {
            Some(offset) => (self.pos + offset, self.pos + offset + 1),
            None => (bytes.len(), bytes.len()),
        };
        if end > self.pos && bytes[end - 1] == b'\r' {
            end -= 1;
        }
        buf.push_str(&self.data[self.pos..end]);
        self.pos = next;
        self.line += 1;
        Ok(())
    }

    fn eof(&mut self) -> bool {
        self.pos >= self.data.len()
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.data.len() as i64;
        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::Current(delta) => self.pos as i64 + delta,
            SeekFrom::End(delta) => len + delta,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of input",
            ));
        }
        self.pos = (target.min(len)) as usize;
        if self.pos == 0 {
            self.line = 0;
        }
        Ok(self.pos as u64)
    }

    fn line_number(&self) -> u64 {
        self.line
    }
}

/// Input over any buffered, seekable reader (typically a file).
pub struct ReaderInput<R: BufRead + Seek> {
    inner: R,
    scratch: Vec<u8>,
    line: u64,
}

impl<R: BufRead + Seek> ReaderInput<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            scratch: Vec::new(),
            line: 0,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead + Seek> TextInput for ReaderInput<R> {
    fn read_line(&mut self, buf: &mut String) -> io::Result<()> {
        self.scratch.clear();
        let read = self.inner.read_until(b'\n', &mut self.scratch)?;
        if read == 0 {
            return Ok(());
        }
        if self.scratch.last() == Some(&b'\n') {
            self.scratch.pop();
        }
        if self.scratch.last() == Some(&b'\r') {
            self.scratch.pop();
        }
        let text = std::str::from_utf8(&self.scratch)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        buf.push_str(text);
        self.line += 1;
        Ok(())
    }

    fn eof(&mut self) -> bool {
        match self.inner.fill_buf() {
            Ok(bytes) => bytes.is_empty(),
            Err(_) => true,
        }
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let reached = self.inner.seek(pos)?;
        if reached == 0 {
            self.line = 0;
        }
        Ok(reached)
    }

    fn line_number(&self) -> u64 {
        self.line
    }
}

/// Reads a whole unbuffered source into memory and serves lines from there.
pub fn read_to_input<R: Read>(mut reader: R) -> io::Result<OwnedInput> {
    let mut data = String::new();
    reader.read_to_string(&mut data)?;
    Ok(OwnedInput {
        data,
        pos: 0,
        line: 0,
    })
}

/// Input owning its backing text.
pub struct OwnedInput {
    data: String,
    pos: usize,
    line: u64,
}

impl OwnedInput {
    pub fn new(data: String) -> Self {
        Self { data, pos: 0, line: 0 }
    }
}

impl TextInput for OwnedInput {
    fn read_line(&mut self, buf: &mut String) -> io::Result<()> {
        let mut view = StrInput {
            data: &self.data,
            pos: self.pos,
            line: self.line,
        };
        view.read_line(buf)?;
        self.pos = view.pos;
        self.line = view.line;
        Ok(())
    }

    fn eof(&mut self) -> bool {
        self.pos >= self.data.len()
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let mut view = StrInput {
            data: &self.data,
            pos: self.pos,
            line: self.line,
        };
        let reached = view.seek(pos)?;
        self.pos = view.pos;
        self.line = view.line;
        Ok(reached)
    }

    fn line_number(&self) -> u64 {
        self.line
    }
}
