//! Section runtime: the state machine between a bare `NAME` header line and
//! its matching `NAME_END`.

use std::io;
use std::sync::Arc;

use crate::error::ParseError;
use crate::file::{LoadFn, SaveFn};
use crate::io::{TextInput, TextOutput};
use crate::object::ObjectSchema;
use crate::Result;

/// The section writer hands batches of at least this many bytes to the sink.
const WRITE_BATCH: usize = 2048;

/// True when `line` terminates the section called `name`.
pub(crate) fn is_section_end(line: &str, name: &str) -> bool {
    line.len() == name.len() + 4 && line.starts_with(name) && line.ends_with("_END")
}

/// Fast-forwards to the end of section `name`. Reaching end of input first
/// means the file is truncated.
pub(crate) fn skip_section(
    input: &mut dyn TextInput,
    line: &mut String,
    name: &str,
) -> Result<()> {
    loop {
        line.clear();
        read_line(input, line)?;
        if line.is_empty() && input.eof() {
            return Err(unterminated(name));
        }
        if is_section_end(line, name) {
            return Ok(());
        }
    }
}

fn unterminated(name: &str) -> ParseError {
    ParseError::Misc(format!("Unterminated section [{name}]"))
}

pub(crate) fn read_line(input: &mut dyn TextInput, line: &mut String) -> Result<()> {
    input
        .read_line(line)
        .map_err(|err| ParseError::Misc(format!("i/o error: {err}")))
}

/// Type-erased section handle stored in a file schema.
pub(crate) trait SectionIo<C>: Send + Sync {
    fn name(&self) -> &'static str;

    /// If `line` is this section's header, consumes the body through the
    /// matching `NAME_END` and returns `true`.
    fn try_load(
        &self,
        ctx: &mut C,
        input: &mut dyn TextInput,
        line: &mut String,
    ) -> Result<bool>;

    /// Emits this section by polling the save callback for objects until it
    /// declines.
    fn save(&self, ctx: &mut C, out: &mut dyn TextOutput) -> io::Result<()>;
}

/// One named section bound to an object schema and its callback slots.
pub(crate) struct Section<C, T> {
    pub name: &'static str,
    pub schema: Arc<ObjectSchema<T>>,
    pub combine: bool,
    pub load: Option<LoadFn<C, T>>,
    pub save: Option<SaveFn<C, T>>,
}

impl<C, T: Default + Send + Sync> SectionIo<C> for Section<C, T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn try_load(
        &self,
        ctx: &mut C,
        input: &mut dyn TextInput,
        line: &mut String,
    ) -> Result<bool> {
        if line.as_str() != self.name {
            return Ok(false);
        }
        // No load callback registered: let the file runtime skip the body
        // as if the section were unknown.
        let Some(load) = self.load else {
            return Ok(false);
        };

        let mut pending = T::default();

        loop {
            line.clear();
            read_line(input, line)?;

            if line.is_empty() {
                if input.eof() {
                    return Err(unterminated(self.name));
                }
                // PGEX writers produce stray blank lines; tolerate them.
                continue;
            }

            if line.ends_with(';') {
                if self.combine {
                    self.schema.load_object(&mut pending, line)?;
                } else {
                    let mut object = T::default();
                    self.schema.load_object(&mut object, line)?;
                    match (load)(ctx, object) {
                        Ok(true) => {}
                        Ok(false) => {
                            skip_section(input, line, self.name)?;
                            return Ok(true);
                        }
                        Err(err) => return Err(ParseError::Callback(err.message)),
                    }
                }
            } else if is_section_end(line, self.name) {
                if self.combine {
                    // One delivery per section occurrence; a veto has
                    // nothing left to skip.
                    if let Err(err) = (load)(ctx, pending) {
                        return Err(ParseError::Callback(err.message));
                    }
                }
                return Ok(true);
            } else {
                return Err(ParseError::MissingDelimiter(';'));
            }
        }
    }

    fn save(&self, ctx: &mut C, out: &mut dyn TextOutput) -> io::Result<()> {
        let Some(save) = self.save else {
            return Ok(());
        };

        let reference = T::default();
        let mut buf = String::with_capacity(WRITE_BATCH);
        buf.push_str(self.name);
        buf.push('\n');
        let mut wrote_any = false;

        for index in 0.. {
            let mut object = T::default();
            if !(save)(ctx, &mut object, index) {
                break;
            }
            let mark = buf.len();
            if self.schema.save_object(&mut buf, &object, &reference) {
                buf.push('\n');
                wrote_any = true;
                // The header is only committed once a body exists, so the
                // buffer may not be flushed before then.
                if buf.len() >= WRITE_BATCH {
                    out.write(buf.as_bytes())?;
                    buf.clear();
                }
            } else {
                buf.truncate(mark);
            }
        }

        if wrote_any {
            buf.push_str(self.name);
            buf.push_str("_END\n");
            out.write(buf.as_bytes())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::StrInput;

    #[rstest::rstest]
    #[case("HEAD_END", "HEAD", true)]
    #[case("HEAD_END", "HEA", false)]
    #[case("HEAD_ENDX", "HEAD", false)]
    #[case("XHEAD_END", "HEAD", false)]
    #[case("HEAD", "HEAD", false)]
    fn test_is_section_end(#[case] line: &str, #[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_section_end(line, name), expected);
    }

    #[rstest::rstest]
    fn test_skip_section_stops_at_matching_end() {
        let mut input = StrInput::new("junk\nmore;\nFOO_END\nNEXT\n");
        let mut line = String::new();
        skip_section(&mut input, &mut line, "FOO").unwrap();
        line.clear();
        input.read_line(&mut line).unwrap();
        assert_eq!(line, "NEXT");
    }

    #[rstest::rstest]
    fn test_skip_section_unterminated() {
        let mut input = StrInput::new("junk\n");
        let mut line = String::new();
        let err = skip_section(&mut input, &mut line, "FOO").unwrap_err();
        assert!(matches!(err, ParseError::Misc(_)));
    }
}
