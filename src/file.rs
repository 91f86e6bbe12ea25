//! File schema and the top-level load/save drivers.
//!
//! A `FileSchema<C>` is the immutable section table for one file format,
//! shared freely between parses. All per-parse mutable state lives in the
//! caller's context value `C`, threaded into every callback as userdata.

use std::io::{self, SeekFrom};
use std::sync::Arc;

use crate::error::{CallbackError, FileError, ParseError};
use crate::io::{TextInput, TextOutput};
use crate::object::ObjectSchema;
use crate::section::{read_line, skip_section, Section, SectionIo};
use crate::Result;

/// Load callback slot: receives the parsed object, returns `Ok(true)` to
/// keep going, `Ok(false)` to skip the rest of the section, `Err` to abort.
pub type LoadFn<C, T> = fn(&mut C, T) -> std::result::Result<bool, CallbackError>;

/// Save callback slot: populates the `index`-th object of the section,
/// returning `false` when the section is exhausted.
pub type SaveFn<C, T> = fn(&mut C, &mut T, usize) -> bool;

/// Structured error sink invoked once per failed parse.
pub type ErrorSink<C> = fn(&mut C, FileError);

/// Ordered, immutable table of section descriptors for one file format.
pub struct FileSchema<C> {
    sections: Vec<Box<dyn SectionIo<C>>>,
}

impl<C> FileSchema<C> {
    pub fn builder() -> FileSchemaBuilder<C> {
        FileSchemaBuilder {
            sections: Vec::new(),
        }
    }

    /// Parses the whole input, routing each section's objects to its load
    /// callback. Returns `false` after delivering the failure to `on_error`.
    pub fn load(
        &self,
        input: &mut dyn TextInput,
        ctx: &mut C,
        on_error: Option<ErrorSink<C>>,
    ) -> bool {
        let mut line = String::new();
        match self.run_load(input, ctx, &mut line) {
            Ok(()) => true,
            Err(cause) => {
                let report = FileError::new(input.line_number(), std::mem::take(&mut line), cause);
                if let Some(sink) = on_error {
                    sink(ctx, report);
                }
                false
            }
        }
    }

    fn run_load(
        &self,
        input: &mut dyn TextInput,
        ctx: &mut C,
        line: &mut String,
    ) -> Result<()> {
        input
            .seek(SeekFrom::Start(0))
            .map_err(|err| ParseError::Misc(format!("i/o error: {err}")))?;

        loop {
            line.clear();
            read_line(input, line)?;

            if line.is_empty() {
                if input.eof() {
                    return Ok(());
                }
                continue;
            }
            if line.bytes().all(|byte| byte == b' ') {
                continue;
            }

            let mut handled = false;
            for section in &self.sections {
                if section.try_load(ctx, input, line)? {
                    handled = true;
                    break;
                }
            }
            if handled {
                continue;
            }

            if is_section_name(line) {
                let name = line.clone();
                skip_section(input, line, &name)?;
            } else {
                return Err(ParseError::Misc(format!("Invalid section header [{line}]")));
            }
        }
    }

    /// Serializes every section in declaration order. Sections whose save
    /// callback is absent, or whose every object is default, contribute
    /// nothing.
    pub fn save(&self, out: &mut dyn TextOutput, ctx: &mut C) -> io::Result<()> {
        for section in &self.sections {
            section.save(ctx, out)?;
        }
        Ok(())
    }

    /// Convenience wrapper serializing into a string.
    pub fn save_to_string(&self, ctx: &mut C) -> io::Result<String> {
        let mut bytes = Vec::new();
        self.save(&mut bytes, ctx)?;
        String::from_utf8(bytes)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }
}

/// Start-up registration of a file format's sections.
///
/// Section names must be ASCII identifiers without a `_END` suffix and
/// unique within the schema; violations panic at build time.
pub struct FileSchemaBuilder<C> {
    sections: Vec<Box<dyn SectionIo<C>>>,
}

impl<C: 'static> FileSchemaBuilder<C> {
    /// A repeated section: one callback invocation per body record.
    /// Single-instance sections (header, crash data) use the same runtime;
    /// keeping them unique in the file is the writer's contract.
    pub fn section<T: Default + Send + Sync + 'static>(
        self,
        name: &'static str,
        schema: &Arc<ObjectSchema<T>>,
        load: Option<LoadFn<C, T>>,
        save: Option<SaveFn<C, T>>,
    ) -> Self {
        self.push(name, schema, false, load, save)
    }

    /// A combine-objects section: all body records accumulate into one
    /// object delivered once at `NAME_END`.
    pub fn combine_section<T: Default + Send + Sync + 'static>(
        self,
        name: &'static str,
        schema: &Arc<ObjectSchema<T>>,
        load: Option<LoadFn<C, T>>,
        save: Option<SaveFn<C, T>>,
    ) -> Self {
        self.push(name, schema, true, load, save)
    }

    pub fn build(self) -> FileSchema<C> {
        FileSchema {
            sections: self.sections,
        }
    }

    fn push<T: Default + Send + Sync + 'static>(
        mut self,
        name: &'static str,
        schema: &Arc<ObjectSchema<T>>,
        combine: bool,
        load: Option<LoadFn<C, T>>,
        save: Option<SaveFn<C, T>>,
    ) -> Self {
        assert!(
            !name.is_empty() && is_section_name(name) && !name.ends_with("_END"),
            "invalid section name {name:?}"
        );
        assert!(
            self.sections.iter().all(|existing| existing.name() != name),
            "duplicate section name {name:?}"
        );
        self.sections.push(Box::new(Section {
            name,
            schema: Arc::clone(schema),
            combine,
            load,
            save,
        }));
        self
    }
}

/// A line qualifies as a section header when it is a plain ASCII identifier:
/// no separators, no quotes, no escapes, no NUL.
fn is_section_name(line: &str) -> bool {
    !line.is_empty()
        && line.bytes().all(|byte| {
            byte.is_ascii()
                && byte != 0
                && !matches!(byte, b':' | b';' | b'"' | b'\\' | b' ')
        })
}
