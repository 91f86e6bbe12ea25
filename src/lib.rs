//! Streaming reader/writer for the PGE-X ("MDX") section-based text format
//! used to persist level, world-map and game-save data.
//!
//! The crate is a schema-driven engine: it knows the wire format — sections
//! delimited by `NAME` / `NAME_END` lines, body records made of `tag:value;`
//! terms — but not any concrete object catalogue. Callers register their
//! object layouts through [`ObjectSchema`] builders, bind them to section
//! names in a [`FileSchema`], and receive parsed objects through callbacks.
//! Saving mirrors loading: a callback hands objects back by index and every
//! field equal to its default-constructed reference is omitted, which keeps
//! the serialization canonical and byte-stable under round-trips.
//!
//! # Examples
//!
//! Parse a one-section file and write it back out:
//!
//! ```rust
//! use std::sync::Arc;
//! use pgex::{CallbackError, FileSchema, ObjectSchema, StrInput};
//!
//! #[derive(Default)]
//! struct Head {
//!     title: String,
//!     stars: u32,
//! }
//!
//! #[derive(Default)]
//! struct LevelData {
//!     title: String,
//!     stars: u32,
//! }
//!
//! fn on_head(data: &mut LevelData, head: Head) -> Result<bool, CallbackError> {
//!     data.title = head.title;
//!     data.stars = head.stars;
//!     Ok(true)
//! }
//!
//! fn put_head(data: &mut LevelData, head: &mut Head, index: usize) -> bool {
//!     if index > 0 {
//!         return false;
//!     }
//!     head.title = data.title.clone();
//!     head.stars = data.stars;
//!     true
//! }
//!
//! let head_schema = Arc::new(
//!     ObjectSchema::builder()
//!         .field("TL", |h: &Head| &h.title, |h: &mut Head| &mut h.title)
//!         .field("SZ", |h: &Head| &h.stars, |h: &mut Head| &mut h.stars)
//!         .build(),
//! );
//!
//! let schema: FileSchema<LevelData> = FileSchema::builder()
//!     .section("HEAD", &head_schema, Some(on_head), Some(put_head))
//!     .build();
//!
//! let text = "HEAD\nTL:\"My Level\";SZ:3;\nHEAD_END\n";
//! let mut data = LevelData::default();
//! assert!(schema.load(&mut StrInput::new(text), &mut data, None));
//! assert_eq!(data.title, "My Level");
//! assert_eq!(data.stars, 3);
//!
//! let saved = schema.save_to_string(&mut data).unwrap();
//! assert_eq!(saved, text);
//! ```
//!
//! Errors carry their full context chain and reach the caller through the
//! structured `on_error` sink:
//!
//! ```rust
//! use std::sync::Arc;
//! use pgex::{CallbackError, FileError, FileSchema, ObjectSchema, StrInput};
//!
//! #[derive(Default)]
//! struct Head {
//!     stars: u32,
//! }
//!
//! #[derive(Default)]
//! struct Report {
//!     error: Option<FileError>,
//! }
//!
//! fn on_head(_report: &mut Report, _head: Head) -> Result<bool, CallbackError> {
//!     Ok(true)
//! }
//!
//! fn on_error(report: &mut Report, err: FileError) {
//!     report.error = Some(err);
//! }
//!
//! let head_schema = Arc::new(
//!     ObjectSchema::builder()
//!         .field("SZ", |h: &Head| &h.stars, |h: &mut Head| &mut h.stars)
//!         .build(),
//! );
//! let schema: FileSchema<Report> = FileSchema::builder()
//!     .section("HEAD", &head_schema, Some(on_head), None)
//!     .build();
//!
//! let mut report = Report::default();
//! let text = "HEAD\nSZ:99999999999999999999;\nHEAD_END\n";
//! assert!(!schema.load(&mut StrInput::new(text), &mut report, Some(on_error)));
//!
//! let err = report.error.unwrap();
//! assert_eq!(err.line_number, 2);
//! assert!(err.info.contains("bad term: Bad uint"));
//! ```

pub mod detect;
pub mod error;
pub mod field;
pub mod file;
pub mod io;
pub mod object;
pub mod value;

mod section;

pub use detect::{detect_format, FileKind};
pub use error::{CallbackError, FileError, ParseError};
pub use field::{Getter, GetterMut, SaveMode, UniqueLoadFn, UniqueSaveFn};
pub use file::{ErrorSink, FileSchema, FileSchemaBuilder, LoadFn, SaveFn};
pub use io::{OwnedInput, ReaderInput, StrInput, TextInput, TextOutput, WriterOutput};
pub use object::{ObjectSchema, ObjectSchemaBuilder};
pub use value::{BitList, ParseCursor, Value};

/// Crate-wide result alias for parse-side operations.
pub type Result<T> = std::result::Result<T, ParseError>;
