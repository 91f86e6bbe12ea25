//! Field descriptors: the binding between a field tag, an object member and
//! a value codec, plus the lexical skipper for tags no descriptor claims.

use smol_str::SmolStr;

use crate::error::ParseError;
use crate::value::{ParseCursor, Value};
use crate::Result;

/// How the save path treats a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveMode {
    /// Store only when the member differs from the default reference.
    #[default]
    Normal,
    /// Always store.
    NoSkip,
    /// Store under the normal rules, but if only fields of this mode are
    /// non-default the whole object counts as default and is not written.
    NotOnly,
}

/// Borrowing accessor from an object to one of its members.
pub type Getter<T, V> = fn(&T) -> &V;
/// Mutating accessor from an object to one of its members.
pub type GetterMut<T, V> = fn(&mut T) -> &mut V;

/// Free-form load hook for fields whose lexical form is not a primitive.
pub type UniqueLoadFn<T> = fn(&mut T, &mut ParseCursor<'_>) -> Result<()>;
/// Free-form save hook; returning `false` vetoes emission.
pub type UniqueSaveFn<T> = fn(&mut String, &T) -> bool;

/// Type-erased codec binding behind a descriptor.
pub(crate) trait FieldIo<T>: Send + Sync {
    fn load(&self, dest: &mut T, cur: &mut ParseCursor<'_>) -> Result<()>;
    fn can_save(&self, src: &T, reference: &T) -> bool;
    fn save(&self, out: &mut String, src: &T) -> bool;
}

/// One named field of an object schema.
pub struct FieldDescriptor<T> {
    tag: &'static str,
    mode: SaveMode,
    io: Box<dyn FieldIo<T>>,
}

impl<T> FieldDescriptor<T> {
    pub(crate) fn new(tag: &'static str, mode: SaveMode, io: Box<dyn FieldIo<T>>) -> Self {
        Self { tag, mode, io }
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn mode(&self) -> SaveMode {
        self.mode
    }

    /// Attempts to match `tag:` at the cursor. A tag mismatch is silent;
    /// once the tag matches, any failure in the codec or the terminator is
    /// wrapped in `BadField`.
    pub(crate) fn try_load(&self, dest: &mut T, cur: &mut ParseCursor<'_>) -> Result<bool> {
        let rest = cur.rest();
        let tag = self.tag.as_bytes();
        if rest.len() <= tag.len() || &rest[..tag.len()] != tag || rest[tag.len()] != b':' {
            return Ok(false);
        }
        cur.advance(tag.len() + 1);

        let loaded = self
            .io
            .load(dest, cur)
            .and_then(|_| cur.expect(b';'));
        match loaded {
            Ok(()) => Ok(true),
            Err(cause) => Err(ParseError::bad_field(self.tag, cause)),
        }
    }

    /// Emits `tag:value;` unless the save gates skip it. On a codec veto the
    /// buffer is rolled back and nothing was written.
    pub(crate) fn try_save(&self, out: &mut String, src: &T, reference: &T) -> bool {
        if self.mode != SaveMode::NoSkip && !self.io.can_save(src, reference) {
            return false;
        }

        let mark = out.len();
        out.push_str(self.tag);
        out.push(':');
        if !self.io.save(out, src) {
            out.truncate(mark);
            return false;
        }
        out.push(';');
        true
    }
}

/// Plain member binding: tag ↔ one member through a codec.
pub(crate) struct MemberIo<T, V: Value> {
    pub get: Getter<T, V>,
    pub get_mut: GetterMut<T, V>,
}

impl<T, V: Value> FieldIo<T> for MemberIo<T, V> {
    fn load(&self, dest: &mut T, cur: &mut ParseCursor<'_>) -> Result<()> {
        (self.get_mut)(dest).load(cur)
    }

    fn can_save(&self, src: &T, reference: &T) -> bool {
        !(self.get)(src).is_default((self.get)(reference))
    }

    fn save(&self, out: &mut String, src: &T) -> bool {
        (self.get)(src).save(out)
    }
}

/// Member binding that rejects negative input.
pub(crate) struct NonNegIo<T, V: Value> {
    pub get: Getter<T, V>,
    pub get_mut: GetterMut<T, V>,
}

impl<T, V: Value> FieldIo<T> for NonNegIo<T, V> {
    fn load(&self, dest: &mut T, cur: &mut ParseCursor<'_>) -> Result<()> {
        // A parsed value can only come out negative if the input led with a
        // minus, so the sign byte is the whole check.
        let negative = cur.peek() == Some(b'-');
        (self.get_mut)(dest).load(cur)?;
        if negative {
            return Err(ParseError::BadTerm("Negative value"));
        }
        Ok(())
    }

    fn can_save(&self, src: &T, reference: &T) -> bool {
        !(self.get)(src).is_default((self.get)(reference))
    }

    fn save(&self, out: &mut String, src: &T) -> bool {
        (self.get)(src).save(out)
    }
}

/// Free-form hook pair for fields like packed control bits or autoscroll
/// waypoint quadruples.
pub(crate) struct UniqueIo<T> {
    pub load: UniqueLoadFn<T>,
    pub save: UniqueSaveFn<T>,
}

impl<T> FieldIo<T> for UniqueIo<T> {
    fn load(&self, dest: &mut T, cur: &mut ParseCursor<'_>) -> Result<()> {
        (self.load)(dest, cur)
    }

    fn can_save(&self, _src: &T, _reference: &T) -> bool {
        true
    }

    fn save(&self, out: &mut String, src: &T) -> bool {
        (self.save)(out, src)
    }
}

/// The `XTRA` JSON-blob escape hatch: a string member that is written
/// whenever it is non-empty, regardless of the reference object.
pub(crate) struct XtraIo<T> {
    pub get: Getter<T, String>,
    pub get_mut: GetterMut<T, String>,
}

impl<T> FieldIo<T> for XtraIo<T> {
    fn load(&self, dest: &mut T, cur: &mut ParseCursor<'_>) -> Result<()> {
        (self.get_mut)(dest).load(cur)
    }

    fn can_save(&self, src: &T, _reference: &T) -> bool {
        !(self.get)(src).is_empty()
    }

    fn save(&self, out: &mut String, src: &T) -> bool {
        (self.get)(src).save(out)
    }
}

/// Tag of the JSON-blob escape hatch.
pub(crate) const XTRA_TAG: &str = "XTRA";

/// Lexically consumes exactly one `tag:value;` term the schema does not
/// recognize. Quote and escape state are tracked so separators inside string
/// values do not end the term early. Malformed terms are reported as a
/// `BadField` carrying the raw tag bytes.
pub(crate) fn skip_term(cur: &mut ParseCursor<'_>) -> Result<()> {
    let start = cur.pos();
    let mut tag_end: Option<usize> = None;
    let mut quoted = false;
    let mut escape = false;

    let fail = |cur: &ParseCursor<'_>, tag_end: Option<usize>, cause: ParseError| {
        let end = tag_end.unwrap_or(cur.pos());
        Err(ParseError::BadField(
            SmolStr::new(&cur.line()[start..end]),
            Some(Box::new(cause)),
        ))
    };

    loop {
        match cur.peek() {
            Some(b'"') => {
                if !escape && tag_end.is_some() {
                    quoted = !quoted;
                }
                escape = false;
            }
            Some(b';') => {
                if !escape && !quoted {
                    if tag_end.is_none() {
                        return fail(cur, tag_end, ParseError::MissingDelimiter(':'));
                    }
                    cur.advance(1);
                    return Ok(());
                }
                escape = false;
            }
            Some(b':') => {
                if tag_end.is_none() {
                    if cur.pos() == start {
                        return fail(cur, tag_end, ParseError::UnexpectedCharacter(':'));
                    }
                    tag_end = Some(cur.pos());
                } else if !escape && !quoted {
                    return fail(cur, tag_end, ParseError::UnexpectedCharacter(':'));
                }
                escape = false;
            }
            Some(b'\\') => escape = true,
            Some(_) => escape = false,
            None => {
                let cause = if quoted {
                    ParseError::MissingDelimiter('"')
                } else if tag_end.is_some() {
                    ParseError::MissingDelimiter(';')
                } else {
                    ParseError::MissingDelimiter(':')
                };
                return fail(cur, tag_end, cause);
            }
        }
        cur.advance(1);
    }
}
