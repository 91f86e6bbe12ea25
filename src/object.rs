//! Object schemas: the ordered field table that turns one body record into
//! an object and back.
//!
//! Lookup is deliberately linear. The format's own encoder emits fields in
//! declaration order, so a moving `next_field` hint makes the common case a
//! single comparison per record while out-of-order input still parses.

use std::sync::Arc;

use crate::error::ParseError;
use crate::field::{
    skip_term, FieldDescriptor, FieldIo, Getter, GetterMut, MemberIo, NonNegIo, SaveMode,
    UniqueIo, UniqueLoadFn, UniqueSaveFn, XtraIo, XTRA_TAG,
};
use crate::value::{finish_list_item, text, ParseCursor, Value};
use crate::Result;

/// Ordered collection of field descriptors for one object type.
pub struct ObjectSchema<T> {
    fields: Vec<FieldDescriptor<T>>,
}

impl<T: Default> ObjectSchema<T> {
    pub fn builder() -> ObjectSchemaBuilder<T> {
        ObjectSchemaBuilder { fields: Vec::new() }
    }

    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    /// Parses one `t0:v0;t1:v1;…;` line into `dest`.
    pub fn load_object(&self, dest: &mut T, line: &str) -> Result<()> {
        let mut cur = ParseCursor::new(line);
        let mut next_field = 0;

        while !cur.at_end() {
            let mut matched = false;
            for index in next_field..self.fields.len() {
                if self.fields[index].try_load(dest, &mut cur)? {
                    if index == next_field {
                        next_field += 1;
                    }
                    matched = true;
                    break;
                }
            }
            if !matched {
                skip_term(&mut cur)?;
            }
        }
        Ok(())
    }

    /// Emits the record body for `src`, in declaration order. Returns `false`
    /// (with `out` rewound) when the object counts as all-default — no field
    /// saved, or only `NotOnly` fields saved.
    pub fn save_object(&self, out: &mut String, src: &T, reference: &T) -> bool {
        let mark = out.len();
        let mut wrote_real = false;
        for field in &self.fields {
            if field.try_save(out, src, reference) && field.mode() != SaveMode::NotOnly {
                wrote_real = true;
            }
        }
        if !wrote_real {
            out.truncate(mark);
        }
        wrote_real
    }
}

/// Start-up registration of an object type's fields.
///
/// Tags must be non-empty ASCII without `:` or `;` and unique within the
/// schema; violations are programming errors and panic at build time.
pub struct ObjectSchemaBuilder<T> {
    fields: Vec<FieldDescriptor<T>>,
}

impl<T: Default + 'static> ObjectSchemaBuilder<T> {
    /// Plain member field with the default save mode.
    pub fn field<V: Value + 'static>(
        self,
        tag: &'static str,
        get: Getter<T, V>,
        get_mut: GetterMut<T, V>,
    ) -> Self {
        self.field_with_mode(tag, SaveMode::Normal, get, get_mut)
    }

    /// Plain member field with an explicit save mode.
    pub fn field_with_mode<V: Value + 'static>(
        mut self,
        tag: &'static str,
        mode: SaveMode,
        get: Getter<T, V>,
        get_mut: GetterMut<T, V>,
    ) -> Self {
        self.push(FieldDescriptor::new(
            tag,
            mode,
            Box::new(MemberIo { get, get_mut }),
        ));
        self
    }

    /// Member field that rejects negative input with `BadTerm("Negative value")`.
    pub fn nonneg_field<V: Value + 'static>(
        mut self,
        tag: &'static str,
        get: Getter<T, V>,
        get_mut: GetterMut<T, V>,
    ) -> Self {
        self.push(FieldDescriptor::new(
            tag,
            SaveMode::Normal,
            Box::new(NonNegIo { get, get_mut }),
        ));
        self
    }

    /// Field handled by a free-form load/save pair.
    pub fn unique_field(
        mut self,
        tag: &'static str,
        load: UniqueLoadFn<T>,
        save: UniqueSaveFn<T>,
    ) -> Self {
        self.push(FieldDescriptor::new(
            tag,
            SaveMode::Normal,
            Box::new(UniqueIo { load, save }),
        ));
        self
    }

    /// The `XTRA` JSON-blob escape hatch, written whenever non-empty.
    pub fn xtra(mut self, get: Getter<T, String>, get_mut: GetterMut<T, String>) -> Self {
        self.push(FieldDescriptor::new(
            XTRA_TAG,
            SaveMode::Normal,
            Box::new(XtraIo { get, get_mut }),
        ));
        self
    }

    /// Member holding one nested object, carried on the wire as a quoted
    /// serialized record body.
    pub fn nested_field<U: Default + Send + Sync + 'static>(
        mut self,
        tag: &'static str,
        schema: &Arc<ObjectSchema<U>>,
        get: Getter<T, U>,
        get_mut: GetterMut<T, U>,
    ) -> Self {
        self.push(FieldDescriptor::new(
            tag,
            SaveMode::Normal,
            Box::new(NestedObjectIo {
                schema: Arc::clone(schema),
                get,
                get_mut,
            }),
        ));
        self
    }

    /// Member holding a list of nested objects.
    pub fn nested_list_field<U: Default + Send + Sync + 'static>(
        mut self,
        tag: &'static str,
        schema: &Arc<ObjectSchema<U>>,
        get: Getter<T, Vec<U>>,
        get_mut: GetterMut<T, Vec<U>>,
    ) -> Self {
        self.push(FieldDescriptor::new(
            tag,
            SaveMode::Normal,
            Box::new(NestedListIo {
                schema: Arc::clone(schema),
                get,
                get_mut,
            }),
        ));
        self
    }

    pub fn build(self) -> ObjectSchema<T> {
        ObjectSchema {
            fields: self.fields,
        }
    }

    fn push(&mut self, field: FieldDescriptor<T>) {
        let tag = field.tag();
        assert!(
            !tag.is_empty()
                && tag.is_ascii()
                && !tag.contains(':')
                && !tag.contains(';')
                && !tag.contains('\\')
                && !tag.contains('"'),
            "invalid field tag {tag:?}"
        );
        assert!(
            self.fields.iter().all(|existing| existing.tag() != tag),
            "duplicate field tag {tag:?}"
        );
        self.fields.push(field);
    }
}

/// Codec for a nested object: the inner record body travels inside a quoted
/// string value.
struct NestedObjectIo<T, U> {
    schema: Arc<ObjectSchema<U>>,
    get: Getter<T, U>,
    get_mut: GetterMut<T, U>,
}

impl<T, U: Default + Send + Sync> FieldIo<T> for NestedObjectIo<T, U> {
    fn load(&self, dest: &mut T, cur: &mut ParseCursor<'_>) -> Result<()> {
        let mut body = String::new();
        text::load_quoted(cur, &mut body)?;
        let inner = (self.get_mut)(dest);
        *inner = U::default();
        self.schema.load_object(inner, &body)
    }

    fn can_save(&self, _src: &T, _reference: &T) -> bool {
        true
    }

    fn save(&self, out: &mut String, src: &T) -> bool {
        let reference = U::default();
        let mut body = String::new();
        if !self.schema.save_object(&mut body, (self.get)(src), &reference) {
            return false;
        }
        body.save(out)
    }
}

/// Codec for a list of nested objects: `["body0","body1",…]`.
struct NestedListIo<T, U> {
    schema: Arc<ObjectSchema<U>>,
    get: Getter<T, Vec<U>>,
    get_mut: GetterMut<T, Vec<U>>,
}

impl<T, U: Default + Send + Sync> FieldIo<T> for NestedListIo<T, U> {
    fn load(&self, dest: &mut T, cur: &mut ParseCursor<'_>) -> Result<()> {
        let items = (self.get_mut)(dest);
        items.clear();
        cur.expect(b'[')?;

        let mut body = String::new();
        while cur.peek() != Some(b']') && !cur.at_end() {
            let index = items.len() + 1;
            body.clear();
            let mut item = U::default();
            let parsed = text::load_quoted(cur, &mut body)
                .and_then(|_| finish_list_item(cur))
                .and_then(|_| self.schema.load_object(&mut item, &body));
            if let Err(cause) = parsed {
                return Err(ParseError::bad_array(index, cause));
            }
            items.push(item);
        }

        if cur.prev() == Some(b',') {
            return Err(ParseError::UnexpectedCharacter(']'));
        }
        cur.expect(b']')
    }

    fn can_save(&self, src: &T, _reference: &T) -> bool {
        !(self.get)(src).is_empty()
    }

    fn save(&self, out: &mut String, src: &T) -> bool {
        let reference = U::default();
        let mut body = String::new();
        out.push('[');
        for item in (self.get)(src) {
            body.clear();
            if self.schema.save_object(&mut body, item, &reference) {
                body.save(out);
                out.push(',');
            }
        }
        if out.ends_with(',') {
            out.pop();
            out.push(']');
            true
        } else {
            out.pop();
            false
        }
    }
}
