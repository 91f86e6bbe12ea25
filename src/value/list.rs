//! Homogeneous list and bit-list codecs.
//!
//! A list is `[e0,e1,…,eN]` with the element grammar delegated to the
//! subtype codec; a trailing comma before `]` is illegal. A bit-list is the
//! bracketless run of `0`/`1` used for packed boolean arrays; it ends at the
//! field's `;` (or end of line) without consuming it.

use std::ops::{Deref, DerefMut};

use super::{finish_list_item, ParseCursor, Value};
use crate::error::ParseError;
use crate::Result;

impl<V: Value> Value for Vec<V> {
    fn load(&mut self, cur: &mut ParseCursor<'_>) -> Result<()> {
        self.clear();
        cur.expect(b'[')?;

        while cur.peek() != Some(b']') && !cur.at_end() {
            let index = self.len() + 1;
            let mut item = V::default();
            let parsed = item
                .load(cur)
                .and_then(|_| finish_list_item(cur));
            if let Err(cause) = parsed {
                return Err(ParseError::bad_array(index, cause));
            }
            self.push(item);
        }

        if cur.prev() == Some(b',') {
            return Err(ParseError::UnexpectedCharacter(']'));
        }
        cur.expect(b']')
    }

    fn save(&self, out: &mut String) -> bool {
        out.push('[');
        for item in self {
            let mark = out.len();
            if item.save(out) {
                out.push(',');
            } else {
                out.truncate(mark);
            }
        }
        if out.ends_with(',') {
            out.pop();
            out.push(']');
            true
        } else {
            // nothing was written, remove the '['
            out.pop();
            false
        }
    }

    fn is_default(&self, _reference: &Self) -> bool {
        self.is_empty()
    }
}

/// Packed run of booleans, e.g. `10110010`.
///
/// Kept as a newtype so the codec cannot collide with the generic list
/// codec over `Vec<bool>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitList(pub Vec<bool>);

impl Deref for BitList {
    type Target = Vec<bool>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for BitList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<bool>> for BitList {
    fn from(bits: Vec<bool>) -> Self {
        Self(bits)
    }
}

impl FromIterator<bool> for BitList {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Value for BitList {
    fn load(&mut self, cur: &mut ParseCursor<'_>) -> Result<()> {
        self.0.clear();
        loop {
            match cur.peek() {
                Some(b'0') => self.0.push(false),
                Some(b'1') => self.0.push(true),
                Some(b';') | None => return Ok(()),
                Some(_) => return Err(ParseError::BadArray(self.0.len() + 1, None)),
            }
            cur.advance(1);
        }
    }

    fn save(&self, out: &mut String) -> bool {
        for &bit in &self.0 {
            out.push(if bit { '1' } else { '0' });
        }
        true
    }

    fn is_default(&self, _reference: &Self) -> bool {
        self.0.is_empty()
    }
}
