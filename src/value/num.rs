//! Integer, boolean and floating-point codecs.
//!
//! Integers reject overflow before any wrap can happen and emit the minimal
//! decimal form. Floats follow the strict grammar
//! `['-'] digits ['.' digits] [('e'|'E') ['+'|'-'] digits]` — a leading dot
//! and a bare minus are invalid, exponents need at least one digit and are
//! capped — and emit a `%.10g`-equivalent rendering.

use smallvec::SmallVec;

use super::{ParseCursor, Value};
use crate::error::ParseError;
use crate::Result;

/// Largest base-10 exponent a finite double can carry (DBL_MAX_10_EXP).
const MAX_10_EXP: i32 = 308;
/// The original reader never consumes more than four exponent digits.
const MAX_EXP_DIGITS: usize = 4;

macro_rules! unsigned_value {
    ($ty:ty, $reason:literal) => {
        impl Value for $ty {
            fn load(&mut self, cur: &mut ParseCursor<'_>) -> Result<()> {
                let mut value: $ty = 0;
                let mut any = false;
                while let Some(byte @ b'0'..=b'9') = cur.peek() {
                    cur.advance(1);
                    any = true;
                    value = value
                        .checked_mul(10)
                        .and_then(|v| v.checked_add((byte - b'0') as $ty))
                        .ok_or(ParseError::BadTerm($reason))?;
                }
                if !any {
                    return Err(ParseError::BadTerm($reason));
                }
                *self = value;
                Ok(())
            }

            fn save(&self, out: &mut String) -> bool {
                let mut buf = itoa::Buffer::new();
                out.push_str(buf.format(*self));
                true
            }

            fn is_default(&self, reference: &Self) -> bool {
                self == reference
            }
        }
    };
}

macro_rules! signed_value {
    ($ty:ty, $reason:literal) => {
        impl Value for $ty {
            fn load(&mut self, cur: &mut ParseCursor<'_>) -> Result<()> {
                let negative = cur.peek() == Some(b'-');
                if negative {
                    cur.advance(1);
                }
                // Accumulate on the negative side so MIN is representable.
                let mut value: $ty = 0;
                let mut any = false;
                while let Some(byte @ b'0'..=b'9') = cur.peek() {
                    cur.advance(1);
                    any = true;
                    value = value
                        .checked_mul(10)
                        .and_then(|v| v.checked_sub((byte - b'0') as $ty))
                        .ok_or(ParseError::BadTerm($reason))?;
                }
                if !any {
                    return Err(ParseError::BadTerm($reason));
                }
                *self = if negative {
                    value
                } else {
                    value.checked_neg().ok_or(ParseError::BadTerm($reason))?
                };
                Ok(())
            }

            fn save(&self, out: &mut String) -> bool {
                let mut buf = itoa::Buffer::new();
                out.push_str(buf.format(*self));
                true
            }

            fn is_default(&self, reference: &Self) -> bool {
                self == reference
            }
        }
    };
}

unsigned_value!(u32, "Bad uint");
unsigned_value!(u64, "Bad ulong");
signed_value!(i32, "Bad int");
signed_value!(i64, "Bad long");

impl Value for bool {
    fn load(&mut self, cur: &mut ParseCursor<'_>) -> Result<()> {
        *self = match cur.peek() {
            Some(b'1') => true,
            Some(b'0') => false,
            _ => return Err(ParseError::BadTerm("Bad bool")),
        };
        cur.advance(1);
        Ok(())
    }

    fn save(&self, out: &mut String) -> bool {
        out.push(if *self { '1' } else { '0' });
        true
    }

    fn is_default(&self, reference: &Self) -> bool {
        self == reference
    }
}

impl Value for f64 {
    fn load(&mut self, cur: &mut ParseCursor<'_>) -> Result<()> {
        *self = parse_float(cur, "Bad double")?;
        Ok(())
    }

    fn save(&self, out: &mut String) -> bool {
        write_g10(out, *self);
        true
    }

    fn is_default(&self, reference: &Self) -> bool {
        self == reference
    }
}

impl Value for f32 {
    fn load(&mut self, cur: &mut ParseCursor<'_>) -> Result<()> {
        let wide = parse_float(cur, "Bad float")?;
        if wide > f32::MAX as f64 || wide < -(f32::MAX as f64) {
            return Err(ParseError::BadTerm("Bad float"));
        }
        *self = wide as f32;
        Ok(())
    }

    fn save(&self, out: &mut String) -> bool {
        write_g10(out, *self as f64);
        true
    }

    fn is_default(&self, reference: &Self) -> bool {
        self == reference
    }
}

/// Validates the float grammar at the cursor and converts the accepted span.
///
/// The grammar walk enforces everything the format cares about (no leading
/// dot, no bare minus, exponent digits present and capped); the final
/// decimal-to-binary conversion is delegated to the standard parser, which
/// rounds correctly to nearest.
fn parse_float(cur: &mut ParseCursor<'_>, reason: &'static str) -> Result<f64> {
    let start = cur.pos();
    if cur.peek() == Some(b'-') {
        cur.advance(1);
    }

    let mut int_digits = 0usize;
    while let Some(b'0'..=b'9') = cur.peek() {
        cur.advance(1);
        int_digits += 1;
    }
    if int_digits == 0 {
        return Err(ParseError::BadTerm(reason));
    }

    let mut frac_digits = 0usize;
    let mut frac_dot = false;
    if cur.peek() == Some(b'.') {
        cur.advance(1);
        frac_dot = true;
        while let Some(b'0'..=b'9') = cur.peek() {
            cur.advance(1);
            frac_digits += 1;
        }
    }
    let mantissa_end = cur.pos();

    let mut exponent: Option<i32> = None;
    if matches!(cur.peek(), Some(b'e') | Some(b'E')) {
        cur.advance(1);
        let mut exp_negative = false;
        match cur.peek() {
            Some(b'-') => {
                exp_negative = true;
                cur.advance(1);
            }
            Some(b'+') => cur.advance(1),
            _ => {}
        }
        let mut digits = 0usize;
        let mut exp_value: i32 = 0;
        while let Some(byte @ b'0'..=b'9') = cur.peek() {
            cur.advance(1);
            digits += 1;
            exp_value = exp_value * 10 + (byte - b'0') as i32;
            if digits > MAX_EXP_DIGITS {
                return Err(ParseError::BadTerm(reason));
            }
        }
        if digits == 0 {
            return Err(ParseError::BadTerm(reason));
        }
        if exp_negative {
            exp_value = -exp_value;
        }
        if exp_value > MAX_10_EXP {
            return Err(ParseError::BadTerm(reason));
        }
        exponent = Some(exp_value);
    }

    // Normalize the accepted span for the standard parser: a trailing dot
    // with no fraction digits ("1." or "1.e5") is tolerated on input but is
    // not part of the standard grammar.
    let value = if frac_dot && frac_digits == 0 {
        let mut cleaned = String::with_capacity(cur.pos() - start);
        cleaned.push_str(&cur.line()[start..mantissa_end - 1]);
        if exponent.is_some() {
            cleaned.push_str(&cur.line()[mantissa_end..cur.pos()]);
        }
        cleaned.parse::<f64>()
    } else {
        cur.span(start).parse::<f64>()
    }
    .map_err(|_| ParseError::BadTerm(reason))?;

    if !value.is_finite() {
        return Err(ParseError::BadTerm(reason));
    }
    Ok(value)
}

/// Writes `value` the way `printf("%.10g", value)` would.
pub(crate) fn write_g10(out: &mut String, value: f64) {
    if value.is_nan() {
        out.push_str("nan");
        return;
    }
    if value.is_infinite() {
        out.push_str(if value < 0.0 { "-inf" } else { "inf" });
        return;
    }
    if value == 0.0 {
        if value.is_sign_negative() {
            out.push('-');
        }
        out.push('0');
        return;
    }

    // Round to ten significant digits first; the exponent of the rounded
    // value decides between fixed and scientific form.
    let formatted = format!("{:.9e}", value);
    let (mantissa, exp_text) = match formatted.split_once('e') {
        Some(parts) => parts,
        None => {
            out.push_str(&formatted);
            return;
        }
    };
    let exp: i32 = exp_text.parse().unwrap_or(0);

    let negative = mantissa.starts_with('-');
    let mut digits: SmallVec<[u8; 16]> = mantissa
        .bytes()
        .filter(u8::is_ascii_digit)
        .collect();
    while digits.len() > 1 && digits.last() == Some(&b'0') {
        digits.pop();
    }

    if negative {
        out.push('-');
    }

    if !(-4..10).contains(&exp) {
        out.push(digits[0] as char);
        if digits.len() > 1 {
            out.push('.');
            for &digit in &digits[1..] {
                out.push(digit as char);
            }
        }
        out.push('e');
        out.push(if exp < 0 { '-' } else { '+' });
        let magnitude = exp.unsigned_abs();
        if magnitude < 10 {
            out.push('0');
        }
        let mut buf = itoa::Buffer::new();
        out.push_str(buf.format(magnitude));
    } else if exp >= 0 {
        let int_len = (exp + 1) as usize;
        if digits.len() <= int_len {
            for &digit in digits.iter() {
                out.push(digit as char);
            }
            for _ in digits.len()..int_len {
                out.push('0');
            }
        } else {
            for &digit in &digits[..int_len] {
                out.push(digit as char);
            }
            out.push('.');
            for &digit in &digits[int_len..] {
                out.push(digit as char);
            }
        }
    } else {
        out.push_str("0.");
        for _ in 0..(-exp - 1) {
            out.push('0');
        }
        for &digit in digits.iter() {
            out.push(digit as char);
        }
    }
}
