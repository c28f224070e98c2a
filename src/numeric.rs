//! Numeric-coercing input cells for pager controls.

use crate::Observable;
use std::fmt;

/// Content of a [`NumericCell`]: a parsed number or the raw text as typed
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    /// Input that parsed as a number
    Number(f64),
    /// Input that did not parse, kept verbatim so editing can continue
    Text(String),
}

impl CellValue {
    /// The number, if this is one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Reactive cell that coerces text input to a number when it can
///
/// `raw` holds exactly what the user last wrote. `number` holds the last
/// finite number written, and only changes when that number changes, so
/// arithmetic that depends on it ignores in-progress text.
#[derive(Clone, Debug)]
pub struct NumericCell {
    raw: Observable<CellValue>,
    number: Observable<f64>,
}

impl NumericCell {
    /// Create a cell holding `initial`
    pub fn new(initial: f64) -> Self {
        Self {
            raw: Observable::new(CellValue::Number(initial)),
            number: Observable::new(initial),
        }
    }

    /// Current content, as typed or as parsed
    pub fn get(&self) -> CellValue {
        self.raw.get()
    }

    /// Last valid number
    pub fn number(&self) -> f64 {
        self.number.get()
    }

    /// Write user input
    ///
    /// Stores a number if `raw` starts with one (see [`parse_float`]),
    /// otherwise stores the text itself. Never fails.
    pub fn write(&self, raw: &str) {
        match parse_float(raw) {
            Some(number) => self.set_number(number),
            None => {
                self.raw.set(CellValue::Text(raw.to_owned()));
            }
        }
    }

    /// Write a number directly
    pub fn set_number(&self, number: f64) {
        if number.is_nan() {
            return;
        }
        crate::Transaction::run(|| {
            self.raw.set(CellValue::Number(number));
            if number.is_finite() {
                self.number.set(number);
            }
        });
    }
}

/// Parse the longest numeric prefix of `raw`, the way browsers parse
/// number inputs.
///
/// Leading whitespace is skipped and trailing garbage is ignored (`"3px"`
/// is 3). `Infinity` is accepted. Returns `None` when no number starts the
/// string.
pub fn parse_float(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |mut at: usize| {
        while at < bytes.len() && bytes[at].is_ascii_digit() {
            at += 1;
        }
        at
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    if text[end..].starts_with("Infinity") {
        let sign = if text.starts_with('-') { -1.0 } else { 1.0 };
        return Some(sign * f64::INFINITY);
    }

    let integer_end = digits_from(end);
    let mut mantissa_digits = integer_end - end;
    end = integer_end;
    if bytes.get(end) == Some(&b'.') {
        let fraction_end = digits_from(end + 1);
        let fraction_digits = fraction_end - end - 1;
        if mantissa_digits + fraction_digits > 0 {
            mantissa_digits += fraction_digits;
            end = fraction_end;
        }
    }
    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let exponent_end = digits_from(exponent);
        if exponent_end > exponent {
            end = exponent_end;
        }
    }

    text[..end].parse().ok()
}
