//! Fixed-capacity menu label.
//!
//! Labels hold at most [`LABEL_CAPACITY`] bytes of UTF-8. Anything written
//! beyond that is dropped at the last whole character that fits, so formatting
//! a long value into a label can never overflow it.

use core::fmt::{self, Write};

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Maximum label length in bytes (a 24 byte buffer minus its terminator).
pub const LABEL_CAPACITY: usize = 23;

/// Bounded text shown in a single menu row.
///
/// Serialized as a plain string. Deserializing truncates like [`Label::truncated`],
/// so over-long names from the backend still load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Label(heapless::String<LABEL_CAPACITY>);

impl Label {
    /// An empty label.
    pub const fn new() -> Self {
        Self(heapless::String::new())
    }

    /// Build a label from `text`, truncating to capacity.
    pub fn truncated(text: &str) -> Self {
        let mut label = Self::new();
        label.push_truncated(text);
        label
    }

    /// Build a label from format arguments, truncating to capacity.
    ///
    /// ```ignore
    /// let label = Label::format(format_args!("{} kg", 12.5));
    /// ```
    pub fn format(args: fmt::Arguments<'_>) -> Self {
        let mut label = Self::new();
        // an error only means the output was cut short
        let _ = label.write_fmt(args);
        label
    }

    /// Replace the contents with `text`, truncating to capacity.
    pub fn set(&mut self, text: &str) {
        self.0.clear();
        self.push_truncated(text);
    }

    /// Empty the label.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Append as many whole characters of `text` as still fit.
    ///
    /// Returns `true` when the whole of `text` was stored.
    fn push_truncated(&mut self, text: &str) -> bool {
        if self.0.push_str(text).is_ok() {
            return true;
        }
        for ch in text.chars() {
            if self.0.push(ch).is_err() {
                return false;
            }
        }
        true
    }
}

/// Writes stop at the first piece that does not fit whole: that piece is cut
/// at a character boundary and `fmt::Error` ends the formatting call, so the
/// label always holds a prefix of the formatted text.
impl Write for Label {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.push_truncated(s) {
            Ok(())
        } else {
            Err(fmt::Error)
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self::truncated(value)
    }
}

impl PartialEq<str> for Label {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Label {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

struct LabelVisitor;

impl Visitor<'_> for LabelVisitor {
    type Value = Label;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Label, E> {
        Ok(Label::truncated(v))
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(LabelVisitor)
    }
}
