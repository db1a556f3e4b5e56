// Address — hierarchical identifier for actors and clients
//
// An address is an ordered list of printable US-ASCII elements. In text form
// the elements are joined with ':' and a backslash escapes either ':' or
// itself, so "one\:two" is the single element "one:two".

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

const DELIM: char = ':';
const ESCAPE: char = '\\';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Not printable ASCII: {0:?}")]
    NotPrintableAscii(char),
    #[error("Unrecognized escape sequence: \\{0}")]
    UnrecognizedEscape(char),
    #[error("Unrecognized escape sequence: dangling escape at end of input")]
    DanglingEscape,
    #[error("Address must have at least one element")]
    NoElements,
    #[error("Element index {index} out of range (size {size})")]
    IndexOutOfRange { index: usize, size: usize },
    #[error("{prefix} is not a prefix of {address}")]
    NotAPrefix { prefix: String, address: String },
    #[error("Removing {0} would leave an empty address")]
    EmptyRemainder(String),
    #[error("Cannot remove {count} trailing elements from an address of size {size}")]
    SuffixOutOfRange { count: usize, size: usize },
}

/// Immutable hierarchical address.
///
/// Equality and hashing compare the element sequence, so `a:b` and `a:b:c`
/// differ and element order matters. Elements are shared behind an `Arc`,
/// which makes clones cheap; every accessor hands out copies.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    elements: Arc<[String]>,
}

fn check_printable(ch: char) -> Result<(), AddressError> {
    // Anything outside 0x20..=0x7E fails, including every multibyte character.
    if (' '..='~').contains(&ch) {
        Ok(())
    } else {
        Err(AddressError::NotPrintableAscii(ch))
    }
}

fn escape_element(element: &str, out: &mut String) {
    for ch in element.chars() {
        if ch == DELIM || ch == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(ch);
    }
}

impl Address {
    /// Build an address from raw (unescaped) elements.
    pub fn of<I, S>(elements: I) -> Result<Self, AddressError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let elements: Vec<String> = elements.into_iter().map(Into::into).collect();
        if elements.is_empty() {
            return Err(AddressError::NoElements);
        }
        for element in &elements {
            element.chars().try_for_each(check_printable)?;
        }
        Ok(Self {
            elements: elements.into(),
        })
    }

    // Callers guarantee a non-empty, already validated element list.
    fn from_validated(elements: Vec<String>) -> Self {
        debug_assert!(!elements.is_empty());
        Self {
            elements: elements.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.elements.len()
    }

    /// Always `false` for a constructed address; kept for API parity with
    /// collection-like types.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Copy of the raw elements.
    pub fn elements(&self) -> Vec<String> {
        self.elements.to_vec()
    }

    pub fn element(&self, index: usize) -> Result<&str, AddressError> {
        self.elements
            .get(index)
            .map(String::as_str)
            .ok_or(AddressError::IndexOutOfRange {
                index,
                size: self.elements.len(),
            })
    }

    /// Last element. Sessions use it as their identifier on the wire.
    pub fn last_element(&self) -> &str {
        self.elements.last().map(String::as_str).unwrap_or_default()
    }

    /// Append raw elements to the end of this address.
    pub fn append_suffix<I, S>(&self, suffix: I) -> Result<Self, AddressError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut elements = self.elements.to_vec();
        for element in suffix {
            let element = element.into();
            element.chars().try_for_each(check_printable)?;
            elements.push(element);
        }
        Ok(Self::from_validated(elements))
    }

    /// Append every element of `suffix` to the end of this address.
    pub fn append_address(&self, suffix: &Address) -> Self {
        let mut elements = self.elements.to_vec();
        elements.extend(suffix.elements.iter().cloned());
        Self::from_validated(elements)
    }

    /// Returns `true` if this address is a prefix of `other` or equal to it.
    ///
    /// ```
    /// use actorlink_core::Address;
    ///
    /// let parent = Address::of(["one", "two"]).unwrap();
    /// let child = Address::of(["one", "two", "three"]).unwrap();
    /// assert!(parent.is_prefix_of(&child));
    /// assert!(child.is_prefix_of(&child));
    /// assert!(!child.is_prefix_of(&parent));
    /// ```
    pub fn is_prefix_of(&self, other: &Address) -> bool {
        other.elements.len() >= self.elements.len()
            && self
                .elements
                .iter()
                .zip(other.elements.iter())
                .all(|(a, b)| a == b)
    }

    /// Strip `prefix` from the front of this address.
    ///
    /// Fails if `prefix` is not a prefix of this address, or if nothing would
    /// remain (the two are equal).
    pub fn remove_prefix(&self, prefix: &Address) -> Result<Self, AddressError> {
        if !prefix.is_prefix_of(self) {
            return Err(AddressError::NotAPrefix {
                prefix: prefix.to_string(),
                address: self.to_string(),
            });
        }
        let rest = &self.elements[prefix.elements.len()..];
        if rest.is_empty() {
            return Err(AddressError::EmptyRemainder(prefix.to_string()));
        }
        Ok(Self::from_validated(rest.to_vec()))
    }

    /// Drop `count` trailing elements. `count` must be smaller than `size()`.
    pub fn remove_suffix(&self, count: usize) -> Result<Self, AddressError> {
        let size = self.elements.len();
        if count >= size {
            return Err(AddressError::SuffixOutOfRange { count, size });
        }
        if count == 0 {
            return Ok(self.clone());
        }
        Ok(Self::from_validated(self.elements[..size - count].to_vec()))
    }

    /// The address with its last element removed, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        self.remove_suffix(1).ok()
    }

    /// This address followed by each ancestor, most specific first.
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            next: Some(self.clone()),
        }
    }
}

/// Iterator returned by [`Address::ancestors`].
pub struct Ancestors {
    next: Option<Address>,
}

impl Iterator for Ancestors {
    type Item = Address;

    fn next(&mut self) -> Option<Address> {
        let current = self.next.take()?;
        self.next = current.parent();
        Some(current)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut elements = Vec::new();
        let mut current = String::new();
        let mut escaping = false;

        for ch in text.chars() {
            check_printable(ch)?;

            if escaping {
                match ch {
                    DELIM | ESCAPE => current.push(ch),
                    other => return Err(AddressError::UnrecognizedEscape(other)),
                }
                escaping = false;
            } else if ch == ESCAPE {
                escaping = true;
            } else if ch == DELIM {
                elements.push(std::mem::take(&mut current));
            } else {
                current.push(ch);
            }
        }

        if escaping {
            return Err(AddressError::DanglingEscape);
        }

        // End of input always closes an element, so "" is [""] and "a:" is ["a", ""].
        elements.push(current);
        Ok(Self::from_validated(elements))
    }
}

impl TryFrom<&str> for Address {
    type Error = AddressError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                out.push(DELIM);
            }
            escape_element(element, &mut out);
        }
        f.write_str(&out)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Address").field(&self.to_string()).finish()
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Conversion used by APIs that accept either a parsed address or its text form.
pub trait IntoAddress {
    fn into_address(self) -> Result<Address, AddressError>;
}

impl IntoAddress for Address {
    fn into_address(self) -> Result<Address, AddressError> {
        Ok(self)
    }
}

impl IntoAddress for &Address {
    fn into_address(self) -> Result<Address, AddressError> {
        Ok(self.clone())
    }
}

impl IntoAddress for &str {
    fn into_address(self) -> Result<Address, AddressError> {
        self.parse()
    }
}

impl IntoAddress for String {
    fn into_address(self) -> Result<Address, AddressError> {
        self.parse()
    }
}

impl IntoAddress for &String {
    fn into_address(self) -> Result<Address, AddressError> {
        self.parse()
    }
}
