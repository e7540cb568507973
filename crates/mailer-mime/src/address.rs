//! Address lists for message headers.

use std::fmt;

/// Ordered list of email addresses.
///
/// Addresses are opaque strings; no validation happens here. A list can be
/// built from a single address or from any collection of addresses, so
/// callers never have to wrap one recipient in a `Vec`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AddressList(Vec<String>);

impl AddressList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends an address.
    pub fn push(&mut self, address: impl Into<String>) {
        self.0.push(address.into());
    }

    /// Returns true if the list has no addresses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the addresses in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Joins the addresses with `", "`; an empty list joins to `""`.
    #[must_use]
    pub fn join(&self) -> String {
        self.0.join(", ")
    }

    /// Returns the addresses as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Consumes the list, returning the addresses.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl fmt::Display for AddressList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join())
    }
}

impl From<&str> for AddressList {
    fn from(address: &str) -> Self {
        Self(vec![address.to_string()])
    }
}

impl From<String> for AddressList {
    fn from(address: String) -> Self {
        Self(vec![address])
    }
}

impl From<&String> for AddressList {
    fn from(address: &String) -> Self {
        Self(vec![address.clone()])
    }
}

impl From<Vec<String>> for AddressList {
    fn from(addresses: Vec<String>) -> Self {
        Self(addresses)
    }
}

impl From<Vec<&str>> for AddressList {
    fn from(addresses: Vec<&str>) -> Self {
        addresses.into_iter().collect()
    }
}

impl From<&[&str]> for AddressList {
    fn from(addresses: &[&str]) -> Self {
        addresses.iter().copied().collect()
    }
}

impl From<&[String]> for AddressList {
    fn from(addresses: &[String]) -> Self {
        Self(addresses.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for AddressList {
    fn from(addresses: [&str; N]) -> Self {
        addresses.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for AddressList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for AddressList {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

impl IntoIterator for AddressList {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a AddressList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
