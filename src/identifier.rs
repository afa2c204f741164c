//! Board identifier strings.
//! A name such as `bus=pci,vendor=17cb,device=1107,subsystem-device=e0fb` is a
//! comma-separated list of `key=value` attributes. Parsing keeps the original
//! order so a parsed name formats back to the same text.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    /// Parses a single `key=value` fragment. Returns `None` when there is no `=`.
    pub fn parse(fragment: &str) -> Option<Self> {
        let (key, value) = fragment.split_once('=')?;
        if key.is_empty() {
            return None;
        }
        Some(Attribute {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Ordered attribute list of one board name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identifier {
    // Pieces without `=` are kept as bare keys with `value: None`
    parts: Vec<(String, Option<String>)>,
}

impl Identifier {
    pub fn parse(name: &str) -> Self {
        let parts = name
            .split(',')
            .map(|piece| match piece.split_once('=') {
                Some((key, value)) => (key.to_string(), Some(value.to_string())),
                None => (piece.to_string(), None),
            })
            .collect();
        Identifier { parts }
    }

    /// Exact key and value match; substrings of values never count.
    pub fn contains(&self, attr: &Attribute) -> bool {
        self.parts
            .iter()
            .any(|(k, v)| *k == attr.key && v.as_deref() == Some(attr.value.as_str()))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match value {
                Some(value) => write!(f, "{}={}", key, value)?,
                None => f.write_str(key)?,
            }
        }
        Ok(())
    }
}
