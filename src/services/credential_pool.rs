//! Credential pool
//!
//! Holds the ordered provider API keys loaded at startup. The pool itself is
//! immutable; each request walks it through its own [`Rotation`] cursor so
//! concurrent requests never observe each other's position.

use std::fmt;
use std::sync::Arc;

/// A provider API key
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    value: String,
    position: usize,
}

impl Credential {
    /// Create a credential at the given pool position
    pub fn new(value: impl Into<String>, position: usize) -> Self {
        Self {
            value: value.into(),
            position,
        }
    }

    /// Create a caller-supplied credential (not part of the pool)
    pub fn caller(value: impl Into<String>) -> Self {
        Self::new(value, 0)
    }

    /// Raw secret, for the provider client only
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Position in the pool
    pub fn position(&self) -> usize {
        self.position
    }

    /// Masked form safe for logs: first four characters only
    pub fn masked(&self) -> String {
        let prefix: String = self.value.chars().take(4).collect();
        format!("{}****", prefix)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("value", &self.masked())
            .field("position", &self.position)
            .finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({})", self.position, self.masked())
    }
}

/// Validate the format of a caller-supplied key
pub fn validate_key_format(key: &str) -> bool {
    key.len() >= 8 && !key.contains(char::is_whitespace)
}

/// Ordered, fixed-length set of provider credentials
#[derive(Debug, Clone)]
pub struct CredentialPool {
    credentials: Arc<[Credential]>,
}

impl Default for CredentialPool {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}

impl CredentialPool {
    /// Build a pool from raw keys, preserving order
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let credentials: Vec<Credential> = keys
            .into_iter()
            .enumerate()
            .map(|(position, key)| Credential::new(key, position))
            .collect();

        Self {
            credentials: credentials.into(),
        }
    }

    /// Number of configured credentials; the per-request attempt budget
    pub fn size(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Credential at a position
    pub fn get(&self, index: usize) -> Option<&Credential> {
        self.credentials.get(index)
    }

    /// Start a new rotation at the first credential
    pub fn rotation(&self) -> Rotation<'_> {
        Rotation {
            pool: self,
            index: 0,
        }
    }
}

/// Per-request cursor over a [`CredentialPool`]
///
/// A rotation makes a single pass: once the last credential has been tried,
/// `advance` wraps back to the start and reports exhaustion.
#[derive(Debug)]
pub struct Rotation<'a> {
    pool: &'a CredentialPool,
    index: usize,
}

impl<'a> Rotation<'a> {
    /// Credential at the active index, `None` for an empty pool
    pub fn current(&self) -> Option<&'a Credential> {
        self.pool.get(self.index)
    }

    /// Move to the next credential. Returns `false` and resets to the first
    /// credential when the pool is exhausted.
    pub fn advance(&mut self) -> bool {
        if self.index + 1 < self.pool.size() {
            self.index += 1;
            true
        } else {
            self.index = 0;
            false
        }
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn size(&self) -> usize {
        self.pool.size()
    }

    /// Active index
    pub fn index(&self) -> usize {
        self.index
    }
}
