//! Login credentials.

use std::fmt;

use crate::error::{Error, Result};

/// Address and secret used to log in.
///
/// Immutable once built. The secret is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    address: String,
    secret: String,
}

impl Credentials {
    /// Creates credentials after checking the address shape.
    ///
    /// Surrounding whitespace is trimmed from the address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] unless the address contains exactly
    /// one `@` with text on both sides.
    pub fn new(address: impl Into<String>, secret: impl Into<String>) -> Result<Self> {
        let address = address.into().trim().to_string();

        match address.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {}
            _ => return Err(Error::InvalidAddress(address)),
        }

        Ok(Self {
            address,
            secret: secret.into(),
        })
    }

    /// The full address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// The part after `@`, as written.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.address
            .split_once('@')
            .map_or("", |(_, domain)| domain)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("address", &self.address)
            .field("secret", &"***")
            .finish()
    }
}
