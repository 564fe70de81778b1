//! Cart/order status tags.
//!
//! Statuses are an open, admin-extensible set of named tags rather than a
//! closed enum: a status referenced by name that does not exist yet is created
//! on first use. Callers may name a status either way, so requests carry a
//! [`StatusRef`] that the storefront resolves once into a canonical
//! [`Status`].

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::StatusId;

/// Slug of the status every new cart starts in.
pub const DEFAULT_STATUS: &str = "active";

/// A reference to a status, either by its symbolic name or its numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusRef {
    /// Numeric tag id (must already exist).
    ById(StatusId),
    /// Symbolic name (created on first use).
    ByName(String),
}

impl StatusRef {
    /// Reference a status by name.
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::ByName(name.into())
    }
}

/// Numeric strings become [`StatusRef::ById`], anything else a name.
impl FromStr for StatusRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<StatusId>()
            .map_or_else(|_| Self::ByName(s.trim().to_owned()), Self::ById))
    }
}

impl fmt::Display for StatusRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ById(id) => write!(f, "#{id}"),
            Self::ByName(name) => f.write_str(name),
        }
    }
}

/// A resolved status tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub id: StatusId,
    pub name: String,
    pub slug: String,
}

/// Reduce a status name to its canonical slug: lower-case ASCII
/// alphanumerics separated by single hyphens.
///
/// ```
/// use storehouse_core::slugify;
///
/// assert_eq!(slugify("  Awaiting Payment! "), "awaiting-payment");
/// assert_eq!(slugify("on_hold"), "on-hold");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
