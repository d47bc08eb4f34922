//! Article-tag link annotations
//!
//! Links from articles to tags may carry one color annotation per user,
//! stored under a `color_<username>` attribute. That naming scheme is
//! load-bearing: annotations written by different users live side by
//! side on the same link and must stay independent.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Attribute prefix for per-user link colors.
pub const COLOR_PREFIX: &str = "color";

/// An RGB color stored on an article-tag link. Channels are 0-255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub [u8; 3]);

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    pub fn channels(&self) -> [u8; 3] {
        self.0
    }
}

/// Error converting raw channel values into a [`Color`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("color channel out of range: {0} (expected 0-255)")]
    OutOfRange(i64),

    #[error("color must be a list of 3 integers")]
    Malformed,
}

impl TryFrom<[i64; 3]> for Color {
    type Error = ColorError;

    fn try_from(raw: [i64; 3]) -> Result<Self, Self::Error> {
        let mut channels = [0u8; 3];
        for (slot, value) in channels.iter_mut().zip(raw) {
            *slot = u8::try_from(value).map_err(|_| ColorError::OutOfRange(value))?;
        }
        Ok(Self(channels))
    }
}

/// Build the storage attribute name for one user's color annotation.
pub fn color_property(username: &str) -> String {
    format!("{}_{}", COLOR_PREFIX, username)
}

/// Split a link attribute name into its prefix and username suffix.
///
/// `color_alice` -> `("color", Some("alice"))`; a name without an
/// underscore has no suffix and keeps its full form as the prefix.
pub fn split_property(name: &str) -> (&str, Option<&str>) {
    match name.split_once('_') {
        Some((prefix, suffix)) => (prefix, Some(suffix)),
        None => (name, None),
    }
}
