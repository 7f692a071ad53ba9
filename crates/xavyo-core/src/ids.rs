//! Strongly Typed Identifiers
//!
//! Sites and users of a network are addressed by positive integers on the
//! wire (query parameters, cookies, config files). The newtypes below keep
//! the two apart at compile time.
//!
//! # Example
//!
//! ```
//! use xavyo_core::{SiteId, UserId};
//!
//! fn requires_site(id: SiteId) -> String {
//!     id.to_string()
//! }
//!
//! let site = SiteId::new(1);
//! let _user = UserId::new(1);
//!
//! assert_eq!(requires_site(site), "1");
//! // requires_site(_user); // This would not compile!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Error type for ID parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse
    pub id_type: &'static str,
    /// Why the input was rejected
    pub message: String,
}

impl Display for ParseIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse {}: {}", self.id_type, self.message)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to define a strongly-typed integer ID type
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw numeric identifier.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the raw numeric identifier.
            #[must_use]
            pub const fn get(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            /// Parses a decimal identifier. Zero is never a valid identifier.
            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let id: u64 = s.trim().parse().map_err(|e: std::num::ParseIntError| ParseIdError {
                    id_type: stringify!($name),
                    message: e.to_string(),
                })?;
                if id == 0 {
                    return Err(ParseIdError {
                        id_type: stringify!($name),
                        message: "identifier must be greater than zero".to_string(),
                    });
                }
                Ok(Self(id))
            }
        }
    };
}

define_id!(
    /// Strongly typed identifier for a site of the network.
    ///
    /// Every site owns a distinct domain (and therefore a distinct cookie
    /// scope). Site records themselves live in the site registry.
    ///
    /// # Example
    ///
    /// ```
    /// use xavyo_core::SiteId;
    ///
    /// let site: SiteId = "7".parse().unwrap();
    /// assert_eq!(site, SiteId::new(7));
    /// assert!("0".parse::<SiteId>().is_err());
    /// ```
    SiteId
);

define_id!(
    /// Strongly typed identifier for users.
    ///
    /// User ids are network-wide: the same id names the same account on
    /// every site, which is what lets an identity assertion issued by one
    /// site be honoured by another.
    UserId
);
