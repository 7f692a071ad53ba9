//! xavyo Core Library
//!
//! Shared types for the multi-domain network.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (SiteId, UserId)
//!
//! # Example
//!
//! ```
//! use xavyo_core::{SiteId, UserId};
//!
//! let site: SiteId = "2".parse().unwrap();
//! let user = UserId::new(42);
//!
//! assert_eq!(site.get(), 2);
//! assert_eq!(user.to_string(), "42");
//! ```

pub mod ids;

pub use ids::{ParseIdError, SiteId, UserId};
