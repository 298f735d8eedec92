//! Changelog model and its markdown dialect.
//!
//! The document is a free-text header followed by newest-first release
//! sections, each split into `### <kind>` change groups:
//!
//! ```text
//! ## [1.0.1](https://github.com/owner/repo/pull/2) - 2021-03-05
//! ### Fixed
//! - bug A
//! ```
//!
//! Everything in this module is pure: no I/O, no logging, and "today" comes
//! from an injected [`DateProvider`].

pub mod clock;
pub mod model;
pub mod parser;
pub mod writer;

pub use clock::{DEFAULT_TIME_ZONE, DateProvider, FixedDate, ReferenceClock};
pub use model::{Change, Changelog, Release};
pub use parser::{parse, parse_release_body};

/// Header used when the wiki has no changelog yet.
pub const DEFAULT_HEADER: &str = "# Changelog

All notable changes to this project will be documented in this file.

";
