//! paperdex-scraper — Source fetchers for raw paper records.
//!
//! One trait, two clients:
//!
//! - [`sources::arxiv::ArxivClient`] — arXiv topic-search API (Atom feed)
//! - [`sources::listing::ListingClient`] — curated listing site scraped
//!   by page selector (trending / latest)
//!
//! Fetches are refresh operations: the same topic at different times may
//! return different records. A missing field on one record degrades to
//! `None`; only a wholly unreachable or unparseable source is an error.

pub mod error;
pub mod models;
pub mod sources;

pub use error::FetchError;
pub use models::{PageSelector, RawPaper};
pub use sources::PaperSource;
