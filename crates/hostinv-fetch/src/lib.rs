//! hostinv-fetch: raw data sources and section brokering
//!
//! Supplies parsed, section-keyed payloads per host and source type. The
//! aggregation core only sees the broker's lookup-by-keys contract; where
//! the data actually comes from is behind the [`RawDataSource`] trait.

pub mod broker;
pub mod error;
pub mod spool;
pub mod traits;
pub mod types;

pub use broker::SectionsBroker;
pub use error::FetchError;
pub use spool::{SpoolSource, SpoolSourceFactory};
pub use traits::{RawDataSource, SourceFactory, SourceResult};
pub use types::{HostKey, HostSections, SourceType};
