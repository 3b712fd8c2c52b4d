//! GitHub access.
//!
//! Only raw file retrieval is needed; repositories are never cloned.

pub mod fetcher;

pub use fetcher::{FetchOptions, FetchOutcome, GithubFetcher};
