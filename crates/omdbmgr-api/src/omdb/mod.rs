//! OMDb search API client module.
//!
//! Handles HTTP requests to the OMDb `?s=` search endpoint, parses the XML
//! result pages and merges them into a single list sorted by release year.

mod api;
mod client;
mod error;
mod params;
mod search;
mod types;
pub(crate) mod xml;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalOmdbApi, OmdbApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{DEFAULT_BASE_URL, FetchConfig, OmdbClient, OmdbClientBuilder};
#[allow(clippy::module_name_repetitions)]
pub use error::OmdbError;
pub use params::SearchTerm;
pub use search::{
    PageContribution, PageOutcome, PageReport, RESULTS_PER_PAGE, SearchReport, page_count,
    search_all,
};
pub use types::{Movie, SearchPage, parse_year};
pub use xml::{parse_search_response, parse_search_str};
