//! `OmdbApi` trait definition.
#![allow(clippy::future_not_send)]

use super::error::OmdbError;
use super::params::SearchTerm;
use super::types::SearchPage;

/// OMDb search API trait.
///
/// Abstracts one fetch-and-parse cycle for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(OmdbApi: Send)]
pub trait LocalOmdbApi {
    /// Fetches and parses one search result page.
    ///
    /// `page == 0` requests the first page without a `page` parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the server answers with a
    /// non-success status, or the XML cannot be parsed.
    async fn search_page(&self, term: &SearchTerm, page: u32) -> Result<SearchPage, OmdbError>;
}
