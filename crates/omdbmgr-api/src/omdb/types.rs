//! OMDb search result types.

use std::cmp::Ordering;

use serde::Serialize;

/// Parses the release year from a raw OMDb `year` attribute.
///
/// Only the first four characters are meaningful: series years such as
/// `"2001–2005"` yield `2001`. Returns `None` when the value is shorter than
/// four bytes or the prefix is not an integer.
#[must_use]
pub fn parse_year(raw: &str) -> Option<i32> {
    raw.get(..4)?.parse().ok()
}

/// A movie entry from an OMDb search page.
///
/// Only entries with a title, a parseable year and a poster URL are ever
/// constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Movie {
    title: String,
    year: i32,
    poster: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    imdb_id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
}

impl Movie {
    /// Creates a new `Movie`.
    #[must_use]
    pub fn new(title: impl Into<String>, year: i32, poster: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            year,
            poster: poster.into(),
            imdb_id: None,
            kind: None,
        }
    }

    /// Sets the IMDb identifier (`imdbID` attribute).
    #[must_use]
    pub fn with_imdb_id(mut self, imdb_id: Option<String>) -> Self {
        self.imdb_id = imdb_id;
        self
    }

    /// Sets the media type (`type` attribute, e.g. `movie`, `series`).
    #[must_use]
    pub fn with_kind(mut self, kind: Option<String>) -> Self {
        self.kind = kind;
        self
    }

    /// Title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Release year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Poster URL.
    #[must_use]
    pub fn poster(&self) -> &str {
        &self.poster
    }

    /// IMDb identifier.
    #[must_use]
    pub fn imdb_id(&self) -> Option<&str> {
        self.imdb_id.as_deref()
    }

    /// Media type.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Orders movies by release year only.
    ///
    /// Movies from the same year compare equal, so a stable sort keeps
    /// them in encounter order.
    #[must_use]
    pub fn cmp_by_year(&self, other: &Self) -> Ordering {
        self.year.cmp(&other.year)
    }
}

/// One parsed search result page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// `totalResults` reported on the root element.
    pub total_results: Option<u32>,
    /// Complete results, in document order.
    pub movies: Vec<Movie>,
    /// Message of a `response="False"` document (e.g. "Movie not found!").
    pub api_error: Option<String>,
}
