//! Failure kinds for the fetch / parse / search path.

use thiserror::Error;

/// Errors raised while fetching or parsing an OMDb result page.
///
/// The kinds are kept apart because the search loop treats them
/// differently: a [`OmdbError::MalformedYear`] aborts the whole run, every
/// other kind only empties the page it happened on (after the first call).
#[derive(Debug, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum OmdbError {
    /// Connection refused, DNS failure, timeout or body I/O error.
    #[error("request to {url} failed: {source}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status code.
    #[error("unable to open connection: {reason} code {code}{}", server_message(.body))]
    Status {
        /// HTTP status code.
        code: u16,
        /// Standard reason phrase of `code` (not read from the wire).
        reason: String,
        /// Leading part of the response body, the server's own message.
        body: String,
    },

    /// The response body is not well-formed XML.
    #[error("XML decoding failed at byte {position}: {message}")]
    Markup {
        /// Byte offset reached by the reader.
        position: u64,
        /// Reader error message.
        message: String,
    },

    /// A `result` element carries no usable 4-digit year prefix.
    #[error("malformed year {value:?} for result {title:?}")]
    MalformedYear {
        /// Title attribute of the offending element, if any.
        title: Option<String>,
        /// Raw `year` attribute, `None` when absent.
        value: Option<String>,
    },
}

/// Formats the server message of a status error, whitespace collapsed.
fn server_message(body: &str) -> String {
    let message = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if message.is_empty() {
        message
    } else {
        format!(" ({message})")
    }
}

impl OmdbError {
    /// Returns `true` for data corruption that must abort the whole search.
    #[must_use]
    pub const fn is_malformed_data(&self) -> bool {
        matches!(self, Self::MalformedYear { .. })
    }

    /// Returns `true` if the underlying transport error was a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}
