//! OMDb search request parameter types.

use std::fmt;

use url::form_urlencoded;

/// Separator placed between search tokens.
const TOKEN_SEPARATOR: &str = "+";

/// Search term (`s` parameter) built from free-text tokens.
///
/// Tokens are joined with `+`. In the request each token is
/// form-urlencoded on its own, so `+` keeps acting as the word separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    tokens: Vec<String>,
}

impl SearchTerm {
    /// Builds a term from command-line tokens.
    ///
    /// Returns `None` when no token is given.
    #[must_use]
    pub fn from_tokens<I, S>(tokens: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        if tokens.is_empty() {
            return None;
        }
        Some(Self { tokens })
    }

    /// Value for the `s` query parameter, percent-encoded.
    ///
    /// Example: `["star", "wars"]` -> `"star+wars"`, `["r&b"]` -> `"r%26b"`.
    #[must_use]
    pub fn query_value(&self) -> String {
        self.tokens
            .iter()
            .map(|token| form_urlencoded::byte_serialize(token.as_bytes()).collect::<String>())
            .collect::<Vec<_>>()
            .join(TOKEN_SEPARATOR)
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(TOKEN_SEPARATOR))
    }
}
