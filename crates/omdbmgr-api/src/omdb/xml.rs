//! Pull parser for OMDb XML search responses.
//!
//! All data is carried in attributes:
//!
//! ```text
//! <root totalResults="25" response="True">
//!   <result title="Batman" year="1989" imdbID="tt0096895" type="movie" poster="https://..."/>
//! </root>
//! ```

use std::fmt::Display;
use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};

use super::error::OmdbError;
use super::types::{Movie, SearchPage, parse_year};

/// Document element carrying `totalResults`.
const ROOT_TAG: &[u8] = b"root";
/// One search result.
const RESULT_TAG: &[u8] = b"result";
/// Error message of a `response="False"` document.
const ERROR_TAG: &[u8] = b"error";

/// Attributes collected from an open `result` element.
#[derive(Debug, Default)]
struct PendingResult {
    title: Option<String>,
    year: Option<String>,
    poster: Option<String>,
    imdb_id: Option<String>,
    kind: Option<String>,
}

impl PendingResult {
    /// Validates the collected attributes.
    ///
    /// A missing or malformed year is an error; a missing title or poster
    /// only drops the result.
    fn finish(self) -> Result<Option<Movie>, OmdbError> {
        let Some(year) = self.year.as_deref().and_then(parse_year) else {
            return Err(OmdbError::MalformedYear {
                title: self.title,
                value: self.year,
            });
        };

        match (self.title, self.poster) {
            (Some(title), Some(poster)) if !title.is_empty() && !poster.is_empty() => Ok(Some(
                Movie::new(title, year, poster)
                    .with_imdb_id(self.imdb_id)
                    .with_kind(self.kind),
            )),
            (title, _) => {
                tracing::trace!(?title, year, "result without poster skipped");
                Ok(None)
            }
        }
    }
}

/// Builds a markup error at the reader's current position.
fn markup_error<R>(reader: &Reader<R>, err: impl Display) -> OmdbError {
    OmdbError::Markup {
        position: u64::try_from(reader.buffer_position()).unwrap_or(u64::MAX),
        message: err.to_string(),
    }
}

/// Reads `totalResults` from the root element.
fn read_root<R>(element: &BytesStart<'_>, reader: &Reader<R>) -> Result<Option<u32>, OmdbError> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| markup_error(reader, e))?;
        if attr.key.local_name().as_ref() != b"totalResults" {
            continue;
        }
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|e| markup_error(reader, e))?;
        return match value.trim().parse::<u32>() {
            Ok(total) => Ok(Some(total)),
            Err(e) => {
                tracing::debug!(value = %value, error = %e, "ignoring unparseable totalResults");
                Ok(None)
            }
        };
    }
    Ok(None)
}

/// Resolves an entity or character reference inside `<error>` text.
///
/// Unknown entities are kept verbatim.
fn resolve_reference<R>(reference: &BytesRef<'_>, reader: &Reader<R>) -> Result<String, OmdbError> {
    if let Some(ch) = reference
        .resolve_char_ref()
        .map_err(|e| markup_error(reader, e))?
    {
        return Ok(ch.to_string());
    }
    let name = reference.decode().map_err(|e| markup_error(reader, e))?;
    Ok(resolve_predefined_entity(&name).map_or_else(|| format!("&{name};"), String::from))
}

/// Collects the attributes of a `result` element.
fn read_result<R>(element: &BytesStart<'_>, reader: &Reader<R>) -> Result<PendingResult, OmdbError> {
    let mut pending = PendingResult::default();
    for attr in element.attributes() {
        let attr = attr.map_err(|e| markup_error(reader, e))?;
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|e| markup_error(reader, e))?
            .into_owned();
        match attr.key.local_name().as_ref() {
            b"title" => pending.title = Some(value),
            b"year" => pending.year = Some(value),
            b"poster" => pending.poster = Some(value),
            b"imdbID" => pending.imdb_id = Some(value),
            b"type" => pending.kind = Some(value),
            _ => {}
        }
    }
    Ok(pending)
}

/// Closes a result, appending it to the page when complete.
fn close_result(pending: PendingResult, page: &mut SearchPage) -> Result<(), OmdbError> {
    if let Some(movie) = pending.finish()? {
        page.movies.push(movie);
    }
    Ok(())
}

/// Parses one OMDb XML search response.
///
/// Reads the document event by event; nothing is kept between calls.
///
/// # Errors
///
/// - [`OmdbError::Markup`] if the document is not well-formed.
/// - [`OmdbError::MalformedYear`] if any `result` has a missing or
///   malformed `year`, even one that would be dropped for lacking a poster.
pub fn parse_search_response<R: BufRead>(source: R) -> Result<SearchPage, OmdbError> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut page = SearchPage::default();
    let mut pending: Option<PendingResult> = None;
    let mut in_error = false;

    loop {
        let result = reader.read_event_into(&mut buf);
        let event = result.map_err(|e| markup_error(&reader, e))?;

        match event {
            Event::Start(ref e) => match e.local_name().as_ref() {
                ROOT_TAG => page.total_results = read_root(e, &reader)?,
                RESULT_TAG => pending = Some(read_result(e, &reader)?),
                ERROR_TAG => {
                    // Whitespace around references is part of the message.
                    reader.config_mut().trim_text(false);
                    in_error = true;
                }
                _ => {}
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                ROOT_TAG => page.total_results = read_root(e, &reader)?,
                RESULT_TAG => close_result(read_result(e, &reader)?, &mut page)?,
                _ => {}
            },
            Event::End(ref e) => match e.local_name().as_ref() {
                RESULT_TAG => {
                    if let Some(open) = pending.take() {
                        close_result(open, &mut page)?;
                    }
                }
                ERROR_TAG => {
                    reader.config_mut().trim_text(true);
                    in_error = false;
                    if let Some(message) = page.api_error.as_mut() {
                        let trimmed = message.trim();
                        if trimmed.len() != message.len() {
                            *message = String::from(trimmed);
                        }
                    }
                }
                _ => {}
            },
            Event::Text(ref t) if in_error => {
                let text = t.decode().map_err(|e| markup_error(&reader, e))?;
                page.api_error
                    .get_or_insert_with(String::new)
                    .push_str(&text);
            }
            Event::GeneralRef(ref r) if in_error => {
                let resolved = resolve_reference(r, &reader)?;
                page.api_error
                    .get_or_insert_with(String::new)
                    .push_str(&resolved);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(page)
}

/// Parses an OMDb XML search response held in memory.
///
/// # Errors
///
/// Same as [`parse_search_response`].
pub fn parse_search_str(xml: &str) -> Result<SearchPage, OmdbError> {
    parse_search_response(xml.as_bytes())
}
