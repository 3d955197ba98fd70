//! Pagination loop collecting every result page of a search.

use serde::Serialize;
use tracing::instrument;

use super::api::LocalOmdbApi;
use super::error::OmdbError;
use super::params::SearchTerm;
use super::types::Movie;

/// Number of results OMDb returns per page.
pub const RESULTS_PER_PAGE: u32 = 10;

/// Number of pages to request for `total_results`.
///
/// Always one more than `total_results / 10`, so a count that is an exact
/// multiple of ten (or zero) still triggers one extra request.
#[must_use]
pub const fn page_count(total_results: u32) -> u32 {
    (total_results / RESULTS_PER_PAGE).saturating_add(1)
}

/// What a paginated request contributed to the result list.
#[derive(Debug)]
pub enum PageContribution {
    /// The page was fetched and parsed (possibly with zero movies).
    Movies(Vec<Movie>),
    /// The request failed; the page contributes nothing.
    Failed(OmdbError),
}

impl PageContribution {
    /// Movies contributed by the page; empty for a failed page.
    #[must_use]
    pub fn into_movies(self) -> Vec<Movie> {
        match self {
            Self::Movies(movies) => movies,
            Self::Failed(_) => Vec::new(),
        }
    }
}

/// Outcome of one page request, as recorded in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageOutcome {
    /// Fetched, contributing `movies` entries.
    Fetched {
        /// Number of complete movies on the page.
        movies: usize,
    },
    /// Failed and skipped.
    Failed {
        /// Error message.
        reason: String,
    },
}

/// Per-page entry of a [`SearchReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageReport {
    /// Page number (the first, unpaginated request is page 1).
    pub page: u32,
    /// Outcome, serialized inline next to `page`.
    #[serde(flatten)]
    pub outcome: PageOutcome,
}

/// Result of a complete search run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    /// `totalResults` reported by the first response (0 when absent).
    pub total_results: u32,
    /// Number of pages requested, including the first one.
    pub page_count: u32,
    /// Movies with a poster, sorted by year (stable).
    pub movies: Vec<Movie>,
    /// Per-page outcomes in request order.
    pub pages: Vec<PageReport>,
}

impl SearchReport {
    /// Page numbers whose request failed.
    pub fn failed_pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages
            .iter()
            .filter(|p| matches!(p.outcome, PageOutcome::Failed { .. }))
            .map(|p| p.page)
    }
}

/// Requests one paginated page, turning recoverable failures into
/// [`PageContribution::Failed`].
///
/// # Errors
///
/// Returns malformed-data errors, which abort the search.
async fn fetch_paginated(
    api: &(impl LocalOmdbApi + Sync),
    term: &SearchTerm,
    page: u32,
) -> Result<PageContribution, OmdbError> {
    match api.search_page(term, page).await {
        Ok(result) => Ok(PageContribution::Movies(result.movies)),
        Err(e) if e.is_malformed_data() => {
            tracing::error!(page, error = %e, "Malformed result data, aborting search");
            Err(e)
        }
        Err(e) => {
            tracing::warn!(page, error = %e, "Error during connection, page skipped");
            Ok(PageContribution::Failed(e))
        }
    }
}

/// Fetches every result page for `term` and merges the movies.
///
/// The first request carries no `page` parameter and supplies
/// `totalResults`; pages `2..=page_count(total)` follow one after another.
/// Movies are never deduplicated and are sorted by year at the end.
///
/// # Errors
///
/// - Any failure of the first request.
/// - [`OmdbError::MalformedYear`] from any page.
#[instrument(skip_all, fields(term = %term))]
pub async fn search_all(
    api: &(impl LocalOmdbApi + Sync),
    term: &SearchTerm,
) -> Result<SearchReport, OmdbError> {
    let first = api.search_page(term, 0).await?;
    if let Some(ref message) = first.api_error {
        tracing::warn!("OMDb reported: {message}");
    }

    let total_results = first.total_results.unwrap_or(0);
    tracing::info!("Total results {total_results}");
    let page_count = page_count(total_results);
    tracing::info!("Calls: {page_count}");

    let mut movies = first.movies;
    let mut pages = vec![PageReport {
        page: 1,
        outcome: PageOutcome::Fetched {
            movies: movies.len(),
        },
    }];

    for page in 2..=page_count {
        let outcome = match fetch_paginated(api, term, page).await? {
            PageContribution::Failed(e) => PageOutcome::Failed {
                reason: e.to_string(),
            },
            contribution => {
                let found = contribution.into_movies();
                let outcome = PageOutcome::Fetched {
                    movies: found.len(),
                };
                movies.extend(found);
                outcome
            }
        };
        tracing::debug!(page, ?outcome, "page completed");
        pages.push(PageReport { page, outcome });
    }

    movies.sort_by(Movie::cmp_by_year);

    tracing::info!(
        total = movies.len(),
        pages = page_count,
        "Search pagination completed"
    );

    Ok(SearchReport {
        total_results,
        page_count,
        movies,
        pages,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::omdb::client::{FetchConfig, OmdbClient};
    use crate::omdb::types::SearchPage;

    /// Mock API that returns pre-configured pages in order and records the
    /// requested page numbers.
    struct MockOmdbApi {
        responses: Mutex<VecDeque<Result<SearchPage, OmdbError>>>,
        requested: Mutex<Vec<u32>>,
    }

    impl MockOmdbApi {
        fn new(responses: Vec<Result<SearchPage, OmdbError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl LocalOmdbApi for MockOmdbApi {
        async fn search_page(
            &self,
            _term: &SearchTerm,
            page: u32,
        ) -> Result<SearchPage, OmdbError> {
            self.requested.lock().unwrap().push(page);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(SearchPage::default()))
        }
    }

    fn page(total: Option<u32>, movies: &[(&str, i32)]) -> SearchPage {
        SearchPage {
            total_results: total,
            movies: movies
                .iter()
                .map(|(title, year)| Movie::new(*title, *year, format!("https://img/{title}.jpg")))
                .collect(),
            api_error: None,
        }
    }

    fn unavailable() -> OmdbError {
        OmdbError::Status {
            code: 503,
            reason: String::from("Service Unavailable"),
            body: String::new(),
        }
    }

    fn term() -> SearchTerm {
        SearchTerm::from_tokens(["batman"]).unwrap()
    }

    fn years(report: &SearchReport) -> Vec<i32> {
        report.movies.iter().map(Movie::year).collect()
    }

    #[test]
    fn test_page_count_arithmetic() {
        // Arrange & Act & Assert
        assert_eq!(page_count(0), 1);
        assert_eq!(page_count(3), 1);
        assert_eq!(page_count(9), 1);
        assert_eq!(page_count(10), 2);
        assert_eq!(page_count(25), 3);
        assert_eq!(page_count(30), 4);
        assert_eq!(page_count(u32::MAX), u32::MAX / 10 + 1);
    }

    #[test]
    fn test_failed_contribution_has_no_movies() {
        // Arrange
        let contribution = PageContribution::Failed(unavailable());

        // Act & Assert
        assert!(contribution.into_movies().is_empty());
    }

    #[test]
    fn test_page_report_serializes_outcome_inline() {
        // Arrange
        let fetched = PageReport {
            page: 1,
            outcome: PageOutcome::Fetched { movies: 3 },
        };
        let failed = PageReport {
            page: 2,
            outcome: PageOutcome::Failed {
                reason: String::from("timed out"),
            },
        };

        // Act
        let fetched = serde_json::to_value(&fetched).unwrap();
        let failed = serde_json::to_value(&failed).unwrap();

        // Assert
        assert_eq!(
            fetched,
            serde_json::json!({ "page": 1, "status": "fetched", "movies": 3 })
        );
        assert_eq!(
            failed,
            serde_json::json!({ "page": 2, "status": "failed", "reason": "timed out" })
        );
    }

    #[tokio::test]
    async fn test_single_page_issues_no_paginated_calls() {
        // Arrange
        let mock = MockOmdbApi::new(vec![Ok(page(Some(3), &[("A", 2000), ("B", 1990)]))]);

        // Act
        let report = search_all(&mock, &term()).await.unwrap();

        // Assert
        assert_eq!(mock.requested(), vec![0]);
        assert_eq!(report.page_count, 1);
        assert_eq!(years(&report), vec![1990, 2000]);
    }

    #[tokio::test]
    async fn test_fetches_remaining_pages_in_order() {
        // Arrange
        let mock = MockOmdbApi::new(vec![
            Ok(page(Some(25), &[("A", 2005), ("B", 1989)])),
            Ok(page(Some(25), &[("C", 1966)])),
            Ok(page(Some(25), &[("D", 2011)])),
        ]);

        // Act
        let report = search_all(&mock, &term()).await.unwrap();

        // Assert
        assert_eq!(mock.requested(), vec![0, 2, 3]);
        assert_eq!(report.total_results, 25);
        assert_eq!(report.page_count, 3);
        assert_eq!(years(&report), vec![1966, 1989, 2005, 2011]);
        assert_eq!(report.pages.len(), 3);
    }

    #[tokio::test]
    async fn test_exact_multiple_of_ten_fetches_extra_page() {
        // Arrange
        let mock = MockOmdbApi::new(vec![Ok(page(Some(10), &[("A", 2000)])), Ok(page(None, &[]))]);

        // Act
        let report = search_all(&mock, &term()).await.unwrap();

        // Assert: page 2 requested although page 1 held everything
        assert_eq!(mock.requested(), vec![0, 2]);
        assert_eq!(
            report.pages[1].outcome,
            PageOutcome::Fetched { movies: 0 }
        );
        assert_eq!(report.failed_pages().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_total_results_means_single_page() {
        // Arrange
        let mock = MockOmdbApi::new(vec![Ok(page(None, &[]))]);

        // Act
        let report = search_all(&mock, &term()).await.unwrap();

        // Assert
        assert_eq!(mock.requested(), vec![0]);
        assert_eq!(report.total_results, 0);
        assert!(report.movies.is_empty());
    }

    #[tokio::test]
    async fn test_duplicates_across_pages_are_kept() {
        // Arrange
        let mock = MockOmdbApi::new(vec![
            Ok(page(Some(12), &[("Batman Begins", 2005)])),
            Ok(page(Some(12), &[("Batman Begins", 2005)])),
        ]);

        // Act
        let report = search_all(&mock, &term()).await.unwrap();

        // Assert
        assert_eq!(report.movies.len(), 2);
        assert_eq!(report.movies[0], report.movies[1]);
    }

    #[tokio::test]
    async fn test_sort_is_stable_across_pages() {
        // Arrange
        let mock = MockOmdbApi::new(vec![
            Ok(page(Some(11), &[("first 2001", 2001), ("1999", 1999)])),
            Ok(page(Some(11), &[("second 2001", 2001), ("2005", 2005)])),
        ]);

        // Act
        let report = search_all(&mock, &term()).await.unwrap();

        // Assert
        assert_eq!(years(&report), vec![1999, 2001, 2001, 2005]);
        assert_eq!(report.movies[1].title(), "first 2001");
        assert_eq!(report.movies[2].title(), "second 2001");
    }

    #[tokio::test]
    async fn test_first_call_failure_is_fatal() {
        // Arrange
        let mock = MockOmdbApi::new(vec![Err(unavailable())]);

        // Act
        let result = search_all(&mock, &term()).await;

        // Assert
        assert!(matches!(result, Err(OmdbError::Status { code: 503, .. })));
        assert_eq!(mock.requested(), vec![0]);
    }

    #[tokio::test]
    async fn test_paginated_failure_contributes_nothing() {
        // Arrange
        let mock = MockOmdbApi::new(vec![
            Ok(page(Some(25), &[("A", 2000)])),
            Err(unavailable()),
            Ok(page(Some(25), &[("C", 1990)])),
        ]);

        // Act
        let report = search_all(&mock, &term()).await.unwrap();

        // Assert
        assert_eq!(mock.requested(), vec![0, 2, 3]);
        assert_eq!(years(&report), vec![1990, 2000]);
        assert_eq!(report.failed_pages().collect::<Vec<_>>(), vec![2]);
        assert!(matches!(
            report.pages[1].outcome,
            PageOutcome::Failed { ref reason } if reason.contains("503")
        ));
    }

    #[tokio::test]
    async fn test_paginated_markup_error_is_skipped() {
        // Arrange
        let mock = MockOmdbApi::new(vec![
            Ok(page(Some(15), &[("A", 2000)])),
            Err(OmdbError::Markup {
                position: 3,
                message: String::from("unexpected end"),
            }),
        ]);

        // Act
        let report = search_all(&mock, &term()).await.unwrap();

        // Assert
        assert_eq!(report.movies.len(), 1);
        assert_eq!(report.failed_pages().collect::<Vec<_>>(), vec![2]);
    }

    #[tokio::test]
    async fn test_paginated_malformed_year_aborts_search() {
        // Arrange
        let mock = MockOmdbApi::new(vec![
            Ok(page(Some(25), &[("A", 2000)])),
            Err(OmdbError::MalformedYear {
                title: Some(String::from("B")),
                value: None,
            }),
            Ok(page(Some(25), &[("C", 1990)])),
        ]);

        // Act
        let result = search_all(&mock, &term()).await;

        // Assert
        assert!(result.unwrap_err().is_malformed_data());
        assert_eq!(mock.requested(), vec![0, 2]);
    }

    #[tokio::test]
    async fn test_api_error_on_first_page_is_empty_success() {
        // Arrange
        let not_found = SearchPage {
            api_error: Some(String::from("Movie not found!")),
            ..SearchPage::default()
        };
        let mock = MockOmdbApi::new(vec![Ok(not_found)]);

        // Act
        let report = search_all(&mock, &term()).await.unwrap();

        // Assert
        assert!(report.movies.is_empty());
        assert_eq!(report.page_count, 1);
    }

    fn client_for(server: &wiremock::MockServer, read_timeout: Duration) -> OmdbClient {
        let config = FetchConfig {
            base_url: Some(format!("{}/", server.uri()).parse().unwrap()),
            read_timeout,
            ..FetchConfig::default()
        };
        OmdbClient::builder()
            .config(config)
            .user_agent("test/0.0.0")
            .build()
            .unwrap()
    }

    async fn mount_page(server: &wiremock::MockServer, page: Option<&str>, body: &str) {
        let mock = wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::query_param("s", "batman"));
        let mock = match page {
            Some(n) => mock.and(wiremock::matchers::query_param("page", n)),
            None => mock.and(wiremock::matchers::query_param_is_missing("page")),
        };
        mock.respond_with(wiremock::ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_search_all_via_http() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        mount_page(
            &mock_server,
            None,
            include_str!("../../../../fixtures/omdb/search_batman_page1.xml"),
        )
        .await;
        mount_page(
            &mock_server,
            Some("2"),
            include_str!("../../../../fixtures/omdb/search_batman_page2.xml"),
        )
        .await;
        mount_page(
            &mock_server,
            Some("3"),
            include_str!("../../../../fixtures/omdb/search_batman_page3.xml"),
        )
        .await;
        let client = client_for(&mock_server, Duration::from_secs(5));

        // Act
        let report = search_all(&client, &term()).await.unwrap();

        // Assert: 8 + 5 + 1 complete results, "Batman Begins" twice
        assert_eq!(report.total_results, 25);
        assert_eq!(report.page_count, 3);
        assert_eq!(report.movies.len(), 14);
        assert_eq!(report.movies[0].title(), "Batman");
        assert_eq!(report.movies[0].year(), 1966);
        assert!(report.movies.iter().all(|m| !m.poster().is_empty()));
        assert!(report.movies.windows(2).all(|w| w[0].year() <= w[1].year()));
        assert_eq!(
            report
                .movies
                .iter()
                .filter(|m| m.title() == "Batman Begins")
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn test_three_results_need_one_request() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        mount_page(
            &mock_server,
            None,
            include_str!("../../../../fixtures/omdb/search_three_results.xml"),
        )
        .await;
        let client = client_for(&mock_server, Duration::from_secs(5));

        // Act
        let report = search_all(&client, &term()).await.unwrap();

        // Assert (mock expect(1) verifies a single request)
        assert_eq!(report.page_count, 1);
        assert_eq!(report.movies.len(), 2);
        assert_eq!(report.movies[0].title(), "Zardoz Revisited");
        assert_eq!(report.movies[1].title(), "Zardoz");
    }

    #[tokio::test]
    async fn test_first_call_timeout_skips_pagination() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::query_param_is_missing("page"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string(include_str!(
                        "../../../../fixtures/omdb/search_batman_page1.xml"
                    ))
                    .set_delay(Duration::from_secs(2)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
        // Any further request would hit this catch-all.
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("<root/>"))
            .expect(0)
            .mount(&mock_server)
            .await;
        let client = client_for(&mock_server, Duration::from_millis(100));

        // Act
        let result = search_all(&client, &term()).await;

        // Assert
        assert!(result.unwrap_err().is_timeout());
    }
}
