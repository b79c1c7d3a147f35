/// Page resolution over the direct children of the configured root pages.
///
/// All-digit queries match titles whose leading digit run is exactly the query and score
/// 100. Any other query is lower-cased and scored against each lower-cased title with the
/// composite similarity; titles under the threshold are dropped. The highest score wins,
/// the first-seen candidate on ties (root order, then listing order).
use regex::Regex;
use tracing::{debug, info, warn};

use crate::confluence::ContentSource;
use crate::model::{ChildPage, Outcome, PageCandidate, PageDetail, SearchQuery, ToolError};
use crate::similarity::composite_score;

pub const DEFAULT_CHILD_LIMIT: u32 = 250;
pub const MATCH_THRESHOLD: f64 = 30.0;
const EXACT_PREFIX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverOptions {
    /// Children listed per root page.
    pub child_limit: u32,
    /// Minimum composite score for a free-text candidate.
    pub threshold: f64,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            child_limit: DEFAULT_CHILD_LIMIT,
            threshold: MATCH_THRESHOLD,
        }
    }
}

/// Scores titles against one query.
pub struct TitleMatcher {
    query: SearchQuery,
    leading_digits: Regex,
    threshold: f64,
}

impl TitleMatcher {
    pub fn new(query: &str, threshold: f64) -> Self {
        let query = match SearchQuery::parse(query) {
            SearchQuery::FreeText(text) => SearchQuery::FreeText(text.to_lowercase()),
            numeric => numeric,
        };
        Self {
            query,
            leading_digits: Regex::new(r"^([0-9]+)").expect("valid regex"),
            threshold,
        }
    }

    /// Score for `title`, or `None` if it does not qualify as a candidate.
    pub fn score(&self, title: &str) -> Option<f64> {
        match &self.query {
            SearchQuery::Numeric(number) => {
                let prefix = self.leading_digits.captures(title)?.get(1)?.as_str();
                (prefix == number.as_str()).then_some(EXACT_PREFIX_SCORE)
            }
            SearchQuery::FreeText(text) => {
                let score = composite_score(text, &title.to_lowercase());
                (score >= self.threshold).then_some(score)
            }
        }
    }

    pub fn candidates(&self, children: Vec<ChildPage>) -> impl Iterator<Item = PageCandidate> + '_ {
        children.into_iter().filter_map(move |child| {
            let score = self.score(&child.title)?;
            Some(PageCandidate {
                id: child.id,
                title: child.title,
                score,
            })
        })
    }
}

/// Highest-scoring candidate; the earliest one wins ties.
pub fn select_best(candidates: &[PageCandidate]) -> Option<&PageCandidate> {
    candidates.iter().fold(None, |best, candidate| match best {
        Some(current) if candidate.score <= current.score => Some(current),
        _ => Some(candidate),
    })
}

/// Find the page under `parent_ids` that best matches `query` and fetch its body.
///
/// `source` is `None` when the content service is not configured. Any listing failure
/// aborts the whole search; a 404 on the winner's detail is reported as `NotFound`.
pub async fn find_best_page<S: ContentSource>(
    source: Option<&S>,
    parent_ids: &[String],
    query: Option<&str>,
    options: ResolverOptions,
) -> Outcome<PageDetail> {
    let Some(source) = source else {
        return ToolError::config_missing(
            "Confluence environment variables are not set correctly \
             (CONFLUENCE_URL, CONFLUENCE_USER, CONFLUENCE_TOKEN)",
        )
        .into();
    };
    if parent_ids.is_empty() {
        return ToolError::config_missing("PAGES_IDS environment variable is empty").into();
    }
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return ToolError::invalid_input("a search query is required").into();
    };

    let matcher = TitleMatcher::new(query, options.threshold);
    let mut candidates = Vec::new();
    for parent_id in parent_ids {
        let children = match source
            .list_direct_children(parent_id, options.child_limit)
            .await
        {
            Ok(children) => children,
            Err(e) => {
                warn!(parent_id = %parent_id, error = %e, "child listing failed, aborting search");
                return ToolError::fetch_failed(format!("Failed to fetch children: {e}")).into();
            }
        };
        let before = candidates.len();
        candidates.extend(matcher.candidates(children));
        debug!(parent_id = %parent_id, matched = candidates.len() - before, "scored children");
    }

    let Some(best) = select_best(&candidates) else {
        info!(query, "no page matched");
        return Outcome::NotFound;
    };
    info!(
        query,
        page_id = %best.id,
        title = %best.title,
        score = best.score,
        candidates = candidates.len(),
        "best page selected"
    );

    match source.get_page_detail(&best.id).await {
        Ok(Some(detail)) => Outcome::Found(PageDetail {
            title: best.title.clone(),
            body_content: detail.export_view().map(str::to_string),
        }),
        Ok(None) => {
            info!(page_id = %best.id, "page disappeared before detail fetch");
            Outcome::NotFound
        }
        Err(e) => {
            warn!(page_id = %best.id, error = %e, "page detail fetch failed");
            ToolError::fetch_failed(format!("Failed to fetch detail: {e}")).into()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::confluence::{FetchError, PageDetailPayload};
    use crate::model::ErrorKind;
    use crate::normalize::normalize_query;

    #[derive(Default)]
    struct FakeSource {
        children: HashMap<String, Vec<ChildPage>>,
        failing_parents: Vec<String>,
        details: HashMap<String, PageDetailPayload>,
        failing_details: Vec<String>,
        listed: Mutex<Vec<String>>,
        fetched: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn with_children(mut self, parent: &str, titles: &[(&str, &str)]) -> Self {
            let pages = titles
                .iter()
                .map(|(id, title)| ChildPage {
                    id: id.to_string(),
                    title: title.to_string(),
                })
                .collect();
            self.children.insert(parent.to_string(), pages);
            self
        }

        fn with_detail(mut self, id: &str, body: &str) -> Self {
            self.details
                .insert(id.to_string(), PageDetailPayload::from_export_view(body));
            self
        }

        fn listed(&self) -> Vec<String> {
            self.listed.lock().unwrap().clone()
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    impl ContentSource for FakeSource {
        async fn list_direct_children(
            &self,
            parent_id: &str,
            limit: u32,
        ) -> Result<Vec<ChildPage>, FetchError> {
            assert_eq!(limit, DEFAULT_CHILD_LIMIT);
            self.listed.lock().unwrap().push(parent_id.to_string());
            if self.failing_parents.iter().any(|p| p == parent_id) {
                return Err(FetchError::InvalidId(parent_id.to_string()));
            }
            Ok(self.children.get(parent_id).cloned().unwrap_or_default())
        }

        async fn get_page_detail(
            &self,
            page_id: &str,
        ) -> Result<Option<PageDetailPayload>, FetchError> {
            self.fetched.lock().unwrap().push(page_id.to_string());
            if self.failing_details.iter().any(|p| p == page_id) {
                return Err(FetchError::InvalidId(page_id.to_string()));
            }
            Ok(self.details.get(page_id).cloned())
        }
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    async fn find(source: &FakeSource, parents: &[&str], query: &str) -> Outcome<PageDetail> {
        find_best_page(Some(source), &ids(parents), Some(query), ResolverOptions::default()).await
    }

    fn expect_kind(outcome: Outcome<PageDetail>, kind: ErrorKind) -> String {
        match outcome {
            Outcome::Failure(e) => {
                assert_eq!(e.kind, kind);
                e.message
            }
            other => panic!("expected {kind:?} failure, got {other:?}"),
        }
    }

    #[test]
    fn numeric_query_matches_leading_digits_exactly() {
        let matcher = TitleMatcher::new("102", MATCH_THRESHOLD);
        assert_eq!(matcher.score("102 Setup"), Some(100.0));
        assert_eq!(matcher.score("102"), Some(100.0));
        assert_eq!(matcher.score("1020 Later"), None);
        assert_eq!(matcher.score("10 Setup"), None);
        assert_eq!(matcher.score("Setup 102"), None);
        assert_eq!(matcher.score("Bingo Night"), None);
    }

    #[test]
    fn free_text_query_never_gets_the_numeric_bonus() {
        let matcher = TitleMatcher::new("102a", MATCH_THRESHOLD);
        let score = matcher.score("102 Setup");
        assert!(score.map_or(true, |s| s < 100.0), "got {score:?}");
    }

    #[test]
    fn free_text_threshold_filters_candidates() {
        let matcher = TitleMatcher::new("piggy bam", MATCH_THRESHOLD);
        let children = vec![
            ChildPage {
                id: "1".to_string(),
                title: "Piggy Bam Ahoy".to_string(),
            },
            ChildPage {
                id: "2".to_string(),
                title: "Random Page".to_string(),
            },
        ];
        let candidates: Vec<PageCandidate> = matcher.candidates(children).collect();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Piggy Bam Ahoy");
        assert!(candidates[0].score >= MATCH_THRESHOLD);
    }

    #[test]
    fn free_text_query_is_case_insensitive() {
        let upper = TitleMatcher::new("PIGGY BAM", MATCH_THRESHOLD);
        let lower = TitleMatcher::new("piggy bam", MATCH_THRESHOLD);
        assert_eq!(upper.score("Piggy Bam Ahoy"), lower.score("Piggy Bam Ahoy"));
    }

    #[test]
    fn select_best_prefers_highest_then_first_seen() {
        let candidate = |id: &str, score: f64| PageCandidate {
            id: id.to_string(),
            title: id.to_string(),
            score,
        };
        let pool = vec![
            candidate("a", 40.0),
            candidate("b", 90.0),
            candidate("c", 90.0),
            candidate("d", 50.0),
        ];
        assert_eq!(select_best(&pool).unwrap().id, "b");
        assert!(select_best(&[]).is_none());
    }

    #[tokio::test]
    async fn numeric_query_end_to_end() {
        let source = FakeSource::default()
            .with_children(
                "root",
                &[("1", "101 Intro"), ("2", "102 Setup"), ("3", "Bingo Night")],
            )
            .with_detail("2", "<p>setup</p>");

        let outcome = find(&source, &["root"], "102").await;
        assert_eq!(
            outcome,
            Outcome::Found(PageDetail {
                title: "102 Setup".to_string(),
                body_content: Some("<p>setup</p>".to_string()),
            })
        );
        assert_eq!(source.fetched(), vec!["2"]);
    }

    #[tokio::test]
    async fn fuzzy_query_end_to_end() {
        let source = FakeSource::default()
            .with_children("root", &[("1", "Piggy Bam Ahoy"), ("2", "Random Page")])
            .with_detail("1", "<h1>Ahoy</h1>");

        match find(&source, &["root"], "piggy bam").await {
            Outcome::Found(page) => assert_eq!(page.title, "Piggy Bam Ahoy"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn hangul_query_matches_like_its_romanization() {
        let source = FakeSource::default()
            .with_children("root", &[("1", "Pigi Baem Ahoi"), ("2", "Random Page")])
            .with_detail("1", "<p>korean</p>");

        let from_hangul = find(&source, &["root"], &normalize_query("피기 뱀 아호이")).await;
        let from_latin = find(&source, &["root"], "pigi baem ahoi").await;
        assert_eq!(from_hangul, from_latin);
        match from_hangul {
            Outcome::Found(page) => assert_eq!(page.title, "Pigi Baem Ahoi"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn numeric_ties_resolve_to_the_first_root() {
        let source = FakeSource::default()
            .with_children("first", &[("1", "2024 roadmap")])
            .with_children("second", &[("2", "2024 Retro")])
            .with_detail("1", "roadmap");

        match find(&source, &["first", "second"], "2024").await {
            Outcome::Found(page) => assert_eq!(page.title, "2024 roadmap"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(source.listed(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn ties_go_to_the_first_root() {
        let source = FakeSource::default()
            .with_children("first", &[("1", "Bingo Night")])
            .with_children("second", &[("2", "Night Bingo")])
            .with_detail("1", "first")
            .with_detail("2", "second");

        for _ in 0..3 {
            match find(&source, &["first", "second"], "night").await {
                Outcome::Found(page) => assert_eq!(page.title, "Bingo Night"),
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn no_candidates_is_not_found() {
        let source = FakeSource::default().with_children("root", &[("1", "Random Page")]);
        assert_eq!(find(&source, &["root"], "zzzz qqqq").await, Outcome::NotFound);
        assert_eq!(find(&source, &["root"], "7").await, Outcome::NotFound);
        assert!(source.fetched().is_empty());
    }

    #[tokio::test]
    async fn listing_failure_aborts_without_partial_results() {
        let mut source = FakeSource::default()
            .with_children("first", &[("1", "102 Setup")])
            .with_children("third", &[("3", "102 Setup Again")])
            .with_detail("1", "setup");
        source.failing_parents.push("second".to_string());

        let message = expect_kind(
            find(&source, &["first", "second", "third"], "102").await,
            ErrorKind::RemoteFetchFailed,
        );
        assert!(message.starts_with("Failed to fetch children"));
        assert_eq!(source.listed(), vec!["first", "second"]);
        assert!(source.fetched().is_empty());
    }

    #[tokio::test]
    async fn detail_not_found_is_null_result() {
        let source = FakeSource::default().with_children("root", &[("1", "102 Setup")]);
        assert_eq!(find(&source, &["root"], "102").await, Outcome::NotFound);
        assert_eq!(source.fetched(), vec!["1"]);
    }

    #[tokio::test]
    async fn detail_failure_is_an_error() {
        let mut source = FakeSource::default().with_children("root", &[("1", "102 Setup")]);
        source.failing_details.push("1".to_string());
        let message = expect_kind(
            find(&source, &["root"], "102").await,
            ErrorKind::RemoteFetchFailed,
        );
        assert!(message.starts_with("Failed to fetch detail"));
    }

    #[tokio::test]
    async fn missing_body_is_reported_as_absent() {
        let mut source = FakeSource::default().with_children("root", &[("1", "102 Setup")]);
        source
            .details
            .insert("1".to_string(), PageDetailPayload::default());
        assert_eq!(
            find(&source, &["root"], "102").await,
            Outcome::Found(PageDetail {
                title: "102 Setup".to_string(),
                body_content: None,
            })
        );
    }

    #[tokio::test]
    async fn preconditions_are_checked_in_order() {
        let source = FakeSource::default();
        let options = ResolverOptions::default();

        let unconfigured =
            find_best_page::<FakeSource>(None, &[], None, options).await;
        let message = expect_kind(unconfigured, ErrorKind::ConfigurationMissing);
        assert!(message.contains("CONFLUENCE_URL"));

        let no_roots = find_best_page(Some(&source), &[], None, options).await;
        let message = expect_kind(no_roots, ErrorKind::ConfigurationMissing);
        assert!(message.contains("PAGES_IDS"));

        let roots = ids(&["root"]);
        let no_query = find_best_page(Some(&source), &roots, None, options).await;
        expect_kind(no_query, ErrorKind::InputInvalid);

        let empty_query = find_best_page(Some(&source), &roots, Some(""), options).await;
        expect_kind(empty_query, ErrorKind::InputInvalid);

        assert!(source.listed().is_empty());
    }
}
