// ABOUTME: Batch runner that fetches every configured URL and runs the news or analysis pipeline on it.
// ABOUTME: One isolate-and-collect routine gives both pipelines per-URL failure isolation and input ordering.

//! Batch processing.
//!
//! Each configured URL goes through `fetch -> parse -> extract`. A failure at
//! any step ends processing for that URL only: the error is recorded to the
//! diagnostic sink and replaced by the pipeline's placeholder output. A batch
//! call therefore never fails and always returns output for every URL, in
//! input order, regardless of the order in which URLs complete.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use futures::FutureExt;
use tracing::{debug, info};

use crate::config::SelectorConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::document::ParsedDocument;
use crate::error::ScrapeError;
use crate::extractors::news::extract_news;
use crate::extractors::seo::analyze_page;
use crate::options::RunnerBuilder;
use crate::rank::RankSimulator;
use crate::resource::Fetcher;
use crate::result::{NewsItem, PageSeoRecord, ERROR_FETCHING_TITLE, UNEXPECTED_ERROR_TITLE};

/// Runs the news and analysis pipelines over a list of URLs.
#[derive(Clone)]
pub struct BatchRunner {
    fetcher: Arc<dyn Fetcher>,
    rank: Arc<dyn RankSimulator>,
    sink: Arc<dyn DiagnosticSink>,
    concurrency: usize,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

impl BatchRunner {
    /// Create a new RunnerBuilder for configuring the runner.
    pub fn builder() -> RunnerBuilder {
        RunnerBuilder::new()
    }

    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        rank: Arc<dyn RankSimulator>,
        sink: Arc<dyn DiagnosticSink>,
        concurrency: usize,
    ) -> Self {
        Self {
            fetcher,
            rank,
            sink,
            concurrency: concurrency.max(1),
        }
    }

    /// How many URLs may be in flight at once.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetches each news site and extracts its posts.
    ///
    /// Items are grouped by site in input order, and by document order
    /// within a site. A site that fails at any step contributes exactly one
    /// [`NewsItem::placeholder`].
    pub async fn run_news<I>(&self, sites: I) -> Vec<NewsItem>
    where
        I: IntoIterator<Item = (String, SelectorConfig)>,
    {
        let per_site = self
            .isolate_and_collect(
                sites,
                |url, config| async move {
                    let body = self.fetcher.fetch(&url).await?;
                    self.extract_news_from(&url, &body, &config)
                },
                |_, _| vec![NewsItem::placeholder()],
            )
            .await;

        per_site.into_iter().flatten().collect()
    }

    /// Fetches each page and builds its analysis record.
    ///
    /// Returns exactly one record per input, in input order. A failed fetch
    /// yields a record titled "Error fetching data", any other failure one
    /// titled "Unexpected error"; both with empty arrays.
    pub async fn run_analysis<I>(&self, pages: I) -> Vec<PageSeoRecord>
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        self.isolate_and_collect(
            pages,
            |url, keywords| async move {
                let body = self.fetcher.fetch(&url).await?;
                Ok::<_, ScrapeError>(self.analyze_from(&url, &body, &keywords))
            },
            |url, err| {
                let title = if err.is_fetch_failure() {
                    ERROR_FETCHING_TITLE
                } else {
                    UNEXPECTED_ERROR_TITLE
                };
                PageSeoRecord::failed(url, title)
            },
        )
        .await
    }

    fn extract_news_from(
        &self,
        url: &str,
        body: &str,
        config: &SelectorConfig,
    ) -> Result<Vec<NewsItem>, ScrapeError> {
        let doc = ParsedDocument::parse(body);
        extract_news(url, &doc, config, self.sink.as_ref())
    }

    fn analyze_from(&self, url: &str, body: &str, keywords: &[String]) -> PageSeoRecord {
        let doc = ParsedDocument::parse(body);
        analyze_page(url, &doc, keywords, self.rank.as_ref(), self.sink.as_ref())
    }

    /// Runs `process` for every input with bounded concurrency.
    ///
    /// An `Err` or a panic from `process` is recorded to the sink and turned
    /// into output by `on_failure`. Outputs land in a slot per input
    /// position, each written exactly once, so the returned vector follows
    /// input order whatever the completion order.
    async fn isolate_and_collect<C, T, P, Fut, F>(
        &self,
        inputs: impl IntoIterator<Item = (String, C)>,
        process: P,
        on_failure: F,
    ) -> Vec<T>
    where
        P: Fn(String, C) -> Fut,
        Fut: Future<Output = Result<T, ScrapeError>>,
        F: Fn(&str, &ScrapeError) -> T,
    {
        let inputs: Vec<(String, C)> = inputs.into_iter().collect();
        let total = inputs.len();
        let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();
        info!(urls = total, concurrency = self.concurrency, "starting batch");

        let process = &process;
        let mut outcomes = stream::iter(inputs.into_iter().enumerate().map(
            |(index, (url, config))| async move {
                let task_url = url.clone();
                let result = AssertUnwindSafe(async move { process(task_url, config).await })
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| {
                        Err(ScrapeError::unexpected(
                            &url,
                            "Process",
                            Some(anyhow::anyhow!("panicked: {}", panic_message(payload.as_ref()))),
                        ))
                    });
                (index, url, result)
            },
        ))
        .buffer_unordered(self.concurrency);

        let mut failed = 0usize;
        while let Some((index, url, result)) = outcomes.next().await {
            let output = match result {
                Ok(output) => {
                    debug!(url = %url, "url processed");
                    output
                }
                Err(err) => {
                    failed += 1;
                    self.sink.record(Diagnostic::from(&err));
                    on_failure(&url, &err)
                }
            };
            debug_assert!(slots[index].is_none(), "slot {} written twice", index);
            slots[index] = Some(output);
        }

        info!(urls = total, failed, "batch finished");
        slots.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{MemorySink, UrlStage};
    use crate::error::ErrorCode;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::time::Duration;

    const TWO_POSTS: &str = r#"
        <html><head><title>A blog</title></head><body>
            <div class="blog-post"><h2><a href="/posts/1">One</a></h2></div>
            <div class="blog-post"><h2><a href="posts/2">Two</a></h2></div>
        </body></html>
    "#;

    /// Serves canned bodies; unknown URLs fail like an unreachable host.
    #[derive(Default)]
    struct StubFetcher {
        pages: HashMap<String, String>,
        delays: HashMap<String, u64>,
        panics: Vec<String>,
    }

    impl StubFetcher {
        fn page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }

        fn delayed(mut self, url: &str, millis: u64) -> Self {
            self.delays.insert(url.to_string(), millis);
            self
        }

        fn panicking(mut self, url: &str) -> Self {
            self.panics.push(url.to_string());
            self
        }
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
            if let Some(ms) = self.delays.get(url) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            if self.panics.iter().any(|u| u == url) {
                panic!("stub exploded for {}", url);
            }
            self.pages.get(url).cloned().ok_or_else(|| {
                ScrapeError::fetch(url, "Fetch", Some(anyhow::anyhow!("connection refused")))
            })
        }
    }

    fn runner(fetcher: StubFetcher, sink: Arc<MemorySink>, concurrency: usize) -> BatchRunner {
        BatchRunner::builder()
            .fetcher(Arc::new(fetcher))
            .rank_simulator(Arc::new(|_: &str| 5u32))
            .diagnostics(sink)
            .concurrency(concurrency)
            .build()
            .expect("runner")
    }

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[tokio::test]
    async fn news_end_to_end_two_posts() {
        let sink = Arc::new(MemorySink::new());
        let runner = runner(StubFetcher::default().page("https://a.test/", TWO_POSTS), sink.clone(), 4);

        let items = runner
            .run_news(vec![("https://a.test/".to_string(), SelectorConfig::default())])
            .await;

        assert_eq!(
            items,
            vec![
                NewsItem::new("One", "https://a.test/posts/1"),
                NewsItem::new("Two", "https://a.test/posts/2"),
            ]
        );
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn news_fetch_failure_yields_one_placeholder_and_continues() {
        let sink = Arc::new(MemorySink::new());
        let fetcher = StubFetcher::default().page("https://b.test/", TWO_POSTS);
        let runner = runner(fetcher, sink.clone(), 2);

        let items = runner
            .run_news(vec![
                ("https://down.test/".to_string(), SelectorConfig::default()),
                ("https://b.test/".to_string(), SelectorConfig::default()),
            ])
            .await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0], NewsItem::placeholder());
        assert_eq!(items[1].url, "https://b.test/posts/1");

        let diags = sink.for_url("https://down.test/");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].stage, UrlStage::Fetch);
    }

    #[tokio::test]
    async fn news_invalid_post_selector_yields_placeholder() {
        let sink = Arc::new(MemorySink::new());
        let runner = runner(StubFetcher::default().page("https://a.test/", TWO_POSTS), sink.clone(), 1);

        let items = runner
            .run_news(vec![(
                "https://a.test/".to_string(),
                SelectorConfig::new().post_selector("!!"),
            )])
            .await;

        assert_eq!(items, vec![NewsItem::placeholder()]);
        assert_eq!(sink.entries()[0].code, ErrorCode::Parse);
    }

    #[tokio::test]
    async fn news_every_url_contributes_output() {
        let sink = Arc::new(MemorySink::new());
        let fetcher = StubFetcher::default()
            .page("https://a.test/", TWO_POSTS)
            .page("https://empty.test/", "<html><body></body></html>");
        let runner = runner(fetcher, sink, 3);

        let items = runner
            .run_news(vec![
                ("https://empty.test/".to_string(), SelectorConfig::default()),
                ("https://a.test/".to_string(), SelectorConfig::default()),
                ("https://down.test/".to_string(), SelectorConfig::default()),
            ])
            .await;

        assert_eq!(
            items,
            vec![
                NewsItem::placeholder(),
                NewsItem::new("One", "https://a.test/posts/1"),
                NewsItem::new("Two", "https://a.test/posts/2"),
                NewsItem::placeholder(),
            ]
        );
    }

    #[tokio::test]
    async fn analysis_one_record_per_url_in_input_order() {
        let sink = Arc::new(MemorySink::new());
        let fetcher = StubFetcher::default()
            .page("https://a.test/", TWO_POSTS)
            .page("https://c.test/", "<title>C</title><p>one one</p>")
            .delayed("https://a.test/", 50);
        let runner = runner(fetcher, sink.clone(), 3);

        let records = runner
            .run_analysis(vec![
                ("https://a.test/".to_string(), kw(&["one", "ONE"])),
                ("https://down.test/".to_string(), kw(&["x"])),
                ("https://c.test/".to_string(), kw(&[])),
            ])
            .await;

        let urls: Vec<_> = records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.test/", "https://down.test/", "https://c.test/"]);

        assert_eq!(records[0].title, "A blog");
        assert_eq!(records[0].keyword_analysis[0].usage_count, 1);
        assert_eq!(records[0].keyword_analysis[1].usage_count, 1);
        assert_eq!(records[0].search_engine_positions[0].position, 5);

        assert_eq!(records[1], PageSeoRecord::failed("https://down.test/", "Error fetching data"));

        assert_eq!(records[2].title, "C");
        assert!(records[2].keyword_analysis.is_empty());
        assert!(records[2].search_engine_positions.is_empty());

        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn analysis_panic_becomes_unexpected_error() {
        let sink = Arc::new(MemorySink::new());
        let fetcher = StubFetcher::default()
            .page("https://ok.test/", "<title>Fine</title>")
            .panicking("https://bad.test/");
        let runner = runner(fetcher, sink.clone(), 2);

        let records = runner
            .run_analysis(vec![
                ("https://bad.test/".to_string(), kw(&["a"])),
                ("https://ok.test/".to_string(), kw(&["fine"])),
            ])
            .await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0], PageSeoRecord::failed("https://bad.test/", "Unexpected error"));
        assert_eq!(records[1].title, "Fine");
        assert_eq!(records[1].keyword_analysis[0].usage_count, 1);

        let diags = sink.for_url("https://bad.test/");
        assert_eq!(diags[0].code, ErrorCode::Unexpected);
        assert!(diags[0].message.contains("stub exploded"));
    }

    #[tokio::test]
    async fn ordering_holds_when_earlier_urls_finish_last() {
        let sink = Arc::new(MemorySink::new());
        let mut fetcher = StubFetcher::default();
        let mut inputs = Vec::new();
        for i in 0..8u64 {
            let url = format!("https://site{}.test/", i);
            let body = format!("<title>Site {}</title>", i);
            fetcher = fetcher.page(&url, &body).delayed(&url, (8 - i) * 10);
            inputs.push((url, Vec::new()));
        }
        let runner = runner(fetcher, sink, 8);

        let records = runner.run_analysis(inputs).await;
        let titles: Vec<_> = records.iter().map(|r| r.title.clone()).collect();
        let expected: Vec<_> = (0..8).map(|i| format!("Site {}", i)).collect();
        assert_eq!(titles, expected);
    }

    #[tokio::test]
    async fn empty_input_gives_empty_output() {
        let sink = Arc::new(MemorySink::new());
        let runner = runner(StubFetcher::default(), sink, 4);
        assert!(runner.run_news(Vec::new()).await.is_empty());
        assert!(runner.run_analysis(Vec::new()).await.is_empty());
    }

    #[tokio::test]
    async fn repeated_runs_are_identical() {
        let sink = Arc::new(MemorySink::new());
        let runner = runner(StubFetcher::default().page("https://a.test/", TWO_POSTS), sink, 2);
        let input = vec![("https://a.test/".to_string(), SelectorConfig::default())];
        let first = runner.run_news(input.clone()).await;
        let second = runner.run_news(input).await;
        assert_eq!(first, second);
    }
}
