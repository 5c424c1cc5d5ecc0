// ABOUTME: Configuration options for the batch runner and the fluent RunnerBuilder.
// ABOUTME: RunnerBuilder wires the fetcher, rank simulator and diagnostic sink into a BatchRunner.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::batch::BatchRunner;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::ScrapeError;
use crate::rank::{RandomRank, RankSimulator};
use crate::resource::{Fetcher, HttpFetcher};

/// Default number of URLs processed at the same time.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Transport and scheduling options for a batch run.
#[derive(Debug, Clone)]
pub struct Options {
    pub timeout: Duration,
    pub user_agent: String,
    pub allow_private_networks: bool,
    pub concurrency: usize,
    pub http_client: Option<reqwest::Client>,
    pub headers: HashMap<String, String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: "sitescan/0.1".to_string(),
            allow_private_networks: false,
            concurrency: DEFAULT_CONCURRENCY,
            http_client: None,
            headers: HashMap::new(),
        }
    }
}

/// Builder for constructing a [`BatchRunner`].
#[derive(Clone, Default)]
pub struct RunnerBuilder {
    opts: Options,
    fetcher: Option<Arc<dyn Fetcher>>,
    rank: Option<Arc<dyn RankSimulator>>,
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl RunnerBuilder {
    /// Create a new RunnerBuilder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout used by the built-in HTTP fetcher.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Allow or disallow requests to private networks.
    pub fn allow_private_networks(mut self, allow: bool) -> Self {
        self.opts.allow_private_networks = allow;
        self
    }

    /// Set how many URLs may be in flight at once. Values below 1 are treated as 1.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.opts.concurrency = concurrency;
        self
    }

    /// Use a custom HTTP client for the built-in fetcher.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Replace the HTTP fetcher entirely. Transport options are then ignored.
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Set the simulator that supplies keyword positions.
    pub fn rank_simulator(mut self, rank: Arc<dyn RankSimulator>) -> Self {
        self.rank = Some(rank);
        self
    }

    /// Set where per-URL failures and skipped nodes are reported.
    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Options as currently configured.
    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Build the runner. Fails only if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<BatchRunner, ScrapeError> {
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new(&self.opts)?),
        };
        Ok(BatchRunner::new(
            fetcher,
            self.rank.unwrap_or_else(|| Arc::new(RandomRank)),
            self.sink.unwrap_or_else(|| Arc::new(TracingSink)),
            self.opts.concurrency,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = Options::default();
        assert_eq!(opts.timeout, Duration::from_secs(30));
        assert_eq!(opts.user_agent, "sitescan/0.1");
        assert!(!opts.allow_private_networks);
        assert_eq!(opts.concurrency, 4);
        assert!(opts.headers.is_empty());
    }

    #[test]
    fn builder_sets_options() {
        let builder = RunnerBuilder::new()
            .timeout(Duration::from_secs(5))
            .user_agent("sitescan-test/2")
            .allow_private_networks(true)
            .concurrency(8)
            .header("accept-language", "en");
        let opts = builder.options();
        assert_eq!(opts.timeout, Duration::from_secs(5));
        assert_eq!(opts.user_agent, "sitescan-test/2");
        assert!(opts.allow_private_networks);
        assert_eq!(opts.concurrency, 8);
        assert_eq!(opts.headers.get("accept-language").map(String::as_str), Some("en"));
    }

    #[test]
    fn zero_concurrency_is_clamped() {
        let runner = RunnerBuilder::new().concurrency(0).build().unwrap();
        assert_eq!(runner.concurrency(), 1);
    }
}
