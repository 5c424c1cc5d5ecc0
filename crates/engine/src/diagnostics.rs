// ABOUTME: Injected diagnostic side channel for per-URL failures and skipped nodes.
// ABOUTME: TracingSink forwards to tracing; MemorySink collects diagnostics for tests.

use std::fmt;
use std::sync::Mutex;

use serde::Serialize;

use crate::error::{ErrorCode, ScrapeError};

/// The step of per-URL processing a diagnostic was raised in.
///
/// Each URL moves `Fetch -> Parse -> Extract`; a failure in any step ends
/// processing for that URL only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlStage {
    Fetch,
    Parse,
    Extract,
}

impl fmt::Display for UrlStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UrlStage::Fetch => "fetch",
            UrlStage::Parse => "parse",
            UrlStage::Extract => "extract",
        };
        write!(f, "{}", s)
    }
}

impl From<ErrorCode> for UrlStage {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::InvalidUrl | ErrorCode::Fetch | ErrorCode::Timeout | ErrorCode::Ssrf => {
                UrlStage::Fetch
            }
            ErrorCode::Parse => UrlStage::Parse,
            ErrorCode::Extract | ErrorCode::Unexpected => UrlStage::Extract,
        }
    }
}

/// One diagnostic event. Not part of any pipeline's return value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub url: String,
    pub stage: UrlStage,
    pub code: ErrorCode,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        url: impl Into<String>,
        stage: UrlStage,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            stage,
            code,
            message: message.into(),
        }
    }
}

impl From<&ScrapeError> for Diagnostic {
    fn from(err: &ScrapeError) -> Self {
        Self::new(&err.url, UrlStage::from(err.code), err.code, err.to_string())
    }
}

/// Receives diagnostics raised while a batch runs.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, diagnostic: Diagnostic);
}

/// Default sink: emits each diagnostic as a `tracing` warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, diagnostic: Diagnostic) {
        tracing::warn!(
            url = %diagnostic.url,
            stage = %diagnostic.stage,
            code = %diagnostic.code,
            "{}",
            diagnostic.message
        );
    }
}

/// Sink that keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far, in arrival order.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Diagnostics recorded for one URL.
    pub fn for_url(&self, url: &str) -> Vec<Diagnostic> {
        self.entries()
            .into_iter()
            .filter(|d| d.url == url)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, diagnostic: Diagnostic) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(diagnostic);
    }
}
