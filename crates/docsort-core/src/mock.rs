//! Mock extraction service for testing.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backend::{ExtractError, TextExtractor};

/// A configurable mock response for [`MockExtractor`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Simulate successful extraction of this text.
    Text(String),
    /// Simulate an engine failure with this message.
    Error(String),
}

/// A hand-rolled mock implementing [`TextExtractor`] for tests.
///
/// Responses are keyed by file name, so the same name in two folders gets
/// the same text. Unknown names get the fallback response. Every call is
/// recorded with the language it was made with.
pub struct MockExtractor {
    responses: HashMap<OsString, MockResponse>,
    fallback: MockResponse,
    calls: Mutex<Vec<(PathBuf, String)>>,
    call_count: AtomicUsize,
}

impl MockExtractor {
    /// Create a mock that answers every file with `fallback`.
    pub fn new(fallback: MockResponse) -> Self {
        Self {
            responses: HashMap::new(),
            fallback,
            calls: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Answer files named `file_name` with `text`.
    pub fn with_text(mut self, file_name: &str, text: &str) -> Self {
        self.responses
            .insert(file_name.into(), MockResponse::Text(text.to_string()));
        self
    }

    /// Fail extraction for files named `file_name`.
    pub fn with_error(mut self, file_name: &str, message: &str) -> Self {
        self.responses
            .insert(file_name.into(), MockResponse::Error(message.to_string()));
        self
    }

    /// How many times `extract_text()` has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Paths and languages of every call, in call order.
    pub fn calls(&self) -> Vec<(PathBuf, String)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn response_for(&self, path: &Path) -> MockResponse {
        path.file_name()
            .and_then(|name| self.responses.get(name))
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new(MockResponse::Text(String::new()))
    }
}

impl TextExtractor for MockExtractor {
    fn extract_text(&self, path: &Path, language: &str) -> Result<String, ExtractError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((path.to_path_buf(), language.to_string()));
        }

        match self.response_for(path) {
            MockResponse::Text(text) => Ok(text),
            MockResponse::Error(message) => Err(ExtractError::ToolFailed {
                tool: "mock".to_string(),
                status: "exit status: 1".to_string(),
                stderr: message,
            }),
        }
    }
}
