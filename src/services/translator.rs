use crate::error::{DubError, Result};
use crate::language::Language;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Machine translation with automatic source-language detection.
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target: Language) -> Result<String>;

    fn name(&self) -> &str;
}

#[async_trait::async_trait]
impl<T: Translator + ?Sized> Translator for Arc<T> {
    async fn translate(&self, text: &str, target: Language) -> Result<String> {
        (**self).translate(text, target).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Mock translator for testing.
///
/// By default tags the input with the target code: `"hello"` becomes
/// `"[hi] hello"`.
#[derive(Debug, Clone, Default)]
pub struct MockTranslator {
    response: Option<String>,
    should_fail: bool,
    calls: Arc<AtomicUsize>,
}

impl MockTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer with `response`
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = Some(response.to_string());
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str, target: Language) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(DubError::Translation {
                message: "mock translation failure".to_string(),
            });
        }
        Ok(match &self.response {
            Some(response) => response.clone(),
            None => format!("[{}] {}", target.code(), text),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
