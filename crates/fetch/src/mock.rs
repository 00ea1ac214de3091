//! Scripted fetcher for testing.

use crate::error::{ErrorKind, Result};
use crate::{Fetcher, Url};
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Fetcher that replays queued pages in order, recording every requested
/// URL. Once the queue is drained every fetch fails with
/// [`ErrorKind::EmptyPage`].
///
/// # Examples
///
/// ```
/// use carwatch_fetch::{Fetcher, MockFetcher, Url};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let fetcher = MockFetcher::with_pages(["<html>first</html>"]);
/// let url = Url::parse("https://example.com/").unwrap();
/// assert_eq!(fetcher.fetch(&url).await.unwrap(), "<html>first</html>");
/// assert!(fetcher.fetch(&url).await.is_err());
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockFetcher {
    pages: Mutex<VecDeque<std::result::Result<String, ErrorKind>>>,
    requests: Mutex<Vec<Url>>,
}

impl MockFetcher {
    pub fn with_pages(pages: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            pages: Mutex::new(pages.into_iter().map(|page| Ok(page.into())).collect()),
            requests: Mutex::default(),
        }
    }

    pub async fn push_page(&self, page: impl Into<String>) {
        self.pages.lock().await.push_back(Ok(page.into()));
    }

    /// Queue a failure in place of the next page.
    pub async fn push_failure(&self, kind: ErrorKind) {
        self.pages.lock().await.push_back(Err(kind));
    }

    /// URLs requested so far, oldest first.
    pub async fn requests(&self) -> Vec<Url> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        self.requests.lock().await.push(url.clone());
        match self.pages.lock().await.pop_front() {
            Some(Ok(page)) => Ok(page),
            Some(Err(kind)) => exn::bail!(kind),
            None => exn::bail!(ErrorKind::EmptyPage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_pages_then_failures() {
        let fetcher = MockFetcher::with_pages(["one"]);
        fetcher.push_failure(ErrorKind::ChromeTimeout).await;
        fetcher.push_page("three").await;
        let url = Url::parse("https://example.com/").unwrap();

        assert_eq!(fetcher.fetch(&url).await.unwrap(), "one");
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::ChromeTimeout));
        assert_eq!(fetcher.fetch(&url).await.unwrap(), "three");
        assert!(fetcher.fetch(&url).await.is_err());
        assert_eq!(fetcher.requests().await.len(), 4);
    }
}
