//! Page fetching for the listing search.
//!
//! [`from_config`] picks the configured [`Fetcher`]: headless Chrome for the
//! script-rendered search page, or a plain HTTP GET.

mod chrome;
pub mod error;
mod http;
#[cfg(feature = "mock")]
mod mock;

pub use crate::chrome::ChromeFetcher;
pub use crate::http::HttpFetcher;
#[cfg(feature = "mock")]
pub use crate::mock::MockFetcher;
pub use reqwest::Url;

use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use carwatch_config::{Backend, FetchConfig, SearchConfig};
use exn::ResultExt;
use std::sync::Arc;

pub type FetcherHandle = Arc<dyn Fetcher>;

/// Something that turns a URL into page markup.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Short backend name, for logging.
    fn name(&self) -> &str;

    /// Fetch `url` and return the markup as the page presents it after
    /// loading. Empty pages are an error.
    async fn fetch(&self, url: &Url) -> Result<String>;
}

/// Build the fetcher selected by `config.backend`.
pub fn from_config(config: &FetchConfig) -> Result<FetcherHandle> {
    let fetcher: FetcherHandle = match config.backend {
        Backend::Chrome => Arc::new(ChromeFetcher::new(config)?),
        Backend::Http => Arc::new(HttpFetcher::new(config)?),
    };
    tracing::debug!(backend = fetcher.name(), "Fetcher ready");
    Ok(fetcher)
}

/// The search result URL for `search`, with every configured filter applied
/// server-side.
pub fn search_url(search: &SearchConfig) -> Result<Url> {
    let mut params: Vec<(&str, String)> = Vec::new();
    if search.certified_only {
        params.push(("Tval", "1".to_string()));
        params.push(("chk-detail-tvalue-sp-check", "1".to_string()));
    }
    params.push(("Cn", search.car_code.clone()));
    if let Some(year) = search.year_min {
        params.push(("Ymn", year.to_string()));
    }
    if let Some(drive) = &search.drive_type {
        params.push(("Drv", drive.clone()));
    }
    if let Some(price) = search.price_max {
        params.push(("Pmx", price.to_string()));
    }
    Url::parse_with_params(&search.base_url, &params).or_raise(|| ErrorKind::InvalidUrl(search.base_url.clone()))
}
