use crate::error::{ErrorKind, Result};
use crate::{Fetcher, Url};
use async_trait::async_trait;
use carwatch_config::FetchConfig;
use exn::ResultExt;
use reqwest::{Client, StatusCode};
use tracing::instrument;

/// Plain GET without script execution. Only useful when the listing markup
/// is present in the initial response.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}
impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(config.timeout());
        if let Some(user_agent) = config.user_agent.as_deref().filter(|ua| !ua.is_empty()) {
            builder = builder.user_agent(user_agent);
        }
        Ok(Self {
            client: builder.build().or_raise(|| ErrorKind::Network)?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &Url) -> Result<String> {
        let response = self.client.get(url.clone()).send().await.or_raise(|| ErrorKind::Network)?;
        let status = response.status();
        if status != StatusCode::OK {
            exn::bail!(ErrorKind::Status(status.as_u16()));
        }
        let html = response.text().await.or_raise(|| ErrorKind::Network)?;
        if html.trim().is_empty() {
            exn::bail!(ErrorKind::EmptyPage);
        }
        tracing::debug!(bytes = html.len(), "Page downloaded");
        Ok(html)
    }
}
