//! Raw-content host backed store.
//!
//! Documents live at
//! `<raw_base_url>/<owner>/<repo>/<branch>/<results_dir>/<video_id>.json`.
//! No authentication is needed to read a public repository. A `404` means
//! the worker hasn't written the document yet.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, instrument};
use url::Url;

use super::{ResultStore, StoreError};
use crate::claims::ResultDocument;
use crate::config::StoreConfig;
use crate::http_client::StoreHttpClient;
use crate::video_id::VideoId;

/// Store client reading documents over HTTP.
#[derive(Debug, Clone)]
pub struct RawContentStore {
    client: StoreHttpClient,
    base: Url,
    results_dir: String,
}

impl RawContentStore {
    /// Build a store client. Fails if the configured base URL is unusable.
    pub fn new(client: StoreHttpClient, config: &StoreConfig) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(&config.raw_base_url)?;
        if base.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
        }
        base.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend([&config.owner, &config.repo, &config.branch]);

        Ok(Self {
            client,
            base,
            results_dir: config.results_dir.clone(),
        })
    }

    /// Deterministic address of the document for `video_id`.
    #[must_use]
    pub fn document_url(&self, video_id: &VideoId) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .extend(self.results_dir.split('/').filter(|s| !s.is_empty()))
                .push(&format!("{video_id}.json"));
        }
        url
    }
}

#[async_trait]
impl ResultStore for RawContentStore {
    fn name(&self) -> &'static str {
        "raw"
    }

    #[instrument(skip(self), fields(video_id = %video_id))]
    async fn check_for_result(
        &self,
        video_id: &VideoId,
    ) -> Result<Option<ResultDocument>, StoreError> {
        let url = self.document_url(video_id);
        let response = self.client.fetch(url.as_str()).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!("Document not written yet");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StoreError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        classify_body(&body).map(Some)
    }
}

fn classify_body(body: &str) -> Result<ResultDocument, StoreError> {
    Ok(ResultDocument::from_json(body)?)
}
