use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use tracing::debug;

use solman_core::{DataService, EntityKind, QueryExpression, RawRecord, RemoteError, SolutionId};

use crate::odata::{self, Page};

/// Web API root relative to the organization URL.
pub const API_PATH: &str = "api/data/v9.2/";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// [`DataService`] backed by the Dataverse Web API.
///
/// Token acquisition is the caller's job; the client only sends it as a bearer token.
#[derive(Clone, Debug)]
pub struct DataverseClient {
    http: Client,
    api_root: Url,
    token: Option<String>,
}

impl DataverseClient {
    /// `org_url` is the organization root, e.g. `https://contoso.crm.dynamics.com`.
    pub fn new(org_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let api_root = api_root(org_url)?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            api_root,
            token,
        })
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header("Accept", "application/json")
            .header("OData-MaxVersion", "4.0")
            .header("OData-Version", "4.0");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn fetch_page(&self, url: Url) -> Result<Page, RemoteError> {
        debug!(%url, "GET");
        let resp = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(transport)?;
        let resp = check_status(resp).await?;
        resp.json::<Page>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

/// Normalizes the organization URL and appends [`API_PATH`].
pub fn api_root(org_url: &str) -> Result<Url, RemoteError> {
    let mut url = Url::parse(org_url.trim())
        .map_err(|e| RemoteError::Transport(format!("invalid organization url `{org_url}`: {e}")))?;
    let path = format!("{}/", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.join(API_PATH)
        .map_err(|e| RemoteError::Transport(format!("invalid organization url `{org_url}`: {e}")))
}

fn transport(e: reqwest::Error) -> RemoteError {
    RemoteError::Transport(e.to_string())
}

async fn check_status(resp: Response) -> Result<Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = odata::error_message(&body)
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    Err(RemoteError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl DataService for DataverseClient {
    async fn query(&self, query: &QueryExpression) -> Result<Vec<RawRecord>, RemoteError> {
        let mut url = odata::query_url(&self.api_root, query)?;
        let mut records = Vec::new();
        loop {
            let page = self.fetch_page(url).await?;
            records.extend(page.value);
            match page.next_link {
                Some(next) => {
                    url = Url::parse(&next).map_err(|e| RemoteError::Decode(format!("bad nextLink: {e}")))?;
                }
                None => break,
            }
        }
        debug!(entity = %query.entity, count = records.len(), "query complete");
        Ok(records)
    }

    async fn delete(&self, entity: &EntityKind, id: &SolutionId) -> Result<(), RemoteError> {
        let url = odata::record_url(&self.api_root, entity, id)?;
        debug!(%url, "DELETE");
        let resp = self
            .request(Method::DELETE, url)
            .send()
            .await
            .map_err(transport)?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound {
                entity: entity.to_string(),
                id: id.to_string(),
            });
        }
        check_status(resp).await.map(|_| ())
    }
}
