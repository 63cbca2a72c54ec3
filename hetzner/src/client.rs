use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, ClientBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::HetznerError;
use crate::server::{ApiErrorBody, CreateServer, CreateServerResponse, Server, ServersPage};

static API_URL: &str = "https://api.hetzner.cloud/v1";
const PER_PAGE: u32 = 50;

/// Server management operations the fleet tools need from a cloud provider
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Create one server. Returns once the API accepted the request.
    async fn create_server(&self, request: &CreateServer) -> Result<Server, HetznerError>;

    /// Every server in the project
    async fn servers(&self) -> Result<Vec<Server>, HetznerError>;

    async fn delete_server(&self, id: u64) -> Result<(), HetznerError>;
}

#[derive(Clone, Debug)]
pub struct HetznerClient {
    client: Client,
    base_url: String,
}

impl HetznerClient {
    /// Create a client authenticated with a project API token
    pub fn new(token: &str) -> Result<Self, HetznerError> {
        Self::with_base_url(token, API_URL)
    }

    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self, HetznerError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| HetznerError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = ClientBuilder::new()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl CloudProvider for HetznerClient {
    async fn create_server(&self, request: &CreateServer) -> Result<Server, HetznerError> {
        let resp = self
            .client
            .post(self.url("/servers"))
            .json(request)
            .send()
            .await?;
        let created: CreateServerResponse = parse(resp).await?;
        Ok(created.server)
    }

    async fn servers(&self) -> Result<Vec<Server>, HetznerError> {
        let mut all_servers = vec![];
        let mut page = Some(1);

        while let Some(p) = page {
            debug!(page = p, "listing servers");
            let resp = self
                .client
                .get(self.url("/servers"))
                .query(&[("page", p), ("per_page", PER_PAGE)])
                .send()
                .await?;
            let servers: ServersPage = parse(resp).await?;
            page = servers.next_page();
            all_servers.extend(servers.servers);
        }

        Ok(all_servers)
    }

    async fn delete_server(&self, id: u64) -> Result<(), HetznerError> {
        let resp = self
            .client
            .delete(self.url(&format!("/servers/{}", id)))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}

async fn check(resp: Response) -> Result<Response, HetznerError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    Err(match serde_json::from_str::<ApiErrorBody>(&text) {
        Ok(body) => HetznerError::Api {
            status: status.as_u16(),
            code: body.error.code,
            message: body.error.message,
        },
        Err(_) => HetznerError::Api {
            status: status.as_u16(),
            code: "unknown".to_owned(),
            message: text,
        },
    })
}

async fn parse<T: DeserializeOwned>(resp: Response) -> Result<T, HetznerError> {
    Ok(check(resp).await?.json().await?)
}
