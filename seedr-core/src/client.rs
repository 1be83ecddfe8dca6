use std::fmt;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use url::Url;

use crate::auth::{AuthClient, AuthError};

const DEFAULT_BASE_URL: &str = "https://www.seedr.cc";
/// Whole-request bound for API calls (listing, link resolution, deletes).
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn api_http(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .timeout(timeout)
        .build()
}

#[derive(Debug, Error)]
pub enum SeedrError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("api returned {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("api rejected the call: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorClass {
    Auth,
    RateLimit,
    Transient,
    Permanent,
}

/// Opaque identifier of a file or folder. The API sends numbers for most
/// resources but the value is only ever echoed back, so it is kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn to_json(&self) -> Value {
        match self.0.parse::<u64>() {
            Ok(number) => Value::from(number),
            Err(_) => Value::from(self.0.clone()),
        }
    }
}

impl<'de> Deserialize<'de> for RemoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Self(value.to_string()),
            Raw::Text(value) => Self(value),
        })
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for RemoteId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for RemoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FolderId {
    Root,
    Id(RemoteId),
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FolderId::Root => f.write_str("root"),
            FolderId::Id(id) => write!(f, "{id}"),
        }
    }
}

impl From<RemoteId> for FolderId {
    fn from(id: RemoteId) -> Self {
        FolderId::Id(id)
    }
}

#[derive(Clone)]
pub struct SeedrClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl SeedrClient {
    pub fn new(token: impl Into<String>) -> Result<Self, SeedrError> {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    pub fn with_base_url(base_url: &str, token: impl Into<String>) -> Result<Self, SeedrError> {
        Ok(Self {
            http: api_http(DEFAULT_API_TIMEOUT)?,
            base_url: Url::parse(base_url)?,
            token: token.into(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, SeedrError> {
        self.http = api_http(timeout)?;
        Ok(self)
    }

    /// Logs in with account credentials and returns a client bound to the
    /// issued access token.
    pub async fn connect(username: &str, password: &str) -> Result<Self, AuthError> {
        Self::connect_with_base_url(DEFAULT_BASE_URL, username, password).await
    }

    pub async fn connect_with_base_url(
        base_url: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, AuthError> {
        let token = AuthClient::with_base_url(base_url)?
            .login(username, password)
            .await?;
        Ok(Self::with_base_url(base_url, token.access_token)?)
    }

    pub async fn list_folder(&self, folder: &FolderId) -> Result<FolderContents, SeedrError> {
        let path = match folder {
            FolderId::Root => "/api/folder".to_string(),
            FolderId::Id(id) => format!("/api/folder/{id}"),
        };
        let url = self.endpoint(&path)?;
        let response = self.http.get(url).send().await?;
        Self::handle_response(response).await
    }

    pub async fn fetch_file(&self, id: &RemoteId) -> Result<FileLink, SeedrError> {
        let url = self.resource_endpoint("fetch_file")?;
        let response = self
            .http
            .post(url)
            .form(&[("folder_file_id", id.as_str())])
            .send()
            .await?;
        let payload: FileLinkResponse = Self::handle_response(response).await?;
        match payload.url {
            Some(url) if payload.result.unwrap_or(true) => Ok(FileLink {
                url,
                name: payload.name,
            }),
            _ => Err(SeedrError::Rejected(
                payload
                    .error
                    .unwrap_or_else(|| format!("no download url for file {id}")),
            )),
        }
    }

    pub async fn delete_file(&self, id: &RemoteId) -> Result<(), SeedrError> {
        self.delete_item("file", id).await
    }

    pub async fn delete_folder(&self, id: &RemoteId) -> Result<(), SeedrError> {
        self.delete_item("folder", id).await
    }

    async fn delete_item(&self, kind: &str, id: &RemoteId) -> Result<(), SeedrError> {
        let url = self.resource_endpoint("delete")?;
        let delete_arr = json!([{ "type": kind, "id": id.to_json() }]).to_string();
        let response = self
            .http
            .post(url)
            .form(&[("delete_arr", delete_arr.as_str())])
            .send()
            .await?;
        let outcome: ActionResult = Self::handle_response(response).await?;
        if outcome.result {
            Ok(())
        } else {
            Err(SeedrError::Rejected(outcome.error.unwrap_or_else(|| {
                format!("delete of {kind} {id} was not accepted")
            })))
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, SeedrError> {
        let mut url = self.base_url.join(path)?;
        url.query_pairs_mut().append_pair("access_token", &self.token);
        Ok(url)
    }

    fn resource_endpoint(&self, func: &str) -> Result<Url, SeedrError> {
        let mut url = self.endpoint("/oauth_test/resource.php")?;
        url.query_pairs_mut().append_pair("func", func);
        Ok(url)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SeedrError> {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(SeedrError::Api { status, body })
        }
    }
}

impl SeedrError {
    pub fn classification(&self) -> Option<ApiErrorClass> {
        match self {
            SeedrError::Api { status, .. } => Some(classify_api_status(*status)),
            _ => None,
        }
    }

    pub fn is_auth(&self) -> bool {
        self.classification() == Some(ApiErrorClass::Auth)
    }
}

fn classify_api_status(status: StatusCode) -> ApiErrorClass {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        ApiErrorClass::Auth
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        ApiErrorClass::RateLimit
    } else if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        ApiErrorClass::Transient
    } else {
        ApiErrorClass::Permanent
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct FolderContents {
    #[serde(default)]
    pub folders: Vec<FolderEntry>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

impl FolderContents {
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FolderEntry {
    pub id: RemoteId,
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FileEntry {
    pub folder_file_id: RemoteId,
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct FileLink {
    pub url: Url,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileLinkResponse {
    #[serde(default)]
    result: Option<bool>,
    #[serde(default)]
    url: Option<Url>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActionResult {
    #[serde(default = "accepted")]
    result: bool,
    #[serde(default)]
    error: Option<String>,
}

fn accepted() -> bool {
    true
}
