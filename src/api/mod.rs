use crate::models::{CaseRecord, OfficeRecord, SavedAddress};
use crate::notice::filename_from_content_disposition;
use crate::storage::{load_string, remove_key, TOKEN_KEY};
use leptos::logging::warn;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    Network,
    Http,
    /// Backend answered with `success: false` or an error body carrying a message.
    Backend,
    Parse,
}

#[derive(Clone, Debug)]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    pub(crate) fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: "Session expired. Please sign in again.".to_string(),
        }
    }

    pub(crate) fn backend(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Backend,
            message: message.into(),
        }
    }

    fn http(status: reqwest::StatusCode, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status})"),
        }
    }

    /// Message fit for a user-facing banner. Only backend-provided text is
    /// shown verbatim; anything else collapses to `fallback`.
    pub(crate) fn user_message(&self, fallback: &str) -> String {
        match self.kind {
            ApiErrorKind::Backend | ApiErrorKind::Unauthorized | ApiErrorKind::Network
                if !self.message.trim().is_empty() =>
            {
                self.message.clone()
            }
            _ => fallback.to_string(),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let default_api_url = "http://localhost:5000/api".to_string();

        // Deployments inject `window.ENV.API_URL`; `api_url` is accepted too.
        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    for key in ["API_URL", "api_url"] {
                        if let Ok(api_url) = js_sys::Reflect::get(&env, &key.into()) {
                            if let Some(url_str) = api_url.as_string() {
                                return Self {
                                    api_url: url_str.trim_end_matches('/').to_string(),
                                };
                            }
                        }
                    }
                }
            }
        }

        Self {
            api_url: default_api_url,
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SaveEmployerEntryRequest {
    pub identity: String,
    pub establishment_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateCaseRequest {
    pub identity: String,
    pub field_updates: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SaveOfficeRequest {
    pub identity: String,
    #[serde(flatten)]
    pub office: OfficeRecord,
}

/// Binary notice returned by the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct GeneratedDocument {
    /// Suggested by the `Content-Disposition` header, when parsable.
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    /// Shared by every clone so a 401 seen by one request signs out all of them.
    token: Arc<Mutex<Option<String>>>,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            token: Arc::new(Mutex::new(None)),
        }
    }

    pub fn load_from_storage() -> Self {
        let c = Self::new(EnvConfig::new().api_url);
        if let Some(token) = load_string(TOKEN_KEY) {
            c.set_token(token);
        }
        c
    }

    /// Tokens are written by the portal login; only the browser tests store one.
    #[cfg(all(test, target_arch = "wasm32"))]
    pub fn save_to_storage(&self) {
        if let Some(token) = self.get_auth_token() {
            crate::storage::save_string(TOKEN_KEY, &token);
        }
    }

    pub fn clear_storage() {
        remove_key(TOKEN_KEY);
    }

    pub fn set_token(&self, token: String) {
        if let Ok(mut t) = self.token.lock() {
            *t = Some(token);
        }
    }

    pub(crate) fn get_auth_token(&self) -> Option<String> {
        self.token.lock().ok().and_then(|t| t.clone())
    }

    fn clear_token(&self) {
        if let Ok(mut t) = self.token.lock() {
            *t = None;
        }
        Self::clear_storage();
    }

    pub fn is_authenticated(&self) -> bool {
        self.get_auth_token().is_some()
    }

    fn auth_header(&self) -> Option<String> {
        self.get_auth_token().map(|t| format!("Bearer {}", t))
    }

    fn with_auth_headers(
        mut req: reqwest::RequestBuilder,
        header: Option<String>,
    ) -> reqwest::RequestBuilder {
        if let Some(header) = header {
            req = req.header("Authorization", header);
        }
        req
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> ApiResult<reqwest::Response> {
        let client = reqwest::Client::new();
        let url = format!("{}{}", self.base_url, path);
        let mut req = client.request(method, url);
        req = Self::with_auth_headers(req, self.auth_header());

        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(ApiError::network)?;

        if res.status().is_success() {
            return Ok(res);
        }

        if res.status() == reqwest::StatusCode::UNAUTHORIZED {
            warn!("[api] 401 on {path}; clearing stored token");
            self.clear_token();
            return Err(ApiError::unauthorized());
        }

        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        Err(error_from_body(status, &body, "Request failed"))
    }

    async fn request_json(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> ApiResult<serde_json::Value> {
        let res = self.send(method, path, body).await?;
        let v: serde_json::Value = res.json().await.map_err(ApiError::parse)?;
        check_success(v)
    }

    pub async fn get_saved_names(
        &self,
        identity: &str,
        establishment_code: &str,
    ) -> ApiResult<Vec<String>> {
        let path = format!(
            "/employer-address/{}/names?identity={}",
            urlencoding::encode(establishment_code),
            urlencoding::encode(identity)
        );
        let v = self
            .request_json(reqwest::Method::GET, &path, None::<&()>)
            .await?;
        Ok(parse_name_list(&v))
    }

    pub async fn get_saved_addresses(
        &self,
        identity: &str,
        establishment_code: &str,
    ) -> ApiResult<Vec<SavedAddress>> {
        let path = format!(
            "/employer-address/{}?identity={}",
            urlencoding::encode(establishment_code),
            urlencoding::encode(identity)
        );
        let v = self
            .request_json(reqwest::Method::GET, &path, None::<&()>)
            .await?;
        Ok(parse_data_list(&v))
    }

    pub async fn save_employer_entry(&self, req: &SaveEmployerEntryRequest) -> ApiResult<()> {
        self.request_json(reqwest::Method::POST, "/employer-address", Some(req))
            .await
            .map(|_| ())
    }

    pub async fn delete_saved_address(&self, identity: &str, id: &str) -> ApiResult<()> {
        let path = format!(
            "/employer-address/{}?identity={}",
            urlencoding::encode(id),
            urlencoding::encode(identity)
        );
        self.request_json(reqwest::Method::DELETE, &path, None::<&()>)
            .await
            .map(|_| ())
    }

    pub async fn list_cases(&self, identity: &str) -> ApiResult<Vec<CaseRecord>> {
        let path = format!("/rrc?identity={}", urlencoding::encode(identity));
        let v = self
            .request_json(reqwest::Method::GET, &path, None::<&()>)
            .await?;
        Ok(parse_data_list(&v))
    }

    pub async fn update_case(&self, case_id: &str, req: &UpdateCaseRequest) -> ApiResult<()> {
        let path = format!("/rrc/{}", urlencoding::encode(case_id));
        self.request_json(reqwest::Method::PUT, &path, Some(req))
            .await
            .map(|_| ())
    }

    /// Posts a generation request and returns the rendered document.
    pub async fn generate_notice(
        &self,
        slug: &str,
        body: &serde_json::Value,
    ) -> ApiResult<GeneratedDocument> {
        let path = format!("/notices/{slug}/generate");
        let res = self.send(reqwest::Method::POST, &path, Some(body)).await?;

        let filename = res
            .headers()
            .get("content-disposition")
            .and_then(|h| h.to_str().ok())
            .and_then(filename_from_content_disposition);

        let bytes = res.bytes().await.map_err(ApiError::network)?.to_vec();
        Ok(GeneratedDocument { filename, bytes })
    }

    pub async fn generate_letter_body(&self, prompt: &str) -> ApiResult<String> {
        let v = self
            .request_json(
                reqwest::Method::POST,
                "/notices/esta-letter/generate-body",
                Some(&serde_json::json!({ "prompt": prompt })),
            )
            .await?;
        Ok(v.get("data")
            .and_then(|d| d.get("letterBody"))
            .and_then(|b| b.as_str())
            .unwrap_or_default()
            .to_string())
    }

    pub async fn get_office(&self, identity: &str) -> ApiResult<Option<OfficeRecord>> {
        let path = format!("/office/{}", urlencoding::encode(identity));
        let v = self
            .request_json(reqwest::Method::GET, &path, None::<&()>)
            .await?;
        Ok(v.get("data")
            .filter(|d| d.is_object())
            .and_then(|d| serde_json::from_value(d.clone()).ok()))
    }

    pub async fn save_office(&self, req: &SaveOfficeRequest) -> ApiResult<()> {
        self.request_json(reqwest::Method::POST, "/office/save", Some(req))
            .await
            .map(|_| ())
    }
}

/// `{ success: false, message }` is an error even on HTTP 200.
fn check_success(v: serde_json::Value) -> ApiResult<serde_json::Value> {
    if v.get("success").and_then(|s| s.as_bool()) == Some(false) {
        let msg = v
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Request failed");
        return Err(ApiError::backend(msg));
    }
    Ok(v)
}

fn error_from_body(status: reqwest::StatusCode, body: &str, ctx: &str) -> ApiError {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
        })
        .filter(|m| !m.trim().is_empty())
        .map(ApiError::backend)
        .unwrap_or_else(|| ApiError::http(status, ctx))
}

/// Items of `data` that fail to decode are skipped; a missing or non-array
/// `data` is an empty list.
pub(crate) fn parse_data_list<T: for<'de> Deserialize<'de>>(v: &serde_json::Value) -> Vec<T> {
    v.get("data")
        .and_then(|d| d.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Saved names deduplicated by content, blanks dropped, backend order kept.
pub(crate) fn parse_name_list(v: &serde_json::Value) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in parse_data_list::<serde_json::Value>(v) {
        let Some(s) = name.as_str().map(str::trim) else {
            continue;
        };
        if !s.is_empty() && !out.iter().any(|x| x == s) {
            out.push(s.to_string());
        }
    }
    out
}
