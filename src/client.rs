use anyhow::{bail, Context, Result};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

/// Thin wrapper around `reqwest` carrying the backend base URL and, once a
/// session exists, its bearer token. All endpoint modules go through this.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("invalid API base URL: {base_url}"))?;
        let http = reqwest::Client::builder()
            .user_agent("mindwell/0.1")
            .build()
            .context("building HTTP client")?;
        Ok(Self { http, base, token: None })
    }

    /// Attach the session token used for authenticated requests.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("joining URL path: {path}"))
    }

    /// Join a raw value onto a path as one percent-encoded segment, so
    /// reserved characters (`?`, `#`, `/`) stay part of the segment instead
    /// of restructuring the URL.
    fn url_with_segment(&self, path: &str, segment: &str) -> Result<Url> {
        let mut url = self.url(path)?;
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("API base URL cannot carry path segments"))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&impl Serialize>,
    ) -> Result<T> {
        let url = self.url(path)?;
        self.send_url(method, url, query, body).await
    }

    async fn send_url<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        query: &[(&str, String)],
        body: Option<&impl Serialize>,
    ) -> Result<T> {
        debug!(%method, %url, "api request");
        let mut req = self.http.request(method.clone(), url.clone());
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("{method} {url}: request failed"))?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            bail!("{method} {url}: {status}: {}", truncate(&detail, 200));
        }
        let body = if status == StatusCode::NO_CONTENT {
            String::new()
        } else {
            resp.text()
                .await
                .with_context(|| format!("{method} {url}: reading response body"))?
        };
        decode_body(&body).with_context(|| format!("{method} {url}: decoding response body"))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(Method::GET, path, &[], None::<&()>).await
    }

    /// GET with a trailing path segment taken verbatim (and encoded), for
    /// values like titles that may contain URL metacharacters.
    pub async fn get_json_segment<T: DeserializeOwned>(
        &self,
        path: &str,
        segment: &str,
    ) -> Result<T> {
        let url = self.url_with_segment(path, segment)?;
        self.send_url(Method::GET, url, &[], None::<&()>).await
    }

    pub async fn get_json_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.send(Method::GET, path, query, None::<&()>).await
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(Method::POST, path, &[], Some(body)).await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(Method::POST, path, &[], Some(&serde_json::json!({}))).await
    }

    pub async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn put_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.send(Method::PUT, path, query, Some(&serde_json::json!({}))).await
    }

    pub async fn patch_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.send(Method::PATCH, path, query, Some(&serde_json::json!({}))).await
    }

    /// POST returning a plain-text body.
    pub async fn post_text(&self, path: &str) -> Result<String> {
        let url = self.url(path)?;
        debug!(%url, "api post (text response)");
        let mut req = self.http.post(url.clone()).json(&serde_json::json!({}));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("POST {url}: request failed"))?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            bail!("POST {url}: {status}: {}", truncate(&detail, 200));
        }
        resp.text()
            .await
            .with_context(|| format!("POST {url}: reading response body"))
    }

    /// GET where only the status matters; the body is discarded.
    pub async fn get_ok(&self, path: &str) -> Result<()> {
        let url = self.url(path)?;
        debug!(%url, "api get (status only)");
        let mut req = self.http.get(url.clone());
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("GET {url}: request failed"))?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            bail!("GET {url}: {status}: {}", truncate(&detail, 200));
        }
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path)?;
        debug!(%url, "api delete");
        let mut req = self.http.delete(url.clone());
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("DELETE {url}: request failed"))?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            bail!("DELETE {url}: {status}: {}", truncate(&detail, 200));
        }
        Ok(())
    }
}

/// Decode a successful response body. Handlers with a `void` return send
/// HTTP 200 with no body at all, so an empty body deserializes as JSON
/// `null` rather than failing on EOF.
fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(Into::into)
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_base_url() {
        assert!(ApiClient::new("not a url").is_err());
        assert!(ApiClient::new("http://localhost:8080").is_ok());
    }

    #[test]
    fn title_segments_are_percent_encoded() {
        let client = ApiClient::new("http://localhost:8080").unwrap();
        let url = client
            .url_with_segment("/api/v2/content", "Calm? Deep/Sleep")
            .unwrap();
        assert_eq!(url.path(), "/api/v2/content/Calm%3F%20Deep%2FSleep");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn empty_success_body_decodes_as_unit() {
        // void backend handlers answer 200 with no body
        let ok: () = decode_body("").unwrap();
        let _ = ok;
        let ok: () = decode_body("  \n").unwrap();
        let _ = ok;
        let n: u32 = decode_body("7").unwrap();
        assert_eq!(n, 7);
        assert!(decode_body::<u32>("{oops").is_err());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("hello", 3), "hel");
        assert_eq!(truncate("hi", 10), "hi");
        assert_eq!(truncate("héllo", 2), "hé");
    }
}
