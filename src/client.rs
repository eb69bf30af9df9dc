//! Thin reqwest wrapper that signs every request with the configured identity headers.

use std::time::Duration;

use color_eyre::{Result, eyre::eyre};
use reqwest::{
	Method, Response, StatusCode,
	header::{self, HeaderMap, HeaderValue},
	redirect,
};
use serde::Serialize;

use crate::config::AppConfig;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const EXTENSION_HEADER: &str = "Cpdaily-Extension";

/// Status, headers and fully-read body of one exchange
#[derive(Debug)]
pub struct RawResponse {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Vec<u8>,
}

impl RawResponse {
	pub fn location(&self) -> Option<&str> {
		self.headers.get(header::LOCATION).and_then(|v| v.to_str().ok()).filter(|l| !l.is_empty())
	}

	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

#[derive(Debug)]
pub struct CpdailyClient {
	http: reqwest::Client,
	domain: String,
	headers: HeaderMap,
}

impl CpdailyClient {
	/// `follow_redirects_to` is the only redirect target the client will chase; every other redirect comes back as-is.
	pub fn new(config: &AppConfig, follow_redirects_to: &str) -> Result<Self> {
		let mut headers = HeaderMap::new();
		headers.insert(header::USER_AGENT, header_value("USER_AGENT", &config.user_agent)?);
		headers.insert(header::COOKIE, header_value("COOKIE", &config.cookie)?);
		headers.insert(EXTENSION_HEADER, header_value("EXTENSION", &config.extension)?);

		let allowed = follow_redirects_to.to_owned();
		let policy = redirect::Policy::custom(move |attempt| {
			if same_url(attempt.url().as_str(), &allowed) {
				attempt.follow()
			} else {
				attempt.stop()
			}
		});

		let http = reqwest::Client::builder()
			.timeout(REQUEST_TIMEOUT)
			.redirect(policy)
			.build()
			.map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

		Ok(Self {
			http,
			domain: config.domain.clone(),
			headers,
		})
	}

	/// Absolute URLs pass through, anything else is appended to the domain.
	pub fn render_url(&self, url: &str) -> String {
		render_url(&self.domain, url)
	}

	pub async fn get(&self, url: &str) -> Result<RawResponse> {
		self.send::<()>(Method::GET, url, None).await
	}

	pub async fn post<B: Serialize + ?Sized>(&self, url: &str, body: Option<&B>) -> Result<RawResponse> {
		self.send(Method::POST, url, body).await
	}

	async fn send<B: Serialize + ?Sized>(&self, method: Method, url: &str, body: Option<&B>) -> Result<RawResponse> {
		let full_url = self.render_url(url);
		let mut req = self.http.request(method.clone(), &full_url).headers(self.headers.clone());
		if method == Method::POST {
			req = req.header(header::CONTENT_TYPE, "application/json");
		}
		if let Some(body) = body {
			let bytes = serde_json::to_vec(body).map_err(|e| eyre!("Failed to encode request body for {full_url}: {e}"))?;
			req = req.body(bytes);
		}

		tracing::debug!("{method} {full_url}");
		let resp: Response = req.send().await.map_err(|e| eyre!("HTTP {method} {full_url} failed: {e}"))?;
		let status = resp.status();
		let headers = resp.headers().clone();
		let body = resp.bytes().await.map_err(|e| eyre!("Failed to read response body of {full_url}: {e}"))?.to_vec();
		tracing::debug!("{method} {full_url} -> {status} ({} bytes)", body.len());

		Ok(RawResponse { status, headers, body })
	}
}

pub fn render_url(domain: &str, url: &str) -> String {
	if url.starts_with("http") { url.to_owned() } else { format!("{domain}{url}") }
}

fn header_value(key: &str, value: &str) -> Result<HeaderValue> {
	HeaderValue::from_str(value).map_err(|e| eyre!("Config value {key} is not a valid header value: {e}"))
}

// reqwest re-serializes the target URL, so compare both sides after parsing
fn same_url(candidate: &str, allowed: &str) -> bool {
	match (reqwest::Url::parse(candidate), reqwest::Url::parse(allowed)) {
		(Ok(a), Ok(b)) => a == b,
		_ => candidate == allowed,
	}
}
