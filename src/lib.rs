use color_eyre::Result;

pub mod api;
pub mod client;
pub mod config;
pub mod identity;
pub mod login;
pub mod render;
pub mod runner;
pub mod submit;

use api::Endpoints;
use client::CpdailyClient;
use config::AppConfig;

/// Everything a stage needs, threaded through the whole run
#[derive(Debug)]
pub struct Session {
	pub config: AppConfig,
	pub endpoints: Endpoints,
	pub client: CpdailyClient,
}

impl Session {
	pub fn new(config: AppConfig) -> Result<Self> {
		Self::with_endpoints(config, Endpoints::default())
	}

	pub fn with_endpoints(config: AppConfig, endpoints: Endpoints) -> Result<Self> {
		let client = CpdailyClient::new(&config, &endpoints.oauth)?;
		Ok(Self { config, endpoints, client })
	}
}
