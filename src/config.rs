use std::path::Path;

use color_eyre::{
	Result,
	eyre::{WrapErr, bail, eyre},
};

pub const DEFAULT_ENV_FILE: &str = "env.txt";

const KEY_DOMAIN: &str = "DOMAIN";
const KEY_USER_AGENT: &str = "USER_AGENT";
const KEY_EXTENSION: &str = "EXTENSION";
const KEY_COOKIE: &str = "COOKIE";
const KEY_ADDRESS: &str = "ADDRESS";
const KEY_AREA: &str = "AREA";

/// Credentials and answers for a single run. Loaded once, never mutated afterwards.
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
	/// Base URL relative endpoints are appended to, e.g. `https://hzu1.cpdaily.com`
	pub domain: String,
	pub user_agent: String,
	/// Value of the `Cpdaily-Extension` header
	pub extension: String,
	pub cookie: String,
	/// Mailing address echoed back in the submitted form
	pub address: String,
	/// Raw `region1/region2/region3` string, see [`Area::parse`]
	pub area: String,
}

impl AppConfig {
	/// Read a dotenv-style `KEY=value` file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let iter = dotenvy::from_path_iter(path).wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
		let mut pairs = Vec::new();
		for item in iter {
			pairs.push(item.wrap_err_with(|| format!("Malformed line in config file {}", path.display()))?);
		}
		Self::from_pairs(pairs)
	}

	pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>, {
		let mut config = AppConfig::default();
		let mut seen = Vec::new();
		for (key, value) in pairs {
			let key = key.into();
			let value = value.into();
			let slot = match key.as_str() {
				KEY_DOMAIN => &mut config.domain,
				KEY_USER_AGENT => &mut config.user_agent,
				KEY_EXTENSION => &mut config.extension,
				KEY_COOKIE => &mut config.cookie,
				KEY_ADDRESS => &mut config.address,
				KEY_AREA => &mut config.area,
				_ => {
					tracing::debug!("Ignoring unknown config key {key}");
					continue;
				}
			};
			*slot = value;
			seen.push(key);
		}

		for required in [KEY_DOMAIN, KEY_USER_AGENT, KEY_EXTENSION, KEY_COOKIE, KEY_ADDRESS, KEY_AREA] {
			if !seen.iter().any(|k| k == required) {
				bail!("Missing config key {required}");
			}
		}
		Ok(config)
	}
}

/// The three administrative levels of the "where are you" answer
#[derive(Clone, Debug, Eq, PartialEq, derive_new::new)]
pub struct Area {
	pub province: String,
	pub city: String,
	pub district: String,
}

impl Area {
	/// Split `region1/region2/region3`. Anything other than exactly three segments is rejected.
	pub fn parse(s: &str) -> Result<Self> {
		let parts: Vec<&str> = s.split('/').collect();
		match parts.as_slice() {
			[province, city, district] => Ok(Area::new(province.to_string(), city.to_string(), district.to_string())),
			_ => Err(eyre!("AREA must look like `region1/region2/region3`, got {:?} ({} segments)", s, parts.len())),
		}
	}
}
