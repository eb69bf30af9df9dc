//! Cookie validation and the OAuth redirect dance that refreshes it

use std::time::Duration;

use color_eyre::{Result, eyre::bail};
use reqwest::StatusCode;
use v_utils::{elog, log};

use crate::Session;

/// Bounds of the refresh loop
#[derive(Clone, Copy, Debug, derive_new::new)]
pub struct RefreshPolicy {
	/// Refresh attempts before giving up
	pub max_refreshes: u32,
	/// Pause before every refresh but the first
	pub backoff: Duration,
}

impl Default for RefreshPolicy {
	fn default() -> Self {
		Self::new(3, Duration::from_secs(2))
	}
}

/// Probe the task list; while it does not answer 200, walk the OAuth authorize redirect to renew the cookie.
///
/// Returns the number of refreshes that were needed.
pub async fn ensure_session(session: &Session, policy: RefreshPolicy) -> Result<u32> {
	let mut refreshes = 0;
	loop {
		let probe = session.client.post::<()>(&session.endpoints.task_list, None).await?;
		if probe.status == StatusCode::OK {
			if refreshes > 0 {
				log!("Cookie refreshed");
			}
			return Ok(refreshes);
		}
		tracing::debug!("Session probe answered {}", probe.status);

		if refreshes >= policy.max_refreshes {
			bail!("Cookie refresh failed after {refreshes} attempts, check the COOKIE value");
		}

		if refreshes > 0 {
			elog!("Cookie refresh failed, retrying in {:?}", policy.backoff);
			tokio::time::sleep(policy.backoff).await;
		}

		log!("Cookie expired, trying to refresh");
		refresh_cookie(session).await;
		refreshes += 1;
	}
}

/// Any failure here just means the next probe fails too, so errors are only logged.
async fn refresh_cookie(session: &Session) {
	let authorize = match session.client.get(&session.endpoints.oauth).await {
		Ok(resp) => resp,
		Err(e) => {
			tracing::warn!("OAuth authorize request failed: {e}");
			return;
		}
	};

	if let Some(location) = authorize.location() {
		tracing::debug!("Following OAuth redirect to {location}");
		if let Err(e) = session.client.get(location).await {
			tracing::warn!("OAuth redirect request failed: {e}");
		}
	}
}
