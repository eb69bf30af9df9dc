use color_eyre::{Result, eyre::WrapErr};
use v_utils::log;

use crate::{Session, api::UserInfo};

/// Log whose cookie we are running with.
pub async fn report_identity(session: &Session) -> Result<String> {
	let resp = session.client.post::<()>(&session.endpoints.user_info, None).await.wrap_err("Failed to fetch user info")?;
	let info: UserInfo = serde_json::from_slice(&resp.body).wrap_err_with(|| format!("Failed to parse user info: '{}'", resp.text()))?;

	log!("Current user: {}", info.data.name);
	Ok(info.data.name)
}
