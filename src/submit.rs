use color_eyre::{Result, eyre::WrapErr};
use v_utils::log;

use crate::{Session, api::FilledForm};

/// Post the form and hand back whatever the server said. The body is not interpreted.
pub async fn submit_form(session: &Session, form: &FilledForm) -> Result<String> {
	let resp = session.client.post(&session.endpoints.submit_form, Some(form)).await.wrap_err("Submit request failed")?;
	let body = resp.text();

	log!("Submit result: {body}");
	Ok(body)
}
