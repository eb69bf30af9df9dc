//! The four stages, in order

use color_eyre::{Result, eyre::WrapErr};
use v_utils::log;

use crate::{Session, api::FilledForm, identity::report_identity, login::RefreshPolicy, login::ensure_session, render::render_form, submit::submit_form};

#[derive(Clone, Debug, Default)]
pub struct RunOptions {
	pub refresh: RefreshPolicy,
	/// Stop after rendering, do not submit
	pub dry_run: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
	/// No unhandled task on the list
	NothingToDo,
	DryRun(FilledForm),
	/// Raw body of the submit response
	Submitted(String),
}

pub async fn run(session: &Session, opts: &RunOptions) -> Result<Outcome> {
	ensure_session(session, opts.refresh).await.wrap_err("Session check failed")?;
	report_identity(session).await?;

	let Some(form) = render_form(session).await? else {
		return Ok(Outcome::NothingToDo);
	};

	if opts.dry_run {
		log!("Dry run, not submitting");
		return Ok(Outcome::DryRun(form));
	}

	let body = submit_form(session, &form).await?;
	Ok(Outcome::Submitted(body))
}
