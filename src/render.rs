//! Picks the pending task and fills in its form

use color_eyre::{Result, eyre::WrapErr};
use v_utils::log;

use crate::{
	Session,
	api::{FieldRow, FilledForm, FormFieldsRequest, PageRequest, Rows, TaskDetail, TaskDetailRequest, TaskRow, parse_envelope},
	config::Area,
};

const REGION_MARKER: &str = "所在的地区";
const STATUS_MARKER: &str = "当前的状况";
const QUARANTINE_MARKER: &str = "居家观察";
const SCENARIO_MARKER: &str = "符合的场景";

const NORMAL_ANSWER: &str = "正常";
const NONE_APPLY_ANSWER: &str = "以上都不符合";

/// How a recognized field gets answered
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldRule {
	/// Answered with the configured area
	Region,
	/// Pick the "normal" option
	Status,
	/// Sent back untouched
	Quarantine,
	/// Pick "none of the above apply"
	Scenario,
}

impl FieldRule {
	/// First marker found in the title wins.
	pub fn classify(title: &str) -> Option<Self> {
		[(REGION_MARKER, Self::Region), (STATUS_MARKER, Self::Status), (QUARANTINE_MARKER, Self::Quarantine), (SCENARIO_MARKER, Self::Scenario)]
			.into_iter()
			.find(|(marker, _)| title.contains(marker))
			.map(|(_, rule)| rule)
	}
}

/// Fetch everything needed and build the form. `None` means there is nothing to fill in.
pub async fn render_form(session: &Session) -> Result<Option<FilledForm>> {
	let raw = session.client.post(&session.endpoints.task_list, Some(&PageRequest::default())).await.wrap_err("Task list request failed")?;
	let tasks: Rows<TaskRow> = parse_envelope(&raw.body, "task list")?;

	if !tasks.rows.is_empty() {
		log!("Current forms:\n{}", task_summary(&tasks.rows).join("\n"));
	}
	let Some(task) = select_task(&tasks.rows) else {
		log!("No pending forms");
		return Ok(None);
	};
	if task.handled() {
		tracing::warn!("Selected task {:?} is already handled, submitting anyway", task.subject);
	}

	let raw = session
		.client
		.post(&session.endpoints.task_detail, Some(&TaskDetailRequest { collector_wid: &task.wid }))
		.await
		.wrap_err("Task detail request failed")?;
	let detail: TaskDetail = parse_envelope(&raw.body, "task detail")?;

	let req = FormFieldsRequest {
		page: PageRequest::default(),
		form_wid: &task.form_wid,
		collector_wid: &task.wid,
	};
	let raw = session.client.post(&session.endpoints.form_fields, Some(&req)).await.wrap_err("Form fields request failed")?;
	let fields: Rows<FieldRow> = parse_envelope(&raw.body, "form fields")?;

	let form = FilledForm {
		form_wid: task.form_wid.clone(),
		address: session.config.address.clone(),
		collect_wid: task.wid.clone(),
		school_task_wid: detail.collector.school_task_wid,
		form: fill_fields(fields.rows, &session.config.area)?,
	};

	log!("Rendered form: {}", serde_json::to_string(&form)?);
	Ok(Some(form))
}

pub fn task_summary(rows: &[TaskRow]) -> Vec<String> {
	rows.iter()
		.map(|t| {
			let state = if t.handled() { "handled" } else { "unhandled" };
			format!("  {} / published: {} - {state}", t.subject, t.create_time)
		})
		.collect()
}

/// `None` when no row is unhandled. Otherwise the first row, whatever its state.
pub fn select_task(rows: &[TaskRow]) -> Option<&TaskRow> {
	if rows.iter().all(TaskRow::handled) {
		return None;
	}
	rows.first()
}

/// Answer every recognized field, dropping the rest.
pub fn fill_fields(rows: Vec<FieldRow>, area: &str) -> Result<Vec<FieldRow>> {
	let mut filled = Vec::with_capacity(rows.len());
	for row in rows {
		let Some(rule) = FieldRule::classify(&row.title) else {
			tracing::debug!("Dropping unrecognized field {:?}", row.title);
			continue;
		};
		match fill_field(row, rule, area)? {
			Some(row) => filled.push(row),
			None => tracing::debug!("No acceptable option for {rule:?} field, dropping it"),
		}
	}
	Ok(filled)
}

pub fn fill_field(mut row: FieldRow, rule: FieldRule, area: &str) -> Result<Option<FieldRow>> {
	match rule {
		FieldRule::Region => {
			let parsed = Area::parse(area)?;
			row.value = area.to_owned();
			row.area1 = parsed.province;
			row.area2 = parsed.city;
			row.area3 = parsed.district;
			Ok(Some(row))
		}
		FieldRule::Status => Ok(choose_item(row, NORMAL_ANSWER)),
		FieldRule::Quarantine => Ok(Some(row)),
		FieldRule::Scenario => Ok(choose_item(row, NONE_APPLY_ANSWER)),
	}
}

/// Keep only the first item whose label contains `needle` and answer with it.
fn choose_item(mut row: FieldRow, needle: &str) -> Option<FieldRow> {
	let idx = row.field_items.iter().position(|item| item.content.contains(needle))?;
	let item = row.field_items.swap_remove(idx);
	row.value = item.content.clone();
	row.field_items = vec![item];
	Some(row)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::FieldItem;

	fn task(wid: &str, handled: bool) -> TaskRow {
		TaskRow {
			wid: wid.into(),
			form_wid: format!("form-{wid}"),
			subject: format!("subject {wid}"),
			create_time: "2020-02-02 08:00".into(),
			is_handled: handled as i64,
		}
	}

	fn field(title: &str, items: &[&str]) -> FieldRow {
		FieldRow {
			title: title.into(),
			field_items: items
				.iter()
				.enumerate()
				.map(|(i, c)| FieldItem {
					item_wid: i.to_string(),
					content: (*c).into(),
					..Default::default()
				})
				.collect(),
			..Default::default()
		}
	}

	#[test]
	fn classify_titles() {
		assert_eq!(FieldRule::classify("1. 你当前所在的地区"), Some(FieldRule::Region));
		assert_eq!(FieldRule::classify("你当前的状况是"), Some(FieldRule::Status));
		assert_eq!(FieldRule::classify("是否居家观察"), Some(FieldRule::Quarantine));
		assert_eq!(FieldRule::classify("以下符合的场景"), Some(FieldRule::Scenario));
		assert_eq!(FieldRule::classify("体温"), None);
	}

	#[test]
	fn a_field_matches_only_one_rule() {
		// Would also hit the quarantine marker; must not be emitted twice
		let rows = vec![field("当前的状况（居家观察）", &["发热", "正常"])];
		let filled = fill_fields(rows, "A/B/C").unwrap();
		assert_eq!(filled.len(), 1);
		assert_eq!(filled[0].value, "正常");
	}

	#[test]
	fn status_picks_normal() {
		let filled = fill_field(field("当前的状况", &["发热", "正常", "咳嗽"]), FieldRule::Status, "A/B/C").unwrap().unwrap();
		assert_eq!(filled.value, "正常");
		assert_eq!(filled.field_items.len(), 1);
		assert_eq!(filled.field_items[0].item_wid, "1");
	}

	#[test]
	fn status_without_normal_is_dropped() {
		assert!(fill_field(field("当前的状况", &["发热", "咳嗽"]), FieldRule::Status, "A/B/C").unwrap().is_none());
	}

	#[test]
	fn scenario_without_none_apply_is_dropped() {
		let rows = vec![field("符合的场景", &["接触过确诊病例", "去过疫区"]), field("居家观察", &[])];
		let filled = fill_fields(rows, "A/B/C").unwrap();
		assert_eq!(filled.len(), 1);
		assert_eq!(filled[0].title, "居家观察");
	}

	#[test]
	fn scenario_picks_none_apply() {
		let filled = fill_field(field("符合的场景", &["去过疫区", "以上都不符合"]), FieldRule::Scenario, "A/B/C").unwrap().unwrap();
		assert_eq!(filled.value, "以上都不符合");
		assert_eq!(filled.field_items.len(), 1);
	}

	#[test]
	fn region_fills_area_parts() {
		let filled = fill_field(field("所在的地区", &[]), FieldRule::Region, "A/B/C").unwrap().unwrap();
		assert_eq!(filled.value, "A/B/C");
		assert_eq!((filled.area1.as_str(), filled.area2.as_str(), filled.area3.as_str()), ("A", "B", "C"));
	}

	#[test]
	fn region_with_bad_area_is_fatal() {
		assert!(fill_fields(vec![field("所在的地区", &[])], "A/B").is_err());
	}

	#[test]
	fn bad_area_is_ignored_without_region_field() {
		assert!(fill_fields(vec![field("居家观察", &[])], "nonsense").is_ok());
	}

	#[test]
	fn unrecognized_fields_are_dropped_and_order_kept() {
		let rows = vec![field("体温", &[]), field("符合的场景", &["以上都不符合"]), field("所在的地区", &[]), field("备注", &[])];
		let titles: Vec<_> = fill_fields(rows, "A/B/C").unwrap().into_iter().map(|r| r.title).collect();
		assert_eq!(titles, vec!["符合的场景", "所在的地区"]);
	}

	#[test]
	fn selection_is_positional() {
		let rows = vec![task("a", true), task("b", false)];
		assert_eq!(select_task(&rows).unwrap().wid, "a");
	}

	#[test]
	fn nothing_to_do() {
		assert!(select_task(&[]).is_none());
		assert!(select_task(&[task("a", true), task("b", true)]).is_none());
	}

	#[test]
	fn summary_lines() {
		let lines = task_summary(&[task("a", true), task("b", false)]);
		assert_eq!(lines.len(), 2);
		assert!(lines[0].ends_with("- handled"));
		assert!(lines[1].contains("subject b"));
		assert!(lines[1].ends_with("- unhandled"));
	}
}
