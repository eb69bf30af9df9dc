//! Wire types of the collector API

use color_eyre::{Result, eyre::eyre};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};

pub const QUERY_COLLECTOR_PROCESSING_LIST: &str = "/wec-counselor-collector-apps/stu/collector/queryCollectorProcessingList";
pub const DETAIL_COLLECTOR: &str = "/wec-counselor-collector-apps/stu/collector/detailCollector";
pub const GET_FORM_FIELDS: &str = "/wec-counselor-collector-apps/stu/collector/getFormFields";
pub const SUBMIT_FORM: &str = "/wec-counselor-collector-apps/stu/collector/submitForm";
pub const USER_INFO_URL: &str = "https://mobile.campushoy.com/v6/user/myMainPage";
pub const OAUTH_URL: &str = "https://www.cpdaily.com/connect/oauth2/authorize?response_type=code&client_id=15809557517376149&scope=get_user_info&state=uag&redirect_uri=https:%2F%2Fhzu1.cpdaily.com%2Fwec-counselor-collector-apps%2Fstu%2Fmobile%2Findex.html";

const PAGE_SIZE: u32 = 10;

/// Where each call goes. Relative entries are rendered against the configured domain.
#[derive(Clone, Debug)]
pub struct Endpoints {
	pub task_list: String,
	pub task_detail: String,
	pub form_fields: String,
	pub submit_form: String,
	pub user_info: String,
	pub oauth: String,
}

impl Default for Endpoints {
	fn default() -> Self {
		Self {
			task_list: QUERY_COLLECTOR_PROCESSING_LIST.to_owned(),
			task_detail: DETAIL_COLLECTOR.to_owned(),
			form_fields: GET_FORM_FIELDS.to_owned(),
			submit_form: SUBMIT_FORM.to_owned(),
			user_info: USER_INFO_URL.to_owned(),
			oauth: OAUTH_URL.to_owned(),
		}
	}
}

/// Common `{code, message, datas}` envelope. `code == "0"` means success.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiResponse<T> {
	pub code: String,
	#[serde(default)]
	pub message: Option<String>,
	pub datas: Option<T>,
}

impl<T: Default> ApiResponse<T> {
	/// Unwrap the payload, turning an application-level error code into an error.
	pub fn into_datas(self, what: &str) -> Result<T> {
		if self.code != "0" {
			return Err(eyre!("{what} returned code {}: {}", self.code, self.message.as_deref().unwrap_or("<no message>")));
		}
		// `datas: null` or no `datas` at all is an empty payload
		Ok(self.datas.unwrap_or_default())
	}
}

/// Parse a raw body into an envelope and unwrap it.
pub fn parse_envelope<T: DeserializeOwned + Default>(raw: &[u8], what: &str) -> Result<T> {
	let resp: ApiResponse<T> = serde_json::from_slice(raw).map_err(|e| eyre!("Failed to parse {what} response: {e} - raw: '{}'", String::from_utf8_lossy(raw)))?;
	resp.into_datas(what)
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
	pub page_size: u32,
	pub page_number: u32,
}

impl Default for PageRequest {
	fn default() -> Self {
		Self { page_size: PAGE_SIZE, page_number: 1 }
	}
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetailRequest<'a> {
	pub collector_wid: &'a str,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFieldsRequest<'a> {
	#[serde(flatten)]
	pub page: PageRequest,
	pub form_wid: &'a str,
	pub collector_wid: &'a str,
}

/// Treat an explicit `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de> + Default, {
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Rows<T> {
	#[serde(default, deserialize_with = "null_as_default")]
	pub rows: Vec<T>,
}

/// One pending collector task
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRow {
	pub wid: String,
	pub form_wid: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub subject: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub create_time: String,
	/// 0 = not yet filled in
	#[serde(default, deserialize_with = "null_as_default")]
	pub is_handled: i64,
}

impl TaskRow {
	pub fn handled(&self) -> bool {
		self.is_handled != 0
	}
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TaskDetail {
	#[serde(default, deserialize_with = "null_as_default")]
	pub collector: Collector,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collector {
	#[serde(default, deserialize_with = "null_as_default")]
	pub school_task_wid: String,
}

/// One input of the form, as described by the server and echoed back on submit
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldRow {
	#[serde(deserialize_with = "null_as_default")]
	pub wid: String,
	#[serde(deserialize_with = "null_as_default")]
	pub form_wid: String,
	#[serde(deserialize_with = "null_as_default")]
	pub field_type: i64,
	#[serde(deserialize_with = "null_as_default")]
	pub title: String,
	#[serde(deserialize_with = "null_as_default")]
	pub description: String,
	#[serde(deserialize_with = "null_as_default")]
	pub min_length: i64,
	#[serde(deserialize_with = "null_as_default")]
	pub sort: String,
	#[serde(deserialize_with = "null_as_default")]
	pub max_length: i64,
	#[serde(deserialize_with = "null_as_default")]
	pub is_required: i64,
	#[serde(deserialize_with = "null_as_default")]
	pub image_count: i64,
	#[serde(deserialize_with = "null_as_default")]
	pub has_other_items: i64,
	#[serde(deserialize_with = "null_as_default")]
	pub col_name: String,
	#[serde(deserialize_with = "null_as_default")]
	pub value: String,
	#[serde(deserialize_with = "null_as_default")]
	pub field_items: Vec<FieldItem>,
	#[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
	pub area1: String,
	#[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
	pub area2: String,
	#[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
	pub area3: String,
}

/// A selectable option of a [`FieldRow`]
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldItem {
	#[serde(deserialize_with = "null_as_default")]
	pub item_wid: String,
	#[serde(deserialize_with = "null_as_default")]
	pub content: String,
	#[serde(deserialize_with = "null_as_default")]
	pub is_other_items: i64,
	// sic, the server spells it this way
	pub contend_extend: Option<String>,
	pub is_selected: Option<i64>,
}

/// The payload posted to the submit endpoint
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilledForm {
	pub form_wid: String,
	pub address: String,
	pub collect_wid: String,
	pub school_task_wid: String,
	pub form: Vec<FieldRow>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UserInfo {
	pub data: UserInfoData,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UserInfoData {
	pub name: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn envelope_success() {
		let raw = br#"{"code":"0","datas":{"rows":[{"wid":"1","formWid":"f1","subject":"s","createTime":"t","isHandled":0}]}}"#;
		let rows: Rows<TaskRow> = parse_envelope(raw, "task list").unwrap();
		assert_eq!(rows.rows.len(), 1);
		assert_eq!(rows.rows[0].form_wid, "f1");
		assert!(!rows.rows[0].handled());
	}

	#[test]
	fn envelope_error_code() {
		let raw = br#"{"code":"1","message":"login required"}"#;
		let err = parse_envelope::<Rows<TaskRow>>(raw, "task list").unwrap_err();
		assert!(err.to_string().contains("login required"));
	}

	#[test]
	fn envelope_null_rows_are_empty() {
		let rows: Rows<TaskRow> = parse_envelope(br#"{"code":"0","datas":{"rows":null}}"#, "task list").unwrap();
		assert!(rows.rows.is_empty());
	}

	#[test]
	fn envelope_without_datas_is_empty() {
		let rows: Rows<TaskRow> = parse_envelope(br#"{"code":"0"}"#, "task list").unwrap();
		assert!(rows.rows.is_empty());
		let rows: Rows<FieldRow> = parse_envelope(br#"{"code":"0","datas":null}"#, "form fields").unwrap();
		assert!(rows.rows.is_empty());
	}

	#[test]
	fn field_row_tolerates_nulls() {
		let raw = r#"{"wid":"f1","formWid":null,"fieldType":null,"title":"体温","description":null,"value":null,"fieldItems":null,"area1":null,
			"minLength":null,"sort":null,"colName":null}"#;
		let row: FieldRow = serde_json::from_str(raw).unwrap();
		assert_eq!(row.wid, "f1");
		assert_eq!(row.title, "体温");
		assert_eq!(row.value, "");
		assert_eq!(row.field_type, 0);
		assert!(row.field_items.is_empty());

		let item: FieldItem = serde_json::from_str(r#"{"itemWid":"i1","content":null,"isOtherItems":null,"isSelected":null}"#).unwrap();
		assert_eq!(item.content, "");
		assert_eq!(item.is_selected, None);
	}

	#[test]
	fn task_row_tolerates_nulls() {
		let row: TaskRow = serde_json::from_str(r#"{"wid":"a","formWid":"f","subject":null,"createTime":null,"isHandled":null}"#).unwrap();
		assert_eq!(row.subject, "");
		assert!(!row.handled());
	}

	#[test]
	fn envelope_garbage() {
		assert!(parse_envelope::<Rows<TaskRow>>(b"<html>", "task list").is_err());
	}

	#[test]
	fn form_fields_request_shape() {
		let req = FormFieldsRequest {
			page: PageRequest::default(),
			form_wid: "f",
			collector_wid: "c",
		};
		let value = serde_json::to_value(&req).unwrap();
		assert_eq!(value, serde_json::json!({"pageSize": 10, "pageNumber": 1, "formWid": "f", "collectorWid": "c"}));
	}

	#[test]
	fn empty_area_fields_are_omitted() {
		let value = serde_json::to_value(FieldRow::default()).unwrap();
		assert!(value.get("area1").is_none());
		assert!(value.get("fieldItems").is_some());
	}

	#[test]
	fn filled_form_round_trip() {
		let form = FilledForm {
			form_wid: "f".into(),
			address: "addr".into(),
			collect_wid: "c".into(),
			school_task_wid: "s".into(),
			form: vec![FieldRow {
				title: "当前的状况".into(),
				value: "正常".into(),
				field_items: vec![FieldItem {
					item_wid: "i2".into(),
					content: "正常".into(),
					is_selected: Some(1),
					..Default::default()
				}],
				..Default::default()
			}],
		};
		let json = serde_json::to_string(&form).unwrap();
		let back: FilledForm = serde_json::from_str(&json).unwrap();
		assert_eq!(back, form);
		assert_eq!(back.form[0].value, "正常");
	}
}
