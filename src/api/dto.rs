//! Data Transfer Objects for API requests and responses.
//!
//! Request DTOs accept every field as optional so that missing, `null` and
//! ill-typed values are reported per field by the `validate_*` functions
//! instead of as an opaque body rejection.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{
    DoneEntry, EntryType, FieldError, MAX_TAG_LENGTH, Task, TaskFilter, TaskId, Timestamp, User,
    ValidationError, normalize_tag,
};
use crate::infrastructure::TokenPair;
use crate::service::{
    CreateDoneEntryInput, CreateTaskInput, REQUIRED_MESSAGE, RegisterInput, UpdateDoneEntryInput,
    UpdateTaskInput,
};

const NULL_MESSAGE: &str = "This field may not be null.";
const DATE_FORMAT_MESSAGE: &str =
    "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";
const INTEGER_MESSAGE: &str = "A valid integer is required.";

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, FieldError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| FieldError::new(field, DATE_FORMAT_MESSAGE))
}

/// Parses an optional date where `null` and `""` both mean "no date".
fn parse_optional_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, FieldError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(field, value).map(Some),
    }
}

fn required_text(
    field: &str,
    value: Option<Option<String>>,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match value {
        Some(Some(text)) => Some(text),
        Some(None) => {
            errors.push(FieldError::new(field, NULL_MESSAGE));
            None
        }
        None => None,
    }
}

// =============================================================================
// Task DTOs
// =============================================================================

/// Request DTO for `POST /tasks`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub text: Option<Option<String>>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub scheduled_for: Option<String>,
}

/// Request DTO for `PUT` and `PATCH /tasks/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub text: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub tag: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub scheduled_for: Option<Option<String>>,
    #[serde(default)]
    pub done: Option<bool>,
}

/// Request DTO for `POST /tasks/reorder`.
///
/// Ids are kept as raw JSON so each non-integer entry can be reported.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReorderRequest {
    #[serde(default)]
    pub task_ids: Option<Vec<serde_json::Value>>,
}

/// Query parameters for `GET /tasks`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListQuery {
    pub scheduled_for: Option<String>,
    pub tag: Option<String>,
}

/// Response DTO for a task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskResponse {
    pub id: i64,
    pub text: String,
    pub tag: Option<String>,
    pub done: bool,
    pub order: u32,
    pub scheduled_for: Option<NaiveDate>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.task_id.get(),
            text: task.text.clone(),
            tag: task.tag.as_ref().map(|tag| tag.as_str().to_string()),
            done: task.done,
            order: task.order,
            scheduled_for: task.scheduled_for,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Validates a create request.
///
/// # Errors
///
/// Returns `ValidationError` listing every missing or malformed field.
pub fn validate_create_task(request: CreateTaskRequest) -> Result<CreateTaskInput, ValidationError> {
    let mut errors = Vec::new();

    if request.text.is_none() {
        errors.push(FieldError::new("text", REQUIRED_MESSAGE));
    }
    let text = required_text("text", request.text, &mut errors);
    let scheduled_for = parse_optional_date("scheduled_for", request.scheduled_for.as_deref())
        .unwrap_or_else(|error| {
            errors.push(error);
            None
        });

    ValidationError::new(errors).into_result()?;
    Ok(CreateTaskInput {
        text: text.unwrap_or_default(),
        tag: request.tag,
        scheduled_for,
    })
}

/// Validates an update request. A full update (`PUT`) requires `text`.
///
/// # Errors
///
/// Returns `ValidationError` listing every missing or malformed field.
pub fn validate_update_task(
    request: UpdateTaskRequest,
    full: bool,
) -> Result<UpdateTaskInput, ValidationError> {
    let mut errors = Vec::new();

    if full && request.text.is_none() {
        errors.push(FieldError::new("text", REQUIRED_MESSAGE));
    }
    let text = required_text("text", request.text, &mut errors);

    let scheduled_for = match request.scheduled_for {
        None => None,
        Some(raw) => match parse_optional_date("scheduled_for", raw.as_deref()) {
            Ok(date) => Some(date),
            Err(error) => {
                errors.push(error);
                None
            }
        },
    };

    ValidationError::new(errors).into_result()?;
    Ok(UpdateTaskInput {
        text,
        tag: request.tag,
        scheduled_for,
        done: request.done,
    })
}

/// Validates a reorder request into task ids.
///
/// Accepts JSON integers, integral floats such as `3.0` and strings holding
/// an integer, like the form encodings clients tend to send.
///
/// # Errors
///
/// Returns `ValidationError` if `task_ids` is missing or any element is not an integer.
pub fn validate_reorder(request: ReorderRequest) -> Result<Vec<TaskId>, ValidationError> {
    let Some(values) = request.task_ids else {
        return Err(ValidationError::single("task_ids", REQUIRED_MESSAGE));
    };

    let mut errors = Vec::new();
    let mut ids = Vec::with_capacity(values.len());
    for (index, value) in values.iter().enumerate() {
        match integer_value(value) {
            Some(id) => ids.push(TaskId::new(id)),
            None => errors.push(FieldError::new(format!("task_ids[{index}]"), INTEGER_MESSAGE)),
        }
    }

    ValidationError::new(errors).into_result()?;
    Ok(ids)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integer_value(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0)
                .filter(|float| (i64::MIN as f64..i64::MAX as f64).contains(float))
                .map(|float| float as i64)
        }),
        serde_json::Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Converts list query parameters into a filter; empty values mean "no filter".
///
/// # Errors
///
/// Returns `ValidationError` for a malformed date or an over-long tag.
pub fn validate_task_query(query: &TaskListQuery) -> Result<TaskFilter, ValidationError> {
    let mut errors = Vec::new();

    let scheduled_for = parse_optional_date("scheduled_for", query.scheduled_for.as_deref())
        .unwrap_or_else(|error| {
            errors.push(error);
            None
        });
    let tag = query
        .tag
        .as_deref()
        .map_or(Ok(None), normalize_tag)
        .unwrap_or_else(|_| {
            errors.push(FieldError::new(
                "tag",
                format!("Ensure this field has no more than {MAX_TAG_LENGTH} characters."),
            ));
            None
        });

    ValidationError::new(errors).into_result()?;
    Ok(TaskFilter { scheduled_for, tag })
}

/// Body returned by a successful reorder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Body returned when a reorder names ids the caller does not own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorMessageResponse {
    pub error: String,
}

// =============================================================================
// Done Entry DTOs
// =============================================================================

/// Request DTO for `POST /done-entries`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateDoneEntryRequest {
    #[serde(default)]
    pub entry_date: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub entry_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub text: Option<Option<String>>,
}

/// Request DTO for `PUT` and `PATCH /done-entries/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDoneEntryRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub entry_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub entry_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub text: Option<Option<String>>,
}

/// Query parameters for `GET /done-entries`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoneEntryListQuery {
    pub entry_date: Option<String>,
}

/// Response DTO for a done entry.
#[derive(Debug, Clone, Serialize)]
pub struct DoneEntryResponse {
    pub id: i64,
    pub entry_date: NaiveDate,
    pub entry_type: EntryType,
    pub text: String,
    pub created_at: Timestamp,
}

impl From<&DoneEntry> for DoneEntryResponse {
    fn from(entry: &DoneEntry) -> Self {
        Self {
            id: entry.entry_id.get(),
            entry_date: entry.entry_date,
            entry_type: entry.entry_type,
            text: entry.text.clone(),
            created_at: entry.created_at,
        }
    }
}

fn parse_entry_type(raw: &str, errors: &mut Vec<FieldError>) -> Option<EntryType> {
    raw.parse::<EntryType>()
        .map_err(|error| errors.push(FieldError::new("entry_type", error.to_string())))
        .ok()
}

/// Validates a create request.
///
/// # Errors
///
/// Returns `ValidationError` listing every missing or malformed field.
pub fn validate_create_done_entry(
    request: CreateDoneEntryRequest,
) -> Result<CreateDoneEntryInput, ValidationError> {
    let mut errors = Vec::new();

    let entry_date = parse_optional_date("entry_date", request.entry_date.as_deref())
        .unwrap_or_else(|error| {
            errors.push(error);
            None
        });

    if request.entry_type.is_none() {
        errors.push(FieldError::new("entry_type", REQUIRED_MESSAGE));
    }
    let entry_type = required_text("entry_type", request.entry_type, &mut errors)
        .and_then(|raw| parse_entry_type(&raw, &mut errors));

    if request.text.is_none() {
        errors.push(FieldError::new("text", REQUIRED_MESSAGE));
    }
    let text = required_text("text", request.text, &mut errors);

    ValidationError::new(errors).into_result()?;
    match (entry_type, text) {
        (Some(entry_type), Some(text)) => Ok(CreateDoneEntryInput {
            entry_date,
            entry_type,
            text,
        }),
        _ => Err(ValidationError::single("entry_type", REQUIRED_MESSAGE)),
    }
}

/// Validates an update request. A full update (`PUT`) requires `entry_type` and `text`.
///
/// # Errors
///
/// Returns `ValidationError` listing every missing or malformed field.
pub fn validate_update_done_entry(
    request: UpdateDoneEntryRequest,
    full: bool,
) -> Result<UpdateDoneEntryInput, ValidationError> {
    let mut errors = Vec::new();

    let entry_date = match required_text("entry_date", request.entry_date, &mut errors) {
        None => None,
        Some(raw) => parse_date("entry_date", &raw)
            .map_err(|error| errors.push(error))
            .ok(),
    };

    if full && request.entry_type.is_none() {
        errors.push(FieldError::new("entry_type", REQUIRED_MESSAGE));
    }
    let entry_type = required_text("entry_type", request.entry_type, &mut errors)
        .and_then(|raw| parse_entry_type(&raw, &mut errors));

    if full && request.text.is_none() {
        errors.push(FieldError::new("text", REQUIRED_MESSAGE));
    }
    let text = required_text("text", request.text, &mut errors);

    ValidationError::new(errors).into_result()?;
    Ok(UpdateDoneEntryInput {
        entry_date,
        entry_type,
        text,
    })
}

/// Parses the optional `entry_date` list filter.
///
/// # Errors
///
/// Returns `ValidationError` if the date is not `YYYY-MM-DD`.
pub fn validate_done_entry_query(
    query: &DoneEntryListQuery,
) -> Result<Option<NaiveDate>, ValidationError> {
    parse_optional_date("entry_date", query.entry_date.as_deref())
        .map_err(|error| ValidationError::new(vec![error]))
}

// =============================================================================
// Account DTOs
// =============================================================================

/// Request DTO for `POST /auth/register`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password2: Option<String>,
}

/// Request DTO for `POST /auth/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Request DTO for `POST /auth/refresh`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub date_joined: Timestamp,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id.get(),
            username: user.username.clone(),
            email: user.email.clone(),
            date_joined: user.date_joined,
        }
    }
}

/// Body returned by `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    pub user: UserResponse,
    pub tokens: TokenPair,
}

/// Body returned by `POST /auth/refresh`.
#[derive(Debug, Clone, Serialize)]
pub struct AccessTokenResponse {
    pub access: String,
}

fn require(field: &str, value: Option<String>, errors: &mut Vec<FieldError>) -> String {
    value.unwrap_or_else(|| {
        errors.push(FieldError::new(field, REQUIRED_MESSAGE));
        String::new()
    })
}

/// Validates a registration request.
///
/// # Errors
///
/// Returns `ValidationError` if `username` or `password` is missing.
pub fn validate_register(request: RegisterRequest) -> Result<RegisterInput, ValidationError> {
    let mut errors = Vec::new();
    let username = require("username", request.username, &mut errors);
    let password = require("password", request.password, &mut errors);

    ValidationError::new(errors).into_result()?;
    Ok(RegisterInput {
        username,
        email: request.email,
        password,
        password2: request.password2,
    })
}

/// Validates a login request into `(username, password)`.
///
/// The username is trimmed the same way registration trims it.
///
/// # Errors
///
/// Returns `ValidationError` if either field is missing.
pub fn validate_login(request: LoginRequest) -> Result<(String, String), ValidationError> {
    let mut errors = Vec::new();
    let username = require("username", request.username, &mut errors)
        .trim()
        .to_string();
    let password = require("password", request.password, &mut errors);

    ValidationError::new(errors).into_result()?;
    Ok((username, password))
}

/// Validates a refresh request into the refresh token.
///
/// # Errors
///
/// Returns `ValidationError` if `refresh` is missing.
pub fn validate_refresh(request: RefreshRequest) -> Result<String, ValidationError> {
    request
        .refresh
        .ok_or_else(|| ValidationError::single("refresh", REQUIRED_MESSAGE))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn update_request(body: serde_json::Value) -> UpdateTaskRequest {
        serde_json::from_value(body).unwrap()
    }

    #[rstest]
    fn test_update_request_distinguishes_absent_and_null() {
        let request = update_request(json!({"tag": null}));
        assert_eq!(request.tag, Some(None));
        assert_eq!(request.scheduled_for, None);
        assert_eq!(request.text, None);

        let request = update_request(json!({"scheduled_for": "2024-02-29"}));
        assert_eq!(request.scheduled_for, Some(Some("2024-02-29".to_string())));
    }

    #[rstest]
    fn test_validate_create_task_requires_text() {
        let error = validate_create_task(CreateTaskRequest::default()).unwrap_err();
        assert!(error.has_field("text"));

        let request: CreateTaskRequest = serde_json::from_value(json!({"text": null})).unwrap();
        let error = validate_create_task(request).unwrap_err();
        assert_eq!(error.errors[0].message, NULL_MESSAGE);
    }

    #[rstest]
    #[case(json!({"text": "x", "scheduled_for": "2024-13-01"}), false)]
    #[case(json!({"text": "x", "scheduled_for": "tomorrow"}), false)]
    #[case(json!({"text": "x", "scheduled_for": "2024-01-31"}), true)]
    #[case(json!({"text": "x", "scheduled_for": ""}), true)]
    #[case(json!({"text": "x", "scheduled_for": null}), true)]
    fn test_validate_create_task_scheduled_for(#[case] body: serde_json::Value, #[case] ok: bool) {
        let request: CreateTaskRequest = serde_json::from_value(body).unwrap();
        assert_eq!(validate_create_task(request).is_ok(), ok);
    }

    #[rstest]
    fn test_validate_update_task_full_requires_text() {
        let request = update_request(json!({"done": true}));
        assert!(validate_update_task(request.clone(), false).is_ok());
        assert!(validate_update_task(request, true).unwrap_err().has_field("text"));
    }

    #[rstest]
    fn test_validate_update_task_clears_schedule_with_null() {
        let input = validate_update_task(update_request(json!({"scheduled_for": null})), false)
            .unwrap();
        assert_eq!(input.scheduled_for, Some(None));
    }

    #[rstest]
    fn test_validate_reorder_accepts_integers_and_numeric_strings() {
        let request: ReorderRequest =
            serde_json::from_value(json!({"task_ids": [3, "1", " 2 "]})).unwrap();
        let ids = validate_reorder(request).unwrap();
        assert_eq!(ids, vec![TaskId::new(3), TaskId::new(1), TaskId::new(2)]);
    }

    #[rstest]
    fn test_validate_reorder_accepts_integral_floats() {
        let request: ReorderRequest =
            serde_json::from_value(json!({"task_ids": [3.0, 1, -0.0]})).unwrap();
        let ids = validate_reorder(request).unwrap();
        assert_eq!(ids, vec![TaskId::new(3), TaskId::new(1), TaskId::new(0)]);
    }

    #[rstest]
    fn test_validate_reorder_reports_each_bad_element() {
        let request: ReorderRequest =
            serde_json::from_value(json!({"task_ids": [1, "abc", 2.5, null]})).unwrap();
        let error = validate_reorder(request).unwrap_err();
        let fields: Vec<&str> = error.errors.iter().map(|error| error.field.as_str()).collect();
        assert_eq!(fields, vec!["task_ids[1]", "task_ids[2]", "task_ids[3]"]);
    }

    #[rstest]
    fn test_validate_reorder_requires_list() {
        let error = validate_reorder(ReorderRequest::default()).unwrap_err();
        assert!(error.has_field("task_ids"));
    }

    #[rstest]
    fn test_validate_task_query_normalizes_tag() {
        let filter = validate_task_query(&TaskListQuery {
            scheduled_for: Some(String::new()),
            tag: Some("#Bills".to_string()),
        })
        .unwrap();
        assert_eq!(filter.scheduled_for, None);
        assert_eq!(filter.tag.map(|tag| tag.as_str().to_string()), Some("bills".to_string()));
    }

    #[rstest]
    fn test_validate_create_done_entry_reports_bad_type() {
        let request: CreateDoneEntryRequest =
            serde_json::from_value(json!({"entry_type": "idea", "text": "x"})).unwrap();
        let error = validate_create_done_entry(request).unwrap_err();
        assert_eq!(error.errors[0].field, "entry_type");
        assert_eq!(error.errors[0].message, "\"idea\" is not a valid choice.");
    }

    #[rstest]
    fn test_validate_create_done_entry_lists_missing_fields() {
        let error = validate_create_done_entry(CreateDoneEntryRequest::default()).unwrap_err();
        assert!(error.has_field("entry_type"));
        assert!(error.has_field("text"));
    }

    #[rstest]
    fn test_validate_update_done_entry_put_requires_type_and_text() {
        let request: UpdateDoneEntryRequest =
            serde_json::from_value(json!({"text": "shipped"})).unwrap();
        assert!(validate_update_done_entry(request.clone(), false).is_ok());

        let error = validate_update_done_entry(request, true).unwrap_err();
        assert!(error.has_field("entry_type"));
        assert!(!error.has_field("text"));
    }

    #[rstest]
    #[case(Some(""), Ok(None))]
    #[case(None, Ok(None))]
    #[case(Some("2024-01-01"), Ok(NaiveDate::from_ymd_opt(2024, 1, 1)))]
    fn test_validate_done_entry_query(
        #[case] raw: Option<&str>,
        #[case] expected: Result<Option<NaiveDate>, ValidationError>,
    ) {
        let query = DoneEntryListQuery {
            entry_date: raw.map(str::to_string),
        };
        assert_eq!(validate_done_entry_query(&query), expected);
    }

    #[rstest]
    fn test_validate_done_entry_query_rejects_garbage() {
        let query = DoneEntryListQuery {
            entry_date: Some("01/01/2024".to_string()),
        };
        assert!(validate_done_entry_query(&query)
            .unwrap_err()
            .has_field("entry_date"));
    }

    #[rstest]
    fn test_validate_register_requires_username_and_password() {
        let error = validate_register(RegisterRequest::default()).unwrap_err();
        assert!(error.has_field("username"));
        assert!(error.has_field("password"));
    }

    #[rstest]
    fn test_validate_login_trims_username() {
        let request: LoginRequest =
            serde_json::from_value(json!({"username": " alice\t", "password": " pw "})).unwrap();
        let (username, password) = validate_login(request).unwrap();
        assert_eq!(username, "alice");
        assert_eq!(password, " pw ");
    }

    #[rstest]
    fn test_task_response_serializes_date_and_tag() {
        let task = Task {
            task_id: TaskId::new(5),
            owner: crate::domain::UserId::new(1),
            text: "Pay rent".to_string(),
            tag: Some(crate::domain::Tag::new("bills")),
            scheduled_for: NaiveDate::from_ymd_opt(2024, 3, 1),
            done: false,
            order: 2,
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        };
        let json = serde_json::to_value(TaskResponse::from(&task)).unwrap();
        assert_eq!(json["id"], 5);
        assert_eq!(json["tag"], "bills");
        assert_eq!(json["scheduled_for"], "2024-03-01");
        assert_eq!(json["order"], 2);
    }
}
