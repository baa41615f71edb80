use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub type BoardId = String;
pub type ColumnId = String;
pub type TaskId = String;
pub type UserId = String;

/// Viewer name used when no user is configured.
pub const ANONYMOUS_USER: &str = "anonymous";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KanbanBoard {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: BoardId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_ids")]
    pub column_ids: Vec<ColumnId>,
    /// Display order of the board's columns. The only source of column order.
    #[serde(default, deserialize_with = "deserialize_ids")]
    pub ordered: Vec<ColumnId>,
    #[serde(default, deserialize_with = "deserialize_ids")]
    pub users_ids: Vec<UserId>,
    /// Fields this crate doesn't model, sent back unchanged on PUT.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KanbanColumn {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: ColumnId,
    #[serde(deserialize_with = "deserialize_id")]
    pub board_id: BoardId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub archived: bool,
    /// Display order of the column's tasks. A task id lives in at most one column.
    #[serde(default, deserialize_with = "deserialize_ids")]
    pub task_ids: Vec<TaskId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Task priority. Values outside the known three are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
    Other(String),
}

impl From<String> for Priority {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "baixa" => Priority::Low,
            "média" => Priority::Medium,
            "alta" => Priority::High,
            _ => Priority::Other(raw),
        }
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Low => "baixa".to_string(),
            Priority::Medium => "média".to_string(),
            Priority::High => "alta".to_string(),
            Priority::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignee {
    #[serde(deserialize_with = "deserialize_id")]
    pub user_id: UserId,
}

/// A task. Only `id` and `archived` matter to ordering and assembly; the rest
/// is carried through untouched, so a malformed payload field degrades to its
/// default instead of rejecting the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KanbanTask {
    #[serde(rename = "_id", deserialize_with = "deserialize_id")]
    pub id: TaskId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub archived: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: Priority,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub categories: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_lenient_date"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_id"
    )]
    pub user_id: Option<UserId>,
    #[serde(
        rename = "assignee",
        alias = "assignees",
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub assignees: Vec<Assignee>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `POST /tasks`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub name: String,
    pub archived: bool,
    pub priority: Priority,
    pub categories: Vec<String>,
    pub description: String,
    #[serde(rename = "assignee")]
    pub assignees: Vec<Assignee>,
    pub due_date: DateTime<Utc>,
    pub user_id: UserId,
}

impl NewTask {
    /// A fresh task with the quick-add defaults: lowest priority, no
    /// categories or assignees, placeholder description, due now.
    pub fn named(name: &str, user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            name: name.trim().to_string(),
            archived: false,
            priority: Priority::Low,
            categories: Vec::new(),
            description: "...".to_string(),
            assignees: Vec::new(),
            due_date: now,
            user_id: user_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", deserialize_with = "deserialize_id")]
    pub id: UserId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub permissions: Role,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_lenient_date"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_lenient_date"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id", deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub user_id: Option<UserId>,
    /// Whether the notification has been seen.
    #[serde(default, deserialize_with = "null_as_default")]
    pub view: bool,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub task_id: Option<TaskId>,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub assignee: Vec<Assignee>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: Priority,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_lenient_date"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_lenient_date"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Notification {
    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        self.assignee.iter().any(|a| a.user_id == user_id)
    }
}

/// The API hands out ids as strings or numbers; both become `String`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Signed(n) => n.to_string(),
            RawId::Unsigned(n) => n.to_string(),
        }
    }
}

fn deserialize_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(RawId::deserialize(d)?.into())
}

fn deserialize_optional_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(d)?.map(Into::into))
}

fn deserialize_ids<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let raw = Option::<Vec<RawId>>::deserialize(d)?;
    Ok(raw.unwrap_or_default().into_iter().map(Into::into).collect())
}

/// `null` reads as the field's default.
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Dates arrive as RFC 3339, as local `YYYY-MM-DDTHH:MM:SS`, as a bare
/// `YYYY-MM-DD`, or as epoch milliseconds. Anything else reads as no date.
fn deserialize_lenient_date<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let parsed = match Value::deserialize(d)? {
        Value::String(s) => parse_date(&s),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    };
    Ok(parsed)
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc()),
        Err(_) => {
            log::debug!(target: "kanban.types", "Unreadable date {:?}", raw);
            None
        }
    }
}
