use crate::error::app_error::AppError;
use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use serde::Deserializer;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

pub const DEFAULT_TICKET_LIMIT: i64 = 100;
pub const MAX_TICKET_LIMIT: i64 = 500;

pub const SUMMARY_REQUIRED: &str = "summary required";
pub const INVALID_STATUS: &str = "invalid status";
pub const INVALID_ASSIGNEE_TYPE: &str = r#"assigned_to_type must be "bot" or "human""#;
pub const INVALID_ASSIGNEE_ID: &str = "assigned_to_user_id must be a user id";
pub const TICKET_NOT_FOUND: &str = "ticket not found";

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }
}

impl FromStr for TicketStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "open" => Ok(TicketStatus::Open),
            "in_progress" => Ok(TicketStatus::InProgress),
            "resolved" => Ok(TicketStatus::Resolved),
            "closed" => Ok(TicketStatus::Closed),
            _ => Err(AppError::BadRequest(INVALID_STATUS.to_string())),
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is in charge of a ticket: the automated agent or a person.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssigneeType {
    #[default]
    Bot,
    Human,
}

impl AssigneeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssigneeType::Bot => "bot",
            AssigneeType::Human => "human",
        }
    }
}

impl FromStr for AssigneeType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "bot" => Ok(AssigneeType::Bot),
            "human" => Ok(AssigneeType::Human),
            _ => Err(AppError::BadRequest(INVALID_ASSIGNEE_TYPE.to_string())),
        }
    }
}

#[derive(Serialize, Debug, Clone, JsonSchema)]
pub struct Ticket {
    pub id: i64,
    pub external_id: Option<String>,
    pub customer_phone: Option<String>,
    pub order_number: Option<String>,
    pub summary: String,
    pub status: TicketStatus,
    pub assigned_to_type: AssigneeType,
    pub assigned_to_user_id: Option<i64>,
    pub assigned_to_name: Option<String>,
    pub assigned_to_email: Option<String>,
    pub created_by_user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ticket as read from either backend; enums are stored as text.
#[derive(Debug, sqlx::FromRow)]
pub struct TicketRow {
    pub id: i64,
    pub external_id: Option<String>,
    pub customer_phone: Option<String>,
    pub order_number: Option<String>,
    pub summary: String,
    pub status: String,
    pub assigned_to_type: String,
    pub assigned_to_user_id: Option<i64>,
    pub assigned_to_name: Option<String>,
    pub assigned_to_email: Option<String>,
    pub created_by_user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = AppError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<TicketStatus>()
            .map_err(|_| AppError::InvalidRow(format!("ticket {} has unknown status '{}'", row.id, row.status)))?;
        let assigned_to_type = row
            .assigned_to_type
            .parse::<AssigneeType>()
            .map_err(|_| AppError::InvalidRow(format!("ticket {} has unknown assignee type '{}'", row.id, row.assigned_to_type)))?;

        // Only human assignments carry a user and the joined display fields.
        let human = assigned_to_type == AssigneeType::Human;

        Ok(Ticket {
            id: row.id,
            external_id: row.external_id,
            customer_phone: row.customer_phone,
            order_number: row.order_number,
            summary: row.summary,
            status,
            assigned_to_type,
            assigned_to_user_id: row.assigned_to_user_id.filter(|_| human),
            assigned_to_name: row.assigned_to_name.filter(|_| human),
            assigned_to_email: row.assigned_to_email.filter(|_| human),
            created_by_user_id: row.created_by_user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Reads a text field, treating any other JSON type as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        _ => None,
    })
}

#[derive(Deserialize, Debug, Default, Validate, JsonSchema)]
pub struct CreateTicketRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    #[validate(length(max = 2000))]
    pub summary: Option<String>,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub customer_phone: Option<String>,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub order_number: Option<String>,
    #[serde(default)]
    #[validate(length(max = 128))]
    pub external_id: Option<String>,
}

/// A validated ticket ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub summary: String,
    pub customer_phone: Option<String>,
    pub order_number: Option<String>,
    pub external_id: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl CreateTicketRequest {
    pub fn into_new_ticket(self) -> Result<NewTicket, AppError> {
        self.validate()?;

        let summary = non_blank(self.summary).ok_or_else(|| AppError::BadRequest(SUMMARY_REQUIRED.to_string()))?;

        Ok(NewTicket {
            summary,
            customer_phone: non_blank(self.customer_phone),
            order_number: non_blank(self.order_number),
            external_id: non_blank(self.external_id),
        })
    }
}

#[derive(Deserialize, Debug, Default, JsonSchema)]
pub struct AssignTicketRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub assigned_to_type: Option<String>,
    /// A user id, as a number or a numeric string.
    #[serde(default)]
    pub assigned_to_user_id: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub assignee_type: AssigneeType,
    pub user_id: Option<i64>,
}

impl AssignTicketRequest {
    pub fn assignment(&self) -> Result<Assignment, AppError> {
        let assignee_type = self
            .assigned_to_type
            .as_deref()
            .ok_or_else(|| AppError::BadRequest(INVALID_ASSIGNEE_TYPE.to_string()))?
            .parse::<AssigneeType>()?;

        let user_id = match assignee_type {
            AssigneeType::Bot => None,
            AssigneeType::Human => parse_user_reference(self.assigned_to_user_id.as_ref())?,
        };

        Ok(Assignment { assignee_type, user_id })
    }
}

fn parse_user_reference(value: Option<&Value>) -> Result<Option<i64>, AppError> {
    let invalid = || AppError::BadRequest(INVALID_ASSIGNEE_ID.to_string());

    let id = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(number)) => number.as_i64().ok_or_else(invalid)?,
        Some(Value::String(text)) if text.trim().is_empty() => return Ok(None),
        Some(Value::String(text)) => text.trim().parse::<i64>().map_err(|_| invalid())?,
        Some(_) => return Err(invalid()),
    };

    match id {
        0 => Ok(None),
        id if id > 0 => Ok(Some(id)),
        _ => Err(invalid()),
    }
}

#[derive(Deserialize, Debug, Default, JsonSchema)]
pub struct UpdateTicketStatusRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub status: Option<String>,
}

impl UpdateTicketStatusRequest {
    pub fn status(&self) -> Result<TicketStatus, AppError> {
        self.status
            .as_deref()
            .ok_or_else(|| AppError::BadRequest(INVALID_STATUS.to_string()))?
            .parse()
    }
}

/// Unknown and non-numeric ids are both reported as a missing ticket.
#[allow(clippy::result_large_err)]
pub fn parse_ticket_id(id: &str) -> Result<i64, AppError> {
    id.trim().parse::<i64>().map_err(|_| AppError::NotFound(TICKET_NOT_FOUND.to_string()))
}

pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_TICKET_LIMIT).clamp(1, MAX_TICKET_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assign(body: Value) -> Result<Assignment, AppError> {
        serde_json::from_value::<AssignTicketRequest>(body).unwrap().assignment()
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [TicketStatus::Open, TicketStatus::InProgress, TicketStatus::Resolved, TicketStatus::Closed] {
            assert_eq!(status.as_str().parse::<TicketStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result = UpdateTicketStatusRequest {
            status: Some("archived".to_string()),
        }
        .status();
        assert!(matches!(result, Err(AppError::BadRequest(ref message)) if message == INVALID_STATUS));

        let missing = UpdateTicketStatusRequest::default().status();
        assert!(matches!(missing, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn bot_assignment_drops_user() {
        let assignment = assign(json!({"assigned_to_type": "bot", "assigned_to_user_id": 7})).unwrap();
        assert_eq!(assignment.assignee_type, AssigneeType::Bot);
        assert_eq!(assignment.user_id, None);
    }

    #[test]
    fn human_assignment_accepts_numbers_and_numeric_strings() {
        assert_eq!(assign(json!({"assigned_to_type": "human", "assigned_to_user_id": 7})).unwrap().user_id, Some(7));
        assert_eq!(assign(json!({"assigned_to_type": "human", "assigned_to_user_id": " 12 "})).unwrap().user_id, Some(12));
        assert_eq!(assign(json!({"assigned_to_type": "human"})).unwrap().user_id, None);
        assert_eq!(assign(json!({"assigned_to_type": "human", "assigned_to_user_id": ""})).unwrap().user_id, None);
    }

    #[test]
    fn human_assignment_rejects_garbage_ids() {
        assert!(assign(json!({"assigned_to_type": "human", "assigned_to_user_id": "abc"})).is_err());
        assert!(assign(json!({"assigned_to_type": "human", "assigned_to_user_id": -3})).is_err());
        assert!(assign(json!({"assigned_to_type": "human", "assigned_to_user_id": [1]})).is_err());
    }

    #[test]
    fn assignment_requires_known_type() {
        let result = assign(json!({"assigned_to_type": "robot"}));
        assert!(matches!(result, Err(AppError::BadRequest(ref message)) if message == INVALID_ASSIGNEE_TYPE));
        assert!(assign(json!({})).is_err());
    }

    #[test]
    fn create_request_requires_summary() {
        let result = CreateTicketRequest {
            summary: Some("   ".to_string()),
            ..CreateTicketRequest::default()
        }
        .into_new_ticket();
        assert!(matches!(result, Err(AppError::BadRequest(ref message)) if message == SUMMARY_REQUIRED));
    }

    #[test]
    fn create_request_trims_and_drops_blank_fields() {
        let ticket = CreateTicketRequest {
            summary: Some(" Customer wants refund ".to_string()),
            customer_phone: Some("".to_string()),
            order_number: Some("SGF1991".to_string()),
            external_id: None,
        }
        .into_new_ticket()
        .unwrap();

        assert_eq!(ticket.summary, "Customer wants refund");
        assert_eq!(ticket.customer_phone, None);
        assert_eq!(ticket.order_number.as_deref(), Some("SGF1991"));
    }

    #[test]
    fn non_text_fields_read_as_missing() {
        let status: UpdateTicketStatusRequest = serde_json::from_value(json!({"status": 5})).unwrap();
        assert!(matches!(status.status(), Err(AppError::BadRequest(ref message)) if message == INVALID_STATUS));

        let result = assign(json!({"assigned_to_type": 1}));
        assert!(matches!(result, Err(AppError::BadRequest(ref message)) if message == INVALID_ASSIGNEE_TYPE));

        let create: CreateTicketRequest = serde_json::from_value(json!({"summary": ["refund"]})).unwrap();
        assert!(matches!(create.into_new_ticket(), Err(AppError::BadRequest(ref message)) if message == SUMMARY_REQUIRED));
    }

    #[test]
    fn create_request_enforces_length_limits() {
        let result = CreateTicketRequest {
            summary: Some("x".repeat(2001)),
            ..CreateTicketRequest::default()
        }
        .into_new_ticket();
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn ticket_ids_must_be_numeric() {
        assert_eq!(parse_ticket_id("5").unwrap(), 5);
        assert!(matches!(parse_ticket_id("five"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(None), DEFAULT_TICKET_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(10_000)), MAX_TICKET_LIMIT);
    }

    #[test]
    fn bot_rows_never_expose_a_user() {
        let now = Utc::now();
        let row = TicketRow {
            id: 1,
            external_id: None,
            customer_phone: None,
            order_number: None,
            summary: "Where is my order?".to_string(),
            status: "open".to_string(),
            assigned_to_type: "bot".to_string(),
            assigned_to_user_id: Some(3),
            assigned_to_name: Some("Alice".to_string()),
            assigned_to_email: None,
            created_by_user_id: Some(3),
            created_at: now,
            updated_at: now,
        };

        let ticket = Ticket::try_from(row).unwrap();
        assert_eq!(ticket.assigned_to_user_id, None);
        assert_eq!(ticket.assigned_to_name, None);
    }

    #[test]
    fn rows_with_unknown_status_are_rejected() {
        let now = Utc::now();
        let row = TicketRow {
            id: 9,
            external_id: None,
            customer_phone: None,
            order_number: None,
            summary: "legacy".to_string(),
            status: "archived".to_string(),
            assigned_to_type: "bot".to_string(),
            assigned_to_user_id: None,
            assigned_to_name: None,
            assigned_to_email: None,
            created_by_user_id: None,
            created_at: now,
            updated_at: now,
        };

        assert!(matches!(Ticket::try_from(row), Err(AppError::InvalidRow(_))));
    }
}
