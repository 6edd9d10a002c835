//! Immutable sub-task reports and their free-form payloads.

use super::{
    ActorSnapshot, OrganizationSnapshot, ReportRef, SubTaskId, SubTaskReportId, SubTaskStatus,
    TaskDomainError,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Free-form structured data attached to a report.
///
/// The shape depends on the sub-task type; the engine reads only the few
/// fields needed for customer meter synthesis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportPayload(Map<String, Value>);

impl ReportPayload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates that a JSON value is an object and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::PayloadNotObject`] for any other JSON type.
    pub fn from_value(value: Value) -> Result<Self, TaskDomainError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(TaskDomainError::PayloadNotObject),
        }
    }

    /// Adds a field, replacing any previous value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns the raw value of a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `true` when the payload holds no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the payload as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Reads an integer field given as a JSON number or a numeric string.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when the field is absent or not integral.
    pub fn require_i64(&self, field: &'static str) -> Result<i64, TaskDomainError> {
        let value = self.require(field)?;
        let parsed = match value {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| invalid(field, "expected an integer"))
    }

    /// Reads a floating-point field.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when the field is absent or not a number.
    pub fn require_f64(&self, field: &'static str) -> Result<f64, TaskDomainError> {
        self.require(field)?
            .as_f64()
            .ok_or_else(|| invalid(field, "expected a number"))
    }

    /// Reads a string field.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when the field is absent or not a string.
    pub fn require_str(&self, field: &'static str) -> Result<&str, TaskDomainError> {
        self.require(field)?
            .as_str()
            .ok_or_else(|| invalid(field, "expected a string"))
    }

    /// Reads an RFC 3339 timestamp field and keeps its calendar date.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when the field is absent or unparsable.
    pub fn require_date(&self, field: &'static str) -> Result<NaiveDate, TaskDomainError> {
        let text = self.require_str(field)?;
        DateTime::parse_from_rfc3339(text)
            .map(|timestamp| timestamp.date_naive())
            .map_err(|err| invalid(field, &err.to_string()))
    }

    fn require(&self, field: &'static str) -> Result<&Value, TaskDomainError> {
        self.0
            .get(field)
            .filter(|value| !value.is_null())
            .ok_or(TaskDomainError::MissingReportField(field))
    }
}

fn invalid(field: &'static str, reason: &str) -> TaskDomainError {
    TaskDomainError::InvalidReportField {
        field,
        reason: reason.to_owned(),
    }
}

/// Values for inserting a report; the store assigns id and uid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubTaskReport {
    /// Sub-task the report belongs to.
    pub sub_task_id: SubTaskId,
    /// Denormalized sub-task uid.
    pub sub_task_uid: Uuid,
    /// Status being entered by the transition.
    pub status: SubTaskStatus,
    /// Caller-supplied transition time.
    pub at: DateTime<Utc>,
    /// Identity of the reporting actor.
    pub actor: ActorSnapshot,
    /// Contact number of the reporting actor.
    pub phone_number: Option<String>,
    /// Organization of the reporting actor.
    pub organization: Option<OrganizationSnapshot>,
    /// Free-form report data.
    pub payload: ReportPayload,
}

impl NewSubTaskReport {
    /// Materializes the stored report once identifiers are assigned.
    #[must_use]
    pub fn into_report(self, id: SubTaskReportId, uid: Uuid) -> SubTaskReport {
        SubTaskReport {
            id,
            uid,
            code: None,
            sub_task_id: self.sub_task_id,
            sub_task_uid: self.sub_task_uid,
            status: self.status,
            at: self.at,
            actor: self.actor,
            phone_number: self.phone_number,
            organization: self.organization,
            payload: self.payload,
        }
    }
}

/// Stored report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTaskReport {
    /// Report identifier.
    pub id: SubTaskReportId,
    /// Report uid.
    pub uid: Uuid,
    /// Human-readable code assigned right after insertion.
    pub code: Option<String>,
    /// Sub-task the report belongs to.
    pub sub_task_id: SubTaskId,
    /// Denormalized sub-task uid.
    pub sub_task_uid: Uuid,
    /// Status entered by the transition.
    pub status: SubTaskStatus,
    /// Caller-supplied transition time.
    pub at: DateTime<Utc>,
    /// Identity of the reporting actor.
    pub actor: ActorSnapshot,
    /// Contact number of the reporting actor.
    pub phone_number: Option<String>,
    /// Organization of the reporting actor.
    pub organization: Option<OrganizationSnapshot>,
    /// Free-form report data.
    pub payload: ReportPayload,
}

impl SubTaskReport {
    /// Returns the back-reference stored on sub-tasks and history rows.
    #[must_use]
    pub const fn reference(&self) -> ReportRef {
        ReportRef {
            id: self.id,
            uid: self.uid,
        }
    }
}

/// Builds the human-readable report code: zero-padded id followed by the
/// report date as `yyyymmdd`.
#[must_use]
pub fn report_code(id: SubTaskReportId, at: DateTime<Utc>) -> String {
    format!("{:04}{}", id.value(), at.format("%Y%m%d"))
}
