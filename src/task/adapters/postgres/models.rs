//! Diesel row models for dispatch persistence.

use super::schema::{customer_meters, sub_task_history_items, sub_task_reports, sub_tasks, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

/// Query result row for tasks.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: i64,
    /// Human-readable code.
    pub code: Option<String>,
    /// Task type code.
    pub task_type: String,
    /// Customer reference.
    pub customer_id: i64,
    /// Lifecycle status.
    pub status: String,
    /// First free-form payload.
    pub data1: Option<String>,
    /// Second free-form payload.
    pub data2: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for tasks; the database assigns the identifier.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Human-readable code.
    pub code: Option<String>,
    /// Task type code.
    pub task_type: String,
    /// Customer reference.
    pub customer_id: i64,
    /// Lifecycle status.
    pub status: String,
    /// First free-form payload.
    pub data1: Option<String>,
    /// Second free-form payload.
    pub data2: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Query result row for sub-tasks.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = sub_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubTaskRow {
    pub id: i64,
    pub uid: Uuid,
    pub task_id: i64,
    pub kind: String,
    pub code: Option<String>,
    pub status: String,
    pub last_field_executor: Option<Value>,
    pub last_field_supervisor: Option<Value>,
    pub last_cgp: Option<Value>,
    pub fix_count: i32,
    pub is_working_finish: bool,
    pub is_verification_success: bool,
    pub is_cgp_verification_success: bool,
    pub last_report: Option<Value>,
    pub last_form_report: Option<Value>,
    pub milestones: Value,
}

/// Insert model for sub-tasks.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sub_tasks)]
pub struct NewSubTaskRow {
    pub uid: Uuid,
    pub task_id: i64,
    pub kind: String,
    pub status: String,
    pub fix_count: i32,
    pub is_working_finish: bool,
    pub is_verification_success: bool,
    pub is_cgp_verification_success: bool,
    pub milestones: Value,
}

/// Changeset writing every mutable sub-task column.
///
/// `None` clears the column.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = sub_tasks)]
#[diesel(treat_none_as_null = true)]
pub struct SubTaskChangeset {
    pub code: Option<String>,
    pub status: String,
    pub last_field_executor: Option<Value>,
    pub last_field_supervisor: Option<Value>,
    pub last_cgp: Option<Value>,
    pub fix_count: i32,
    pub is_working_finish: bool,
    pub is_verification_success: bool,
    pub is_cgp_verification_success: bool,
    pub last_report: Option<Value>,
    pub last_form_report: Option<Value>,
    pub milestones: Value,
}

/// Query result row for reports.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = sub_task_reports)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubTaskReportRow {
    pub id: i64,
    pub uid: Uuid,
    pub code: Option<String>,
    pub sub_task_id: i64,
    pub sub_task_uid: Uuid,
    pub status: String,
    pub at: DateTime<Utc>,
    pub actor: Value,
    pub phone_number: Option<String>,
    pub organization: Option<Value>,
    pub payload: Value,
}

/// Insert model for reports.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sub_task_reports)]
pub struct NewSubTaskReportRow {
    pub uid: Uuid,
    pub sub_task_id: i64,
    pub sub_task_uid: Uuid,
    pub status: String,
    pub at: DateTime<Utc>,
    pub actor: Value,
    pub phone_number: Option<String>,
    pub organization: Option<Value>,
    pub payload: Value,
}

/// Insert model for history rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sub_task_history_items)]
pub struct NewSubTaskHistoryRow {
    pub sub_task_id: i64,
    pub from_status: String,
    pub to_status: String,
    pub at: DateTime<Utc>,
    pub actor: Value,
    pub organization: Option<Value>,
    pub operation: String,
    pub report: Option<Value>,
}

/// Row for customer meter records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = customer_meters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerMeterRow {
    pub customer_id: i64,
    pub meter: Value,
}
