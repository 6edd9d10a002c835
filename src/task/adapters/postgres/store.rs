//! `PostgreSQL` dispatch store.

use super::{
    models::{
        CustomerMeterRow, NewSubTaskHistoryRow, NewSubTaskReportRow, NewSubTaskRow, NewTaskRow,
        SubTaskChangeset, SubTaskReportRow, SubTaskRow, TaskRow,
    },
    schema::{customer_meters, sub_task_history_items, sub_task_reports, sub_tasks, tasks},
};
use crate::task::{
    domain::{
        CustomerId, CustomerMeter, CustomerMeterPatch, NewSubTask, NewSubTaskHistoryItem,
        NewSubTaskReport, NewTask, PersistedTaskData, SubTask, SubTaskHistoryItemId, SubTaskId,
        SubTaskKind, SubTaskMilestones, SubTaskReport, SubTaskReportId, SubTaskStatus, Task,
        TaskId, TaskStatus, TaskType,
    },
    ports::{DispatchTransaction, IsolationLevel, StoreError, StoreResult, TransactionRunner},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::upsert::excluded;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

/// `PostgreSQL` connection pool type used by dispatch adapters.
pub type DispatchPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed dispatch store.
#[derive(Debug, Clone)]
pub struct PostgresDispatchStore {
    pool: DispatchPgPool,
}

impl PostgresDispatchStore {
    /// Creates a store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: DispatchPgPool) -> Self {
        Self { pool }
    }
}

/// Failure inside a Diesel transaction closure.
enum TxFailure<E> {
    Work(E),
    Database(DieselError),
}

impl<E> From<DieselError> for TxFailure<E> {
    fn from(err: DieselError) -> Self {
        Self::Database(err)
    }
}

#[async_trait]
impl TransactionRunner for PostgresDispatchStore {
    async fn run_in_transaction<T, E, F>(&self, isolation: IsolationLevel, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn DispatchTransaction) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(StoreError::persistence)?;
            let mut transaction = match isolation {
                IsolationLevel::Serializable => connection.build_transaction().serializable(),
                IsolationLevel::ReadCommitted => connection.build_transaction().read_committed(),
            };
            transaction
                .run(|conn| {
                    work(&mut PgDispatchTransaction { connection: conn }).map_err(TxFailure::Work)
                })
                .map_err(|failure| match failure {
                    TxFailure::Work(err) => err,
                    TxFailure::Database(err) => E::from(database_error(err)),
                })
        })
        .await
        .map_err(StoreError::persistence)?
    }

    async fn read_sub_task(&self, id: SubTaskId) -> StoreResult<Option<SubTask>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(StoreError::persistence)?;
            sub_tasks::table
                .find(id.value())
                .select(SubTaskRow::as_select())
                .first(&mut connection)
                .optional()
                .map_err(database_error)?
                .map(row_to_sub_task)
                .transpose()
        })
        .await
        .map_err(StoreError::persistence)?
    }
}

/// Maps a Diesel error; SQLSTATE 40001 becomes
/// [`StoreError::SerializationConflict`].
fn database_error(err: DieselError) -> StoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
            StoreError::SerializationConflict
        }
        other => StoreError::persistence(other),
    }
}

struct PgDispatchTransaction<'a> {
    connection: &'a mut PgConnection,
}

impl DispatchTransaction for PgDispatchTransaction<'_> {
    fn find_task(&mut self, id: TaskId) -> StoreResult<Option<Task>> {
        tasks::table
            .find(id.value())
            .select(TaskRow::as_select())
            .first(self.connection)
            .optional()
            .map_err(database_error)?
            .map(row_to_task)
            .transpose()
    }

    fn find_task_by_code(&mut self, code: &str) -> StoreResult<Option<Task>> {
        tasks::table
            .filter(tasks::code.eq(code))
            .select(TaskRow::as_select())
            .first(self.connection)
            .optional()
            .map_err(database_error)?
            .map(row_to_task)
            .transpose()
    }

    fn insert_task(&mut self, task: NewTask) -> StoreResult<Task> {
        let code = task.code.clone();
        if let Some(existing) = code.as_deref() {
            if self.find_task_by_code(existing)?.is_some() {
                return Err(StoreError::DuplicateTaskCode(existing.to_owned()));
            }
        }
        let row = NewTaskRow {
            code: task.code,
            task_type: task.task_type.code().to_owned(),
            customer_id: task.customer_id.value(),
            status: task.status.as_str().to_owned(),
            data1: task.data1,
            data2: task.data2,
            created_at: task.created_at,
        };
        let inserted = diesel::insert_into(tasks::table)
            .values(&row)
            .returning(TaskRow::as_returning())
            .get_result(self.connection)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    StoreError::DuplicateTaskCode(code.clone().unwrap_or_default())
                }
                _ => database_error(err),
            })?;
        row_to_task(inserted)
    }

    fn update_task_status(&mut self, id: TaskId, status: TaskStatus) -> StoreResult<()> {
        let updated = diesel::update(tasks::table.find(id.value()))
            .set(tasks::status.eq(status.as_str()))
            .execute(self.connection)
            .map_err(database_error)?;
        if updated == 0 {
            return Err(StoreError::TaskNotFound(id));
        }
        Ok(())
    }

    fn insert_sub_task(&mut self, sub_task: NewSubTask) -> StoreResult<SubTask> {
        let row = NewSubTaskRow {
            uid: Uuid::new_v4(),
            task_id: sub_task.task_id.value(),
            kind: sub_task.kind.full_code().to_owned(),
            status: sub_task.status.as_str().to_owned(),
            fix_count: 0,
            is_working_finish: false,
            is_verification_success: false,
            is_cgp_verification_success: false,
            milestones: encode(&SubTaskMilestones::default())?,
        };
        let inserted = diesel::insert_into(sub_tasks::table)
            .values(&row)
            .returning(SubTaskRow::as_returning())
            .get_result(self.connection)
            .map_err(database_error)?;
        row_to_sub_task(inserted)
    }

    fn find_sub_task(&mut self, id: SubTaskId) -> StoreResult<Option<SubTask>> {
        sub_tasks::table
            .find(id.value())
            .select(SubTaskRow::as_select())
            .first(self.connection)
            .optional()
            .map_err(database_error)?
            .map(row_to_sub_task)
            .transpose()
    }

    fn lock_sub_task(
        &mut self,
        id: SubTaskId,
        allowed: Option<&[SubTaskStatus]>,
    ) -> StoreResult<Option<SubTask>> {
        let row = match allowed {
            Some(statuses) => {
                let codes: Vec<&str> = statuses.iter().copied().map(SubTaskStatus::as_str).collect();
                sub_tasks::table
                    .filter(sub_tasks::id.eq(id.value()))
                    .filter(sub_tasks::status.eq_any(codes))
                    .select(SubTaskRow::as_select())
                    .for_update()
                    .first(self.connection)
                    .optional()
            }
            None => sub_tasks::table
                .filter(sub_tasks::id.eq(id.value()))
                .select(SubTaskRow::as_select())
                .for_update()
                .first(self.connection)
                .optional(),
        };
        row.map_err(database_error)?
            .map(row_to_sub_task)
            .transpose()
    }

    fn find_sub_task_by_kind(
        &mut self,
        task_id: TaskId,
        kind: SubTaskKind,
    ) -> StoreResult<Option<SubTask>> {
        sub_tasks::table
            .filter(sub_tasks::task_id.eq(task_id.value()))
            .filter(sub_tasks::kind.eq(kind.full_code()))
            .order(sub_tasks::id.asc())
            .select(SubTaskRow::as_select())
            .first(self.connection)
            .optional()
            .map_err(database_error)?
            .map(row_to_sub_task)
            .transpose()
    }

    fn list_sub_tasks(&mut self, task_id: TaskId) -> StoreResult<Vec<SubTask>> {
        sub_tasks::table
            .filter(sub_tasks::task_id.eq(task_id.value()))
            .order(sub_tasks::id.asc())
            .select(SubTaskRow::as_select())
            .load(self.connection)
            .map_err(database_error)?
            .into_iter()
            .map(row_to_sub_task)
            .collect()
    }

    fn update_sub_task(&mut self, sub_task: &SubTask) -> StoreResult<()> {
        let changes = to_changeset(sub_task)?;
        let updated = diesel::update(sub_tasks::table.find(sub_task.id.value()))
            .set(&changes)
            .execute(self.connection)
            .map_err(database_error)?;
        if updated == 0 {
            return Err(StoreError::SubTaskNotFound(sub_task.id));
        }
        Ok(())
    }

    fn set_sub_task_status(&mut self, id: SubTaskId, status: SubTaskStatus) -> StoreResult<()> {
        let updated = diesel::update(sub_tasks::table.find(id.value()))
            .set(sub_tasks::status.eq(status.as_str()))
            .execute(self.connection)
            .map_err(database_error)?;
        if updated == 0 {
            return Err(StoreError::SubTaskNotFound(id));
        }
        Ok(())
    }

    fn insert_report(&mut self, report: NewSubTaskReport) -> StoreResult<SubTaskReportId> {
        let row = NewSubTaskReportRow {
            uid: Uuid::new_v4(),
            sub_task_id: report.sub_task_id.value(),
            sub_task_uid: report.sub_task_uid,
            status: report.status.as_str().to_owned(),
            at: report.at,
            actor: encode(&report.actor)?,
            phone_number: report.phone_number,
            organization: encode_optional(report.organization.as_ref())?,
            payload: report.payload.to_value(),
        };
        let id = diesel::insert_into(sub_task_reports::table)
            .values(&row)
            .returning(sub_task_reports::id)
            .get_result::<i64>(self.connection)
            .map_err(database_error)?;
        Ok(SubTaskReportId::new(id))
    }

    fn set_report_code(&mut self, id: SubTaskReportId, code: &str) -> StoreResult<()> {
        let updated = diesel::update(sub_task_reports::table.find(id.value()))
            .set(sub_task_reports::code.eq(code))
            .execute(self.connection)
            .map_err(database_error)?;
        if updated == 0 {
            return Err(StoreError::ReportNotFound(id));
        }
        Ok(())
    }

    fn find_report(&mut self, id: SubTaskReportId) -> StoreResult<Option<SubTaskReport>> {
        sub_task_reports::table
            .find(id.value())
            .select(SubTaskReportRow::as_select())
            .first(self.connection)
            .optional()
            .map_err(database_error)?
            .map(row_to_report)
            .transpose()
    }

    fn insert_history_item(
        &mut self,
        item: NewSubTaskHistoryItem,
    ) -> StoreResult<SubTaskHistoryItemId> {
        let row = NewSubTaskHistoryRow {
            sub_task_id: item.sub_task_id.value(),
            from_status: item.from_status.as_str().to_owned(),
            to_status: item.to_status.as_str().to_owned(),
            at: item.at,
            actor: encode(&item.actor)?,
            organization: encode_optional(item.organization.as_ref())?,
            operation: item.operation.as_str().to_owned(),
            report: encode_optional(item.report.as_ref())?,
        };
        let id = diesel::insert_into(sub_task_history_items::table)
            .values(&row)
            .returning(sub_task_history_items::id)
            .get_result::<i64>(self.connection)
            .map_err(database_error)?;
        Ok(SubTaskHistoryItemId::new(id))
    }

    fn upsert_customer_meter(
        &mut self,
        customer_id: CustomerId,
        patch: &CustomerMeterPatch,
    ) -> StoreResult<()> {
        let existing = customer_meters::table
            .find(customer_id.value())
            .select(CustomerMeterRow::as_select())
            .for_update()
            .first(self.connection)
            .optional()
            .map_err(database_error)?;
        let mut meter = existing
            .map(|row| decode::<CustomerMeter>(row.meter))
            .transpose()?
            .unwrap_or_else(|| CustomerMeter::empty(customer_id));
        meter.apply(patch);

        let row = CustomerMeterRow {
            customer_id: customer_id.value(),
            meter: encode(&meter)?,
        };
        diesel::insert_into(customer_meters::table)
            .values(&row)
            .on_conflict(customer_meters::customer_id)
            .do_update()
            .set(customer_meters::meter.eq(excluded(customer_meters::meter)))
            .execute(self.connection)
            .map_err(database_error)?;
        Ok(())
    }
}

fn encode<T: Serialize>(value: &T) -> StoreResult<Value> {
    serde_json::to_value(value).map_err(StoreError::persistence)
}

fn encode_optional<T: Serialize>(value: Option<&T>) -> StoreResult<Option<Value>> {
    value.map(encode).transpose()
}

fn decode<T: DeserializeOwned>(value: Value) -> StoreResult<T> {
    serde_json::from_value(value).map_err(StoreError::persistence)
}

fn decode_optional<T: DeserializeOwned>(value: Option<Value>) -> StoreResult<Option<T>> {
    value.map(decode).transpose()
}

fn row_to_task(row: TaskRow) -> StoreResult<Task> {
    let task_type = TaskType::try_from(row.task_type.as_str()).map_err(StoreError::persistence)?;
    let status = TaskStatus::try_from(row.status.as_str()).map_err(StoreError::persistence)?;
    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::new(row.id),
        code: row.code,
        task_type,
        customer_id: CustomerId::new(row.customer_id),
        status,
        data1: row.data1,
        data2: row.data2,
        created_at: row.created_at,
    }))
}

fn row_to_sub_task(row: SubTaskRow) -> StoreResult<SubTask> {
    Ok(SubTask {
        id: SubTaskId::new(row.id),
        uid: row.uid,
        task_id: TaskId::new(row.task_id),
        kind: SubTaskKind::try_from(row.kind.as_str()).map_err(StoreError::persistence)?,
        code: row.code,
        status: SubTaskStatus::try_from(row.status.as_str()).map_err(StoreError::persistence)?,
        last_field_executor: decode_optional(row.last_field_executor)?,
        last_field_supervisor: decode_optional(row.last_field_supervisor)?,
        last_cgp: decode_optional(row.last_cgp)?,
        fix_count: u32::try_from(row.fix_count).map_err(StoreError::persistence)?,
        is_working_finish: row.is_working_finish,
        is_verification_success: row.is_verification_success,
        is_cgp_verification_success: row.is_cgp_verification_success,
        last_report: decode_optional(row.last_report)?,
        last_form_report: decode_optional(row.last_form_report)?,
        milestones: decode(row.milestones)?,
    })
}

fn to_changeset(sub_task: &SubTask) -> StoreResult<SubTaskChangeset> {
    Ok(SubTaskChangeset {
        code: sub_task.code.clone(),
        status: sub_task.status.as_str().to_owned(),
        last_field_executor: encode_optional(sub_task.last_field_executor.as_ref())?,
        last_field_supervisor: encode_optional(sub_task.last_field_supervisor.as_ref())?,
        last_cgp: encode_optional(sub_task.last_cgp.as_ref())?,
        fix_count: i32::try_from(sub_task.fix_count).map_err(StoreError::persistence)?,
        is_working_finish: sub_task.is_working_finish,
        is_verification_success: sub_task.is_verification_success,
        is_cgp_verification_success: sub_task.is_cgp_verification_success,
        last_report: encode_optional(sub_task.last_report.as_ref())?,
        last_form_report: encode_optional(sub_task.last_form_report.as_ref())?,
        milestones: encode(&sub_task.milestones)?,
    })
}

fn row_to_report(row: SubTaskReportRow) -> StoreResult<SubTaskReport> {
    Ok(SubTaskReport {
        id: SubTaskReportId::new(row.id),
        uid: row.uid,
        code: row.code,
        sub_task_id: SubTaskId::new(row.sub_task_id),
        sub_task_uid: row.sub_task_uid,
        status: SubTaskStatus::try_from(row.status.as_str()).map_err(StoreError::persistence)?,
        at: row.at,
        actor: decode(row.actor)?,
        phone_number: row.phone_number,
        organization: decode_optional(row.organization)?,
        payload: decode(row.payload)?,
    })
}
