//! Per-test databases and engine wiring for `PostgreSQL` integration tests.

pub use super::cluster::{BoxError, PostgresCluster, postgres_cluster};
use super::cluster::test_runtime;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_types::{BigInt, Jsonb};
use fieldops::{
    config::DispatchConfig,
    task::{
        adapters::{
            memory::{InMemoryIdentityDirectory, RecordingNotifier},
            postgres::PostgresDispatchStore,
            properties::StaticProperties,
        },
        domain::{
            CustomerId, OrganizationId, OrganizationSnapshot, ReportPayload, RoleId, SubTask,
            SubTaskId, SubTaskKind, Task, TaskId, UserId,
        },
        ports::{
            FieldExecutorRecord, IsolationLevel, RoleMembership, TransactionRunner, UserRecord,
        },
        services::{
            ConstructionTask, ConstructionTaskFactory, CreateConstructionTaskRequest, Operation,
            SubTaskStateEngine,
        },
    },
};
use mockable::DefaultClock;
use rstest::fixture;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::runtime::Runtime;
use uuid::Uuid;

/// Schema applied to the template database.
pub const CREATE_DISPATCH_TABLES_SQL: &str =
    include_str!("../../migrations/2026-10-19-000000_create_dispatch_tables/up.sql");

/// Template database holding the migrated schema.
pub const TEMPLATE_DB: &str = "fieldops_test_template";

pub const EXECUTOR: UserId = UserId::new(101);
pub const OTHER_EXECUTOR: UserId = UserId::new(102);
pub const SUPERVISOR: UserId = UserId::new(201);
pub const CGP_USER: UserId = UserId::new(301);
pub const BACK_OFFICE: UserId = UserId::new(401);
pub const CUSTOMER: CustomerId = CustomerId::new(7310);

const FIELD_SUPERVISOR_ROLE: i64 = 20;
const CGP_ROLE: i64 = 30;

/// Engine wired to the `PostgreSQL` store.
pub type PgEngine = SubTaskStateEngine<
    PostgresDispatchStore,
    InMemoryIdentityDirectory,
    StaticProperties,
    RecordingNotifier,
>;

/// Drops the per-test database when the test finishes.
pub struct CleanupGuard {
    cluster: PostgresCluster,
    db_name: String,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Err(err) = self.cluster.drop_database(&self.db_name) {
            tracing::warn!(database = %self.db_name, error = %err, "test database not dropped");
        }
    }
}

/// Engine and store over a fresh database cloned from the template.
pub struct PgDispatch {
    pub rt: Runtime,
    pub store: Arc<PostgresDispatchStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub engine: Arc<PgEngine>,
    url: String,
    _cleanup: CleanupGuard,
}

impl PgDispatch {
    fn open(cluster: PostgresCluster) -> Result<Self, BoxError> {
        cluster.ensure_template_exists(TEMPLATE_DB, apply_migrations)?;
        let db_name = format!("test_{}", Uuid::new_v4().simple());
        cluster.create_database_from_template(&db_name, TEMPLATE_DB)?;
        let cleanup = CleanupGuard {
            cluster,
            db_name: db_name.clone(),
        };

        let url = cluster.database_url(&db_name);
        let pool = Pool::builder()
            .max_size(4)
            .build(ConnectionManager::<PgConnection>::new(url.clone()))?;
        let store = Arc::new(PostgresDispatchStore::new(pool));
        let notifier = Arc::new(RecordingNotifier::new());
        let config = DispatchConfig::default();
        let engine = SubTaskStateEngine::new(
            Arc::clone(&store),
            Arc::new(directory()),
            Arc::new(StaticProperties::new(
                Some(RoleId::new(FIELD_SUPERVISOR_ROLE)),
                Some(RoleId::new(CGP_ROLE)),
            )),
            Arc::clone(&notifier),
            &config,
        );
        Ok(Self {
            rt: test_runtime()?,
            store,
            notifier,
            engine: Arc::new(engine),
            url,
            _cleanup: cleanup,
        })
    }

    /// Creates a construction task with its four stages.
    pub fn create_task(&self, code: &str) -> ConstructionTask {
        let factory = ConstructionTaskFactory::new(Arc::clone(&self.store), Arc::new(DefaultClock));
        self.rt
            .block_on(factory.create_construction_task(
                CreateConstructionTaskRequest::new(CUSTOMER).with_code(code),
            ))
            .expect("construction task creation should succeed")
    }

    /// Runs one operation that is expected to apply.
    pub fn apply(
        &self,
        operation: Operation,
        id: SubTaskId,
        user: UserId,
        minutes: i64,
        report: Option<ReportPayload>,
    ) {
        let outcome = self
            .rt
            .block_on(self.engine.perform(operation, id, user, at(minutes), report))
            .unwrap_or_else(|err| panic!("{operation} on sub-task {id} failed: {err}"));
        assert!(!outcome.is_claim_lost(), "{operation} lost its claim");
    }

    /// Picks, starts, and finishes a stage as [`EXECUTOR`].
    pub fn finish_working(&self, id: SubTaskId, form: ReportPayload) {
        self.apply(Operation::Pick, id, EXECUTOR, 0, None);
        self.apply(Operation::WorkingStart, id, EXECUTOR, 5, None);
        self.apply(Operation::WorkingFinish, id, EXECUTOR, 60, Some(form));
    }

    /// Committed state of a sub-task.
    pub fn sub_task(&self, id: SubTaskId) -> SubTask {
        self.rt
            .block_on(self.store.read_sub_task(id))
            .expect("sub-task read")
            .expect("sub-task exists")
    }

    /// Committed state of a task.
    pub fn task(&self, id: TaskId) -> Task {
        self.rt
            .block_on(
                self.store
                    .run_in_transaction(IsolationLevel::ReadCommitted, move |tx| {
                        tx.find_task(id)
                    }),
            )
            .expect("task read")
            .expect("task exists")
    }

    /// Number of history rows recorded for a sub-task.
    pub fn history_count(&self, id: SubTaskId) -> i64 {
        self.count("sub_task_history_items", id)
    }

    /// Number of reports recorded for a sub-task.
    pub fn report_count(&self, id: SubTaskId) -> i64 {
        self.count("sub_task_reports", id)
    }

    /// Stored meter record of [`CUSTOMER`], as JSON.
    pub fn customer_meter(&self) -> Option<Value> {
        #[derive(diesel::QueryableByName)]
        struct MeterRow {
            #[diesel(sql_type = Jsonb)]
            meter: Value,
        }

        let mut conn = self.connection();
        diesel::sql_query("SELECT meter FROM customer_meters WHERE customer_id = $1")
            .bind::<BigInt, _>(CUSTOMER.value())
            .get_result::<MeterRow>(&mut conn)
            .optional()
            .expect("customer meter query")
            .map(|row| row.meter)
    }

    /// Makes every update of `id` fail inside the database.
    pub fn reject_updates_of(&self, id: SubTaskId) {
        let sql = format!(
            r"
            CREATE OR REPLACE FUNCTION reject_sub_task_update() RETURNS trigger AS $$
            BEGIN
                RAISE EXCEPTION 'sub-task % is frozen', OLD.id;
            END;
            $$ LANGUAGE plpgsql;
            CREATE TRIGGER freeze_sub_task_{id}
                BEFORE UPDATE ON sub_tasks
                FOR EACH ROW WHEN (OLD.id = {id})
                EXECUTE FUNCTION reject_sub_task_update();
            ",
            id = id.value()
        );
        self.connection()
            .batch_execute(&sql)
            .expect("install update trigger");
    }

    fn count(&self, table: &str, id: SubTaskId) -> i64 {
        #[derive(diesel::QueryableByName)]
        struct CountRow {
            #[diesel(sql_type = BigInt)]
            count: i64,
        }

        let mut conn = self.connection();
        diesel::sql_query(format!(
            "SELECT COUNT(*) AS count FROM {table} WHERE sub_task_id = $1"
        ))
        .bind::<BigInt, _>(id.value())
        .get_result::<CountRow>(&mut conn)
        .expect("count query")
        .count
    }

    fn connection(&self) -> PgConnection {
        PgConnection::establish(&self.url).expect("test database connection")
    }
}

/// Provides a dispatch context over a fresh database, or `None` when no
/// cluster is available.
#[fixture]
pub fn pg_dispatch(postgres_cluster: Option<PostgresCluster>) -> Option<PgDispatch> {
    postgres_cluster.map(|cluster| PgDispatch::open(cluster).expect("test database setup"))
}

fn apply_migrations(url: &str) -> Result<(), BoxError> {
    let mut conn = PgConnection::establish(url)?;
    conn.batch_execute(CREATE_DISPATCH_TABLES_SQL)?;
    Ok(())
}

fn organization(id: i64, name: &str) -> OrganizationSnapshot {
    OrganizationSnapshot {
        id: OrganizationId::new(id),
        uid: format!("org-{id}"),
        name: name.to_owned(),
    }
}

fn directory() -> InMemoryIdentityDirectory {
    let directory = InMemoryIdentityDirectory::new();
    for (user_id, name) in [
        (EXECUTOR, "Ayu"),
        (OTHER_EXECUTOR, "Budi"),
        (SUPERVISOR, "Citra"),
        (CGP_USER, "Dewi"),
        (BACK_OFFICE, "Eko"),
    ] {
        directory.add_user(UserRecord {
            user_id,
            uid: format!("user-{user_id}"),
            login_id: name.to_lowercase(),
            full_name: name.to_owned(),
            is_active: true,
            is_deleted: false,
        });
    }
    for user_id in [EXECUTOR, OTHER_EXECUTOR] {
        directory.add_field_executor(FieldExecutorRecord {
            user_id,
            phone_number: Some(format!("08{user_id}")),
            organization: organization(7, "Mitra Gas"),
            is_deleted: false,
        });
    }
    directory.add_role_membership(RoleMembership {
        user_id: SUPERVISOR,
        role_id: RoleId::new(FIELD_SUPERVISOR_ROLE),
        organization: organization(3, "Area Office"),
    });
    directory.add_role_membership(RoleMembership {
        user_id: CGP_USER,
        role_id: RoleId::new(CGP_ROLE),
        organization: organization(1, "Head Office"),
    });
    directory
}

/// Transition time `minutes` after the test epoch.
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0)
        .single()
        .and_then(|epoch| epoch.checked_add_signed(TimeDelta::minutes(minutes)))
        .expect("test time in range")
}

pub fn note(text: &str) -> ReportPayload {
    ReportPayload::new().with("note", text)
}

/// Form accepted by the meter installation and gas-in stages.
pub fn meter_form() -> ReportPayload {
    ReportPayload::from_value(json!({
        "meter_id": 11,
        "meter_brand": "Elster",
        "sn_meter": "EL-7781",
        "g_size_id": 4,
        "qmin": 0.04,
        "qmax": 6,
        "start_calibration_month": 1,
        "start_calibration_year": 2024,
        "meter_location_longitude": 110.42,
        "meter_location_latitude": -6.97,
        "gas_in_date": "2024-07-02T10:00:00+07:00",
    }))
    .expect("object payload")
}

/// Returns the identifier of a pipeline stage.
pub fn stage(task: &ConstructionTask, kind: SubTaskKind) -> SubTaskId {
    task.sub_task(kind).expect("pipeline stage").id
}
