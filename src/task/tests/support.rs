//! Shared fixtures for engine-level unit tests.

use crate::config::DispatchConfig;
use crate::task::{
    adapters::{
        memory::{InMemoryDispatchStore, InMemoryIdentityDirectory, RecordingNotifier},
        properties::StaticProperties,
    },
    domain::{
        CustomerId, OrganizationId, OrganizationSnapshot, ReportPayload, RoleId, SubTask,
        SubTaskId, SubTaskKind, UserId,
    },
    ports::{FieldExecutorRecord, RoleMembership, UserRecord},
    services::{
        ConstructionTask, ConstructionTaskFactory, CreateConstructionTaskRequest, Operation,
        SubTaskStateEngine, TransitionError, TransitionOutcome,
    },
};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use mockable::DefaultClock;
use serde_json::json;
use std::sync::Arc;

pub(super) const FIELD_SUPERVISOR_ROLE: i64 = 20;
pub(super) const CGP_ROLE: i64 = 30;

pub(super) const EXECUTOR: UserId = UserId::new(101);
pub(super) const OTHER_EXECUTOR: UserId = UserId::new(102);
pub(super) const SUPERVISOR: UserId = UserId::new(201);
pub(super) const CGP_USER: UserId = UserId::new(301);
pub(super) const BACK_OFFICE: UserId = UserId::new(401);
pub(super) const CUSTOMER: CustomerId = CustomerId::new(9001);

pub(super) type TestEngine = SubTaskStateEngine<
    InMemoryDispatchStore,
    InMemoryIdentityDirectory,
    StaticProperties,
    RecordingNotifier,
>;

pub(super) fn organization(id: i64, name: &str) -> OrganizationSnapshot {
    OrganizationSnapshot {
        id: OrganizationId::new(id),
        uid: format!("org-{id}"),
        name: name.to_owned(),
    }
}

pub(super) fn user(id: UserId, name: &str) -> UserRecord {
    UserRecord {
        user_id: id,
        uid: format!("user-{}", id.value()),
        login_id: name.to_lowercase(),
        full_name: name.to_owned(),
        is_active: true,
        is_deleted: false,
    }
}

/// Directory with two field executors, a supervisor, a CGP verifier, and a
/// back-office user without roles.
pub(super) fn seeded_directory() -> InMemoryIdentityDirectory {
    let directory = InMemoryIdentityDirectory::new();
    for (id, name) in [
        (EXECUTOR, "Ayu"),
        (OTHER_EXECUTOR, "Budi"),
        (SUPERVISOR, "Citra"),
        (CGP_USER, "Dewi"),
        (BACK_OFFICE, "Eko"),
    ] {
        directory.add_user(user(id, name));
    }
    for (id, phone) in [(EXECUTOR, "0811"), (OTHER_EXECUTOR, "0812")] {
        directory.add_field_executor(FieldExecutorRecord {
            user_id: id,
            phone_number: Some(phone.to_owned()),
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

pub(super) fn properties() -> StaticProperties {
    StaticProperties::new(
        Some(RoleId::new(FIELD_SUPERVISOR_ROLE)),
        Some(RoleId::new(CGP_ROLE)),
    )
}

/// Fixed transition time `minutes` after the test epoch.
pub(super) fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0)
        .single()
        .expect("valid test epoch")
        .checked_add_signed(TimeDelta::minutes(minutes))
        .expect("time in range")
}

pub(super) fn note(text: &str) -> ReportPayload {
    ReportPayload::new().with("note", text)
}

pub(super) fn meter_installation_form() -> ReportPayload {
    ReportPayload::from_value(json!({
        "meter_id": 4,
        "meter_brand": "Itron",
        "sn_meter": "SN-0042",
        "g_size_id": "2",
        "qmin": 0.016,
        "qmax": 2.5,
        "start_calibration_month": 3,
        "start_calibration_year": 2024,
    }))
    .expect("object payload")
}

pub(super) fn gas_in_form() -> ReportPayload {
    ReportPayload::from_value(json!({
        "meter_id": 4,
        "meter_brand": "Itron",
        "sn_meter": "SN-0042",
        "g_size_id": 2,
        "meter_location_longitude": 106.8456,
        "meter_location_latitude": -6.2088,
        "gas_in_date": "2024-05-02T09:30:00+07:00",
    }))
    .expect("object payload")
}

/// Engine wired to in-memory adapters with handles for inspection.
pub(super) struct Harness {
    pub store: Arc<InMemoryDispatchStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub engine: TestEngine,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(&DispatchConfig::default())
    }

    pub fn with_config(config: &DispatchConfig) -> Self {
        let store = Arc::new(InMemoryDispatchStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let engine = SubTaskStateEngine::new(
            Arc::clone(&store),
            Arc::new(seeded_directory()),
            Arc::new(properties()),
            Arc::clone(&notifier),
            config,
        );
        Self {
            store,
            notifier,
            engine,
        }
    }

    pub async fn construction_task(&self) -> ConstructionTask {
        ConstructionTaskFactory::new(Arc::clone(&self.store), Arc::new(DefaultClock))
            .create_construction_task(
                CreateConstructionTaskRequest::new(CUSTOMER).with_code("TSK-0001"),
            )
            .await
            .expect("construction task creation should succeed")
    }

    pub async fn perform(
        &self,
        operation: Operation,
        sub_task_id: SubTaskId,
        user_id: UserId,
        minutes: i64,
        report: Option<ReportPayload>,
    ) -> Result<TransitionOutcome, TransitionError> {
        self.engine
            .perform(operation, sub_task_id, user_id, at(minutes), report)
            .await
    }

    pub fn current(&self, id: SubTaskId) -> SubTask {
        self.store.sub_task(id).expect("sub-task should exist")
    }

    /// Picks, starts, and finishes a sub-task as [`EXECUTOR`].
    pub async fn finish_working(&self, id: SubTaskId, form: ReportPayload) {
        self.perform(Operation::Pick, id, EXECUTOR, 0, None)
            .await
            .expect("pick should succeed");
        self.perform(Operation::WorkingStart, id, EXECUTOR, 5, None)
            .await
            .expect("working start should succeed");
        self.perform(Operation::WorkingFinish, id, EXECUTOR, 60, Some(form))
            .await
            .expect("working finish should succeed");
    }

    /// Takes a finished sub-task through both verifications.
    pub async fn sign_off(&self, id: SubTaskId) {
        self.perform(Operation::VerifySuccess, id, SUPERVISOR, 90, Some(note("ok")))
            .await
            .expect("verification should succeed");
        self.perform(
            Operation::CgpVerifySuccess,
            id,
            CGP_USER,
            120,
            Some(note("signed off")),
        )
        .await
        .expect("back-office verification should succeed");
    }
}

pub(super) fn sub_task_id(task: &ConstructionTask, kind: SubTaskKind) -> SubTaskId {
    task.sub_task(kind).expect("pipeline sub-task").id
}
