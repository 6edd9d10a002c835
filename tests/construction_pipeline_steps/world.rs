//! Shared world state for construction pipeline BDD scenarios.

use std::sync::Arc;

use fieldops::{
    config::DispatchConfig,
    task::{
        adapters::{
            memory::{InMemoryDispatchStore, InMemoryIdentityDirectory, RecordingNotifier},
            properties::StaticProperties,
        },
        domain::{
            OrganizationId, OrganizationSnapshot, ReportPayload, RoleId, SubTaskId, SubTaskKind,
            UserId,
        },
        ports::{FieldExecutorRecord, RoleMembership, UserRecord},
        services::{
            ConstructionTask, Operation, SubTaskStateEngine, TransitionError, TransitionOutcome,
        },
    },
};
use mockable::{Clock, DefaultClock};
use rstest::fixture;

const FIELD_SUPERVISOR_ROLE: i64 = 20;
const CGP_ROLE: i64 = 30;

/// Engine type used by the BDD world.
pub type PipelineEngine = SubTaskStateEngine<
    InMemoryDispatchStore,
    InMemoryIdentityDirectory,
    StaticProperties,
    RecordingNotifier,
>;

/// Scenario world for construction pipeline behaviour tests.
pub struct PipelineWorld {
    pub store: Arc<InMemoryDispatchStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub engine: PipelineEngine,
    pub task: Option<ConstructionTask>,
    pub last_result: Option<Result<TransitionOutcome, TransitionError>>,
}

impl PipelineWorld {
    /// Creates a world over a seeded directory and empty store.
    #[must_use]
    pub fn new() -> Self {
        let config = DispatchConfig {
            field_supervisor_role_id: Some(FIELD_SUPERVISOR_ROLE),
            cgp_role_id: Some(CGP_ROLE),
            ..DispatchConfig::default()
        };
        let store = Arc::new(InMemoryDispatchStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let engine = SubTaskStateEngine::new(
            Arc::clone(&store),
            Arc::new(seeded_directory()),
            Arc::new(StaticProperties::from_config(&config)),
            Arc::clone(&notifier),
            &config,
        );
        Self {
            store,
            notifier,
            engine,
            task: None,
            last_result: None,
        }
    }

    /// Resolves a stage name such as `SK` or `GAS_IN` to its sub-task.
    ///
    /// # Errors
    ///
    /// Returns an error when no task exists yet or the name is unknown.
    pub fn stage(&self, name: &str) -> Result<SubTaskId, eyre::Report> {
        let kind = match name {
            "SK" => SubTaskKind::ConstructionSk,
            "SR" => SubTaskKind::ConstructionSr,
            "MI" => SubTaskKind::ConstructionMeterInstallation,
            "GAS_IN" => SubTaskKind::ConstructionGasIn,
            other => return Err(eyre::eyre!("unknown stage {other}")),
        };
        let task = self
            .task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing construction task in scenario world"))?;
        task.sub_task(kind)
            .map(|sub_task| sub_task.id)
            .ok_or_else(|| eyre::eyre!("task has no {name} stage"))
    }

    /// Performs an operation on a named stage now.
    ///
    /// # Errors
    ///
    /// Returns an error when the stage or user cannot be resolved.
    pub fn perform(
        &self,
        operation: Operation,
        stage: &str,
        user: u64,
        report: Option<ReportPayload>,
    ) -> Result<Result<TransitionOutcome, TransitionError>, eyre::Report> {
        let id = self.stage(stage)?;
        let user_id = UserId::new(i64::try_from(user)?);
        Ok(run_async(self.engine.perform(
            operation,
            id,
            user_id,
            DefaultClock.utc(),
            report,
        )))
    }
}

impl Default for PipelineWorld {
    fn default() -> Self {
        Self::new()
    }
}

fn organization(id: i64, name: &str) -> OrganizationSnapshot {
    OrganizationSnapshot {
        id: OrganizationId::new(id),
        uid: format!("org-{id}"),
        name: name.to_owned(),
    }
}

fn seeded_directory() -> InMemoryIdentityDirectory {
    let directory = InMemoryIdentityDirectory::new();
    for (id, name) in [
        (101, "Ayu"),
        (102, "Budi"),
        (201, "Citra"),
        (301, "Dewi"),
        (401, "Eko"),
    ] {
        directory.add_user(UserRecord {
            user_id: UserId::new(id),
            uid: format!("user-{id}"),
            login_id: name.to_lowercase(),
            full_name: name.to_owned(),
            is_active: true,
            is_deleted: false,
        });
    }
    for id in [101, 102] {
        directory.add_field_executor(FieldExecutorRecord {
            user_id: UserId::new(id),
            phone_number: None,
            organization: organization(7, "Mitra Gas"),
            is_deleted: false,
        });
    }
    directory.add_role_membership(RoleMembership {
        user_id: UserId::new(201),
        role_id: RoleId::new(FIELD_SUPERVISOR_ROLE),
        organization: organization(3, "Area Office"),
    });
    directory.add_role_membership(RoleMembership {
        user_id: UserId::new(301),
        role_id: RoleId::new(CGP_ROLE),
        organization: organization(1, "Head Office"),
    });
    directory
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> PipelineWorld {
    PipelineWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
