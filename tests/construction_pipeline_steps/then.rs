//! Then steps for construction pipeline BDD scenarios.

use super::world::PipelineWorld;
use fieldops::task::{
    domain::{SubTaskStatus, TaskStatus, UserId},
    services::{AuthorizationError, TransitionError, TransitionOutcome},
};
use rstest_bdd_macros::then;

fn last_result(
    world: &PipelineWorld,
) -> Result<&Result<TransitionOutcome, TransitionError>, eyre::Report> {
    world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing transition result"))
}

fn parse_status(status: &str) -> Result<SubTaskStatus, eyre::Report> {
    SubTaskStatus::try_from(status)
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))
}

fn ensure_stage_status(
    world: &PipelineWorld,
    stage: &str,
    expected: SubTaskStatus,
) -> Result<(), eyre::Report> {
    let id = world.stage(stage)?;
    let sub_task = world
        .store
        .sub_task(id)
        .ok_or_else(|| eyre::eyre!("sub-task {id} not stored"))?;
    eyre::ensure!(
        sub_task.status == expected,
        "expected {stage} to be {expected}, found {}",
        sub_task.status
    );
    Ok(())
}

#[then(r#"the "{stage}" stage is "{status}""#)]
fn stage_status_is(world: &PipelineWorld, stage: String, status: String) -> Result<(), eyre::Report> {
    ensure_stage_status(world, &stage, parse_status(&status)?)
}

#[then(r#"every stage is "{status}""#)]
fn every_stage_is(world: &PipelineWorld, status: String) -> Result<(), eyre::Report> {
    let expected = parse_status(&status)?;
    for stage in ["SK", "SR", "MI", "GAS_IN"] {
        ensure_stage_status(world, stage, expected)?;
    }
    Ok(())
}

#[then(r#"the task is "{status}""#)]
fn task_status_is(world: &PipelineWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected task status in scenario: {err}"))?;
    let task_id = world
        .task
        .as_ref()
        .map(|created| created.task.id())
        .ok_or_else(|| eyre::eyre!("missing construction task"))?;
    let stored = world
        .store
        .task(task_id)
        .ok_or_else(|| eyre::eyre!("task {task_id} not stored"))?;
    eyre::ensure!(
        stored.status() == expected,
        "expected task to be {expected}, found {}",
        stored.status()
    );
    Ok(())
}

#[then("the last transition lost its claim")]
fn lost_claim(world: &PipelineWorld) -> Result<(), eyre::Report> {
    let result = last_result(world)?;
    if !matches!(result, Ok(TransitionOutcome::ClaimLost { .. })) {
        return Err(eyre::eyre!("expected a lost claim, got {result:?}"));
    }
    Ok(())
}

#[then("the last transition was rejected for the wrong field executor")]
fn rejected_wrong_executor(world: &PipelineWorld) -> Result<(), eyre::Report> {
    let result = last_result(world)?;
    if !matches!(
        result,
        Err(TransitionError::Authorization(
            AuthorizationError::WrongFieldExecutor { .. }
        ))
    ) {
        return Err(eyre::eyre!(
            "expected WrongFieldExecutor error, got {result:?}"
        ));
    }
    Ok(())
}

#[then(r#"user {user:u64} received a "{template}" message"#)]
fn user_received(world: &PipelineWorld, user: u64, template: String) -> Result<(), eyre::Report> {
    let user_id = UserId::new(i64::try_from(user)?);
    let received = world
        .notifier
        .messages()
        .iter()
        .any(|message| message.user_id == user_id && message.template == template);
    eyre::ensure!(received, "user {user_id} has no {template} message");
    Ok(())
}
