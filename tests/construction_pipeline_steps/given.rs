//! Given steps for construction pipeline BDD scenarios.

use super::world::{PipelineWorld, run_async};
use fieldops::task::{
    domain::{CustomerId, ReportPayload},
    services::{ConstructionTaskFactory, CreateConstructionTaskRequest, Operation},
};
use eyre::WrapErr;
use mockable::DefaultClock;
use rstest_bdd_macros::given;
use std::sync::Arc;

#[given(r#"a construction task "{code}""#)]
fn construction_task(world: &mut PipelineWorld, code: String) -> Result<(), eyre::Report> {
    let factory = ConstructionTaskFactory::new(Arc::clone(&world.store), Arc::new(DefaultClock));
    let created = run_async(factory.create_construction_task(
        CreateConstructionTaskRequest::new(CustomerId::new(77)).with_code(code),
    ))
    .wrap_err("create construction task for scenario")?;
    world.task = Some(created);
    Ok(())
}

fn apply_all(
    world: &PipelineWorld,
    stage: &str,
    user: u64,
    steps: [(Operation, Option<ReportPayload>); 3],
) -> Result<(), eyre::Report> {
    for (operation, report) in steps {
        let outcome = world
            .perform(operation, stage, user, report)?
            .wrap_err_with(|| format!("{operation} on {stage} in scenario setup"))?;
        eyre::ensure!(!outcome.is_claim_lost(), "{operation} on {stage} lost its claim");
    }
    Ok(())
}

#[given(r#"field executor {user:u64} has picked the "{stage}" stage"#)]
fn stage_picked(world: &mut PipelineWorld, user: u64, stage: String) -> Result<(), eyre::Report> {
    let outcome = world
        .perform(Operation::Pick, &stage, user, None)?
        .wrap_err("pick in scenario setup")?;
    eyre::ensure!(!outcome.is_claim_lost(), "pick of {stage} lost its claim");
    Ok(())
}

#[given(r#"field executor {user:u64} has finished the "{stage}" stage"#)]
fn stage_finished(world: &mut PipelineWorld, user: u64, stage: String) -> Result<(), eyre::Report> {
    apply_all(
        world,
        &stage,
        user,
        [
            (Operation::Pick, None),
            (Operation::WorkingStart, None),
            (
                Operation::WorkingFinish,
                Some(ReportPayload::new().with("note", "work done")),
            ),
        ],
    )
}
