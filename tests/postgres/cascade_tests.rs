//! Customer cancellation commits or rolls back across every stage.

use super::helpers::{BACK_OFFICE, EXECUTOR, PgDispatch, at, note, pg_dispatch, stage};
use fieldops::task::{
    domain::{SubTaskKind, SubTaskStatus, TaskStatus},
    ports::StoreError,
    services::{Operation, TransitionError},
};
use rstest::rstest;

#[rstest]
fn customer_cancellation_closes_every_stage(pg_dispatch: Option<PgDispatch>) {
    let Some(dispatch) = pg_dispatch else {
        return;
    };
    let task = dispatch.create_task("TSK-PG-CANCEL");
    let sk = stage(&task, SubTaskKind::ConstructionSk);
    dispatch.apply(Operation::Pick, sk, EXECUTOR, 0, None);

    dispatch.apply(
        Operation::CancelByCustomer,
        sk,
        BACK_OFFICE,
        30,
        Some(note("customer moved")),
    );

    for sub_task in &task.sub_tasks {
        let stored = dispatch.sub_task(sub_task.id);
        assert_eq!(stored.status, SubTaskStatus::CanceledByCustomer);
        assert!(stored.milestones.canceled_by_customer_report.is_some());
        assert_eq!(dispatch.report_count(sub_task.id), 1);
    }
    assert_eq!(
        dispatch.task(task.task.id()).status(),
        TaskStatus::CanceledByCustomer
    );
    assert_eq!(dispatch.notifier.messages().len(), 1);
}

#[rstest]
fn failed_sibling_update_rolls_back_the_cancellation(pg_dispatch: Option<PgDispatch>) {
    let Some(dispatch) = pg_dispatch else {
        return;
    };
    let task = dispatch.create_task("TSK-PG-ROLLBACK");
    let sk = stage(&task, SubTaskKind::ConstructionSk);
    let gas_in = stage(&task, SubTaskKind::ConstructionGasIn);
    dispatch.apply(Operation::Pick, sk, EXECUTOR, 0, None);
    let before: Vec<_> = task
        .sub_tasks
        .iter()
        .map(|sub_task| dispatch.sub_task(sub_task.id))
        .collect();
    dispatch.reject_updates_of(gas_in);

    let err = dispatch
        .rt
        .block_on(dispatch.engine.perform(
            Operation::CancelByCustomer,
            sk,
            BACK_OFFICE,
            at(30),
            Some(note("customer moved")),
        ))
        .expect_err("gas-in update is rejected");

    assert!(matches!(err, TransitionError::Store(StoreError::Persistence(_))));
    for expected in &before {
        assert_eq!(&dispatch.sub_task(expected.id), expected);
        assert_eq!(dispatch.report_count(expected.id), 0);
        let history = if expected.id == sk { 1 } else { 0 };
        assert_eq!(dispatch.history_count(expected.id), history);
    }
    assert_eq!(dispatch.task(task.task.id()).status(), TaskStatus::InProgress);
    assert!(dispatch.notifier.messages().is_empty());
}
