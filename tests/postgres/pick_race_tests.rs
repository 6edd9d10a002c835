//! Concurrent claims of the same sub-task against a real database.

use super::helpers::{EXECUTOR, OTHER_EXECUTOR, PgDispatch, at, pg_dispatch, stage};
use fieldops::task::{
    domain::{SubTaskId, SubTaskKind, SubTaskStatus, TaskStatus, UserId},
    services::{Operation, TransitionOutcome},
};
use rstest::rstest;
use std::sync::Arc;

fn race(dispatch: &PgDispatch, id: SubTaskId) -> Vec<(UserId, TransitionOutcome)> {
    dispatch.rt.block_on(async {
        let handles = [EXECUTOR, OTHER_EXECUTOR].map(|user| {
            let engine = Arc::clone(&dispatch.engine);
            tokio::spawn(async move {
                let outcome = engine.perform(Operation::Pick, id, user, at(0), None).await;
                (user, outcome)
            })
        });
        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            let (user, outcome) = handle.await.expect("pick task joined");
            outcomes.push((user, outcome.expect("a lost race is an outcome, not an error")));
        }
        outcomes
    })
}

#[rstest]
fn competing_picks_commit_exactly_one_claim(pg_dispatch: Option<PgDispatch>) {
    let Some(dispatch) = pg_dispatch else {
        return;
    };
    let task = dispatch.create_task("TSK-PG-RACE");
    let sk = stage(&task, SubTaskKind::ConstructionSk);

    let outcomes = race(&dispatch, sk);

    let winners: Vec<UserId> = outcomes
        .iter()
        .filter(|(_, outcome)| !outcome.is_claim_lost())
        .map(|(user, _)| *user)
        .collect();
    let [winner] = winners.as_slice() else {
        panic!("expected one winner, found {winners:?}");
    };
    let stored = dispatch.sub_task(sk);
    assert_eq!(stored.status, SubTaskStatus::Assigned);
    assert_eq!(stored.last_field_executor_id(), Some(*winner));
    assert_eq!(dispatch.history_count(sk), 1);
    assert_eq!(dispatch.task(task.task.id()).status(), TaskStatus::InProgress);
}

#[rstest]
#[case::sk(SubTaskKind::ConstructionSk, "TSK-PG-SK")]
#[case::sr(SubTaskKind::ConstructionSr, "TSK-PG-SR")]
fn repeated_races_never_double_assign(
    pg_dispatch: Option<PgDispatch>,
    #[case] kind: SubTaskKind,
    #[case] code: &str,
) {
    let Some(dispatch) = pg_dispatch else {
        return;
    };
    for round in 0..5 {
        let task = dispatch.create_task(&format!("{code}-{round}"));
        let id = stage(&task, kind);

        let outcomes = race(&dispatch, id);

        let applied = outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, TransitionOutcome::Applied { .. }))
            .count();
        assert_eq!(applied, 1, "round {round}: {outcomes:?}");
        assert_eq!(dispatch.history_count(id), 1);
    }
}
