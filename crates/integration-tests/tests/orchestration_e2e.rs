//! End-to-end orchestration over the SQLite substrate:
//! fan-out -> queue -> worker -> finalized results.

use std::sync::Arc;

use dirsync_core::application::worker::constants::DEFAULT_RESULT_RETENTION_MS;
use dirsync_core::application::{SyncJobRunner, SyncTrigger, TimeoutConfig, Worker};
use dirsync_core::domain::{JobState, JobStatus, Source, SyncPhase};
use dirsync_core::port::id_provider::UuidProvider;
use dirsync_core::port::synchronizer::mocks::{MockBehavior, MockSynchronizerFactory};
use dirsync_core::port::time_provider::SystemTimeProvider;
use dirsync_core::port::{JobQueue, ResultStore, SourceAdmin, TimeProvider};
use dirsync_infra_sqlite::{
    create_pool, run_migrations, SqliteJobQueue, SqliteResultStore, SqliteSourceRepository,
};

struct Harness {
    sources: Arc<SqliteSourceRepository>,
    queue: Arc<SqliteJobQueue>,
    results: Arc<SqliteResultStore>,
    worker: Worker,
    trigger: SyncTrigger,
}

async fn harness(behavior: MockBehavior) -> Harness {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let sources = Arc::new(SqliteSourceRepository::new(pool.clone()));
    let queue = Arc::new(SqliteJobQueue::new(pool.clone(), time_provider.clone()));
    let results = Arc::new(SqliteResultStore::new(pool.clone(), time_provider.clone()));

    let runner = Arc::new(SyncJobRunner::new(
        sources.clone(),
        Arc::new(MockSynchronizerFactory::new(behavior)),
        results.clone(),
        time_provider.clone(),
        DEFAULT_RESULT_RETENTION_MS,
    ));

    let worker = Worker::new(
        queue.clone(),
        runner,
        time_provider.clone(),
        TimeoutConfig::default(),
    );

    let trigger = SyncTrigger::new(
        sources.clone(),
        queue.clone(),
        Arc::new(UuidProvider),
        time_provider,
        60,
    );

    Harness {
        sources,
        queue,
        results,
        worker,
        trigger,
    }
}

async fn drain(worker: &Worker) -> usize {
    let mut processed = 0;
    while worker.process_next_job().await.unwrap() {
        processed += 1;
    }
    processed
}

#[tokio::test]
async fn test_full_cycle_finalizes_all_phase_results() {
    let h = harness(MockBehavior::Success {
        count: 12,
        messages: vec![],
    })
    .await;

    h.sources
        .insert(&Source::new("src-1", "Corp Directory", true))
        .await
        .unwrap();

    let enqueued = h.trigger.run_now().await.unwrap();
    assert_eq!(enqueued, 3);

    assert_eq!(drain(&h.worker).await, 3);

    // Every queue job completed at the substrate level
    assert_eq!(h.queue.count_by_state(JobState::Done).await.unwrap(), 3);
    assert_eq!(h.queue.count_by_state(JobState::Queued).await.unwrap(), 0);

    // Every phase has a Successful result under its deterministic uid
    for phase in SyncPhase::ORDERED {
        let uid = format!("corp-directory-{}", phase.synchronizer_name());
        let result = h.results.get(&uid).await.unwrap().unwrap();
        assert_eq!(result.status, JobStatus::Successful);
        assert_eq!(
            result.messages.last().unwrap(),
            "Synced 12 objects.",
            "summary message must close the list"
        );
    }
}

#[tokio::test]
async fn test_jobs_execute_in_submission_order() {
    let h = harness(MockBehavior::Success {
        count: 0,
        messages: vec![],
    })
    .await;

    h.sources
        .insert(&Source::new("src-1", "Corp Directory", true))
        .await
        .unwrap();
    h.trigger.run_now().await.unwrap();

    let mut phases = Vec::new();
    while let Some(job) = h.queue.pop_next().await.unwrap() {
        phases.push(job.payload.phase.unwrap());
        h.queue
            .mark_done(&job.id, job.started_at.unwrap())
            .await
            .unwrap();
    }

    assert_eq!(
        phases,
        vec![SyncPhase::Users, SyncPhase::Groups, SyncPhase::Memberships]
    );
}

#[tokio::test]
async fn test_disabled_source_is_never_submitted() {
    let h = harness(MockBehavior::Success {
        count: 1,
        messages: vec![],
    })
    .await;

    h.sources
        .insert(&Source::new("src-1", "Active", true))
        .await
        .unwrap();
    h.sources
        .insert(&Source::new("src-2", "Dormant", false))
        .await
        .unwrap();

    let enqueued = h.trigger.run_now().await.unwrap();
    assert_eq!(enqueued, 3);

    assert_eq!(drain(&h.worker).await, 3);

    // Nothing was ever finalized for the dormant source
    for phase in SyncPhase::ORDERED {
        let uid = format!("dormant-{}", phase.synchronizer_name());
        assert!(h.results.get(&uid).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_duplicate_submissions_share_a_uid() {
    let h = harness(MockBehavior::Success {
        count: 4,
        messages: vec![],
    })
    .await;

    h.sources
        .insert(&Source::new("src-1", "Corp Directory", true))
        .await
        .unwrap();

    // Two independent fan-outs: six jobs, three uids
    h.trigger.run_now().await.unwrap();
    h.trigger.run_now().await.unwrap();

    assert_eq!(drain(&h.worker).await, 6);
    assert_eq!(h.queue.count_by_state(JobState::Done).await.unwrap(), 6);

    // Three uids total despite six executions
    let mut finalized = 0;
    for phase in SyncPhase::ORDERED {
        let uid = format!("corp-directory-{}", phase.synchronizer_name());
        if h.results.get(&uid).await.unwrap().is_some() {
            finalized += 1;
        }
    }
    assert_eq!(finalized, 3);
}
