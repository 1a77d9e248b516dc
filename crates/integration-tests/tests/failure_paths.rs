//! Failure taxonomy end-to-end: silent no-ops, recovered directory errors,
//! fatal failures and the hard cap, each with its observable trace.

use std::sync::Arc;
use std::time::Duration;

use dirsync_core::application::worker::constants::DEFAULT_RESULT_RETENTION_MS;
use dirsync_core::application::{SyncJobRunner, SyncTrigger, TimeoutConfig, Worker};
use dirsync_core::domain::{
    JobState, JobStatus, Source, SyncJob, SyncJobPayload, SyncPhase,
};
use dirsync_core::port::id_provider::UuidProvider;
use dirsync_core::port::synchronizer::mocks::{MockBehavior, MockSynchronizerFactory};
use dirsync_core::port::time_provider::SystemTimeProvider;
use dirsync_core::port::{DirectoryError, JobQueue, ResultStore, SourceAdmin, TimeProvider};
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

async fn harness(behavior: MockBehavior, timeouts: TimeoutConfig) -> Harness {
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

    let worker = Worker::new(queue.clone(), runner, time_provider.clone(), timeouts);

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
async fn test_source_deleted_before_execution_records_nothing() {
    let h = harness(
        MockBehavior::Success {
            count: 5,
            messages: vec![],
        },
        TimeoutConfig::default(),
    )
    .await;

    h.sources
        .insert(&Source::new("src-1", "Corp Directory", true))
        .await
        .unwrap();
    h.trigger.run_now().await.unwrap();

    // Deleted between submission and execution
    h.sources.delete(&"src-1".to_string()).await.unwrap();

    assert_eq!(drain(&h.worker).await, 3);

    // Jobs drain cleanly, not as errors
    assert_eq!(h.queue.count_by_state(JobState::Done).await.unwrap(), 3);
    assert_eq!(h.queue.count_by_state(JobState::Failed).await.unwrap(), 0);

    // And no result exists under any uid
    for phase in SyncPhase::ORDERED {
        let uid = format!("corp-directory-{}", phase.synchronizer_name());
        assert!(h.results.get(&uid).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_legacy_payload_without_phase_is_a_noop() {
    let h = harness(
        MockBehavior::Success {
            count: 5,
            messages: vec![],
        },
        TimeoutConfig::default(),
    )
    .await;

    h.sources
        .insert(&Source::new("src-1", "Corp Directory", true))
        .await
        .unwrap();

    let legacy = SyncJob::new(
        "legacy-1",
        1000,
        SyncJobPayload {
            source_id: "src-1".to_string(),
            phase: None,
        },
    );
    h.queue.enqueue(&legacy).await.unwrap();

    assert_eq!(drain(&h.worker).await, 1);

    let job = h.queue.find_by_id(&legacy.id).await.unwrap().unwrap();
    assert_eq!(job.state, JobState::Done);

    for phase in SyncPhase::ORDERED {
        let uid = format!("corp-directory-{}", phase.synchronizer_name());
        assert!(h.results.get(&uid).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_directory_error_is_captured_not_propagated() {
    let h = harness(
        MockBehavior::Fail(DirectoryError::Search("size limit exceeded".to_string())),
        TimeoutConfig::default(),
    )
    .await;

    h.sources
        .insert(&Source::new("src-1", "Corp Directory", true))
        .await
        .unwrap();
    h.trigger.run_now().await.unwrap();

    assert_eq!(drain(&h.worker).await, 3);

    // The substrate sees clean completions; the failure lives in the results
    assert_eq!(h.queue.count_by_state(JobState::Done).await.unwrap(), 3);

    for phase in SyncPhase::ORDERED {
        let uid = format!("corp-directory-{}", phase.synchronizer_name());
        let result = h.results.get(&uid).await.unwrap().unwrap();
        assert_eq!(result.status, JobStatus::Error);
        assert_eq!(
            result.error.as_deref(),
            Some("Search failed: size limit exceeded")
        );
    }
}

#[tokio::test]
async fn test_fatal_failure_is_a_substrate_failure() {
    let h = harness(
        MockBehavior::FatalFail("identity store corrupt".to_string()),
        TimeoutConfig::default(),
    )
    .await;

    h.sources
        .insert(&Source::new("src-1", "Corp Directory", true))
        .await
        .unwrap();
    h.trigger.run_now().await.unwrap();

    assert_eq!(drain(&h.worker).await, 3);

    assert_eq!(h.queue.count_by_state(JobState::Failed).await.unwrap(), 3);

    // No result model entry for fatal failures
    for phase in SyncPhase::ORDERED {
        let uid = format!("corp-directory-{}", phase.synchronizer_name());
        assert!(h.results.get(&uid).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_hard_cap_fails_job_at_substrate_level() {
    let h = harness(
        MockBehavior::Hang,
        TimeoutConfig {
            soft_limit: Duration::from_secs(60),
            hard_limit: Duration::from_millis(50),
        },
    )
    .await;

    h.sources
        .insert(&Source::new("src-1", "Corp Directory", true))
        .await
        .unwrap();

    let job = SyncJob::new(
        "hung-1",
        1000,
        SyncJobPayload::new("src-1", SyncPhase::Users),
    );
    h.queue.enqueue(&job).await.unwrap();

    assert_eq!(drain(&h.worker).await, 1);

    let failed = h.queue.find_by_id(&job.id).await.unwrap().unwrap();
    assert_eq!(failed.state, JobState::Failed);
    assert!(failed.failure_reason.unwrap().contains("hard time limit"));

    let uid = format!("corp-directory-{}", SyncPhase::Users.synchronizer_name());
    assert!(h.results.get(&uid).await.unwrap().is_none());
}

#[tokio::test]
async fn test_later_run_overwrites_earlier_result() {
    // First run errors...
    let h = harness(
        MockBehavior::Fail(DirectoryError::Connection("refused".to_string())),
        TimeoutConfig::default(),
    )
    .await;

    h.sources
        .insert(&Source::new("src-1", "Corp Directory", true))
        .await
        .unwrap();

    let job = SyncJob::new(
        "attempt-1",
        1000,
        SyncJobPayload::new("src-1", SyncPhase::Users),
    );
    h.queue.enqueue(&job).await.unwrap();
    drain(&h.worker).await;

    let uid = format!("corp-directory-{}", SyncPhase::Users.synchronizer_name());
    assert_eq!(
        h.results.get(&uid).await.unwrap().unwrap().status,
        JobStatus::Error
    );

    // ...then a healthy runner finalizes over the same uid
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let healthy_runner = SyncJobRunner::new(
        h.sources.clone(),
        Arc::new(MockSynchronizerFactory::new_success(8)),
        h.results.clone(),
        time_provider.clone(),
        DEFAULT_RESULT_RETENTION_MS,
    );
    let healthy_worker = Worker::new(
        h.queue.clone(),
        Arc::new(healthy_runner),
        time_provider,
        TimeoutConfig::default(),
    );

    let job2 = SyncJob::new(
        "attempt-2",
        2000,
        SyncJobPayload::new("src-1", SyncPhase::Users),
    );
    h.queue.enqueue(&job2).await.unwrap();
    drain(&healthy_worker).await;

    let result = h.results.get(&uid).await.unwrap().unwrap();
    assert_eq!(result.status, JobStatus::Successful);
    assert_eq!(result.messages.last().unwrap(), "Synced 8 objects.");
}
