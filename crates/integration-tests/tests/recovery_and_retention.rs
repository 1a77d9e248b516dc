//! Substrate durability: crash recovery requeue, result retention window,
//! persistence across pool reopen.

use std::sync::Arc;

use dirsync_core::application::RecoveryService;
use dirsync_core::domain::{JobResult, JobState, JobStatus, SyncJob, SyncJobPayload, SyncPhase};
use dirsync_core::port::time_provider::mocks::FixedTimeProvider;
use dirsync_core::port::{JobQueue, ResultStore};
use dirsync_infra_sqlite::{create_pool, run_migrations, SqliteJobQueue, SqliteResultStore};

const TWO_HOURS_MS: i64 = 2 * 60 * 60 * 1000;

#[tokio::test]
async fn test_orphaned_running_job_is_requeued() {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let clock = Arc::new(FixedTimeProvider::new(1_000_000));
    let queue = Arc::new(SqliteJobQueue::new(pool, clock.clone()));

    let job = SyncJob::new(
        "orphan-1",
        1_000_000,
        SyncJobPayload::new("src-1", SyncPhase::Users),
    );
    queue.enqueue(&job).await.unwrap();
    queue.pop_next().await.unwrap();

    // Daemon "restarts" ten minutes later
    clock.advance(10 * 60 * 1000);

    let recovery = RecoveryService::new(queue.clone(), clock.clone(), None);
    let recovered = recovery.recover_orphaned_jobs().await.unwrap();
    assert_eq!(recovered, 1);

    let restored = queue.find_by_id(&job.id).await.unwrap().unwrap();
    assert_eq!(restored.state, JobState::Queued);
    assert!(restored.started_at.is_none());

    // And the job is claimable again: at-least-once delivery
    assert!(queue.pop_next().await.unwrap().is_some());
}

#[tokio::test]
async fn test_recently_started_jobs_are_left_alone() {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let clock = Arc::new(FixedTimeProvider::new(1_000_000));
    let queue = Arc::new(SqliteJobQueue::new(pool, clock.clone()));

    let job = SyncJob::new(
        "active-1",
        1_000_000,
        SyncJobPayload::new("src-1", SyncPhase::Users),
    );
    queue.enqueue(&job).await.unwrap();
    queue.pop_next().await.unwrap();

    // Only one minute has passed: inside the recovery window
    clock.advance(60 * 1000);

    let recovery = RecoveryService::new(queue.clone(), clock.clone(), None);
    assert_eq!(recovery.recover_orphaned_jobs().await.unwrap(), 0);

    let untouched = queue.find_by_id(&job.id).await.unwrap().unwrap();
    assert_eq!(untouched.state, JobState::Running);
}

#[tokio::test]
async fn test_result_visible_only_inside_retention_window() {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let clock = Arc::new(FixedTimeProvider::new(1_000_000));
    let store = SqliteResultStore::new(pool, clock.clone());

    let uid = "corp-directory-UserSynchronizer".to_string();
    let result = JobResult::new(
        JobStatus::Successful,
        vec!["Synced 3 objects.".to_string()],
        1_000_000,
    );
    store.finalize(&uid, &result, TWO_HOURS_MS).await.unwrap();

    // One hour in: still inspectable
    clock.advance(60 * 60 * 1000);
    assert!(store.get(&uid).await.unwrap().is_some());

    // Past two hours: reads see absence, purge reclaims the row
    clock.advance(61 * 60 * 1000);
    assert!(store.get(&uid).await.unwrap().is_none());
    assert_eq!(store.purge_expired().await.unwrap(), 1);
}

#[tokio::test]
async fn test_queue_survives_pool_reopen() {
    let db_path = "/tmp/dirsync_test_persistence.db";
    let _ = std::fs::remove_file(db_path);

    let clock = Arc::new(FixedTimeProvider::new(1_000_000));

    // Phase 1: enqueue and drop the pool
    {
        let pool = create_pool(db_path).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let queue = SqliteJobQueue::new(pool, clock.clone());

        for (i, phase) in SyncPhase::ORDERED.into_iter().enumerate() {
            let job = SyncJob::new(
                format!("job-{}", i),
                1_000_000 + i as i64,
                SyncJobPayload::new("src-1", phase),
            );
            queue.enqueue(&job).await.unwrap();
        }
        // Pool dropped here: simulated daemon shutdown
    }

    // Phase 2: reopen and verify the queue drained nothing
    {
        let pool = create_pool(db_path).await.unwrap();
        let queue = SqliteJobQueue::new(pool, clock);

        assert_eq!(queue.count_by_state(JobState::Queued).await.unwrap(), 3);

        let first = queue.pop_next().await.unwrap().unwrap();
        assert_eq!(first.payload.phase, Some(SyncPhase::Users));
    }

    let _ = std::fs::remove_file(db_path);
}
