//! PostgreSQL 仓储集成测试
//!
//! 需要可用的数据库，默认忽略：
//! `DATABASE_URL=postgres://... cargo test -p achievement-engine -- --ignored`

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;

use achievement_engine::{
    AchievementEngine, AwardLedger, AwardOutcome, BadgeAwardRepository, BadgeId, JourneyService,
    LogStore, NewTravelLog, TravelLogRepository,
};
use achievement_shared::database::Database;
use achievement_shared::test_utils::{
    TestDataGenerator, test_database_config, test_engine_config, test_user_id,
};

async fn setup() -> PgPool {
    let db = Database::connect(&test_database_config()).await.unwrap();
    db.run_migrations().await.unwrap();
    db.pool().clone()
}

async fn create_user(pool: &PgPool, display_name: &str) -> i64 {
    let user_id = test_user_id();
    sqlx::query("INSERT INTO users (id, display_name) VALUES ($1, $2)")
        .bind(user_id)
        .bind(display_name)
        .execute(pool)
        .await
        .unwrap();
    user_id
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_try_award_is_idempotent() {
    let pool = setup().await;
    let user_id = create_user(&pool, "Ada").await;
    let repo = BadgeAwardRepository::new(pool);

    let first = repo
        .try_award(user_id, BadgeId::FirstJourney, Utc::now())
        .await
        .unwrap();
    let second = repo
        .try_award(user_id, BadgeId::FirstJourney, Utc::now())
        .await
        .unwrap();

    assert_eq!(first, AwardOutcome::Inserted);
    assert_eq!(second, AwardOutcome::AlreadyOwned);
    assert!(repo.has_award(user_id, BadgeId::FirstJourney).await.unwrap());
    assert_eq!(repo.list_awards(user_id).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires PostgreSQL"]
async fn test_concurrent_try_award_converges_to_one_row() {
    let pool = setup().await;
    let user_id = create_user(&pool, "Bo").await;
    let repo = Arc::new(BadgeAwardRepository::new(pool.clone()));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.try_award(user_id, BadgeId::SharedYear, Utc::now())
                .await
                .unwrap()
        }));
    }

    let mut inserted = 0;
    for handle in handles {
        if handle.await.unwrap().is_inserted() {
            inserted += 1;
        }
    }
    assert_eq!(inserted, 1);

    let rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM badge_awards WHERE user_id = $1 AND badge_id = $2",
    )
    .bind(user_id)
    .bind(BadgeId::SharedYear.as_str())
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_insert_log_for_missing_user_fails() {
    let pool = setup().await;
    let repo = TravelLogRepository::new(pool);

    let err = repo
        .insert_log(&NewTravelLog::new(-1, 1900, "nowhere"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "USER_NOT_FOUND");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_other_travelers_excludes_actor() {
    let pool = setup().await;
    let a = create_user(&pool, "Ada").await;
    let b = create_user(&pool, "Bo").await;
    let year = a;
    let repo = TravelLogRepository::new(pool);

    for user_id in [a, b, b] {
        repo.insert_log(&NewTravelLog::new(user_id, year, "same year"))
            .await
            .unwrap();
    }

    let others = repo.find_other_travelers_in_year(year, a).await.unwrap();
    assert_eq!(others.len(), 1);
    assert_eq!(others[0].user_id, b);
    assert_eq!(others[0].display_name, "Bo");
    assert_eq!(repo.count_logs_by_user(b).await.unwrap(), 2);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_list_logs_by_user_newest_first() {
    let pool = setup().await;
    let user_id = create_user(&pool, "Dora").await;
    let repo = TravelLogRepository::new(pool);

    for year in [1066, 1492, 1969] {
        repo.insert_log(&NewTravelLog::new(user_id, year, "trip"))
            .await
            .unwrap();
    }

    let logs = repo.list_logs_by_user(user_id).await.unwrap();
    let years: Vec<_> = logs.iter().map(|l| l.year_visited).collect();
    assert_eq!(years, vec![1969, 1492, 1066]);
    assert!(logs.windows(2).all(|w| w[0].created_at >= w[1].created_at));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_journey_flow_against_postgres() {
    let pool = setup().await;
    let user_id = create_user(&pool, "Cleo").await;
    let store = Arc::new(TravelLogRepository::new(pool.clone()));
    let ledger = Arc::new(BadgeAwardRepository::new(pool));
    let engine = Arc::new(
        AchievementEngine::standard(test_engine_config(), store.clone(), ledger.clone()).unwrap(),
    );
    let journeys = JourneyService::new(store, engine);

    let recorded = journeys
        .record_journey(NewTravelLog::new(
            user_id,
            user_id,
            TestDataGenerator::story_with_words(100),
        ))
        .await
        .unwrap();

    assert!(recorded.outcome.contains(BadgeId::FirstJourney));
    assert!(recorded.outcome.contains(BadgeId::ExactHundredWords));
    assert!(recorded.outcome.contains(BadgeId::MultiBadgeMeta));
    assert_eq!(ledger.list_awards(user_id).await.unwrap().len(), 3);
}
