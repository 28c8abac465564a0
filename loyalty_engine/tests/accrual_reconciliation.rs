//! The accrual loop running against a real SQLite store, with a scripted oracle standing in for the accrual service.
use std::{str::FromStr, time::Duration};

use loyalty_engine::{
    accrual::{shutdown_channel, AccrualClient, AccrualConfig, AccrualLoop, LoopState, RetryPolicy},
    db_types::{OrderNumber, OrderStatusType},
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        scripted_oracle::ScriptedOracle,
    },
    BalanceApi,
    LoyaltyDatabase,
    OrderApi,
    SqliteDatabase,
    UserApi,
};
use lps_common::{Points, Secret};
use sqlx::{migrate::MigrateDatabase, Sqlite};

fn config() -> AccrualConfig {
    AccrualConfig {
        oracle_url: "http://localhost".into(),
        concurrency: 3,
        batch_size: 10,
        poll_interval: Duration::from_millis(50),
        retry: RetryPolicy {
            max_attempts: 3,
            retry_delay: Duration::from_millis(10),
            attempt_timeout: Duration::from_secs(5),
        },
        shutdown_grace_period: Duration::from_secs(5),
    }
}

async fn setup() -> (String, SqliteDatabase, i64) {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    let alice = UserApi::new(db.clone()).register("alice", Secret::from("pw")).await.expect("Error registering alice");
    (url, db, alice.id)
}

async fn cleanup(url: &str, mut db: SqliteDatabase) {
    db.close().await.expect("Error closing database");
    Sqlite::drop_database(url).await.expect("Error dropping database");
}

async fn order_status(db: &SqliteDatabase, number: &str) -> (OrderStatusType, Option<Points>) {
    let number = OrderNumber::from_str(number).unwrap();
    let order = db.fetch_order_by_number(&number).await.unwrap().expect("Order does not exist");
    (order.status, order.accrual)
}

#[tokio::test]
async fn processed_verdict_credits_the_owner() {
    let (url, db, alice) = setup().await;
    OrderApi::new(db.clone()).submit_order(alice, "12345678903").await.unwrap();
    let oracle = ScriptedOracle::default();
    oracle.reply_json("12345678903", r#"{"order":"12345678903","status":"PROCESSED","accrual":500}"#);
    let config = config();
    let mut accrual_loop = AccrualLoop::new(db.clone(), AccrualClient::new(oracle.clone(), config.retry), &config);
    let (_trigger, mut shutdown) = shutdown_channel();
    let report = accrual_loop.run_cycle(&mut shutdown).await;
    assert_eq!(report.selected, 1);
    assert_eq!(report.batch.applied, 1);
    assert_eq!(order_status(&db, "12345678903").await, (OrderStatusType::Processed, Some(Points::from_points(500))));
    let balance = BalanceApi::new(db.clone()).balance(alice).await.unwrap();
    assert_eq!(balance.current, Points::from_points(500));
    // Nothing is pending any more
    let report = accrual_loop.run_cycle(&mut shutdown).await;
    assert_eq!(report.selected, 0);
    assert_eq!(oracle.calls(), 1);
    cleanup(&url, db).await;
}

#[tokio::test]
async fn invalid_verdict_leaves_the_balance_alone() {
    let (url, db, alice) = setup().await;
    OrderApi::new(db.clone()).submit_order(alice, "79927398713").await.unwrap();
    let oracle = ScriptedOracle::default();
    oracle.reply_verdict("79927398713", "INVALID");
    let config = config();
    let mut accrual_loop = AccrualLoop::new(db.clone(), AccrualClient::new(oracle, config.retry), &config);
    let (_trigger, mut shutdown) = shutdown_channel();
    accrual_loop.run_cycle(&mut shutdown).await;
    assert_eq!(order_status(&db, "79927398713").await, (OrderStatusType::Invalid, None));
    let balance = BalanceApi::new(db.clone()).balance(alice).await.unwrap();
    assert_eq!(balance.current, Points::ZERO);
    cleanup(&url, db).await;
}

#[tokio::test]
async fn orders_move_through_processing() {
    let (url, db, alice) = setup().await;
    OrderApi::new(db.clone()).submit_order(alice, "12345678903").await.unwrap();
    let oracle = ScriptedOracle::default();
    oracle.reply_verdict("12345678903", "REGISTERED");
    oracle.reply_verdict("12345678903", "PROCESSING");
    oracle.reply_processed("12345678903", 20);
    let config = config();
    let mut accrual_loop = AccrualLoop::new(db.clone(), AccrualClient::new(oracle, config.retry), &config);
    let (_trigger, mut shutdown) = shutdown_channel();
    let report = accrual_loop.run_cycle(&mut shutdown).await;
    assert_eq!(report.batch.ignored, 1);
    assert_eq!(order_status(&db, "12345678903").await, (OrderStatusType::New, None));
    accrual_loop.run_cycle(&mut shutdown).await;
    assert_eq!(order_status(&db, "12345678903").await, (OrderStatusType::Processing, None));
    accrual_loop.run_cycle(&mut shutdown).await;
    assert_eq!(order_status(&db, "12345678903").await, (OrderStatusType::Processed, Some(Points::from_points(20))));
    cleanup(&url, db).await;
}

#[tokio::test]
async fn failed_fetches_are_retried_on_the_next_cycle() {
    let (url, db, alice) = setup().await;
    OrderApi::new(db.clone()).submit_order(alice, "12345678903").await.unwrap();
    let oracle = ScriptedOracle::default();
    for _ in 0..3 {
        oracle.reply_status("12345678903", 500);
    }
    oracle.reply_processed("12345678903", 7);
    let config = config();
    let mut accrual_loop = AccrualLoop::new(db.clone(), AccrualClient::new(oracle.clone(), config.retry), &config);
    let (_trigger, mut shutdown) = shutdown_channel();
    let report = accrual_loop.run_cycle(&mut shutdown).await;
    assert_eq!(report.batch.fetch_failed, 1);
    assert_eq!(order_status(&db, "12345678903").await, (OrderStatusType::New, None));
    let report = accrual_loop.run_cycle(&mut shutdown).await;
    assert_eq!(report.batch.applied, 1);
    assert_eq!(oracle.calls(), 4);
    assert_eq!(order_status(&db, "12345678903").await, (OrderStatusType::Processed, Some(Points::from_points(7))));
    cleanup(&url, db).await;
}

#[tokio::test]
async fn running_loop_settles_every_order_and_stops_on_request() {
    let (url, db, alice) = setup().await;
    let api = OrderApi::new(db.clone());
    let oracle = ScriptedOracle::default().with_latency(Duration::from_millis(5));
    let numbers = ["12345678903", "79927398713", "4561261212345467", "2377225624", "49927398716", "1234567812345670"];
    for (i, n) in numbers.iter().enumerate() {
        api.submit_order(alice, n).await.unwrap();
        oracle.reply_processed(n, 10 * (i as i64 + 1));
    }
    let config = AccrualConfig { batch_size: 4, ..config() };
    let mut accrual_loop = AccrualLoop::new(db.clone(), AccrualClient::new(oracle.clone(), config.retry), &config);
    let (trigger, shutdown) = shutdown_channel();
    let handle = tokio::spawn(async move {
        accrual_loop.run(shutdown).await;
        accrual_loop.state()
    });
    let balance_api = BalanceApi::new(db.clone());
    let expected = Points::from_points(210);
    let mut balance = Points::ZERO;
    for _ in 0..100 {
        balance = balance_api.balance(alice).await.unwrap().current;
        if balance == expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(balance, expected);
    trigger.trigger();
    let state = tokio::time::timeout(Duration::from_secs(5), handle).await.expect("Loop did not stop").unwrap();
    assert_eq!(state, LoopState::Stopped);
    assert_eq!(oracle.calls(), numbers.len());
    cleanup(&url, db).await;
}
