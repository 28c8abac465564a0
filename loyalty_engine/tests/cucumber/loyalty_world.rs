use std::{collections::HashMap, fmt::Debug, time::Duration};

use cucumber::World;
use log::*;
use loyalty_engine::{
    accrual::{shutdown_channel, AccrualClient, AccrualConfig, AccrualLoop, CycleReport, RetryPolicy},
    db_types::Withdrawal,
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        scripted_oracle::ScriptedOracle,
    },
    BalanceApi,
    BalanceApiError,
    OrderApi,
    OrderApiError,
    SqliteDatabase,
    SubmitOrderResult,
};

#[derive(Default, Debug, World)]
pub struct LoyaltyWorld {
    pub system: Option<LoyaltySystem>,
    pub last_submission: Option<Result<SubmitOrderResult, OrderApiError>>,
    pub last_withdrawal: Option<Result<Withdrawal, BalanceApiError>>,
}

pub struct LoyaltySystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub oracle: ScriptedOracle,
    pub users: HashMap<String, i64>,
}

impl Debug for LoyaltySystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LoyaltySystem({})", self.db_path)
    }
}

impl LoyaltyWorld {
    pub fn system(&self) -> &LoyaltySystem {
        self.system.as_ref().expect("System not initialised")
    }

    pub fn system_mut(&mut self) -> &mut LoyaltySystem {
        self.system.as_mut().expect("System not initialised")
    }
}

impl LoyaltySystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        Self { db_path: url, db, oracle: ScriptedOracle::default(), users: HashMap::new() }
    }

    pub fn user_id(&self, login: &str) -> i64 {
        *self.users.get(login).unwrap_or_else(|| panic!("User '{login}' has not been registered"))
    }

    pub fn order_api(&self) -> OrderApi<SqliteDatabase> {
        OrderApi::new(self.db.clone())
    }

    pub fn balance_api(&self) -> BalanceApi<SqliteDatabase> {
        BalanceApi::new(self.db.clone())
    }

    pub async fn run_accrual_cycle(&self) -> CycleReport {
        let config = AccrualConfig {
            oracle_url: "http://localhost".into(),
            retry: RetryPolicy {
                max_attempts: 3,
                retry_delay: Duration::from_millis(10),
                attempt_timeout: Duration::from_secs(5),
            },
            ..AccrualConfig::default()
        };
        let client = AccrualClient::new(self.oracle.clone(), config.retry);
        let mut accrual_loop = AccrualLoop::new(self.db.clone(), client, &config);
        let (_trigger, mut shutdown) = shutdown_channel();
        accrual_loop.run_cycle(&mut shutdown).await
    }
}
