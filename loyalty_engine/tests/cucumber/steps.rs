use std::str::FromStr;

use cucumber::{given, then, when};
use loyalty_engine::{
    db_types::{OrderNumber, OrderStatusType},
    BalanceApiError,
    LoyaltyDatabase,
    OrderApiError,
    SubmitOrderResult,
};
use lps_common::Points;

use crate::cucumber::LoyaltyWorld;

#[when(expr = "'{word}' submits order {word}")]
async fn submit_order(world: &mut LoyaltyWorld, login: String, number: String) {
    let system = world.system();
    let user_id = system.user_id(&login);
    let result = system.order_api().submit_order(user_id, &number).await;
    world.last_submission = Some(result);
}

#[then("the order is accepted")]
async fn order_accepted(world: &mut LoyaltyWorld) {
    let result = world.last_submission.as_ref().expect("Nothing was submitted");
    assert!(matches!(result, Ok(SubmitOrderResult::Accepted(_))), "Unexpected result: {result:?}");
}

#[then("the order was already accepted")]
async fn order_already_accepted(world: &mut LoyaltyWorld) {
    let result = world.last_submission.as_ref().expect("Nothing was submitted");
    assert!(matches!(result, Ok(SubmitOrderResult::AlreadyAccepted(_))), "Unexpected result: {result:?}");
}

#[then("the order is rejected as a conflict")]
async fn order_conflict(world: &mut LoyaltyWorld) {
    let result = world.last_submission.as_ref().expect("Nothing was submitted");
    assert!(matches!(result, Err(OrderApiError::OrderConflict(_))), "Unexpected result: {result:?}");
}

#[then("the order is rejected as invalid")]
async fn order_invalid(world: &mut LoyaltyWorld) {
    let result = world.last_submission.as_ref().expect("Nothing was submitted");
    assert!(matches!(result, Err(OrderApiError::InvalidOrderNumber(_))), "Unexpected result: {result:?}");
}

#[given(expr = "the oracle answers {string} for order {word}")]
async fn oracle_answers(world: &mut LoyaltyWorld, body: String, number: String) {
    world.system().oracle.reply_json(&number, &body);
}

#[given(expr = "the oracle fails with status {int} for order {word}")]
async fn oracle_fails(world: &mut LoyaltyWorld, status: u16, number: String) {
    world.system().oracle.reply_status(&number, status);
}

#[given(expr = "'{word}' has been credited {int} points for order {word}")]
async fn credit_user(world: &mut LoyaltyWorld, login: String, points: i64, number: String) {
    let system = world.system();
    let user_id = system.user_id(&login);
    system.order_api().submit_order(user_id, &number).await.expect("Error submitting order");
    system.oracle.reply_processed(&number, points);
    let report = system.run_accrual_cycle().await;
    assert_eq!(report.batch.applied, 1, "Credit was not applied: {report:?}");
}

#[when("the accrual loop runs a cycle")]
async fn run_cycle(world: &mut LoyaltyWorld) {
    world.system().run_accrual_cycle().await;
}

#[when(expr = "'{word}' withdraws {int} points against order {word}")]
async fn withdraw(world: &mut LoyaltyWorld, login: String, points: i64, number: String) {
    let system = world.system();
    let user_id = system.user_id(&login);
    let result = system.balance_api().withdraw(user_id, &number, Points::from_points(points)).await;
    world.last_withdrawal = Some(result);
}

#[then("the withdrawal is rejected for insufficient funds")]
async fn insufficient_funds(world: &mut LoyaltyWorld) {
    let result = world.last_withdrawal.as_ref().expect("Nothing was withdrawn");
    assert!(matches!(result, Err(BalanceApiError::InsufficientFunds { .. })), "Unexpected result: {result:?}");
}

#[then("the withdrawal succeeds")]
async fn withdrawal_succeeds(world: &mut LoyaltyWorld) {
    let result = world.last_withdrawal.as_ref().expect("Nothing was withdrawn");
    assert!(result.is_ok(), "Unexpected result: {result:?}");
}

async fn fetch_order(world: &LoyaltyWorld, number: &str) -> loyalty_engine::db_types::Order {
    let number = OrderNumber::from_str(number).expect("Not a valid order number");
    world.system().db.fetch_order_by_number(&number).await.expect("Error fetching order").expect("Order does not exist")
}

#[then(expr = "order {word} has status {word}")]
async fn check_status(world: &mut LoyaltyWorld, number: String, status: String) {
    let order = fetch_order(world, &number).await;
    let expected = OrderStatusType::from_str(&status).expect("Not a valid order status");
    assert_eq!(order.status, expected);
}

#[then(expr = "order {word} has an accrual of {int} points")]
async fn check_accrual(world: &mut LoyaltyWorld, number: String, points: i64) {
    let order = fetch_order(world, &number).await;
    assert_eq!(order.accrual, Some(Points::from_points(points)));
}

#[then(expr = "order {word} has no accrual")]
async fn check_no_accrual(world: &mut LoyaltyWorld, number: String) {
    let order = fetch_order(world, &number).await;
    assert_eq!(order.accrual, None);
}

#[then(expr = "order {word} belongs to '{word}'")]
async fn check_owner(world: &mut LoyaltyWorld, number: String, login: String) {
    let order = fetch_order(world, &number).await;
    assert_eq!(order.user_id, world.system().user_id(&login));
}

#[then(expr = "the balance of '{word}' is {int} points")]
async fn check_balance(world: &mut LoyaltyWorld, login: String, points: i64) {
    let system = world.system();
    let balance = system.balance_api().balance(system.user_id(&login)).await.expect("Error fetching balance");
    assert_eq!(balance.current, Points::from_points(points));
}

#[then(expr = "'{word}' has withdrawn {int} points")]
async fn check_withdrawn(world: &mut LoyaltyWorld, login: String, points: i64) {
    let system = world.system();
    let balance = system.balance_api().balance(system.user_id(&login)).await.expect("Error fetching balance");
    assert_eq!(balance.withdrawn, Points::from_points(points));
}

#[then(expr = "'{word}' has {int} withdrawals")]
async fn check_withdrawal_count(world: &mut LoyaltyWorld, login: String, count: usize) {
    let system = world.system();
    let withdrawals =
        system.balance_api().withdrawals(system.user_id(&login)).await.expect("Error fetching withdrawals");
    assert_eq!(withdrawals.len(), count);
}
