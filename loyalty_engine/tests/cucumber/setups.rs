use cucumber::given;
use loyalty_engine::UserApi;
use lps_common::Secret;

use crate::cucumber::{LoyaltySystem, LoyaltyWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut LoyaltyWorld) {
    let system = LoyaltySystem::new().await;
    world.system = Some(system);
}

#[given(expr = "user '{word}' is registered")]
async fn register_user(world: &mut LoyaltyWorld, login: String) {
    let api = UserApi::new(world.system().db.clone());
    let user = api.register(&login, Secret::from("secret")).await.expect("Error registering user");
    world.system_mut().users.insert(login, user.id);
}
