use crate::{
    db_types::{NewUser, User},
    traits::LoyaltyDatabaseError,
};

/// Storage for registered users.
#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Stores a new user. Returns `None` if the login is already taken.
    async fn insert_user(&self, user: NewUser) -> Result<Option<User>, LoyaltyDatabaseError>;

    async fn fetch_user_by_login(&self, login: &str) -> Result<Option<User>, LoyaltyDatabaseError>;

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, LoyaltyDatabaseError>;
}
