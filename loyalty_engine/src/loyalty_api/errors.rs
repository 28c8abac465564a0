use lps_common::Points;
use thiserror::Error;

use crate::{
    db_types::{InvalidOrderNumber, OrderNumber},
    traits::LoyaltyDatabaseError,
};

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("{0}")]
    InvalidOrderNumber(#[from] InvalidOrderNumber),
    #[error("Order {0} has already been submitted by another user")]
    OrderConflict(OrderNumber),
    #[error("The requested user id {0} does not exist")]
    UserNotFound(i64),
}

#[derive(Debug, Clone, Error)]
pub enum BalanceApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("{0}")]
    InvalidOrderNumber(#[from] InvalidOrderNumber),
    #[error("Withdrawal amounts must be positive, not {0}")]
    InvalidAmount(Points),
    #[error("Insufficient funds. Requested {requested}, but the balance is {available}")]
    InsufficientFunds { requested: Points, available: Points },
    #[error("The requested user id {0} does not exist")]
    UserNotFound(i64),
}

#[derive(Debug, Clone, Error)]
pub enum UserApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Login and password may not be empty")]
    InvalidCredentials,
    #[error("The login '{0}' is already taken")]
    LoginTaken(String),
    #[error("Unknown login or wrong password")]
    Unauthorized,
    #[error("The requested user id {0} does not exist")]
    UserNotFound(i64),
}

macro_rules! from_db_error {
    ($error:ident) => {
        impl From<LoyaltyDatabaseError> for $error {
            fn from(e: LoyaltyDatabaseError) -> Self {
                match e {
                    LoyaltyDatabaseError::DatabaseError(s) => $error::DatabaseError(s),
                    LoyaltyDatabaseError::UserNotFound(id) => $error::UserNotFound(id),
                }
            }
        }
    };
}

from_db_error!(OrderApiError);
from_db_error!(BalanceApiError);
from_db_error!(UserApiError);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn database_errors_keep_their_kind() {
        let e = UserApiError::from(LoyaltyDatabaseError::UserNotFound(7));
        assert!(matches!(e, UserApiError::UserNotFound(7)));
        let e = UserApiError::from(LoyaltyDatabaseError::DatabaseError("disk I/O error".into()));
        assert!(matches!(e, UserApiError::DatabaseError(s) if s == "disk I/O error"));
        let e = OrderApiError::from(LoyaltyDatabaseError::UserNotFound(3));
        assert!(matches!(e, OrderApiError::UserNotFound(3)));
        let e = BalanceApiError::from(LoyaltyDatabaseError::UserNotFound(4));
        assert!(matches!(e, BalanceApiError::UserNotFound(4)));
    }
}
