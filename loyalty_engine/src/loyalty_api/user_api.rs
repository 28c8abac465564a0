use std::fmt::Debug;

use blake2::{Blake2b512, Digest};
use log::*;
use lps_common::Secret;
use rand::RngCore;

use crate::{
    db_types::{NewUser, User},
    loyalty_api::errors::UserApiError,
    traits::UserManagement,
};

const SALT_LENGTH: usize = 16;

/// `UserApi` registers users and checks their credentials. Passwords are stored as a salted BLAKE2b-512 hash.
pub struct UserApi<B> {
    db: B,
}

impl<B> Debug for UserApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UserApi")
    }
}

impl<B> UserApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> UserApi<B>
where B: UserManagement
{
    pub async fn register(&self, login: &str, password: Secret<String>) -> Result<User, UserApiError> {
        if login.is_empty() || password.reveal().is_empty() {
            return Err(UserApiError::InvalidCredentials);
        }
        let mut salt = vec![0u8; SALT_LENGTH];
        rand::thread_rng().fill_bytes(&mut salt);
        let password_hash = hash_password(&salt, &password);
        let new_user = NewUser { login: login.to_string(), password_hash, salt };
        match self.db.insert_user(new_user).await? {
            Some(user) => {
                info!("🧑️ Registered user '{login}' as #{}", user.id);
                Ok(user)
            },
            None => Err(UserApiError::LoginTaken(login.to_string())),
        }
    }

    /// Returns the user if the login exists and the password matches. Both failures look the same to the caller.
    pub async fn authenticate(&self, login: &str, password: Secret<String>) -> Result<User, UserApiError> {
        let user = self.db.fetch_user_by_login(login).await?.ok_or(UserApiError::Unauthorized)?;
        if hash_password(&user.salt, &password) == user.password_hash {
            trace!("🧑️ User '{login}' authenticated");
            Ok(user)
        } else {
            debug!("🧑️ Wrong password for user '{login}'");
            Err(UserApiError::Unauthorized)
        }
    }

    pub async fn user(&self, user_id: i64) -> Result<Option<User>, UserApiError> {
        let user = self.db.fetch_user(user_id).await?;
        Ok(user)
    }
}

fn hash_password(salt: &[u8], password: &Secret<String>) -> Vec<u8> {
    let mut hasher = Blake2b512::new();
    hasher.update(salt);
    hasher.update(password.reveal().as_bytes());
    hasher.finalize().to_vec()
}
