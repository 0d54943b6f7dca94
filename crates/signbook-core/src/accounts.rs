use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    records::{PublicUserRecord, UserRecord},
    store::StoreError,
};

/// Registration input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub gender: String,
}

impl From<NewAccount> for UserRecord {
    fn from(account: NewAccount) -> Self {
        UserRecord {
            name: account.name,
            email: account.email,
            phone: account.phone,
            password: account.password,
            gender: account.gender,
        }
    }
}

/// Successful result of an account operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Authenticated,
    Verified,
    Updated,
}

/// Failure categories, used by callers to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    InvalidCredentials,
    StorageRead,
    StorageWrite,
}

/// Errors returned by account operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    /// A required input was missing or blank.
    #[error("missing required field(s): {fields}")]
    Validation { fields: String },
    /// A record with this email already exists.
    #[error("an account already exists for {email}")]
    Conflict { email: String },
    /// No record matched the lookup.
    #[error("no matching account")]
    NotFound,
    /// Unknown email or wrong password; deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("{reason}")]
    StorageRead { reason: String },
    #[error("{reason}")]
    StorageWrite { reason: String },
}

impl AccountError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountError::Validation { .. } => ErrorKind::Validation,
            AccountError::Conflict { .. } => ErrorKind::Conflict,
            AccountError::NotFound => ErrorKind::NotFound,
            AccountError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AccountError::StorageRead { .. } => ErrorKind::StorageRead,
            AccountError::StorageWrite { .. } => ErrorKind::StorageWrite,
        }
    }

    /// True for failures the caller cannot correct by changing its input.
    pub fn is_storage(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::StorageRead | ErrorKind::StorageWrite
        )
    }
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Read { .. } => AccountError::StorageRead {
                reason: err.to_string(),
            },
            StoreError::Write { .. } => AccountError::StorageWrite {
                reason: err.to_string(),
            },
        }
    }
}

/// Account operations exposed to the request boundary.
#[async_trait]
pub trait Accounts: Send + Sync {
    /// Create a new account; fails with `Conflict` if the email is taken.
    async fn register(&self, account: NewAccount) -> Result<Outcome, AccountError>;

    /// Check an email/password pair.
    async fn authenticate(&self, email: &str, password: &str) -> Result<Outcome, AccountError>;

    /// Check that an account with this email and phone exists.
    async fn verify_identity(&self, email: &str, phone: &str) -> Result<Outcome, AccountError>;

    /// Replace the password of the account keyed by `email`.
    async fn reset_credential(
        &self,
        email: &str,
        new_password: &str,
    ) -> Result<Outcome, AccountError>;

    /// All accounts without their passwords, in registration order.
    async fn list_users(&self) -> Result<Vec<PublicUserRecord>, AccountError>;
}
