use std::sync::Arc;

use async_trait::async_trait;
use signbook_core::{
    accounts::{AccountError, Accounts, NewAccount, Outcome},
    records::{PublicUserRecord, UserRecord},
    store::RecordStore,
};
use tracing::{info, instrument, warn};

/// Account operations backed by a `RecordStore`.
pub struct AccountService<S: RecordStore> {
    store: Arc<S>,
}

impl<S: RecordStore> AccountService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: RecordStore> Accounts for AccountService<S> {
    #[instrument(skip_all, fields(email = %account.email.trim()))]
    async fn register(&self, account: NewAccount) -> Result<Outcome, AccountError> {
        let record = UserRecord::from(account).trimmed();
        require(&[
            ("name", record.name.as_str()),
            ("email", record.email.as_str()),
            ("phone", record.phone.as_str()),
            ("password", record.password.as_str()),
            ("gender", record.gender.as_str()),
        ])?;

        if !self.store.append_if_absent(&record).await? {
            warn!("registration rejected, email already taken");
            return Err(AccountError::Conflict {
                email: record.email,
            });
        }
        info!("account created");
        Ok(Outcome::Created)
    }

    #[instrument(skip_all, fields(email = %email.trim()))]
    async fn authenticate(&self, email: &str, password: &str) -> Result<Outcome, AccountError> {
        let records = self.store.read_all().await?;
        if records
            .iter()
            .any(|r| r.email == email && r.password == password)
        {
            Ok(Outcome::Authenticated)
        } else {
            warn!("authentication failed");
            Err(AccountError::InvalidCredentials)
        }
    }

    #[instrument(skip_all, fields(email = %email.trim()))]
    async fn verify_identity(&self, email: &str, phone: &str) -> Result<Outcome, AccountError> {
        require(&[("email", email), ("phone", phone)])?;

        let records = self.store.read_all().await?;
        if records.iter().any(|r| r.email == email && r.phone == phone) {
            Ok(Outcome::Verified)
        } else {
            Err(AccountError::NotFound)
        }
    }

    #[instrument(skip_all, fields(email = %email.trim()))]
    async fn reset_credential(
        &self,
        email: &str,
        new_password: &str,
    ) -> Result<Outcome, AccountError> {
        require(&[("email", email), ("newPassword", new_password)])?;

        let set_password = |record: &mut UserRecord| record.password = new_password.to_string();
        match self.store.update_if_present(email, &set_password).await? {
            Some(_) => {
                info!("password reset");
                Ok(Outcome::Updated)
            }
            None => Err(AccountError::NotFound),
        }
    }

    #[instrument(skip_all)]
    async fn list_users(&self) -> Result<Vec<PublicUserRecord>, AccountError> {
        let records = self.store.read_all().await?;
        Ok(records.into_iter().map(PublicUserRecord::from).collect())
    }
}

/// Fails with `Validation` naming every empty or whitespace-only field.
/// Values are only inspected; callers compare them verbatim.
fn require(fields: &[(&str, &str)]) -> Result<(), AccountError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AccountError::Validation {
            fields: missing.join(", "),
        })
    }
}
