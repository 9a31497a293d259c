use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{Account, AccountUpdate};
use crate::shared::AppError;

/// Trait for account persistence operations
#[async_trait]
pub trait AccountStore {
    async fn create_account(&self, account: &Account) -> Result<(), AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;
    async fn update_fields(&self, id: &str, update: &AccountUpdate) -> Result<(), AppError>;
    async fn update_password_hash(&self, id: &str, password_hash: &str) -> Result<(), AppError>;
    /// Increments the token version and returns the new value. Tokens
    /// carrying an older version stop authenticating immediately.
    async fn bump_token_version(&self, id: &str) -> Result<i64, AppError>;
}

/// In-memory implementation of AccountStore for development and testing
///
/// This provides a realistic implementation that can be used in development
/// without requiring a real database connection. Data is stored in memory
/// and will be lost when the application restarts.
pub struct InMemoryAccountStore {
    accounts: Mutex<HashMap<String, Account>>,
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAccountStore {
    /// Creates a new empty in-memory store
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an in-memory store with pre-populated accounts
    pub fn with_accounts(accounts: Vec<Account>) -> Self {
        let mut account_map = HashMap::new();
        for account in accounts {
            account_map.insert(account.id.clone(), account);
        }

        Self {
            accounts: Mutex::new(account_map),
        }
    }

    /// Returns the current number of accounts in the store
    pub fn account_count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }

    /// Checks if an account exists by ID (useful for debugging)
    pub fn has_account(&self, id: &str) -> bool {
        self.accounts.lock().unwrap().contains_key(id)
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    #[instrument(skip(self, account))]
    async fn create_account(&self, account: &Account) -> Result<(), AppError> {
        debug!(id = %account.id, email = %account.email, "Creating account in memory");

        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(&account.id) {
            warn!(id = %account.id, "Account already exists in memory");
            return Err(AppError::Dependency("Account already exists".to_string()));
        }
        accounts.insert(account.id.clone(), account.clone());

        debug!(id = %account.id, "Account created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, AppError> {
        debug!(id = %id, "Fetching account from memory");

        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.get(id).cloned())
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        debug!(email = %email, "Fetching account by email from memory");

        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    #[instrument(skip(self, update))]
    async fn update_fields(&self, id: &str, update: &AccountUpdate) -> Result<(), AppError> {
        debug!(id = %id, "Updating account fields in memory");

        let mut accounts = self.accounts.lock().unwrap();
        match accounts.get_mut(id) {
            Some(account) => {
                update.apply_to(account);
                account.updated_at = Utc::now();
                debug!(id = %id, "Account fields updated successfully in memory");
                Ok(())
            }
            None => {
                warn!(id = %id, "Account not found for update in memory");
                Err(AppError::NotFound("Account not found".to_string()))
            }
        }
    }

    #[instrument(skip(self, password_hash))]
    async fn update_password_hash(&self, id: &str, password_hash: &str) -> Result<(), AppError> {
        debug!(id = %id, "Updating password hash in memory");

        let mut accounts = self.accounts.lock().unwrap();
        match accounts.get_mut(id) {
            Some(account) => {
                account.password_hash = password_hash.to_string();
                account.updated_at = Utc::now();
                Ok(())
            }
            None => {
                warn!(id = %id, "Account not found for password update in memory");
                Err(AppError::NotFound("Account not found".to_string()))
            }
        }
    }

    #[instrument(skip(self))]
    async fn bump_token_version(&self, id: &str) -> Result<i64, AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        match accounts.get_mut(id) {
            Some(account) => {
                account.token_version += 1;
                account.updated_at = Utc::now();
                debug!(id = %id, token_version = account.token_version, "Token version bumped in memory");
                Ok(account.token_version)
            }
            None => {
                warn!(id = %id, "Account not found for token version bump in memory");
                Err(AppError::NotFound("Account not found".to_string()))
            }
        }
    }
}

/// PostgreSQL implementation of the account store
pub struct PostgresAccountStore {
    pool: PgPool,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // age and gender are stored as BIGINT and SMALLINT; the narrower Rust
    // types are restored here
    fn row_to_account(row: &PgRow) -> Account {
        Account {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            phone: row.get("phone"),
            age: row.get::<Option<i64>, _>("age").map(|a| a as u32),
            gender: row.get::<Option<i16>, _>("gender").map(|g| g as u8),
            profile_picture: row.get("profile_picture"),
            token_version: row.get("token_version"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    #[instrument(skip(self, account))]
    async fn create_account(&self, account: &Account) -> Result<(), AppError> {
        debug!(id = %account.id, email = %account.email, "Creating account in database");

        sqlx::query(
            "INSERT INTO accounts (id, name, email, password_hash, phone, age, gender, profile_picture, token_version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(&account.id)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.phone)
        .bind(account.age.map(|a| a as i64))
        .bind(account.gender.map(|g| g as i16))
        .bind(&account.profile_picture)
        .bind(account.token_version)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create account in database");
            AppError::Dependency(e.to_string())
        })?;

        debug!(id = %account.id, "Account created successfully in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, AppError> {
        debug!(id = %id, "Fetching account from database");

        let row = sqlx::query(
            "SELECT id, name, email, password_hash, phone, age, gender, profile_picture, token_version, created_at, updated_at \
             FROM accounts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, id = %id, "Failed to fetch account from database");
            AppError::Dependency(e.to_string())
        })?;

        Ok(row.as_ref().map(Self::row_to_account))
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        debug!(email = %email, "Fetching account by email from database");

        let row = sqlx::query(
            "SELECT id, name, email, password_hash, phone, age, gender, profile_picture, token_version, created_at, updated_at \
             FROM accounts WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch account by email from database");
            AppError::Dependency(e.to_string())
        })?;

        Ok(row.as_ref().map(Self::row_to_account))
    }

    #[instrument(skip(self, update))]
    async fn update_fields(&self, id: &str, update: &AccountUpdate) -> Result<(), AppError> {
        debug!(id = %id, "Updating account fields in database");

        // COALESCE keeps the stored value wherever the update carries NULL
        let result = sqlx::query(
            "UPDATE accounts SET \
                 name = COALESCE($2, name), \
                 email = COALESCE($3, email), \
                 phone = COALESCE($4, phone), \
                 age = COALESCE($5, age), \
                 gender = COALESCE($6, gender), \
                 profile_picture = COALESCE($7, profile_picture), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.email)
        .bind(&update.phone)
        .bind(update.age.map(|a| a as i64))
        .bind(update.gender.map(|g| g as i16))
        .bind(&update.profile_picture)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, id = %id, "Failed to update account fields in database");
            AppError::Dependency(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            warn!(id = %id, "Account not found for update");
            return Err(AppError::NotFound("Account not found".to_string()));
        }

        debug!(id = %id, "Account fields updated successfully in database");
        Ok(())
    }

    #[instrument(skip(self, password_hash))]
    async fn update_password_hash(&self, id: &str, password_hash: &str) -> Result<(), AppError> {
        debug!(id = %id, "Updating password hash in database");

        let result = sqlx::query(
            "UPDATE accounts SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, id = %id, "Failed to update password hash in database");
                AppError::Dependency(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            warn!(id = %id, "Account not found for password update");
            return Err(AppError::NotFound("Account not found".to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn bump_token_version(&self, id: &str) -> Result<i64, AppError> {
        let row = sqlx::query(
            "UPDATE accounts SET token_version = token_version + 1, updated_at = NOW() \
             WHERE id = $1 RETURNING token_version",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, id = %id, "Failed to bump token version in database");
            AppError::Dependency(e.to_string())
        })?;

        match row {
            Some(row) => {
                let version: i64 = row.get("token_version");
                debug!(id = %id, token_version = version, "Token version bumped in database");
                Ok(version)
            }
            None => {
                warn!(id = %id, "Account not found for token version bump");
                Err(AppError::NotFound("Account not found".to_string()))
            }
        }
    }
}
