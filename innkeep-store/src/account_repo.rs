use async_trait::async_trait;
use chrono::{DateTime, Utc};
use innkeep_core::{AccountRepository, RepoError, RepoResult};
use innkeep_shared::{Account, Masked};
use sqlx::PgPool;
use uuid::Uuid;

use crate::map_sqlx_error;

pub struct StoreAccountRepository {
    pool: PgPool,
}

impl StoreAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ACCOUNT_COLUMNS: &str =
    "id, username, email, password_hash, phone, country, city, img, is_admin, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    phone: String,
    country: String,
    city: String,
    img: Option<String>,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: Masked::new(row.password_hash),
            phone: row.phone,
            country: row.country,
            city: row.city,
            img: row.img,
            is_admin: row.is_admin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl AccountRepository for StoreAccountRepository {
    async fn create_account(&self, account: &Account) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, username, email, password_hash, phone, country, city, img, is_admin, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.email)
        .bind(account.password_hash.expose())
        .bind(&account.phone)
        .bind(&account.country)
        .bind(&account.city)
        .bind(&account.img)
        .bind(account.is_admin)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn get_account(&self, id: Uuid) -> RepoResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Account::from))
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts WHERE username = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Account::from))
    }

    async fn list_accounts(&self) -> RepoResult<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts ORDER BY created_at, id",
            ACCOUNT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Account::from).collect())
    }

    async fn update_account(&self, account: &Account) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET username = $1, email = $2, password_hash = $3, phone = $4, country = $5,
                city = $6, img = $7, is_admin = $8, updated_at = $9
            WHERE id = $10
            "#,
        )
        .bind(&account.username)
        .bind(&account.email)
        .bind(account.password_hash.expose())
        .bind(&account.phone)
        .bind(&account.country)
        .bind(&account.city)
        .bind(&account.img)
        .bind(account.is_admin)
        .bind(account.updated_at)
        .bind(account.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found("account", account.id));
        }
        Ok(())
    }

    async fn delete_account(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found("account", id));
        }
        Ok(())
    }
}
