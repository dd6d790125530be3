use chrono::{DateTime, Utc};
use innkeep_shared::{Account, Masked};
use serde::Deserialize;
use uuid::Uuid;

use crate::credentials::hash_password;
use crate::{CoreError, CoreResult};

const MIN_PASSWORD_LEN: usize = 6;

/// Registration payload.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: Masked<String>,
    pub phone: String,
    pub country: String,
    pub city: String,
    #[serde(default)]
    pub img: Option<String>,
}

impl NewAccount {
    pub fn validate(&self) -> CoreResult<()> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        validate_password(self.password.expose())?;
        validate_phone(&self.phone)?;
        require("country", &self.country)?;
        require("city", &self.city)?;
        Ok(())
    }

    /// Validates and hashes the password. New accounts are never admins.
    pub fn into_account(self, now: DateTime<Utc>) -> CoreResult<Account> {
        self.validate()?;

        Ok(Account {
            id: Uuid::new_v4(),
            username: self.username.trim().to_string(),
            email: normalize_email(&self.email),
            password_hash: Masked::new(hash_password(self.password.expose())?),
            phone: self.phone.trim().to_string(),
            country: self.country.trim().to_string(),
            city: self.city.trim().to_string(),
            img: self.img.filter(|i| !i.trim().is_empty()),
            is_admin: false,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Login payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: Masked<String>,
}

impl LoginCredentials {
    pub fn validate(&self) -> CoreResult<()> {
        if self.username.trim().is_empty() {
            return Err(CoreError::ValidationError("username must not be empty".to_string()));
        }
        if self.password.expose().is_empty() {
            return Err(CoreError::ValidationError("password must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn username(&self) -> &str {
        self.username.trim()
    }
}

/// Per-field account update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<Masked<String>>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    /// An empty string clears the image.
    pub img: Option<String>,
    pub is_admin: Option<bool>,
}

impl AccountPatch {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(username) = &self.username {
            validate_username(username)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(password) = &self.password {
            validate_password(password.expose())?;
        }
        if let Some(phone) = &self.phone {
            validate_phone(phone)?;
        }
        if let Some(country) = &self.country {
            require("country", country)?;
        }
        if let Some(city) = &self.city {
            require("city", city)?;
        }
        Ok(())
    }

    /// Validates and merges into `account`. Only admins may change the admin
    /// flag; uniqueness of username and email is enforced by the store.
    pub fn apply(self, account: &mut Account, caller_is_admin: bool, now: DateTime<Utc>) -> CoreResult<()> {
        self.validate()?;

        if let Some(is_admin) = self.is_admin {
            if is_admin != account.is_admin && !caller_is_admin {
                return Err(CoreError::PermissionDenied(
                    "only admins can change the admin flag".to_string(),
                ));
            }
            if is_admin != account.is_admin {
                tracing::info!(account_id = %account.id, is_admin, "Admin flag changed");
            }
            account.is_admin = is_admin;
        }
        if let Some(username) = self.username {
            account.username = username.trim().to_string();
        }
        if let Some(email) = self.email {
            account.email = normalize_email(&email);
        }
        if let Some(password) = self.password {
            account.password_hash = Masked::new(hash_password(password.expose())?);
        }
        if let Some(phone) = self.phone {
            account.phone = phone.trim().to_string();
        }
        if let Some(country) = self.country {
            account.country = country.trim().to_string();
        }
        if let Some(city) = self.city {
            account.city = city.trim().to_string();
        }
        if let Some(img) = self.img {
            account.img = Some(img.trim().to_string()).filter(|i| !i.is_empty());
        }
        account.updated_at = now;
        Ok(())
    }
}

fn require(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::ValidationError(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn validate_username(username: &str) -> CoreResult<()> {
    let username = username.trim();
    let len = username.chars().count();
    if !(3..=32).contains(&len) {
        return Err(CoreError::ValidationError(
            "username must be between 3 and 32 characters".to_string(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(CoreError::ValidationError(
            "username may only contain letters, digits, '_', '.' and '-'".to_string(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> CoreResult<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(CoreError::ValidationError(format!("'{}' is not a valid email", email)));
    }
    Ok(())
}

fn validate_password(password: &str) -> CoreResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CoreError::ValidationError(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn validate_phone(phone: &str) -> CoreResult<()> {
    let phone = phone.trim();
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if digits == 0
        || !phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
    {
        return Err(CoreError::ValidationError(format!("'{}' is not a valid phone number", phone)));
    }
    Ok(())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
