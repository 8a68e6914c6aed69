use cwk_schemas::{Account, Course, NewAccount};
use tracing::info;

use crate::{CatalogError, Store};

/// Register an account. The credential arrives already hashed.
pub async fn create_account(store: &dyn Store, new: NewAccount) -> Result<Account, CatalogError> {
    if new.username.trim().is_empty() {
        return Err(CatalogError::InvalidInput("username is required".to_string()));
    }
    if new.credential_hash.is_empty() {
        return Err(CatalogError::InvalidInput("credential is required".to_string()));
    }

    let mut tx = store.begin().await?;
    let account = tx.insert_account(&new).await?;
    tx.commit().await?;

    info!(username = %account.username, "account created");
    Ok(account)
}

pub async fn account(store: &dyn Store, username: &str) -> Result<Account, CatalogError> {
    let mut tx = store.begin().await?;
    tx.account(username)
        .await?
        .ok_or_else(|| CatalogError::not_found("account", username))
}

/// Delete an account together with the courses it created and its progress.
pub async fn remove_account(store: &dyn Store, username: &str) -> Result<(), CatalogError> {
    let mut tx = store.begin().await?;
    if !tx.delete_account(username).await? {
        return Err(CatalogError::not_found("account", username));
    }
    tx.commit().await?;

    info!(username, "account removed");
    Ok(())
}

/// Courses authored by `username`, by title.
pub async fn created_courses(store: &dyn Store, username: &str) -> Result<Vec<Course>, CatalogError> {
    let mut tx = store.begin().await?;
    if tx.account(username).await?.is_none() {
        return Err(CatalogError::not_found("account", username));
    }
    tx.courses_created_by(username).await
}

/// Courses `username` is enrolled in, by title.
pub async fn enrolled_courses(
    store: &dyn Store,
    username: &str,
) -> Result<Vec<Course>, CatalogError> {
    let mut tx = store.begin().await?;
    if tx.account(username).await?.is_none() {
        return Err(CatalogError::not_found("account", username));
    }
    tx.courses_enrolled_by(username).await
}
