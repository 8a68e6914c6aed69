use cwk_catalog::CatalogError;

/// SQLSTATEs a caller may retry: serialization failure, deadlock,
/// lock_timeout expiry, statement cancelled.
const TRANSIENT_CODES: &[&str] = &["40001", "40P01", "55P03", "57014"];
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Map a driver error onto the catalog's error classes. `what` names the
/// statement for the message.
pub(crate) fn db_err(what: &str) -> impl FnOnce(sqlx::Error) -> CatalogError + '_ {
    move |e| classify(what, e)
}

pub(crate) fn classify(what: &str, e: sqlx::Error) -> CatalogError {
    match &e {
        sqlx::Error::Database(db) => {
            let code = db.code().map(|c| c.into_owned()).unwrap_or_default();
            if TRANSIENT_CODES.contains(&code.as_str()) {
                CatalogError::transient(format!("{what}: {db} (sqlstate {code})"))
            } else if code == UNIQUE_VIOLATION {
                CatalogError::Conflict(format!(
                    "{what}: duplicate violates {}",
                    db.constraint().unwrap_or("unique constraint")
                ))
            } else if code == FOREIGN_KEY_VIOLATION {
                CatalogError::NotFound(format!(
                    "{what}: referenced row missing ({})",
                    db.constraint().unwrap_or("foreign key")
                ))
            } else {
                CatalogError::storage(format!("{what}: {db} (sqlstate {code})"))
            }
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            CatalogError::transient(format!("{what}: {e}"))
        }
        _ => CatalogError::storage(format!("{what}: {e}")),
    }
}
