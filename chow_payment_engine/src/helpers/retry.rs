use std::{future::Future, time::Duration};

use log::*;

/// Total number of attempts for an operation that keeps hitting lock contention.
pub const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_MS: u64 = 25;

/// Errors that signal a retryable conflict rather than a real failure.
pub trait Contention {
    fn is_contention(&self) -> bool;
}

impl Contention for crate::traits::LedgerError {
    fn is_contention(&self) -> bool {
        self.is_conflict()
    }
}

impl Contention for crate::traits::OrderStoreError {
    fn is_contention(&self) -> bool {
        self.is_conflict()
    }
}

/// True if SQLite reported `SQLITE_BUSY` or `SQLITE_LOCKED` (including their extended codes).
pub fn is_lock_contention(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(err) => {
            let primary = err.code().and_then(|c| c.parse::<i32>().ok()).map(|c| c & 0xff);
            matches!(primary, Some(5) | Some(6)) || err.message().contains("database is locked")
        },
        sqlx::Error::PoolTimedOut => true,
        _ => false,
    }
}

/// Runs `op` up to [`MAX_ATTEMPTS`] times while it fails with a contention error, backing off a little each time.
pub async fn retry_on_conflict<T, E, F, Fut>(label: &str, mut op: F) -> Result<T, E>
where
    E: Contention + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(e) if e.is_contention() && attempt < MAX_ATTEMPTS => {
                warn!("🗃️ {label}: attempt {attempt} hit a conflict ({e}). Retrying.");
                tokio::time::sleep(Duration::from_millis(BACKOFF_MS * u64::from(attempt))).await;
                attempt += 1;
            },
            result => return result,
        }
    }
}
