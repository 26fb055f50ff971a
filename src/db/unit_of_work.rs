//! Transaction wrapper for multi-statement writes.
//!
//! A [`UnitOfWork`] is opened, handed statements through [`UnitOfWork::conn`],
//! and closed with [`UnitOfWork::finish`]. `finish` commits only when the
//! outcome reports success; a rejection or an error rolls back every
//! statement before control returns to the caller. Dropping a unit of work
//! without finishing it also rolls back.

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use crate::errors::AppError;

/// Outcomes that decide whether their unit of work may commit.
pub trait Completion {
    fn should_commit(&self) -> bool;
}

/// An open transaction scoped to one operation.
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    pub async fn begin(pool: &SqlitePool) -> Result<Self, AppError> {
        Ok(Self {
            tx: pool.begin().await?,
        })
    }

    /// Connection to run statements inside the transaction.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    /// Commit a successful outcome, roll back anything else.
    pub async fn finish<T: Completion>(self, outcome: Result<T, AppError>) -> Result<T, AppError> {
        match outcome {
            Ok(value) if value.should_commit() => {
                self.tx.commit().await?;
                Ok(value)
            }
            Ok(value) => {
                self.tx.rollback().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.tx.rollback().await {
                    tracing::error!("Rollback after failure also failed: {:?}", rollback_err);
                }
                Err(err)
            }
        }
    }
}
