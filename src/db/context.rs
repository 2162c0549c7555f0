//! Operation context
//!
//! Every registry operation runs inside one caller-owned transaction.
//! Operations never commit or roll back; they only use savepoints for
//! local sub-transactions.

use sqlx::{PgConnection, Postgres, Transaction};

use super::Database;

/// A live PostgreSQL transaction shared by a sequence of operations
pub struct OperationContext {
    tx: Transaction<'static, Postgres>,
}

impl OperationContext {
    /// Open a new transaction on the pool
    pub async fn begin(db: &Database) -> Result<Self, sqlx::Error> {
        let tx = db.pool().begin().await?;
        Ok(Self { tx })
    }

    /// Wrap a transaction the caller already started
    pub fn from_transaction(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }

    /// Connection to run statements on
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    pub async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.rollback().await
    }

    /// `SAVEPOINT name`
    pub async fn savepoint(&mut self, name: &'static str) -> Result<(), sqlx::Error> {
        debug_assert!(is_sql_identifier(name), "invalid savepoint name {name}");
        sqlx::query(&format!("SAVEPOINT {}", name))
            .execute(self.conn())
            .await?;
        Ok(())
    }

    /// `RELEASE SAVEPOINT name`
    pub async fn release_savepoint(&mut self, name: &'static str) -> Result<(), sqlx::Error> {
        debug_assert!(is_sql_identifier(name), "invalid savepoint name {name}");
        sqlx::query(&format!("RELEASE SAVEPOINT {}", name))
            .execute(self.conn())
            .await?;
        Ok(())
    }

    /// `ROLLBACK TO SAVEPOINT name`
    ///
    /// The savepoint stays defined afterwards and may be reused.
    pub async fn rollback_to_savepoint(&mut self, name: &'static str) -> Result<(), sqlx::Error> {
        debug_assert!(is_sql_identifier(name), "invalid savepoint name {name}");
        sqlx::query(&format!("ROLLBACK TO SAVEPOINT {}", name))
            .execute(self.conn())
            .await?;
        Ok(())
    }
}

/// Savepoint names are interpolated into SQL, so only plain identifiers pass.
fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
