//! SQLite layer for the user registry, transaction log and admin set.

use rand::Rng;
use sqlx::FromRow;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub join_date: i64,
    pub airtime_sent: i64,
    pub transactions: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct TransactionRecord {
    pub id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub phone_number: String,
    pub amount: i64,
    pub transaction_date: i64,
    pub txn_id: String,
}

/// One leaderboard row: a user and their summed amount. Ties between
/// equal sums come back in store order, which is not deterministic.
#[derive(Debug, Clone, FromRow)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub username: Option<String>,
    pub total_amount: i64,
}

#[derive(Debug, Clone)]
pub struct BotStats {
    pub user_count: i64,
    pub users_joined_today: i64,
    pub transaction_count: i64,
    pub total_airtime: i64,
}

pub struct Db {
    pool: SqlitePool,
}

fn current_unix_timestamp() -> Result<i64, anyhow::Error> {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|duration| duration.as_secs() as i64)
        .map_err(|err| anyhow::anyhow!("System time is before UNIX_EPOCH: {}", err))
}

/// Best-effort 6-digit transaction label. Collisions are possible and
/// accepted; the label is decoration, not a key.
fn generate_txn_id() -> String {
    format!("TX{}", rand::rng().random_range(100_000..=999_999))
}

impl Db {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("Failed to create DB directory: {}", e))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(opts)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to SQLite: {}", e))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY,
                username TEXT,
                first_name TEXT,
                last_name TEXT,
                join_date INTEGER NOT NULL,
                airtime_sent INTEGER NOT NULL DEFAULT 0,
                transactions INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_users_join_date ON users(join_date);
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                username TEXT,
                phone_number TEXT NOT NULL,
                amount INTEGER NOT NULL,
                transaction_date INTEGER NOT NULL,
                txn_id TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id);
            CREATE TABLE IF NOT EXISTS admins (
                user_id INTEGER PRIMARY KEY
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("DB migration: {}", e))?;

        Ok(())
    }

    /// Registers a user on first contact and refreshes identity fields on
    /// later contacts. `join_date` and the cumulative counters are never
    /// overwritten.
    pub async fn upsert_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<(), anyhow::Error> {
        let now = current_unix_timestamp()?;
        sqlx::query(
            "INSERT INTO users (user_id, username, first_name, last_name, join_date)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                 username = excluded.username,
                 first_name = excluded.first_name,
                 last_name = excluded.last_name",
        )
        .bind(user_id)
        .bind(username)
        .bind(first_name)
        .bind(last_name)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>, anyhow::Error> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, username, first_name, last_name, join_date, airtime_sent, transactions
             FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Appends a transaction and bumps the sender's cumulative counters
    /// atomically. Amounts must be positive.
    pub async fn record_transaction(
        &self,
        user_id: i64,
        username: Option<&str>,
        phone_number: &str,
        amount: i64,
    ) -> Result<TransactionRecord, anyhow::Error> {
        if amount <= 0 {
            anyhow::bail!("Transaction amount must be positive, got {}", amount);
        }
        if phone_number.trim().is_empty() {
            anyhow::bail!("Transaction phone number must not be empty");
        }

        let now = current_unix_timestamp()?;
        let txn_id = generate_txn_id();

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "INSERT INTO transactions (user_id, username, phone_number, amount, transaction_date, txn_id)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(username)
        .bind(phone_number)
        .bind(amount)
        .bind(now)
        .bind(&txn_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE users SET airtime_sent = airtime_sent + ?, transactions = transactions + 1
             WHERE user_id = ?",
        )
        .bind(amount)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(TransactionRecord {
            id: result.last_insert_rowid(),
            user_id,
            username: username.map(str::to_string),
            phone_number: phone_number.to_string(),
            amount,
            transaction_date: now,
            txn_id,
        })
    }

    /// Top senders: transactions grouped by user, summed and sorted
    /// descending, truncated to `limit`.
    pub async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, anyhow::Error> {
        let rows = sqlx::query_as::<_, LeaderboardEntry>(
            "SELECT user_id, username, SUM(amount) AS total_amount
             FROM transactions
             GROUP BY user_id
             ORDER BY total_amount DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count_users(&self) -> Result<i64, anyhow::Error> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    pub async fn count_users_joined_since(&self, since: i64) -> Result<i64, anyhow::Error> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE join_date >= ?")
                .bind(since)
                .fetch_one(&self.pool)
                .await?;
        Ok(total)
    }

    pub async fn stats(&self, today_start: i64) -> Result<BotStats, anyhow::Error> {
        let user_count = self.count_users().await?;
        let users_joined_today = self.count_users_joined_since(today_start).await?;
        let transaction_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        let total_airtime =
            sqlx::query_scalar::<_, Option<i64>>("SELECT SUM(amount) FROM transactions")
                .fetch_one(&self.pool)
                .await?
                .unwrap_or(0);

        Ok(BotStats {
            user_count,
            users_joined_today,
            transaction_count,
            total_airtime,
        })
    }

    /// All known user ids, for broadcast fan-out.
    pub async fn all_user_ids(&self) -> Result<Vec<i64>, anyhow::Error> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT user_id FROM users ORDER BY user_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    pub async fn is_admin(&self, user_id: i64) -> Result<bool, anyhow::Error> {
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM admins WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    pub async fn add_admin(&self, user_id: i64) -> Result<(), anyhow::Error> {
        sqlx::query("INSERT OR IGNORE INTO admins (user_id) VALUES (?)")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Bootstraps the admin set from the configured id list.
    pub async fn seed_admins(&self, admin_ids: &[i64]) -> Result<(), anyhow::Error> {
        for admin_id in admin_ids {
            self.add_admin(*admin_id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn open_memory() -> Db {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
        // A single long-lived connection keeps the in-memory DB alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await
            .unwrap();
        let db = Db { pool };
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn upsert_preserves_counters() {
        let db = open_memory().await;
        db.upsert_user(1, Some("alice"), Some("Alice"), None)
            .await
            .unwrap();
        db.record_transaction(1, Some("alice"), "+256751722034", 5000)
            .await
            .unwrap();

        db.upsert_user(1, Some("alice2"), Some("Alice"), Some("A"))
            .await
            .unwrap();
        let user = db.get_user(1).await.unwrap().unwrap();
        assert_eq!(user.username.as_deref(), Some("alice2"));
        assert_eq!(user.airtime_sent, 5000);
        assert_eq!(user.transactions, 1);
    }

    #[tokio::test]
    async fn record_transaction_rejects_bad_input() {
        let db = open_memory().await;
        db.upsert_user(1, Some("alice"), None, None).await.unwrap();
        assert!(
            db.record_transaction(1, None, "+256751722034", 0)
                .await
                .is_err()
        );
        assert!(
            db.record_transaction(1, None, "+256751722034", -5)
                .await
                .is_err()
        );
        assert!(db.record_transaction(1, None, "", 100).await.is_err());
    }

    #[tokio::test]
    async fn txn_id_is_six_digit_label() {
        let db = open_memory().await;
        db.upsert_user(1, None, None, None).await.unwrap();
        let txn = db
            .record_transaction(1, None, "+256751722034", 1000)
            .await
            .unwrap();
        assert!(txn.txn_id.starts_with("TX"));
        assert_eq!(txn.txn_id.len(), 8);
        assert!(txn.txn_id[2..].chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn leaderboard_sums_sorts_and_truncates() {
        let db = open_memory().await;
        for user_id in 1..=12 {
            db.upsert_user(user_id, Some(&format!("user{}", user_id)), None, None)
                .await
                .unwrap();
            db.record_transaction(
                user_id,
                Some(&format!("user{}", user_id)),
                "+256751722034",
                user_id * 100,
            )
            .await
            .unwrap();
        }
        // A second transaction pushes user 3 to the top.
        db.record_transaction(3, Some("user3"), "+256751722034", 10_000)
            .await
            .unwrap();

        let board = db.leaderboard(10).await.unwrap();
        assert_eq!(board.len(), 10);
        assert_eq!(board[0].user_id, 3);
        assert_eq!(board[0].total_amount, 10_300);
        for pair in board.windows(2) {
            assert!(pair[0].total_amount >= pair[1].total_amount);
        }

        // Idempotent under re-running with the same transaction set.
        let again = db.leaderboard(10).await.unwrap();
        assert_eq!(board.len(), again.len());
        assert_eq!(board[0].total_amount, again[0].total_amount);
    }

    #[tokio::test]
    async fn stats_and_user_ids() {
        let db = open_memory().await;
        db.upsert_user(1, None, None, None).await.unwrap();
        db.upsert_user(2, None, None, None).await.unwrap();
        db.record_transaction(1, None, "+256751722034", 500)
            .await
            .unwrap();
        db.record_transaction(2, None, "+254712345678", 700)
            .await
            .unwrap();

        let stats = db.stats(0).await.unwrap();
        assert_eq!(stats.user_count, 2);
        assert_eq!(stats.transaction_count, 2);
        assert_eq!(stats.total_airtime, 1200);

        assert_eq!(db.all_user_ids().await.unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn seeded_admins_are_admins() {
        let db = open_memory().await;
        db.seed_admins(&[10, 20]).await.unwrap();
        db.seed_admins(&[10]).await.unwrap();
        assert!(db.is_admin(10).await.unwrap());
        assert!(db.is_admin(20).await.unwrap());
        assert!(!db.is_admin(30).await.unwrap());
    }
}
