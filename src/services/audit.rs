use crate::error::{AppError, AppResult};
use crate::models::{Order, WalletTransaction};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// `prev_hash` of the first entry in a chain
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditLogEntry {
    pub timestamp: i64,
    pub event_type: String, // "deposit", "withdrawal", "order_created", "order_completed", ...
    pub user_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub prev_hash: String,
    pub hash: String,
}

/// Everything the hash covers, i.e. the entry minus its own hash
#[derive(Serialize)]
struct HashedFields<'a> {
    timestamp: i64,
    event_type: &'a str,
    user_id: Option<Uuid>,
    subject_id: Option<Uuid>,
    details: &'a serde_json::Value,
    prev_hash: &'a str,
}

impl AuditLogEntry {
    fn compute_hash(&self) -> AppResult<String> {
        let fields = HashedFields {
            timestamp: self.timestamp,
            event_type: &self.event_type,
            user_id: self.user_id,
            subject_id: self.subject_id,
            details: &self.details,
            prev_hash: &self.prev_hash,
        };
        let bytes = serde_json::to_vec(&fields)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

/// Walk a JSON-lines audit log and check every link of the hash chain.
///
/// Returns the number of entries, or the 1-based line of the first broken entry.
pub fn verify_chain(contents: &str, first_prev_hash: &str) -> Result<usize, usize> {
    let mut prev = first_prev_hash.to_string();
    let mut count = 0;

    for (index, line) in contents.lines().filter(|l| !l.trim().is_empty()).enumerate() {
        let entry: AuditLogEntry = serde_json::from_str(line).map_err(|_| index + 1)?;
        let expected = entry.compute_hash().map_err(|_| index + 1)?;
        if entry.prev_hash != prev || entry.hash != expected {
            return Err(index + 1);
        }
        prev = entry.hash;
        count += 1;
    }

    Ok(count)
}

struct AuditFile {
    date: String,
    file: File,
    last_hash: String,
}

/// Append-only, hash-chained audit trail of money movements.
/// One file per UTC day; the chain continues across files and restarts.
pub struct AuditTrailService {
    log_directory: PathBuf,
    state: Mutex<AuditFile>,
}

impl AuditTrailService {
    /// Create a new audit trail service
    pub fn new(log_directory: PathBuf) -> AppResult<Self> {
        // Ensure directory exists
        std::fs::create_dir_all(&log_directory)
            .map_err(|e| AppError::Message(format!("Failed to create log directory: {}", e)))?;

        let date = today();
        let log_file = log_file_path(&log_directory, &date);
        let last_hash = match latest_log_file(&log_directory)? {
            Some(previous) => last_hash_in(&previous),
            None => GENESIS_HASH.to_string(),
        };
        let file = open_append(&log_file)?;

        info!("Audit trail initialized: {:?}", log_file);

        Ok(Self {
            log_directory,
            state: Mutex::new(AuditFile {
                date,
                file,
                last_hash,
            }),
        })
    }

    /// Path of today's log file
    pub fn current_log_file(&self) -> PathBuf {
        log_file_path(&self.log_directory, &today())
    }

    /// Chain and append an entry
    pub async fn log(
        &self,
        event_type: &str,
        user_id: Option<Uuid>,
        subject_id: Option<Uuid>,
        details: serde_json::Value,
    ) -> AppResult<AuditLogEntry> {
        let mut state = self.state.lock().await;

        let date = today();
        if date != state.date {
            state.file = open_append(&log_file_path(&self.log_directory, &date))?;
            state.date = date;
        }

        let mut entry = AuditLogEntry {
            timestamp: chrono::Utc::now().timestamp(),
            event_type: event_type.to_string(),
            user_id,
            subject_id,
            details,
            prev_hash: state.last_hash.clone(),
            hash: String::new(),
        };
        entry.hash = entry.compute_hash()?;

        let json = serde_json::to_string(&entry)?;
        writeln!(state.file, "{}", json)
            .map_err(|e| AppError::Message(format!("Failed to write audit log: {}", e)))?;
        state
            .file
            .flush()
            .map_err(|e| AppError::Message(format!("Failed to flush audit log: {}", e)))?;

        state.last_hash = entry.hash.clone();
        Ok(entry)
    }

    /// Log a wallet deposit or withdrawal
    pub async fn log_wallet_transaction(&self, tx: &WalletTransaction) -> AppResult<()> {
        self.log(
            &tx.transaction_type,
            Some(tx.user_id),
            Some(tx.id),
            serde_json::json!({
                "amount": tx.amount.to_string(),
                "balance_before": tx.balance_before.to_string(),
                "balance_after": tx.balance_after.to_string(),
                "reference": tx.reference,
            }),
        )
        .await
        .map(|_| ())
    }

    /// Log a purchase or an order status change made by `actor`
    pub async fn log_order(&self, order: &Order, actor: Uuid) -> AppResult<()> {
        let event_type = match order.status.as_str() {
            "pending" => "order_created".to_string(),
            status => format!("order_{}", status),
        };

        self.log(
            &event_type,
            Some(actor),
            Some(order.id),
            serde_json::json!({
                "buyer_id": order.buyer_id,
                "seller_id": order.seller_id,
                "listing_id": order.listing_id,
                "amount": order.amount.to_string(),
            }),
        )
        .await
        .map(|_| ())
    }
}

fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

fn log_file_path(dir: &Path, date: &str) -> PathBuf {
    dir.join(format!("audit_{}.log", date))
}

fn open_append(path: &Path) -> AppResult<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::Message(format!("Failed to open audit log file: {}", e)))
}

/// Newest non-empty `audit_<date>.log` in `dir`; ISO dates sort by name
fn latest_log_file(dir: &Path) -> AppResult<Option<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| AppError::Message(format!("Failed to read audit log directory: {}", e)))?;

    Ok(entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.starts_with("audit_") && n.ends_with(".log"))
        })
        .filter(|path| std::fs::metadata(path).map_or(false, |m| m.len() > 0))
        .max())
}

/// Resume the chain from an existing file
fn last_hash_in(path: &Path) -> String {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return GENESIS_HASH.to_string();
    };

    match contents
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .map(|line| serde_json::from_str::<AuditLogEntry>(line))
    {
        Some(Ok(entry)) => entry.hash,
        Some(Err(e)) => {
            warn!("Unreadable audit log tail in {:?}, starting a new chain: {}", path, e);
            GENESIS_HASH.to_string()
        }
        None => {
            warn!("Audit log {:?} is empty, starting a new chain", path);
            GENESIS_HASH.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("campus-market-audit-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_entries_are_chained() {
        let dir = temp_dir();
        let audit = AuditTrailService::new(dir.clone()).unwrap();

        let first = audit
            .log("deposit", Some(Uuid::new_v4()), None, serde_json::json!({"amount": "10.00"}))
            .await
            .unwrap();
        let second = audit
            .log("withdrawal", Some(Uuid::new_v4()), None, serde_json::json!({"amount": "4.00"}))
            .await
            .unwrap();

        assert_eq!(first.prev_hash, GENESIS_HASH);
        assert_eq!(second.prev_hash, first.hash);
        assert_eq!(first.hash.len(), 64);

        let contents = std::fs::read_to_string(audit.current_log_file()).unwrap();
        assert_eq!(verify_chain(&contents, GENESIS_HASH), Ok(2));

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_tampering_breaks_the_chain() {
        let dir = temp_dir();
        let audit = AuditTrailService::new(dir.clone()).unwrap();
        for amount in ["1.00", "2.00", "3.00"] {
            audit
                .log("deposit", None, None, serde_json::json!({ "amount": amount }))
                .await
                .unwrap();
        }

        let contents = std::fs::read_to_string(audit.current_log_file()).unwrap();
        let tampered = contents.replacen("2.00", "200.00", 1);
        assert_eq!(verify_chain(&tampered, GENESIS_HASH), Err(2));

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_chain_resumes_after_restart() {
        let dir = temp_dir();
        let last = {
            let audit = AuditTrailService::new(dir.clone()).unwrap();
            audit.log("deposit", None, None, serde_json::json!({})).await.unwrap()
        };

        let audit = AuditTrailService::new(dir.clone()).unwrap();
        let next = audit.log("deposit", None, None, serde_json::json!({})).await.unwrap();
        assert_eq!(next.prev_hash, last.hash);

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_chain_continues_from_an_earlier_day() {
        let dir = temp_dir();
        let last = {
            let audit = AuditTrailService::new(dir.clone()).unwrap();
            audit.log("deposit", None, None, serde_json::json!({})).await.unwrap()
        };
        let today_file = log_file_path(&dir, &today());
        let yesterday_file = log_file_path(&dir, "2000-01-01");
        std::fs::rename(&today_file, &yesterday_file).unwrap();
        std::fs::write(&today_file, "").unwrap();

        let audit = AuditTrailService::new(dir.clone()).unwrap();
        let next = audit.log("withdrawal", None, None, serde_json::json!({})).await.unwrap();
        assert_eq!(next.prev_hash, last.hash);

        let mut contents = std::fs::read_to_string(&yesterday_file).unwrap();
        contents.push_str(&std::fs::read_to_string(&today_file).unwrap());
        assert_eq!(verify_chain(&contents, GENESIS_HASH), Ok(2));

        std::fs::remove_dir_all(dir).ok();
    }
}
