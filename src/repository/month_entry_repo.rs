// ==========================================
// 调拨单分配系统 - 每日分配日志仓储
// ==========================================
// 存储: month_entry 表（只追加）
// ==========================================

use crate::domain::month::{MonthEntry, DATE_FORMAT};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// MonthEntryRepository - 分配日志仓储
// ==========================================
pub struct MonthEntryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MonthEntryRepository {
    /// 创建新的 MonthEntryRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 批量追加日志（事务化）
    pub fn insert_batch(&self, entries: &[MonthEntry]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        for entry in entries {
            let meta_json = entry
                .meta
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            tx.execute(
                r#"
                INSERT INTO month_entry (
                    entry_id, month, user_code, assigned_count, assigned_value,
                    meta_json, entry_date, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    entry.entry_id,
                    entry.month,
                    entry.user_code,
                    entry.assigned_count as i64,
                    entry.assigned_value,
                    meta_json,
                    entry.entry_date.format(DATE_FORMAT).to_string(),
                    entry.created_at.format(DATETIME_FORMAT).to_string(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(entries.len())
    }

    /// 查询某月全部日志（按日期、创建时间）
    pub fn list_by_month(&self, month: &str) -> RepositoryResult<Vec<MonthEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT entry_id, month, user_code, assigned_count, assigned_value,
                   meta_json, entry_date, created_at
            FROM month_entry
            WHERE month = ?1
            ORDER BY entry_date, created_at, entry_id
            "#,
        )?;

        let rows = stmt.query_map(params![month], |row| {
            let meta_json: Option<String> = row.get(5)?;
            let entry_date: String = row.get(6)?;
            let created_at: String = row.get(7)?;
            Ok(MonthEntry {
                entry_id: row.get(0)?,
                month: row.get(1)?,
                user_code: row.get(2)?,
                assigned_count: row.get::<_, i64>(3)?.max(0) as u64,
                assigned_value: row.get(4)?,
                meta: meta_json.and_then(|s| serde_json::from_str(&s).ok()),
                entry_date: NaiveDate::parse_from_str(&entry_date, DATE_FORMAT)
                    .unwrap_or_default(),
                created_at: NaiveDateTime::parse_from_str(&created_at, DATETIME_FORMAT)
                    .unwrap_or_default(),
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}
