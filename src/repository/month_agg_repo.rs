// ==========================================
// 调拨单分配系统 - 月度累计仓储
// ==========================================
// 存储: month_agg 表，按月份键保存整份 JSON
// 语义: 读取返回最近一次写入（后写覆盖）
// ==========================================

use crate::domain::month::MonthAggregate;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Local;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// MonthAggRepository - 月度累计仓储
// ==========================================
pub struct MonthAggRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MonthAggRepository {
    /// 创建新的 MonthAggRepository 实例
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

    /// 读取某月累计
    ///
    /// # 返回
    /// - Ok(None): 当月尚未结算
    pub fn load(&self, month: &str) -> RepositoryResult<Option<MonthAggregate>> {
        let conn = self.get_conn()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT agg_json FROM month_agg WHERE month = ?1",
                params![month],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(json) => {
                let mut agg: MonthAggregate = serde_json::from_str(&json)?;
                if agg.month.is_empty() {
                    agg.month = month.to_string();
                }
                Ok(Some(agg))
            }
            None => Ok(None),
        }
    }

    /// 写入（覆盖）某月累计
    pub fn save(&self, agg: &MonthAggregate) -> RepositoryResult<()> {
        if agg.month.trim().is_empty() {
            return Err(RepositoryError::ValidationError("月份键为空".to_string()));
        }
        let json = serde_json::to_string(agg)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO month_agg (month, agg_json, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(month) DO UPDATE SET
                agg_json = excluded.agg_json,
                updated_at = excluded.updated_at
            "#,
            params![
                agg.month,
                json,
                Local::now().naive_local().format("%Y-%m-%d %H:%M:%S").to_string()
            ],
        )?;
        Ok(())
    }
}
