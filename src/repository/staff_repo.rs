// ==========================================
// 调拨单分配系统 - 员工数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 存储: staff 表（warehouses 以 JSON 数组存储）
// ==========================================

use crate::domain::staff::StaffMember;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Local;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str =
    "SELECT code, name, weight_pct, online, warehouses_json, sort_order FROM staff";

// ==========================================
// StaffRepository - 员工仓储
// ==========================================
/// 员工仓储
/// 职责: 管理 staff 表的 CRUD 与排序持久化
pub struct StaffRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StaffRepository {
    /// 创建新的 StaffRepository 实例
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

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 批量 upsert（合并语义：保留已有排序位次）
    ///
    /// # 返回
    /// - Ok(usize): 实际写入的员工数（空代码跳过）
    pub fn upsert_bulk(&self, staff: &[StaffMember]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let now = now_str();

        let mut count = 0;
        for member in staff {
            let code = member.code.trim();
            if code.is_empty() {
                continue;
            }
            tx.execute(
                r#"
                INSERT INTO staff (
                    code, name, weight_pct, online, enabled, warehouses_json,
                    sort_order, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, 1, ?5, 0, ?6, ?6)
                ON CONFLICT(code) DO UPDATE SET
                    name = excluded.name,
                    weight_pct = excluded.weight_pct,
                    online = excluded.online,
                    enabled = 1,
                    warehouses_json = excluded.warehouses_json,
                    updated_at = excluded.updated_at
                "#,
                params![
                    code,
                    member.name,
                    storable_weight(member.weight_pct),
                    member.online,
                    serde_json::to_string(&member.warehouses)?,
                    now,
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 单个 upsert
    pub fn upsert(&self, member: &StaffMember) -> RepositoryResult<()> {
        if member.code.trim().is_empty() {
            return Err(RepositoryError::ValidationError("员工代码为空".to_string()));
        }
        self.upsert_bulk(std::slice::from_ref(member))?;
        Ok(())
    }

    /// 查询员工列表（按排序位次，其次代码）
    ///
    /// # 参数
    /// - `enabled_only`: 仅返回已启用（未停用）的员工
    pub fn list(&self, enabled_only: bool) -> RepositoryResult<Vec<StaffMember>> {
        let conn = self.get_conn()?;
        let sql = if enabled_only {
            format!("{} WHERE enabled = 1 ORDER BY sort_order, code", SELECT_COLUMNS)
        } else {
            format!("{} ORDER BY sort_order, code", SELECT_COLUMNS)
        };
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], map_staff_row)?;

        let mut staff = Vec::new();
        for row in rows {
            staff.push(row?);
        }
        Ok(staff)
    }

    /// 按代码查询
    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<StaffMember>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("{} WHERE code = ?1", SELECT_COLUMNS))?;

        match stmt.query_row(params![code], map_staff_row) {
            Ok(member) => Ok(Some(member)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 更新在岗状态
    pub fn update_online(&self, code: &str, online: bool) -> RepositoryResult<()> {
        self.update_one(code, "online = ?2", online)
    }

    /// 更新权重（非有限值存为 0）
    pub fn update_weight(&self, code: &str, weight_pct: f64) -> RepositoryResult<()> {
        self.update_one(code, "weight_pct = ?2", storable_weight(weight_pct))
    }

    /// 更新归属仓库
    pub fn update_warehouses(&self, code: &str, warehouses: &[String]) -> RepositoryResult<()> {
        let json = serde_json::to_string(warehouses)?;
        self.update_one(code, "warehouses_json = ?2", json)
    }

    /// 启用/停用员工（停用者不进入分配名单，再次导入时恢复启用）
    pub fn set_enabled(&self, code: &str, enabled: bool) -> RepositoryResult<()> {
        self.update_one(code, "enabled = ?2", enabled)
    }

    /// 删除员工
    pub fn delete(&self, code: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM staff WHERE code = ?1", params![code])?;
        if affected == 0 {
            return Err(not_found(code));
        }
        Ok(())
    }

    /// 保存排序：order = 在序列中的位置（不存在的代码补建占位行）
    pub fn save_ordering(&self, codes_in_order: &[String]) -> RepositoryResult<usize> {
        if codes_in_order.is_empty() {
            return Ok(0);
        }
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let now = now_str();

        for (idx, code) in codes_in_order.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO staff (code, sort_order, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?3)
                ON CONFLICT(code) DO UPDATE SET
                    sort_order = excluded.sort_order,
                    updated_at = excluded.updated_at
                "#,
                params![code, idx as i64, now],
            )?;
        }

        tx.commit()?;
        Ok(codes_in_order.len())
    }

    fn update_one<T: rusqlite::ToSql>(&self, code: &str, set_clause: &str, value: T) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let sql = format!(
            "UPDATE staff SET {}, updated_at = ?3 WHERE code = ?1",
            set_clause
        );
        let affected = conn.execute(&sql, params![code, value, now_str()])?;
        if affected == 0 {
            return Err(not_found(code));
        }
        Ok(())
    }
}

fn map_staff_row(row: &Row<'_>) -> rusqlite::Result<StaffMember> {
    let warehouses_json: String = row.get(4)?;
    Ok(StaffMember {
        code: row.get(0)?,
        name: row.get(1)?,
        weight_pct: row.get(2)?,
        online: row.get(3)?,
        warehouses: serde_json::from_str(&warehouses_json).unwrap_or_default(),
        order: row.get(5)?,
    })
}

fn storable_weight(weight_pct: f64) -> f64 {
    if weight_pct.is_finite() {
        weight_pct
    } else {
        0.0
    }
}

fn not_found(code: &str) -> RepositoryError {
    RepositoryError::NotFound {
        entity: "Staff".to_string(),
        id: code.to_string(),
    }
}

fn now_str() -> String {
    Local::now().naive_local().format("%Y-%m-%d %H:%M:%S").to_string()
}
