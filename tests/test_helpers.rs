// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据构造等功能
// ==========================================

#![allow(dead_code)]

use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use voucher_alloc::db::{init_schema, open_sqlite_connection};
use voucher_alloc::domain::{StaffMember, TaskRow, TaskSheet};

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径非 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 内存数据库（已建表），供同一连接上的多个仓储共享
pub fn shared_memory_conn() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().expect("无法打开内存数据库");
    init_schema(&conn).expect("建库失败");
    Arc::new(Mutex::new(conn))
}

/// 构造员工
pub fn staff(code: &str, weight: f64, warehouses: &[&str]) -> StaffMember {
    StaffMember::new(code, format!("NV {}", code), weight).with_warehouses(warehouses.iter().copied())
}

/// 构造任务表（列: So CT / Noi xuat / Ghi chu）
pub fn task_sheet(rows: &[(&str, &str)]) -> TaskSheet {
    TaskSheet {
        headers: vec![
            "So CT".to_string(),
            "Noi xuat".to_string(),
            "Ghi chu".to_string(),
        ],
        rows: rows
            .iter()
            .enumerate()
            .map(|(i, (voucher, export))| {
                [
                    ("So CT", voucher.to_string()),
                    ("Noi xuat", export.to_string()),
                    ("Ghi chu", format!("row-{}", i)),
                ]
                .into_iter()
                .collect::<TaskRow>()
            })
            .collect(),
    }
}
