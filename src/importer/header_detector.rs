// ==========================================
// 调拨单分配系统 - 表头识别
// ==========================================
// 规则: 表头去变音+小写后包含任一同义词即命中；按表头顺序取第一个命中列
// ==========================================

use crate::domain::task::GroupColumns;
use crate::engine::normalizer::header_key;

/// 单据号列同义词
pub const VOUCHER_HINTS: &[&str] = &["ma chung tu", "so ct", "chung tu", "ct", "voucher"];
/// 发货地列同义词
pub const EXPORT_HINTS: &[&str] = &["ma noi xuat", "noi xuat", "kho xuat", "store xuat", "export"];
/// 收货地列同义词
pub const RECEIVE_HINTS: &[&str] = &["ma noi nhan", "noi nhan", "kho nhan", "store nhan", "receive"];
/// ST 列同义词
pub const ST_HINTS: &[&str] = &["ma st", "st"];

/// 按同义词查找列名
pub fn find_header(headers: &[String], hints: &[&str]) -> Option<String> {
    headers
        .iter()
        .find(|h| {
            let key = header_key(h);
            hints.iter().any(|hint| key.contains(hint))
        })
        .cloned()
}

/// 识别任务表的分组列
pub fn detect_group_columns(headers: &[String]) -> GroupColumns {
    GroupColumns {
        voucher_key: find_header(headers, VOUCHER_HINTS),
        export_key: find_header(headers, EXPORT_HINTS),
        receive_key: find_header(headers, RECEIVE_HINTS),
        st_key: find_header(headers, ST_HINTS),
    }
}
