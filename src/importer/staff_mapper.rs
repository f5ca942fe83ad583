// ==========================================
// 调拨单分配系统 - 员工表映射
// ==========================================
// 职责: 将员工表格（任意表头）映射为 StaffMember 列表
// 规则:
// - 代码列未识别时取第一列；代码单元格缺失 → U{行号}；规范化后为空的行丢弃
// - 比例列缺失 → 100；非数值 → 100；负数 → 0
// - 在岗列: off/0/false/nghi/vang 或空值 → 不在岗
// - 仓库列: 逗号/分号/空白分隔，规范化去重
// ==========================================

use crate::domain::staff::{StaffMember, BASELINE_WEIGHT_PCT};
use crate::domain::task::{TaskRow, TaskSheet};
use crate::engine::normalizer::normalize;
use crate::importer::header_detector::find_header;

pub const CODE_HINTS: &[&str] = &[
    "ma nv",
    "ma_nhan_vien",
    "employee code",
    "employee_code",
    "code",
    "ma nhan vien",
];
pub const NAME_HINTS: &[&str] = &["ten", "nhan vien", "ten nhan vien", "name"];
pub const RATIO_HINTS: &[&str] = &["ti le", "ty le", "percent", "ratio", "%"];
pub const ONLINE_HINTS: &[&str] = &["di lam", "online", "trang thai", "status", "off", "vang", "nghi"];
pub const WAREHOUSE_HINTS: &[&str] = &["ma kho", "warehouse", "warehouses", "kho", "kho lam"];

const OFFLINE_VALUES: &[&str] = &["off", "0", "false", "nghi", "vang"];

/// 员工表的列映射结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffColumns {
    pub code: String,
    pub name: String,
    pub ratio: Option<String>,
    pub online: Option<String>,
    pub warehouses: Option<String>,
}

impl StaffColumns {
    /// 识别员工表列；表头为空时返回 None
    pub fn detect(headers: &[String]) -> Option<Self> {
        let code = find_header(headers, CODE_HINTS).or_else(|| headers.first().cloned())?;
        let name = find_header(headers, NAME_HINTS)
            .or_else(|| headers.get(1).cloned())
            .unwrap_or_else(|| code.clone());
        Some(Self {
            code,
            name,
            ratio: find_header(headers, RATIO_HINTS),
            online: find_header(headers, ONLINE_HINTS),
            warehouses: find_header(headers, WAREHOUSE_HINTS),
        })
    }
}

/// 将员工表映射为员工列表（保持表格顺序，order = 行位置）
pub fn map_staff_sheet(sheet: &TaskSheet) -> Vec<StaffMember> {
    let Some(columns) = StaffColumns::detect(&sheet.headers) else {
        return Vec::new();
    };

    sheet
        .rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| map_staff_row(row, i, &columns))
        .enumerate()
        .map(|(order, member)| StaffMember {
            order: order as i64,
            ..member
        })
        .collect()
}

fn map_staff_row(row: &TaskRow, index: usize, columns: &StaffColumns) -> Option<StaffMember> {
    let fallback = format!("U{}", index + 1);
    let raw_code = row.get(&columns.code).unwrap_or(&fallback);
    let code = normalize(raw_code);
    if code.is_empty() {
        return None;
    }

    let name = row
        .get(&columns.name)
        .or_else(|| row.get(&columns.code))
        .unwrap_or(&fallback)
        .trim()
        .to_string();

    let weight_pct = columns
        .ratio
        .as_deref()
        .map(|k| parse_ratio(row.get(k).unwrap_or("")))
        .unwrap_or(BASELINE_WEIGHT_PCT);

    let online = columns
        .online
        .as_deref()
        .map(|k| parse_online(row.get(k).unwrap_or("")))
        .unwrap_or(true);

    let warehouses = columns
        .warehouses
        .as_deref()
        .map(|k| parse_warehouses(row.get(k).unwrap_or("")))
        .unwrap_or_default();

    Some(StaffMember {
        code,
        name,
        weight_pct,
        online,
        warehouses,
        order: 0,
    })
}

/// 比例：空值为 0，非数值为 100，负数为 0（允许尾随 %）
pub fn parse_ratio(raw: &str) -> f64 {
    let trimmed = raw.trim().trim_end_matches('%').trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => v.max(0.0),
        _ => BASELINE_WEIGHT_PCT,
    }
}

/// 在岗：显式否定值或空值为不在岗
pub fn parse_online(raw: &str) -> bool {
    let value = raw.trim();
    if value.is_empty() {
        return false;
    }
    let key = normalize(value).to_lowercase();
    !OFFLINE_VALUES.contains(&key.as_str())
}

/// 仓库列表：按分隔符拆分、规范化、去重（保持首次出现顺序）
pub fn parse_warehouses(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in raw.split(|c: char| c == ',' || c == ';' || c.is_whitespace()) {
        let code = normalize(part);
        if !code.is_empty() && !out.contains(&code) {
            out.push(code);
        }
    }
    out
}
