// ==========================================
// 调拨单分配系统 - 月度公平性领域模型
// ==========================================
// 职责: 月度累计(期望/实际/欠额/最近服务日) + 每日分配日志
// 生命周期: 当月首次结算时创建；逐日累加，月内不重置
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// 月份键格式 (YYYY-MM)
pub const MONTH_KEY_FORMAT: &str = "%Y-%m";

/// 日期格式 (YYYY-MM-DD)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 由日期生成月份键
pub fn month_key(date: NaiveDate) -> String {
    date.format(MONTH_KEY_FORMAT).to_string()
}

// ==========================================
// MonthAggregate - 月度累计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthAggregate {
    pub month: String,                           // YYYY-MM
    #[serde(default)]
    pub expected_cum: BTreeMap<String, f64>,     // 累计期望份额
    #[serde(default)]
    pub actual_cum: BTreeMap<String, u64>,       // 累计实际分配行数
    #[serde(default)]
    pub deficit: BTreeMap<String, f64>,          // expected - actual（正 = 欠分配）
    #[serde(default)]
    pub last_served_at: BTreeMap<String, String>, // 最近一次有分配的日期
    #[serde(default)]
    pub settled_days: u32,                       // 已结算天数
}

impl MonthAggregate {
    pub fn new(month: impl Into<String>) -> Self {
        Self {
            month: month.into(),
            ..Self::default()
        }
    }

    /// 读取欠额（未出现的员工视为 0）
    pub fn deficit_of(&self, code: &str) -> f64 {
        self.deficit.get(code).copied().unwrap_or(0.0)
    }

    /// 读取最近服务日（未出现视为空串）
    pub fn last_served_of(&self, code: &str) -> &str {
        self.last_served_at.get(code).map(String::as_str).unwrap_or("")
    }
}

// ==========================================
// MonthEntry - 每日分配日志
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthEntry {
    pub entry_id: String,           // UUID
    pub month: String,              // YYYY-MM
    pub user_code: String,
    pub assigned_count: u64,
    pub assigned_value: f64,
    pub meta: Option<JsonValue>,    // 来源等附加信息
    pub entry_date: NaiveDate,
    pub created_at: NaiveDateTime,
}

// ==========================================
// UserMonthTotal - 月度报表行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMonthTotal {
    pub user_code: String,
    pub user_name: String,
    pub assigned_count: u64,
    pub assigned_value: f64,
}
