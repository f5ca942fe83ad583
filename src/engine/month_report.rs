// ==========================================
// 调拨单分配系统 - 月度报表
// ==========================================
// 职责: 按员工汇总当月分配日志，解析显示名
// 排序: 总行数降序 → 代码升序
// ==========================================

use crate::domain::month::{MonthEntry, UserMonthTotal};
use crate::domain::staff::StaffMember;
use crate::engine::normalizer::normalize;
use std::collections::{BTreeMap, HashMap};

/// 按员工代码汇总日志（代码统一大写）
pub fn aggregate_by_user(entries: &[MonthEntry], staff: &[StaffMember]) -> Vec<UserMonthTotal> {
    let names: HashMap<String, &str> = staff
        .iter()
        .map(|s| (normalize(&s.code), s.name.as_str()))
        .collect();

    let mut totals: BTreeMap<String, (u64, f64)> = BTreeMap::new();
    for entry in entries {
        let code = normalize(&entry.user_code);
        if code.is_empty() {
            continue;
        }
        let slot = totals.entry(code).or_insert((0, 0.0));
        slot.0 += entry.assigned_count;
        slot.1 += entry.assigned_value;
    }

    let mut report: Vec<UserMonthTotal> = totals
        .into_iter()
        .map(|(code, (count, value))| UserMonthTotal {
            user_name: names
                .get(&code)
                .filter(|n| !n.trim().is_empty())
                .map(|n| n.to_string())
                .unwrap_or_else(|| code.clone()),
            user_code: code,
            assigned_count: count,
            assigned_value: value,
        })
        .collect();

    report.sort_by(|a, b| {
        b.assigned_count
            .cmp(&a.assigned_count)
            .then_with(|| a.user_code.cmp(&b.user_code))
    });
    report
}
