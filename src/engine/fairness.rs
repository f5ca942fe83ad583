// ==========================================
// 调拨单分配系统 - 月度公平性结算
// ==========================================
// 职责: 按日累加期望份额/实际分配，重算欠额
// 规则:
// - 期望份额 = 当日总行数 * 权重 / 参与员工权重和（不在岗/零权重为 0）
// - 当日名单中的员工都计入期望（即使实际为 0）
// - 实际 > 0 的员工更新最近服务日
// 红线: 每个自然日只能结算一次（重复调用会重复累加）
// ==========================================

use crate::domain::month::{month_key, MonthAggregate, DATE_FORMAT};
use crate::domain::staff::StaffMember;
use crate::domain::task::AllocationSummary;
use crate::engine::normalizer::normalize;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use tracing::{debug, info};

// ==========================================
// FairnessLedger - 月度结算器
// ==========================================
#[derive(Debug, Default)]
pub struct FairnessLedger;

impl FairnessLedger {
    pub fn new() -> Self {
        Self
    }

    /// 结算一天
    ///
    /// # 参数
    /// - `for_date`: 结算日期（决定月份键）
    /// - `staff_today`: 当日员工名单（含未参与者）
    /// - `today_summary`: 当日分配汇总
    /// - `prior`: 已持久化的当月累计（月份不符时视为新月）
    pub fn settle_day(
        &self,
        for_date: NaiveDate,
        staff_today: &[StaffMember],
        today_summary: &[AllocationSummary],
        prior: Option<MonthAggregate>,
    ) -> MonthAggregate {
        let month = month_key(for_date);
        let mut agg = match prior {
            Some(prev) if prev.month == month => prev,
            Some(prev) => {
                info!(from = %prev.month, to = %month, "跨月，重新开始月度累计");
                MonthAggregate::new(month.clone())
            }
            None => MonthAggregate::new(month.clone()),
        };

        let total_today: u64 = today_summary.iter().map(|s| s.count).sum();
        let active_weight: f64 = staff_today
            .iter()
            .filter(|s| s.is_active())
            .map(|s| s.effective_weight())
            .sum();

        for member in staff_today {
            let code = normalize(&member.code);
            if code.is_empty() {
                continue;
            }
            let share = if member.is_active() && active_weight > 0.0 {
                total_today as f64 * member.effective_weight() / active_weight
            } else {
                0.0
            };
            *agg.expected_cum.entry(code).or_insert(0.0) += share;
        }

        let today = for_date.format(DATE_FORMAT).to_string();
        for line in today_summary {
            let code = normalize(&line.user_code);
            if code.is_empty() {
                continue;
            }
            *agg.actual_cum.entry(code.clone()).or_insert(0) += line.count;
            if line.count > 0 {
                agg.last_served_at.insert(code, today.clone());
            }
        }

        let codes: BTreeSet<String> = agg
            .expected_cum
            .keys()
            .chain(agg.actual_cum.keys())
            .cloned()
            .collect();
        agg.deficit = codes
            .into_iter()
            .map(|code| {
                let expected = agg.expected_cum.get(&code).copied().unwrap_or(0.0);
                let actual = agg.actual_cum.get(&code).copied().unwrap_or(0) as f64;
                (code, expected - actual)
            })
            .collect();
        agg.settled_days += 1;

        debug!(
            month = %agg.month,
            total_today,
            settled_days = agg.settled_days,
            "月度结算完成"
        );
        agg
    }
}
