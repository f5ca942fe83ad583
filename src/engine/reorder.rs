// ==========================================
// 调拨单分配系统 - 次日优先级重排
// ==========================================
// 排序键（稳定排序，靠前者次日优先）:
// 1) 月度欠额降序
// 2) 在岗优先
// 3) 最近服务日升序（未服务视为空串，排最前）
// 4) 规范化代码升序
// 输出: 新顺序，order 字段按位置重写
// ==========================================

use crate::domain::month::MonthAggregate;
use crate::domain::staff::StaffMember;
use crate::engine::normalizer::normalize;
use std::cmp::Ordering;

// ==========================================
// ReorderStrategy - 重排策略
// ==========================================
#[derive(Debug, Default)]
pub struct ReorderStrategy;

impl ReorderStrategy {
    pub fn new() -> Self {
        Self
    }

    /// 按欠额重排员工
    pub fn reorder(&self, staff: &[StaffMember], agg: &MonthAggregate) -> Vec<StaffMember> {
        let mut sorted: Vec<&StaffMember> = staff.iter().collect();
        sorted.sort_by(|a, b| priority_cmp(a, b, agg));

        sorted
            .into_iter()
            .enumerate()
            .map(|(i, s)| StaffMember {
                order: i as i64,
                ..s.clone()
            })
            .collect()
    }

    /// 重排后的代码序列（供持久化）
    pub fn ordering_codes(reordered: &[StaffMember]) -> Vec<String> {
        reordered.iter().map(|s| s.code.clone()).collect()
    }
}

/// 两个员工的次日优先级比较（供外部复用）
pub fn priority_cmp(a: &StaffMember, b: &StaffMember, agg: &MonthAggregate) -> Ordering {
    let (ca, cb) = (normalize(&a.code), normalize(&b.code));
    agg.deficit_of(&cb)
        .total_cmp(&agg.deficit_of(&ca))
        .then_with(|| b.online.cmp(&a.online))
        .then_with(|| agg.last_served_of(&ca).cmp(agg.last_served_of(&cb)))
        .then_with(|| ca.cmp(&cb))
}
