// ==========================================
// 调拨单分配系统 - 配额计算 (Hamilton / 最大余数法)
// ==========================================
// 职责: 将 N 行按权重分摊为每人整数配额
// 输入: 参与员工(顺序即优先级) + 总行数
// 输出: 与输入同序的配额，合计恰为 N
// ==========================================

use crate::domain::staff::StaffMember;
use std::cmp::Ordering;

/// 计算配额
///
/// 规则:
/// 1) 总权重 ≤ 0: 平均分配，前 `N mod k` 人各多 1
/// 2) 否则: share = N * w / W；先取 floor，余数按小数部分降序补 1，
///    小数部分相同则输入顺序靠前者优先
pub fn compute_quota(active: &[StaffMember], total_rows: u64) -> Vec<u64> {
    if active.is_empty() {
        return Vec::new();
    }

    let weights: Vec<f64> = active.iter().map(StaffMember::effective_weight).collect();
    let total_weight: f64 = weights.iter().sum();
    let count = active.len() as u64;

    if total_weight <= 0.0 || !total_weight.is_finite() {
        let even = total_rows / count;
        let rem = (total_rows % count) as usize;
        return (0..active.len())
            .map(|i| if i < rem { even + 1 } else { even })
            .collect();
    }

    let n = total_rows as f64;
    let shares: Vec<f64> = weights.iter().map(|w| n * w / total_weight).collect();
    let mut quota: Vec<u64> = shares.iter().map(|s| s.floor() as u64).collect();

    // 浮点误差下 floor 合计可能略超 N，按输入逆序回退
    let mut base_sum: u64 = quota.iter().sum();
    let mut idx = quota.len();
    while base_sum > total_rows && idx > 0 {
        idx -= 1;
        if quota[idx] > 0 {
            quota[idx] -= 1;
            base_sum -= 1;
        }
    }

    let remainder = (total_rows - base_sum) as usize;
    let mut by_fraction: Vec<(usize, f64)> = shares
        .iter()
        .enumerate()
        .map(|(i, s)| (i, s - s.floor()))
        .collect();
    by_fraction.sort_by(|a, b| match b.1.total_cmp(&a.1) {
        Ordering::Equal => a.0.cmp(&b.0),
        other => other,
    });

    for (i, _) in by_fraction.iter().cycle().take(remainder) {
        quota[*i] += 1;
    }

    quota
}
