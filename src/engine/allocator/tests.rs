use super::ladder::{force_assign, LadderStep};
use super::ledger::{LedgerBook, StaffLedger};
use super::BlockAllocator;
use crate::config::AllocationConfig;
use crate::domain::staff::StaffMember;
use crate::domain::task::{Block, GroupColumns, TaskRow};
use crate::domain::types::AssignReason;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};

// ==========================================
// 测试辅助函数
// ==========================================

fn staff(code: &str, weight: f64, warehouses: &[&str]) -> StaffMember {
    StaffMember::new(code, format!("NV {}", code), weight).with_warehouses(warehouses.iter().copied())
}

fn task_rows(pairs: &[(&str, &str)]) -> Vec<TaskRow> {
    pairs.iter()
        .map(|(voucher, export)| [("So CT", *voucher), ("Noi xuat", *export)].into_iter().collect())
        .collect()
}

fn columns() -> GroupColumns {
    GroupColumns {
        voucher_key: Some("So CT".to_string()),
        export_key: Some("Noi xuat".to_string()),
        ..GroupColumns::default()
    }
}

fn owner_of_rows(result: &crate::domain::task::AllocationResult) -> Vec<String> {
    result.assignments.iter().map(|a| a.user_code.clone()).collect()
}

const WAREHOUSES: [&str; 6] = ["W1", "W2", "003", "W4", "W5", "W6"];
const EXPORTS: [&str; 8] = ["W1", "W2", "3", "W4", "W5", "W6", "W7", "W8"];
const WEIGHTS: [f64; 6] = [0.0, 50.0, 100.0, 100.0, 150.0, 200.0];

/// 2..7 名员工：随机权重、0..3 个归属仓库、约 1/5 不在岗
fn arb_staff() -> impl Strategy<Value = Vec<StaffMember>> {
    prop::collection::vec(
        (
            prop::sample::select(WEIGHTS.to_vec()),
            prop::collection::vec(prop::sample::select(WAREHOUSES.to_vec()), 0..3),
            0u8..5,
        ),
        2..7,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (weight, owned, online))| {
                staff(&format!("S{}", i), weight, &owned).with_online(online != 0)
            })
            .collect()
    })
}

/// 0..40 行：单据号 V0..V9（偶有空值），发货地偶有空值
fn arb_rows() -> impl Strategy<Value = Vec<TaskRow>> {
    prop::collection::vec(
        (
            prop::option::weighted(0.875, 0u8..10),
            prop::option::weighted(0.83, prop::sample::select(EXPORTS.to_vec())),
        ),
        0..40,
    )
    .prop_map(|pairs| {
        pairs.into_iter()
            .map(|(voucher, export)| {
                [
                    ("So CT", voucher.map(|n| format!("V{}", n)).unwrap_or_default()),
                    ("Noi xuat", export.unwrap_or("").to_string()),
                ]
                .into_iter()
                .collect()
            })
            .collect()
    })
}

fn ledger(code: &str, weight: f64, warehouses: &[&str], rank: usize, quota: u64) -> StaffLedger {
    StaffLedger::new(&staff(code, weight, warehouses), rank, quota, 100.0)
}

fn block(key: &str, size: usize, exports: &[&str]) -> Block {
    Block {
        key: key.to_string(),
        row_indices: (0..size).collect(),
        export_keys: exports.iter().map(|e| e.to_string()).collect::<BTreeSet<_>>(),
        lead_export: exports.first().map(|e| e.to_string()),
    }
}

// ==========================================
// 示例场景
// ==========================================

#[test]
fn test_owner_blocks_with_granularity_leftover() {
    // A(200,W1) / B(100,W2) / C(100)；两块各 4 行 → 配额 4/2/2
    let members = vec![
        staff("A", 200.0, &["W1"]),
        staff("B", 100.0, &["W2"]),
        staff("C", 100.0, &[]),
    ];
    let rows = task_rows(&[
        ("V1", "W1"),
        ("V1", "W1"),
        ("V1", "W1"),
        ("V1", "W1"),
        ("V2", "W2"),
        ("V2", "W2"),
        ("V2", "W2"),
        ("V2", "W2"),
    ]);

    let result = BlockAllocator::default().allocate(&members, &rows, &columns());

    assert_eq!(result.quotas.get("A"), Some(&4));
    assert_eq!(result.quotas.get("B"), Some(&2));
    assert_eq!(result.quotas.get("C"), Some(&2));
    assert_eq!(owner_of_rows(&result), vec!["A", "A", "A", "A", "B", "B", "B", "B"]);
    assert_eq!(result.count_of("A"), 4);
    assert_eq!(result.count_of("B"), 4);
    assert_eq!(result.count_of("C"), 0);
    assert_eq!(result.decisions[0].reason, AssignReason::OwnerWithRoom);
    assert_eq!(result.decisions[1].reason, AssignReason::OwnerOvershoot);
}

#[test]
fn test_empty_task_list() {
    let members = vec![staff("A", 100.0, &[]), staff("B", 0.0, &[])];
    let result = BlockAllocator::default().allocate(&members, &[], &columns());

    assert!(result.assignments.is_empty());
    assert_eq!(result.summary.len(), 2);
    assert!(result.summary.iter().all(|s| s.count == 0));
}

#[test]
fn test_no_active_staff() {
    let members = vec![
        staff("A", 100.0, &[]).with_online(false),
        staff("B", 0.0, &[]),
    ];
    let rows = task_rows(&[("V1", "W1")]);
    let result = BlockAllocator::default().allocate(&members, &rows, &columns());

    assert!(result.assignments.is_empty());
    assert_eq!(result.summary.len(), 2);
    assert!(result.summary.iter().all(|s| s.count == 0));
}

#[test]
fn test_single_staff_singleton_blocks() {
    let members = vec![staff("A", 150.0, &[])];
    let rows = task_rows(&[("V1", ""); 10]);
    let no_voucher = GroupColumns::default();

    let result = BlockAllocator::default().allocate(&members, &rows, &no_voucher);

    assert_eq!(result.quotas.get("A"), Some(&10));
    assert_eq!(result.decisions.len(), 10);
    assert_eq!(result.assignments.len(), 10);
    assert!(result.assignments.iter().all(|a| a.user_code == "A"));
    assert_eq!(result.count_of("A"), 10);
    assert!(!result.escalated());
}

// ==========================================
// 归属优先 / 外仓上限
// ==========================================

#[test]
fn test_owner_preferred_with_leading_zero_match() {
    let members = vec![
        staff("A", 100.0, &[]),
        staff("B", 100.0, &["007"]),
        staff("C", 100.0, &[]),
    ];
    let rows = task_rows(&[
        ("V1", "7"),
        ("V1", "7"),
        ("V2", "X"),
        ("V2", "X"),
        ("V3", "Y"),
        ("V3", "Y"),
    ]);

    let result = BlockAllocator::default().allocate(&members, &rows, &columns());

    assert_eq!(owner_of_rows(&result), vec!["B", "B", "A", "A", "C", "C"]);
    assert!(!result.escalated());
    assert!(result.foreign_usage["B"].is_empty());
    assert_eq!(result.foreign_usage["A"], BTreeSet::from(["X".to_string()]));
}

#[test]
fn test_largest_block_first_then_owner() {
    let members = vec![staff("A", 300.0, &[]), staff("B", 100.0, &["W9"])];
    let rows = task_rows(&[("V1", "W9"), ("V2", ""), ("V2", ""), ("V2", "")]);

    let result = BlockAllocator::default().allocate(&members, &rows, &columns());

    assert_eq!(result.decisions[0].size, 3);
    assert_eq!(owner_of_rows(&result), vec!["B", "A", "A", "A"]);
}

#[test]
fn test_voucher_split_across_owners() {
    let members = vec![staff("A", 100.0, &["W1"]), staff("B", 100.0, &["W2"])];
    let rows = task_rows(&[("V1", "W1"), ("V1", "W2"), ("V1", "W1"), ("V1", "W2")]);

    let result = BlockAllocator::default().allocate(&members, &rows, &columns());

    assert_eq!(owner_of_rows(&result), vec!["A", "B", "A", "B"]);
    assert!(result
        .decisions
        .iter()
        .all(|d| d.reason == AssignReason::OwnerWithRoom));
}

#[test]
fn test_foreign_limit_escalates_to_three() {
    // A(300) 已接触 E1/E2 后，E3 交给 B；E4 在上限 2 下无人可接，升级到 3 由 A 接
    let members = vec![staff("A", 300.0, &[]), staff("B", 50.0, &[])];
    let rows = task_rows(&[("V1", "E1"), ("V2", "E2"), ("V3", "E3"), ("V4", "E4")]);

    let result = BlockAllocator::default().allocate(&members, &rows, &columns());

    assert_eq!(result.quotas.get("A"), Some(&3));
    assert_eq!(result.quotas.get("B"), Some(&1));
    assert_eq!(owner_of_rows(&result), vec!["A", "A", "B", "A"]);

    let last = &result.decisions[3];
    assert_eq!(last.reason, AssignReason::ForeignWithRoom);
    assert_eq!(last.foreign_limit, 3);
    assert!(last.escalated);
    assert!(!result.decisions[2].escalated);
    assert_eq!(result.foreign_usage["A"].len(), 3);
    assert!(result.escalated());
}

#[test]
fn test_force_assign_prefers_low_weight_with_room() {
    // 两人均 50%，无超额额度；3 行块无人能整块容纳 → 强制分配
    let members = vec![staff("A", 50.0, &[]), staff("B", 50.0, &[])];
    let rows = task_rows(&[("V1", ""), ("V1", ""), ("V1", ""), ("V2", "")]);

    let result = BlockAllocator::default().allocate(&members, &rows, &columns());

    assert_eq!(result.decisions[0].reason, AssignReason::ForceAssign);
    assert_eq!(result.decisions[0].user_code, "A");
    assert_eq!(result.decisions[1].reason, AssignReason::ForeignWithRoom);
    assert_eq!(result.count_of("A"), 3);
    assert_eq!(result.count_of("B"), 1);
}

#[test]
fn test_inactive_staff_reported_with_zero() {
    let members = vec![
        staff("A", 100.0, &["W1"]),
        staff("OFF", 100.0, &["W1"]).with_online(false),
        staff("ZERO", 0.0, &["W1"]),
        staff("", 100.0, &["W1"]),
    ];
    let rows = task_rows(&[("V1", "W1"), ("V2", "W1")]);

    let result = BlockAllocator::default().allocate(&members, &rows, &columns());

    assert_eq!(result.summary.len(), 4);
    assert_eq!(result.count_of("A"), 2);
    assert_eq!(result.count_of("OFF"), 0);
    assert_eq!(result.count_of("ZERO"), 0);
    assert!(result.assignments.iter().all(|a| a.user_code == "A"));
}

#[test]
fn test_duplicate_codes_only_first_participates() {
    let members = vec![staff("A", 100.0, &[]), staff("a", 100.0, &[]), staff("B", 100.0, &[])];
    let rows = task_rows(&[("V1", ""), ("V2", "")]);

    let result = BlockAllocator::default().allocate(&members, &rows, &columns());

    assert_eq!(result.quotas.len(), 2);
    assert_eq!(result.summary[1].count, 0);
    assert_eq!(result.count_of("A") + result.count_of("B"), 2);

    // 离线的同码条目在前：计数归实际参与的在线条目
    let members = vec![staff("A", 100.0, &[]).with_online(false), staff("A", 100.0, &[])];
    let result = BlockAllocator::default().allocate(&members, &rows, &columns());

    let counts: Vec<(bool, u64)> = result.summary.iter().map(|s| (s.online, s.count)).collect();
    assert_eq!(counts, vec![(false, 0), (true, 2)]);
    assert_eq!(result.assignments.len(), 2);
}

#[test]
fn test_oversized_foreign_limit_max_stops_at_saturation() {
    // 3 行块无人能整块容纳；上限再高也不改变结果，应在基准处即转强制分配
    let config = AllocationConfig {
        foreign_limit_max: 200_000_000,
        ..AllocationConfig::default()
    };
    let members = vec![staff("A", 50.0, &[]), staff("B", 50.0, &[])];
    let rows = task_rows(&[("V1", ""), ("V1", ""), ("V1", ""), ("V2", "")]);

    let result = BlockAllocator::new(config).allocate(&members, &rows, &columns());

    let first = &result.decisions[0];
    assert_eq!(first.reason, AssignReason::ForceAssign);
    assert_eq!(first.foreign_limit, 2);
    assert!(first.escalated);
    assert_eq!(result.assignments.len(), 4);
    assert_eq!(result.count_of("A") + result.count_of("B"), 4);
}

#[test]
fn test_non_finite_weight_does_not_poison_quota() {
    let members = vec![staff("A", f64::NAN, &[]), staff("B", 100.0, &[])];
    let rows = task_rows(&[("V1", ""), ("V2", ""), ("V3", "")]);

    let result = BlockAllocator::default().allocate(&members, &rows, &columns());

    assert_eq!(result.quotas.len(), 1);
    assert_eq!(result.count_of("B"), 3);
}

#[test]
fn test_voucher_only_grouping_config() {
    let config = AllocationConfig {
        split_by_export: false,
        ..AllocationConfig::default()
    };
    let members = vec![staff("A", 100.0, &["W1"]), staff("B", 100.0, &["W2"])];
    let rows = task_rows(&[("V1", "W1"), ("V1", "W2"), ("V2", "W2"), ("V2", "W2")]);

    let result = BlockAllocator::new(config).allocate(&members, &rows, &columns());

    // V1 整块（代表发货地 W1）给 A，W2 对 A 而言是外仓
    assert_eq!(owner_of_rows(&result), vec!["A", "A", "B", "B"]);
    assert_eq!(result.foreign_usage["A"], BTreeSet::from(["W2".to_string()]));
}

// ==========================================
// 性质测试
// ==========================================

proptest! {
    #[test]
    fn prop_completeness_and_block_atomicity(members in arb_staff(), rows in arb_rows()) {
        let result = BlockAllocator::default().allocate(&members, &rows, &columns());

        let active: HashSet<&str> = members
            .iter()
            .filter(|m| m.is_active())
            .map(|m| m.code.as_str())
            .collect();
        if active.is_empty() || rows.is_empty() {
            prop_assert!(result.assignments.is_empty());
            return Ok(());
        }

        let indices: Vec<usize> = result.assignments.iter().map(|a| a.task_index).collect();
        prop_assert_eq!(indices, (0..rows.len()).collect::<Vec<_>>());
        prop_assert!(result.assignments.iter().all(|a| active.contains(a.user_code.as_str())));

        let mut owner_by_block: HashMap<(String, String), String> = HashMap::new();
        for (i, row) in rows.iter().enumerate() {
            let voucher = row.get("So CT").unwrap_or("").to_string();
            if voucher.is_empty() {
                continue;
            }
            let key = (voucher, row.get("Noi xuat").unwrap_or("").to_string());
            let owner = result.assignments[i].user_code.clone();
            let prev = owner_by_block.entry(key).or_insert_with(|| owner.clone());
            prop_assert_eq!(prev.as_str(), owner.as_str(), "row={}", i);
        }

        let total: u64 = result.summary.iter().map(|s| s.count).sum();
        prop_assert_eq!(total, rows.len() as u64);
        prop_assert_eq!(result.quotas.values().sum::<u64>(), rows.len() as u64);
    }

    #[test]
    fn prop_foreign_limit_respected_without_escalation(members in arb_staff(), rows in arb_rows()) {
        let result = BlockAllocator::default().allocate(&members, &rows, &columns());
        if result.escalated() {
            return Ok(());
        }
        for (code, used) in &result.foreign_usage {
            prop_assert!(used.len() <= 2, "code={} used={:?}", code, used);
        }
    }

    #[test]
    fn prop_overshoot_budget_used_at_most_once(members in arb_staff(), rows in arb_rows()) {
        let result = BlockAllocator::default().allocate(&members, &rows, &columns());
        let mut overshoots: HashMap<&str, usize> = HashMap::new();
        for d in &result.decisions {
            if matches!(d.reason, AssignReason::OwnerOvershoot | AssignReason::ForeignOvershoot) {
                *overshoots.entry(d.user_code.as_str()).or_default() += 1;
            }
        }
        prop_assert!(overshoots.values().all(|&n| n <= 1), "{:?}", overshoots);
    }

    #[test]
    fn prop_allocation_is_deterministic(members in arb_staff(), rows in arb_rows()) {
        let allocator = BlockAllocator::default();
        let first = allocator.allocate(&members, &rows, &columns());
        let second = allocator.allocate(&members, &rows, &columns());
        prop_assert_eq!(first, second);
    }
}

// ==========================================
// 阶梯步骤单元测试
// ==========================================

#[test]
fn test_overshoot_step_requires_budget_and_weight() {
    let mut book = LedgerBook::default();
    let mut spent = ledger("A", 100.0, &[], 0, 1);
    spent.overshoot_budget = false;
    book.push(spent);
    book.push(ledger("B", 50.0, &[], 1, 1));
    book.push(ledger("C", 100.0, &[], 2, 0));

    let b = block("V1", 3, &["E1"]);
    assert_eq!(LadderStep::ForeignWithRoom.select(&book, &b, 2), None);
    assert_eq!(LadderStep::ForeignOvershoot.select(&book, &b, 2), Some("C".to_string()));
}

#[test]
fn test_owner_step_ignores_non_owners() {
    let mut book = LedgerBook::default();
    book.push(ledger("A", 100.0, &[], 0, 10));
    book.push(ledger("B", 100.0, &["W1"], 1, 2));

    let b = block("V1", 2, &["W1"]);
    assert_eq!(LadderStep::OwnerWithRoom.select(&book, &b, 2), Some("B".to_string()));
    assert_eq!(LadderStep::ForeignWithRoom.select(&book, &b, 2), Some("A".to_string()));
}

#[test]
fn test_balance_tie_breaks_by_utilization_then_rank() {
    let mut book = LedgerBook::default();
    let mut a = ledger("A", 100.0, &[], 0, 4);
    a.assigned = 2;
    a.deficit = 2;
    book.push(a);
    book.push(ledger("B", 100.0, &[], 1, 2));
    book.push(ledger("C", 100.0, &[], 2, 2));

    let b = block("V1", 1, &[]);
    // A/B/C 欠额同为 2；B、C 利用率 0 → 按顺序选 B
    assert_eq!(LadderStep::ForeignWithRoom.select(&book, &b, 2), Some("B".to_string()));
}

#[test]
fn test_foreign_limit_counts_only_new_keys() {
    let mut a = ledger("A", 100.0, &[], 0, 10);
    a.record(1, &BTreeSet::from(["E1".to_string()]));
    a.record(1, &BTreeSet::from(["E2".to_string()]));
    assert!(a.within_foreign_limit(&BTreeSet::from(["E1".to_string()]), 2));
    assert!(!a.within_foreign_limit(&BTreeSet::from(["E3".to_string()]), 2));
    assert!(a.within_foreign_limit(&BTreeSet::from(["E3".to_string()]), 3));
    assert_eq!(a.deficit, 8);
}

#[test]
fn test_force_assign_owner_first() {
    let mut book = LedgerBook::default();
    let mut owner = ledger("A", 100.0, &["W1"], 0, 1);
    owner.deficit = -3;
    book.push(owner);
    book.push(ledger("B", 50.0, &[], 1, 5));

    let b = block("V1", 4, &["W1"]);
    assert_eq!(force_assign(&book, &b, 100.0), Some("A".to_string()));

    let unowned = block("V2", 4, &["W2"]);
    assert_eq!(force_assign(&book, &unowned, 100.0), Some("B".to_string()));
}
