// ==========================================
// 调拨单分配系统 - 分配编排器
// ==========================================
// 用途: 串联 读取员工 → 分配 → 写日志 → 月度结算 → 重排 → 写回排序
// 红线: 分配结果一旦算出即有效；后续持久化失败只记录在 RunOutcome 中
// ==========================================

use crate::config::AllocationConfig;
use crate::domain::month::{month_key, MonthAggregate, MonthEntry};
use crate::domain::staff::StaffMember;
use crate::domain::task::{AllocationResult, GroupColumns, TaskSheet};
use crate::domain::types::PersistenceStage;
use crate::engine::allocator::BlockAllocator;
use crate::engine::fairness::FairnessLedger;
use crate::engine::reorder::ReorderStrategy;
use crate::repository::{MonthStatsStore, RepositoryError, RepositoryResult, StaffStore};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// 分配日志来源标记
pub const ENTRY_SOURCE: &str = "allocate";

// ==========================================
// PersistenceStatus - 持久化结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersistenceStatus {
    Completed,
    Skipped, // 试运行
    Failed {
        stage: PersistenceStage,
        message: String,
    },
}

impl PersistenceStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, PersistenceStatus::Failed { .. })
    }
}

// ==========================================
// RunOutcome - 一次运行的输出
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_id: String,
    pub for_date: NaiveDate,
    pub result: AllocationResult,
    pub month_agg: Option<MonthAggregate>,  // 结算成功后才有
    pub reordered: Option<Vec<StaffMember>>, // 重排成功后才有
    pub persistence: PersistenceStatus,
}

// ==========================================
// AllocationOrchestrator - 分配编排器
// ==========================================
pub struct AllocationOrchestrator<S, M>
where
    S: StaffStore,
    M: MonthStatsStore,
{
    staff_store: Arc<S>,
    stats_store: Arc<M>,
    allocator: BlockAllocator,
    fairness: FairnessLedger,
    reorder: ReorderStrategy,
}

impl<S, M> AllocationOrchestrator<S, M>
where
    S: StaffStore,
    M: MonthStatsStore,
{
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - staff_store: 员工读取/排序写回
    /// - stats_store: 分配日志与月度累计
    /// - config: 分配参数
    pub fn new(staff_store: Arc<S>, stats_store: Arc<M>, config: AllocationConfig) -> Self {
        Self {
            staff_store,
            stats_store,
            allocator: BlockAllocator::new(config),
            fairness: FairnessLedger::new(),
            reorder: ReorderStrategy::new(),
        }
    }

    /// 执行一次分配
    ///
    /// # 参数
    /// - sheet: 任务表
    /// - columns: 已识别的分组列
    /// - for_date: 业务日期（决定月份键与最近服务日）
    /// - dry_run: 试运行，只分配不落库
    ///
    /// # 返回
    /// - Err: 仅当员工读取失败（尚无任何计算结果）
    #[instrument(skip(self, sheet, columns), fields(rows_count = sheet.rows.len()))]
    pub async fn run(
        &self,
        sheet: &TaskSheet,
        columns: &GroupColumns,
        for_date: NaiveDate,
        dry_run: bool,
    ) -> RepositoryResult<RunOutcome> {
        let run_id = Uuid::new_v4().to_string();
        let staff = self.staff_store.list_staff().await?;

        let result = self.allocator.allocate(&staff, &sheet.rows, columns);
        info!(
            run_id = %run_id,
            staff_count = staff.len(),
            assigned = result.assignments.len(),
            escalated = result.escalated(),
            "分配完成"
        );

        let mut outcome = RunOutcome {
            run_id,
            for_date,
            result,
            month_agg: None,
            reordered: None,
            persistence: PersistenceStatus::Skipped,
        };

        if dry_run {
            info!(run_id = %outcome.run_id, "试运行：不写日志、不结算、不重排");
            return Ok(outcome);
        }

        outcome.persistence = match self.persist(&staff, &mut outcome).await {
            Ok(()) => PersistenceStatus::Completed,
            Err((stage, err)) => {
                error!(
                    run_id = %outcome.run_id,
                    stage = %stage,
                    error = %err,
                    "持久化失败，分配结果仍然有效"
                );
                PersistenceStatus::Failed {
                    stage,
                    message: err.to_string(),
                }
            }
        };

        Ok(outcome)
    }

    /// 日志 → 读累计 → 结算 → 写累计 → 重排 → 写排序；任一步失败即停止
    async fn persist(
        &self,
        staff: &[StaffMember],
        outcome: &mut RunOutcome,
    ) -> Result<(), (PersistenceStage, RepositoryError)> {
        let month = month_key(outcome.for_date);
        let entries = build_entries(&outcome.run_id, &month, outcome.for_date, &outcome.result);

        self.stats_store
            .log_entries(&entries)
            .await
            .map_err(|e| (PersistenceStage::LogEntries, e))?;

        let prior = self
            .stats_store
            .load_month_agg(&month)
            .await
            .map_err(|e| (PersistenceStage::LoadMonthAgg, e))?;

        let agg = self
            .fairness
            .settle_day(outcome.for_date, staff, &outcome.result.summary, prior);
        outcome.month_agg = Some(agg.clone());

        self.stats_store
            .save_month_agg(&agg)
            .await
            .map_err(|e| (PersistenceStage::SaveMonthAgg, e))?;

        let reordered = self.reorder.reorder(staff, &agg);
        let codes = ReorderStrategy::ordering_codes(&reordered);
        outcome.reordered = Some(reordered);

        self.staff_store
            .save_ordering(&codes)
            .await
            .map_err(|e| (PersistenceStage::SaveOrdering, e))?;

        Ok(())
    }
}

/// 每条汇总生成一条日志（含 count=0 的员工）
fn build_entries(
    run_id: &str,
    month: &str,
    for_date: NaiveDate,
    result: &AllocationResult,
) -> Vec<MonthEntry> {
    let created_at = Local::now().naive_local();
    result
        .summary
        .iter()
        .filter(|s| !s.user_code.trim().is_empty())
        .map(|s| MonthEntry {
            entry_id: Uuid::new_v4().to_string(),
            month: month.to_string(),
            user_code: s.user_code.clone(),
            assigned_count: s.count,
            assigned_value: 0.0,
            meta: Some(json!({
                "source": ENTRY_SOURCE,
                "runId": run_id,
                "at": created_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            })),
            entry_date: for_date,
            created_at,
        })
        .collect()
}
