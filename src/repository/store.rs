// ==========================================
// 调拨单分配系统 - 持久化协作接口
// ==========================================
// 职责: 定义编排器所需的外部读写接口（不包含业务逻辑）
// 实现者: SQLite 仓储（StaffRepository / MonthStatsRepository）
// ==========================================

use crate::domain::month::{MonthAggregate, MonthEntry};
use crate::domain::staff::StaffMember;
use crate::repository::error::RepositoryResult;
use crate::repository::month_agg_repo::MonthAggRepository;
use crate::repository::month_entry_repo::MonthEntryRepository;
use crate::repository::staff_repo::StaffRepository;
use async_trait::async_trait;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

// ==========================================
// StaffStore Trait
// ==========================================
#[async_trait]
pub trait StaffStore: Send + Sync {
    /// 读取全部已启用员工（按排序位次）
    async fn list_staff(&self) -> RepositoryResult<Vec<StaffMember>>;

    /// 保存次日顺序（order = 序列位置）
    async fn save_ordering(&self, codes_in_order: &[String]) -> RepositoryResult<()>;
}

// ==========================================
// MonthStatsStore Trait
// ==========================================
#[async_trait]
pub trait MonthStatsStore: Send + Sync {
    /// 追加当日分配日志
    async fn log_entries(&self, entries: &[MonthEntry]) -> RepositoryResult<()>;

    /// 读取某月累计（未结算返回 None）
    async fn load_month_agg(&self, month: &str) -> RepositoryResult<Option<MonthAggregate>>;

    /// 覆盖写入某月累计
    async fn save_month_agg(&self, agg: &MonthAggregate) -> RepositoryResult<()>;
}

#[async_trait]
impl StaffStore for StaffRepository {
    async fn list_staff(&self) -> RepositoryResult<Vec<StaffMember>> {
        self.list(true)
    }

    async fn save_ordering(&self, codes_in_order: &[String]) -> RepositoryResult<()> {
        StaffRepository::save_ordering(self, codes_in_order)?;
        Ok(())
    }
}

// ==========================================
// MonthStatsRepository - 月度统计组合仓储
// ==========================================
pub struct MonthStatsRepository {
    agg_repo: MonthAggRepository,
    entry_repo: MonthEntryRepository,
}

impl MonthStatsRepository {
    /// 从已有连接创建（两张表共用一个连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            agg_repo: MonthAggRepository::from_connection(conn.clone()),
            entry_repo: MonthEntryRepository::from_connection(conn),
        }
    }

    pub fn entries(&self) -> &MonthEntryRepository {
        &self.entry_repo
    }
}

#[async_trait]
impl MonthStatsStore for MonthStatsRepository {
    async fn log_entries(&self, entries: &[MonthEntry]) -> RepositoryResult<()> {
        self.entry_repo.insert_batch(entries)?;
        Ok(())
    }

    async fn load_month_agg(&self, month: &str) -> RepositoryResult<Option<MonthAggregate>> {
        self.agg_repo.load(month)
    }

    async fn save_month_agg(&self, agg: &MonthAggregate) -> RepositoryResult<()> {
        self.agg_repo.save(agg)
    }
}
