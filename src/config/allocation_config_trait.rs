// ==========================================
// 调拨单分配系统 - 分配配置读取 Trait
// ==========================================
// 职责: 定义分配引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::allocation_config::AllocationConfig;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// AllocationConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait AllocationConfigReader: Send + Sync {
    /// 外仓上限基准
    ///
    /// # 默认值
    /// - 2
    async fn get_foreign_limit_base(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;

    /// 外仓上限最大值（小于基准时按基准）
    ///
    /// # 默认值
    /// - 4
    async fn get_foreign_limit_max(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;

    /// 获得超额额度的最低权重（%）
    ///
    /// # 默认值
    /// - 100.0
    async fn get_overshoot_min_weight_pct(&self) -> Result<f64, Box<dyn Error + Send + Sync>>;

    /// 同单据是否按发货地拆分
    ///
    /// # 默认值
    /// - true
    async fn get_split_by_export(&self) -> Result<bool, Box<dyn Error + Send + Sync>>;

    /// 一次性读取完整分配参数
    async fn get_allocation_config(&self) -> Result<AllocationConfig, Box<dyn Error + Send + Sync>> {
        Ok(AllocationConfig {
            foreign_limit_base: self.get_foreign_limit_base().await?,
            foreign_limit_max: self.get_foreign_limit_max().await?,
            overshoot_min_weight_pct: self.get_overshoot_min_weight_pct().await?,
            split_by_export: self.get_split_by_export().await?,
        }
        .normalized())
    }
}
