// ==========================================
// 调拨单分配系统 - 分配参数
// ==========================================
// 存储: config_kv 表（scope_id='global'，键见 config_keys）
// 缺省值即标准行为；读取失败/非法值回退缺省并告警
// ==========================================

use serde::{Deserialize, Serialize};

/// 外仓上限基准
pub const DEFAULT_FOREIGN_LIMIT_BASE: usize = 2;
/// 外仓上限最大值（升级终点）
pub const DEFAULT_FOREIGN_LIMIT_MAX: usize = 4;
/// 外仓上限的硬上限（配置值超出时截断）
pub const FOREIGN_LIMIT_CEILING: usize = 64;
/// 获得超额额度的最低权重（%）
pub const DEFAULT_OVERSHOOT_MIN_WEIGHT_PCT: f64 = 100.0;

// ==========================================
// AllocationConfig - 分配参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AllocationConfig {
    pub foreign_limit_base: usize,
    pub foreign_limit_max: usize,
    pub overshoot_min_weight_pct: f64,
    pub split_by_export: bool, // 同单据按发货地拆块
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            foreign_limit_base: DEFAULT_FOREIGN_LIMIT_BASE,
            foreign_limit_max: DEFAULT_FOREIGN_LIMIT_MAX,
            overshoot_min_weight_pct: DEFAULT_OVERSHOOT_MIN_WEIGHT_PCT,
            split_by_export: true,
        }
    }
}

impl AllocationConfig {
    /// 修正不一致的参数（均不超过硬上限；最大值不低于基准）
    pub fn normalized(mut self) -> Self {
        self.foreign_limit_base = self.foreign_limit_base.min(FOREIGN_LIMIT_CEILING);
        self.foreign_limit_max = self.foreign_limit_max.min(FOREIGN_LIMIT_CEILING);
        if self.foreign_limit_max < self.foreign_limit_base {
            self.foreign_limit_max = self.foreign_limit_base;
        }
        if !self.overshoot_min_weight_pct.is_finite() {
            self.overshoot_min_weight_pct = DEFAULT_OVERSHOOT_MIN_WEIGHT_PCT;
        }
        self
    }
}
