// ==========================================
// 调拨单分配系统 - 员工领域模型
// ==========================================
// 职责: 员工(分配对象)主数据 + 权重/在线状态判定
// 红线: code 全局唯一；仅 online && weight > 0 参与分配
// ==========================================

use serde::{Deserialize, Serialize};

/// 基准权重（100% = 标准工作量）
pub const BASELINE_WEIGHT_PCT: f64 = 100.0;

// ==========================================
// StaffMember - 员工
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub code: String,            // 员工代码（规范化大写）
    pub name: String,            // 姓名
    pub weight_pct: f64,         // 权重百分比（100 = 基准，0 = 不参与）
    pub online: bool,            // 是否在岗
    #[serde(default)]
    pub warehouses: Vec<String>, // 归属仓库代码（规范化）
    #[serde(default)]
    pub order: i64,              // 排序位次（越小越优先）
}

impl StaffMember {
    /// 构造在岗员工（无归属仓库，order=0）
    pub fn new(code: impl Into<String>, name: impl Into<String>, weight_pct: f64) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            weight_pct,
            online: true,
            warehouses: Vec::new(),
            order: 0,
        }
    }

    /// 追加归属仓库（链式构造，测试/导入复用）
    pub fn with_warehouses<I, S>(mut self, warehouses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.warehouses = warehouses.into_iter().map(Into::into).collect();
        self
    }

    /// 设置在岗状态
    pub fn with_online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    /// 有效权重
    ///
    /// 非有限值(NaN/Inf)或负数一律视为 0，避免 NaN 扩散到配额计算。
    pub fn effective_weight(&self) -> f64 {
        if self.weight_pct.is_finite() && self.weight_pct > 0.0 {
            self.weight_pct
        } else {
            0.0
        }
    }

    /// 是否参与本次分配（在岗 + 权重 > 0 + 代码非空）
    pub fn is_active(&self) -> bool {
        self.online && self.effective_weight() > 0.0 && !self.code.trim().is_empty()
    }
}
