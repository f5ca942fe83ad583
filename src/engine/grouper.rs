// ==========================================
// 调拨单分配系统 - 分块器
// ==========================================
// 职责: 将任务行划分为不可拆分的块
// 规则:
// 1) 有单据列: 同一规范化单据号为一组；单据号为空的行各自成块
// 2) 可按发货地再拆分（同单据不同发货地 → 不同块）
// 3) 无单据列: 每行一块
// 输出顺序: 块大小降序，首行号升序
// ==========================================

use crate::domain::task::{Block, TaskRow};
use crate::engine::normalizer::normalize;
use std::collections::{BTreeSet, HashMap};

// ==========================================
// BlockGrouper - 分块器
// ==========================================
pub struct BlockGrouper {
    split_by_export: bool,
}

impl BlockGrouper {
    /// 构造函数
    ///
    /// # 参数
    /// - `split_by_export`: 同单据是否按发货地拆分
    pub fn new(split_by_export: bool) -> Self {
        Self { split_by_export }
    }

    /// 分块并按处理顺序排序
    pub fn group_rows(
        &self,
        rows: &[TaskRow],
        voucher_key: Option<&str>,
        export_key: Option<&str>,
    ) -> Vec<Block> {
        let mut blocks = self.group_in_row_order(rows, voucher_key, export_key);
        blocks.sort_by(|a, b| {
            b.size()
                .cmp(&a.size())
                .then_with(|| a.first_index().cmp(&b.first_index()))
        });
        blocks
    }

    /// 分块（保持首行出现顺序）
    fn group_in_row_order(
        &self,
        rows: &[TaskRow],
        voucher_key: Option<&str>,
        export_key: Option<&str>,
    ) -> Vec<Block> {
        let export_of = |i: usize| -> String {
            export_key
                .and_then(|k| rows[i].get(k))
                .map(normalize)
                .unwrap_or_default()
        };

        let mut blocks: Vec<Block> = Vec::new();
        let mut index_by_key: HashMap<String, usize> = HashMap::new();

        for i in 0..rows.len() {
            let voucher = voucher_key
                .and_then(|k| rows[i].get(k))
                .map(normalize)
                .unwrap_or_default();
            let export = export_of(i);

            let key = if voucher.is_empty() {
                format!("__ROW_{}", i)
            } else if self.split_by_export {
                format!("{}\u{1f}{}", voucher, export)
            } else {
                voucher
            };

            match index_by_key.get(&key) {
                Some(&pos) => {
                    let block = &mut blocks[pos];
                    block.row_indices.push(i);
                    if !export.is_empty() {
                        block.export_keys.insert(export);
                    }
                }
                None => {
                    index_by_key.insert(key.clone(), blocks.len());
                    let mut export_keys = BTreeSet::new();
                    if !export.is_empty() {
                        export_keys.insert(export.clone());
                    }
                    blocks.push(Block {
                        key,
                        row_indices: vec![i],
                        export_keys,
                        lead_export: (!export.is_empty()).then_some(export),
                    });
                }
            }
        }

        blocks
    }
}

impl Default for BlockGrouper {
    fn default() -> Self {
        Self::new(true)
    }
}

/// 按多列的文本值稳定排序（用于预览展示，不影响分配）
pub fn sort_rows_by_keys(rows: &[TaskRow], keys: &[&str]) -> Vec<TaskRow> {
    let mut indexed: Vec<(usize, &TaskRow)> = rows.iter().enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| {
        keys.iter()
            .map(|k| a.get(k).unwrap_or("").cmp(b.get(k).unwrap_or("")))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| ia.cmp(ib))
    });
    indexed.into_iter().map(|(_, r)| r.clone()).collect()
}
