// ==========================================
// 商品导入暂存系统 - 列映射值类型
// ==========================================
// 职责: 目标字段目录项、映射建议、映射后的行
// 说明: MappingSuggestion 不落库，每次摄取重新计算
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 目标字段（字段键 + 显示名 + 同义词）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetField {
    pub key: String,
    pub label: String,
    pub aliases: Vec<String>,
    pub required: bool,
}

impl TargetField {
    pub fn new(key: &str, label: &str, aliases: &[&str], required: bool) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            required,
        }
    }
}

/// 候选字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingAlternate {
    pub field: String,
    pub confidence: f64,
}

/// 单个源列的映射建议
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingSuggestion {
    pub source_column: String,
    pub column_index: usize,
    /// None 表示无建议（confidence = 0），留给人工映射
    pub matched_field: Option<String>,
    pub confidence: f64,
    /// 置信度达到自动映射阈值
    pub auto_applied: bool,
    pub alternates: Vec<MappingAlternate>,
}

/// 列映射: 列序号 → 目标字段键
pub type ColumnMapping = BTreeMap<usize, String>;

/// 映射后的行（字段键 → 原始文本）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappedRow {
    /// 源数据行号（从 1 开始，不含表头）
    pub row_number: usize,
    pub fields: BTreeMap<String, String>,
}

impl MappedRow {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: &str, value: &str) -> Self {
        self.fields.insert(field.to_string(), value.to_string());
        self
    }

    /// 读取非空字段值
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}
