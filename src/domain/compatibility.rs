// ==========================================
// 商品导入暂存系统 - 适配车型值类型
// ==========================================
// 职责: CompatibilityEntry / CompatibilityData（compatibility_data JSON 列）
// 红线: 快照字段在保存时复制，不做实时关联
// ==========================================

use crate::domain::types::CompatibilityClass;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// compatibility_data 当前结构版本
pub const COMPATIBILITY_DATA_VERSION: u32 = 1;

/// 手工录入来源
pub const MANUAL_SOURCE_ID: i64 = 1;
pub const MANUAL_SOURCE_NAME: &str = "Manual";

/// 车型快照（来自目录）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleInfo {
    pub vehicle_id: i64,
    pub sku: String,
    pub name: String,
}

/// 适配属性（Original / Replacement 在目录中的记录）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityAttribute {
    pub id: i64,
    pub name: String,
}

// ==========================================
// CompatibilityEntry - 单条适配
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityEntry {
    pub vehicle_id: i64,
    pub vehicle_sku: String,
    pub vehicle_name: String,
    pub attribute_id: i64,
    pub attribute_name: String,
    pub source_id: i64,
    pub source_name: String,
    #[serde(default)]
    pub notes: String,
    /// 旧数据可能缺失，加载时按 attribute_name 推断
    #[serde(default)]
    pub classification: Option<CompatibilityClass>,
}

// ==========================================
// CompatibilityData - 持久化快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityData {
    #[serde(default = "compatibility_data_version")]
    pub version: u32,
    pub compatibilities: Vec<CompatibilityEntry>,
    pub updated_at: DateTime<Utc>,
}

fn compatibility_data_version() -> u32 {
    COMPATIBILITY_DATA_VERSION
}

impl CompatibilityData {
    pub fn is_empty(&self) -> bool {
        self.compatibilities.is_empty()
    }

    pub fn vehicle_ids(&self) -> Vec<i64> {
        self.compatibilities.iter().map(|c| c.vehicle_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_without_classification_deserializes() {
        let json = r#"{
            "vehicle_id": 7, "vehicle_sku": "V-7", "vehicle_name": "Vehicle 7",
            "attribute_id": 1, "attribute_name": "Oryginał",
            "source_id": 1, "source_name": "Manual"
        }"#;
        let entry: CompatibilityEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.vehicle_id, 7);
        assert_eq!(entry.classification, None);
        assert_eq!(entry.notes, "");
    }
}
