// ==========================================
// 商品导入暂存系统 - 变体值类型
// ==========================================
// 职责: Variant / VariantData（variant_data JSON 列的结构化表示）
// 红线: 同一变体内任意两个属性不得共享 attribute_type_id
// ==========================================

use crate::domain::types::SkuMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// variant_data 当前结构版本
pub const VARIANT_DATA_VERSION: u32 = 1;

/// 属性值元数据（来自属性目录）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeValueInfo {
    pub value_id: i64,
    pub attribute_type_id: i64,
    pub attribute_type_name: String,
    pub attribute_type_code: String,
    pub label: String,
    pub color_hex: Option<String>,
    pub auto_prefix: Option<String>,
    pub auto_prefix_enabled: bool,
    pub auto_suffix: Option<String>,
    pub auto_suffix_enabled: bool,
}

impl AttributeValueInfo {
    /// 已启用且非空的前缀 token
    pub fn enabled_prefix(&self) -> Option<&str> {
        match (&self.auto_prefix, self.auto_prefix_enabled) {
            (Some(p), true) if !p.is_empty() => Some(p.as_str()),
            _ => None,
        }
    }

    /// 已启用且非空的后缀 token
    pub fn enabled_suffix(&self) -> Option<&str> {
        match (&self.auto_suffix, self.auto_suffix_enabled) {
            (Some(s), true) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }
}

/// 变体中的一个维度取值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantAttribute {
    pub attribute_type_id: i64,
    pub attribute_type_name: String,
    pub attribute_type_code: String,
    pub value_id: i64,
    /// 属性值标签
    pub value: String,
    pub color_hex: Option<String>,
}

impl From<&AttributeValueInfo> for VariantAttribute {
    fn from(info: &AttributeValueInfo) -> Self {
        Self {
            attribute_type_id: info.attribute_type_id,
            attribute_type_name: info.attribute_type_name.clone(),
            attribute_type_code: info.attribute_type_code.clone(),
            value_id: info.value_id,
            value: info.label.clone(),
            color_hex: info.color_hex.clone(),
        }
    }
}

// ==========================================
// Variant - 单个变体
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub sku_suffix: String,
    pub full_sku: String,
    /// 仅由属性值标签拼接，不含基础商品名
    pub name: String,
    pub attributes: Vec<VariantAttribute>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Variant {
    /// 每个属性类型至多出现一次
    pub fn has_distinct_dimensions(&self) -> bool {
        let mut seen = HashSet::new();
        self.attributes.iter().all(|a| seen.insert(a.attribute_type_id))
    }

    pub fn uses_value(&self, attribute_type_id: i64, value_id: i64) -> bool {
        self.attributes
            .iter()
            .any(|a| a.attribute_type_id == attribute_type_id && a.value_id == value_id)
    }
}

// ==========================================
// VariantData - 持久化快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantData {
    #[serde(default = "variant_data_version")]
    pub version: u32,
    pub variants: Vec<Variant>,
    /// 参与生成的属性类型（按选择顺序）
    pub attribute_types_used: Vec<i64>,
    pub sku_mode: SkuMode,
    pub sku_separator: String,
    #[serde(default)]
    pub use_db_suffix_prefix: bool,
    pub generated_at: DateTime<Utc>,
}

fn variant_data_version() -> u32 {
    VARIANT_DATA_VERSION
}

impl VariantData {
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.variants.iter().filter(|v| v.is_active).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(type_id: i64, value_id: i64, label: &str) -> VariantAttribute {
        VariantAttribute {
            attribute_type_id: type_id,
            attribute_type_name: format!("T{}", type_id),
            attribute_type_code: format!("t{}", type_id),
            value_id,
            value: label.to_string(),
            color_hex: None,
        }
    }

    #[test]
    fn test_distinct_dimensions() {
        let mut variant = Variant {
            sku_suffix: "-RED-XL".to_string(),
            full_sku: "ABC-RED-XL".to_string(),
            name: "Red, XL".to_string(),
            attributes: vec![attr(1, 10, "Red"), attr(2, 20, "XL")],
            price: None,
            is_active: true,
        };
        assert!(variant.has_distinct_dimensions());
        assert!(variant.uses_value(2, 20));

        variant.attributes.push(attr(1, 11, "Blue"));
        assert!(!variant.has_distinct_dimensions());
    }

    #[test]
    fn test_enabled_tokens() {
        let info = AttributeValueInfo {
            value_id: 1,
            attribute_type_id: 1,
            attribute_type_name: "Color".to_string(),
            attribute_type_code: "color".to_string(),
            label: "Red".to_string(),
            color_hex: Some("#ff0000".to_string()),
            auto_prefix: Some("R".to_string()),
            auto_prefix_enabled: false,
            auto_suffix: Some("RD".to_string()),
            auto_suffix_enabled: true,
        };
        assert_eq!(info.enabled_prefix(), None);
        assert_eq!(info.enabled_suffix(), Some("RD"));
    }

    #[test]
    fn test_variant_defaults_on_deserialize() {
        let json = r#"{"sku_suffix":"-A","full_sku":"X-A","name":"A","attributes":[]}"#;
        let variant: Variant = serde_json::from_str(json).unwrap();
        assert!(variant.is_active);
        assert_eq!(variant.price, None);
    }
}
