// ==========================================
// 商品导入暂存系统 - 暂存商品实体
// ==========================================
// 职责: StagingProduct（导入中途的草稿商品）
// 红线: completion_status 只反映实际填充的字段，不反映用户意图
// ==========================================

use crate::domain::compatibility::CompatibilityData;
use crate::domain::types::SkipFlag;
use crate::domain::variant::VariantData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 必填区块
pub const REQUIRED_SECTIONS: [&str; 6] = [
    "sku",
    "name",
    "manufacturer",
    "category_ids",
    "product_type",
    "publication_targets",
];

/// 选填区块
pub const OPTIONAL_SECTIONS: [&str; 7] = [
    "temp_media_paths",
    "short_description",
    "long_description",
    "base_price",
    "variant_data",
    "compatibility_data",
    "feature_data",
];

// ==========================================
// JSON 列值类型
// ==========================================

/// temp_media_paths 列
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaPaths {
    #[serde(default)]
    pub images: Vec<String>,
}

/// feature_data 列
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureData {
    #[serde(default)]
    pub features: Vec<serde_json::Value>,
}

/// 价格组（净价/含税价）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceGroup {
    pub net: Option<f64>,
    pub gross: Option<f64>,
}

/// price_data 列: groups{groupId: {net, gross}}
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceData {
    #[serde(default)]
    pub groups: BTreeMap<String, PriceGroup>,
}

/// 跳过标记审计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipHistoryEntry {
    pub set_at: DateTime<Utc>,
    pub set_by: String,
    pub set_by_name: String,
}

// ==========================================
// StagingProduct - 暂存商品
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagingProduct {
    /// 数据库主键（未落库时为 0）
    pub id: i64,
    pub import_session_id: Option<i64>,

    // ===== 基础字段 =====
    /// 规范化为大写
    pub sku: String,
    pub name: Option<String>,
    pub product_type: Option<String>,
    pub manufacturer: Option<String>,
    pub supplier_id: Option<String>,
    pub importer_id: Option<String>,
    pub supplier_code: Option<String>,
    pub ean: Option<String>,

    // ===== 尺寸/价格 =====
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub width: Option<f64>,
    pub length: Option<f64>,
    pub base_price: Option<f64>,
    pub purchase_price: Option<f64>,
    pub quantity: Option<i64>,

    // ===== 描述/分类 =====
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub category: Option<String>,
    pub category_ids: Vec<i64>,
    pub publication_targets: Vec<String>,
    pub shop_categories: BTreeMap<String, Vec<i64>>,

    // ===== 车辆/替代编码 =====
    pub vin: Option<String>,
    pub engine_number: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub original_code: Option<String>,
    pub replacement_code: Option<String>,

    // ===== 派生结构 =====
    pub temp_media_paths: Option<MediaPaths>,
    pub variant_data: Option<VariantData>,
    pub compatibility_data: Option<CompatibilityData>,
    pub feature_data: Option<FeatureData>,
    pub price_data: Option<PriceData>,

    // ===== 跳过标记 =====
    pub skip_flags: BTreeSet<SkipFlag>,
    pub skip_history: BTreeMap<SkipFlag, SkipHistoryEntry>,

    pub completion_status: BTreeMap<String, bool>,

    // ===== 审计 =====
    pub imported_by: String,
    pub imported_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 规范化 SKU（去空白 + 大写）
pub fn normalize_sku(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn text_present(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

impl StagingProduct {
    /// 创建仅含 SKU 的空草稿
    pub fn new(sku: &str, imported_by: &str, now: DateTime<Utc>) -> Self {
        let mut product = Self {
            id: 0,
            import_session_id: None,
            sku: normalize_sku(sku),
            name: None,
            product_type: None,
            manufacturer: None,
            supplier_id: None,
            importer_id: None,
            supplier_code: None,
            ean: None,
            weight: None,
            height: None,
            width: None,
            length: None,
            base_price: None,
            purchase_price: None,
            quantity: None,
            short_description: None,
            long_description: None,
            category: None,
            category_ids: Vec::new(),
            publication_targets: Vec::new(),
            shop_categories: BTreeMap::new(),
            vin: None,
            engine_number: None,
            model: None,
            year: None,
            original_code: None,
            replacement_code: None,
            temp_media_paths: None,
            variant_data: None,
            compatibility_data: None,
            feature_data: None,
            price_data: None,
            skip_flags: BTreeSet::new(),
            skip_history: BTreeMap::new(),
            completion_status: BTreeMap::new(),
            imported_by: imported_by.to_string(),
            imported_at: now,
            updated_at: now,
        };
        product.recalculate_completion_status();
        product
    }

    /// 区块是否已实际填充
    ///
    /// 嵌套结构需要内部列表非空
    pub fn is_section_complete(&self, section: &str) -> bool {
        match section {
            "sku" => !self.sku.trim().is_empty(),
            "name" => text_present(&self.name),
            "manufacturer" => text_present(&self.manufacturer),
            "product_type" => text_present(&self.product_type),
            "category_ids" => !self.category_ids.is_empty(),
            "publication_targets" => !self.publication_targets.is_empty(),
            "temp_media_paths" => self
                .temp_media_paths
                .as_ref()
                .map(|m| !m.images.is_empty())
                .unwrap_or(false),
            "short_description" => text_present(&self.short_description),
            "long_description" => text_present(&self.long_description),
            "base_price" => self.base_price.is_some(),
            "variant_data" => self
                .variant_data
                .as_ref()
                .map(|v| !v.is_empty())
                .unwrap_or(false),
            "compatibility_data" => self
                .compatibility_data
                .as_ref()
                .map(|c| !c.is_empty())
                .unwrap_or(false),
            "feature_data" => self
                .feature_data
                .as_ref()
                .map(|f| !f.features.is_empty())
                .unwrap_or(false),
            "price_data" => self
                .price_data
                .as_ref()
                .map(|p| !p.groups.is_empty())
                .unwrap_or(false),
            _ => false,
        }
    }

    /// 重算 completion_status（跳过标记不计入）
    pub fn recalculate_completion_status(&mut self) {
        let mut status = BTreeMap::new();
        for section in REQUIRED_SECTIONS.iter().chain(OPTIONAL_SECTIONS.iter()) {
            status.insert(section.to_string(), self.is_section_complete(section));
        }
        self.completion_status = status;
    }

    /// 缺失的必填区块
    pub fn missing_required_sections(&self) -> Vec<&'static str> {
        REQUIRED_SECTIONS
            .iter()
            .copied()
            .filter(|s| !self.is_section_complete(s))
            .collect()
    }

    pub fn is_skipped(&self, flag: SkipFlag) -> bool {
        self.skip_flags.contains(&flag)
    }

    /// 设置/清除跳过标记并记录审计
    ///
    /// # 返回
    /// - true: 标记状态发生变化
    pub fn set_skip_flag(
        &mut self,
        flag: SkipFlag,
        value: bool,
        actor_id: &str,
        actor_name: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let changed = if value {
            self.skip_flags.insert(flag)
        } else {
            self.skip_flags.remove(&flag)
        };

        if value {
            self.skip_history.insert(
                flag,
                SkipHistoryEntry {
                    set_at: now,
                    set_by: actor_id.to_string(),
                    set_by_name: actor_name.to_string(),
                },
            );
        } else {
            self.skip_history.remove(&flag);
        }

        self.updated_at = now;
        self.recalculate_completion_status();
        changed
    }
}
