// ==========================================
// 商品导入暂存系统 - 变体生成引擎
// ==========================================
// 职责: 选中属性值的笛卡尔积 → 变体 SKU / 名称
// 规则:
// - 维度顺序 = 选择顺序；空维度被排除，不会使结果归零
// - 名称只由属性值标签组成（不含商品名）
// - 不同组合产生相同 SKU 时不去重
// 红线: 纯计算，不访问数据库
// ==========================================

use crate::domain::types::SkuMode;
use crate::domain::variant::{
    AttributeValueInfo, Variant, VariantAttribute, VariantData, VARIANT_DATA_VERSION,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 缺少商品 SKU 时的占位
pub const FALLBACK_BASE_SKU: &str = "PRODUCT";

/// 手动模式下的属性值代码长度
const MANUAL_CODE_LENGTH: usize = 3;

// ==========================================
// 生成配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantConfig {
    pub sku_mode: SkuMode,
    pub separator: String,
    /// true: 使用属性值上配置的 auto_prefix / auto_suffix
    pub use_db_suffix_prefix: bool,
}

impl Default for VariantConfig {
    fn default() -> Self {
        Self {
            sku_mode: SkuMode::Suffix,
            separator: "-".to_string(),
            use_db_suffix_prefix: true,
        }
    }
}

/// 一个属性类型维度的选择（值按选择顺序）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionSelection {
    pub attribute_type_id: i64,
    pub value_ids: Vec<i64>,
}

impl DimensionSelection {
    pub fn new(attribute_type_id: i64, value_ids: Vec<i64>) -> Self {
        Self {
            attribute_type_id,
            value_ids,
        }
    }
}

/// 手动模式代码: 标签前 3 个字符大写
pub fn manual_code(label: &str) -> String {
    label
        .trim()
        .chars()
        .take(MANUAL_CODE_LENGTH)
        .collect::<String>()
        .to_uppercase()
}

// ==========================================
// VariantGenerator
// ==========================================
pub struct VariantGenerator;

impl VariantGenerator {
    /// 按选择解析维度
    ///
    /// - 同一属性类型出现多次时只保留第一次
    /// - 未知值 id、类型不符的值、重复值被忽略
    /// - 解析后为空的维度被排除
    pub fn resolve_dimensions(
        selection: &[DimensionSelection],
        values: &[AttributeValueInfo],
    ) -> Vec<Vec<AttributeValueInfo>> {
        let mut seen_types = HashSet::new();
        let mut dimensions = Vec::new();

        for dimension in selection {
            if !seen_types.insert(dimension.attribute_type_id) {
                continue;
            }
            let mut seen_values = HashSet::new();
            let resolved: Vec<AttributeValueInfo> = dimension
                .value_ids
                .iter()
                .filter(|id| seen_values.insert(**id))
                .filter_map(|id| {
                    values.iter().find(|v| {
                        v.value_id == *id && v.attribute_type_id == dimension.attribute_type_id
                    })
                })
                .cloned()
                .collect();

            if !resolved.is_empty() {
                dimensions.push(resolved);
            }
        }
        dimensions
    }

    /// 笛卡尔积（首个维度变化最慢）
    pub fn cartesian_product<T: Clone>(dimensions: &[Vec<T>]) -> Vec<Vec<T>> {
        let non_empty: Vec<&Vec<T>> = dimensions.iter().filter(|d| !d.is_empty()).collect();
        if non_empty.is_empty() {
            return Vec::new();
        }

        let mut result: Vec<Vec<T>> = vec![Vec::new()];
        for dimension in non_empty {
            let mut next = Vec::with_capacity(result.len() * dimension.len());
            for prefix in &result {
                for item in dimension {
                    let mut combo = prefix.clone();
                    combo.push(item.clone());
                    next.push(combo);
                }
            }
            result = next;
        }
        result
    }

    /// 由一个组合组装变体
    pub fn build_variant(base_sku: &str, combo: &[AttributeValueInfo], config: &VariantConfig) -> Variant {
        let sep = config.separator.as_str();
        let name = combo
            .iter()
            .map(|v| v.label.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let (sku_suffix, full_sku) = if config.use_db_suffix_prefix {
            let prefix: String = combo.iter().filter_map(|v| v.enabled_prefix()).collect();
            let suffix: String = combo.iter().filter_map(|v| v.enabled_suffix()).collect();

            let mut full = String::new();
            if !prefix.is_empty() {
                full.push_str(&prefix);
                full.push_str(sep);
            }
            full.push_str(base_sku);
            if !suffix.is_empty() {
                full.push_str(sep);
                full.push_str(&suffix);
            }

            let sku_suffix = if !suffix.is_empty() {
                format!("{}{}", sep, suffix)
            } else if !prefix.is_empty() {
                format!("{}{}", sep, prefix)
            } else {
                String::new()
            };
            (sku_suffix, full)
        } else {
            let codes: Vec<String> = combo.iter().map(|v| manual_code(&v.label)).collect();
            let joined = codes.join(sep);
            match config.sku_mode {
                SkuMode::Suffix => {
                    let sku_suffix = format!("{}{}", sep, joined);
                    let full = format!("{}{}", base_sku, sku_suffix);
                    (sku_suffix, full)
                }
                SkuMode::Prefix => {
                    let sku_suffix = format!("{}{}", joined, sep);
                    let full = format!("{}{}", sku_suffix, base_sku);
                    (sku_suffix, full)
                }
            }
        };

        Variant {
            sku_suffix,
            full_sku,
            name,
            attributes: combo.iter().map(VariantAttribute::from).collect(),
            price: None,
            is_active: true,
        }
    }

    /// 生成全部变体
    ///
    /// # 返回
    /// - 变体数 = 各非空维度取值数之积；无非空维度时为空
    pub fn generate(
        base_sku: &str,
        dimensions: &[Vec<AttributeValueInfo>],
        config: &VariantConfig,
    ) -> Vec<Variant> {
        let base = if base_sku.trim().is_empty() {
            FALLBACK_BASE_SKU
        } else {
            base_sku.trim()
        };
        Self::cartesian_product(dimensions)
            .iter()
            .map(|combo| Self::build_variant(base, combo, config))
            .collect()
    }
}

// ==========================================
// VariantSelection - 可编辑的变体状态
// ==========================================
// 生成后可逐个启用/停用、改价、删除；保存前把跟踪数组同步回变体列表
#[derive(Debug, Clone, PartialEq)]
pub struct VariantSelection {
    pub dimensions: Vec<DimensionSelection>,
    pub config: VariantConfig,
    variants: Vec<Variant>,
    prices: Vec<Option<f64>>,
    active_states: Vec<bool>,
}

impl VariantSelection {
    pub fn new(config: VariantConfig) -> Self {
        Self {
            dimensions: Vec::new(),
            config,
            variants: Vec::new(),
            prices: Vec::new(),
            active_states: Vec::new(),
        }
    }

    /// 选择/取消属性类型（取消时移除其全部取值；已生成的变体作废）
    pub fn toggle_attribute_type(&mut self, attribute_type_id: i64) {
        if let Some(pos) = self
            .dimensions
            .iter()
            .position(|d| d.attribute_type_id == attribute_type_id)
        {
            self.dimensions.remove(pos);
        } else {
            self.dimensions
                .push(DimensionSelection::new(attribute_type_id, Vec::new()));
        }
        self.reset_generated();
    }

    /// 选择/取消属性值（类型未选时自动选中；已生成的变体作废）
    pub fn toggle_value(&mut self, attribute_type_id: i64, value_id: i64) {
        let pos = match self
            .dimensions
            .iter()
            .position(|d| d.attribute_type_id == attribute_type_id)
        {
            Some(pos) => pos,
            None => {
                self.dimensions
                    .push(DimensionSelection::new(attribute_type_id, Vec::new()));
                self.dimensions.len() - 1
            }
        };

        let values = &mut self.dimensions[pos].value_ids;
        if let Some(idx) = values.iter().position(|v| *v == value_id) {
            values.remove(idx);
        } else {
            values.push(value_id);
        }
        self.reset_generated();
    }

    /// 所有被引用的属性值 id（用于查询元数据）
    pub fn selected_value_ids(&self) -> Vec<i64> {
        self.dimensions
            .iter()
            .flat_map(|d| d.value_ids.iter().copied())
            .collect()
    }

    /// 生成变体并重置跟踪数组
    ///
    /// # 返回
    /// - 生成的变体数
    pub fn generate(&mut self, base_sku: &str, values: &[AttributeValueInfo]) -> usize {
        let dimensions = VariantGenerator::resolve_dimensions(&self.dimensions, values);
        self.variants = VariantGenerator::generate(base_sku, &dimensions, &self.config);
        self.prices = self.variants.iter().map(|v| v.price).collect();
        self.active_states = self.variants.iter().map(|v| v.is_active).collect();
        self.variants.len()
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// 删除变体并重排跟踪数组
    pub fn remove_variant(&mut self, index: usize) -> bool {
        if index >= self.variants.len() {
            return false;
        }
        self.variants.remove(index);
        if index < self.prices.len() {
            self.prices.remove(index);
        }
        if index < self.active_states.len() {
            self.active_states.remove(index);
        }
        true
    }

    /// 切换启用状态
    ///
    /// # 返回
    /// - Some(新状态) / None（下标越界）
    pub fn toggle_active(&mut self, index: usize) -> Option<bool> {
        let state = self.active_states.get_mut(index)?;
        *state = !*state;
        let value = *state;
        if let Some(variant) = self.variants.get_mut(index) {
            variant.is_active = value;
        }
        Some(value)
    }

    /// 设置价格覆盖（None 表示沿用商品价格）
    pub fn set_price(&mut self, index: usize, price: Option<f64>) -> bool {
        match self.prices.get_mut(index) {
            Some(slot) => {
                *slot = price.filter(|p| p.is_finite());
                if let Some(variant) = self.variants.get_mut(index) {
                    variant.price = *slot;
                }
                true
            }
            None => false,
        }
    }

    /// 使用某属性值的变体数
    pub fn value_usage_count(&self, attribute_type_id: i64, value_id: i64) -> usize {
        self.variants
            .iter()
            .filter(|v| v.uses_value(attribute_type_id, value_id))
            .count()
    }

    /// 清空选择与变体
    pub fn clear(&mut self) {
        self.dimensions.iter_mut().for_each(|d| d.value_ids.clear());
        self.reset_generated();
    }

    fn reset_generated(&mut self) {
        self.variants.clear();
        self.prices.clear();
        self.active_states.clear();
    }

    /// 同步跟踪数组后导出持久化结构
    pub fn to_variant_data(&mut self, now: DateTime<Utc>) -> VariantData {
        for (index, variant) in self.variants.iter_mut().enumerate() {
            variant.price = self.prices.get(index).copied().flatten();
            variant.is_active = self.active_states.get(index).copied().unwrap_or(true);
        }

        VariantData {
            version: VARIANT_DATA_VERSION,
            variants: self.variants.clone(),
            attribute_types_used: self.dimensions.iter().map(|d| d.attribute_type_id).collect(),
            sku_mode: self.config.sku_mode,
            sku_separator: self.config.separator.clone(),
            use_db_suffix_prefix: self.config.use_db_suffix_prefix,
            generated_at: now,
        }
    }

    /// 由已保存的数据恢复选择状态、变体与跟踪数组
    pub fn from_variant_data(data: &VariantData) -> Self {
        let mut dimensions: Vec<DimensionSelection> = data
            .attribute_types_used
            .iter()
            .map(|type_id| DimensionSelection::new(*type_id, Vec::new()))
            .collect();

        for variant in &data.variants {
            for attr in &variant.attributes {
                let pos = match dimensions
                    .iter()
                    .position(|d| d.attribute_type_id == attr.attribute_type_id)
                {
                    Some(pos) => pos,
                    None => {
                        dimensions.push(DimensionSelection::new(attr.attribute_type_id, Vec::new()));
                        dimensions.len() - 1
                    }
                };
                let values = &mut dimensions[pos].value_ids;
                if !values.contains(&attr.value_id) {
                    values.push(attr.value_id);
                }
            }
        }

        Self {
            dimensions,
            config: VariantConfig {
                sku_mode: data.sku_mode,
                separator: data.sku_separator.clone(),
                use_db_suffix_prefix: data.use_db_suffix_prefix,
            },
            variants: data.variants.clone(),
            prices: data.variants.iter().map(|v| v.price).collect(),
            active_states: data.variants.iter().map(|v| v.is_active).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(type_id: i64, value_id: i64, label: &str) -> AttributeValueInfo {
        AttributeValueInfo {
            value_id,
            attribute_type_id: type_id,
            attribute_type_name: format!("type-{}", type_id),
            attribute_type_code: format!("t{}", type_id),
            label: label.to_string(),
            color_hex: None,
            auto_prefix: None,
            auto_prefix_enabled: false,
            auto_suffix: None,
            auto_suffix_enabled: false,
        }
    }

    fn with_suffix(mut v: AttributeValueInfo, token: &str, enabled: bool) -> AttributeValueInfo {
        v.auto_suffix = Some(token.to_string());
        v.auto_suffix_enabled = enabled;
        v
    }

    fn with_prefix(mut v: AttributeValueInfo, token: &str, enabled: bool) -> AttributeValueInfo {
        v.auto_prefix = Some(token.to_string());
        v.auto_prefix_enabled = enabled;
        v
    }

    fn colors_and_sizes() -> Vec<AttributeValueInfo> {
        vec![
            value(1, 10, "Red"),
            value(1, 11, "Blue"),
            value(2, 20, "Small"),
            value(2, 21, "Medium"),
            value(2, 22, "Large"),
        ]
    }

    fn manual(mode: SkuMode) -> VariantConfig {
        VariantConfig {
            sku_mode: mode,
            separator: "-".to_string(),
            use_db_suffix_prefix: false,
        }
    }

    #[test]
    fn test_two_by_three_yields_six() {
        let values = colors_and_sizes();
        let selection = vec![
            DimensionSelection::new(1, vec![10, 11]),
            DimensionSelection::new(2, vec![20, 21, 22]),
        ];
        let dims = VariantGenerator::resolve_dimensions(&selection, &values);
        let variants = VariantGenerator::generate("BASE", &dims, &manual(SkuMode::Suffix));

        assert_eq!(variants.len(), 6);
        assert_eq!(variants[0].name, "Red, Small");
        assert_eq!(variants[0].full_sku, "BASE-RED-SMA");
        assert_eq!(variants[0].sku_suffix, "-RED-SMA");
        assert_eq!(variants[5].name, "Blue, Large");
        assert!(variants.iter().all(|v| v.has_distinct_dimensions()));
    }

    #[test]
    fn test_empty_dimension_is_excluded() {
        let values = colors_and_sizes();
        let selection = vec![
            DimensionSelection::new(1, vec![10, 11]),
            DimensionSelection::new(2, vec![]),
        ];
        let dims = VariantGenerator::resolve_dimensions(&selection, &values);
        assert_eq!(dims.len(), 1);
        assert_eq!(
            VariantGenerator::generate("B", &dims, &VariantConfig::default()).len(),
            2
        );

        let none = VariantGenerator::resolve_dimensions(&[DimensionSelection::new(1, vec![])], &values);
        assert!(VariantGenerator::generate("B", &none, &VariantConfig::default()).is_empty());
    }

    #[test]
    fn test_manual_prefix_mode() {
        let combo = vec![value(1, 10, "Red"), value(2, 22, "xl")];
        let variant = VariantGenerator::build_variant("BASE", &combo, &manual(SkuMode::Prefix));
        assert_eq!(variant.sku_suffix, "RED-XL-");
        assert_eq!(variant.full_sku, "RED-XL-BASE");
    }

    #[test]
    fn test_db_tokens_only_enabled() {
        let combo = vec![
            with_prefix(with_suffix(value(1, 10, "Red"), "R", true), "PRE", false),
            with_suffix(value(2, 20, "Small"), "S", true),
        ];
        let variant = VariantGenerator::build_variant("BASE", &combo, &VariantConfig::default());
        assert_eq!(variant.full_sku, "BASE-RS");
        assert_eq!(variant.sku_suffix, "-RS");

        let prefixed = vec![with_prefix(value(1, 10, "Red"), "X", true)];
        let variant = VariantGenerator::build_variant("BASE", &prefixed, &VariantConfig::default());
        assert_eq!(variant.full_sku, "X-BASE");
        assert_eq!(variant.sku_suffix, "-X");

        let bare = vec![value(1, 10, "Red")];
        let variant = VariantGenerator::build_variant("BASE", &bare, &VariantConfig::default());
        assert_eq!(variant.full_sku, "BASE");
        assert_eq!(variant.sku_suffix, "");
    }

    #[test]
    fn test_collisions_are_not_deduplicated() {
        let values = vec![value(1, 10, "Redwood"), value(1, 11, "Red")];
        let dims =
            VariantGenerator::resolve_dimensions(&[DimensionSelection::new(1, vec![10, 11])], &values);
        let variants = VariantGenerator::generate("B", &dims, &manual(SkuMode::Suffix));
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].full_sku, variants[1].full_sku);
    }

    #[test]
    fn test_duplicate_type_keeps_first() {
        let values = colors_and_sizes();
        let selection = vec![
            DimensionSelection::new(1, vec![10]),
            DimensionSelection::new(1, vec![11]),
        ];
        let dims = VariantGenerator::resolve_dimensions(&selection, &values);
        assert_eq!(dims.len(), 1);
        assert_eq!(dims[0][0].value_id, 10);
    }

    #[test]
    fn test_selection_editing_and_sync() {
        let values = colors_and_sizes();
        let mut selection = VariantSelection::new(manual(SkuMode::Suffix));
        selection.toggle_value(1, 10);
        selection.toggle_value(1, 11);
        selection.toggle_value(2, 20);
        assert_eq!(selection.generate("BASE", &values), 2);

        assert_eq!(selection.toggle_active(1), Some(false));
        assert!(selection.set_price(0, Some(19.99)));
        assert_eq!(selection.value_usage_count(2, 20), 2);

        assert!(selection.remove_variant(0));
        assert_eq!(selection.variants().len(), 1);
        assert_eq!(selection.toggle_active(5), None);

        let data = selection.to_variant_data(Utc::now());
        assert_eq!(data.variants.len(), 1);
        assert!(!data.variants[0].is_active);
        assert_eq!(data.variants[0].price, None);
        assert_eq!(data.attribute_types_used, vec![1, 2]);

        // 修改选择会作废已生成的变体
        selection.toggle_value(2, 21);
        assert!(selection.variants().is_empty());
    }

    #[test]
    fn test_round_trip_through_json() {
        let values = colors_and_sizes();
        let mut selection = VariantSelection::new(manual(SkuMode::Suffix));
        selection.toggle_value(1, 11);
        selection.toggle_value(1, 10);
        selection.toggle_value(2, 21);
        selection.toggle_value(2, 22);
        selection.generate("SKU-1", &values);
        selection.set_price(2, Some(5.5));
        selection.toggle_active(3);

        let now = Utc::now();
        let data = selection.to_variant_data(now);
        let json = serde_json::to_string(&data).unwrap();
        let reloaded: VariantData = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, data);

        let mut restored = VariantSelection::from_variant_data(&reloaded);
        assert_eq!(restored.dimensions, selection.dimensions);
        assert_eq!(restored.config, selection.config);
        assert_eq!(restored.to_variant_data(now), data);
    }
}
