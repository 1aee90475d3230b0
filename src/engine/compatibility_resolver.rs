// ==========================================
// 商品导入暂存系统 - 适配车型解析引擎
// ==========================================
// 职责: Original / Replacement 两个车型集合 → compatibility_data 快照
// 规则:
// - 每个 Original id 产生一条 Original 记录
// - Replacement id 若已在 Original 集合中则丢弃（Original 优先）
// - 快照字段（车型 SKU/名称、属性名）在保存时复制
// 红线: 纯计算，不访问数据库
// ==========================================

use crate::domain::compatibility::{
    CompatibilityAttribute, CompatibilityData, CompatibilityEntry, VehicleInfo,
    COMPATIBILITY_DATA_VERSION, MANUAL_SOURCE_ID, MANUAL_SOURCE_NAME,
};
use crate::domain::types::CompatibilityClass;
use crate::importer::header_normalizer::normalize_header;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

const ORIGINAL_NAMES: [&str; 2] = ["original", "oryginal"];
const REPLACEMENT_NAMES: [&str; 2] = ["replacement", "zamiennik"];

/// 按属性名推断分类（未知名称视为 Original）
pub fn classify_attribute_name(name: &str) -> CompatibilityClass {
    let normalized = normalize_header(name);
    if REPLACEMENT_NAMES.iter().any(|n| normalized.contains(n)) {
        CompatibilityClass::Replacement
    } else {
        CompatibilityClass::Original
    }
}

fn entry_class(entry: &CompatibilityEntry) -> CompatibilityClass {
    entry
        .classification
        .unwrap_or_else(|| classify_attribute_name(&entry.attribute_name))
}

// ==========================================
// 适配属性解析
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct CompatibilityAttributes {
    pub original: CompatibilityAttribute,
    pub replacement: CompatibilityAttribute,
}

impl CompatibilityAttributes {
    /// 从目录记录中按规范化名称匹配
    ///
    /// 目录缺少某一属性时使用 id=0 的占位，并记录警告
    pub fn from_catalog(attributes: &[CompatibilityAttribute]) -> Self {
        let find = |names: &[&str]| {
            attributes
                .iter()
                .find(|a| names.contains(&normalize_header(&a.name).as_str()))
                .cloned()
        };

        let original = find(&ORIGINAL_NAMES).unwrap_or_else(|| {
            tracing::warn!("目录中缺少 Original 适配属性，使用占位");
            CompatibilityAttribute {
                id: 0,
                name: "Original".to_string(),
            }
        });
        let replacement = find(&REPLACEMENT_NAMES).unwrap_or_else(|| {
            tracing::warn!("目录中缺少 Replacement 适配属性，使用占位");
            CompatibilityAttribute {
                id: 0,
                name: "Replacement".to_string(),
            }
        });

        Self {
            original,
            replacement,
        }
    }

    fn for_class(&self, class: CompatibilityClass) -> &CompatibilityAttribute {
        match class {
            CompatibilityClass::Original => &self.original,
            CompatibilityClass::Replacement => &self.replacement,
        }
    }
}

// ==========================================
// CompatibilityResolver
// ==========================================
pub struct CompatibilityResolver;

impl CompatibilityResolver {
    /// 解析两个集合为持久化快照
    ///
    /// # 参数
    /// - original_ids / replacement_ids: 车型 id（按选择顺序）
    /// - vehicles: 车型快照来源；未知 id 被跳过
    ///
    /// # 返回
    /// - 每个车型 id 至多一条记录
    pub fn resolve(
        original_ids: &[i64],
        replacement_ids: &[i64],
        vehicles: &[VehicleInfo],
        attributes: &CompatibilityAttributes,
        now: DateTime<Utc>,
    ) -> CompatibilityData {
        let mut emitted = HashSet::new();
        let mut compatibilities = Vec::new();

        let classified = original_ids
            .iter()
            .map(|id| (*id, CompatibilityClass::Original))
            .chain(
                replacement_ids
                    .iter()
                    .map(|id| (*id, CompatibilityClass::Replacement)),
            );

        for (vehicle_id, class) in classified {
            if emitted.contains(&vehicle_id) {
                continue;
            }
            let Some(vehicle) = vehicles.iter().find(|v| v.vehicle_id == vehicle_id) else {
                tracing::warn!(vehicle_id, "车型不存在，跳过");
                continue;
            };
            emitted.insert(vehicle_id);

            let attribute = attributes.for_class(class);
            compatibilities.push(CompatibilityEntry {
                vehicle_id,
                vehicle_sku: vehicle.sku.clone(),
                vehicle_name: vehicle.name.clone(),
                attribute_id: attribute.id,
                attribute_name: attribute.name.clone(),
                source_id: MANUAL_SOURCE_ID,
                source_name: MANUAL_SOURCE_NAME.to_string(),
                notes: String::new(),
                classification: Some(class),
            });
        }

        CompatibilityData {
            version: COMPATIBILITY_DATA_VERSION,
            compatibilities,
            updated_at: now,
        }
    }
}

// ==========================================
// CompatibilitySelection - 可编辑的选择集合
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompatibilitySelection {
    original_ids: Vec<i64>,
    replacement_ids: Vec<i64>,
}

impl CompatibilitySelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids(original_ids: &[i64], replacement_ids: &[i64]) -> Self {
        let mut selection = Self::new();
        for id in original_ids {
            selection.add(*id, CompatibilityClass::Original);
        }
        for id in replacement_ids {
            selection.add(*id, CompatibilityClass::Replacement);
        }
        selection
    }

    /// 由已保存的快照恢复
    pub fn load(data: &CompatibilityData) -> Self {
        let mut selection = Self::new();
        selection.copy_from(data);
        selection
    }

    pub fn original_ids(&self) -> &[i64] {
        &self.original_ids
    }

    pub fn replacement_ids(&self) -> &[i64] {
        &self.replacement_ids
    }

    fn set_mut(&mut self, class: CompatibilityClass) -> &mut Vec<i64> {
        match class {
            CompatibilityClass::Original => &mut self.original_ids,
            CompatibilityClass::Replacement => &mut self.replacement_ids,
        }
    }

    /// 加入集合
    ///
    /// # 返回
    /// - true: 新加入；false: 已存在
    pub fn add(&mut self, vehicle_id: i64, class: CompatibilityClass) -> bool {
        let set = self.set_mut(class);
        if set.contains(&vehicle_id) {
            return false;
        }
        set.push(vehicle_id);
        true
    }

    pub fn remove(&mut self, vehicle_id: i64, class: CompatibilityClass) -> bool {
        let set = self.set_mut(class);
        match set.iter().position(|id| *id == vehicle_id) {
            Some(pos) => {
                set.remove(pos);
                true
            }
            None => false,
        }
    }

    /// 切换选择状态，返回切换后的状态
    pub fn toggle(&mut self, vehicle_id: i64, class: CompatibilityClass) -> bool {
        if self.remove(vehicle_id, class) {
            false
        } else {
            self.add(vehicle_id, class)
        }
    }

    /// 合并另一商品的快照（幂等并集）
    ///
    /// # 返回
    /// - 新加入的 id 数（已选中的不重复计数）
    pub fn copy_from(&mut self, data: &CompatibilityData) -> usize {
        data.compatibilities
            .iter()
            .filter(|entry| self.add(entry.vehicle_id, entry_class(entry)))
            .count()
    }

    pub fn clear(&mut self) {
        self.original_ids.clear();
        self.replacement_ids.clear();
    }

    /// 去重后的车型 id（Original 在前）
    pub fn vehicle_ids(&self) -> Vec<i64> {
        let mut seen = HashSet::new();
        self.original_ids
            .iter()
            .chain(self.replacement_ids.iter())
            .copied()
            .filter(|id| seen.insert(*id))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.original_ids.is_empty() && self.replacement_ids.is_empty()
    }

    pub fn resolve(
        &self,
        vehicles: &[VehicleInfo],
        attributes: &CompatibilityAttributes,
        now: DateTime<Utc>,
    ) -> CompatibilityData {
        CompatibilityResolver::resolve(
            &self.original_ids,
            &self.replacement_ids,
            vehicles,
            attributes,
            now,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicles() -> Vec<VehicleInfo> {
        (1..=5)
            .map(|id| VehicleInfo {
                vehicle_id: id,
                sku: format!("V-{}", id),
                name: format!("Vehicle {}", id),
            })
            .collect()
    }

    fn attributes() -> CompatibilityAttributes {
        CompatibilityAttributes::from_catalog(&[
            CompatibilityAttribute {
                id: 11,
                name: "Oryginał".to_string(),
            },
            CompatibilityAttribute {
                id: 12,
                name: "Zamiennik".to_string(),
            },
        ])
    }

    #[test]
    fn test_original_wins_over_replacement() {
        let data =
            CompatibilityResolver::resolve(&[1, 2], &[2, 3], &vehicles(), &attributes(), Utc::now());

        assert_eq!(data.compatibilities.len(), 3);
        let two: Vec<_> = data
            .compatibilities
            .iter()
            .filter(|c| c.vehicle_id == 2)
            .collect();
        assert_eq!(two.len(), 1);
        assert_eq!(two[0].classification, Some(CompatibilityClass::Original));
        assert_eq!(two[0].attribute_id, 11);

        let three = &data.compatibilities[2];
        assert_eq!(three.vehicle_id, 3);
        assert_eq!(three.attribute_name, "Zamiennik");
        assert_eq!(three.source_id, MANUAL_SOURCE_ID);
        assert_eq!(three.source_name, "Manual");
        assert_eq!(three.notes, "");
    }

    #[test]
    fn test_unknown_vehicle_skipped() {
        let data = CompatibilityResolver::resolve(&[1, 99], &[], &vehicles(), &attributes(), Utc::now());
        assert_eq!(data.vehicle_ids(), vec![1]);
    }

    #[test]
    fn test_attribute_lookup_by_normalized_name() {
        let attrs = CompatibilityAttributes::from_catalog(&[
            CompatibilityAttribute {
                id: 3,
                name: " REPLACEMENT ".to_string(),
            },
            CompatibilityAttribute {
                id: 4,
                name: "Original".to_string(),
            },
        ]);
        assert_eq!(attrs.original.id, 4);
        assert_eq!(attrs.replacement.id, 3);

        let missing = CompatibilityAttributes::from_catalog(&[]);
        assert_eq!(missing.original.id, 0);
    }

    #[test]
    fn test_load_classifies_by_name() {
        let now = Utc::now();
        let mut data = CompatibilityResolver::resolve(&[1], &[2], &vehicles(), &attributes(), now);
        for entry in data.compatibilities.iter_mut() {
            entry.classification = None;
        }
        data.compatibilities[0].attribute_name = "Unbekannt".to_string();

        let selection = CompatibilitySelection::load(&data);
        assert_eq!(selection.original_ids(), &[1]);
        assert_eq!(selection.replacement_ids(), &[2]);
    }

    #[test]
    fn test_copy_from_is_idempotent_union() {
        let now = Utc::now();
        let source = CompatibilityResolver::resolve(&[1, 2], &[4], &vehicles(), &attributes(), now);

        let mut selection = CompatibilitySelection::from_ids(&[2], &[]);
        assert_eq!(selection.copy_from(&source), 2);
        assert_eq!(selection.original_ids(), &[2, 1]);
        assert_eq!(selection.replacement_ids(), &[4]);

        assert_eq!(selection.copy_from(&source), 0);
    }

    #[test]
    fn test_toggle_and_vehicle_ids() {
        let mut selection = CompatibilitySelection::new();
        assert!(selection.toggle(3, CompatibilityClass::Original));
        assert!(selection.toggle(3, CompatibilityClass::Replacement));
        assert!(selection.add(5, CompatibilityClass::Replacement));
        assert_eq!(selection.vehicle_ids(), vec![3, 5]);

        assert!(!selection.toggle(3, CompatibilityClass::Original));
        assert_eq!(selection.original_ids(), &[] as &[i64]);

        selection.clear();
        assert!(selection.is_empty());
    }
}
