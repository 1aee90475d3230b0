// ==========================================
// 商品导入暂存系统 - 列映射器实现
// ==========================================
// 职责: 源表头 → 目标字段映射建议（置信度 + 候选）
// 规则:
// - 每个表头与每个字段（显示名 + 同义词）取最高相似度
// - 低于建议阈值视为 0（无建议，留给人工映射）
// - 全局贪心分配: 分数高者优先，同分时必填字段优先，再按表头/目录顺序
// - 不强制映射: 无可用字段的表头 matched_field = None
// ==========================================

use crate::domain::ingest::IngestedTable;
use crate::domain::mapping::{
    ColumnMapping, MappedRow, MappingAlternate, MappingSuggestion, TargetField,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_catalog::DefaultFieldCatalog;
use crate::importer::header_normalizer::{normalize_header, similarity};
use crate::importer::staging_importer_trait::{ColumnMapper, TargetFieldProvider};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// 映射阈值参数
#[derive(Debug, Clone)]
pub struct MappingSettings {
    /// 达到该置信度自动应用
    pub auto_map_threshold: f64,
    /// 低于该置信度不作为建议
    pub suggestion_threshold: f64,
    /// 每个表头保留的候选数
    pub max_alternates: usize,
}

impl Default for MappingSettings {
    fn default() -> Self {
        Self {
            auto_map_threshold: 0.7,
            suggestion_threshold: 0.5,
            max_alternates: 3,
        }
    }
}

/// 单个表头对单个字段的得分
#[derive(Debug, Clone)]
struct Candidate {
    header_index: usize,
    field_index: usize,
    score: f64,
    required: bool,
}

/// 表头对字段的得分（显示名与同义词取最大）
pub fn score_field(normalized_header: &str, field: &TargetField) -> f64 {
    std::iter::once(field.label.as_str())
        .chain(field.aliases.iter().map(|a| a.as_str()))
        .map(|alias| similarity(normalized_header, &normalize_header(alias)))
        .fold(0.0, f64::max)
}

// ==========================================
// ColumnMapperImpl
// ==========================================
pub struct ColumnMapperImpl {
    provider: Box<dyn TargetFieldProvider>,
    settings: MappingSettings,
}

impl Default for ColumnMapperImpl {
    fn default() -> Self {
        Self::new(Box::new(DefaultFieldCatalog), MappingSettings::default())
    }
}

impl ColumnMapperImpl {
    pub fn new(provider: Box<dyn TargetFieldProvider>, settings: MappingSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &MappingSettings {
        &self.settings
    }

    fn candidates(&self, headers: &[String], fields: &[TargetField]) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for (header_index, header) in headers.iter().enumerate() {
            let normalized = normalize_header(header);
            if normalized.is_empty() {
                continue;
            }
            for (field_index, field) in fields.iter().enumerate() {
                let score = score_field(&normalized, field);
                if score >= self.settings.suggestion_threshold {
                    candidates.push(Candidate {
                        header_index,
                        field_index,
                        score,
                        required: field.required,
                    });
                }
            }
        }
        candidates
    }
}

/// 分数降序 → 必填优先 → 表头顺序 → 目录顺序
fn assignment_order(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.required.cmp(&a.required))
        .then_with(|| a.header_index.cmp(&b.header_index))
        .then_with(|| a.field_index.cmp(&b.field_index))
}

impl ColumnMapper for ColumnMapperImpl {
    fn suggest(&self, headers: &[String]) -> Vec<MappingSuggestion> {
        let fields = self.provider.available_fields();
        let mut candidates = self.candidates(headers, &fields);
        candidates.sort_by(assignment_order);

        // ===== 贪心分配 =====
        let mut assigned: HashMap<usize, (usize, f64)> = HashMap::new();
        let mut taken: HashSet<usize> = HashSet::new();
        for candidate in &candidates {
            if assigned.contains_key(&candidate.header_index) || taken.contains(&candidate.field_index)
            {
                continue;
            }
            assigned.insert(
                candidate.header_index,
                (candidate.field_index, candidate.score),
            );
            taken.insert(candidate.field_index);
        }

        headers
            .iter()
            .enumerate()
            .map(|(header_index, header)| {
                let matched = assigned.get(&header_index).copied();

                let mut own: Vec<&Candidate> = candidates
                    .iter()
                    .filter(|c| c.header_index == header_index)
                    .filter(|c| matched.map(|(f, _)| f != c.field_index).unwrap_or(true))
                    .collect();
                own.sort_by(|a, b| {
                    b.score
                        .partial_cmp(&a.score)
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| a.field_index.cmp(&b.field_index))
                });
                let alternates = own
                    .into_iter()
                    .take(self.settings.max_alternates)
                    .map(|c| MappingAlternate {
                        field: fields[c.field_index].key.clone(),
                        confidence: c.score,
                    })
                    .collect();

                let (matched_field, confidence) = match matched {
                    Some((field_index, score)) => (Some(fields[field_index].key.clone()), score),
                    None => (None, 0.0),
                };
                debug!(
                    header = %header,
                    matched = ?matched_field,
                    confidence,
                    "列映射建议"
                );

                MappingSuggestion {
                    source_column: header.clone(),
                    column_index: header_index,
                    auto_applied: matched_field.is_some()
                        && confidence >= self.settings.auto_map_threshold,
                    matched_field,
                    confidence,
                    alternates,
                }
            })
            .collect()
    }

    fn auto_mapping(&self, suggestions: &[MappingSuggestion]) -> ColumnMapping {
        suggestions
            .iter()
            .filter(|s| s.auto_applied)
            .filter_map(|s| s.matched_field.clone().map(|f| (s.column_index, f)))
            .collect()
    }

    fn validate_mapping(&self, mapping: &ColumnMapping) -> ImportResult<()> {
        let known: HashSet<String> = self
            .provider
            .available_fields()
            .into_iter()
            .map(|f| f.key)
            .collect();

        let mut by_field: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (column, field) in mapping {
            if !known.contains(field) {
                return Err(ImportError::UnknownTargetField(field.clone()));
            }
            by_field.entry(field.as_str()).or_default().push(*column);
        }

        if let Some((field, columns)) = by_field.iter().find(|(_, cols)| cols.len() > 1) {
            return Err(ImportError::DuplicateTargetField {
                field: field.to_string(),
                columns: columns.clone(),
            });
        }

        if !by_field.contains_key("sku") {
            return Err(ImportError::SkuColumnUnmapped);
        }
        Ok(())
    }

    fn apply_mapping(&self, table: &IngestedTable, mapping: &ColumnMapping) -> Vec<MappedRow> {
        table
            .rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let mut mapped = MappedRow::new(idx + 1);
                for (column, field) in mapping {
                    if let Some(value) = row.get(*column) {
                        mapped.fields.insert(field.clone(), value.trim().to_string());
                    }
                }
                mapped
            })
            .filter(|row| row.get("sku").is_some())
            .collect()
    }

    fn target_fields(&self) -> Vec<TargetField> {
        self.provider.available_fields()
    }
}
