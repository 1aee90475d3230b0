// ==========================================
// 商品导入暂存系统 - SKU 列表解析器实现
// ==========================================
// 职责: 粘贴的 SKU / 名称列表 → 规范化条目
// 模式: 单列（sku[分隔符]name）/ 纯 SKU / 两列配对
// 说明: 同批次重复 SKU 只标记与计数，不剔除
// ==========================================

use crate::domain::ingest::{
    ParsedSkuItem, SkuParseError, SkuParseResult, SkuParseStats, SkuParseWarning,
};
use crate::domain::staging_product::normalize_sku;
use crate::domain::types::{Delimiter, ListSeparator};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::staging_importer_trait::SkuListParser;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

/// SKU 允许字符（规范化为大写后校验）
static SKU_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9\-_./]+$").expect("valid regex"));

/// 纯 SKU 模式下的行内分隔
static INLINE_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s,;]+").expect("valid regex"));

/// 行内是否含多个 token
static HAS_INLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+[\s,;]+\S+").expect("valid regex"));

pub const WARNING_COUNT_MISMATCH: &str = "count_mismatch";
pub const WARNING_MISSING_NAME: &str = "missing_name";
pub const WARNING_MISSING_SKU: &str = "missing_sku";

/// 解析参数
#[derive(Debug, Clone)]
pub struct SkuParserSettings {
    pub min_length: usize,
    pub max_length: usize,
    pub sample_lines: usize,
}

impl Default for SkuParserSettings {
    fn default() -> Self {
        Self {
            min_length: 2,
            max_length: 64,
            sample_lines: 10,
        }
    }
}

/// 校验已规范化的 SKU（长度与允许字符）
pub fn validate_sku(sku: &str, min_length: usize, max_length: usize) -> Result<(), String> {
    let len = sku.chars().count();
    if len < min_length {
        return Err(format!("SKU 过短（至少 {} 个字符）", min_length));
    }
    if len > max_length {
        return Err(format!("SKU 过长（最多 {} 个字符）", max_length));
    }
    if !SKU_PATTERN.is_match(sku) {
        return Err("SKU 只能包含字母、数字以及 - _ . /".to_string());
    }
    Ok(())
}

/// 规范化换行后按行切分（保留空行，行号从 1 开始）
fn numbered_lines(text: &str) -> Vec<(usize, String)> {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim().to_string()))
        .collect()
}

/// SKU 列表分隔符自动检测
///
/// 采样行中出现总次数最多的候选；若总次数少于采样行数（平均每行不足一次），退回 tab。
pub fn detect_list_separator(lines: &[&str], sample_size: usize) -> Delimiter {
    let sample: Vec<&str> = lines.iter().copied().take(sample_size).collect();
    let mut best = Delimiter::Tab;
    let mut best_count = 0usize;
    for delimiter in Delimiter::PRIORITY {
        let count: usize = sample
            .iter()
            .map(|l| l.matches(delimiter.as_char()).count())
            .sum();
        if count > best_count {
            best = delimiter;
            best_count = count;
        }
    }

    if best_count < sample.len() {
        Delimiter::Tab
    } else {
        best
    }
}

// ==========================================
// SkuListParserImpl
// ==========================================
pub struct SkuListParserImpl {
    settings: SkuParserSettings,
}

impl Default for SkuListParserImpl {
    fn default() -> Self {
        Self::new(SkuParserSettings::default())
    }
}

/// 解析过程中的累积状态
struct Collector<'a> {
    settings: &'a SkuParserSettings,
    seen: HashSet<String>,
    result: SkuParseResult,
}

impl<'a> Collector<'a> {
    fn new(settings: &'a SkuParserSettings) -> Self {
        Self {
            settings,
            seen: HashSet::new(),
            result: SkuParseResult::default(),
        }
    }

    fn validate(&self, sku: &str) -> Result<(), String> {
        validate_sku(sku, self.settings.min_length, self.settings.max_length)
    }

    /// 校验并加入条目；无效 SKU 记入 errors
    ///
    /// # 返回
    /// - true: 已加入 parsed_items
    fn push(&mut self, raw_sku: &str, name: Option<String>, line_number: usize) -> bool {
        let sku = normalize_sku(raw_sku);
        if let Err(message) = self.validate(&sku) {
            self.result.errors.push(SkuParseError {
                line_number,
                value: raw_sku.to_string(),
                message,
            });
            return false;
        }

        let is_duplicate = !self.seen.insert(sku.clone());
        if is_duplicate {
            self.result.stats.duplicates_in_batch += 1;
        }
        self.result.parsed_items.push(ParsedSkuItem {
            sku,
            name,
            line_number,
            is_duplicate,
        });
        true
    }

    fn warn(&mut self, kind: &str, line_number: Option<usize>, message: String) {
        self.result.warnings.push(SkuParseWarning {
            kind: kind.to_string(),
            line_number,
            message,
        });
    }

    fn finish(mut self, total_lines: usize, skipped_empty: usize) -> SkuParseResult {
        self.result.stats.total_lines = total_lines;
        self.result.stats.skipped_empty = skipped_empty;
        self.result.stats.valid_items = self.result.parsed_items.len();
        self.result.stats.invalid_items = self.result.errors.len();
        self.result
    }
}

impl SkuListParserImpl {
    pub fn new(settings: SkuParserSettings) -> Self {
        Self { settings }
    }

    /// SKU 文本块 → (行号, SKU token)
    ///
    /// 采样行中若任一行含多个 token，则整块按 [\s,;]+ 切分；否则一行一个 SKU。
    fn sku_tokens(&self, lines: &[(usize, String)]) -> Vec<(usize, String)> {
        let non_empty: Vec<&(usize, String)> = lines.iter().filter(|(_, l)| !l.is_empty()).collect();
        let multi = non_empty
            .iter()
            .take(self.settings.sample_lines)
            .any(|(_, l)| HAS_INLINE.is_match(l));

        let mut tokens = Vec::new();
        for (line_number, line) in non_empty {
            if multi {
                tokens.extend(
                    INLINE_SEPARATORS
                        .split(line)
                        .filter(|t| !t.is_empty())
                        .map(|t| (*line_number, t.to_string())),
                );
            } else {
                tokens.push((*line_number, line.clone()));
            }
        }
        tokens
    }
}

impl SkuListParser for SkuListParserImpl {
    fn parse_single_column(
        &self,
        text: &str,
        separator: ListSeparator,
    ) -> ImportResult<SkuParseResult> {
        let lines = numbered_lines(text);
        let non_empty: Vec<&str> = lines
            .iter()
            .map(|(_, l)| l.as_str())
            .filter(|l| !l.is_empty())
            .collect();
        if non_empty.is_empty() {
            return Err(ImportError::EmptySkuInput);
        }

        let delimiter = separator
            .delimiter()
            .unwrap_or_else(|| detect_list_separator(&non_empty, self.settings.sample_lines));
        debug!(separator = %delimiter, "SKU 列表分隔符");

        let mut collector = Collector::new(&self.settings);
        let mut skipped_empty = 0;
        for (line_number, line) in &lines {
            if line.is_empty() {
                skipped_empty += 1;
                continue;
            }

            let mut parts = line.splitn(2, delimiter.as_char());
            let sku = parts.next().unwrap_or("").trim();
            let name = parts
                .next()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty());

            if sku.is_empty() {
                skipped_empty += 1;
                continue;
            }
            collector.push(sku, name, *line_number);
        }

        let mut result = collector.finish(lines.len(), skipped_empty);
        result.detected_separator = Some(delimiter);
        Ok(result)
    }

    fn parse_sku_only(&self, text: &str) -> ImportResult<SkuParseResult> {
        let lines = numbered_lines(text);
        let skipped_empty = lines.iter().filter(|(_, l)| l.is_empty()).count();
        let tokens = self.sku_tokens(&lines);
        if tokens.is_empty() {
            return Err(ImportError::EmptySkuInput);
        }

        let mut collector = Collector::new(&self.settings);
        for (line_number, sku) in tokens {
            collector.push(&sku, None, line_number);
        }
        Ok(collector.finish(lines.len(), skipped_empty))
    }

    fn parse_two_columns(&self, sku_text: &str, name_text: &str) -> ImportResult<SkuParseResult> {
        let sku_lines = numbered_lines(sku_text);
        let name_lines = numbered_lines(name_text);

        let skus = self.sku_tokens(&sku_lines);
        let names: Vec<String> = name_lines
            .iter()
            .filter(|(_, l)| !l.is_empty())
            .map(|(_, l)| l.clone())
            .collect();
        if skus.is_empty() && names.is_empty() {
            return Err(ImportError::EmptySkuInput);
        }

        let mut collector = Collector::new(&self.settings);
        collector.result.stats.total_skus = skus.len();
        collector.result.stats.total_names = names.len();

        if skus.len() != names.len() {
            collector.warn(
                WARNING_COUNT_MISMATCH,
                None,
                format!(
                    "SKU 数量 ({}) 与名称数量 ({}) 不一致",
                    skus.len(),
                    names.len()
                ),
            );
        }

        let max_count = skus.len().max(names.len());
        for idx in 0..max_count {
            match (skus.get(idx), names.get(idx)) {
                (Some((line_number, sku)), Some(name)) => {
                    if collector.push(sku, Some(name.clone()), *line_number) {
                        collector.result.stats.paired += 1;
                    }
                }
                (Some((line_number, sku)), None) => {
                    if collector.push(sku, Some(String::new()), *line_number) {
                        collector.warn(
                            WARNING_MISSING_NAME,
                            Some(*line_number),
                            format!("SKU {} 没有对应的名称", normalize_sku(sku)),
                        );
                    }
                }
                (None, Some(name)) => {
                    collector.warn(
                        WARNING_MISSING_SKU,
                        Some(idx + 1),
                        format!("名称 \"{}\" 没有对应的 SKU", name),
                    );
                }
                (None, None) => {}
            }
        }

        let skipped_empty = sku_lines.iter().filter(|(_, l)| l.is_empty()).count();
        Ok(collector.finish(sku_lines.len(), skipped_empty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_column_auto_semicolon() {
        let parser = SkuListParserImpl::default();
        let result = parser
            .parse_single_column("abc-1;Brake pad\n\nabc-2;Oil filter\n", ListSeparator::Auto)
            .unwrap();

        assert_eq!(result.detected_separator, Some(Delimiter::Semicolon));
        assert_eq!(result.parsed_items.len(), 2);
        assert_eq!(result.parsed_items[0].sku, "ABC-1");
        assert_eq!(result.parsed_items[0].name.as_deref(), Some("Brake pad"));
        assert_eq!(result.parsed_items[1].line_number, 3);
        assert_eq!(result.stats.skipped_empty, 1);
        assert_eq!(result.stats.total_lines, 3);
    }

    #[test]
    fn test_single_column_name_keeps_later_separators() {
        let parser = SkuListParserImpl::default();
        let result = parser
            .parse_single_column("X1|Part|with|pipes\nX2|Other\n", ListSeparator::Pipe)
            .unwrap();
        assert_eq!(result.parsed_items[0].name.as_deref(), Some("Part|with|pipes"));
    }

    #[test]
    fn test_single_column_without_separator_falls_back_to_tab() {
        let parser = SkuListParserImpl::default();
        let result = parser
            .parse_single_column("SKU-1\nSKU-2\nSKU-3", ListSeparator::Auto)
            .unwrap();
        assert_eq!(result.detected_separator, Some(Delimiter::Tab));
        assert_eq!(result.stats.valid_items, 3);
        assert!(result.parsed_items.iter().all(|i| i.name.is_none()));
    }

    #[test]
    fn test_duplicates_flagged_not_dropped() {
        let parser = SkuListParserImpl::default();
        let result = parser
            .parse_single_column("a1\nA1\n a1 \nB2", ListSeparator::Auto)
            .unwrap();

        assert_eq!(result.parsed_items.len(), 4);
        assert!(!result.parsed_items[0].is_duplicate);
        assert!(result.parsed_items[1].is_duplicate);
        assert!(result.parsed_items[2].is_duplicate);
        assert_eq!(result.stats.duplicates_in_batch, 2);
    }

    #[test]
    fn test_invalid_sku_goes_to_errors() {
        let parser = SkuListParserImpl::default();
        let result = parser
            .parse_single_column("A\nGOOD-1\nBAD SKU#\n", ListSeparator::Comma)
            .unwrap();

        assert_eq!(result.parsed_items.len(), 1);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].line_number, 1);
        assert_eq!(result.stats.invalid_items, 2);
    }

    #[test]
    fn test_sku_only_multi_separator() {
        let parser = SkuListParserImpl::default();
        let result = parser.parse_sku_only("A1, A2;A3\nA4  A5\n").unwrap();

        let skus: Vec<&str> = result.parsed_items.iter().map(|i| i.sku.as_str()).collect();
        assert_eq!(skus, vec!["A1", "A2", "A3", "A4", "A5"]);
        assert_eq!(result.parsed_items[3].line_number, 2);
    }

    #[test]
    fn test_two_columns_count_mismatch() {
        let parser = SkuListParserImpl::default();
        let result = parser
            .parse_two_columns("A1\nA2\nA3", "Widget\nGadget")
            .unwrap();

        assert_eq!(result.parsed_items.len(), 3);
        assert!(result.has_warning(WARNING_COUNT_MISMATCH));
        assert!(result.has_warning(WARNING_MISSING_NAME));
        assert!(result.errors.is_empty());
        assert_eq!(result.parsed_items[2].sku, "A3");
        assert_eq!(result.parsed_items[2].name.as_deref(), Some(""));
        assert_eq!(result.stats.paired, 2);
        assert_eq!(result.stats.total_skus, 3);
        assert_eq!(result.stats.total_names, 2);
    }

    #[test]
    fn test_two_columns_extra_names() {
        let parser = SkuListParserImpl::default();
        let result = parser.parse_two_columns("A1", "Widget\nGadget").unwrap();

        assert_eq!(result.parsed_items.len(), 1);
        assert!(result.has_warning(WARNING_MISSING_SKU));
    }

    #[test]
    fn test_empty_input_is_error() {
        let parser = SkuListParserImpl::default();
        assert!(matches!(
            parser.parse_single_column(" \n\n", ListSeparator::Auto),
            Err(ImportError::EmptySkuInput)
        ));
        assert!(matches!(
            parser.parse_two_columns("", ""),
            Err(ImportError::EmptySkuInput)
        ));
    }

    #[test]
    fn test_detect_list_separator() {
        assert_eq!(
            detect_list_separator(&["A|x", "B|y"], 10),
            Delimiter::Pipe
        );
        assert_eq!(detect_list_separator(&["A,x", "B"], 10), Delimiter::Tab);
    }
}
