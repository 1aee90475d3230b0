// ==========================================
// 商品导入暂存系统 - 摄取结果值类型
// ==========================================
// 职责: 文件摄取结果 / SKU 列表解析结果
// ==========================================

use crate::domain::types::Delimiter;
use serde::{Deserialize, Serialize};

// ==========================================
// 文件摄取
// ==========================================

/// 摄取请求元信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestRequest {
    /// 原始文件名（用于扩展名判断）；粘贴文本为 None
    pub file_name: Option<String>,
    /// 声明的 MIME 类型
    pub declared_mime: Option<String>,
}

impl IngestRequest {
    pub fn file(file_name: &str, declared_mime: Option<&str>) -> Self {
        Self {
            file_name: Some(file_name.to_string()),
            declared_mime: declared_mime.map(|m| m.to_string()),
        }
    }

    pub fn pasted() -> Self {
        Self::default()
    }

    /// 小写扩展名
    pub fn extension(&self) -> Option<String> {
        self.file_name.as_ref().and_then(|name| {
            std::path::Path::new(name)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase())
        })
    }

    /// 声明 MIME 的小写本体（去掉 "; charset=..." 参数）
    pub fn mime_essence(&self) -> Option<String> {
        self.declared_mime
            .as_deref()
            .and_then(|mime| mime.split(';').next())
            .map(|essence| essence.trim().to_lowercase())
            .filter(|essence| !essence.is_empty())
    }
}

/// 摄取结果（表头 + 行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestedTable {
    pub headers: Vec<String>,
    /// 每行宽度与表头一致
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
    /// Excel 为 None
    pub detected_delimiter: Option<Delimiter>,
    pub detected_encoding: String,
    /// 仅 Excel
    pub sheet_name: Option<String>,
}

impl IngestedTable {
    /// 首个数据行，作为映射界面的示例值
    pub fn sample_values(&self) -> Vec<String> {
        self.rows
            .first()
            .cloned()
            .unwrap_or_else(|| vec![String::new(); self.headers.len()])
    }
}

// ==========================================
// SKU 列表解析
// ==========================================

/// 解析出的单项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSkuItem {
    pub sku: String,
    /// 两列模式下未配对时为空字符串
    pub name: Option<String>,
    pub line_number: usize,
    /// 同批次内重复（保留，由调用方决定）
    pub is_duplicate: bool,
}

/// 行级错误（不进入 parsed_items）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuParseError {
    pub line_number: usize,
    pub value: String,
    pub message: String,
}

/// 非致命警告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuParseWarning {
    /// count_mismatch / missing_name / missing_sku
    pub kind: String,
    pub line_number: Option<usize>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkuParseStats {
    pub total_lines: usize,
    pub valid_items: usize,
    pub skipped_empty: usize,
    pub duplicates_in_batch: usize,
    pub invalid_items: usize,
    // ===== 两列模式 =====
    pub total_skus: usize,
    pub total_names: usize,
    pub paired: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkuParseResult {
    pub parsed_items: Vec<ParsedSkuItem>,
    pub errors: Vec<SkuParseError>,
    /// viewModeWarnings
    pub warnings: Vec<SkuParseWarning>,
    pub stats: SkuParseStats,
    pub detected_separator: Option<Delimiter>,
}

impl SkuParseResult {
    pub fn has_warning(&self, kind: &str) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
}
