// ==========================================
// 商品导入暂存系统 - 文件摄取器实现
// ==========================================
// 职责: 原始字节/粘贴文本 → 表头 + 行
// 支持: CSV/TXT（分隔符自动检测）/ Excel (.xlsx/.xls)
// 编码: BOM → UTF-8 → chardetng 猜测
// ==========================================

use crate::domain::ingest::{IngestRequest, IngestedTable};
use crate::domain::types::Delimiter;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::staging_importer_trait::FileIngestor;
use calamine::{open_workbook_auto_from_rs, Reader};
use chardetng::EncodingDetector;
use csv::{ReaderBuilder, Trim};
use encoding_rs::Encoding;
use std::io::Cursor;
use tracing::{debug, info, warn};

/// 允许的扩展名
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["csv", "txt", "xlsx", "xls"];

/// 允许的声明 MIME 类型
pub const ALLOWED_MIME_TYPES: [&str; 6] = [
    "text/csv",
    "text/plain",
    "application/csv",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/octet-stream",
];

/// 默认文件大小上限（50MB）
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// 默认分隔符采样行数
pub const DEFAULT_SAMPLE_LINES: usize = 10;

// ==========================================
// 公共校验
// ==========================================

/// 校验大小与声明的 MIME 类型
fn check_request(content: &[u8], request: &IngestRequest, max_size: u64) -> ImportResult<()> {
    let size = content.len() as u64;
    if size > max_size {
        return Err(ImportError::FileTooLarge {
            size,
            limit: max_size,
        });
    }

    if let Some(mime) = &request.declared_mime {
        let essence = request.mime_essence().unwrap_or_default();
        if !ALLOWED_MIME_TYPES.contains(&essence.as_str()) {
            return Err(ImportError::UnsupportedMimeType(mime.clone()));
        }
    }

    if let Some(ext) = request.extension() {
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }
    }

    Ok(())
}

// ==========================================
// 编码检测
// ==========================================

/// 解码原始字节
///
/// # 返回
/// - (文本, 编码名称)；UTF-8 BOM 报告为 "UTF-8-BOM"
pub fn decode_text(bytes: &[u8]) -> ImportResult<(String, String)> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (decoded, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        if had_errors {
            return Err(ImportError::EncodingError(format!(
                "{} 解码存在非法字节",
                encoding.name()
            )));
        }
        let name = if encoding == encoding_rs::UTF_8 {
            "UTF-8-BOM".to_string()
        } else {
            encoding.name().to_string()
        };
        return Ok((decoded.into_owned(), name));
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return reject_binary(text.to_string(), "UTF-8".to_string());
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!(encoding = encoding.name(), "编码猜测后解码仍有错误");
        return Err(ImportError::EncodingError(format!(
            "猜测编码 {} 无法完整解码",
            encoding.name()
        )));
    }
    debug!(encoding = encoding.name(), "非 UTF-8 内容，使用猜测编码");
    reject_binary(decoded.into_owned(), encoding.name().to_string())
}

/// 含 NUL 字符视为二进制内容
fn reject_binary(text: String, encoding: String) -> ImportResult<(String, String)> {
    if text.contains('\u{0}') {
        return Err(ImportError::EncodingError("内容为二进制数据".to_string()));
    }
    Ok((text, encoding))
}

// ==========================================
// 分隔符检测
// ==========================================

/// 统计引号外的分隔符出现次数
fn count_outside_quotes(line: &str, ch: char) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == ch && !in_quotes {
            count += 1;
        }
    }
    count
}

/// 检测分隔符
///
/// 对每个候选统计采样行的出现次数，取出现最多的非零次数（众数），
/// 得分 = 次数等于众数的行占比；得分最高者胜出，同分按 tab > ; > , > | 优先。
///
/// # 返回
/// - None: 所有候选均未出现（单列数据）
pub fn detect_delimiter(lines: &[&str], sample_size: usize) -> Option<Delimiter> {
    let sample: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|l| !l.trim().is_empty())
        .take(sample_size.max(1))
        .collect();
    if sample.is_empty() {
        return None;
    }

    let mut best: Option<(Delimiter, f64)> = None;
    for delimiter in Delimiter::PRIORITY {
        let counts: Vec<usize> = sample
            .iter()
            .map(|l| count_outside_quotes(l, delimiter.as_char()))
            .collect();

        // 非零次数的众数（同频取较大次数）
        let mut frequency: std::collections::BTreeMap<usize, usize> = Default::default();
        for &c in counts.iter().filter(|&&c| c > 0) {
            *frequency.entry(c).or_insert(0) += 1;
        }
        let modal = match frequency.iter().max_by_key(|(count, freq)| (**freq, **count)) {
            Some((count, _)) => *count,
            None => continue,
        };

        let consistent = counts.iter().filter(|&&c| c == modal).count();
        let score = consistent as f64 / sample.len() as f64;
        debug!(delimiter = %delimiter, modal, score, "分隔符候选得分");

        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((delimiter, score)),
        }
    }

    best.map(|(d, _)| d)
}

/// 规范化换行并切分（保留空行，由调用方过滤）
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect()
}

// ==========================================
// 表格规整
// ==========================================

/// 表头: 去掉尾部空列，中间空列命名为 column_<n>
fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut headers = raw;
    while headers.last().map(|h| h.trim().is_empty()).unwrap_or(false) {
        headers.pop();
    }
    headers
        .into_iter()
        .enumerate()
        .map(|(idx, h)| {
            let trimmed = h.trim();
            if trimmed.is_empty() {
                format!("column_{}", idx + 1)
            } else {
                trimmed.to_string()
            }
        })
        .collect()
}

/// 数据行: 补齐/截断到表头宽度；全空行返回 None
fn normalize_row(raw: Vec<String>, width: usize) -> Option<Vec<String>> {
    let mut row: Vec<String> = raw.into_iter().map(|v| v.trim().to_string()).collect();
    row.resize(width, String::new());
    if row.iter().all(|v| v.is_empty()) {
        None
    } else {
        Some(row)
    }
}

// ==========================================
// DelimitedTextIngestor - CSV/TXT/粘贴文本
// ==========================================
pub struct DelimitedTextIngestor {
    pub max_file_size: u64,
    pub sample_lines: usize,
}

impl Default for DelimitedTextIngestor {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            sample_lines: DEFAULT_SAMPLE_LINES,
        }
    }
}

impl DelimitedTextIngestor {
    pub fn new(max_file_size: u64, sample_lines: usize) -> Self {
        Self {
            max_file_size,
            sample_lines,
        }
    }

    /// 解析已解码文本
    pub fn parse_text(&self, text: &str, encoding: &str) -> ImportResult<IngestedTable> {
        let text = text.trim_start_matches('\u{feff}');
        let lines = split_lines(text);
        if lines.iter().all(|l| l.trim().is_empty()) {
            return Err(ImportError::EmptyContent("没有可解析的数据".to_string()));
        }

        let delimiter = detect_delimiter(&lines, self.sample_lines).unwrap_or(Delimiter::Comma);
        debug!(delimiter = %delimiter, "分隔符检测完成");

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .trim(Trim::All)
            .delimiter(delimiter.as_byte())
            .from_reader(text.as_bytes());

        let mut headers: Option<Vec<String>> = None;
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let values: Vec<String> = record.iter().map(|v| v.to_string()).collect();

            match &headers {
                None => {
                    if values.iter().all(|v| v.trim().is_empty()) {
                        continue;
                    }
                    headers = Some(normalize_headers(values));
                }
                Some(h) => {
                    if let Some(row) = normalize_row(values, h.len()) {
                        rows.push(row);
                    }
                }
            }
        }

        let headers = match headers {
            Some(h) if !h.is_empty() => h,
            _ => return Err(ImportError::EmptyContent("未检测到表头".to_string())),
        };
        if rows.is_empty() {
            return Err(ImportError::EmptyContent(
                "只有表头，没有数据行".to_string(),
            ));
        }

        Ok(IngestedTable {
            total_rows: rows.len(),
            headers,
            rows,
            detected_delimiter: Some(delimiter),
            detected_encoding: encoding.to_string(),
            sheet_name: None,
        })
    }
}

impl FileIngestor for DelimitedTextIngestor {
    fn ingest(&self, content: &[u8], request: &IngestRequest) -> ImportResult<IngestedTable> {
        check_request(content, request, self.max_file_size)?;
        if content.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(ImportError::EmptyContent("内容为空".to_string()));
        }

        let (text, encoding) = decode_text(content)?;
        self.parse_text(&text, &encoding)
    }
}

// ==========================================
// ExcelIngestor - 首个工作表
// ==========================================
pub struct ExcelIngestor {
    pub max_file_size: u64,
}

impl Default for ExcelIngestor {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl FileIngestor for ExcelIngestor {
    fn ingest(&self, content: &[u8], request: &IngestRequest) -> ImportResult<IngestedTable> {
        check_request(content, request, self.max_file_size)?;
        if content.is_empty() {
            return Err(ImportError::EmptyContent("Excel 文件为空".to_string()));
        }

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(content.to_vec()))?;

        // 读取第一个 sheet
        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        let mut rows_iter = range
            .rows()
            .map(|r| r.iter().map(|cell| cell.to_string()).collect::<Vec<String>>())
            .skip_while(|r| r.iter().all(|v| v.trim().is_empty()));

        let headers = rows_iter
            .next()
            .map(normalize_headers)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ImportError::EmptyContent("Excel 工作表无数据".to_string()))?;

        let rows: Vec<Vec<String>> = rows_iter
            .filter_map(|r| normalize_row(r, headers.len()))
            .collect();
        if rows.is_empty() {
            return Err(ImportError::EmptyContent(
                "Excel 工作表只有表头，没有数据行".to_string(),
            ));
        }

        Ok(IngestedTable {
            total_rows: rows.len(),
            headers,
            rows,
            detected_delimiter: None,
            detected_encoding: "binary".to_string(),
            sheet_name: Some(sheet_name),
        })
    }
}

/// 声明为 Excel 的 MIME 类型
const EXCEL_MIME_TYPES: [&str; 2] = [
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

/// 解析器类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IngestKind {
    Text,
    Excel,
}

/// 选择解析器
///
/// 扩展名优先；无扩展名时按声明的 MIME 判断，都没有时按文本处理
fn resolve_kind(request: &IngestRequest) -> ImportResult<IngestKind> {
    match request.extension().as_deref() {
        Some("xlsx") | Some("xls") => Ok(IngestKind::Excel),
        Some("csv") | Some("txt") => Ok(IngestKind::Text),
        Some(ext) => Err(ImportError::UnsupportedFormat(ext.to_string())),
        None => match request.mime_essence() {
            Some(essence) if EXCEL_MIME_TYPES.contains(&essence.as_str()) => {
                Ok(IngestKind::Excel)
            }
            _ => Ok(IngestKind::Text),
        },
    }
}

// ==========================================
// 通用摄取器（根据扩展名/声明类型自动选择）
// ==========================================
pub struct UniversalFileIngestor {
    text: DelimitedTextIngestor,
    excel: ExcelIngestor,
}

impl Default for UniversalFileIngestor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE, DEFAULT_SAMPLE_LINES)
    }
}

impl UniversalFileIngestor {
    pub fn new(max_file_size: u64, sample_lines: usize) -> Self {
        Self {
            text: DelimitedTextIngestor::new(max_file_size, sample_lines),
            excel: ExcelIngestor { max_file_size },
        }
    }

    /// 粘贴的 CSV 文本
    pub fn ingest_text(&self, text: &str) -> ImportResult<IngestedTable> {
        if text.trim().is_empty() {
            return Err(ImportError::EmptyContent("粘贴内容为空".to_string()));
        }
        self.text.parse_text(text, "UTF-8")
    }
}

impl FileIngestor for UniversalFileIngestor {
    fn ingest(&self, content: &[u8], request: &IngestRequest) -> ImportResult<IngestedTable> {
        let kind = resolve_kind(request)?;
        debug!(?kind, mime = ?request.mime_essence(), "选择解析器");
        let table = match kind {
            IngestKind::Excel => self.excel.ingest(content, request)?,
            IngestKind::Text => self.text.ingest(content, request)?,
        };

        info!(
            file = request.file_name.as_deref().unwrap_or("<pasted>"),
            headers = table.headers.len(),
            rows = table.total_rows,
            encoding = %table.detected_encoding,
            "文件摄取完成"
        );
        Ok(table)
    }
}
