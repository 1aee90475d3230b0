// ==========================================
// 商品导入暂存系统 - 值清洗器实现
// ==========================================
// 职责: TRIM / UPPER / NULL 标准化 / 宽松数值解析
// ==========================================

use crate::importer::staging_importer_trait::ValueCleaner as ValueCleanerTrait;

pub struct ValueCleaner;

impl ValueCleanerTrait for ValueCleaner {
    fn clean_text(&self, value: &str, uppercase: bool) -> String {
        let trimmed = value.trim();
        if uppercase {
            trimmed.to_uppercase()
        } else {
            trimmed.to_string()
        }
    }

    fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    fn parse_decimal(&self, value: Option<&str>) -> Option<f64> {
        let raw = self.normalize_null(value)?;
        // "12,50 zł" → "12.50"
        let cleaned: String = raw
            .replace(',', ".")
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();
        if cleaned.is_empty() {
            return None;
        }

        // 多个小数点时仅保留最后一个（千分位写法 "1.234.5"）
        let normalized = match cleaned.rfind('.') {
            Some(last) if cleaned.matches('.').count() > 1 => {
                let (int_part, frac_part) = cleaned.split_at(last);
                format!("{}{}", int_part.replace('.', ""), frac_part)
            }
            _ => cleaned,
        };

        normalized.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    fn parse_integer(&self, value: Option<&str>) -> Option<i64> {
        self.parse_decimal(value).map(|v| v.trunc() as i64)
    }
}

impl ValueCleaner {
    /// 清洗 SKU（TRIM + UPPER）
    pub fn clean_sku(&self, value: &str) -> String {
        self.clean_text(value, true)
    }

    /// 解析年份（1900..=2100 之外视为缺失）
    pub fn parse_year(&self, value: Option<&str>) -> Option<i32> {
        self.parse_integer(value)
            .filter(|y| (1900..=2100).contains(y))
            .map(|y| y as i32)
    }
}
