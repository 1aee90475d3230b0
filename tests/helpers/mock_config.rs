// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use product_import_staging::config::ImportConfigReader;
use std::error::Error;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub max_file_size_bytes: u64,
    pub max_image_size_bytes: u64,
    pub delimiter_sample_lines: usize,
    pub sku_min_length: usize,
    pub sku_max_length: usize,
    pub auto_map_threshold: f64,
    pub suggestion_threshold: f64,
    pub max_alternates: usize,
    pub variant_default_separator: String,
    pub default_locale: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 50 * 1024 * 1024,
            max_image_size_bytes: 10 * 1024 * 1024,
            delimiter_sample_lines: 10,
            sku_min_length: 2,
            sku_max_length: 64,
            auto_map_threshold: 0.7,
            suggestion_threshold: 0.5,
            max_alternates: 3,
            variant_default_separator: "-".to_string(),
            default_locale: "zh-CN".to_string(),
        }
    }
}

impl MockConfig {
    /// 指定默认语言
    pub fn with_locale(locale: &str) -> Self {
        Self {
            default_locale: locale.to_string(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl ImportConfigReader for MockConfig {
    async fn get_max_file_size_bytes(&self) -> Result<u64, Box<dyn Error>> {
        Ok(self.max_file_size_bytes)
    }

    async fn get_max_image_size_bytes(&self) -> Result<u64, Box<dyn Error>> {
        Ok(self.max_image_size_bytes)
    }

    async fn get_delimiter_sample_lines(&self) -> Result<usize, Box<dyn Error>> {
        Ok(self.delimiter_sample_lines)
    }

    async fn get_sku_min_length(&self) -> Result<usize, Box<dyn Error>> {
        Ok(self.sku_min_length)
    }

    async fn get_sku_max_length(&self) -> Result<usize, Box<dyn Error>> {
        Ok(self.sku_max_length)
    }

    async fn get_auto_map_threshold(&self) -> Result<f64, Box<dyn Error>> {
        Ok(self.auto_map_threshold)
    }

    async fn get_suggestion_threshold(&self) -> Result<f64, Box<dyn Error>> {
        Ok(self.suggestion_threshold)
    }

    async fn get_max_alternates(&self) -> Result<usize, Box<dyn Error>> {
        Ok(self.max_alternates)
    }

    async fn get_variant_default_separator(&self) -> Result<String, Box<dyn Error>> {
        Ok(self.variant_default_separator.clone())
    }

    async fn get_default_locale(&self) -> Result<String, Box<dyn Error>> {
        Ok(self.default_locale.clone())
    }
}
