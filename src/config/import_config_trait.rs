// ==========================================
// 商品导入暂存系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入管道所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入管道所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    // ===== 摄取 =====

    /// CSV/Excel 上传上限（字节）
    ///
    /// # 默认值
    /// - 52428800 (50MB)
    async fn get_max_file_size_bytes(&self) -> Result<u64, Box<dyn Error>>;

    /// 单张图片上限（字节）
    ///
    /// # 默认值
    /// - 10485760 (10MB)
    async fn get_max_image_size_bytes(&self) -> Result<u64, Box<dyn Error>>;

    /// 分隔符检测采样行数
    ///
    /// # 默认值
    /// - 10
    async fn get_delimiter_sample_lines(&self) -> Result<usize, Box<dyn Error>>;

    // ===== SKU =====

    /// # 默认值
    /// - 2
    async fn get_sku_min_length(&self) -> Result<usize, Box<dyn Error>>;

    /// # 默认值
    /// - 64
    async fn get_sku_max_length(&self) -> Result<usize, Box<dyn Error>>;

    // ===== 列映射 =====

    /// 自动映射置信度阈值
    ///
    /// # 默认值
    /// - 0.7
    async fn get_auto_map_threshold(&self) -> Result<f64, Box<dyn Error>>;

    /// 建议置信度下限
    ///
    /// # 默认值
    /// - 0.5
    async fn get_suggestion_threshold(&self) -> Result<f64, Box<dyn Error>>;

    /// 每个表头保留的候选数
    ///
    /// # 默认值
    /// - 3
    async fn get_max_alternates(&self) -> Result<usize, Box<dyn Error>>;

    // ===== 变体 / 本地化 =====

    /// # 默认值
    /// - "-"
    async fn get_variant_default_separator(&self) -> Result<String, Box<dyn Error>>;

    /// # 默认值
    /// - "zh-CN"
    async fn get_default_locale(&self) -> Result<String, Box<dyn Error>>;
}
