// ==========================================
// 商品导入暂存系统 - 国际化 (i18n)
// ==========================================
// 使用 rust-i18n 库
// 支持中文（默认）和英文，面向用户的错误/批量摘要均经此生成
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use crate::config::ImportConfigReader;
use std::error::Error;

/// 支持的语言
pub const SUPPORTED_LOCALES: [&str; 2] = ["zh-CN", "en"];

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"zh-CN" 或 "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 按配置 i18n.default_locale 设置语言
///
/// # 返回
/// - Ok(String): 实际生效的语言（不支持的值回退为 zh-CN）
pub async fn apply_configured_locale<C>(config: &C) -> Result<String, Box<dyn Error>>
where
    C: ImportConfigReader + ?Sized,
{
    let configured = config.get_default_locale().await?;
    let locale = if SUPPORTED_LOCALES.contains(&configured.as_str()) {
        configured
    } else {
        tracing::warn!(locale = %configured, "不支持的语言，回退为 zh-CN");
        "zh-CN".to_string()
    };
    set_locale(&locale);
    Ok(locale)
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use product_import_staging::i18n::t;
/// let msg = t("common.success");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use product_import_staging::i18n::t_with_args;
/// let msg = t_with_args("import.file_not_found", &[("path", "/tmp/test.csv")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}
