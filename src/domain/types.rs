// ==========================================
// 商品导入暂存系统 - 领域类型定义
// ==========================================
// 职责: 导入方式/会话状态/跳过标记/适配分类/分隔符等枚举
// 序列化格式: 与数据库字符串一致
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 导入方式 (Import Method)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportMethod {
    Csv,      // CSV/纯文本文件或粘贴的 CSV
    Excel,    // .xlsx/.xls
    PasteSku, // 粘贴 SKU 列表
}

impl ImportMethod {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ImportMethod::Csv => "CSV",
            ImportMethod::Excel => "EXCEL",
            ImportMethod::PasteSku => "PASTE_SKU",
        }
    }

    pub fn from_db_str(raw: &str) -> Option<Self> {
        match raw.trim().trim_matches('"') {
            "CSV" => Some(ImportMethod::Csv),
            "EXCEL" => Some(ImportMethod::Excel),
            "PASTE_SKU" => Some(ImportMethod::PasteSku),
            _ => None,
        }
    }
}

impl fmt::Display for ImportMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 导入会话状态 (Session Status)
// ==========================================
// 流转: PARSING → READY → PUBLISHING → COMPLETED
// 终态: COMPLETED / FAILED / CANCELLED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Parsing,
    Ready,
    Publishing,
    Completed,
    Failed,
    Cancelled,
}

impl SessionStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SessionStatus::Parsing => "PARSING",
            SessionStatus::Ready => "READY",
            SessionStatus::Publishing => "PUBLISHING",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::Failed => "FAILED",
            SessionStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_db_str(raw: &str) -> Option<Self> {
        match raw.trim().trim_matches('"') {
            "PARSING" => Some(SessionStatus::Parsing),
            "READY" => Some(SessionStatus::Ready),
            "PUBLISHING" => Some(SessionStatus::Publishing),
            "COMPLETED" => Some(SessionStatus::Completed),
            "FAILED" => Some(SessionStatus::Failed),
            "CANCELLED" => Some(SessionStatus::Cancelled),
            _ => None,
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Failed | SessionStatus::Cancelled
        )
    }

    /// 是否为活动会话（未结束）
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// 状态流转合法性
    ///
    /// READY → PARSING 允许（同一会话追加批次）
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        match (self, next) {
            (Parsing, Parsing | Ready | Failed | Cancelled) => true,
            (Ready, Parsing | Publishing | Failed | Cancelled) => true,
            (Publishing, Completed | Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 跳过标记 (Skip Flag)
// ==========================================
// 用户显式声明某数据区块有意留空（需审计）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipFlag {
    SkipFeatures,
    SkipCompatibility,
    SkipImages,
    SkipDescriptions,
}

impl SkipFlag {
    pub const ALL: [SkipFlag; 4] = [
        SkipFlag::SkipFeatures,
        SkipFlag::SkipCompatibility,
        SkipFlag::SkipImages,
        SkipFlag::SkipDescriptions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkipFlag::SkipFeatures => "skip_features",
            SkipFlag::SkipCompatibility => "skip_compatibility",
            SkipFlag::SkipImages => "skip_images",
            SkipFlag::SkipDescriptions => "skip_descriptions",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        SkipFlag::ALL.into_iter().find(|f| f.as_str() == raw.trim())
    }
}

impl fmt::Display for SkipFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 适配分类 (Compatibility Classification)
// ==========================================
// Original = 原厂件, Replacement = 替代件; 保存时 Original 优先
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompatibilityClass {
    Original,
    Replacement,
}

impl fmt::Display for CompatibilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompatibilityClass::Original => write!(f, "Original"),
            CompatibilityClass::Replacement => write!(f, "Replacement"),
        }
    }
}

// ==========================================
// 变体 SKU 模式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkuMode {
    #[default]
    Suffix,
    Prefix,
}

// ==========================================
// 分隔符 (Delimiter)
// ==========================================
// 优先级: tab > semicolon > comma > pipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    Tab,
    Semicolon,
    Comma,
    Pipe,
}

impl Delimiter {
    /// 按检测优先级排列
    pub const PRIORITY: [Delimiter; 4] = [
        Delimiter::Tab,
        Delimiter::Semicolon,
        Delimiter::Comma,
        Delimiter::Pipe,
    ];

    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Tab => '\t',
            Delimiter::Semicolon => ';',
            Delimiter::Comma => ',',
            Delimiter::Pipe => '|',
        }
    }

    pub fn as_byte(&self) -> u8 {
        self.as_char() as u8
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Tab => write!(f, "tab"),
            Delimiter::Semicolon => write!(f, "semicolon"),
            Delimiter::Comma => write!(f, "comma"),
            Delimiter::Pipe => write!(f, "pipe"),
        }
    }
}

/// SKU 列表分隔符选择（auto 或显式）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListSeparator {
    #[default]
    Auto,
    Tab,
    Semicolon,
    Comma,
    Pipe,
}

impl ListSeparator {
    /// 显式分隔符；Auto 返回 None
    pub fn delimiter(&self) -> Option<Delimiter> {
        match self {
            ListSeparator::Auto => None,
            ListSeparator::Tab => Some(Delimiter::Tab),
            ListSeparator::Semicolon => Some(Delimiter::Semicolon),
            ListSeparator::Comma => Some(Delimiter::Comma),
            ListSeparator::Pipe => Some(Delimiter::Pipe),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "auto" => Some(ListSeparator::Auto),
            "tab" => Some(ListSeparator::Tab),
            "semicolon" => Some(ListSeparator::Semicolon),
            "comma" => Some(ListSeparator::Comma),
            "pipe" => Some(ListSeparator::Pipe),
            _ => None,
        }
    }
}
