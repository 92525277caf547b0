//! 模块名称与模块描述符
//!
//! 描述符是模块的静态元数据：名称、版本、优先级、依赖与加载标志。
//! 发现阶段由加载器给出，导入后不再变化。

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::utils::{HostError, Result};

// ============================================================================
// 模块名称
// ============================================================================

/// 模块名称
///
/// 模块的唯一标识，与事件名称属于不同的命名空间。
/// 比较和哈希不区分 ASCII 大小写。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleName(String);

impl ModuleName {
    /// 创建模块名称
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// 以字符串切片形式返回名称
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 名称是否为空或仅含空白字符
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl PartialEq for ModuleName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for ModuleName {}

impl Hash for ModuleName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModuleName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ModuleName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// 模块名称格式：字母、数字、点、下划线和连字符
fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("内置正则无效"))
}

// ============================================================================
// 模块描述符
// ============================================================================

/// 模块描述符
///
/// 优先级为有符号数，数值越小越先被处理/加载。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// 模块名称（在所有已导入模块中唯一）
    pub name: ModuleName,

    /// 模块版本
    #[serde(default = "default_version")]
    pub version: Version,

    /// 模块用途简述
    #[serde(default)]
    pub description: String,

    /// 补充信息与使用说明
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_information: Vec<String>,

    /// 期望存在的其他模块名称（仅作提示，缺失只产生告警）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<ModuleName>,

    /// 处理优先级，越小越先收到事件
    #[serde(default)]
    pub handle_priority: i16,

    /// 加载优先级，越小越先加载
    #[serde(default)]
    pub load_priority: i16,

    /// 是否在其他模块之前完成整个加载序列
    #[serde(default)]
    pub load_first: bool,

    /// 未给出显式加载集合时是否自动加载
    #[serde(default = "default_auto_load")]
    pub auto_load: bool,
}

fn default_version() -> Version {
    Version::new(0, 1, 0)
}

fn default_auto_load() -> bool {
    true
}

impl ModuleDescriptor {
    /// 创建模块描述符，其余字段取默认值
    pub fn new(name: impl Into<ModuleName>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            description: String::new(),
            additional_information: Vec::new(),
            dependencies: Vec::new(),
            handle_priority: 0,
            load_priority: 0,
            load_first: false,
            auto_load: true,
        }
    }

    /// 校验描述符
    ///
    /// # Errors
    ///
    /// 名称为空或格式非法时返回 [`HostError::InvalidDescriptor`]
    pub fn validate(&self) -> Result<()> {
        if self.name.is_blank() {
            return Err(HostError::EmptyName);
        }

        if !name_pattern().is_match(self.name.as_str()) {
            return Err(HostError::InvalidDescriptor {
                candidate: self.name.to_string(),
                reason: "名称只允许字母、数字、点、下划线和连字符，且以字母或数字开头"
                    .to_string(),
            });
        }

        Ok(())
    }
}

impl fmt::Display for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} v{} (load_first: {}, load_priority: {}, handle_priority: {})",
            self.name, self.version, self.load_first, self.load_priority, self.handle_priority
        )
    }
}
