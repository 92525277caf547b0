//! 积木宿主错误类型定义
//!
//! 本模块定义了宿主中使用的所有错误类型。

use thiserror::Error;

/// 积木宿主核心错误类型
#[derive(Error, Debug)]
pub enum HostError {
    // ==================== 模块生命周期错误 ====================

    /// 模块未找到
    #[error("模块未找到: '{0}'")]
    ModuleNotFound(String),

    /// 模块名称重复
    #[error("模块名称重复: '{0}'")]
    DuplicateModule(String),

    /// 模块描述符无效
    #[error("模块描述符无效: '{candidate}' - {reason}")]
    InvalidDescriptor {
        candidate: String,
        reason: String,
    },

    /// 模块实例化失败
    #[error("模块实例化失败: '{module}' - {reason}")]
    ModuleConstructFailed {
        module: String,
        reason: String,
    },

    /// 模块发现失败
    #[error("模块发现失败: {0}")]
    DiscoveryFailed(String),

    // ==================== 事件系统错误 ====================

    /// 事件未找到
    #[error("事件未找到: '{0}'")]
    EventNotFound(String),

    /// 事件已导入，禁止重复导入
    #[error("事件已导入: 重复导入会产生所有已知事件的多份原型实例")]
    EventsImported,

    /// 事件实例化失败
    #[error("事件实例化失败: '{event}' - {reason}")]
    EventConstructFailed {
        event: String,
        reason: String,
    },

    /// 事件处理失败
    #[error("事件处理失败: 模块 '{module}' - {reason}")]
    HandleFailed {
        module: String,
        reason: String,
    },

    // ==================== 配置错误 ====================

    /// 配置加载失败
    #[error("配置加载失败: {0}")]
    ConfigLoadFailed(String),

    /// 配置值无效
    #[error("配置值无效: '{key}' - {reason}")]
    InvalidConfigValue {
        key: String,
        reason: String,
    },

    // ==================== 通用错误 ====================

    /// 名称为空
    #[error("名称不能为空或仅含空白字符")]
    EmptyName,

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化/反序列化错误
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML 序列化/反序列化错误
    #[error("YAML 错误: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// 版本号解析错误
    #[error("版本号解析错误: {0}")]
    Semver(#[from] semver::Error),

    /// 日志系统初始化错误
    #[error("日志系统初始化失败: {0}")]
    LoggerInit(String),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 积木宿主统一 Result 类型
pub type Result<T> = std::result::Result<T, HostError>;

impl HostError {
    /// 判断是否为配置类错误（严格模式下会被升级为致命错误）
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            HostError::InvalidDescriptor { .. }
                | HostError::ConfigLoadFailed(_)
                | HostError::InvalidConfigValue { .. }
                | HostError::EmptyName
        )
    }
}
