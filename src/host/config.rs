//! 宿主配置
//!
//! 定义宿主的配置结构和加载逻辑。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否输出到文件
    #[serde(default)]
    pub file_output: bool,

    /// 日志文件目录
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// 是否输出 JSON 格式
    #[serde(default)]
    pub json_format: bool,

    /// 日志轮转策略（never / hourly / daily）
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: false,
            log_dir: None,
            json_format: false,
            rotation: default_rotation(),
        }
    }
}

/// 宿主配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// 配置文件路径
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// 应用名称（宿主分发日志事件时前置到参数列表）
    #[serde(default = "default_application_name")]
    pub application_name: String,

    /// 模块发现的根位置
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// 模块发现的最大目录深度
    #[serde(default = "default_max_discovery_depth")]
    pub max_discovery_depth: usize,

    /// 严格模式：描述符/配置类错误升级为致命错误
    #[serde(default)]
    pub strict: bool,

    /// 日志配置
    #[serde(default)]
    pub logging: LogConfig,
}

fn default_application_name() -> String {
    "jimu-host".to_string()
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_discovery_depth() -> usize {
    1
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            application_name: default_application_name(),
            working_dir: default_working_dir(),
            max_discovery_depth: default_max_discovery_depth(),
            strict: false,
            logging: LogConfig::default(),
        }
    }
}

impl HostConfig {
    /// 创建配置构建器
    pub fn builder() -> HostConfigBuilder {
        HostConfigBuilder::new()
    }

    /// 从文件加载配置
    ///
    /// 扩展名为 `.json` 时按 JSON 解析，否则按 YAML 解析。
    pub async fn from_file(path: impl Into<PathBuf>) -> crate::utils::Result<Self> {
        let path = path.into();
        let content = tokio::fs::read_to_string(&path).await?;

        let mut config: HostConfig = if path.extension().map(|e| e == "json").unwrap_or(false) {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        config.config_path = Some(path);
        Ok(config)
    }

    /// 合并另一个配置（用于覆盖）
    pub fn merge(&mut self, other: HostConfig) {
        // 只覆盖非默认值的配置
        if other.application_name != default_application_name() {
            self.application_name = other.application_name;
        }
        if other.working_dir != default_working_dir() {
            self.working_dir = other.working_dir;
        }
        if other.max_discovery_depth != default_max_discovery_depth() {
            self.max_discovery_depth = other.max_discovery_depth;
        }
        if other.strict {
            self.strict = true;
        }
        if other.logging.level != default_log_level() {
            self.logging.level = other.logging.level;
        }
        if other.logging.file_output {
            self.logging.file_output = true;
            self.logging.log_dir = other.logging.log_dir;
        }
        if other.logging.json_format {
            self.logging.json_format = true;
        }
    }
}

/// 配置构建器
#[derive(Debug, Default)]
pub struct HostConfigBuilder {
    config: HostConfig,
}

impl HostConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            config: HostConfig::default(),
        }
    }

    /// 设置应用名称
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.config.application_name = name.into();
        self
    }

    /// 设置模块发现根位置
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.working_dir = dir.into();
        self
    }

    /// 设置模块发现的最大目录深度
    pub fn max_discovery_depth(mut self, depth: usize) -> Self {
        self.config.max_discovery_depth = depth;
        self
    }

    /// 启用严格模式
    pub fn strict(mut self) -> Self {
        self.config.strict = true;
        self
    }

    /// 设置日志级别
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// 启用文件日志
    pub fn file_logging(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.config.logging.file_output = true;
        self.config.logging.log_dir = Some(log_dir.into());
        self
    }

    /// 启用 JSON 格式日志
    pub fn json_logging(mut self) -> Self {
        self.config.logging.json_format = true;
        self
    }

    /// 构建配置
    pub fn build(self) -> HostConfig {
        self.config
    }
}
