//! # Jimu Host - 积木模块宿主
//!
//! 积木模块宿主是一个进程内可扩展性内核，提供以下核心功能：
//!
//! - **模块生命周期管理**: 模块的导入、排序、加载、卸载与重载
//! - **类型化事件分发**: 按处理优先级把事件路由给声明可处理的模块
//! - **观察钩子**: 主处理阶段前后的前/后观察
//! - **进行中事件跟踪**: 供外部监控的只读视图
//! - **事件化日志**: 日志本身作为广播事件分发给日志类模块
//!
//! ## 快速开始
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use jimu_host::{HostConfig, ModuleHost, StaticModuleLoader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loader = Arc::new(StaticModuleLoader::new());
//!     // loader.register(descriptor, factory).await?;
//!
//!     let host = ModuleHost::new(HostConfig::default(), loader);
//!     host.modules().import_modules().await?;
//!     host.modules().load_modules(None).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## 模块结构
//!
//! - `host` - 宿主门面与配置
//! - `module` - 模块契约、描述符、容器、集合与加载器
//! - `event` - 事件模型、元数据、注册表与内置日志事件
//! - `utils` - 工具函数和错误类型

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod event;
pub mod host;
pub mod module;
pub mod utils;

// 重导出常用类型，方便使用
pub use event::{
    downcast_mut, downcast_ref, Event, EventCore, EventMeta, EventName, EventRegistration,
    EventRegistry, LoggingEvent, Severity,
};

pub use module::{
    Module, ModuleCandidate, ModuleCollection, ModuleContainer, ModuleDescriptor, ModuleLoader,
    ModuleName, StaticModuleLoader,
};

pub use host::{HostConfig, HostConfigBuilder, InFlightEvent, LogConfig, ModuleHost};

pub use utils::{generate_event_id, HostError, Result};
pub use utils::logger::{LogGuard, Logger, LoggerConfig, LoggerConfigBuilder, RotationStrategy};

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
