//! 事件系统模块
//!
//! 包含事件分发管线的数据模型：
//! - 事件接口与公共状态
//! - 写时复制元数据
//! - 一次性导入的事件注册表
//! - 内置日志事件

pub mod event;
pub mod logging;
pub mod meta;
pub mod registry;

// 重导出常用类型
pub use event::{downcast_mut, downcast_ref, Event, EventCore, EventName};
pub use logging::{LoggingEvent, Severity, LOGGING_EVENT_NAME};
pub use meta::{is_reserved_key, EventMeta, META_HANDLERS, META_ID, META_SUPPRESS_LOG};
pub use registry::{EventFactory, EventRegistration, EventRegistry};
