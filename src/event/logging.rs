//! 日志事件
//!
//! 宿主的 [`crate::host::ModuleHost::log`] 把日志作为事件分发：构造一个
//! [`LoggingEvent`] 并走普通的 `handle` 管线，由注册的日志类模块消费。
//! 该事件是广播类事件，所有符合条件的模块都会收到。
//!
//! 约定：日志类模块在处理 [`LoggingEvent`] 期间不得再调用宿主的
//! `log`，否则分发会无终止地递归。

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::event::{Event, EventCore, EventName};
use crate::event::meta::EventMeta;

/// 日志事件的事件名称
pub const LOGGING_EVENT_NAME: &str = "system.logging";

/// 日志严重程度
///
/// 从最轻到最重排序，可直接比较。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Information,
    /// 须知
    Notice,
    /// 警告
    Warning,
    /// 错误
    Error,
    /// 严重
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Trace => "trace",
            Severity::Debug => "debug",
            Severity::Information => "information",
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// 日志事件
///
/// 携带严重程度和一个有序参数列表。广播类事件：已处理标志恒为
/// false，所有日志类模块都会收到。
pub struct LoggingEvent {
    core: EventCore,
    /// 严重程度
    pub severity: Severity,
    /// 有序参数列表（宿主会把应用名称前置为第一个参数）
    pub arguments: Vec<Value>,
}

impl LoggingEvent {
    /// 创建日志事件
    pub fn new(severity: Severity, arguments: Vec<Value>) -> Self {
        Self {
            core: EventCore::new(LOGGING_EVENT_NAME),
            severity,
            arguments,
        }
    }
}

impl Default for LoggingEvent {
    fn default() -> Self {
        Self::new(Severity::Information, Vec::new())
    }
}

impl Event for LoggingEvent {
    fn name(&self) -> &EventName {
        self.core.name()
    }

    fn meta(&self) -> &EventMeta {
        self.core.meta()
    }

    fn handled(&self) -> bool {
        false
    }

    fn set_handled(&mut self, _handled: bool) {}

    fn broadcast(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
