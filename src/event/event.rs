//! 事件模型
//!
//! 事件是一条类型化消息：载荷（输入/输出）定义在具体事件类型上，
//! 公共状态（名称、元数据、已处理标志）由 [`EventCore`] 提供，
//! 具体事件类型内嵌并委托给它。分发层只面向 `dyn Event` 工作，
//! 处理器通过 [`downcast_ref`] / [`downcast_mut`] 取回具体类型。
//!
//! 广播类事件（见 [`Event::broadcast`]）的已处理标志恒为 false，
//! 分发永不提前终止，所有符合条件的模块都会收到该事件。

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::event::meta::EventMeta;
use crate::module::descriptor::ModuleName;

// ============================================================================
// 事件名称
// ============================================================================

/// 事件名称
///
/// 事件的查找标识，与模块名称属于不同的命名空间。
/// 比较和哈希不区分 ASCII 大小写。约定使用点分小写形式，
/// 例如 `system.logging`、`chat.message`。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventName(String);

impl EventName {
    /// 创建事件名称
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

impl PartialEq for EventName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for EventName {}

impl Hash for EventName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EventName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

// ============================================================================
// 事件接口
// ============================================================================

/// 事件接口
///
/// 分发管线面向该接口工作。具体事件类型通常内嵌一个 [`EventCore`]
/// 并把公共状态委托给它。
pub trait Event: Any + Send + Sync {
    /// 事件名称
    fn name(&self) -> &EventName;

    /// 事件元数据
    fn meta(&self) -> &EventMeta;

    /// 是否已被某个处理模块标记为已处理
    fn handled(&self) -> bool;

    /// 设置已处理标志
    ///
    /// 广播类事件忽略该调用。
    fn set_handled(&mut self, handled: bool);

    /// 是否为广播类事件
    ///
    /// 广播类事件的 [`Event::handled`] 恒为 false，分发会遍历所有
    /// 符合条件的模块而不提前终止。
    fn broadcast(&self) -> bool {
        false
    }

    /// 严格处理模块白名单
    ///
    /// 返回 `Some` 时，只有名单内的模块才有资格处理该事件。
    fn handler_allowlist(&self) -> Option<&[ModuleName]> {
        None
    }

    /// 协作式取消令牌
    ///
    /// 宿主不会抢占正在运行的处理器；处理器应在安全点自行轮询该令牌。
    fn cancel_token(&self) -> Option<&CancellationToken> {
        None
    }

    /// 向上转型，用于取回具体事件类型
    fn as_any(&self) -> &dyn Any;

    /// 向上转型（可变），用于取回具体事件类型
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// 尝试把 `dyn Event` 还原为具体事件类型
pub fn downcast_ref<T: Event>(event: &dyn Event) -> Option<&T> {
    event.as_any().downcast_ref::<T>()
}

/// 尝试把 `dyn Event` 还原为具体事件类型（可变）
pub fn downcast_mut<T: Event>(event: &mut dyn Event) -> Option<&mut T> {
    event.as_any_mut().downcast_mut::<T>()
}

// ============================================================================
// 事件公共状态
// ============================================================================

/// 事件公共状态
///
/// 具体事件类型内嵌该结构并委托 `name` / `meta` / `handled`。
///
/// # Example
///
/// ```
/// use std::any::Any;
/// use jimu_host::event::{Event, EventCore, EventMeta, EventName};
///
/// struct PingEvent {
///     core: EventCore,
///     pub reply: Option<String>,
/// }
///
/// impl PingEvent {
///     fn new() -> Self {
///         Self { core: EventCore::new("demo.ping"), reply: None }
///     }
/// }
///
/// impl Event for PingEvent {
///     fn name(&self) -> &EventName { self.core.name() }
///     fn meta(&self) -> &EventMeta { self.core.meta() }
///     fn handled(&self) -> bool { self.core.handled() }
///     fn set_handled(&mut self, handled: bool) { self.core.set_handled(handled) }
///     fn as_any(&self) -> &dyn Any { self }
///     fn as_any_mut(&mut self) -> &mut dyn Any { self }
/// }
///
/// let event = PingEvent::new();
/// assert_eq!(event.name().as_str(), "demo.ping");
/// assert!(!event.handled());
/// ```
#[derive(Debug, Clone)]
pub struct EventCore {
    name: EventName,
    meta: EventMeta,
    handled: bool,
}

impl EventCore {
    /// 创建事件公共状态
    pub fn new(name: impl Into<EventName>) -> Self {
        Self {
            name: name.into(),
            meta: EventMeta::new(),
            handled: false,
        }
    }

    /// 事件名称
    pub fn name(&self) -> &EventName {
        &self.name
    }

    /// 事件元数据
    pub fn meta(&self) -> &EventMeta {
        &self.meta
    }

    /// 已处理标志
    pub fn handled(&self) -> bool {
        self.handled
    }

    /// 设置已处理标志
    pub fn set_handled(&mut self, handled: bool) {
        self.handled = handled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_event_name_case_insensitive() {
        let a = EventName::new("System.Logging");
        let b = EventName::new("system.logging");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_event_name_display_preserves_case() {
        let name = EventName::new("Chat.Message");
        assert_eq!(name.to_string(), "Chat.Message");
        assert_eq!(name.as_str(), "Chat.Message");
    }

    #[test]
    fn test_event_name_is_blank() {
        assert!(EventName::new("").is_blank());
        assert!(EventName::new("   ").is_blank());
        assert!(!EventName::new("x").is_blank());
    }

    #[test]
    fn test_event_core_handled_flag() {
        let mut core = EventCore::new("test.event");
        assert!(!core.handled());
        core.set_handled(true);
        assert!(core.handled());
        core.set_handled(false);
        assert!(!core.handled());
    }

    struct SampleEvent {
        core: EventCore,
        payload: u32,
    }

    impl Event for SampleEvent {
        fn name(&self) -> &EventName {
            self.core.name()
        }
        fn meta(&self) -> &EventMeta {
            self.core.meta()
        }
        fn handled(&self) -> bool {
            self.core.handled()
        }
        fn set_handled(&mut self, handled: bool) {
            self.core.set_handled(handled);
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_downcast() {
        let mut event = SampleEvent {
            core: EventCore::new("test.sample"),
            payload: 7,
        };

        let dyn_event: &mut dyn Event = &mut event;
        assert_eq!(downcast_ref::<SampleEvent>(dyn_event).map(|e| e.payload), Some(7));

        if let Some(concrete) = downcast_mut::<SampleEvent>(dyn_event) {
            concrete.payload = 9;
        }
        assert_eq!(event.payload, 9);
    }
}
