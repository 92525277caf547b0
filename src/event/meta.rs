//! 事件元数据
//!
//! 事件元数据是一个字符串到 JSON 值的映射，采用写时复制策略：
//! 每次修改都会克隆整个映射、应用变更，然后原子地替换引用。
//! 并发读者永远不会观察到写了一半的映射。
//!
//! 保留键由宿主内部写入，普通写入接口拒绝操作这些键：
//!
//! - `id`：宿主分发前写入的事件唯一标识
//! - `handlers`：分发完成后写入的各处理模块耗时表

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::Value;

/// 保留键：事件唯一标识
pub const META_ID: &str = "id";

/// 保留键：各处理模块耗时表
pub const META_HANDLERS: &str = "handlers";

/// 元数据键：置位后抑制分发层对该事件的跟踪输出
pub const META_SUPPRESS_LOG: &str = "suppressLogMessage";

/// 判断是否为保留键（不区分大小写）
pub fn is_reserved_key(key: &str) -> bool {
    key.eq_ignore_ascii_case(META_ID) || key.eq_ignore_ascii_case(META_HANDLERS)
}

/// 事件元数据映射
///
/// 可通过共享引用修改（内部写时复制），因此处理器拿到 `&dyn Event`
/// 也能附加元数据。
#[derive(Debug)]
pub struct EventMeta {
    map: ArcSwap<HashMap<String, Value>>,
}

impl EventMeta {
    /// 创建空的元数据映射
    pub fn new() -> Self {
        Self {
            map: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// 读取指定键的值
    pub fn get(&self, key: &str) -> Option<Value> {
        self.map.load().get(key).cloned()
    }

    /// 判断指定键是否存在
    pub fn contains(&self, key: &str) -> bool {
        self.map.load().contains_key(key)
    }

    /// 写入键值
    ///
    /// 键已存在时保留原值，除非 `force_overwrite` 为 true。
    /// 保留键一律拒绝写入。
    ///
    /// # Returns
    ///
    /// 本次调用实际写入了值时返回 `true`
    pub fn set(&self, key: impl Into<String>, value: Value, force_overwrite: bool) -> bool {
        let key = key.into();
        if is_reserved_key(&key) {
            return false;
        }
        self.set_unchecked(key, value, force_overwrite)
    }

    /// 删除键值
    ///
    /// 保留键一律拒绝删除。
    ///
    /// # Returns
    ///
    /// 键存在且被删除时返回 `true`
    pub fn remove(&self, key: &str) -> bool {
        if is_reserved_key(key) || !self.contains(key) {
            return false;
        }

        let mut next = HashMap::clone(&self.map.load());
        let removed = next.remove(key).is_some();
        self.map.store(Arc::new(next));
        removed
    }

    /// 获取当前映射的快照
    pub fn snapshot(&self) -> Arc<HashMap<String, Value>> {
        self.map.load_full()
    }

    /// 当前键数量
    pub fn len(&self) -> usize {
        self.map.load().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.map.load().is_empty()
    }

    /// 宿主内部写入接口，允许操作保留键
    pub(crate) fn set_reserved(&self, key: impl Into<String>, value: Value) {
        self.set_unchecked(key.into(), value, true);
    }

    fn set_unchecked(&self, key: String, value: Value, force_overwrite: bool) -> bool {
        let current = self.map.load();
        if current.contains_key(&key) && !force_overwrite {
            return false;
        }

        let mut next = HashMap::clone(&current);
        next.insert(key, value);
        self.map.store(Arc::new(next));
        true
    }
}

impl Default for EventMeta {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventMeta {
    fn clone(&self) -> Self {
        Self {
            map: ArcSwap::new(self.map.load_full()),
        }
    }
}
