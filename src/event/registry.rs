//! 事件注册表
//!
//! 注册表保存已知事件类型的原型工厂，用于按名称或按类型制造新实例。
//! 启动期一次性导入，导入后封闭：重复导入会被拒绝，因为那会产生
//! 所有已知事件的多份原型。

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::event::event::{Event, EventName};
use crate::utils::{HostError, Result};

/// 事件原型工厂
pub type EventFactory = Arc<dyn Fn() -> Box<dyn Event> + Send + Sync>;

/// 一条事件注册项：名称 + 具体类型 + 原型工厂
#[derive(Clone)]
pub struct EventRegistration {
    name: EventName,
    type_id: TypeId,
    type_name: &'static str,
    factory: EventFactory,
}

impl EventRegistration {
    /// 从实现了 `Default` 的事件类型创建注册项
    pub fn of<T: Event + Default>() -> Self {
        let prototype = T::default();
        Self {
            name: prototype.name().clone(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            factory: Arc::new(|| Box::new(T::default())),
        }
    }

    /// 从自定义工厂创建注册项
    ///
    /// 工厂会被立即调用一次以获取事件名称和具体类型。
    pub fn from_factory(factory: impl Fn() -> Box<dyn Event> + Send + Sync + 'static) -> Self {
        let prototype = factory();
        Self {
            name: prototype.name().clone(),
            type_id: prototype.as_any().type_id(),
            type_name: "<factory>",
            factory: Arc::new(factory),
        }
    }

    /// 注册项的事件名称
    pub fn name(&self) -> &EventName {
        &self.name
    }
}

/// 事件注册表
///
/// 一次性导入、导入后只读。
pub struct EventRegistry {
    entries: RwLock<HashMap<EventName, EventRegistration>>,
    by_type: RwLock<HashMap<TypeId, EventName>>,
    sealed: AtomicBool,
}

impl EventRegistry {
    /// 创建空的事件注册表
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            by_type: RwLock::new(HashMap::new()),
            sealed: AtomicBool::new(false),
        }
    }

    /// 导入事件注册项并封闭注册表
    ///
    /// 名称为空或与已收录项重名的注册项会被告警并跳过。
    ///
    /// # Errors
    ///
    /// 注册表已封闭时返回 [`HostError::EventsImported`]
    pub async fn import(&self, registrations: Vec<EventRegistration>) -> Result<()> {
        if self.sealed.swap(true, Ordering::SeqCst) {
            return Err(HostError::EventsImported);
        }

        debug!(count = registrations.len(), "开始导入事件");

        let mut entries = self.entries.write().await;
        let mut by_type = self.by_type.write().await;

        for registration in registrations {
            if registration.name.is_blank() {
                warn!(
                    event_type = registration.type_name,
                    "事件名称为空，跳过该注册项"
                );
                continue;
            }

            if entries.contains_key(&registration.name) {
                warn!(
                    event = %registration.name,
                    event_type = registration.type_name,
                    "事件名称重复，跳过该注册项"
                );
                continue;
            }

            by_type.insert(registration.type_id, registration.name.clone());
            entries.insert(registration.name.clone(), registration);
        }

        debug!(count = entries.len(), "事件导入完成");
        Ok(())
    }

    /// 注册表是否已封闭
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::SeqCst)
    }

    /// 已知事件名称列表
    pub async fn known_events(&self) -> Vec<EventName> {
        self.entries.read().await.keys().cloned().collect()
    }

    /// 已知事件具体类型列表
    pub async fn known_event_types(&self) -> Vec<TypeId> {
        self.by_type.read().await.keys().copied().collect()
    }

    /// 已知事件数量
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// 注册表是否为空
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// 按名称制造一个新的事件实例
    pub async fn event_from_name(&self, name: &EventName) -> Option<Box<dyn Event>> {
        let entries = self.entries.read().await;
        entries.get(name).map(|r| (r.factory)())
    }

    /// 按具体类型制造一个新的事件实例
    pub async fn event_of<T: Event>(&self) -> Option<Box<dyn Event>> {
        let name = {
            let by_type = self.by_type.read().await;
            by_type.get(&TypeId::of::<T>()).cloned()
        }?;
        self.event_from_name(&name).await
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}
