//! 模块宿主
//!
//! 宿主是门面：持有一个模块集合和一个事件注册表，暴露
//! `can_handle` / `handle`，跟踪进行中的事件，并提供以事件形式
//! 分发的日志便捷接口。
//!
//! 每次分发前宿主生成唯一事件 ID 写入保留元数据键 `id`，并在单一
//! 互斥锁保护的进行中事件表登记一条记录；无论分发成功还是出错，
//! 记录都会在 `handle` 返回前移除。

pub mod config;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::event::{Event, EventName, EventRegistry, LoggingEvent, Severity, META_ID};
use crate::module::{ModuleCollection, ModuleLoader};
use crate::utils::{generate_event_id, Result};

pub use config::{HostConfig, HostConfigBuilder, LogConfig};

/// 进行中事件的只读记录
///
/// 供外部监控/诊断使用；记录的是事件的标识信息，不是事件本身。
#[derive(Debug, Clone)]
pub struct InFlightEvent {
    /// 宿主生成的事件 ID（与事件元数据保留键 `id` 一致）
    pub id: String,
    /// 事件名称
    pub name: EventName,
    /// 进入分发的时刻
    pub started_at: DateTime<Utc>,
}

/// 模块宿主
pub struct ModuleHost {
    config: HostConfig,
    modules: Arc<ModuleCollection>,
    events: Arc<EventRegistry>,
    in_flight: Mutex<HashMap<String, InFlightEvent>>,
}

impl ModuleHost {
    /// 创建宿主
    pub fn new(config: HostConfig, loader: Arc<dyn ModuleLoader>) -> Self {
        let modules = Arc::new(ModuleCollection::new(loader, config.clone()));
        Self {
            config,
            modules,
            events: Arc::new(EventRegistry::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// 使用默认配置创建宿主
    pub fn with_default_config(loader: Arc<dyn ModuleLoader>) -> Self {
        Self::new(HostConfig::default(), loader)
    }

    /// 应用名称
    pub fn application_name(&self) -> &str {
        &self.config.application_name
    }

    /// 模块发现的根位置
    pub fn working_directory(&self) -> &Path {
        &self.config.working_dir
    }

    /// 宿主配置
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// 模块集合
    pub fn modules(&self) -> &Arc<ModuleCollection> {
        &self.modules
    }

    /// 事件注册表
    pub fn events(&self) -> &Arc<EventRegistry> {
        &self.events
    }

    /// 是否存在能处理该事件的已加载模块
    pub async fn can_handle(&self, event: &dyn Event) -> bool {
        self.modules.can_handle(event).await
    }

    /// 分发事件
    ///
    /// 处理器返回的错误原样传播；进行中事件表的清理在任何退出路径
    /// 上都有保证。
    pub async fn handle(&self, event: &mut dyn Event) -> Result<()> {
        let id = generate_event_id();
        event.meta().set_reserved(META_ID, Value::String(id.clone()));

        let record = InFlightEvent {
            id: id.clone(),
            name: event.name().clone(),
            started_at: Utc::now(),
        };

        let _guard = InFlightGuard::register(self, record);
        trace!(event = %event.name(), id = %id, "事件进入分发");

        self.modules.handle(event).await
    }

    /// 异步分发事件
    ///
    /// 在 tokio 运行时上执行同一套顺序分发算法；不增加任何排序保证，
    /// 也不会让单个事件的处理器并行。
    pub fn handle_detached(
        self: &Arc<Self>,
        mut event: Box<dyn Event>,
    ) -> JoinHandle<(Box<dyn Event>, Result<()>)> {
        let host = Arc::clone(self);
        tokio::spawn(async move {
            let result = host.handle(event.as_mut()).await;
            (event, result)
        })
    }

    /// 以事件形式分发一条日志
    ///
    /// 构造一个 [`LoggingEvent`]（应用名称前置为第一个参数）并走普通
    /// 分发管线。没有任何日志类模块时静默丢弃，永不报错。
    ///
    /// 日志类模块在处理日志事件期间不得再调用本方法，否则分发会无
    /// 终止地递归。
    pub async fn log(&self, severity: Severity, arguments: Vec<Value>) {
        let mut args = Vec::with_capacity(arguments.len() + 1);
        args.push(Value::String(self.config.application_name.clone()));
        args.extend(arguments);

        let mut event = LoggingEvent::new(severity, args);
        let _ = self.handle(&mut event).await;
    }

    /// 进行中事件的只读快照
    pub fn events_in_progress(&self) -> Vec<InFlightEvent> {
        self.lock_in_flight().values().cloned().collect()
    }

    /// 进行中事件数量
    pub fn in_flight_count(&self) -> usize {
        self.lock_in_flight().len()
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashMap<String, InFlightEvent>> {
        // 锁中毒只可能来自处理器 panic 展开途中的登记/清理，记录本身
        // 仍是完整的键值对，直接恢复使用
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// 进行中事件表的登记守卫，析构时移除记录
struct InFlightGuard<'a> {
    host: &'a ModuleHost,
    id: String,
}

impl<'a> InFlightGuard<'a> {
    fn register(host: &'a ModuleHost, record: InFlightEvent) -> Self {
        let id = record.id.clone();
        host.lock_in_flight().insert(id.clone(), record);
        Self { host, id }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.host.lock_in_flight().remove(&self.id);
    }
}
