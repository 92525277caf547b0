//! 模块集合
//!
//! 集合持有全部模块容器，负责导入、排序、加载/卸载，同时充当事件
//! 分发的扇出器：前观察 → 按处理优先级逐个调用处理器 → 后观察。
//!
//! 容器列表维护两份独立排序的视图：按加载优先级的权威加载顺序，
//! 和按处理优先级的分发顺序。两种排序对相等优先级保持稳定（保留
//! 发现顺序）。
//!
//! 加载/卸载与高并发分发不应针对同一模块集合同时进行，调用方负责
//! 在受控时点（启动、显式管理调用）串行化这两类操作。

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, trace, warn};

use crate::event::{Event, META_HANDLERS, META_SUPPRESS_LOG, LOGGING_EVENT_NAME};
use crate::host::config::HostConfig;
use crate::module::container::ModuleContainer;
use crate::module::contract::Module;
use crate::module::descriptor::ModuleName;
use crate::module::loader::ModuleLoader;
use crate::utils::Result;

struct Inner {
    /// 权威加载顺序：按 load_priority 升序，相等保持发现顺序
    load_order: Vec<Arc<ModuleContainer>>,
    /// 分发顺序：按 handle_priority 升序，相等保持发现顺序
    handle_order: Vec<Arc<ModuleContainer>>,
}

/// 模块集合
pub struct ModuleCollection {
    loader: Arc<dyn ModuleLoader>,
    config: HostConfig,
    inner: RwLock<Inner>,
}

impl ModuleCollection {
    /// 创建空集合
    pub fn new(loader: Arc<dyn ModuleLoader>, config: HostConfig) -> Self {
        Self {
            loader,
            config,
            inner: RwLock::new(Inner {
                load_order: Vec::new(),
                handle_order: Vec::new(),
            }),
        }
    }

    /// 使用中的加载器
    pub fn loader(&self) -> &Arc<dyn ModuleLoader> {
        &self.loader
    }

    // ==================== 导入 ====================

    /// 导入当前全部候选模块
    ///
    /// 幂等合并：名称已存在的候选被跳过，重复导入不会产生重复项。
    /// 描述符非法的候选被告警跳过；严格模式下升级为错误。
    ///
    /// # Returns
    ///
    /// 本次新导入的模块名称，按加载顺序排列
    pub async fn import_modules(&self) -> Result<Vec<ModuleName>> {
        let candidates = self
            .loader
            .discover(&self.config.working_dir, self.config.max_discovery_depth)
            .await?;

        debug!(count = candidates.len(), "发现候选模块");

        let mut inner = self.inner.write().await;
        let mut known: HashSet<ModuleName> = inner
            .load_order
            .iter()
            .map(|c| c.descriptor().name.clone())
            .collect();

        let mut fresh: Vec<Arc<ModuleContainer>> = Vec::new();
        for candidate in candidates {
            if let Err(e) = candidate.descriptor.validate() {
                if self.config.strict {
                    return Err(e);
                }
                warn!(
                    candidate = %candidate.descriptor.name,
                    error = %e,
                    "候选模块描述符无效，跳过"
                );
                continue;
            }

            if known.contains(&candidate.descriptor.name) {
                continue;
            }

            known.insert(candidate.descriptor.name.clone());
            fresh.push(Arc::new(ModuleContainer::new(candidate)));
        }

        // 新容器按加载优先级排序后追加到权威加载顺序
        fresh.sort_by_key(|c| c.descriptor().load_priority);
        let names: Vec<ModuleName> = fresh.iter().map(|c| c.descriptor().name.clone()).collect();
        inner.load_order.extend(fresh);

        // 重建分发顺序视图
        let mut handle_order = inner.load_order.clone();
        handle_order.sort_by_key(|c| c.descriptor().handle_priority);
        inner.handle_order = handle_order;

        info!(
            imported = names.len(),
            total = inner.load_order.len(),
            "模块导入完成"
        );
        Ok(names)
    }

    /// 已知模块名称（加载顺序）
    pub async fn module_names(&self) -> Vec<ModuleName> {
        self.inner
            .read()
            .await
            .load_order
            .iter()
            .map(|c| c.descriptor().name.clone())
            .collect()
    }

    /// 指定名称的模块是否已导入
    pub async fn has_module(&self, name: &ModuleName) -> bool {
        self.inner
            .read()
            .await
            .load_order
            .iter()
            .any(|c| &c.descriptor().name == name)
    }

    /// 已导入模块数量
    pub async fn len(&self) -> usize {
        self.inner.read().await.load_order.len()
    }

    /// 集合是否为空
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.load_order.is_empty()
    }

    // ==================== 加载 ====================

    /// 加载模块
    ///
    /// `target` 为 `None` 时目标集合是所有 `auto_load = true` 的容器；
    /// 给出名称列表时只针对列表内的容器，未列出的容器保持现状。
    ///
    /// 依赖检查只产生告警，缺失依赖不会阻止加载。
    pub async fn load_modules(&self, target: Option<&[ModuleName]>) -> Result<()> {
        let snapshot = self.load_order_snapshot().await;
        let known: HashSet<ModuleName> = snapshot
            .iter()
            .map(|c| c.descriptor().name.clone())
            .collect();

        // 依赖检查（仅提示）
        for container in &snapshot {
            if let Some(names) = target {
                if !names.contains(&container.descriptor().name) {
                    continue;
                }
            }
            for dependency in &container.descriptor().dependencies {
                if !known.contains(dependency) {
                    warn!(
                        module = %container.descriptor().name,
                        dependency = %dependency,
                        "声明的依赖模块不存在，继续加载"
                    );
                }
            }
        }

        // 实例化
        for container in &snapshot {
            if !self.targeted(container, target) || container.initialized().await {
                continue;
            }
            container.initialize(self.loader.as_ref()).await;
        }

        // 优先加载 load_first 的容器，整个加载序列先于其他容器完成
        for container in &snapshot {
            if !container.descriptor().load_first {
                continue;
            }
            self.run_load_sequence(container, target).await;
        }

        for container in &snapshot {
            if container.descriptor().load_first {
                continue;
            }
            self.run_load_sequence(container, target).await;
        }

        // 收尾：通知本轮目标集合内全部已加载的模块，顺序与加载一致
        // （先 load_first 再其余）
        for pass_load_first in [true, false] {
            for container in &snapshot {
                if container.descriptor().load_first != pass_load_first
                    || !self.targeted(container, target)
                    || !container.is_loaded()
                {
                    continue;
                }
                if let Some(module) = container.instance().await {
                    module.on_all_modules_loaded().await;
                }
            }
        }

        Ok(())
    }

    /// 卸载模块
    ///
    /// `target` 为 `None` 时卸载全部已加载容器。遍历沿权威加载顺序
    /// 正向进行（不反转）。卸载后对每个目标容器做反初始化。
    pub async fn unload_modules(&self, target: Option<&[ModuleName]>) -> Result<()> {
        let snapshot = self.load_order_snapshot().await;

        for container in &snapshot {
            if let Some(names) = target {
                if !names.contains(&container.descriptor().name) {
                    continue;
                }
            }
            if !container.is_loaded() {
                continue;
            }

            let name = container.descriptor().name.clone();
            info!(module = %name, "开始卸载模块");

            if let Some(module) = container.instance().await {
                if let Err(e) = module.on_unloading().await {
                    warn!(module = %name, error = %e, "on_unloading 钩子失败");
                }
                container.set_loaded(false);
                if let Err(e) = module.on_unloaded().await {
                    warn!(module = %name, error = %e, "on_unloaded 钩子失败");
                }
            }
        }

        for container in &snapshot {
            if let Some(names) = target {
                if !names.contains(&container.descriptor().name) {
                    continue;
                }
            }
            if container.initialized().await {
                container.deinitialize(self.loader.as_ref()).await;
            }
        }

        Ok(())
    }

    /// 重新加载模块：以同一目标集合先卸载再加载
    pub async fn reload_modules(&self, target: Option<&[ModuleName]>) -> Result<()> {
        self.unload_modules(target).await?;
        self.load_modules(target).await
    }

    // ==================== 分发 ====================

    /// 是否存在至少一个能处理该事件的已加载模块
    pub async fn can_handle(&self, event: &dyn Event) -> bool {
        let snapshot = self.handle_order_snapshot().await;
        for container in &snapshot {
            if self.eligible(container, event).await.is_some() {
                return true;
            }
        }
        false
    }

    /// 返回已加载的容器，按处理优先级升序（相等保持发现顺序）
    ///
    /// 给定事件时只返回符合条件（已加载、白名单、声明可处理）的容器。
    pub async fn get_loaded_modules(
        &self,
        event: Option<&dyn Event>,
    ) -> Vec<Arc<ModuleContainer>> {
        let snapshot = self.handle_order_snapshot().await;
        let mut result = Vec::new();
        for container in snapshot {
            match event {
                Some(event) => {
                    if self.eligible(&container, event).await.is_some() {
                        result.push(container);
                    }
                }
                None => {
                    if container.is_loaded() {
                        result.push(container);
                    }
                }
            }
        }
        result
    }

    /// 分发事件
    ///
    /// 前观察 → 按处理优先级逐个调用符合条件的处理器，首个把事件
    /// 标记为已处理的处理器之后不再继续（广播类事件除外）→ 把各
    /// 处理器耗时表写入保留元数据键 → 后观察。
    ///
    /// 处理器返回的错误原样向上传播。
    pub async fn handle(&self, event: &mut dyn Event) -> Result<()> {
        let snapshot = self.handle_order_snapshot().await;
        let quiet = Self::suppress_trace(event);

        // 前观察
        for container in &snapshot {
            if let Some(module) = self.eligible_observer(container, event).await {
                if module.wants_pre_handle(event) {
                    module.pre_handle(event).await;
                }
            }
        }

        // 主处理
        let mut timings = serde_json::Map::new();
        for container in &snapshot {
            let module = match self.eligible(container, event).await {
                Some(module) => module,
                None => continue,
            };

            let name = container.descriptor().name.clone();
            if !quiet {
                trace!(module = %name, event = %event.name(), "调用事件处理器");
            }

            let start = Instant::now();
            module.handle(event).await?;
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
            timings.insert(name.to_string(), Value::from(elapsed_ms));

            if event.handled() {
                if !quiet {
                    trace!(module = %name, event = %event.name(), "事件已处理，停止分发");
                }
                break;
            }
        }

        event
            .meta()
            .set_reserved(META_HANDLERS, Value::Object(timings));

        // 后观察
        for container in &snapshot {
            if let Some(module) = self.eligible_observer(container, event).await {
                if module.wants_post_handle(event) {
                    module.post_handle(event).await;
                }
            }
        }

        Ok(())
    }

    // ==================== 内部 ====================

    async fn load_order_snapshot(&self) -> Vec<Arc<ModuleContainer>> {
        self.inner.read().await.load_order.clone()
    }

    async fn handle_order_snapshot(&self) -> Vec<Arc<ModuleContainer>> {
        self.inner.read().await.handle_order.clone()
    }

    fn targeted(&self, container: &ModuleContainer, target: Option<&[ModuleName]>) -> bool {
        match target {
            Some(names) => names.contains(&container.descriptor().name),
            None => container.descriptor().auto_load,
        }
    }

    /// 对单个容器执行 on_loading → 置位加载标志 → on_loaded
    ///
    /// 加载标志在 on_loaded 之前置位，使同一轮中更晚加载的依赖方
    /// 已经可以向本模块分发事件。钩子失败只告警，模块保持未加载，
    /// 不影响其余容器。
    async fn run_load_sequence(
        &self,
        container: &Arc<ModuleContainer>,
        target: Option<&[ModuleName]>,
    ) {
        if !self.targeted(container, target)
            || !container.initialized().await
            || container.is_loaded()
        {
            return;
        }

        let name = container.descriptor().name.clone();
        let module = match container.instance().await {
            Some(module) => module,
            None => return,
        };

        info!(module = %name, "开始加载模块");

        if let Err(e) = module.on_loading().await {
            warn!(module = %name, error = %e, "on_loading 钩子失败，模块保持未加载");
            return;
        }

        container.set_loaded(true);

        if let Err(e) = module.on_loaded().await {
            warn!(module = %name, error = %e, "on_loaded 钩子失败，模块回退为未加载");
            container.set_loaded(false);
            return;
        }

        info!(module = %name, "模块加载完成");
    }

    /// 处理器资格：已加载 ∧ 白名单放行 ∧ 模块声明可处理
    async fn eligible(
        &self,
        container: &Arc<ModuleContainer>,
        event: &dyn Event,
    ) -> Option<Arc<dyn Module>> {
        let module = self.eligible_observer(container, event).await?;
        if module.can_handle(event) {
            Some(module)
        } else {
            None
        }
    }

    /// 观察者资格：已加载 ∧ 白名单放行（不要求 can_handle）
    async fn eligible_observer(
        &self,
        container: &Arc<ModuleContainer>,
        event: &dyn Event,
    ) -> Option<Arc<dyn Module>> {
        if !container.is_loaded() {
            return None;
        }

        if let Some(allowlist) = event.handler_allowlist() {
            if !allowlist.contains(&container.descriptor().name) {
                return None;
            }
        }

        container.instance().await
    }

    /// 日志类事件和显式标记的事件不产生分发层跟踪输出
    fn suppress_trace(event: &dyn Event) -> bool {
        event.name().as_str().eq_ignore_ascii_case(LOGGING_EVENT_NAME)
            || event.meta().contains(META_SUPPRESS_LOG)
    }
}
