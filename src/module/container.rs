//! 模块容器
//!
//! 容器把一个模块描述符与其（可能还不存在的）活动实例绑在一起，
//! 负责实例的构造与释放。生命周期：已发现 → 已初始化（实例已构造）
//! → 已加载（钩子执行完毕、加载标志置位）→ 已卸载 → 已反初始化。
//!
//! 初始化失败不是致命错误：容器保持未初始化，之后的所有阶段都会
//! 跳过它。

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::module::contract::Module;
use crate::module::descriptor::ModuleDescriptor;
use crate::module::loader::{ModuleCandidate, ModuleLoader};

/// 模块容器
pub struct ModuleContainer {
    candidate: ModuleCandidate,
    instance: RwLock<Option<Arc<dyn Module>>>,
    loaded: AtomicBool,
}

impl ModuleContainer {
    /// 从候选创建容器（未初始化状态）
    pub fn new(candidate: ModuleCandidate) -> Self {
        Self {
            candidate,
            instance: RwLock::new(None),
            loaded: AtomicBool::new(false),
        }
    }

    /// 模块描述符
    pub fn descriptor(&self) -> &ModuleDescriptor {
        &self.candidate.descriptor
    }

    /// 候选所在位置
    pub fn location(&self) -> &Path {
        &self.candidate.location
    }

    /// 是否已初始化（实例已构造）
    pub async fn initialized(&self) -> bool {
        self.instance.read().await.is_some()
    }

    /// 是否已加载（已初始化且加载标志置位）
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    /// 当前模块实例
    pub async fn instance(&self) -> Option<Arc<dyn Module>> {
        self.instance.read().await.clone()
    }

    /// 构造模块实例
    ///
    /// 失败会被记录，容器保持未初始化，不向上传播。
    pub async fn initialize(&self, loader: &dyn ModuleLoader) {
        if self.initialized().await {
            return;
        }

        match loader.construct(&self.candidate).await {
            Ok(module) => {
                debug!(module = %self.descriptor().name, "模块实例化完成");
                *self.instance.write().await = Some(module);
            }
            Err(e) => {
                error!(
                    module = %self.descriptor().name,
                    location = %self.candidate.location.display(),
                    error = %e,
                    "模块实例化失败"
                );
            }
        }
    }

    /// 释放模块实例
    ///
    /// 丢弃实例引用并通知加载器释放资源；加载标志随之清除。
    pub async fn deinitialize(&self, loader: &dyn ModuleLoader) {
        self.loaded.store(false, Ordering::SeqCst);

        let had_instance = self.instance.write().await.take().is_some();
        if !had_instance {
            return;
        }

        if let Err(e) = loader.release(&self.candidate).await {
            error!(
                module = %self.descriptor().name,
                error = %e,
                "释放模块资源失败"
            );
        }
    }

    /// 置位/清除加载标志（仅生命周期管理方调用）
    pub(crate) fn set_loaded(&self, loaded: bool) {
        self.loaded.store(loaded, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for ModuleContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleContainer")
            .field("descriptor", &self.candidate.descriptor)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
