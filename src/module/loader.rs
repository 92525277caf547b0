//! 模块加载器契约
//!
//! 加载器是外部协作方：给定位置产出可构造的候选描述符，给定候选
//! 构造或释放模块实例。宿主核心不关心发现的具体机制，只要求同一
//! 位置快照下结果是确定的。
//!
//! [`StaticModuleLoader`] 是内置实现：显式注册（描述符, 工厂）对，
//! 适合编译期就确定模块集合的宿主；动态装载共享库的宿主可自行实现
//! [`ModuleLoader`]。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::module::contract::Module;
use crate::module::descriptor::{ModuleDescriptor, ModuleName};
use crate::utils::{HostError, Result};

/// 模块构造工厂
///
/// 构造可能失败（视为该候选在本会话内永久不可用）。
pub type ModuleFactory = Arc<dyn Fn() -> Result<Arc<dyn Module>> + Send + Sync>;

/// 发现阶段产出的候选模块
#[derive(Debug, Clone)]
pub struct ModuleCandidate {
    /// 候选的模块描述符
    pub descriptor: ModuleDescriptor,
    /// 候选所在位置
    pub location: PathBuf,
}

/// 模块加载器契约
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// 在指定位置发现候选模块
    ///
    /// `max_depth` 限制目录递归深度；非文件系统实现可忽略。
    async fn discover(&self, location: &Path, max_depth: usize) -> Result<Vec<ModuleCandidate>>;

    /// 从候选构造模块实例
    async fn construct(&self, candidate: &ModuleCandidate) -> Result<Arc<dyn Module>>;

    /// 释放候选占用的资源
    async fn release(&self, candidate: &ModuleCandidate) -> Result<()>;
}

/// 静态注册加载器
///
/// 由嵌入方在启动期注册（描述符, 工厂）对，`discover` 返回全部注册
/// 项，`construct` 调用对应工厂。
pub struct StaticModuleLoader {
    entries: RwLock<HashMap<ModuleName, (ModuleDescriptor, ModuleFactory)>>,
    order: RwLock<Vec<ModuleName>>,
}

impl StaticModuleLoader {
    /// 创建空的静态注册加载器
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            order: RwLock::new(Vec::new()),
        }
    }

    /// 注册一个模块
    ///
    /// # Errors
    ///
    /// 同名模块已注册时返回 [`HostError::DuplicateModule`]
    pub async fn register(
        &self,
        descriptor: ModuleDescriptor,
        factory: impl Fn() -> Result<Arc<dyn Module>> + Send + Sync + 'static,
    ) -> Result<()> {
        let name = descriptor.name.clone();

        let mut entries = self.entries.write().await;
        if entries.contains_key(&name) {
            return Err(HostError::DuplicateModule(name.to_string()));
        }

        debug!(module = %name, "注册模块工厂");
        entries.insert(name.clone(), (descriptor, Arc::new(factory)));
        self.order.write().await.push(name);
        Ok(())
    }

    /// 已注册的模块数量
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// 是否没有任何注册项
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for StaticModuleLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModuleLoader for StaticModuleLoader {
    async fn discover(&self, location: &Path, _max_depth: usize) -> Result<Vec<ModuleCandidate>> {
        let entries = self.entries.read().await;
        let order = self.order.read().await;

        // 按注册顺序返回，保证同一快照下结果确定
        Ok(order
            .iter()
            .filter_map(|name| entries.get(name))
            .map(|(descriptor, _)| ModuleCandidate {
                descriptor: descriptor.clone(),
                location: location.to_path_buf(),
            })
            .collect())
    }

    async fn construct(&self, candidate: &ModuleCandidate) -> Result<Arc<dyn Module>> {
        let entries = self.entries.read().await;
        let (_, factory) = entries.get(&candidate.descriptor.name).ok_or_else(|| {
            HostError::ModuleNotFound(candidate.descriptor.name.to_string())
        })?;
        factory()
    }

    async fn release(&self, _candidate: &ModuleCandidate) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version;

    struct NoopModule;

    #[async_trait]
    impl Module for NoopModule {
        fn can_handle(&self, _event: &dyn crate::event::Event) -> bool {
            false
        }

        async fn handle(&self, _event: &mut dyn crate::event::Event) -> Result<()> {
            Ok(())
        }
    }

    fn descriptor(name: &str) -> ModuleDescriptor {
        ModuleDescriptor::new(name, Version::new(1, 0, 0))
    }

    #[tokio::test]
    async fn test_register_and_discover() {
        let loader = StaticModuleLoader::new();
        loader
            .register(descriptor("a"), || Ok(Arc::new(NoopModule)))
            .await
            .unwrap();
        loader
            .register(descriptor("b"), || Ok(Arc::new(NoopModule)))
            .await
            .unwrap();

        let candidates = loader.discover(Path::new("."), 1).await.unwrap();
        assert_eq!(candidates.len(), 2);
        // 发现结果保持注册顺序
        assert_eq!(candidates[0].descriptor.name, ModuleName::new("a"));
        assert_eq!(candidates[1].descriptor.name, ModuleName::new("b"));
    }

    #[tokio::test]
    async fn test_register_duplicate_rejected() {
        let loader = StaticModuleLoader::new();
        loader
            .register(descriptor("dup"), || Ok(Arc::new(NoopModule)))
            .await
            .unwrap();

        let err = loader
            .register(descriptor("DUP"), || Ok(Arc::new(NoopModule)))
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::DuplicateModule(_)));
    }

    #[tokio::test]
    async fn test_construct_unknown_candidate() {
        let loader = StaticModuleLoader::new();
        let candidate = ModuleCandidate {
            descriptor: descriptor("ghost"),
            location: PathBuf::from("."),
        };

        let err = loader.construct(&candidate).await.unwrap_err();
        assert!(matches!(err, HostError::ModuleNotFound(_)));
    }

    #[tokio::test]
    async fn test_construct_factory_error_propagates() {
        let loader = StaticModuleLoader::new();
        loader
            .register(descriptor("broken"), || {
                Err(HostError::ModuleConstructFailed {
                    module: "broken".to_string(),
                    reason: "缺少配置".to_string(),
                })
            })
            .await
            .unwrap();

        let candidate = ModuleCandidate {
            descriptor: descriptor("broken"),
            location: PathBuf::from("."),
        };
        let err = loader.construct(&candidate).await.unwrap_err();
        assert!(matches!(err, HostError::ModuleConstructFailed { .. }));
    }
}
