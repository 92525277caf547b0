//! 模块管理模块
//!
//! 包含模块生命周期管理的核心组件：
//! - 模块契约（处理器 + 生命周期钩子）
//! - 模块名称与描述符
//! - 模块容器
//! - 模块集合（导入/加载/卸载/分发扇出）
//! - 加载器契约与静态注册加载器

pub mod collection;
pub mod container;
pub mod contract;
pub mod descriptor;
pub mod loader;

// 重导出常用类型
pub use collection::ModuleCollection;
pub use container::ModuleContainer;
pub use contract::Module;
pub use descriptor::{ModuleDescriptor, ModuleName};
pub use loader::{ModuleCandidate, ModuleFactory, ModuleLoader, StaticModuleLoader};
