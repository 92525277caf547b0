//! 模块契约
//!
//! 可插拔单元需要实现 [`Module`]：声明能处理哪些事件、如何处理，
//! 以及可选的生命周期钩子和前/后观察钩子。
//!
//! 宿主对单个事件的分发是顺序的，处理器之间不会并发；模块内部
//! 状态如需跨事件共享，自行使用内部可变性。

use async_trait::async_trait;

use crate::event::Event;
use crate::utils::Result;

/// 模块契约
///
/// 除 [`Module::can_handle`] 和 [`Module::handle`] 外全部有默认实现。
///
/// 生命周期钩子的调用顺序：`on_loading` → （宿主置加载标志）→
/// `on_loaded` → （全部目标模块加载完毕后）`on_all_modules_loaded`；
/// 卸载时 `on_unloading` → （清除加载标志）→ `on_unloaded`。
#[async_trait]
pub trait Module: Send + Sync {
    /// 是否能处理该事件
    ///
    /// 分发前逐事件询问；返回 false 的模块不会收到该事件。
    fn can_handle(&self, event: &dyn Event) -> bool;

    /// 处理事件
    ///
    /// 设置 `event.set_handled(true)` 会终止后续优先级更低模块的分发
    /// （广播类事件除外）。返回错误会原样传播给分发的调用方。
    async fn handle(&self, event: &mut dyn Event) -> Result<()>;

    /// 模块开始加载
    async fn on_loading(&self) -> Result<()> {
        Ok(())
    }

    /// 模块加载完成（此时加载标志已置位，可以向本模块分发事件）
    async fn on_loaded(&self) -> Result<()> {
        Ok(())
    }

    /// 本轮目标集合内的全部模块都已加载完成
    async fn on_all_modules_loaded(&self) {}

    /// 模块开始卸载
    async fn on_unloading(&self) -> Result<()> {
        Ok(())
    }

    /// 模块卸载完成（加载标志已清除）
    async fn on_unloaded(&self) -> Result<()> {
        Ok(())
    }

    /// 是否希望在主处理阶段之前观察该事件
    fn wants_pre_handle(&self, _event: &dyn Event) -> bool {
        false
    }

    /// 前观察钩子，在所有主处理器之前调用（观察者之间无序）
    async fn pre_handle(&self, _event: &mut dyn Event) {}

    /// 是否希望在主处理阶段之后观察该事件
    fn wants_post_handle(&self, _event: &dyn Event) -> bool {
        false
    }

    /// 后观察钩子，在主处理阶段结束后调用（观察者之间无序）
    async fn post_handle(&self, _event: &mut dyn Event) {}
}

impl std::fmt::Debug for dyn Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module").finish_non_exhaustive()
    }
}
