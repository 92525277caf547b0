//! 基本使用示例
//!
//! 本示例展示了积木模块宿主的基本使用方法，包括：
//!
//! - 注册模块并创建宿主
//! - 导入和加载模块
//! - 分发事件并读取结果
//! - 以事件形式分发日志
//!
//! # 运行示例
//!
//! ```bash
//! cargo run --example basic_usage
//! ```

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use semver::Version;
use serde_json::json;

use jimu_host::{
    downcast_ref, Event, EventCore, EventMeta, EventName, HostConfig, LoggingEvent, Module,
    ModuleDescriptor, ModuleHost, Result, Severity, StaticModuleLoader,
};

/// 问候事件：携带一个名字，处理后得到一句问候语
struct GreetingEvent {
    core: EventCore,
    who: String,
    greeting: Option<String>,
}

impl GreetingEvent {
    fn new(who: &str) -> Self {
        Self {
            core: EventCore::new("demo.greeting"),
            who: who.to_string(),
            greeting: None,
        }
    }
}

impl Event for GreetingEvent {
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

/// 处理问候事件的模块
struct GreeterModule;

#[async_trait]
impl Module for GreeterModule {
    fn can_handle(&self, event: &dyn Event) -> bool {
        downcast_ref::<GreetingEvent>(event).is_some()
    }

    async fn handle(&self, event: &mut dyn Event) -> Result<()> {
        if let Some(greeting) = jimu_host::downcast_mut::<GreetingEvent>(event) {
            greeting.greeting = Some(format!("你好，{}！", greeting.who));
            greeting.set_handled(true);
        }
        Ok(())
    }
}

/// 把日志事件打印到标准输出的日志模块
struct ConsoleLogModule;

#[async_trait]
impl Module for ConsoleLogModule {
    fn can_handle(&self, event: &dyn Event) -> bool {
        downcast_ref::<LoggingEvent>(event).is_some()
    }

    async fn handle(&self, event: &mut dyn Event) -> Result<()> {
        if let Some(log) = downcast_ref::<LoggingEvent>(event) {
            let rendered: Vec<String> = log.arguments.iter().map(ToString::to_string).collect();
            println!("   [{}] {}", log.severity, rendered.join(" "));
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== 积木模块宿主基本使用示例 ===\n");

    // -------------------------------------------------------------------------
    // 1. 注册模块并创建宿主
    // -------------------------------------------------------------------------
    println!("1. 注册模块并创建宿主...");

    let loader = Arc::new(StaticModuleLoader::new());

    let mut greeter = ModuleDescriptor::new("greeter", Version::new(1, 0, 0));
    greeter.description = "问候事件处理模块".to_string();
    loader.register(greeter, || Ok(Arc::new(GreeterModule))).await?;

    let mut console_log = ModuleDescriptor::new("console-log", Version::new(1, 0, 0));
    console_log.load_first = true;
    loader
        .register(console_log, || Ok(Arc::new(ConsoleLogModule)))
        .await?;

    let config = HostConfig::builder().application_name("demo-app").build();
    let host = Arc::new(ModuleHost::new(config, loader));
    println!("   应用名称: {}", host.application_name());

    // -------------------------------------------------------------------------
    // 2. 导入和加载模块
    // -------------------------------------------------------------------------
    println!("\n2. 导入和加载模块...");

    let imported = host.modules().import_modules().await?;
    println!("   导入了 {} 个模块:", imported.len());
    for name in &imported {
        println!("   - {name}");
    }

    host.modules().load_modules(None).await?;
    let loaded = host.modules().get_loaded_modules(None).await;
    println!("   已加载 {} 个模块", loaded.len());

    // -------------------------------------------------------------------------
    // 3. 分发事件并读取结果
    // -------------------------------------------------------------------------
    println!("\n3. 分发问候事件...");

    let mut event = GreetingEvent::new("世界");
    host.handle(&mut event).await?;

    println!("   已处理: {}", event.handled());
    if let Some(greeting) = &event.greeting {
        println!("   问候语: {greeting}");
    }
    if let Some(id) = event.meta().get(jimu_host::event::META_ID) {
        println!("   事件 ID: {id}");
    }
    if let Some(timings) = event.meta().get(jimu_host::event::META_HANDLERS) {
        println!("   处理器耗时: {timings}");
    }

    // -------------------------------------------------------------------------
    // 4. 以事件形式分发日志
    // -------------------------------------------------------------------------
    println!("\n4. 以事件形式分发日志...");

    host.log(
        Severity::Information,
        vec![json!("示例运行完毕"), json!({"events": 1})],
    )
    .await;

    // -------------------------------------------------------------------------
    // 5. 卸载模块
    // -------------------------------------------------------------------------
    println!("\n5. 卸载模块...");

    host.modules().unload_modules(None).await?;
    println!(
        "   剩余已加载模块: {}",
        host.modules().get_loaded_modules(None).await.len()
    );

    println!("\n=== 示例结束 ===");
    Ok(())
}
