//! 模块生命周期集成测试

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use semver::Version;

use jimu_host::{
    Event, HostConfig, Module, ModuleCollection, ModuleDescriptor, ModuleName, Result,
    StaticModuleLoader,
};

/// 记录生命周期钩子调用顺序
type Trace = Arc<Mutex<Vec<String>>>;

struct TracedModule {
    name: String,
    trace: Trace,
}

impl TracedModule {
    fn new(name: &str, trace: &Trace) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            trace: Arc::clone(trace),
        })
    }

    fn record(&self, hook: &str) {
        self.trace
            .lock()
            .unwrap()
            .push(format!("{}:{}", hook, self.name));
    }
}

#[async_trait]
impl Module for TracedModule {
    fn can_handle(&self, _event: &dyn Event) -> bool {
        false
    }

    async fn handle(&self, _event: &mut dyn Event) -> Result<()> {
        Ok(())
    }

    async fn on_loading(&self) -> Result<()> {
        self.record("loading");
        Ok(())
    }

    async fn on_loaded(&self) -> Result<()> {
        self.record("loaded");
        Ok(())
    }

    async fn on_all_modules_loaded(&self) {
        self.record("all_loaded");
    }

    async fn on_unloading(&self) -> Result<()> {
        self.record("unloading");
        Ok(())
    }

    async fn on_unloaded(&self) -> Result<()> {
        self.record("unloaded");
        Ok(())
    }
}

fn descriptor(name: &str) -> ModuleDescriptor {
    ModuleDescriptor::new(name, Version::new(1, 0, 0))
}

async fn register(loader: &StaticModuleLoader, descriptor: ModuleDescriptor, module: Arc<dyn Module>) {
    loader
        .register(descriptor, move || Ok(module.clone()))
        .await
        .unwrap();
}

fn collection(loader: Arc<StaticModuleLoader>) -> ModuleCollection {
    ModuleCollection::new(loader, HostConfig::default())
}

#[tokio::test]
async fn reimport_never_duplicates() {
    let trace: Trace = Arc::default();
    let loader = Arc::new(StaticModuleLoader::new());
    register(&loader, descriptor("a"), TracedModule::new("a", &trace)).await;
    register(&loader, descriptor("b"), TracedModule::new("b", &trace)).await;

    let collection = collection(loader);
    let first = collection.import_modules().await.unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(collection.len().await, 2);

    let second = collection.import_modules().await.unwrap();
    assert!(second.is_empty());
    assert_eq!(collection.len().await, 2);
    assert!(collection.has_module(&ModuleName::new("A")).await);
}

#[tokio::test]
async fn loaded_modules_sorted_by_handle_priority_stable() {
    let trace: Trace = Arc::default();
    let loader = Arc::new(StaticModuleLoader::new());

    let mut five = descriptor("five");
    five.handle_priority = 5;
    let mut one = descriptor("one");
    one.handle_priority = 1;
    let mut three_a = descriptor("three-a");
    three_a.handle_priority = 3;
    let mut three_b = descriptor("three-b");
    three_b.handle_priority = 3;

    for (d, n) in [(five, "five"), (one, "one"), (three_a, "three-a"), (three_b, "three-b")] {
        register(&loader, d, TracedModule::new(n, &trace)).await;
    }

    let collection = collection(loader);
    collection.import_modules().await.unwrap();
    collection.load_modules(None).await.unwrap();

    let loaded = collection.get_loaded_modules(None).await;
    let names: Vec<String> = loaded
        .iter()
        .map(|c| c.descriptor().name.to_string())
        .collect();
    // 相等优先级保持发现顺序
    assert_eq!(names, vec!["one", "three-a", "three-b", "five"]);
}

#[tokio::test]
async fn load_first_completes_before_others_begin() {
    let trace: Trace = Arc::default();
    let loader = Arc::new(StaticModuleLoader::new());

    // primary 的加载优先级更靠后，但 load_first 使其先完成整个加载序列
    let mut primary = descriptor("primary");
    primary.load_first = true;
    primary.load_priority = 10;
    let mut secondary = descriptor("secondary");
    secondary.load_priority = 0;
    secondary.dependencies = vec![ModuleName::new("primary")];

    register(&loader, primary, TracedModule::new("primary", &trace)).await;
    register(&loader, secondary, TracedModule::new("secondary", &trace)).await;

    let collection = collection(loader);
    collection.import_modules().await.unwrap();
    collection.load_modules(None).await.unwrap();

    let events = trace.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "loading:primary",
            "loaded:primary",
            "loading:secondary",
            "loaded:secondary",
            "all_loaded:primary",
            "all_loaded:secondary",
        ]
    );
}

#[tokio::test]
async fn unload_runs_in_forward_load_order() {
    let trace: Trace = Arc::default();
    let loader = Arc::new(StaticModuleLoader::new());

    let mut a = descriptor("a");
    a.load_priority = 0;
    let mut b = descriptor("b");
    b.load_priority = 1;

    register(&loader, a, TracedModule::new("a", &trace)).await;
    register(&loader, b, TracedModule::new("b", &trace)).await;

    let collection = collection(loader);
    collection.import_modules().await.unwrap();
    collection.load_modules(None).await.unwrap();
    trace.lock().unwrap().clear();

    collection.unload_modules(None).await.unwrap();

    let events = trace.lock().unwrap().clone();
    // 卸载沿权威加载顺序正向进行
    assert_eq!(
        events,
        vec!["unloading:a", "unloaded:a", "unloading:b", "unloaded:b"]
    );

    let loaded = collection.get_loaded_modules(None).await;
    assert!(loaded.is_empty());
}

#[tokio::test]
async fn load_unload_load_yields_same_loaded_set() {
    let trace: Trace = Arc::default();
    let loader = Arc::new(StaticModuleLoader::new());
    register(&loader, descriptor("a"), TracedModule::new("a", &trace)).await;
    register(&loader, descriptor("b"), TracedModule::new("b", &trace)).await;

    let collection = collection(loader);
    collection.import_modules().await.unwrap();

    collection.load_modules(None).await.unwrap();
    let first: Vec<String> = collection
        .get_loaded_modules(None)
        .await
        .iter()
        .map(|c| c.descriptor().name.to_string())
        .collect();

    collection.unload_modules(None).await.unwrap();
    collection.load_modules(None).await.unwrap();
    let second: Vec<String> = collection
        .get_loaded_modules(None)
        .await
        .iter()
        .map(|c| c.descriptor().name.to_string())
        .collect();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[tokio::test]
async fn missing_dependency_warns_but_loads() {
    let trace: Trace = Arc::default();
    let loader = Arc::new(StaticModuleLoader::new());

    let mut needy = descriptor("needy");
    needy.dependencies = vec![ModuleName::new("ghost")];
    register(&loader, needy, TracedModule::new("needy", &trace)).await;

    let collection = collection(loader);
    collection.import_modules().await.unwrap();
    collection.load_modules(None).await.unwrap();

    let loaded = collection.get_loaded_modules(None).await;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].descriptor().name, ModuleName::new("needy"));
}

#[tokio::test]
async fn auto_load_false_requires_explicit_target() {
    let trace: Trace = Arc::default();
    let loader = Arc::new(StaticModuleLoader::new());

    let mut manual = descriptor("manual");
    manual.auto_load = false;
    register(&loader, manual, TracedModule::new("manual", &trace)).await;
    register(&loader, descriptor("auto"), TracedModule::new("auto", &trace)).await;

    let collection = collection(loader);
    collection.import_modules().await.unwrap();

    collection.load_modules(None).await.unwrap();
    let loaded = collection.get_loaded_modules(None).await;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].descriptor().name, ModuleName::new("auto"));

    // 显式给出名称后照常加载，未列出的容器保持现状
    let target = vec![ModuleName::new("manual")];
    collection.load_modules(Some(&target)).await.unwrap();
    assert_eq!(collection.get_loaded_modules(None).await.len(), 2);
}

#[tokio::test]
async fn invalid_descriptor_skipped_unless_strict() {
    let trace: Trace = Arc::default();
    let loader = Arc::new(StaticModuleLoader::new());
    register(&loader, descriptor("good"), TracedModule::new("good", &trace)).await;
    register(
        &loader,
        descriptor("bad name"),
        TracedModule::new("bad", &trace),
    )
    .await;

    let lenient = ModuleCollection::new(loader.clone(), HostConfig::default());
    lenient.import_modules().await.unwrap();
    assert_eq!(lenient.len().await, 1);

    let strict = ModuleCollection::new(loader, HostConfig::builder().strict().build());
    assert!(strict.import_modules().await.is_err());
}

#[tokio::test]
async fn failing_construction_degrades_gracefully() {
    let trace: Trace = Arc::default();
    let loader = Arc::new(StaticModuleLoader::new());
    register(&loader, descriptor("ok"), TracedModule::new("ok", &trace)).await;
    loader
        .register(descriptor("broken"), || {
            Err(jimu_host::HostError::ModuleConstructFailed {
                module: "broken".to_string(),
                reason: "测试".to_string(),
            })
        })
        .await
        .unwrap();

    let collection = collection(loader);
    collection.import_modules().await.unwrap();
    collection.load_modules(None).await.unwrap();

    // 实例化失败的候选被跳过，其余模块照常可用
    assert_eq!(collection.len().await, 2);
    let loaded = collection.get_loaded_modules(None).await;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].descriptor().name, ModuleName::new("ok"));
}

#[tokio::test]
async fn reload_with_same_target() {
    let trace: Trace = Arc::default();
    let loader = Arc::new(StaticModuleLoader::new());
    register(&loader, descriptor("m"), TracedModule::new("m", &trace)).await;

    let collection = collection(loader);
    collection.import_modules().await.unwrap();
    collection.load_modules(None).await.unwrap();
    trace.lock().unwrap().clear();

    collection.reload_modules(None).await.unwrap();

    let events = trace.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "unloading:m",
            "unloaded:m",
            "loading:m",
            "loaded:m",
            "all_loaded:m",
        ]
    );
}
