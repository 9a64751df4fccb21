//! 应用上下文
//!
//! 状态机：`Uninitialized -> Refreshing -> Active -> Stopped -> Closed`，刷新失败进入 `Failed`。
//! `refresh`、`start`、`stop`、`close` 共用一把结构锁，任意时刻只有一个结构性操作在执行；
//! 获取 bean 不需要结构锁。刷新期间只有刷新线程自身（感知回调、后置处理器、构造函数）可以获取 bean。

use crate::aware::AwareProcessor;
use crate::events::{EventMulticaster, ListenerDetector};
use crate::factory::{capability_view, target_metadata, DefaultBeanFactory};
use crate::parser::ConfigurationClassPostProcessor;
use crate::pipeline::PostProcessorPipeline;
use crate::registry::DefaultBeanDefinitionRegistry;
use crate::scope::{ScopeResolver, ThreadScope};
use crate::weaver::ProxyWeaver;
use chrono::{DateTime, Utc};
use di_abstractions::{
    typed, ApplicationListener, BeanDefinitionRegistry, BeanDefinitionRegistryPostProcessor,
    BeanFactoryPostProcessor, BeanLookup, BeanPostProcessor, CircularDependencyDetector,
    ComponentScanner, ConfigurableBeanFactory, ContextEvent, ContextEventKind,
    DefaultCircularDependencyDetector, Scope, TypeDescriptor,
};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::any::TypeId;
use std::fmt;
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use tracing::{debug, error, info, warn};
use weave_aop::{Advisor, AopProxy};
use weave_common::{
    Bean, BeanView, ContainerConfig, ContainerError, ContainerResult, ContextState,
    CreationState, Lifecycle, NamingConventions, TypeInfo, SCOPE_THREAD,
};

/// 一次刷新产生的运行时
struct Runtime {
    factory: Arc<DefaultBeanFactory>,
    multicaster: Arc<EventMulticaster>,
}

/// 刷新之前收集的配置来源
#[derive(Clone, Default)]
struct Sources {
    components: Vec<Arc<TypeDescriptor>>,
    packages: Vec<String>,
    scanners: Vec<Arc<dyn ComponentScanner>>,
    registry_processors: Vec<Arc<dyn BeanDefinitionRegistryPostProcessor>>,
    factory_processors: Vec<Arc<dyn BeanFactoryPostProcessor>>,
    bean_processors: Vec<Arc<dyn BeanPostProcessor>>,
    advisors: Vec<Arc<Advisor>>,
    listeners: Vec<Arc<dyn ApplicationListener>>,
    scopes: Vec<(String, Arc<dyn Scope>)>,
}

struct ContextShared {
    id: String,
    config: ContainerConfig,
    structural: Mutex<()>,
    state: RwLock<ContextState>,
    startup_date: RwLock<Option<DateTime<Utc>>>,
    sources: RwLock<Sources>,
    runtime: RwLock<Option<Arc<Runtime>>>,
    refreshing_thread: RwLock<Option<ThreadId>>,
}

impl ContextShared {
    fn runtime(&self) -> ContainerResult<Arc<Runtime>> {
        let state = self.state();
        let accessible = match state {
            ContextState::Refreshing => {
                *self.refreshing_thread.read() == Some(thread::current().id())
            }
            other => other.is_usable(),
        };
        let runtime = if accessible {
            self.runtime.read().clone()
        } else {
            None
        };
        runtime.ok_or_else(|| {
            ContainerError::lifecycle(format!("上下文 {} 不可用，当前状态: {:?}", self.id, state))
        })
    }

    fn state(&self) -> ContextState {
        *self.state.read()
    }

    fn set_state(&self, state: ContextState) {
        let previous = std::mem::replace(&mut *self.state.write(), state);
        if previous != state {
            debug!("上下文 {} 状态变更: {:?} -> {:?}", self.id, previous, state);
        }
    }

    fn ensure_configurable(&self, action: &str) -> ContainerResult<()> {
        let state = self.state();
        if state.is_usable() || state == ContextState::Refreshing {
            return Err(ContainerError::lifecycle(format!(
                "上下文 {} 已刷新 ({state:?})，不能{action}",
                self.id
            )));
        }
        Ok(())
    }

    fn publish(&self, runtime: &Runtime, kind: ContextEventKind) {
        runtime.multicaster.multicast(&ContextEvent::new(kind, &self.id));
    }

    fn refresh(self: &Arc<Self>) -> ContainerResult<()> {
        let _guard = self.structural.lock();
        let state = self.state();
        if matches!(
            state,
            ContextState::Active | ContextState::Stopped | ContextState::Closed
        ) && !self.config.refreshable
        {
            return Err(ContainerError::lifecycle(format!(
                "上下文 {} 不支持重复刷新，当前状态: {:?}",
                self.id, state
            )));
        }
        if state.is_usable() {
            info!("重新刷新上下文 {}，丢弃现有的 bean", self.id);
            self.shutdown_runtime(state);
        }

        let sources = self.sources.read().clone();
        let started = Utc::now();
        *self.refreshing_thread.write() = Some(thread::current().id());
        self.set_state(ContextState::Refreshing);
        let result = self.do_refresh(&sources);
        *self.refreshing_thread.write() = None;
        match result {
            Ok(runtime) => {
                self.set_state(ContextState::Active);
                *self.startup_date.write() = Some(started);
                info!(
                    "上下文 {} 刷新完成，共 {} 个 bean 定义，耗时 {} ms",
                    self.id,
                    runtime.factory.registry().get_bean_definition_count(),
                    (Utc::now() - started).num_milliseconds()
                );
                self.publish(&runtime, ContextEventKind::Refreshed);
                Ok(())
            }
            Err(e) => {
                error!("上下文 {} 刷新失败: {}", self.id, e);
                if let Some(runtime) = self.runtime.write().take() {
                    runtime.factory.destroy_singletons();
                }
                self.set_state(ContextState::Failed);
                Err(e)
            }
        }
    }

    fn do_refresh(self: &Arc<Self>, sources: &Sources) -> ContainerResult<Arc<Runtime>> {
        self.config.validate()?;
        info!("开始刷新上下文: {} ({})", self.config.display_name, self.id);

        let registry = Arc::new(DefaultBeanDefinitionRegistry::new(
            self.config.allow_definition_overriding,
        ));
        let factory = DefaultBeanFactory::new(registry.clone());
        let multicaster = Arc::new(EventMulticaster::new());
        for listener in &sources.listeners {
            multicaster.add_listener(None, listener.clone());
        }
        let runtime = Arc::new(Runtime {
            factory: factory.clone(),
            multicaster: multicaster.clone(),
        });
        *self.runtime.write() = Some(runtime.clone());

        let handle: Arc<dyn BeanLookup> = Arc::new(ContextHandle {
            shared: Arc::downgrade(self),
        });
        factory.register_resolvable_dependency(
            TypeInfo::of::<dyn BeanLookup>(),
            Arc::new(handle.clone()) as BeanView,
        );
        factory.register_scope(SCOPE_THREAD, Arc::new(ThreadScope::new()));
        for (name, scope) in &sources.scopes {
            factory.register_scope(name, scope.clone());
        }

        if sources.scanners.is_empty() && !sources.packages.is_empty() {
            warn!("上下文 {} 没有组件扫描器，包 {:?} 不会被扫描", self.id, sources.packages);
        }
        let parser = Arc::new(ConfigurationClassPostProcessor::new(
            self.config.clone(),
            sources.scanners.clone(),
            sources.packages.clone(),
        ));
        let registered = parser.register_components(registry.as_ref(), &sources.components)?;
        debug!("注册组件: {:?}", registered);

        let report = PostProcessorPipeline::new(factory.clone(), self.config.max_post_processor_rounds)
            .with_parser(parser)
            .with_registry_processors(sources.registry_processors.clone())
            .with_factory_processors(sources.factory_processors.clone())
            .run()?;
        debug!("后置处理器执行顺序: {:?}", report.invoked);

        ScopeResolver::validate_scopes(registry.as_ref(), |scope| factory.has_scope(scope))?;
        let detector = DefaultCircularDependencyDetector;
        detector.detect_circular_dependencies(&detector.build_dependency_graph(registry.as_ref()))?;

        factory.add_bean_post_processor(Arc::new(AwareProcessor::new(handle)));
        for processor in &sources.bean_processors {
            factory.add_bean_post_processor(processor.clone());
        }
        for (name, processor) in Self::post_processor_beans(&factory)? {
            debug!("注册 bean 后置处理器 bean: {}", name);
            factory.add_bean_post_processor(processor);
        }
        factory.add_bean_post_processor(Arc::new(ListenerDetector::new(multicaster.clone())));
        if ProxyWeaver::is_enabled(&self.config, registry.as_ref(), !sources.advisors.is_empty()) {
            factory.add_bean_post_processor(Arc::new(ProxyWeaver::new(
                &factory,
                sources.advisors.clone(),
            )));
        }

        registry.freeze();
        factory.preinstantiate_singletons()?;
        Self::register_listener_beans(&factory, &multicaster)?;
        Ok(runtime)
    }

    /// 注册表中的 bean 后置处理器，按排序值排列
    fn post_processor_beans(
        factory: &DefaultBeanFactory,
    ) -> ContainerResult<Vec<(String, Arc<dyn BeanPostProcessor>)>> {
        let registry = factory.registry();
        let type_info = TypeInfo::of::<dyn BeanPostProcessor>();
        let mut found = Vec::new();
        for name in registry.names_for_type(TypeId::of::<dyn BeanPostProcessor>()) {
            let definition =
                registry.get_bean_definition(NamingConventions::transformed_bean_name(&name))?;
            let view = factory.get_view(&name, &type_info)?;
            let processor = typed::<dyn BeanPostProcessor>(&name, &view, &type_info)?;
            found.push((definition.order, name, processor));
        }
        found.sort_by_key(|(order, _, _)| *order);
        Ok(found
            .into_iter()
            .map(|(_, name, processor)| (name, processor))
            .collect())
    }

    /// 已创建的单例监听器加入广播器
    fn register_listener_beans(
        factory: &DefaultBeanFactory,
        multicaster: &EventMulticaster,
    ) -> ContainerResult<()> {
        let type_info = TypeInfo::of::<dyn ApplicationListener>();
        for name in factory
            .registry()
            .names_for_type(TypeId::of::<dyn ApplicationListener>())
        {
            let canonical = NamingConventions::transformed_bean_name(&name);
            if factory.creation_state(canonical) != CreationState::Created
                || !factory.is_singleton(canonical)?
            {
                continue;
            }
            let view = factory.get_view(&name, &type_info)?;
            let listener = typed::<dyn ApplicationListener>(&name, &view, &type_info)?;
            multicaster.add_listener(Some(&name), listener);
        }
        Ok(())
    }

    /// 已创建的单例中暴露 `dyn Lifecycle` 的 bean
    ///
    /// 被代理的 bean 直接对目标对象回调。
    fn lifecycle_beans(factory: &DefaultBeanFactory) -> ContainerResult<Vec<(String, Arc<dyn Lifecycle>)>> {
        let registry = factory.registry();
        let mut beans = Vec::new();
        for name in registry.names_for_type(TypeId::of::<dyn Lifecycle>()) {
            let canonical = NamingConventions::transformed_bean_name(&name);
            let definition = registry.get_bean_definition(canonical)?;
            if !definition.is_singleton() || factory.creation_state(canonical) != CreationState::Created {
                continue;
            }
            let bean = factory.get_bean_by_name(&name)?;
            let bean: Bean = match bean.downcast_ref::<AopProxy>() {
                Some(proxy) => proxy.target().map_err(|e| {
                    ContainerError::lifecycle(format!("无法获取 bean {name} 的代理目标: {e:#}"))
                })?,
                None => bean.clone(),
            };
            if let Some(lifecycle) =
                capability_view::<dyn Lifecycle>(target_metadata(&definition, &bean), &bean)
            {
                beans.push((name, lifecycle));
            }
        }
        Ok(beans)
    }

    fn stop_lifecycle_beans(&self, factory: &DefaultBeanFactory) {
        let mut beans = match Self::lifecycle_beans(factory) {
            Ok(beans) => beans,
            Err(e) => {
                error!("上下文 {} 收集生命周期 bean 失败: {}", self.id, e);
                return;
            }
        };
        beans.sort_by_key(|(_, bean)| std::cmp::Reverse(bean.phase()));
        for (name, bean) in beans {
            if !bean.is_running() {
                continue;
            }
            debug!("停止 bean: {} (phase {})", name, bean.phase());
            if let Err(e) = bean.stop() {
                error!("停止 bean {} 失败: {:#}", name, e);
            }
        }
    }

    fn shutdown_runtime(&self, state: ContextState) {
        let runtime = self.runtime.write().take();
        if let Some(runtime) = runtime {
            if state == ContextState::Active {
                self.stop_lifecycle_beans(&runtime.factory);
            }
            runtime.factory.destroy_singletons();
        }
    }

    fn start(&self) -> ContainerResult<()> {
        let _guard = self.structural.lock();
        let state = self.state();
        if !state.is_usable() {
            return Err(ContainerError::lifecycle(format!(
                "上下文 {} 当前状态为 {:?}，不能启动",
                self.id, state
            )));
        }
        let runtime = self.runtime()?;
        let mut beans = Self::lifecycle_beans(&runtime.factory)?;
        beans.sort_by_key(|(_, bean)| bean.phase());
        for (name, bean) in beans {
            if bean.is_running() {
                continue;
            }
            debug!("启动 bean: {} (phase {})", name, bean.phase());
            bean.start()
                .map_err(|e| ContainerError::lifecycle(format!("启动 bean {name} 失败: {e:#}")))?;
        }
        self.set_state(ContextState::Active);
        info!("上下文 {} 已启动", self.id);
        self.publish(&runtime, ContextEventKind::Started);
        Ok(())
    }

    fn stop(&self) -> ContainerResult<()> {
        let _guard = self.structural.lock();
        match self.state() {
            ContextState::Stopped => return Ok(()),
            ContextState::Active => {}
            other => {
                return Err(ContainerError::lifecycle(format!(
                    "上下文 {} 当前状态为 {:?}，不能停止",
                    self.id, other
                )))
            }
        }
        let runtime = self.runtime()?;
        self.stop_lifecycle_beans(&runtime.factory);
        self.set_state(ContextState::Stopped);
        info!("上下文 {} 已停止", self.id);
        self.publish(&runtime, ContextEventKind::Stopped);
        Ok(())
    }

    fn close(&self) {
        let _guard = self.structural.lock();
        let state = self.state();
        if state == ContextState::Closed {
            return;
        }
        if state.is_usable() {
            if let Ok(runtime) = self.runtime() {
                self.publish(&runtime, ContextEventKind::Closed);
            }
        }
        self.shutdown_runtime(state);
        self.set_state(ContextState::Closed);
        info!("上下文 {} 已关闭", self.id);
    }
}

impl BeanLookup for ContextShared {
    fn get_bean_by_name(&self, name: &str) -> ContainerResult<Bean> {
        self.runtime()?.factory.get_bean_by_name(name)
    }

    fn get_view(&self, type_info: &TypeInfo, qualifier: Option<&str>) -> ContainerResult<BeanView> {
        self.runtime()?.factory.resolve_view(type_info, qualifier)
    }

    fn get_named_view(&self, name: &str, type_info: &TypeInfo) -> ContainerResult<BeanView> {
        self.runtime()?.factory.get_view(name, type_info)
    }

    fn get_views_of_type(&self, type_info: &TypeInfo) -> ContainerResult<Vec<(String, BeanView)>> {
        self.runtime()?.factory.get_views_of_type(type_info)
    }

    fn contains_bean(&self, name: &str) -> bool {
        self.runtime()
            .is_ok_and(|runtime| runtime.factory.contains_bean(name))
    }

    fn get_bean_definition_count(&self) -> usize {
        self.runtime()
            .map_or(0, |runtime| runtime.factory.registry().get_bean_definition_count())
    }

    fn get_bean_definition_names(&self) -> Vec<String> {
        self.runtime()
            .map(|runtime| runtime.factory.registry().get_bean_definition_names())
            .unwrap_or_default()
    }

    fn publish_event(&self, name: &str, payload: Value) -> ContainerResult<()> {
        let runtime = self.runtime()?;
        self.publish(
            &runtime,
            ContextEventKind::Custom {
                name: name.to_string(),
                payload,
            },
        );
        Ok(())
    }

    fn context_id(&self) -> String {
        self.id.clone()
    }
}

/// 交给 bean 的上下文句柄，只持有弱引用
#[derive(Clone)]
struct ContextHandle {
    shared: Weak<ContextShared>,
}

impl ContextHandle {
    fn upgrade(&self) -> ContainerResult<Arc<ContextShared>> {
        self.shared
            .upgrade()
            .ok_or_else(|| ContainerError::lifecycle("上下文已释放"))
    }
}

impl BeanLookup for ContextHandle {
    fn get_bean_by_name(&self, name: &str) -> ContainerResult<Bean> {
        self.upgrade()?.get_bean_by_name(name)
    }

    fn get_view(&self, type_info: &TypeInfo, qualifier: Option<&str>) -> ContainerResult<BeanView> {
        self.upgrade()?.get_view(type_info, qualifier)
    }

    fn get_named_view(&self, name: &str, type_info: &TypeInfo) -> ContainerResult<BeanView> {
        self.upgrade()?.get_named_view(name, type_info)
    }

    fn get_views_of_type(&self, type_info: &TypeInfo) -> ContainerResult<Vec<(String, BeanView)>> {
        self.upgrade()?.get_views_of_type(type_info)
    }

    fn contains_bean(&self, name: &str) -> bool {
        self.upgrade()
            .is_ok_and(|shared| shared.contains_bean(name))
    }

    fn get_bean_definition_count(&self) -> usize {
        self.upgrade()
            .map_or(0, |shared| shared.get_bean_definition_count())
    }

    fn get_bean_definition_names(&self) -> Vec<String> {
        self.upgrade()
            .map(|shared| shared.get_bean_definition_names())
            .unwrap_or_default()
    }

    fn publish_event(&self, name: &str, payload: Value) -> ContainerResult<()> {
        self.upgrade()?.publish_event(name, payload)
    }

    fn context_id(&self) -> String {
        self.upgrade()
            .map(|shared| shared.id.clone())
            .unwrap_or_default()
    }
}

/// 应用上下文
///
/// 收集配置来源，刷新时构建注册表和 bean 工厂，并管理整个生命周期。
/// 释放时自动关闭。
pub struct ApplicationContext {
    shared: Arc<ContextShared>,
}

impl ApplicationContext {
    /// 创建尚未刷新的上下文
    pub fn new(config: ContainerConfig) -> Self {
        let id = config
            .id
            .clone()
            .unwrap_or_else(|| format!("{}-{}", config.display_name, uuid::Uuid::new_v4()));
        info!("创建应用上下文: {}", id);
        Self {
            shared: Arc::new(ContextShared {
                id,
                config,
                structural: Mutex::new(()),
                state: RwLock::new(ContextState::Uninitialized),
                startup_date: RwLock::new(None),
                sources: RwLock::new(Sources::default()),
                runtime: RwLock::new(None),
                refreshing_thread: RwLock::new(None),
            }),
        }
    }

    /// 注册组件并立即刷新
    pub fn with_components(
        config: ContainerConfig,
        components: &[Arc<TypeDescriptor>],
    ) -> ContainerResult<Self> {
        let context = Self::new(config);
        context.register(components)?;
        context.refresh()?;
        Ok(context)
    }

    fn configure(&self, action: &str, apply: impl FnOnce(&mut Sources)) -> ContainerResult<()> {
        self.shared.ensure_configurable(action)?;
        apply(&mut *self.shared.sources.write());
        Ok(())
    }

    /// 注册组件类型
    pub fn register(&self, components: &[Arc<TypeDescriptor>]) -> ContainerResult<()> {
        self.configure("注册组件", |sources| {
            sources.components.extend(components.iter().cloned());
        })
    }

    /// 添加要扫描的包
    pub fn scan(&self, packages: &[&str]) -> ContainerResult<()> {
        self.configure("添加扫描包", |sources| {
            sources
                .packages
                .extend(packages.iter().map(|package| (*package).to_string()));
        })
    }

    /// 添加组件扫描器
    pub fn add_scanner(&self, scanner: Arc<dyn ComponentScanner>) -> ContainerResult<()> {
        debug!("添加组件扫描器: {}", scanner.name());
        self.configure("添加组件扫描器", |sources| sources.scanners.push(scanner))
    }

    /// 添加注册表后置处理器
    pub fn add_bean_definition_registry_post_processor(
        &self,
        processor: Arc<dyn BeanDefinitionRegistryPostProcessor>,
    ) -> ContainerResult<()> {
        self.configure("添加注册表后置处理器", |sources| {
            sources.registry_processors.push(processor);
        })
    }

    /// 添加工厂后置处理器
    pub fn add_bean_factory_post_processor(
        &self,
        processor: Arc<dyn BeanFactoryPostProcessor>,
    ) -> ContainerResult<()> {
        self.configure("添加工厂后置处理器", |sources| {
            sources.factory_processors.push(processor);
        })
    }

    /// 添加 bean 后置处理器
    pub fn add_bean_post_processor(&self, processor: Arc<dyn BeanPostProcessor>) -> ContainerResult<()> {
        self.configure("添加 bean 后置处理器", |sources| {
            sources.bean_processors.push(processor);
        })
    }

    /// 添加通知器，同时启用代理织入
    pub fn add_advisor(&self, advisor: Arc<Advisor>) -> ContainerResult<()> {
        self.configure("添加通知器", |sources| sources.advisors.push(advisor))
    }

    /// 添加事件监听器
    pub fn add_application_listener(
        &self,
        listener: Arc<dyn ApplicationListener>,
    ) -> ContainerResult<()> {
        self.configure("添加事件监听器", |sources| sources.listeners.push(listener))
    }

    /// 注册自定义作用域
    pub fn register_scope(&self, name: &str, scope: Arc<dyn Scope>) -> ContainerResult<()> {
        self.configure("注册作用域", |sources| {
            sources.scopes.push((name.to_string(), scope));
        })
    }

    /// 刷新上下文
    ///
    /// 失败时销毁本次刷新创建的单例，上下文进入 `Failed` 状态并返回原始错误。
    pub fn refresh(&self) -> ContainerResult<()> {
        self.shared.refresh()
    }

    /// 启动生命周期 bean
    pub fn start(&self) -> ContainerResult<()> {
        self.shared.start()
    }

    /// 停止生命周期 bean，不影响已创建的 bean
    pub fn stop(&self) -> ContainerResult<()> {
        self.shared.stop()
    }

    /// 关闭上下文，重复调用无效果
    pub fn close(&self) {
        self.shared.close();
    }

    fn lookup_ref(&self) -> &dyn BeanLookup {
        self.shared.as_ref()
    }

    /// 按类型获取 bean
    pub fn get_bean<T: ?Sized + Send + Sync + 'static>(&self) -> ContainerResult<Arc<T>> {
        self.lookup_ref().get::<T>()
    }

    /// 按名称获取 bean 并转换为指定类型
    pub fn get_bean_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> ContainerResult<Arc<T>> {
        self.lookup_ref().get_named::<T>(name)
    }

    /// 按类型和限定符获取 bean
    pub fn get_bean_qualified<T: ?Sized + Send + Sync + 'static>(
        &self,
        qualifier: &str,
    ) -> ContainerResult<Arc<T>> {
        self.lookup_ref().get_qualified::<T>(qualifier)
    }

    /// 按名称获取 bean
    pub fn get_bean_by_name(&self, name: &str) -> ContainerResult<Bean> {
        self.shared.get_bean_by_name(name)
    }

    /// 获取指定类型的所有 bean，按注册顺序
    pub fn get_beans_of_type<T: ?Sized + Send + Sync + 'static>(
        &self,
    ) -> ContainerResult<Vec<(String, Arc<T>)>> {
        self.lookup_ref().get_beans_of_type::<T>()
    }

    /// 是否包含指定名称的 bean
    pub fn contains_bean(&self, name: &str) -> bool {
        self.shared.contains_bean(name)
    }

    /// bean 定义数量，尚未刷新时为 0
    pub fn get_bean_definition_count(&self) -> usize {
        self.shared.get_bean_definition_count()
    }

    /// 所有 bean 定义名称
    pub fn get_bean_definition_names(&self) -> Vec<String> {
        self.shared.get_bean_definition_names()
    }

    /// 是否为单例
    pub fn is_singleton(&self, name: &str) -> ContainerResult<bool> {
        self.shared.runtime()?.factory.is_singleton(name)
    }

    /// 是否为原型
    pub fn is_prototype(&self, name: &str) -> ContainerResult<bool> {
        self.shared.runtime()?.factory.is_prototype(name)
    }

    /// 发布自定义事件
    pub fn publish_event(&self, name: &str, payload: Value) -> ContainerResult<()> {
        self.shared.publish_event(name, payload)
    }

    /// 上下文ID
    pub fn id(&self) -> &str {
        &self.shared.id
    }

    /// 显示名称
    pub fn display_name(&self) -> &str {
        &self.shared.config.display_name
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        &self.shared.config
    }

    /// 最近一次刷新成功的时间
    pub fn startup_date(&self) -> Option<DateTime<Utc>> {
        *self.shared.startup_date.read()
    }

    /// 当前状态
    pub fn state(&self) -> ContextState {
        self.shared.state()
    }

    /// 是否处于运行状态
    pub fn is_running(&self) -> bool {
        self.state() == ContextState::Active
    }

    /// 上下文句柄，只持有弱引用
    pub fn lookup(&self) -> Arc<dyn BeanLookup> {
        Arc::new(ContextHandle {
            shared: Arc::downgrade(&self.shared),
        })
    }
}

impl fmt::Debug for ApplicationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationContext")
            .field("id", &self.shared.id)
            .field("display_name", &self.shared.config.display_name)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Drop for ApplicationContext {
    fn drop(&mut self) {
        if self.shared.state().is_usable() {
            debug!("释放上下文 {}，自动关闭", self.shared.id);
            self.shared.close();
        }
    }
}
