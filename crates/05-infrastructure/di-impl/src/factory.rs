//! bean 工厂：创建流水线
//!
//! 每个名称的创建状态为 `NotCreated -> InCreation -> Created`，任一步骤失败进入 `Failed`。
//! 单例由按名称的可重入锁保护：检查缓存、加锁、再检查，
//! 并发请求同一个单例时只执行一次创建，所有调用方得到同一个实例或同一个错误。
//! 等待其他线程持有的创建锁之前先检查等待关系，跨线程的循环依赖返回 `CircularDependency` 而不是死锁。

use crate::registry::DefaultBeanDefinitionRegistry;
use dashmap::DashMap;
use di_abstractions::{
    BeanDefinition, BeanDefinitionRegistry, BeanPostProcessor, BeanResolver, CallbackFn,
    ConfigurableBeanFactory, FactoryBean, InjectionTarget, ResolveContext, Scope,
};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::any::TypeId;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use tracing::{debug, error, info, warn};
use weave_aop::{AopProxy, LookupTargetSource};
use weave_common::{
    view_as, Bean, BeanView, ContainerError, ContainerResult, CreationState, NamingConventions,
    TypeInfo, TypeMetadata, SCOPE_PROTOTYPE, SCOPE_SINGLETON,
};

struct Created {
    bean: Bean,
    raw: Bean,
}

struct Disposable {
    name: String,
    bean: Bean,
    destroy: Option<CallbackFn>,
}

#[derive(Default)]
struct Attempt {
    count: u64,
    failure: Option<ContainerError>,
}

/// 离开作用域时释放创建锁的持有记录
struct CreationOwner<'a> {
    owners: &'a DashMap<String, ThreadId>,
    name: Option<String>,
}

impl Drop for CreationOwner<'_> {
    fn drop(&mut self) {
        if let Some(name) = self.name.take() {
            self.owners.remove(&name);
        }
    }
}

fn cached<K: Eq + Hash, V: Clone>(map: &DashMap<K, V>, key: &K) -> Option<V> {
    map.get(key).map(|entry| entry.value().clone())
}

/// bean 的实际类型元数据：工厂 bean 的产物使用产物元数据
pub(crate) fn target_metadata<'d>(definition: &'d BeanDefinition, bean: &Bean) -> &'d Arc<TypeMetadata> {
    match &definition.factory_bean {
        Some(adapter) if definition.type_metadata.self_capability.cast(bean).is_none() => {
            &adapter.product
        }
        _ => &definition.type_metadata,
    }
}

/// 通过元数据中声明的能力把 bean 转换为 `Arc<T>`
pub(crate) fn capability_view<T: ?Sized + 'static>(
    metadata: &TypeMetadata,
    bean: &Bean,
) -> Option<Arc<T>> {
    metadata
        .find_capability(TypeId::of::<T>())
        .and_then(|capability| capability.cast(bean))
        .and_then(|view| view_as::<T>(&view))
}

/// 默认 bean 工厂
pub struct DefaultBeanFactory {
    registry: Arc<DefaultBeanDefinitionRegistry>,
    self_ref: Weak<Self>,
    singletons: DashMap<String, Bean>,
    factory_products: DashMap<String, Bean>,
    views: DashMap<(String, TypeId), BeanView>,
    states: DashMap<String, CreationState>,
    attempts: DashMap<String, Attempt>,
    creation_locks: DashMap<String, Arc<ReentrantMutex<()>>>,
    /// 创建锁的持有线程
    creation_owners: DashMap<String, ThreadId>,
    /// 线程正在等待的创建锁
    waiting: DashMap<ThreadId, String>,
    /// 单例，按创建顺序
    disposables: Mutex<Vec<Disposable>>,
    post_processors: RwLock<Vec<Arc<dyn BeanPostProcessor>>>,
    resolvable: RwLock<HashMap<TypeId, BeanView>>,
    scopes: RwLock<HashMap<String, Arc<dyn Scope>>>,
}

impl DefaultBeanFactory {
    /// 创建 bean 工厂
    pub fn new(registry: Arc<DefaultBeanDefinitionRegistry>) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            registry,
            self_ref: self_ref.clone(),
            singletons: DashMap::new(),
            factory_products: DashMap::new(),
            views: DashMap::new(),
            states: DashMap::new(),
            attempts: DashMap::new(),
            creation_locks: DashMap::new(),
            creation_owners: DashMap::new(),
            waiting: DashMap::new(),
            disposables: Mutex::new(Vec::new()),
            post_processors: RwLock::new(Vec::new()),
            resolvable: RwLock::new(HashMap::new()),
            scopes: RwLock::new(HashMap::new()),
        })
    }

    /// 注册表
    pub fn registry(&self) -> &Arc<DefaultBeanDefinitionRegistry> {
        &self.registry
    }

    /// 按名称获取 bean，`&名称` 获取工厂 bean 自身
    pub fn get_bean_by_name(&self, name: &str) -> ContainerResult<Bean> {
        self.do_get_bean(name, &mut ResolveContext::new())
    }

    /// 按名称获取并转换为指定类型
    pub fn get_view(&self, name: &str, type_info: &TypeInfo) -> ContainerResult<BeanView> {
        self.get_view_in(name, type_info, &mut ResolveContext::new())
    }

    /// 按类型获取，可选限定符
    pub fn resolve_view(
        &self,
        type_info: &TypeInfo,
        qualifier: Option<&str>,
    ) -> ContainerResult<BeanView> {
        self.resolve_view_in(type_info, qualifier, &mut ResolveContext::new())
    }

    /// 获取指定类型的所有 bean，按注册顺序
    pub fn get_views_of_type(&self, type_info: &TypeInfo) -> ContainerResult<Vec<(String, BeanView)>> {
        self.views_of_type_in(type_info, &mut ResolveContext::new())
    }

    /// 是否包含指定名称的 bean
    pub fn contains_bean(&self, name: &str) -> bool {
        self.registry
            .contains_bean_definition(NamingConventions::transformed_bean_name(name))
    }

    /// 是否为单例
    pub fn is_singleton(&self, name: &str) -> ContainerResult<bool> {
        let definition = self.definition_of(name)?;
        Ok(definition.is_singleton())
    }

    /// 是否为原型
    pub fn is_prototype(&self, name: &str) -> ContainerResult<bool> {
        let definition = self.definition_of(name)?;
        Ok(definition.is_prototype())
    }

    /// 当前的创建状态
    pub fn creation_state(&self, name: &str) -> CreationState {
        cached(&self.states, &self.registry.canonical_name(name)).unwrap_or_default()
    }

    /// 是否正在创建
    pub fn is_currently_in_creation(&self, name: &str) -> bool {
        self.creation_state(name) == CreationState::InCreation
    }

    /// 是否注册了指定作用域
    pub fn has_scope(&self, name: &str) -> bool {
        self.scopes.read().contains_key(name)
    }

    /// 已创建的单例名称，按创建顺序
    pub fn singleton_names(&self) -> Vec<String> {
        self.disposables
            .lock()
            .iter()
            .map(|disposable| disposable.name.clone())
            .collect()
    }

    /// 已添加的 bean 后置处理器名称
    pub fn post_processor_names(&self) -> Vec<String> {
        self.post_processors
            .read()
            .iter()
            .map(|processor| processor.name().to_string())
            .collect()
    }

    /// 实例化所有非延迟单例；工厂 bean 只创建工厂自身
    pub fn preinstantiate_singletons(&self) -> ContainerResult<()> {
        let names = self.registry.get_bean_definition_names();
        info!("预实例化单例 bean，共 {} 个定义", names.len());
        for name in names {
            let definition = self.registry.get_bean_definition(&name)?;
            if !definition.is_singleton() || definition.lazy || definition.scoped_proxy {
                continue;
            }
            let request = if definition.is_factory_bean() {
                NamingConventions::factory_bean_name(&name)
            } else {
                name
            };
            self.get_bean_by_name(&request)?;
        }
        Ok(())
    }

    /// 按创建的逆序销毁所有单例
    ///
    /// 销毁回调失败时记录错误并继续销毁其余的 bean。
    pub fn destroy_singletons(&self) {
        let disposables = std::mem::take(&mut *self.disposables.lock());
        if !disposables.is_empty() {
            info!("销毁单例 bean，共 {} 个", disposables.len());
        }
        for disposable in disposables.into_iter().rev() {
            let Some(destroy) = &disposable.destroy else {
                continue;
            };
            debug!("调用销毁回调: {}", disposable.name);
            if let Err(e) = destroy(&disposable.bean) {
                error!("bean {} 的销毁回调失败: {:#}", disposable.name, e);
            }
        }
        self.singletons.clear();
        self.factory_products.clear();
        self.views.clear();
        self.states.clear();
        self.attempts.clear();
    }

    fn definition_of(&self, name: &str) -> ContainerResult<Arc<BeanDefinition>> {
        self.registry
            .get_bean_definition(NamingConventions::transformed_bean_name(name))
            .map_err(|_| ContainerError::no_such_bean(name))
    }

    fn creation_lock(&self, name: &str) -> Arc<ReentrantMutex<()>> {
        self.creation_locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(ReentrantMutex::new(())))
            .value()
            .clone()
    }

    fn attempt_count(&self, name: &str) -> u64 {
        self.attempts
            .get(name)
            .map_or(0, |attempt| attempt.value().count)
    }

    fn failure_since(&self, name: &str, seen: u64) -> Option<ContainerError> {
        self.attempts.get(name).and_then(|attempt| {
            if attempt.count > seen {
                attempt.failure.clone()
            } else {
                None
            }
        })
    }

    fn record_attempt(&self, name: &str, failure: Option<ContainerError>) {
        let mut attempt = self.attempts.entry(name.to_string()).or_default();
        attempt.count += 1;
        attempt.failure = failure;
    }

    fn do_get_bean(&self, name: &str, context: &mut ResolveContext) -> ContainerResult<Bean> {
        let dereference = NamingConventions::is_factory_dereference(name);
        let canonical = self
            .registry
            .canonical_name(NamingConventions::transformed_bean_name(name));
        let definition = self
            .registry
            .get_bean_definition(&canonical)
            .map_err(|_| ContainerError::no_such_bean(name))?;

        if dereference && !definition.is_factory_bean() {
            return Err(ContainerError::BeanNotOfRequiredType {
                name: name.to_string(),
                required_type: "FactoryBean".to_string(),
            });
        }
        if definition.scoped_proxy && !dereference {
            return self.scoped_proxy(&canonical, &definition);
        }

        let instance = self.get_instance(&canonical, &definition, context)?;
        if definition.is_factory_bean() && !dereference {
            return self.get_object_from_factory(&canonical, &definition, &instance);
        }
        Ok(instance)
    }

    fn get_instance(
        &self,
        name: &str,
        definition: &Arc<BeanDefinition>,
        context: &mut ResolveContext,
    ) -> ContainerResult<Bean> {
        if definition.is_singleton() {
            if let Some(bean) = cached(&self.singletons, &name.to_string()) {
                return Ok(bean);
            }
            context.push_name(name)?;
            let result = self.create_singleton(name, definition, context);
            context.pop_name();
            return result;
        }

        context.push_name(name)?;
        let result = if definition.is_prototype() {
            self.create_bean(name, definition, context)
                .map(|created| created.bean)
        } else {
            let scope = self.scopes.read().get(&definition.scope).cloned();
            match scope {
                Some(scope) => scope.get(name, &mut || {
                    self.create_bean(name, definition, context)
                        .map(|created| created.bean)
                }),
                None => Err(ContainerError::validation(
                    name,
                    format!("未注册的作用域: {}", definition.scope),
                )),
            }
        };
        context.pop_name();
        result
    }

    fn create_singleton(
        &self,
        name: &str,
        definition: &Arc<BeanDefinition>,
        context: &mut ResolveContext,
    ) -> ContainerResult<Bean> {
        let seen = self.attempt_count(name);
        let me = thread::current().id();
        let reentrant = self
            .creation_owners
            .get(name)
            .is_some_and(|owner| *owner == me);
        let lock = self.creation_lock(name);
        let _guard = if reentrant {
            lock.lock()
        } else {
            self.waiting.insert(me, name.to_string());
            let cycle = self.wait_cycle(name, me);
            let guard = match cycle {
                Some(chain) => {
                    self.waiting.remove(&me);
                    warn!("检测到跨线程的循环依赖: {}", chain.join(" -> "));
                    return Err(ContainerError::CircularDependency { chain });
                }
                None => lock.lock(),
            };
            self.waiting.remove(&me);
            self.creation_owners.insert(name.to_string(), me);
            guard
        };
        let _owner = CreationOwner {
            owners: &self.creation_owners,
            name: (!reentrant).then(|| name.to_string()),
        };

        if let Some(bean) = cached(&self.singletons, &name.to_string()) {
            return Ok(bean);
        }
        // 等待期间另一个线程的创建失败了
        if let Some(failure) = self.failure_since(name, seen) {
            return Err(failure);
        }
        if self.creation_state(name) == CreationState::InCreation {
            return Err(ContainerError::CircularDependency {
                chain: vec![name.to_string(), name.to_string()],
            });
        }

        self.states
            .insert(name.to_string(), CreationState::InCreation);
        match self.create_bean(name, definition, context) {
            Ok(created) => {
                self.singletons
                    .insert(name.to_string(), created.bean.clone());
                self.disposables.lock().push(Disposable {
                    name: name.to_string(),
                    bean: created.raw,
                    destroy: definition.destroy.clone(),
                });
                self.states.insert(name.to_string(), CreationState::Created);
                self.record_attempt(name, None);
                debug!("单例创建完成: {}", name);
                Ok(created.bean)
            }
            Err(err) => {
                self.states.insert(name.to_string(), CreationState::Failed);
                self.record_attempt(name, Some(err.clone()));
                warn!("单例 {} 创建失败: {}", name, err);
                Err(err)
            }
        }
    }

    /// 沿“持有线程正在等待的锁”追溯，回到当前线程持有的锁时构成循环
    fn wait_cycle(&self, name: &str, me: ThreadId) -> Option<Vec<String>> {
        let mut chain = vec![name.to_string()];
        let mut current = name.to_string();
        for _ in 0..=self.creation_owners.len() {
            let owner = *self.creation_owners.get(&current)?;
            if owner == me {
                chain.push(name.to_string());
                return Some(chain);
            }
            current = self.waiting.get(&owner)?.value().clone();
            chain.push(current.clone());
        }
        None
    }

    fn create_bean(
        &self,
        name: &str,
        definition: &Arc<BeanDefinition>,
        context: &mut ResolveContext,
    ) -> ContainerResult<Created> {
        debug!("创建 bean: {} ({})", name, definition.type_info());
        for dependency in &definition.depends_on {
            self.do_get_bean(dependency, context).map_err(|e| {
                e.wrap_creation(name, format!("依赖的 bean {dependency} 初始化失败"))
            })?;
        }

        let mut creation = CreationResolver {
            factory: self,
            context,
            bean_name: name,
        };
        let resolver: &mut dyn BeanResolver = &mut creation;
        let raw = self.instantiate(name, definition, resolver)?;
        self.inject(name, definition, &raw, resolver)?;
        let bean = self.initialize(name, definition, raw.clone())?;
        Ok(Created { bean, raw })
    }

    fn instantiate(
        &self,
        name: &str,
        definition: &BeanDefinition,
        resolver: &mut dyn BeanResolver,
    ) -> ContainerResult<Bean> {
        let produced = if let Some(supplier) = &definition.supplier {
            supplier(resolver)
        } else if let Some(factory_method) = &definition.factory_method {
            let declaring = resolver
                .resolve_by_name(&factory_method.declaring_bean)
                .map_err(|e| {
                    e.wrap_creation(
                        name,
                        format!("无法获取声明工厂方法的 bean {}", factory_method.declaring_bean),
                    )
                })?;
            (factory_method.invoke)(&declaring, resolver)
        } else if let Some(constructor) = &definition.constructor {
            constructor(resolver)
        } else {
            return Err(ContainerError::validation(
                name,
                format!("类型 {} 没有可用的构造方式", definition.type_info()),
            ));
        };
        produced.map_err(|e| {
            ContainerError::from_callback(name, "实例化失败", e).wrap_creation(name, "实例化失败")
        })
    }

    fn inject(
        &self,
        name: &str,
        definition: &BeanDefinition,
        bean: &Bean,
        resolver: &mut dyn BeanResolver,
    ) -> ContainerResult<()> {
        for point in &definition.injection_points {
            let qualifier = point.qualifier.as_deref();
            let view = match (&point.target, point.required) {
                (InjectionTarget::ByType(type_info), true) => {
                    resolver.resolve_view(type_info, qualifier).map(Some)
                }
                (InjectionTarget::ByType(type_info), false) => {
                    resolver.resolve_optional_view(type_info, qualifier)
                }
                (InjectionTarget::ByName { name: dependency, type_info }, required) => {
                    if required || self.contains_bean(dependency) {
                        resolver.resolve_named_view(dependency, type_info).map(Some)
                    } else {
                        Ok(None)
                    }
                }
            }
            .map_err(|e| e.wrap_creation(name, format!("无法注入字段 {}", point.field)))?;

            (point.inject)(bean, view).map_err(|e| {
                let message = format!("字段 {} 注入失败", point.field);
                ContainerError::from_callback(name, &message, e).wrap_creation(name, message)
            })?;
        }
        Ok(())
    }

    fn initialize(&self, name: &str, definition: &BeanDefinition, raw: Bean) -> ContainerResult<Bean> {
        let processors = self.post_processors.read().clone();
        let mut bean = raw;
        for processor in &processors {
            bean = processor
                .post_process_before_initialization(bean, name, definition)
                .map_err(|e| {
                    e.wrap_creation(name, format!("后置处理器 {} 初始化前处理失败", processor.name()))
                })?;
        }
        if let Some(init) = &definition.init {
            init(&bean).map_err(|e| {
                ContainerError::from_callback(name, "初始化回调失败", e)
                    .wrap_creation(name, "初始化回调失败")
            })?;
        }
        for processor in &processors {
            bean = processor
                .post_process_after_initialization(bean, name, definition)
                .map_err(|e| {
                    e.wrap_creation(name, format!("后置处理器 {} 初始化后处理失败", processor.name()))
                })?;
        }
        Ok(bean)
    }

    fn get_object_from_factory(
        &self,
        name: &str,
        definition: &BeanDefinition,
        instance: &Bean,
    ) -> ContainerResult<Bean> {
        let Some(adapter) = &definition.factory_bean else {
            return Ok(instance.clone());
        };
        let factory = adapter
            .as_factory(instance)
            .ok_or_else(|| ContainerError::BeanNotOfRequiredType {
                name: NamingConventions::factory_bean_name(name),
                required_type: "FactoryBean".to_string(),
            })?;

        if !(definition.is_singleton() && factory.is_singleton()) {
            return self.produce(name, definition, factory.as_ref());
        }
        if let Some(product) = cached(&self.factory_products, &name.to_string()) {
            return Ok(product);
        }
        let lock = self.creation_lock(name);
        let _guard = lock.lock();
        if let Some(product) = cached(&self.factory_products, &name.to_string()) {
            return Ok(product);
        }
        let product = self.produce(name, definition, factory.as_ref())?;
        self.factory_products
            .insert(name.to_string(), product.clone());
        Ok(product)
    }

    fn produce(
        &self,
        name: &str,
        definition: &BeanDefinition,
        factory: &dyn FactoryBean,
    ) -> ContainerResult<Bean> {
        debug!("从工厂 bean 获取产物: {}", name);
        let mut product = factory.get_object().map_err(|e| {
            ContainerError::from_callback(name, "工厂 bean 生产对象失败", e)
                .wrap_creation(name, "工厂 bean 生产对象失败")
        })?;
        if let Some(declared) = factory.object_type() {
            let expected = &definition.exposed_metadata().type_info;
            if declared.id != expected.id {
                warn!("工厂 bean {} 声明的产物类型 {} 与元数据 {} 不一致", name, declared, expected);
            }
        }
        let processors = self.post_processors.read().clone();
        for processor in &processors {
            product = processor
                .post_process_after_initialization(product, name, definition)
                .map_err(|e| {
                    e.wrap_creation(name, format!("后置处理器 {} 处理工厂产物失败", processor.name()))
                })?;
        }
        Ok(product)
    }

    fn scoped_proxy(&self, name: &str, definition: &BeanDefinition) -> ContainerResult<Bean> {
        let target_name = NamingConventions::scoped_target_name(name);
        let factory = self.self_ref.clone();
        let source = LookupTargetSource::new(move || {
            let factory = factory
                .upgrade()
                .ok_or_else(|| ContainerError::lifecycle("bean 工厂已释放"))?;
            Ok(factory.get_bean_by_name(&target_name)?)
        });
        let proxy = AopProxy::create(
            name,
            definition.exposed_metadata().clone(),
            Arc::new(source),
            &[],
        )?;
        Ok(Arc::new(proxy))
    }

    fn view_of(&self, name: &str, bean: &Bean, type_info: &TypeInfo) -> ContainerResult<BeanView> {
        let dereference = NamingConventions::is_factory_dereference(name);
        let canonical = self
            .registry
            .canonical_name(NamingConventions::transformed_bean_name(name));
        let definition = self.registry.get_bean_definition(&canonical)?;

        let cacheable = definition.is_singleton()
            && !definition.scoped_proxy
            && (dereference
                || !definition.is_factory_bean()
                || self.factory_products.contains_key(&canonical));
        let key = if dereference {
            (NamingConventions::factory_bean_name(&canonical), type_info.id)
        } else {
            (canonical, type_info.id)
        };
        if cacheable {
            if let Some(view) = cached(&self.views, &key) {
                return Ok(view);
            }
        }

        let metadata = if dereference {
            &definition.type_metadata
        } else {
            definition.exposed_metadata()
        };
        let view = metadata
            .find_capability(type_info.id)
            .and_then(|capability| capability.cast(bean))
            .ok_or_else(|| ContainerError::BeanNotOfRequiredType {
                name: name.to_string(),
                required_type: type_info.module_path.clone(),
            })?;
        if cacheable {
            return Ok(self.views.entry(key).or_insert(view).value().clone());
        }
        Ok(view)
    }

    fn get_view_in(
        &self,
        name: &str,
        type_info: &TypeInfo,
        context: &mut ResolveContext,
    ) -> ContainerResult<BeanView> {
        let bean = self.do_get_bean(name, context)?;
        self.view_of(name, &bean, type_info)
    }

    fn resolve_view_in(
        &self,
        type_info: &TypeInfo,
        qualifier: Option<&str>,
        context: &mut ResolveContext,
    ) -> ContainerResult<BeanView> {
        if qualifier.is_none() {
            if let Some(view) = self.resolvable.read().get(&type_info.id).cloned() {
                return Ok(view);
            }
        }
        let name = self.determine_candidate(type_info, qualifier)?;
        self.get_view_in(&name, type_info, context)
    }

    fn views_of_type_in(
        &self,
        type_info: &TypeInfo,
        context: &mut ResolveContext,
    ) -> ContainerResult<Vec<(String, BeanView)>> {
        self.registry
            .names_for_type(type_info.id)
            .into_iter()
            .map(|name| {
                let view = self.get_view_in(&name, type_info, context)?;
                Ok((name, view))
            })
            .collect()
    }

    fn candidates(&self, type_info: &TypeInfo, qualifier: Option<&str>) -> Vec<String> {
        let names = self.registry.names_for_type(type_info.id);
        match qualifier {
            None => names,
            Some(qualifier) => names
                .into_iter()
                .filter(|candidate| self.matches_qualifier(candidate, qualifier))
                .collect(),
        }
    }

    fn matches_qualifier(&self, candidate: &str, qualifier: &str) -> bool {
        let canonical = self
            .registry
            .canonical_name(NamingConventions::transformed_bean_name(candidate));
        candidate == qualifier
            || self.registry.canonical_name(qualifier) == canonical
            || self
                .registry
                .get_bean_definition(&canonical)
                .is_ok_and(|definition| definition.has_qualifier(qualifier))
    }

    fn is_primary(&self, candidate: &str) -> bool {
        self.registry
            .get_bean_definition(NamingConventions::transformed_bean_name(candidate))
            .is_ok_and(|definition| definition.primary)
    }

    fn determine_candidate(
        &self,
        type_info: &TypeInfo,
        qualifier: Option<&str>,
    ) -> ContainerResult<String> {
        let mut candidates = self.candidates(type_info, qualifier);
        match candidates.len() {
            0 => Err(ContainerError::no_such_bean(match qualifier {
                Some(qualifier) => format!("{type_info} (限定符: {qualifier})"),
                None => type_info.to_string(),
            })),
            1 => Ok(candidates.remove(0)),
            _ => {
                let primary: Vec<&String> = candidates
                    .iter()
                    .filter(|candidate| self.is_primary(candidate))
                    .collect();
                if let [single] = primary.as_slice() {
                    return Ok((*single).clone());
                }
                Err(ContainerError::NoUniqueBeanOfType {
                    type_name: type_info.module_path.clone(),
                    candidates,
                })
            }
        }
    }
}

impl ConfigurableBeanFactory for DefaultBeanFactory {
    fn get_bean_definition_names(&self) -> Vec<String> {
        self.registry.get_bean_definition_names()
    }

    fn get_bean_definition(&self, name: &str) -> ContainerResult<Arc<BeanDefinition>> {
        self.registry.get_bean_definition(name)
    }

    fn update_bean_definition(
        &self,
        name: &str,
        update: &mut dyn FnMut(&mut BeanDefinition),
    ) -> ContainerResult<()> {
        self.registry.update_bean_definition(name, update)
    }

    fn register_resolvable_dependency(&self, type_info: TypeInfo, value: BeanView) {
        debug!("注册可解析依赖: {}", type_info);
        self.resolvable.write().insert(type_info.id, value);
    }

    fn register_scope(&self, name: &str, scope: Arc<dyn Scope>) {
        if name == SCOPE_SINGLETON || name == SCOPE_PROTOTYPE {
            warn!("不能替换内置作用域: {}", name);
            return;
        }
        debug!("注册作用域: {}", name);
        self.scopes.write().insert(name.to_string(), scope);
    }

    fn add_bean_post_processor(&self, processor: Arc<dyn BeanPostProcessor>) {
        let mut processors = self.post_processors.write();
        processors.retain(|existing| !Arc::ptr_eq(existing, &processor));
        debug!("添加 bean 后置处理器: {}", processor.name());
        processors.push(processor);
    }
}

/// 创建过程中交给生产函数的解析器，携带当前的解析链
struct CreationResolver<'a> {
    factory: &'a DefaultBeanFactory,
    context: &'a mut ResolveContext,
    bean_name: &'a str,
}

impl BeanResolver for CreationResolver<'_> {
    fn resolve_by_name(&mut self, name: &str) -> ContainerResult<Bean> {
        self.factory.do_get_bean(name, self.context)
    }

    fn resolve_view(
        &mut self,
        type_info: &TypeInfo,
        qualifier: Option<&str>,
    ) -> ContainerResult<BeanView> {
        self.factory
            .resolve_view_in(type_info, qualifier, self.context)
    }

    fn resolve_named_view(&mut self, name: &str, type_info: &TypeInfo) -> ContainerResult<BeanView> {
        self.factory.get_view_in(name, type_info, self.context)
    }

    fn resolve_optional_view(
        &mut self,
        type_info: &TypeInfo,
        qualifier: Option<&str>,
    ) -> ContainerResult<Option<BeanView>> {
        let resolvable =
            qualifier.is_none() && self.factory.resolvable.read().contains_key(&type_info.id);
        if !resolvable && self.factory.candidates(type_info, qualifier).is_empty() {
            return Ok(None);
        }
        self.factory
            .resolve_view_in(type_info, qualifier, self.context)
            .map(Some)
    }

    fn resolve_views_of_type(
        &mut self,
        type_info: &TypeInfo,
    ) -> ContainerResult<Vec<(String, BeanView)>> {
        self.factory.views_of_type_in(type_info, self.context)
    }

    fn requesting_bean(&self) -> &str {
        self.bean_name
    }
}
