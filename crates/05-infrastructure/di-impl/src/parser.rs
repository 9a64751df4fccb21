//! 配置类解析
//!
//! 从配置类候选中展开组件扫描、导入和工厂方法声明，直到一轮中不再出现新的候选。
//! 每个配置类型只解析一次；被导入的配置类记录自己的导入链，用于检测循环导入。

use crate::condition::ConditionEvaluator;
use crate::scope::ScopeResolver;
use di_abstractions::{
    BeanDefinition, BeanDefinitionRegistry, BeanDefinitionRegistryPostProcessor, BeanResolver,
    ComponentScanner, ConditionOutcome, ConfigurationPhase, ConstructorFn, FactoryMethodDescriptor,
    Role, TypeDescriptor,
};
use parking_lot::Mutex;
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};
use weave_aop::Advisor;
use weave_common::{
    Bean, ContainerConfig, ContainerError, ContainerResult, NamingConventions, OrderKind,
    TypeMetadata,
};

/// 组件的注册名称：显式名称，否则为首字母小写的类型名
pub fn component_name(descriptor: &TypeDescriptor) -> String {
    descriptor
        .name
        .clone()
        .unwrap_or_else(|| NamingConventions::bean_name(descriptor.type_info()))
}

/// 跨轮次保留的解析状态
#[derive(Debug, Default)]
pub struct ParserState {
    parsed: HashSet<TypeId>,
    import_chains: HashMap<TypeId, Vec<(String, TypeId)>>,
    roots_scanned: bool,
}

impl ParserState {
    /// 创建空状态
    pub fn new() -> Self {
        Self::default()
    }

    /// 已解析的配置类型数量
    pub fn parsed_count(&self) -> usize {
        self.parsed.len()
    }

    /// 配置类型是否已解析
    pub fn is_parsed(&self, type_id: TypeId) -> bool {
        self.parsed.contains(&type_id)
    }
}

/// 配置类解析器
pub struct ConfigurationParser<'a> {
    registry: &'a dyn BeanDefinitionRegistry,
    config: &'a ContainerConfig,
    scanners: &'a [Arc<dyn ComponentScanner>],
    state: &'a mut ParserState,
}

impl<'a> ConfigurationParser<'a> {
    /// 创建解析器
    pub fn new(
        registry: &'a dyn BeanDefinitionRegistry,
        config: &'a ContainerConfig,
        scanners: &'a [Arc<dyn ComponentScanner>],
        state: &'a mut ParserState,
    ) -> Self {
        Self {
            registry,
            config,
            scanners,
            state,
        }
    }

    /// 注册组件类型，条件不满足时返回 `None`
    pub fn register_component(
        &mut self,
        descriptor: &Arc<TypeDescriptor>,
    ) -> ContainerResult<Option<String>> {
        let name = component_name(descriptor);
        self.register_named(&name, descriptor)
    }

    /// 扫描包，注册其中带有构造型标记的类型
    pub fn scan(&mut self, package: &str) -> ContainerResult<Vec<String>> {
        let scanners = self.scanners;
        let mut registered = Vec::new();
        for scanner in scanners {
            for descriptor in scanner.scan(package) {
                if descriptor.stereotype.is_none() {
                    continue;
                }
                let name = component_name(&descriptor);
                if let Ok(existing) = self.registry.get_bean_definition(&name) {
                    if existing.type_info().id == descriptor.type_info().id {
                        continue;
                    }
                    return Err(ContainerError::duplicate(
                        &name,
                        format!(
                            "扫描到的类型 {} 与已注册的类型 {} 冲突",
                            descriptor.type_info(),
                            existing.type_info()
                        ),
                    ));
                }
                if let Some(name) = self.register_named(&name, &descriptor)? {
                    registered.push(name);
                }
            }
        }
        info!("组件扫描 {}: 注册 {} 个 bean", package, registered.len());
        Ok(registered)
    }

    /// 解析所有未解析的配置类，直到不再出现新的候选，返回解析的轮数
    pub fn parse(&mut self) -> ContainerResult<usize> {
        let mut rounds = 0;
        loop {
            let candidates = self.candidates()?;
            if candidates.is_empty() {
                break;
            }
            rounds += 1;
            debug!("配置类解析第 {} 轮: {} 个候选", rounds, candidates.len());
            for (name, descriptor) in candidates {
                self.process(&name, &descriptor)?;
            }
        }
        Ok(rounds)
    }

    fn register_named(
        &mut self,
        name: &str,
        descriptor: &Arc<TypeDescriptor>,
    ) -> ContainerResult<Option<String>> {
        // 配置类的条件在解析时求值
        if !descriptor.is_configuration() {
            let evaluator = ConditionEvaluator::new(self.registry, self.config);
            if evaluator.should_skip(
                &descriptor.conditions,
                descriptor.type_info(),
                ConfigurationPhase::RegisterBean,
            ) {
                return Ok(None);
            }
        }

        ScopeResolver::register(self.registry, name, BeanDefinition::from_descriptor(descriptor))?;
        if !descriptor.is_configuration() {
            self.register_advisors(descriptor)?;
        }
        Ok(Some(name.to_string()))
    }

    fn register_advisors(&self, descriptor: &Arc<TypeDescriptor>) -> ContainerResult<()> {
        for advisor in &descriptor.advisors {
            let name = advisor.name();
            let registered = self
                .registry
                .get_bean_definition(name)
                .is_ok_and(|existing| {
                    existing
                        .source
                        .as_ref()
                        .is_some_and(|source| Arc::ptr_eq(source, descriptor))
                });
            if registered {
                continue;
            }

            let instance = advisor.clone();
            let supplier: ConstructorFn =
                Arc::new(move |_resolver: &mut dyn BeanResolver| -> anyhow::Result<Bean> {
                    Ok(instance.clone())
                });
            let mut definition = BeanDefinition::new(Arc::new(TypeMetadata::of::<Advisor>()));
            definition.role = Role::Infrastructure;
            definition.origin = descriptor.origin;
            definition.description = Some(format!("{} 声明的通知器", descriptor.type_info()));
            definition.supplier = Some(supplier);
            definition.source = Some(descriptor.clone());
            debug!("注册通知器: {}", name);
            self.registry.register_bean_definition(name, definition)?;
        }
        Ok(())
    }

    fn candidates(&self) -> ContainerResult<Vec<(String, Arc<TypeDescriptor>)>> {
        let mut candidates: Vec<(OrderKind, String, Arc<TypeDescriptor>)> = Vec::new();
        for name in self.registry.get_bean_definition_names() {
            let definition = self.registry.get_bean_definition(&name)?;
            if !definition.is_configuration() {
                continue;
            }
            let Some(source) = definition.source.clone() else {
                continue;
            };
            if self.state.is_parsed(source.type_info().id) {
                continue;
            }
            candidates.push((definition.order, name, source));
        }
        candidates.sort_by_key(|(order, ..)| *order);
        Ok(candidates
            .into_iter()
            .map(|(_, name, source)| (name, source))
            .collect())
    }

    fn process(&mut self, name: &str, descriptor: &Arc<TypeDescriptor>) -> ContainerResult<()> {
        let type_id = descriptor.type_info().id;
        if !self.state.parsed.insert(type_id) {
            return Ok(());
        }

        let evaluator = ConditionEvaluator::new(self.registry, self.config);
        for phase in [
            ConfigurationPhase::ParseConfiguration,
            ConfigurationPhase::RegisterBean,
        ] {
            if let ConditionOutcome::Skip { reason } =
                evaluator.evaluate(&descriptor.conditions, descriptor.type_info(), phase)
            {
                info!("跳过配置类 {}: {}", name, reason);
                self.registry.remove_bean_definition(name)?;
                return Ok(());
            }
        }

        debug!("解析配置类: {} ({})", name, descriptor.type_info());
        self.register_advisors(descriptor)?;

        for package in &descriptor.component_scans {
            self.scan(package)?;
        }

        let mut chain = self
            .state
            .import_chains
            .get(&type_id)
            .cloned()
            .unwrap_or_default();
        chain.push((name.to_string(), type_id));
        for import in &descriptor.imports {
            self.import(&chain, import)?;
        }

        for method in &descriptor.factory_methods {
            self.register_factory_method(name, method, descriptor)?;
        }
        Ok(())
    }

    fn import(
        &mut self,
        chain: &[(String, TypeId)],
        import: &Arc<TypeDescriptor>,
    ) -> ContainerResult<()> {
        let type_id = import.type_info().id;
        let import_name = import
            .name
            .clone()
            .unwrap_or_else(|| import.type_info().qualified_name());

        if let Some(start) = chain.iter().position(|(_, id)| *id == type_id) {
            let mut names: Vec<String> = chain[start..]
                .iter()
                .map(|(name, _)| name.clone())
                .collect();
            names.push(import_name);
            return Err(ContainerError::ConfigurationCycle { chain: names });
        }
        if self.state.is_parsed(type_id) {
            return Ok(());
        }
        self.state
            .import_chains
            .entry(type_id)
            .or_insert_with(|| chain.to_vec());
        if !self.registry.names_for_type(type_id).is_empty() {
            return Ok(());
        }

        debug!("导入配置类: {}", import_name);
        self.register_named(&import_name, import)?;
        Ok(())
    }

    fn register_factory_method(
        &self,
        declaring: &str,
        method: &FactoryMethodDescriptor,
        source: &Arc<TypeDescriptor>,
    ) -> ContainerResult<()> {
        let bean_name = method.resolved_bean_name();
        let evaluator = ConditionEvaluator::new(self.registry, self.config);
        if evaluator.should_skip(
            &method.conditions,
            &method.metadata.type_info,
            ConfigurationPhase::RegisterBean,
        ) {
            return Ok(());
        }
        debug!("注册工厂方法 bean: {} <- {}.{}()", bean_name, declaring, method.method_name);
        ScopeResolver::register(
            self.registry,
            bean_name,
            BeanDefinition::from_factory_method(declaring, method, source),
        )
    }
}

/// 配置类后置处理器
///
/// 总是第一个执行的注册表后置处理器：首次调用时扫描根包，之后每次调用都解析新出现的配置类。
pub struct ConfigurationClassPostProcessor {
    config: ContainerConfig,
    scanners: Vec<Arc<dyn ComponentScanner>>,
    packages: Vec<String>,
    state: Mutex<ParserState>,
}

impl ConfigurationClassPostProcessor {
    /// 创建配置类后置处理器
    pub fn new(
        config: ContainerConfig,
        scanners: Vec<Arc<dyn ComponentScanner>>,
        packages: Vec<String>,
    ) -> Self {
        Self {
            config,
            scanners,
            packages,
            state: Mutex::new(ParserState::new()),
        }
    }

    /// 注册组件类型，返回实际注册的名称
    pub fn register_components(
        &self,
        registry: &dyn BeanDefinitionRegistry,
        components: &[Arc<TypeDescriptor>],
    ) -> ContainerResult<Vec<String>> {
        let mut state = self.state.lock();
        let mut parser =
            ConfigurationParser::new(registry, &self.config, &self.scanners, &mut *state);
        let mut registered = Vec::with_capacity(components.len());
        for descriptor in components {
            if let Some(name) = parser.register_component(descriptor)? {
                registered.push(name);
            }
        }
        Ok(registered)
    }

    /// 扫描根包并解析配置类
    pub fn parse(&self, registry: &dyn BeanDefinitionRegistry) -> ContainerResult<usize> {
        let mut state = self.state.lock();
        let scan_roots = !std::mem::replace(&mut state.roots_scanned, true);
        let mut parser =
            ConfigurationParser::new(registry, &self.config, &self.scanners, &mut *state);
        if scan_roots {
            for package in &self.packages {
                parser.scan(package)?;
            }
        }
        parser.parse()
    }
}

impl BeanDefinitionRegistryPostProcessor for ConfigurationClassPostProcessor {
    fn post_process_bean_definition_registry(
        &self,
        registry: &dyn BeanDefinitionRegistry,
    ) -> ContainerResult<()> {
        let rounds = self.parse(registry)?;
        if rounds > 0 {
            info!(
                "配置类解析完成: {} 轮，当前 {} 个 bean 定义",
                rounds,
                registry.get_bean_definition_count()
            );
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "ConfigurationClassPostProcessor"
    }
}
