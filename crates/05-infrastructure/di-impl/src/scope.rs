//! 作用域解析与线程作用域

use di_abstractions::{BeanDefinition, BeanDefinitionRegistry, Scope};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::thread::{self, ThreadId};
use tracing::debug;
use weave_common::{
    Bean, ContainerError, ContainerResult, NamingConventions, SCOPE_PROTOTYPE, SCOPE_SINGLETON,
};

/// 作用域解析
///
/// 定义进入注册表之前确定作用域名称；需要作用域代理的定义拆成两条：
/// `scopedTarget.名称` 保存真实定义，`名称` 保存每次获取都返回新代理的间接定义。
#[derive(Debug, Default, Clone, Copy)]
pub struct ScopeResolver;

impl ScopeResolver {
    /// 规范化作用域名称，空名称视为单例
    pub fn resolve_scope(definition: &mut BeanDefinition) {
        let scope = definition.scope.trim();
        definition.scope = if scope.is_empty() {
            SCOPE_SINGLETON.to_string()
        } else {
            scope.to_string()
        };
    }

    /// 解析作用域后注册定义
    pub fn register(
        registry: &dyn BeanDefinitionRegistry,
        name: &str,
        mut definition: BeanDefinition,
    ) -> ContainerResult<()> {
        Self::resolve_scope(&mut definition);
        if !definition.scoped_proxy {
            return registry.register_bean_definition(name, definition);
        }

        let target_name = NamingConventions::scoped_target_name(name);
        let mut target = definition.clone();
        target.scoped_proxy = false;
        target.aliases.clear();
        target.primary = false;
        registry.register_bean_definition(&target_name, target)?;

        definition.lazy = true;
        debug!("注册作用域代理: {} -> {}", name, target_name);
        registry.register_bean_definition(name, definition)
    }

    /// 校验所有定义的作用域都已注册
    pub fn validate_scopes(
        registry: &dyn BeanDefinitionRegistry,
        is_registered: impl Fn(&str) -> bool,
    ) -> ContainerResult<()> {
        for name in registry.get_bean_definition_names() {
            let definition = registry.get_bean_definition(&name)?;
            let scope = definition.scope.as_str();
            if scope != SCOPE_SINGLETON && scope != SCOPE_PROTOTYPE && !is_registered(scope) {
                return Err(ContainerError::validation(
                    name,
                    format!("未注册的作用域: {scope}"),
                ));
            }
        }
        Ok(())
    }
}

/// 线程作用域：每个线程持有自己的实例
#[derive(Default)]
pub struct ThreadScope {
    instances: Mutex<HashMap<ThreadId, HashMap<String, Bean>>>,
}

impl ThreadScope {
    /// 创建线程作用域
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self, name: &str) -> Option<Bean> {
        self.instances
            .lock()
            .get(&thread::current().id())
            .and_then(|beans| beans.get(name))
            .cloned()
    }
}

impl Scope for ThreadScope {
    fn get(
        &self,
        name: &str,
        object_factory: &mut dyn FnMut() -> ContainerResult<Bean>,
    ) -> ContainerResult<Bean> {
        if let Some(bean) = self.current(name) {
            return Ok(bean);
        }
        // 创建过程中可能获取其他线程作用域的 bean，不能持锁
        let created = object_factory()?;
        let mut instances = self.instances.lock();
        Ok(instances
            .entry(thread::current().id())
            .or_default()
            .entry(name.to_string())
            .or_insert(created)
            .clone())
    }

    fn remove(&self, name: &str) -> Option<Bean> {
        self.instances
            .lock()
            .get_mut(&thread::current().id())
            .and_then(|beans| beans.remove(name))
    }

    fn conversation_id(&self) -> Option<String> {
        Some(format!("{:?}", thread::current().id()))
    }
}
