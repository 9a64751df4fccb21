//! bean 定义注册表实现

use di_abstractions::{BeanDefinition, BeanDefinitionRegistry};
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use weave_common::{ContainerError, ContainerResult, NamingConventions};

#[derive(Default)]
struct RegistryState {
    definitions: HashMap<String, Arc<BeanDefinition>>,
    /// 注册顺序
    names: Vec<String>,
    /// 别名 -> 规范名称
    aliases: HashMap<String, String>,
    /// 类型 -> 候选名称
    type_index: HashMap<TypeId, Vec<String>>,
}

impl RegistryState {
    fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map_or(name, String::as_str)
    }

    fn index(&mut self, name: &str, definition: &BeanDefinition) {
        // 作用域代理的目标只能按名称获取
        if NamingConventions::is_scoped_target(name) {
            return;
        }
        for capability in definition.exposed_metadata().exposed() {
            self.type_index
                .entry(capability.type_id())
                .or_default()
                .push(name.to_string());
        }
        if definition.is_factory_bean() {
            let factory_name = NamingConventions::factory_bean_name(name);
            for capability in definition.type_metadata.exposed() {
                self.type_index
                    .entry(capability.type_id())
                    .or_default()
                    .push(factory_name.clone());
            }
        }
    }

    fn unindex(&mut self, name: &str) {
        let factory_name = NamingConventions::factory_bean_name(name);
        for names in self.type_index.values_mut() {
            names.retain(|candidate| candidate != name && *candidate != factory_name);
        }
    }

    fn position(&self, name: &str) -> usize {
        let name = NamingConventions::transformed_bean_name(name);
        self.names
            .iter()
            .position(|registered| registered == name)
            .unwrap_or(usize::MAX)
    }
}

/// 默认的 bean 定义注册表
///
/// 保持注册顺序，维护别名表和按能力类型的索引。
/// 冻结之后任何修改都返回生命周期错误。
pub struct DefaultBeanDefinitionRegistry {
    state: RwLock<RegistryState>,
    allow_overriding: bool,
    frozen: AtomicBool,
}

impl DefaultBeanDefinitionRegistry {
    /// 创建注册表
    pub fn new(allow_overriding: bool) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            allow_overriding,
            frozen: AtomicBool::new(false),
        }
    }

    /// 是否允许同名覆盖
    pub fn allows_overriding(&self) -> bool {
        self.allow_overriding
    }

    /// 冻结注册表，开始创建 bean 之前调用
    pub fn freeze(&self) {
        if !self.frozen.swap(true, Ordering::SeqCst) {
            debug!("冻结 bean 定义，共 {} 个", self.get_bean_definition_count());
        }
    }

    /// 是否已冻结
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::SeqCst)
    }

    /// 修改已有定义
    pub fn update_bean_definition(
        &self,
        name: &str,
        update: &mut dyn FnMut(&mut BeanDefinition),
    ) -> ContainerResult<()> {
        self.ensure_mutable("修改", name)?;
        let mut state = self.state.write();
        let canonical = state.canonical(name).to_string();
        let mut definition = state
            .definitions
            .get(&canonical)
            .map(|existing| BeanDefinition::clone(existing))
            .ok_or_else(|| ContainerError::no_such_bean(name))?;
        update(&mut definition);
        definition.validate(&canonical)?;
        state.unindex(&canonical);
        state.index(&canonical, &definition);
        state.definitions.insert(canonical.clone(), Arc::new(definition));
        debug!("修改 bean 定义: {}", canonical);
        Ok(())
    }

    fn ensure_mutable(&self, action: &str, name: &str) -> ContainerResult<()> {
        if self.is_frozen() {
            return Err(ContainerError::lifecycle(format!(
                "bean 创建已经开始，不能{action} bean 定义: {name}"
            )));
        }
        Ok(())
    }
}

impl Default for DefaultBeanDefinitionRegistry {
    fn default() -> Self {
        Self::new(true)
    }
}

impl BeanDefinitionRegistry for DefaultBeanDefinitionRegistry {
    fn register_bean_definition(&self, name: &str, definition: BeanDefinition) -> ContainerResult<()> {
        self.ensure_mutable("注册", name)?;
        definition.validate(name)?;

        let mut state = self.state.write();
        let replacing = match state.definitions.get(name) {
            Some(existing) => {
                if !self.allow_overriding {
                    return Err(ContainerError::duplicate(
                        name,
                        format!("已存在定义 {:?}，且不允许覆盖", existing),
                    ));
                }
                if existing.same_definition(&definition) {
                    debug!("忽略重复注册的相同定义: {}", name);
                    return Ok(());
                }
                if existing.rank() > definition.rank() {
                    return Err(ContainerError::duplicate(
                        name,
                        format!(
                            "已存在级别更高的定义 {:?}，不能被 {:?} 覆盖",
                            existing.rank(),
                            definition.rank()
                        ),
                    ));
                }
                info!(
                    "覆盖 bean 定义 {}: {} -> {}",
                    name,
                    existing.type_info(),
                    definition.type_info()
                );
                true
            }
            None => false,
        };

        if replacing {
            state.unindex(name);
        } else {
            if state.aliases.contains_key(name) {
                return Err(ContainerError::duplicate(name, "名称已被用作别名"));
            }
            state.names.push(name.to_string());
            debug!("注册 bean 定义: {} ({})", name, definition.type_info());
        }

        let aliases = definition.aliases.clone();
        state.index(name, &definition);
        state.definitions.insert(name.to_string(), Arc::new(definition));
        drop(state);

        for alias in &aliases {
            self.register_alias(name, alias)?;
        }
        Ok(())
    }

    fn remove_bean_definition(&self, name: &str) -> ContainerResult<Arc<BeanDefinition>> {
        self.ensure_mutable("移除", name)?;
        let mut state = self.state.write();
        let canonical = state.canonical(name).to_string();
        let definition = state
            .definitions
            .remove(&canonical)
            .ok_or_else(|| ContainerError::no_such_bean(name))?;
        state.names.retain(|registered| *registered != canonical);
        state.unindex(&canonical);
        state.aliases.retain(|_, target| *target != canonical);
        info!("移除 bean 定义: {}", canonical);
        Ok(definition)
    }

    fn get_bean_definition(&self, name: &str) -> ContainerResult<Arc<BeanDefinition>> {
        let state = self.state.read();
        state
            .definitions
            .get(state.canonical(name))
            .cloned()
            .ok_or_else(|| ContainerError::no_such_bean(name))
    }

    fn contains_bean_definition(&self, name: &str) -> bool {
        let state = self.state.read();
        state.definitions.contains_key(state.canonical(name))
    }

    fn get_bean_definition_names(&self) -> Vec<String> {
        self.state.read().names.clone()
    }

    fn get_bean_definition_count(&self) -> usize {
        self.state.read().definitions.len()
    }

    fn register_alias(&self, name: &str, alias: &str) -> ContainerResult<()> {
        self.ensure_mutable("注册别名", alias)?;
        let mut state = self.state.write();
        let canonical = state.canonical(name).to_string();
        if !state.definitions.contains_key(&canonical) {
            return Err(ContainerError::no_such_bean(name));
        }
        if alias == canonical {
            state.aliases.remove(alias);
            return Ok(());
        }
        if state.definitions.contains_key(alias) {
            return Err(ContainerError::duplicate(
                alias,
                "别名与已有的 bean 名称冲突",
            ));
        }
        match state.aliases.get(alias).cloned() {
            Some(existing) if existing == canonical => Ok(()),
            Some(existing) => Err(ContainerError::duplicate(
                alias,
                format!("别名已指向 {existing}，不能再指向 {canonical}"),
            )),
            None => {
                debug!("注册别名: {} -> {}", alias, canonical);
                state.aliases.insert(alias.to_string(), canonical);
                Ok(())
            }
        }
    }

    fn get_aliases(&self, name: &str) -> Vec<String> {
        let state = self.state.read();
        let canonical = state.canonical(name);
        let mut aliases: Vec<String> = state
            .aliases
            .iter()
            .filter(|(alias, target)| *target == canonical && alias.as_str() != name)
            .map(|(alias, _)| alias.clone())
            .collect();
        aliases.sort();
        aliases
    }

    fn canonical_name(&self, name: &str) -> String {
        self.state.read().canonical(name).to_string()
    }

    fn names_for_type(&self, type_id: TypeId) -> Vec<String> {
        let state = self.state.read();
        let mut names = state.type_index.get(&type_id).cloned().unwrap_or_default();
        names.sort_by_key(|name| state.position(name));
        names
    }

    fn is_name_in_use(&self, name: &str) -> bool {
        let state = self.state.read();
        state.definitions.contains_key(name) || state.aliases.contains_key(name)
    }
}
