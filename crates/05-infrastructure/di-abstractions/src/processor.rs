//! 后置处理器抽象接口
//!
//! - [`BeanDefinitionRegistryPostProcessor`] 可以新增或移除定义
//! - [`BeanFactoryPostProcessor`] 只能修改已有定义的元数据
//! - [`BeanPostProcessor`] 在 bean 初始化前后替换对象

use crate::definition::BeanDefinition;
use crate::registry::BeanDefinitionRegistry;
use crate::scope::Scope;
use std::sync::Arc;
use weave_common::{Bean, BeanView, ContainerResult, TypeInfo};

/// 供工厂后置处理器使用的 bean 工厂接口
pub trait ConfigurableBeanFactory: Send + Sync {
    /// 所有定义名称，按注册顺序
    fn get_bean_definition_names(&self) -> Vec<String>;

    /// 获取定义
    fn get_bean_definition(&self, name: &str) -> ContainerResult<Arc<BeanDefinition>>;

    /// 修改已有定义的元数据
    fn update_bean_definition(
        &self,
        name: &str,
        update: &mut dyn FnMut(&mut BeanDefinition),
    ) -> ContainerResult<()>;

    /// 注册可解析依赖：按类型注入时直接使用给定对象
    fn register_resolvable_dependency(&self, type_info: TypeInfo, value: BeanView);

    /// 注册自定义作用域
    fn register_scope(&self, name: &str, scope: Arc<dyn Scope>);

    /// 添加 bean 后置处理器
    fn add_bean_post_processor(&self, processor: Arc<dyn BeanPostProcessor>);
}

/// 注册表后置处理器
pub trait BeanDefinitionRegistryPostProcessor: Send + Sync {
    /// 修改注册表
    fn post_process_bean_definition_registry(
        &self,
        registry: &dyn BeanDefinitionRegistry,
    ) -> ContainerResult<()>;

    /// 修改 bean 工厂
    fn post_process_bean_factory(&self, _factory: &dyn ConfigurableBeanFactory) -> ContainerResult<()> {
        Ok(())
    }

    /// 名称，用于日志
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// bean 工厂后置处理器
pub trait BeanFactoryPostProcessor: Send + Sync {
    /// 修改 bean 工厂
    fn post_process_bean_factory(&self, factory: &dyn ConfigurableBeanFactory) -> ContainerResult<()>;

    /// 名称，用于日志
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// bean 后置处理器
pub trait BeanPostProcessor: Send + Sync {
    /// 初始化回调之前，返回的对象替换原对象
    fn post_process_before_initialization(
        &self,
        bean: Bean,
        _bean_name: &str,
        _definition: &BeanDefinition,
    ) -> ContainerResult<Bean> {
        Ok(bean)
    }

    /// 初始化回调之后，返回的对象替换原对象
    fn post_process_after_initialization(
        &self,
        bean: Bean,
        _bean_name: &str,
        _definition: &BeanDefinition,
    ) -> ContainerResult<Bean> {
        Ok(bean)
    }

    /// 名称，用于日志
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
