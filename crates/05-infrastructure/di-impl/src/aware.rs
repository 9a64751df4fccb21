//! 感知能力回调

use crate::factory::{capability_view, target_metadata};
use di_abstractions::{
    ApplicationContextAware, BeanDefinition, BeanLookup, BeanNameAware, BeanPostProcessor,
};
use std::sync::Arc;
use weave_common::{Bean, ContainerResult};

/// 感知能力处理器
///
/// 第一个注册的后置处理器。bean 的能力表中声明了 `dyn BeanNameAware` 或
/// `dyn ApplicationContextAware` 时，在初始化回调之前注入名称和上下文句柄。
pub struct AwareProcessor {
    context: Arc<dyn BeanLookup>,
}

impl AwareProcessor {
    /// 创建处理器
    pub fn new(context: Arc<dyn BeanLookup>) -> Self {
        Self { context }
    }
}

impl BeanPostProcessor for AwareProcessor {
    fn post_process_before_initialization(
        &self,
        bean: Bean,
        bean_name: &str,
        definition: &BeanDefinition,
    ) -> ContainerResult<Bean> {
        let metadata = target_metadata(definition, &bean);
        if let Some(aware) = capability_view::<dyn BeanNameAware>(metadata, &bean) {
            aware.set_bean_name(bean_name);
        }
        if let Some(aware) = capability_view::<dyn ApplicationContextAware>(metadata, &bean) {
            aware.set_application_context(self.context.clone());
        }
        Ok(bean)
    }

    fn name(&self) -> &str {
        "AwareProcessor"
    }
}
