//! 代理织入
//!
//! 作为最后一个初始化后处理器执行：收集切点匹配 bean 任意方法的通知器，
//! 有匹配时以代理替换原对象。

use crate::factory::{target_metadata, DefaultBeanFactory};
use di_abstractions::{typed, BeanDefinition, BeanDefinitionRegistry, BeanPostProcessor, Role};
use std::any::TypeId;
use std::sync::{Arc, Weak};
use tracing::{debug, info};
use weave_aop::{sort_advisors, Advisor, AopProxy, SingletonTargetSource};
use weave_common::{Bean, ContainerConfig, ContainerResult, TypeInfo};

/// 代理织入器
pub struct ProxyWeaver {
    factory: Weak<DefaultBeanFactory>,
    advisors: Vec<Arc<Advisor>>,
}

impl ProxyWeaver {
    /// 创建织入器，`advisors` 为编程添加的通知器
    pub fn new(factory: &Arc<DefaultBeanFactory>, advisors: Vec<Arc<Advisor>>) -> Self {
        Self {
            factory: Arc::downgrade(factory),
            advisors,
        }
    }

    /// 是否需要启用织入：配置开启、存在编程添加的通知器，或某个配置类启用了自动代理
    pub fn is_enabled(
        config: &ContainerConfig,
        registry: &dyn BeanDefinitionRegistry,
        has_advisors: bool,
    ) -> bool {
        if config.auto_proxy || has_advisors {
            return true;
        }
        registry.get_bean_definition_names().iter().any(|name| {
            registry.get_bean_definition(name).is_ok_and(|definition| {
                definition
                    .source
                    .as_ref()
                    .is_some_and(|source| source.enable_auto_proxy)
            })
        })
    }

    fn candidate_advisors(&self, factory: &DefaultBeanFactory) -> ContainerResult<Vec<Arc<Advisor>>> {
        let type_info = TypeInfo::of::<Advisor>();
        let mut advisors = self.advisors.clone();
        for name in factory.registry().names_for_type(TypeId::of::<Advisor>()) {
            if factory.is_currently_in_creation(&name) {
                debug!("通知器 {} 正在创建，跳过", name);
                continue;
            }
            let view = factory.get_view(&name, &type_info)?;
            advisors.push(typed::<Advisor>(&name, &view, &type_info)?);
        }
        Ok(advisors)
    }
}

impl BeanPostProcessor for ProxyWeaver {
    fn post_process_after_initialization(
        &self,
        bean: Bean,
        bean_name: &str,
        definition: &BeanDefinition,
    ) -> ContainerResult<Bean> {
        if definition.role == Role::Infrastructure || bean.is::<AopProxy>() {
            return Ok(bean);
        }
        let Some(factory) = self.factory.upgrade() else {
            return Ok(bean);
        };

        let metadata = target_metadata(definition, &bean).clone();
        let mut advisors: Vec<Arc<Advisor>> = self
            .candidate_advisors(&factory)?
            .into_iter()
            .filter(|advisor| advisor.applies_to(&metadata, bean_name))
            .collect();
        if advisors.is_empty() {
            return Ok(bean);
        }
        sort_advisors(&mut advisors);

        let proxy = AopProxy::create(
            bean_name,
            metadata,
            Arc::new(SingletonTargetSource::new(bean)),
            &advisors,
        )?;
        info!(
            "为 bean {} 创建 {:?} 代理，通知器: {:?}",
            bean_name,
            proxy.kind(),
            proxy.advisor_names()
        );
        Ok(Arc::new(proxy))
    }

    fn name(&self) -> &str {
        "ProxyWeaver"
    }
}
