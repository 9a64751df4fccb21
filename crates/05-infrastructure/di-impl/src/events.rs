//! 事件广播

use crate::factory::{capability_view, target_metadata};
use di_abstractions::{ApplicationListener, BeanDefinition, BeanPostProcessor, ContextEvent};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error};
use weave_common::{Bean, ContainerResult};

type Registration = (Option<String>, Arc<dyn ApplicationListener>);

/// 事件广播器
///
/// 监听器按添加顺序同步收到事件；监听器返回的错误只记录日志，不影响其他监听器。
#[derive(Default)]
pub struct EventMulticaster {
    listeners: RwLock<Vec<Registration>>,
}

impl EventMulticaster {
    /// 创建广播器
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加监听器，同名或同一个对象只添加一次
    pub fn add_listener(&self, name: Option<&str>, listener: Arc<dyn ApplicationListener>) {
        let mut listeners = self.listeners.write();
        let exists = listeners.iter().any(|(existing_name, existing)| {
            Arc::ptr_eq(existing, &listener)
                || (name.is_some() && existing_name.as_deref() == name)
        });
        if exists {
            return;
        }
        debug!("添加事件监听器: {}", name.unwrap_or("<编程添加>"));
        listeners.push((name.map(str::to_string), listener));
    }

    /// 监听器数量
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// 广播事件
    pub fn multicast(&self, event: &ContextEvent) {
        let listeners = self.listeners.read().clone();
        debug!("广播事件 {} 给 {} 个监听器", event.name(), listeners.len());
        for (name, listener) in listeners {
            if !listener.supports(event) {
                continue;
            }
            if let Err(e) = listener.on_event(event) {
                error!(
                    "监听器 {} 处理事件 {} 失败: {:#}",
                    name.as_deref().unwrap_or("<编程添加>"),
                    event.name(),
                    e
                );
            }
        }
    }
}

/// 监听器探测器：把单例监听器 bean 加入广播器
pub struct ListenerDetector {
    multicaster: Arc<EventMulticaster>,
}

impl ListenerDetector {
    /// 创建探测器
    pub fn new(multicaster: Arc<EventMulticaster>) -> Self {
        Self { multicaster }
    }
}

impl BeanPostProcessor for ListenerDetector {
    fn post_process_after_initialization(
        &self,
        bean: Bean,
        bean_name: &str,
        definition: &BeanDefinition,
    ) -> ContainerResult<Bean> {
        if definition.is_singleton() {
            let metadata = target_metadata(definition, &bean);
            if let Some(listener) = capability_view::<dyn ApplicationListener>(metadata, &bean) {
                self.multicaster.add_listener(Some(bean_name), listener);
            }
        }
        Ok(bean)
    }

    fn name(&self) -> &str {
        "ListenerDetector"
    }
}
