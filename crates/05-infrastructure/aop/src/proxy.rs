//! 动态代理
//!
//! 代理不生成代码，而是以数据描述：目标来源、按方法预先计算好的拦截器链，
//! 以及类型元数据中的方法分派表。接口式代理通过接口能力的代理视图对外暴露，
//! 子类式代理通过元数据中声明的委托包装类型对外暴露。

use crate::advice::{Advice, Invocation};
use crate::advisor::Advisor;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use weave_common::{Bean, ContainerError, ContainerResult, Invoker, MethodSignature, TypeMetadata};

/// 代理类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    /// 实现相同接口能力的分派代理
    Interface,
    /// 委托包装类型代理
    Subclass,
}

/// 目标来源
pub trait TargetSource: Send + Sync {
    /// 获取当前调用的目标
    fn target(&self) -> anyhow::Result<Bean>;

    /// 目标是否固定不变
    fn is_static(&self) -> bool {
        true
    }
}

/// 固定目标
pub struct SingletonTargetSource {
    target: Bean,
}

impl SingletonTargetSource {
    /// 创建固定目标来源
    pub fn new(target: Bean) -> Self {
        Self { target }
    }
}

impl TargetSource for SingletonTargetSource {
    fn target(&self) -> anyhow::Result<Bean> {
        Ok(self.target.clone())
    }
}

/// 每次调用时重新查找目标，用于作用域代理
pub struct LookupTargetSource {
    lookup: Box<dyn Fn() -> anyhow::Result<Bean> + Send + Sync>,
}

impl LookupTargetSource {
    /// 创建查找式目标来源
    pub fn new(lookup: impl Fn() -> anyhow::Result<Bean> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }
}

impl TargetSource for LookupTargetSource {
    fn target(&self) -> anyhow::Result<Bean> {
        (self.lookup)()
    }

    fn is_static(&self) -> bool {
        false
    }
}

/// AOP 代理
pub struct AopProxy {
    bean_name: String,
    kind: ProxyKind,
    metadata: Arc<TypeMetadata>,
    invoker: Invoker,
    target_source: Arc<dyn TargetSource>,
    advisors: Vec<String>,
    chains: HashMap<String, (MethodSignature, Vec<Advice>)>,
}

impl AopProxy {
    /// 创建代理
    ///
    /// `advisors` 需要已经排好序。类型实现了接口能力时创建接口式代理，
    /// 否则创建子类式代理；不可子类化或没有委托包装类型时失败。
    pub fn create(
        bean_name: &str,
        metadata: Arc<TypeMetadata>,
        target_source: Arc<dyn TargetSource>,
        advisors: &[Arc<Advisor>],
    ) -> ContainerResult<Self> {
        let kind = if metadata.interfaces.is_empty() {
            if metadata.sealed {
                return Err(ContainerError::proxy(
                    bean_name,
                    format!("类型 {} 不可子类化", metadata.type_info),
                ));
            }
            if metadata.subclass_view.is_none() {
                return Err(ContainerError::proxy(
                    bean_name,
                    format!("类型 {} 没有声明子类代理视图", metadata.type_info),
                ));
            }
            ProxyKind::Subclass
        } else {
            ProxyKind::Interface
        };
        let invoker = metadata.invoker.clone().ok_or_else(|| {
            ContainerError::proxy(
                bean_name,
                format!("类型 {} 没有方法分派表", metadata.type_info),
            )
        })?;

        let chains = metadata
            .methods
            .iter()
            .map(|method| {
                let interceptors = advisors
                    .iter()
                    .filter(|advisor| advisor.matches_method(&metadata.type_info, bean_name, method))
                    .flat_map(|advisor| advisor.advices().iter().cloned())
                    .collect();
                (method.name.clone(), (method.clone(), interceptors))
            })
            .collect();

        debug!(
            "创建 {:?} 代理: {} ({}), 通知器: {:?}",
            kind,
            bean_name,
            metadata.type_info,
            advisors.iter().map(|a| a.name()).collect::<Vec<_>>()
        );

        Ok(Self {
            bean_name: bean_name.to_string(),
            kind,
            metadata,
            invoker,
            target_source,
            advisors: advisors.iter().map(|a| a.name().to_string()).collect(),
            chains,
        })
    }

    /// 调用方法，参数和返回值以 JSON 值传递
    pub fn invoke(&self, method: &str, args: Vec<Value>) -> anyhow::Result<Value> {
        let target = self.target_source.target()?;
        let target_call = |args: &[Value]| self.call_target(&target, method, args);
        match self.chains.get(method) {
            Some((signature, interceptors)) => Invocation {
                interceptors,
                bean_name: &self.bean_name,
                target_type: &self.metadata.type_info,
                method: signature,
                target_call: &target_call,
            }
            .proceed(0, args),
            None => target_call(&args),
        }
    }

    /// 调用方法并把返回值反序列化为指定类型
    pub fn invoke_as<R: DeserializeOwned>(&self, method: &str, args: Vec<Value>) -> anyhow::Result<R> {
        Ok(serde_json::from_value(self.invoke(method, args)?)?)
    }

    fn call_target(&self, target: &Bean, method: &str, args: &[Value]) -> anyhow::Result<Value> {
        match target.downcast_ref::<Self>() {
            Some(inner) => inner.invoke(method, args.to_vec()),
            None => (self.invoker)(target, method, args),
        }
    }

    /// 当前目标对象
    pub fn target(&self) -> anyhow::Result<Bean> {
        self.target_source.target()
    }

    /// bean 名称
    pub fn bean_name(&self) -> &str {
        &self.bean_name
    }

    /// 代理类型
    pub fn kind(&self) -> ProxyKind {
        self.kind
    }

    /// 被代理类型的元数据
    pub fn metadata(&self) -> &Arc<TypeMetadata> {
        &self.metadata
    }

    /// 作用于该代理的通知器名称
    pub fn advisor_names(&self) -> &[String] {
        &self.advisors
    }

    /// 方法是否有拦截器
    pub fn is_advised(&self, method: &str) -> bool {
        self.chains
            .get(method)
            .is_some_and(|(_, interceptors)| !interceptors.is_empty())
    }

    /// 目标是否随每次调用重新查找
    pub fn is_dynamic(&self) -> bool {
        !self.target_source.is_static()
    }
}

impl fmt::Debug for AopProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AopProxy")
            .field("bean_name", &self.bean_name)
            .field("kind", &self.kind)
            .field("type", &self.metadata.type_info.module_path)
            .field("advisors", &self.advisors)
            .finish()
    }
}
