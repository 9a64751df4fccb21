//! 条件注册
//!
//! 条件求值返回显式的保留或跳过结果。

use crate::registry::BeanDefinitionRegistry;
use std::fmt;
use weave_common::{ContainerConfig, TypeInfo};

/// 条件求值结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionOutcome {
    /// 保留
    Keep,
    /// 跳过
    Skip {
        /// 原因
        reason: String,
    },
}

impl ConditionOutcome {
    /// 条件成立时保留，否则以给定原因跳过
    pub fn keep_if(matched: bool, reason: impl FnOnce() -> String) -> Self {
        if matched {
            Self::Keep
        } else {
            Self::Skip { reason: reason() }
        }
    }

    /// 是否保留
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }
}

/// 条件求值阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigurationPhase {
    /// 解析配置类时
    ParseConfiguration,
    /// 注册 bean 定义时
    RegisterBean,
}

/// 条件求值上下文
pub struct ConditionContext<'a> {
    /// 当前注册表
    pub registry: &'a dyn BeanDefinitionRegistry,
    /// 容器配置
    pub config: &'a ContainerConfig,
    /// 被求值的类型
    pub type_info: &'a TypeInfo,
    /// 当前阶段
    pub phase: ConfigurationPhase,
}

/// 条件
pub trait Condition: Send + Sync {
    /// 求值
    fn matches(&self, context: &ConditionContext<'_>) -> ConditionOutcome;

    /// 只在指定阶段求值，`None` 表示任意阶段
    fn phase(&self) -> Option<ConfigurationPhase> {
        None
    }
}

/// 依据已注册的 bean 判断
#[derive(Debug, Clone, Default)]
pub struct OnBeanCondition {
    present: Vec<String>,
    missing: Vec<String>,
    present_types: Vec<TypeInfo>,
    missing_types: Vec<TypeInfo>,
}

impl OnBeanCondition {
    /// 要求指定名称的 bean 已注册
    pub fn present(name: impl Into<String>) -> Self {
        Self::default().and_present(name)
    }

    /// 要求指定名称的 bean 未注册
    pub fn missing(name: impl Into<String>) -> Self {
        Self::default().and_missing(name)
    }

    /// 要求指定类型的 bean 已注册
    pub fn present_type<T: ?Sized + 'static>() -> Self {
        Self {
            present_types: vec![TypeInfo::of::<T>()],
            ..Self::default()
        }
    }

    /// 要求指定类型的 bean 未注册
    pub fn missing_type<T: ?Sized + 'static>() -> Self {
        Self {
            missing_types: vec![TypeInfo::of::<T>()],
            ..Self::default()
        }
    }

    /// 追加已注册要求
    pub fn and_present(mut self, name: impl Into<String>) -> Self {
        self.present.push(name.into());
        self
    }

    /// 追加未注册要求
    pub fn and_missing(mut self, name: impl Into<String>) -> Self {
        self.missing.push(name.into());
        self
    }
}

impl Condition for OnBeanCondition {
    fn matches(&self, context: &ConditionContext<'_>) -> ConditionOutcome {
        let registry = context.registry;
        if let Some(name) = self
            .present
            .iter()
            .find(|name| !registry.contains_bean_definition(name))
        {
            return ConditionOutcome::Skip {
                reason: format!("缺少 bean: {name}"),
            };
        }
        if let Some(name) = self
            .missing
            .iter()
            .find(|name| registry.contains_bean_definition(name))
        {
            return ConditionOutcome::Skip {
                reason: format!("已存在 bean: {name}"),
            };
        }
        if let Some(type_info) = self
            .present_types
            .iter()
            .find(|t| registry.names_for_type(t.id).is_empty())
        {
            return ConditionOutcome::Skip {
                reason: format!("缺少类型为 {type_info} 的 bean"),
            };
        }
        if let Some(type_info) = self
            .missing_types
            .iter()
            .find(|t| !registry.names_for_type(t.id).is_empty())
        {
            return ConditionOutcome::Skip {
                reason: format!("已存在类型为 {type_info} 的 bean"),
            };
        }
        ConditionOutcome::Keep
    }

    fn phase(&self) -> Option<ConfigurationPhase> {
        Some(ConfigurationPhase::RegisterBean)
    }
}

/// 闭包条件
pub struct FnCondition<F> {
    predicate: F,
    phase: Option<ConfigurationPhase>,
    description: String,
}

impl<F> FnCondition<F> {
    /// 限定求值阶段
    pub fn in_phase(mut self, phase: ConfigurationPhase) -> Self {
        self.phase = Some(phase);
        self
    }
}

impl<F> Condition for FnCondition<F>
where
    F: Fn(&ConditionContext<'_>) -> bool + Send + Sync,
{
    fn matches(&self, context: &ConditionContext<'_>) -> ConditionOutcome {
        ConditionOutcome::keep_if((self.predicate)(context), || {
            format!("条件不成立: {}", self.description)
        })
    }

    fn phase(&self) -> Option<ConfigurationPhase> {
        self.phase
    }
}

impl<F> fmt::Debug for FnCondition<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCondition")
            .field("description", &self.description)
            .field("phase", &self.phase)
            .finish()
    }
}

/// 以闭包创建条件
pub fn from_fn<F>(description: impl Into<String>, predicate: F) -> FnCondition<F>
where
    F: Fn(&ConditionContext<'_>) -> bool + Send + Sync,
{
    FnCondition {
        predicate,
        phase: None,
        description: description.into(),
    }
}
