//! 条件求值

use di_abstractions::{
    BeanDefinitionRegistry, Condition, ConditionContext, ConditionOutcome, ConfigurationPhase,
};
use std::sync::Arc;
use tracing::debug;
use weave_common::{ContainerConfig, TypeInfo};

/// 条件求值器
///
/// 依次求值条件标记，返回第一个跳过结果；没有声明阶段的条件在任意阶段都会求值。
pub struct ConditionEvaluator<'a> {
    registry: &'a dyn BeanDefinitionRegistry,
    config: &'a ContainerConfig,
}

impl<'a> ConditionEvaluator<'a> {
    /// 创建求值器
    pub fn new(registry: &'a dyn BeanDefinitionRegistry, config: &'a ContainerConfig) -> Self {
        Self { registry, config }
    }

    /// 在指定阶段求值
    pub fn evaluate(
        &self,
        conditions: &[Arc<dyn Condition>],
        type_info: &TypeInfo,
        phase: ConfigurationPhase,
    ) -> ConditionOutcome {
        let context = ConditionContext {
            registry: self.registry,
            config: self.config,
            type_info,
            phase,
        };
        for condition in conditions {
            if condition.phase().is_some_and(|required| required != phase) {
                continue;
            }
            let outcome = condition.matches(&context);
            if let ConditionOutcome::Skip { reason } = &outcome {
                debug!("条件不满足，跳过 {} ({:?}): {}", type_info, phase, reason);
                return outcome;
            }
        }
        ConditionOutcome::Keep
    }

    /// 是否应当跳过
    pub fn should_skip(
        &self,
        conditions: &[Arc<dyn Condition>],
        type_info: &TypeInfo,
        phase: ConfigurationPhase,
    ) -> bool {
        !self.evaluate(conditions, type_info, phase).is_keep()
    }
}
