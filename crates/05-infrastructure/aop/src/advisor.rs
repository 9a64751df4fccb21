//! 通知器：切点加一组有序的通知

use crate::advice::{Advice, JoinPoint, ProceedingJoinPoint};
use crate::pointcut::Pointcut;
use serde_json::Value;
use std::fmt;
use weave_common::{ContainerResult, MethodSignature, TypeInfo, TypeMetadata};

/// 通知器
///
/// 多个通知器作用于同一方法时按 `order` 升序排列，
/// `order` 相同时按注册顺序排列。
#[derive(Clone)]
pub struct Advisor {
    name: String,
    pointcut: Pointcut,
    advices: Vec<Advice>,
    order: i32,
}

impl Advisor {
    /// 以切点表达式创建通知器
    pub fn new(name: impl Into<String>, expression: &str) -> ContainerResult<Self> {
        Ok(Self::with_pointcut(name, Pointcut::parse(expression)?))
    }

    /// 以已解析的切点创建通知器
    pub fn with_pointcut(name: impl Into<String>, pointcut: Pointcut) -> Self {
        Self {
            name: name.into(),
            pointcut,
            advices: Vec::new(),
            order: 0,
        }
    }

    /// 添加前置通知
    pub fn before(
        mut self,
        f: impl Fn(&JoinPoint) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.advices.push(Advice::before(f));
        self
    }

    /// 添加环绕通知
    pub fn around(
        mut self,
        f: impl Fn(&ProceedingJoinPoint<'_>) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.advices.push(Advice::around(f));
        self
    }

    /// 添加返回后通知
    pub fn after_returning(
        mut self,
        f: impl Fn(&JoinPoint, &Value) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.advices.push(Advice::after_returning(f));
        self
    }

    /// 添加异常通知
    pub fn after_throwing(
        mut self,
        f: impl Fn(&JoinPoint, &anyhow::Error) + Send + Sync + 'static,
    ) -> Self {
        self.advices.push(Advice::after_throwing(f));
        self
    }

    /// 设置排序值
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// 名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 切点
    pub fn pointcut(&self) -> &Pointcut {
        &self.pointcut
    }

    /// 通知列表，按声明顺序
    pub fn advices(&self) -> &[Advice] {
        &self.advices
    }

    /// 排序值
    pub fn order_value(&self) -> i32 {
        self.order
    }

    /// 是否作用于 bean 的任意方法
    pub fn applies_to(&self, metadata: &TypeMetadata, bean_name: &str) -> bool {
        !self.advices.is_empty() && self.pointcut.matches_any(metadata, bean_name)
    }

    /// 是否作用于指定方法
    pub fn matches_method(
        &self,
        target: &TypeInfo,
        bean_name: &str,
        method: &MethodSignature,
    ) -> bool {
        self.pointcut.matches_method(target, bean_name, method)
    }
}

impl fmt::Debug for Advisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Advisor")
            .field("name", &self.name)
            .field("pointcut", &self.pointcut)
            .field("advices", &self.advices)
            .field("order", &self.order)
            .finish()
    }
}

/// 按 `order` 稳定排序，保持注册顺序作为次序
pub fn sort_advisors<T: AsRef<Advisor>>(advisors: &mut [T]) {
    advisors.sort_by_key(|advisor| advisor.as_ref().order);
}

impl AsRef<Self> for Advisor {
    fn as_ref(&self) -> &Self {
        self
    }
}
