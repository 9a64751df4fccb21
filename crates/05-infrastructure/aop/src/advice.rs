//! 通知与拦截器链

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use weave_common::{MethodSignature, TypeInfo};

/// 前置通知
pub type BeforeFn = Arc<dyn Fn(&JoinPoint) -> anyhow::Result<()> + Send + Sync>;

/// 环绕通知
pub type AroundFn = Arc<dyn Fn(&ProceedingJoinPoint<'_>) -> anyhow::Result<Value> + Send + Sync>;

/// 返回后通知
pub type AfterReturningFn = Arc<dyn Fn(&JoinPoint, &Value) -> anyhow::Result<()> + Send + Sync>;

/// 异常通知
pub type AfterThrowingFn = Arc<dyn Fn(&JoinPoint, &anyhow::Error) + Send + Sync>;

/// 通知
#[derive(Clone)]
pub enum Advice {
    /// 在调用下一环节之前执行，不能阻止调用
    Before(BeforeFn),
    /// 自行决定是否以及如何调用下一环节
    Around(AroundFn),
    /// 调用成功后执行，可以观察但不能替换返回值
    AfterReturning(AfterReturningFn),
    /// 调用失败后执行，错误总是继续向外传播
    AfterThrowing(AfterThrowingFn),
}

impl Advice {
    /// 创建前置通知
    pub fn before(f: impl Fn(&JoinPoint) -> anyhow::Result<()> + Send + Sync + 'static) -> Self {
        Self::Before(Arc::new(f))
    }

    /// 创建环绕通知
    pub fn around(
        f: impl Fn(&ProceedingJoinPoint<'_>) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self::Around(Arc::new(f))
    }

    /// 创建返回后通知
    pub fn after_returning(
        f: impl Fn(&JoinPoint, &Value) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self::AfterReturning(Arc::new(f))
    }

    /// 创建异常通知
    pub fn after_throwing(f: impl Fn(&JoinPoint, &anyhow::Error) + Send + Sync + 'static) -> Self {
        Self::AfterThrowing(Arc::new(f))
    }

    /// 通知类型名称
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Before(_) => "before",
            Self::Around(_) => "around",
            Self::AfterReturning(_) => "after-returning",
            Self::AfterThrowing(_) => "after-throwing",
        }
    }
}

impl fmt::Debug for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Advice({})", self.kind())
    }
}

/// 连接点：一次被拦截的方法调用
#[derive(Debug, Clone)]
pub struct JoinPoint {
    bean_name: String,
    target_type: TypeInfo,
    method: MethodSignature,
    args: Vec<Value>,
}

impl JoinPoint {
    /// 目标 bean 名称
    pub fn bean_name(&self) -> &str {
        &self.bean_name
    }

    /// 目标类型
    pub fn target_type(&self) -> &TypeInfo {
        &self.target_type
    }

    /// 方法签名
    pub fn method(&self) -> &MethodSignature {
        &self.method
    }

    /// 调用参数
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// 形如 `UserServiceImpl.get_user` 的简短描述
    pub fn short_description(&self) -> String {
        format!("{}.{}", self.target_type.short_name(), self.method.name)
    }
}

/// 可继续执行的连接点，提供给环绕通知
pub struct ProceedingJoinPoint<'a> {
    join_point: JoinPoint,
    invocation: &'a Invocation<'a>,
    next: usize,
}

impl ProceedingJoinPoint<'_> {
    /// 以原始参数调用下一环节
    pub fn proceed(&self) -> anyhow::Result<Value> {
        self.invocation.proceed(self.next, self.join_point.args.clone())
    }

    /// 以替换后的参数调用下一环节
    pub fn proceed_with(&self, args: Vec<Value>) -> anyhow::Result<Value> {
        self.invocation.proceed(self.next, args)
    }
}

impl std::ops::Deref for ProceedingJoinPoint<'_> {
    type Target = JoinPoint;

    fn deref(&self) -> &JoinPoint {
        &self.join_point
    }
}

/// 一次方法调用的拦截器链
pub(crate) struct Invocation<'a> {
    pub(crate) interceptors: &'a [Advice],
    pub(crate) bean_name: &'a str,
    pub(crate) target_type: &'a TypeInfo,
    pub(crate) method: &'a MethodSignature,
    pub(crate) target_call: &'a dyn Fn(&[Value]) -> anyhow::Result<Value>,
}

impl Invocation<'_> {
    /// 从第 `index` 个拦截器开始执行，链的末端调用真实目标
    pub(crate) fn proceed(&self, index: usize, args: Vec<Value>) -> anyhow::Result<Value> {
        let Some(advice) = self.interceptors.get(index) else {
            return (self.target_call)(&args);
        };
        let join_point = JoinPoint {
            bean_name: self.bean_name.to_string(),
            target_type: self.target_type.clone(),
            method: self.method.clone(),
            args,
        };
        match advice {
            Advice::Before(before) => {
                before(&join_point)?;
                self.proceed(index + 1, join_point.args)
            }
            Advice::Around(around) => around(&ProceedingJoinPoint {
                join_point,
                invocation: self,
                next: index + 1,
            }),
            Advice::AfterReturning(after) => {
                let value = self.proceed(index + 1, join_point.args.clone())?;
                after(&join_point, &value)?;
                Ok(value)
            }
            Advice::AfterThrowing(after) => self
                .proceed(index + 1, join_point.args.clone())
                .map_err(|err| {
                    after(&join_point, &err);
                    err
                }),
        }
    }
}
