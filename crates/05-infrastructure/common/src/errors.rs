//! 错误类型定义

use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// 共享的错误来源
///
/// 使用 `Arc` 使错误可以被克隆，多个并发等待同一单例的调用方会观察到同一个失败。
pub type ErrorSource = Arc<dyn StdError + Send + Sync>;

/// 容器错误类型
#[derive(Error, Debug, Clone)]
pub enum ContainerError {
    #[error("重复的 bean 定义: {name}, 原因: {message}")]
    DuplicateDefinition { name: String, message: String },

    #[error("找不到 bean: {name}")]
    NoSuchBean { name: String },

    #[error("类型 {type_name} 存在多个候选 bean: {candidates:?}")]
    NoUniqueBeanOfType {
        type_name: String,
        candidates: Vec<String>,
    },

    #[error("检测到循环依赖: {}", chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    #[error("bean 创建失败: {bean_name}, 原因: {message}")]
    BeanCreation {
        bean_name: String,
        message: String,
        #[source]
        source: Option<ErrorSource>,
    },

    #[error("bean {name} 不是期望的类型 {required_type}")]
    BeanNotOfRequiredType {
        name: String,
        required_type: String,
    },

    #[error("检测到配置类循环导入: {}", chain.join(" -> "))]
    ConfigurationCycle { chain: Vec<String> },

    #[error("后置处理器在 {rounds} 轮之后仍在注册新的处理器")]
    PostProcessorNonTermination { rounds: usize },

    #[error("bean 定义无效: {name}, 原因: {message}")]
    DefinitionValidation { name: String, message: String },

    #[error("代理创建失败: {bean_name}, 原因: {message}")]
    ProxyCreation { bean_name: String, message: String },

    #[error("容器生命周期错误: {message}")]
    Lifecycle { message: String },

    #[error("容器配置错误: {message}")]
    Configuration { message: String },
}

impl ContainerError {
    /// 创建找不到 bean 错误
    pub fn no_such_bean(name: impl Into<String>) -> Self {
        Self::NoSuchBean { name: name.into() }
    }

    /// 创建生命周期错误
    pub fn lifecycle(message: impl Into<String>) -> Self {
        Self::Lifecycle {
            message: message.into(),
        }
    }

    /// 创建定义校验错误
    pub fn validation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DefinitionValidation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// 创建重复定义错误
    pub fn duplicate(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DuplicateDefinition {
            name: name.into(),
            message: message.into(),
        }
    }

    /// 创建代理错误
    pub fn proxy(bean_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProxyCreation {
            bean_name: bean_name.into(),
            message: message.into(),
        }
    }

    /// 创建 bean 创建失败错误
    pub fn creation(
        bean_name: impl Into<String>,
        message: impl Into<String>,
        source: Option<ErrorSource>,
    ) -> Self {
        Self::BeanCreation {
            bean_name: bean_name.into(),
            message: message.into(),
            source,
        }
    }

    /// 把用户回调返回的错误还原为容器错误
    ///
    /// 如果错误本身就是 `ContainerError`（例如在生产函数中解析依赖失败），原样取回；
    /// 否则作为 `BeanCreation` 的来源。
    pub fn from_callback(bean_name: &str, message: &str, err: anyhow::Error) -> Self {
        match err.downcast::<ContainerError>() {
            Ok(container_error) => container_error,
            Err(other) => {
                let boxed: Box<dyn StdError + Send + Sync> = other.into();
                Self::creation(bean_name, message, Some(Arc::from(boxed)))
            }
        }
    }

    /// 以 bean 名称包装错误
    ///
    /// 循环依赖错误不包装，以便刷新时直接报告完整的依赖链；
    /// 已经以同一名称包装过的错误也不再重复包装。
    pub fn wrap_creation(self, bean_name: &str, message: impl Into<String>) -> Self {
        match self {
            Self::CircularDependency { .. } => self,
            Self::BeanCreation { bean_name: ref name, .. } if name == bean_name => self,
            other => Self::creation(bean_name, message, Some(Arc::new(other))),
        }
    }

    /// 获取最内层的容器错误
    pub fn root_cause(&self) -> &ContainerError {
        let mut current = self;
        while let Self::BeanCreation {
            source: Some(source),
            ..
        } = current
        {
            match source.downcast_ref::<ContainerError>() {
                Some(inner) => current = inner,
                None => break,
            }
        }
        current
    }

    /// 是否为循环依赖错误（包括被包装的情况）
    pub fn is_circular_dependency(&self) -> bool {
        matches!(self.root_cause(), Self::CircularDependency { .. })
    }
}

/// 结果类型别名
pub type ContainerResult<T> = Result<T, ContainerError>;
