//! # 依赖注入具体实现
//!
//! 提供 bean 定义注册表、配置类解析、后置处理器流水线、bean 工厂、代理织入
//! 以及管理整个生命周期的应用上下文。
//!
//! ## 刷新流程
//!
//! 1. 注册组件类型，扫描根包
//! 2. 按顺序执行注册表后置处理器（配置类解析总是第一个）和工厂后置处理器
//! 3. 校验作用域和 `depends_on` 关系
//! 4. 注册 bean 后置处理器：感知回调、用户处理器、监听器探测、代理织入
//! 5. 冻结注册表，预实例化非延迟单例

pub mod aware;
pub mod builder;
pub mod condition;
pub mod context;
pub mod events;
pub mod factory;
pub mod parser;
pub mod pipeline;
pub mod registry;
pub mod scope;
pub mod weaver;

pub use aware::AwareProcessor;
pub use builder::{ContextBuilder, LoggingConfig};
pub use condition::ConditionEvaluator;
pub use context::ApplicationContext;
pub use events::{EventMulticaster, ListenerDetector};
pub use factory::DefaultBeanFactory;
pub use parser::{component_name, ConfigurationClassPostProcessor, ConfigurationParser, ParserState};
pub use pipeline::{PipelineReport, PostProcessorPipeline};
pub use registry::DefaultBeanDefinitionRegistry;
pub use scope::{ScopeResolver, ThreadScope};
pub use weaver::ProxyWeaver;
