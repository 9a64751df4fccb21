//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义容器的声明式输入和各扩展点的接口。
//!
//! ## 核心接口
//!
//! - [`TypeDescriptor`] - 元数据提取机制交给容器的类型描述符
//! - [`BeanDefinition`] - 注册表中的 bean 定义
//! - [`BeanDefinitionRegistry`] - bean 定义注册表接口
//! - [`BeanResolver`] / [`BeanLookup`] - 依赖解析与上下文查找接口
//! - [`BeanPostProcessor`] 等后置处理器接口
//! - [`ComponentScanner`] - 组件扫描器接口
//! - [`FactoryBean`] - 工厂 bean 协议

pub mod aware;
pub mod condition;
pub mod definition;
pub mod descriptor;
pub mod events;
pub mod factory;
pub mod processor;
pub mod registry;
pub mod resolver;
pub mod scanner;
pub mod scope;

pub use aware::*;
pub use condition::*;
pub use definition::*;
pub use descriptor::*;
pub use events::*;
pub use factory::*;
pub use processor::*;
pub use registry::*;
pub use resolver::*;
pub use scanner::*;
pub use scope::*;
