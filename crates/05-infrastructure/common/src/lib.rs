//! # Weave Common
//!
//! 这个 crate 提供了 Weave 容器各层共用的类型和工具。
//!
//! ## 核心组件
//!
//! - [`ContainerError`] - 容器错误分类
//! - [`TypeMetadata`] - bean 类型元数据（能力表、方法签名、分派表）
//! - [`NamingConventions`] - bean 命名约定
//! - [`ContainerConfig`] - 容器配置
//! - [`Lifecycle`] - 可启停 bean 的生命周期
//!
//! ## 设计原则
//!
//! - 元数据由外部提供，容器核心不做运行时反射
//! - 没有进程级的全局容器，所有查找都通过显式传递的上下文

pub mod configuration;
pub mod conventions;
pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use configuration::*;
pub use conventions::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
