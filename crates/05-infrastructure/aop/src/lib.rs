//! # Weave AOP
//!
//! 切面织入的基础设施：切点表达式、通知、通知器和代理。
//!
//! ## 核心组件
//!
//! - [`Pointcut`] - 切点表达式
//! - [`Advice`] - 前置、环绕、返回后、异常四种通知
//! - [`Advisor`] - 切点加一组有序通知
//! - [`AopProxy`] - 接口式与子类式代理
//!
//! 代理对外暴露类型化视图时，使用 [`proxy_view!`] 为接口能力声明代理视图，
//! 使用 [`subclass_view!`] 声明子类式代理的委托包装类型。

pub mod advice;
pub mod advisor;
pub mod pointcut;
pub mod proxy;

pub use advice::*;
pub use advisor::*;
pub use pointcut::*;
pub use proxy::*;

#[doc(hidden)]
pub mod __private {
    pub use std::sync::Arc;
    pub use weave_common::{Bean, Capability};
}

/// 为接口能力声明代理视图
///
/// `proxy_view!(dyn Trait => View)` 生成一个转换函数：bean 是 [`AopProxy`] 时，
/// 以 `View::from(Arc<AopProxy>)` 构造实现 `Trait` 的委托对象。
#[macro_export]
macro_rules! proxy_view {
    ($iface:ty => $view:ty) => {
        |bean: &$crate::__private::Bean| -> ::std::option::Option<$crate::__private::Arc<$iface>> {
            bean.clone()
                .downcast::<$crate::AopProxy>()
                .ok()
                .map(|proxy| $crate::__private::Arc::new(<$view>::from(proxy)) as $crate::__private::Arc<$iface>)
        }
    };
}

/// 声明子类式代理的委托包装类型
///
/// `subclass_view!(View)` 生成只能由代理提供的能力，`View` 需要实现 `From<Arc<AopProxy>>`。
#[macro_export]
macro_rules! subclass_view {
    ($view:ty) => {
        $crate::__private::Capability::proxy_only::<$view>(|bean: &$crate::__private::Bean| {
            bean.clone()
                .downcast::<$crate::AopProxy>()
                .ok()
                .map(|proxy| $crate::__private::Arc::new(<$view>::from(proxy)))
        })
    };
}
