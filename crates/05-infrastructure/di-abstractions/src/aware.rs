//! 感知能力
//!
//! bean 通过能力表暴露这些 trait 后，会在初始化后的第一个后置处理步骤中收到回调。

use crate::resolver::BeanLookup;
use std::sync::Arc;

/// 需要上下文句柄的 bean
pub trait ApplicationContextAware: Send + Sync {
    /// 设置上下文句柄
    fn set_application_context(&self, context: Arc<dyn BeanLookup>);
}

/// 需要知道自身名称的 bean
pub trait BeanNameAware: Send + Sync {
    /// 设置 bean 名称
    fn set_bean_name(&self, name: &str);
}
