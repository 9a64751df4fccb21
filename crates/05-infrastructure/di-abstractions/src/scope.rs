//! 作用域抽象接口

use weave_common::{Bean, ContainerResult};

/// 自定义作用域
///
/// 单例和原型之外的作用域都通过此接口管理实例。
pub trait Scope: Send + Sync {
    /// 获取当前作用域中的实例，不存在时通过 `object_factory` 创建
    fn get(
        &self,
        name: &str,
        object_factory: &mut dyn FnMut() -> ContainerResult<Bean>,
    ) -> ContainerResult<Bean>;

    /// 从当前作用域移除实例
    fn remove(&self, name: &str) -> Option<Bean>;

    /// 当前作用域的标识
    fn conversation_id(&self) -> Option<String> {
        None
    }
}
