//! bean 工厂抽象接口
//!
//! 生产函数、回调函数的类型，以及工厂 bean 协议

use crate::resolver::BeanResolver;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use weave_common::{Bean, BeanView, TypeInfo, TypeMetadata};

/// 构造函数：通过解析器拉取依赖并创建原始对象
pub type ConstructorFn = Arc<dyn Fn(&mut dyn BeanResolver) -> anyhow::Result<Bean> + Send + Sync>;

/// 工厂方法：在声明它的配置 bean 上调用
pub type FactoryMethodFn =
    Arc<dyn Fn(&Bean, &mut dyn BeanResolver) -> anyhow::Result<Bean> + Send + Sync>;

/// 初始化或销毁回调
pub type CallbackFn = Arc<dyn Fn(&Bean) -> anyhow::Result<()> + Send + Sync>;

/// 注入函数：把解析到的依赖（可选依赖未找到时为 `None`）交给 bean
pub type InjectFn = Arc<dyn Fn(&Bean, Option<BeanView>) -> anyhow::Result<()> + Send + Sync>;

/// 把返回具体类型的构造闭包包装为 [`ConstructorFn`]
pub fn constructor_fn<T, F>(f: F) -> ConstructorFn
where
    T: Any + Send + Sync,
    F: Fn(&mut dyn BeanResolver) -> anyhow::Result<T> + Send + Sync + 'static,
{
    Arc::new(move |resolver: &mut dyn BeanResolver| Ok(Arc::new(f(resolver)?) as Bean))
}

/// 把作用于具体类型的回调包装为 [`CallbackFn`]
pub fn callback_fn<T, F>(f: F) -> CallbackFn
where
    T: Any + Send + Sync,
    F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(move |bean: &Bean| {
        let target = bean.downcast_ref::<T>().ok_or_else(|| {
            anyhow::anyhow!("回调目标不是 {}", std::any::type_name::<T>())
        })?;
        f(target)
    })
}

/// 工厂 bean
///
/// 注册名称解析为 [`FactoryBean::get_object`] 的产物，
/// `&名称` 解析为工厂 bean 自身。
pub trait FactoryBean: Send + Sync {
    /// 生产对象
    fn get_object(&self) -> anyhow::Result<Bean>;

    /// 产物类型，`None` 表示以声明的产物元数据为准
    fn object_type(&self) -> Option<TypeInfo> {
        None
    }

    /// 产物是否为单例
    fn is_singleton(&self) -> bool {
        true
    }
}

/// 工厂 bean 适配信息
///
/// 声明产物的类型元数据，使容器在实例化之前就能按类型找到产物。
#[derive(Clone)]
pub struct FactoryBeanAdapter {
    /// 产物的类型元数据
    pub product: Arc<TypeMetadata>,
    cast: Arc<dyn Fn(&Bean) -> Option<Arc<dyn FactoryBean>> + Send + Sync>,
}

impl FactoryBeanAdapter {
    /// 为具体的工厂 bean 类型创建适配信息
    pub fn of<F: FactoryBean + 'static>(product: TypeMetadata) -> Self {
        Self {
            product: Arc::new(product),
            cast: Arc::new(|bean: &Bean| {
                bean.clone()
                    .downcast::<F>()
                    .ok()
                    .map(|factory| factory as Arc<dyn FactoryBean>)
            }),
        }
    }

    /// 把原始对象视为工厂 bean
    pub fn as_factory(&self, bean: &Bean) -> Option<Arc<dyn FactoryBean>> {
        (self.cast)(bean)
    }
}

impl fmt::Debug for FactoryBeanAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryBeanAdapter")
            .field("product", &self.product.type_info)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Order;

    #[derive(Default)]
    struct OrderFactory {
        produced: AtomicUsize,
    }

    impl FactoryBean for OrderFactory {
        fn get_object(&self) -> anyhow::Result<Bean> {
            self.produced.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Order))
        }
    }

    #[test]
    fn test_adapter_casts_only_declared_factory() {
        let adapter = FactoryBeanAdapter::of::<OrderFactory>(TypeMetadata::of::<Order>());
        let factory: Bean = Arc::new(OrderFactory::default());
        let product = adapter
            .as_factory(&factory)
            .expect("应当识别为工厂 bean")
            .get_object()
            .unwrap();
        assert!(product.downcast_ref::<Order>().is_some());

        let not_factory: Bean = Arc::new(Order);
        assert!(adapter.as_factory(&not_factory).is_none());
    }

    #[test]
    fn test_callback_fn_rejects_wrong_target() {
        let callback = callback_fn(|_order: &Order| Ok(()));
        assert!(callback(&(Arc::new(Order) as Bean)).is_ok());
        assert!(callback(&(Arc::new(1_u8) as Bean)).is_err());
    }
}
