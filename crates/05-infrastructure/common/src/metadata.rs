//! 元数据定义
//!
//! 提供 bean 类型、能力（可暴露的类型视图）和方法签名的元数据信息。
//! 这些元数据由外部的元数据提取机制提供，容器核心从不自行检查类型内部结构。

use serde_json::Value;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// 容器管理的对象
pub type Bean = Arc<dyn Any + Send + Sync>;

/// bean 的类型化视图，内部保存一个 `Arc<T>`（`T` 可以是 `dyn Trait`）
pub type BeanView = Arc<dyn Any + Send + Sync>;

/// 从 bean 得到类型化视图的转换函数
pub type CastFn = Arc<dyn Fn(&Bean) -> Option<BeanView> + Send + Sync>;

/// 方法分派表：按方法名调用真实目标
pub type Invoker = Arc<dyn Fn(&Bean, &str, &[Value]) -> anyhow::Result<Value> + Send + Sync>;

/// 类型信息
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    /// 类型名称
    pub name: String,
    /// 类型ID
    pub id: TypeId,
    /// 模块路径
    pub module_path: String,
}

impl TypeInfo {
    /// 从类型获取类型信息，支持 `dyn Trait`
    pub fn of<T: ?Sized + 'static>() -> Self {
        let full = std::any::type_name::<T>();
        let full = full.strip_prefix("dyn ").unwrap_or(full);
        let full = full.split(" + ").next().unwrap_or(full);
        let base = full.split('<').next().unwrap_or(full);
        Self {
            name: base.rsplit("::").next().unwrap_or("Unknown").to_string(),
            id: TypeId::of::<T>(),
            module_path: base.to_string(),
        }
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &str {
        self.name.split("::").last().unwrap_or(&self.name)
    }

    /// 类型所在的包（模块路径去掉类型名）
    pub fn package(&self) -> &str {
        self.module_path
            .rsplit_once("::")
            .map_or("", |(package, _)| package)
    }

    /// 以点号分隔的全限定名称，用于切点匹配
    pub fn qualified_name(&self) -> String {
        self.module_path.replace("::", ".")
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.module_path)
    }
}

/// 方法签名
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    /// 方法名称
    pub name: String,
    /// 参数类型名称
    pub params: Vec<String>,
    /// 返回类型名称
    pub returns: String,
}

impl MethodSignature {
    /// 创建无参数、无返回值的方法签名
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: "()".to_string(),
        }
    }

    /// 添加参数类型
    pub fn param(mut self, type_name: impl Into<String>) -> Self {
        self.params.push(type_name.into());
        self
    }

    /// 设置返回类型
    pub fn returns(mut self, type_name: impl Into<String>) -> Self {
        self.returns = type_name.into();
        self
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}({})", self.returns, self.name, self.params.join(", "))
    }
}

/// 能力：bean 可以被当作某个类型（具体类型或 `dyn Trait`）来获取
///
/// `cast` 作用于原始对象；`proxy_cast` 作用于代替原始对象的代理对象，
/// 由它构造实现同一能力的委托包装类型。
#[derive(Clone)]
pub struct Capability {
    type_info: TypeInfo,
    cast: Option<CastFn>,
    proxy_cast: Option<CastFn>,
}

impl Capability {
    /// 具体类型自身的能力
    pub fn of<T: Any + Send + Sync>() -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            cast: Some(Arc::new(|bean: &Bean| {
                bean.clone()
                    .downcast::<T>()
                    .ok()
                    .map(|concrete| Arc::new(concrete) as BeanView)
            })),
            proxy_cast: None,
        }
    }

    /// 以自定义转换函数声明能力，通常用于 `dyn Trait`
    pub fn new<I>(cast: impl Fn(&Bean) -> Option<Arc<I>> + Send + Sync + 'static) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        Self {
            type_info: TypeInfo::of::<I>(),
            cast: Some(erase(cast)),
            proxy_cast: None,
        }
    }

    /// 只能由代理对象提供的能力（子类式代理生成的委托类型）
    pub fn proxy_only<I>(view: impl Fn(&Bean) -> Option<Arc<I>> + Send + Sync + 'static) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        Self {
            type_info: TypeInfo::of::<I>(),
            cast: None,
            proxy_cast: Some(erase(view)),
        }
    }

    /// 设置代理视图：bean 被代理替换后，由代理构造该能力的实现
    pub fn with_proxy_view<I>(
        mut self,
        view: impl Fn(&Bean) -> Option<Arc<I>> + Send + Sync + 'static,
    ) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        debug_assert_eq!(self.type_info.id, TypeId::of::<I>(), "代理视图类型与能力类型不一致");
        self.proxy_cast = Some(erase(view));
        self
    }

    /// 能力对应的类型信息
    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// 能力对应的类型ID
    pub fn type_id(&self) -> TypeId {
        self.type_info.id
    }

    /// 是否可以由代理对象提供
    pub fn has_proxy_view(&self) -> bool {
        self.proxy_cast.is_some()
    }

    /// 转换为类型化视图：先尝试原始对象，再尝试代理对象
    pub fn cast(&self, bean: &Bean) -> Option<BeanView> {
        self.cast
            .as_ref()
            .and_then(|cast| cast(bean))
            .or_else(|| self.proxy_cast.as_ref().and_then(|view| view(bean)))
    }
}

fn erase<I>(cast: impl Fn(&Bean) -> Option<Arc<I>> + Send + Sync + 'static) -> CastFn
where
    I: ?Sized + Send + Sync + 'static,
{
    Arc::new(move |bean: &Bean| cast(bean).map(|typed| Arc::new(typed) as BeanView))
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("type_info", &self.type_info.module_path)
            .field("cast", &self.cast.is_some())
            .field("proxy_cast", &self.proxy_cast.is_some())
            .finish()
    }
}

/// 从类型化视图中取出 `Arc<T>`
pub fn view_as<T: ?Sized + 'static>(view: &BeanView) -> Option<Arc<T>> {
    view.downcast_ref::<Arc<T>>().cloned()
}

/// 声明能力
///
/// - `capability!(Impl)` 声明具体类型自身
/// - `capability!(Impl => dyn Trait)` 声明 `Impl` 实现的接口能力
#[macro_export]
macro_rules! capability {
    ($ty:ty) => {
        $crate::Capability::of::<$ty>()
    };
    ($ty:ty => $iface:ty) => {
        $crate::Capability::new::<$iface>(|bean: &$crate::Bean| {
            bean.clone()
                .downcast::<$ty>()
                .ok()
                .map(|concrete| concrete as ::std::sync::Arc<$iface>)
        })
    };
}

/// 类型元数据：bean 对外暴露的类型
///
/// 包含类型标识、实现的接口能力、方法签名和方法分派表，
/// 代理织入依赖这些数据而不是运行时反射。
#[derive(Clone)]
pub struct TypeMetadata {
    /// 类型信息
    pub type_info: TypeInfo,
    /// 具体类型自身的能力
    pub self_capability: Capability,
    /// 实现的接口能力
    pub interfaces: Vec<Capability>,
    /// 暴露的方法
    pub methods: Vec<MethodSignature>,
    /// 方法分派表
    pub invoker: Option<Invoker>,
    /// 是否不可被子类化
    pub sealed: bool,
    /// 是否为抽象类型
    pub is_abstract: bool,
    /// 子类式代理使用的委托类型
    pub subclass_view: Option<Capability>,
}

impl TypeMetadata {
    /// 创建具体类型的元数据
    pub fn of<T: Any + Send + Sync>() -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            self_capability: Capability::of::<T>(),
            interfaces: Vec::new(),
            methods: Vec::new(),
            invoker: None,
            sealed: false,
            is_abstract: false,
            subclass_view: None,
        }
    }

    /// 添加接口能力
    pub fn implements(mut self, capability: Capability) -> Self {
        self.interfaces.push(capability);
        self
    }

    /// 添加方法签名
    pub fn method(mut self, signature: MethodSignature) -> Self {
        self.methods.push(signature);
        self
    }

    /// 设置方法分派表
    pub fn with_invoker<T, F>(mut self, invoke: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, &str, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let type_name = self.type_info.module_path.clone();
        self.invoker = Some(Arc::new(move |bean: &Bean, method: &str, args: &[Value]| {
            let target = bean
                .downcast_ref::<T>()
                .ok_or_else(|| anyhow::anyhow!("调用目标不是 {type_name}"))?;
            invoke(target, method, args)
        }));
        self
    }

    /// 标记为不可子类化
    pub fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }

    /// 标记为抽象类型
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// 设置子类式代理的委托类型
    pub fn with_subclass_view(mut self, view: Capability) -> Self {
        self.subclass_view = Some(view);
        self
    }

    /// 所有可用于按类型查找的能力
    pub fn exposed(&self) -> impl Iterator<Item = &Capability> {
        std::iter::once(&self.self_capability)
            .chain(self.interfaces.iter())
            .chain(self.subclass_view.iter())
    }

    /// 查找指定类型的能力
    pub fn find_capability(&self, type_id: TypeId) -> Option<&Capability> {
        self.exposed()
            .find(|capability| Capability::type_id(capability) == type_id)
    }

    /// 是否实现了指定类型
    pub fn is_assignable_to(&self, type_id: TypeId) -> bool {
        self.find_capability(type_id).is_some()
    }

    /// 按名称查找方法签名
    pub fn find_method(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.iter().find(|method| method.name == name)
    }
}

impl fmt::Debug for TypeMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMetadata")
            .field("type_info", &self.type_info)
            .field("interfaces", &self.interfaces)
            .field("methods", &self.methods)
            .field("invoker", &self.invoker.is_some())
            .field("sealed", &self.sealed)
            .field("is_abstract", &self.is_abstract)
            .field("subclass_view", &self.subclass_view)
            .finish()
    }
}
