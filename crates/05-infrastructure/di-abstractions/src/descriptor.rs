//! 类型描述符
//!
//! 元数据提取机制交给容器的声明式输入：一个类型的元数据、构造方式以及各种标记。

use crate::condition::Condition;
use crate::definition::{InjectionPoint, InjectionTarget, Origin, Role};
use crate::factory::{
    callback_fn, constructor_fn, CallbackFn, ConstructorFn, FactoryBean, FactoryBeanAdapter,
    FactoryMethodFn,
};
use crate::resolver::BeanResolver;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use weave_aop::Advisor;
use weave_common::{
    view_as, Bean, BeanView, OrderKind, TypeInfo, TypeMetadata, SCOPE_PROTOTYPE, SCOPE_SINGLETON,
};

/// 构造型标记
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stereotype {
    /// 通用组件
    Component,
    /// 服务
    Service,
    /// 仓储
    Repository,
    /// 控制器
    Controller,
    /// 配置类
    Configuration,
}

impl Stereotype {
    /// 是否为配置类
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration)
    }
}

/// 类型描述符
#[derive(Clone)]
pub struct TypeDescriptor {
    /// 类型元数据
    pub metadata: Arc<TypeMetadata>,
    /// 构造型，`None` 表示不会被组件扫描选中
    pub stereotype: Option<Stereotype>,
    /// 显式指定的 bean 名称
    pub name: Option<String>,
    /// 别名
    pub aliases: Vec<String>,
    /// 作用域名称
    pub scope: String,
    /// 是否需要作用域代理
    pub scoped_proxy: bool,
    /// 是否延迟初始化
    pub lazy: bool,
    /// 是否为首选 bean
    pub primary: bool,
    /// 需要先于本 bean 创建的 bean
    pub depends_on: Vec<String>,
    /// 角色
    pub role: Role,
    /// 来源
    pub origin: Origin,
    /// 描述
    pub description: Option<String>,
    /// 排序
    pub order: OrderKind,
    /// 限定符
    pub qualifiers: Vec<String>,
    /// 自定义实例生产函数，优先于构造函数
    pub supplier: Option<ConstructorFn>,
    /// 构造函数
    pub constructor: Option<ConstructorFn>,
    /// 实例化后注入的依赖
    pub injection_points: Vec<InjectionPoint>,
    /// 初始化回调
    pub init: Option<CallbackFn>,
    /// 销毁回调
    pub destroy: Option<CallbackFn>,
    /// 工厂方法声明（仅配置类）
    pub factory_methods: Vec<FactoryMethodDescriptor>,
    /// 组件扫描的包（仅配置类）
    pub component_scans: Vec<String>,
    /// 导入的配置类
    pub imports: Vec<Arc<TypeDescriptor>>,
    /// 声明的通知器
    pub advisors: Vec<Arc<Advisor>>,
    /// 工厂 bean 适配信息
    pub factory_bean: Option<FactoryBeanAdapter>,
    /// 条件
    pub conditions: Vec<Arc<dyn Condition>>,
    /// 是否启用自动代理
    pub enable_auto_proxy: bool,
}

impl TypeDescriptor {
    /// 创建类型描述符
    pub fn new(metadata: TypeMetadata) -> Self {
        Self {
            metadata: Arc::new(metadata),
            stereotype: None,
            name: None,
            aliases: Vec::new(),
            scope: SCOPE_SINGLETON.to_string(),
            scoped_proxy: false,
            lazy: false,
            primary: false,
            depends_on: Vec::new(),
            role: Role::Application,
            origin: Origin::User,
            description: None,
            order: OrderKind::Unordered,
            qualifiers: Vec::new(),
            supplier: None,
            constructor: None,
            injection_points: Vec::new(),
            init: None,
            destroy: None,
            factory_methods: Vec::new(),
            component_scans: Vec::new(),
            imports: Vec::new(),
            advisors: Vec::new(),
            factory_bean: None,
            conditions: Vec::new(),
            enable_auto_proxy: false,
        }
    }

    /// 完成构建
    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 类型信息
    pub fn type_info(&self) -> &TypeInfo {
        &self.metadata.type_info
    }

    /// 是否为配置类
    pub fn is_configuration(&self) -> bool {
        self.stereotype
            .as_ref()
            .is_some_and(Stereotype::is_configuration)
    }

    /// 设置构造型
    pub fn stereotype(mut self, stereotype: Stereotype) -> Self {
        self.stereotype = Some(stereotype);
        self
    }

    /// 标记为组件
    pub fn component(self) -> Self {
        self.stereotype(Stereotype::Component)
    }

    /// 标记为服务
    pub fn service(self) -> Self {
        self.stereotype(Stereotype::Service)
    }

    /// 标记为配置类
    pub fn configuration(self) -> Self {
        self.stereotype(Stereotype::Configuration)
    }

    /// 指定 bean 名称
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 添加别名
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// 设置作用域
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// 原型作用域
    pub fn prototype(self) -> Self {
        self.scope(SCOPE_PROTOTYPE)
    }

    /// 通过作用域代理暴露
    pub fn scoped_proxy(mut self) -> Self {
        self.scoped_proxy = true;
        self
    }

    /// 延迟初始化
    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    /// 首选 bean
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// 依赖于其他 bean
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    /// 设置角色
    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// 设置来源
    pub fn origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// 设置描述
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 设置排序
    pub fn order(mut self, order: OrderKind) -> Self {
        self.order = order;
        self
    }

    /// 添加限定符
    pub fn qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifiers.push(qualifier.into());
        self
    }

    /// 设置构造函数
    pub fn constructor<T, F>(mut self, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&mut dyn BeanResolver) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.constructor = Some(constructor_fn(f));
        self
    }

    /// 设置自定义实例生产函数
    pub fn supplier<T, F>(mut self, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&mut dyn BeanResolver) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.supplier = Some(constructor_fn(f));
        self
    }

    /// 按类型注入必需依赖
    pub fn inject<T, D>(
        self,
        field: &str,
        setter: impl Fn(&T, Arc<D>) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self
    where
        T: Any + Send + Sync,
        D: ?Sized + Send + Sync + 'static,
    {
        self.injection(field, InjectionTarget::ByType(TypeInfo::of::<D>()), None, setter)
    }

    /// 按类型和限定符注入必需依赖
    pub fn inject_qualified<T, D>(
        self,
        field: &str,
        qualifier: &str,
        setter: impl Fn(&T, Arc<D>) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self
    where
        T: Any + Send + Sync,
        D: ?Sized + Send + Sync + 'static,
    {
        self.injection(
            field,
            InjectionTarget::ByType(TypeInfo::of::<D>()),
            Some(qualifier.to_string()),
            setter,
        )
    }

    /// 按名称注入必需依赖
    pub fn inject_named<T, D>(
        self,
        field: &str,
        bean_name: &str,
        setter: impl Fn(&T, Arc<D>) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self
    where
        T: Any + Send + Sync,
        D: ?Sized + Send + Sync + 'static,
    {
        self.injection(
            field,
            InjectionTarget::ByName {
                name: bean_name.to_string(),
                type_info: TypeInfo::of::<D>(),
            },
            None,
            setter,
        )
    }

    /// 按类型注入可选依赖
    pub fn inject_optional<T, D>(
        mut self,
        field: &str,
        setter: impl Fn(&T, Option<Arc<D>>) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self
    where
        T: Any + Send + Sync,
        D: ?Sized + Send + Sync + 'static,
    {
        self.injection_points.push(InjectionPoint {
            field: field.to_string(),
            target: InjectionTarget::ByType(TypeInfo::of::<D>()),
            qualifier: None,
            required: false,
            inject: Arc::new(move |bean: &Bean, view: Option<BeanView>| {
                let target = downcast_target::<T>(bean)?;
                let dependency = view.as_ref().and_then(view_as::<D>);
                setter(target, dependency)
            }),
        });
        self
    }

    fn injection<T, D>(
        mut self,
        field: &str,
        target: InjectionTarget,
        qualifier: Option<String>,
        setter: impl Fn(&T, Arc<D>) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self
    where
        T: Any + Send + Sync,
        D: ?Sized + Send + Sync + 'static,
    {
        let field_name = field.to_string();
        self.injection_points.push(InjectionPoint {
            field: field.to_string(),
            target,
            qualifier,
            required: true,
            inject: Arc::new(move |bean: &Bean, view: Option<BeanView>| {
                let target = downcast_target::<T>(bean)?;
                let dependency = view
                    .as_ref()
                    .and_then(view_as::<D>)
                    .ok_or_else(|| anyhow::anyhow!("字段 {field_name} 的依赖类型不匹配"))?;
                setter(target, dependency)
            }),
        });
        self
    }

    /// 设置初始化回调
    pub fn init<T: Any + Send + Sync>(
        mut self,
        f: impl Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.init = Some(callback_fn(f));
        self
    }

    /// 设置销毁回调
    pub fn destroy<T: Any + Send + Sync>(
        mut self,
        f: impl Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.destroy = Some(callback_fn(f));
        self
    }

    /// 声明工厂方法
    pub fn bean_method(mut self, method: FactoryMethodDescriptor) -> Self {
        self.factory_methods.push(method);
        self
    }

    /// 声明组件扫描
    pub fn component_scan(mut self, package: impl Into<String>) -> Self {
        self.component_scans.push(package.into());
        self
    }

    /// 导入配置类
    pub fn import(mut self, descriptor: Arc<TypeDescriptor>) -> Self {
        self.imports.push(descriptor);
        self
    }

    /// 声明通知器
    pub fn advisor(mut self, advisor: Advisor) -> Self {
        self.advisors.push(Arc::new(advisor));
        self
    }

    /// 声明为工厂 bean，`product` 为产物的类型元数据
    pub fn factory_bean<F: FactoryBean + 'static>(mut self, product: TypeMetadata) -> Self {
        self.factory_bean = Some(FactoryBeanAdapter::of::<F>(product));
        self
    }

    /// 添加条件
    pub fn conditional(mut self, condition: impl Condition + 'static) -> Self {
        self.conditions.push(Arc::new(condition));
        self
    }

    /// 启用自动代理
    pub fn enable_auto_proxy(mut self) -> Self {
        self.enable_auto_proxy = true;
        self
    }
}

fn downcast_target<T: Any + Send + Sync>(bean: &Bean) -> anyhow::Result<&T> {
    bean.downcast_ref::<T>()
        .ok_or_else(|| anyhow::anyhow!("注入目标不是 {}", std::any::type_name::<T>()))
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type", &self.metadata.type_info.module_path)
            .field("stereotype", &self.stereotype)
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("lazy", &self.lazy)
            .field("primary", &self.primary)
            .field("factory_methods", &self.factory_methods.len())
            .field("imports", &self.imports.len())
            .field("advisors", &self.advisors.len())
            .finish_non_exhaustive()
    }
}

/// 工厂方法声明
#[derive(Clone)]
pub struct FactoryMethodDescriptor {
    /// 方法名称
    pub method_name: String,
    /// 显式指定的 bean 名称，默认使用方法名称
    pub bean_name: Option<String>,
    /// 别名
    pub aliases: Vec<String>,
    /// 产物的类型元数据
    pub metadata: Arc<TypeMetadata>,
    /// 作用域名称
    pub scope: String,
    /// 是否延迟初始化
    pub lazy: bool,
    /// 是否为首选 bean
    pub primary: bool,
    /// 需要先于本 bean 创建的 bean
    pub depends_on: Vec<String>,
    /// 角色
    pub role: Role,
    /// 描述
    pub description: Option<String>,
    /// 限定符
    pub qualifiers: Vec<String>,
    /// 条件
    pub conditions: Vec<Arc<dyn Condition>>,
    /// 初始化回调
    pub init: Option<CallbackFn>,
    /// 销毁回调
    pub destroy: Option<CallbackFn>,
    /// 方法调用
    pub invoke: FactoryMethodFn,
}

impl FactoryMethodDescriptor {
    /// 声明工厂方法：在配置 bean `C` 上调用 `f` 生产 `T`
    pub fn new<C, T, F>(method_name: &str, metadata: TypeMetadata, f: F) -> Self
    where
        C: Any + Send + Sync,
        T: Any + Send + Sync,
        F: Fn(&C, &mut dyn BeanResolver) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            method_name: method_name.to_string(),
            bean_name: None,
            aliases: Vec::new(),
            metadata: Arc::new(metadata),
            scope: SCOPE_SINGLETON.to_string(),
            lazy: false,
            primary: false,
            depends_on: Vec::new(),
            role: Role::Application,
            description: None,
            qualifiers: Vec::new(),
            conditions: Vec::new(),
            init: None,
            destroy: None,
            invoke: Arc::new(move |declaring: &Bean, resolver: &mut dyn BeanResolver| {
                let config = declaring.downcast_ref::<C>().ok_or_else(|| {
                    anyhow::anyhow!("工厂方法的声明 bean 不是 {}", std::any::type_name::<C>())
                })?;
                Ok(Arc::new(f(config, resolver)?) as Bean)
            }),
        }
    }

    /// 注册使用的 bean 名称
    pub fn resolved_bean_name(&self) -> &str {
        self.bean_name.as_deref().unwrap_or(&self.method_name)
    }

    /// 指定 bean 名称
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.bean_name = Some(name.into());
        self
    }

    /// 添加别名
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// 设置作用域
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// 原型作用域
    pub fn prototype(self) -> Self {
        self.scope(SCOPE_PROTOTYPE)
    }

    /// 延迟初始化
    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    /// 首选 bean
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// 依赖于其他 bean
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    /// 设置角色
    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// 设置描述
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 添加限定符
    pub fn qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifiers.push(qualifier.into());
        self
    }

    /// 添加条件
    pub fn conditional(mut self, condition: impl Condition + 'static) -> Self {
        self.conditions.push(Arc::new(condition));
        self
    }

    /// 设置初始化回调
    pub fn init<T: Any + Send + Sync>(
        mut self,
        f: impl Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.init = Some(callback_fn(f));
        self
    }

    /// 设置销毁回调
    pub fn destroy<T: Any + Send + Sync>(
        mut self,
        f: impl Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.destroy = Some(callback_fn(f));
        self
    }
}

impl fmt::Debug for FactoryMethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryMethodDescriptor")
            .field("method_name", &self.method_name)
            .field("bean_name", &self.bean_name)
            .field("product", &self.metadata.type_info.module_path)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}
