//! bean 定义
//!
//! 注册表中保存的记录，由类型描述符或工厂方法声明派生。

use crate::condition::Condition;
use crate::descriptor::{FactoryMethodDescriptor, TypeDescriptor};
use crate::factory::{CallbackFn, ConstructorFn, FactoryBeanAdapter, FactoryMethodFn, InjectFn};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use weave_common::{
    ContainerError, ContainerResult, OrderKind, TypeInfo, TypeMetadata, SCOPE_PROTOTYPE,
    SCOPE_SINGLETON,
};

/// bean 角色，数值越大级别越高
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Role {
    /// 应用 bean
    #[default]
    Application,
    /// 支撑性配置
    Support,
    /// 容器内部基础设施
    Infrastructure,
}

/// bean 定义的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Origin {
    /// 用户声明
    #[default]
    User,
    /// 容器内部
    Framework,
}

/// 注入目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectionTarget {
    /// 按类型
    ByType(TypeInfo),
    /// 按名称
    ByName {
        /// bean 名称
        name: String,
        /// 期望的类型
        type_info: TypeInfo,
    },
}

/// 注入点
#[derive(Clone)]
pub struct InjectionPoint {
    /// 字段名称，用于错误信息
    pub field: String,
    /// 注入目标
    pub target: InjectionTarget,
    /// 限定符
    pub qualifier: Option<String>,
    /// 是否必需
    pub required: bool,
    /// 注入函数
    pub inject: InjectFn,
}

impl fmt::Debug for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionPoint")
            .field("field", &self.field)
            .field("target", &self.target)
            .field("qualifier", &self.qualifier)
            .field("required", &self.required)
            .finish()
    }
}

/// 工厂方法引用
#[derive(Clone)]
pub struct FactoryMethodRef {
    /// 声明工厂方法的配置 bean
    pub declaring_bean: String,
    /// 方法名称
    pub method_name: String,
    /// 方法调用
    pub invoke: FactoryMethodFn,
}

impl fmt::Debug for FactoryMethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}()", self.declaring_bean, self.method_name)
    }
}

/// bean 定义
#[derive(Clone)]
pub struct BeanDefinition {
    /// 类型元数据（工厂 bean 为工厂自身的类型）
    pub type_metadata: Arc<TypeMetadata>,
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
    /// 自定义实例生产函数
    pub supplier: Option<ConstructorFn>,
    /// 工厂方法
    pub factory_method: Option<FactoryMethodRef>,
    /// 构造函数
    pub constructor: Option<ConstructorFn>,
    /// 注入点
    pub injection_points: Vec<InjectionPoint>,
    /// 初始化回调
    pub init: Option<CallbackFn>,
    /// 销毁回调
    pub destroy: Option<CallbackFn>,
    /// 工厂 bean 适配信息
    pub factory_bean: Option<FactoryBeanAdapter>,
    /// 注册阶段求值的条件（工厂方法定义）
    pub conditions: Vec<Arc<dyn Condition>>,
    /// 派生出本定义的类型描述符
    pub source: Option<Arc<TypeDescriptor>>,
    /// 附加属性，工厂后置处理器可以修改
    pub attributes: BTreeMap<String, Value>,
}

impl BeanDefinition {
    /// 创建只有类型元数据的定义
    pub fn new(type_metadata: Arc<TypeMetadata>) -> Self {
        Self {
            type_metadata,
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
            factory_method: None,
            constructor: None,
            injection_points: Vec::new(),
            init: None,
            destroy: None,
            factory_bean: None,
            conditions: Vec::new(),
            source: None,
            attributes: BTreeMap::new(),
        }
    }

    /// 由类型描述符派生
    pub fn from_descriptor(descriptor: &Arc<TypeDescriptor>) -> Self {
        Self {
            type_metadata: descriptor.metadata.clone(),
            aliases: descriptor.aliases.clone(),
            scope: descriptor.scope.clone(),
            scoped_proxy: descriptor.scoped_proxy,
            lazy: descriptor.lazy,
            primary: descriptor.primary,
            depends_on: descriptor.depends_on.clone(),
            role: descriptor.role,
            origin: descriptor.origin,
            description: descriptor.description.clone(),
            order: descriptor.order,
            qualifiers: descriptor.qualifiers.clone(),
            supplier: descriptor.supplier.clone(),
            factory_method: None,
            constructor: descriptor.constructor.clone(),
            injection_points: descriptor.injection_points.clone(),
            init: descriptor.init.clone(),
            destroy: descriptor.destroy.clone(),
            factory_bean: descriptor.factory_bean.clone(),
            conditions: Vec::new(),
            source: Some(descriptor.clone()),
            attributes: BTreeMap::new(),
        }
    }

    /// 由配置类上的工厂方法声明派生
    pub fn from_factory_method(
        declaring_bean: &str,
        method: &FactoryMethodDescriptor,
        source: &Arc<TypeDescriptor>,
    ) -> Self {
        Self {
            aliases: method.aliases.clone(),
            scope: method.scope.clone(),
            lazy: method.lazy,
            primary: method.primary,
            depends_on: method.depends_on.clone(),
            role: method.role,
            origin: source.origin,
            description: method.description.clone(),
            qualifiers: method.qualifiers.clone(),
            factory_method: Some(FactoryMethodRef {
                declaring_bean: declaring_bean.to_string(),
                method_name: method.method_name.clone(),
                invoke: method.invoke.clone(),
            }),
            init: method.init.clone(),
            destroy: method.destroy.clone(),
            conditions: method.conditions.clone(),
            source: Some(source.clone()),
            ..Self::new(method.metadata.clone())
        }
    }

    /// 类型信息
    pub fn type_info(&self) -> &TypeInfo {
        &self.type_metadata.type_info
    }

    /// 以注册名称暴露的类型：工厂 bean 为产物类型，否则为自身类型
    pub fn exposed_metadata(&self) -> &Arc<TypeMetadata> {
        self.factory_bean
            .as_ref()
            .map_or(&self.type_metadata, |adapter| &adapter.product)
    }

    /// 是否为单例
    pub fn is_singleton(&self) -> bool {
        self.scope == SCOPE_SINGLETON
    }

    /// 是否为原型
    pub fn is_prototype(&self) -> bool {
        self.scope == SCOPE_PROTOTYPE
    }

    /// 是否为工厂 bean
    pub fn is_factory_bean(&self) -> bool {
        self.factory_bean.is_some()
    }

    /// 是否为配置类
    pub fn is_configuration(&self) -> bool {
        self.factory_method.is_none()
            && self
                .source
                .as_ref()
                .is_some_and(|source| source.is_configuration())
    }

    /// 覆盖优先级
    pub fn rank(&self) -> (Origin, Role) {
        (self.origin, self.role)
    }

    /// 是否带有指定限定符
    pub fn has_qualifier(&self, qualifier: &str) -> bool {
        self.qualifiers.iter().any(|q| q == qualifier)
    }

    /// 是否与另一个定义相同
    ///
    /// 函数字段按指针比较，同一个描述符重复派生的定义视为相同。
    pub fn same_definition(&self, other: &Self) -> bool {
        fn same_fn<T: ?Sized>(a: Option<&Arc<T>>, b: Option<&Arc<T>>) -> bool {
            match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
        }
        let same_source = match (&self.source, &other.source) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        let same_factory_method = match (&self.factory_method, &other.factory_method) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                a.declaring_bean == b.declaring_bean
                    && a.method_name == b.method_name
                    && Arc::ptr_eq(&a.invoke, &b.invoke)
            }
            _ => false,
        };
        self.type_metadata.type_info == other.type_metadata.type_info
            && same_source
            && same_factory_method
            && same_fn(self.supplier.as_ref(), other.supplier.as_ref())
            && same_fn(self.constructor.as_ref(), other.constructor.as_ref())
            && self.scope == other.scope
            && self.scoped_proxy == other.scoped_proxy
            && self.lazy == other.lazy
            && self.primary == other.primary
            && self.depends_on == other.depends_on
            && self.role == other.role
            && self.origin == other.origin
            && self.description == other.description
            && self.qualifiers == other.qualifiers
            && self.aliases == other.aliases
            && self.attributes == other.attributes
    }

    /// 校验定义
    pub fn validate(&self, name: &str) -> ContainerResult<()> {
        if name.is_empty() {
            return Err(ContainerError::validation(name, "bean 名称不能为空"));
        }
        if self.scope.is_empty() {
            return Err(ContainerError::validation(name, "作用域名称不能为空"));
        }
        let has_producer =
            self.supplier.is_some() || self.factory_method.is_some() || self.constructor.is_some();
        if !has_producer {
            if self.type_metadata.is_abstract {
                return Err(ContainerError::validation(
                    name,
                    format!("抽象类型 {} 不能直接作为 bean", self.type_info()),
                ));
            }
            return Err(ContainerError::validation(
                name,
                format!("类型 {} 没有可用的构造方式", self.type_info()),
            ));
        }
        if self.depends_on.iter().any(|dep| dep == name) {
            return Err(ContainerError::validation(name, "bean 不能依赖自身"));
        }
        Ok(())
    }
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("type", &self.type_metadata.type_info.module_path)
            .field("scope", &self.scope)
            .field("lazy", &self.lazy)
            .field("primary", &self.primary)
            .field("depends_on", &self.depends_on)
            .field("role", &self.role)
            .field("origin", &self.origin)
            .field("factory_method", &self.factory_method)
            .field("factory_bean", &self.factory_bean.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Repository;

    fn descriptor() -> Arc<TypeDescriptor> {
        TypeDescriptor::new(TypeMetadata::of::<Repository>())
            .component()
            .constructor(|_r| Ok(Repository))
            .build()
    }

    #[test]
    fn test_same_descriptor_yields_same_definition() {
        let descriptor = descriptor();
        let a = BeanDefinition::from_descriptor(&descriptor);
        let b = BeanDefinition::from_descriptor(&descriptor);
        assert!(a.same_definition(&b));

        let mut lazy = b.clone();
        lazy.lazy = true;
        assert!(!a.same_definition(&lazy));

        // 另一个描述符的构造函数是不同的闭包
        let other = BeanDefinition::from_descriptor(&self::descriptor());
        assert!(!a.same_definition(&other));
    }

    #[test]
    fn test_rank_ordering() {
        assert!((Origin::Framework, Role::Application) > (Origin::User, Role::Infrastructure));
        assert!((Origin::User, Role::Infrastructure) > (Origin::User, Role::Application));
    }

    #[test]
    fn test_validate_requires_producer() {
        let abstract_type = BeanDefinition::new(Arc::new(
            TypeMetadata::of::<Repository>().abstract_type(),
        ));
        assert!(matches!(
            abstract_type.validate("repository"),
            Err(ContainerError::DefinitionValidation { .. })
        ));
        assert!(BeanDefinition::from_descriptor(&descriptor())
            .validate("repository")
            .is_ok());
    }
}
