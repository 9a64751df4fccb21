//! bean 定义注册与覆盖的集成测试

use di_abstractions::{
    BeanDefinition, BeanDefinitionRegistry, Origin, Role, TypeCatalog, TypeDescriptor,
};
use di_impl::{ApplicationContext, ContextBuilder, DefaultBeanDefinitionRegistry};
use di_impl_integration_tests::init_tracing;
use std::sync::Arc;
use weave_common::{ContainerConfig, ContainerError, TypeMetadata};

/// 本地缓存
struct LocalCache;

/// 远程缓存
struct RemoteCache;

fn cache<T: Send + Sync + 'static>(make: fn() -> T) -> Arc<TypeDescriptor> {
    TypeDescriptor::new(TypeMetadata::of::<T>())
        .component()
        .named("cache")
        .constructor(move |_r| Ok(make()))
        .build()
}

#[test]
fn test_duplicate_definition_rejected_when_overriding_disallowed() {
    init_tracing();
    let context =
        ApplicationContext::new(ContainerConfig::default().allow_definition_overriding(false));
    context
        .register(&[cache(|| LocalCache), cache(|| RemoteCache)])
        .unwrap();

    let err = context.refresh().unwrap_err();
    assert!(
        matches!(err, ContainerError::DuplicateDefinition { ref name, .. } if name == "cache"),
        "unexpected error: {err:?}"
    );
}

#[test]
fn test_later_definition_wins_when_overriding_allowed() {
    init_tracing();
    let context = ApplicationContext::with_components(
        ContainerConfig::default(),
        &[cache(|| LocalCache), cache(|| RemoteCache)],
    )
    .unwrap();

    assert_eq!(context.get_bean_definition_count(), 1);
    let bean = context.get_bean_by_name("cache").unwrap();
    assert!(bean.downcast_ref::<RemoteCache>().is_some());
    assert!(context.get_bean::<LocalCache>().is_err());
}

#[test]
fn test_identical_definition_is_ignored() {
    let registry = DefaultBeanDefinitionRegistry::new(true);
    let descriptor = cache(|| LocalCache);
    registry
        .register_bean_definition("cache", BeanDefinition::from_descriptor(&descriptor))
        .unwrap();
    registry
        .register_bean_definition("cache", BeanDefinition::from_descriptor(&descriptor))
        .unwrap();
    assert_eq!(registry.get_bean_definition_count(), 1);
}

#[test]
fn test_identical_definition_rejected_when_overriding_disallowed() {
    let registry = DefaultBeanDefinitionRegistry::new(false);
    let descriptor = cache(|| LocalCache);
    registry
        .register_bean_definition("cache", BeanDefinition::from_descriptor(&descriptor))
        .unwrap();
    let err = registry
        .register_bean_definition("cache", BeanDefinition::from_descriptor(&descriptor))
        .unwrap_err();
    assert!(matches!(err, ContainerError::DuplicateDefinition { ref name, .. } if name == "cache"));
}

#[test]
fn test_infrastructure_definition_not_replaced_by_application() {
    let registry = DefaultBeanDefinitionRegistry::new(true);
    let infrastructure = TypeDescriptor::new(TypeMetadata::of::<LocalCache>())
        .role(Role::Infrastructure)
        .origin(Origin::Framework)
        .constructor(|_r| Ok(LocalCache))
        .build();
    registry
        .register_bean_definition("cache", BeanDefinition::from_descriptor(&infrastructure))
        .unwrap();

    let err = registry
        .register_bean_definition(
            "cache",
            BeanDefinition::from_descriptor(&cache(|| RemoteCache)),
        )
        .unwrap_err();
    assert!(matches!(err, ContainerError::DuplicateDefinition { .. }));
    assert_eq!(
        registry.get_bean_definition("cache").unwrap().type_info().short_name(),
        "LocalCache"
    );
}

#[test]
fn test_aliases_resolve_to_same_singleton() {
    let descriptor = TypeDescriptor::new(TypeMetadata::of::<LocalCache>())
        .component()
        .alias("l1")
        .alias("near-cache")
        .constructor(|_r| Ok(LocalCache))
        .build();
    let context = ContextBuilder::new()
        .with_config(ContainerConfig::default())
        .register(descriptor)
        .build()
        .unwrap();

    let by_name = context.get_bean_by_name("localCache").unwrap();
    let by_alias = context.get_bean_by_name("near-cache").unwrap();
    assert!(Arc::ptr_eq(&by_name, &by_alias));
    assert!(context.contains_bean("l1"));
    assert!(matches!(
        context.get_bean_by_name("l2"),
        Err(ContainerError::NoSuchBean { .. })
    ));
}

mod scanned {
    pub struct UserServiceImpl;
}

#[test]
fn test_scanned_name_conflict_is_duplicate() {
    let scanned = TypeDescriptor::new(TypeMetadata::of::<scanned::UserServiceImpl>())
        .service()
        .constructor(|_r| Ok(scanned::UserServiceImpl))
        .build();
    let conflicting = TypeDescriptor::new(TypeMetadata::of::<LocalCache>())
        .component()
        .named("userServiceImpl")
        .constructor(|_r| Ok(LocalCache))
        .build();

    let err = ContextBuilder::new()
        .with_config(ContainerConfig::default())
        .register(conflicting)
        .with_catalog(TypeCatalog::new().with(scanned.clone()))
        .scan(format!("{}::scanned", module_path!()))
        .build()
        .unwrap_err();
    assert!(matches!(err, ContainerError::DuplicateDefinition { ref name, .. } if name == "userServiceImpl"));

    // 同一类型被再次扫描时跳过
    let context = ContextBuilder::new()
        .with_config(ContainerConfig::default())
        .register(scanned.clone())
        .with_catalog(TypeCatalog::new().with(scanned))
        .scan(format!("{}::scanned", module_path!()))
        .build()
        .unwrap();
    assert_eq!(context.get_bean_definition_names(), vec!["userServiceImpl"]);
}
