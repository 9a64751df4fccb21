//! 循环依赖与循环导入的集成测试

use di_abstractions::TypeDescriptor;
use di_impl::ApplicationContext;
use di_impl_integration_tests::init_tracing;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use weave_common::{ContainerConfig, ContainerError, ContextState, TypeInfo, TypeMetadata};

/// 依赖 `Beta` 的组件
struct Alpha {
    _beta: Arc<Beta>,
}

/// 依赖 `Alpha` 的组件
struct Beta {
    _alpha: Arc<Alpha>,
}

#[test]
fn test_constructor_cycle_fails_refresh() {
    init_tracing();
    let alpha = TypeDescriptor::new(TypeMetadata::of::<Alpha>())
        .component()
        .constructor(|r| {
            Ok(Alpha {
                _beta: r.get::<Beta>()?,
            })
        })
        .build();
    let beta = TypeDescriptor::new(TypeMetadata::of::<Beta>())
        .component()
        .constructor(|r| {
            Ok(Beta {
                _alpha: r.get::<Alpha>()?,
            })
        })
        .build();

    let context = ApplicationContext::new(ContainerConfig::default());
    context.register(&[alpha, beta]).unwrap();
    let err = context.refresh().unwrap_err();

    match err {
        ContainerError::CircularDependency { ref chain } => {
            assert_eq!(chain.first().map(String::as_str), Some("alpha"));
            assert!(chain.iter().any(|name| name == "beta"));
            assert_eq!(chain.last().map(String::as_str), Some("alpha"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(format!("{err}").contains("alpha"));
    assert_eq!(context.state(), ContextState::Failed);
}

/// 只记录构造次数的组件
struct Step;

fn step(name: &str, depends_on: &str, built: &Arc<AtomicUsize>) -> Arc<TypeDescriptor> {
    let built = built.clone();
    TypeDescriptor::new(TypeMetadata::of::<Step>())
        .component()
        .named(name)
        .depends_on(depends_on)
        .constructor(move |_r| {
            built.fetch_add(1, Ordering::SeqCst);
            Ok(Step)
        })
        .build()
}

#[test]
fn test_depends_on_cycle_detected_before_instantiation() {
    let built = Arc::new(AtomicUsize::new(0));
    let err = ApplicationContext::with_components(
        ContainerConfig::default(),
        &[
            step("migrate", "schema", &built),
            step("schema", "seed", &built),
            step("seed", "migrate", &built),
        ],
    )
    .unwrap_err();

    match err {
        ContainerError::CircularDependency { chain } => {
            assert_eq!(chain, vec!["migrate", "schema", "seed", "migrate"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(built.load(Ordering::SeqCst), 0);
}

/// 互相导入的配置类
struct WebConfig;

/// 互相导入的配置类
struct SecurityConfig;

#[test]
fn test_import_cycle_is_configuration_cycle() {
    let web_again = TypeDescriptor::new(TypeMetadata::of::<WebConfig>())
        .configuration()
        .constructor(|_r| Ok(WebConfig))
        .build();
    let security = TypeDescriptor::new(TypeMetadata::of::<SecurityConfig>())
        .configuration()
        .constructor(|_r| Ok(SecurityConfig))
        .import(web_again)
        .build();
    let web = TypeDescriptor::new(TypeMetadata::of::<WebConfig>())
        .configuration()
        .constructor(|_r| Ok(WebConfig))
        .import(security)
        .build();

    let err = ApplicationContext::with_components(ContainerConfig::default(), &[web]).unwrap_err();
    match err {
        ContainerError::ConfigurationCycle { chain } => {
            assert_eq!(chain.first().map(String::as_str), Some("webConfig"));
            assert!(chain.contains(&TypeInfo::of::<SecurityConfig>().qualified_name()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
