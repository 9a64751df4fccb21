//! 工厂 bean 与工厂方法的集成测试

use di_abstractions::{BeanResolver, FactoryBean, FactoryMethodDescriptor, TypeDescriptor};
use di_impl::ApplicationContext;
use di_impl_integration_tests::init_tracing;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use weave_common::{Bean, ContainerConfig, ContainerError, TypeMetadata};

/// 数据库连接
struct Connection {
    serial: usize,
}

/// 连接工厂
struct ConnectionFactory {
    calls: Arc<AtomicUsize>,
    singleton: bool,
}

impl FactoryBean for ConnectionFactory {
    fn get_object(&self) -> anyhow::Result<Bean> {
        let serial = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Arc::new(Connection { serial }))
    }

    fn is_singleton(&self) -> bool {
        self.singleton
    }
}

fn connection_factory(calls: &Arc<AtomicUsize>, singleton: bool) -> Arc<TypeDescriptor> {
    let calls = calls.clone();
    TypeDescriptor::new(TypeMetadata::of::<ConnectionFactory>())
        .component()
        .named("connection")
        .factory_bean::<ConnectionFactory>(TypeMetadata::of::<Connection>())
        .constructor(move |_r| {
            Ok(ConnectionFactory {
                calls: calls.clone(),
                singleton,
            })
        })
        .build()
}

#[test]
fn test_factory_product_created_once_on_first_lookup() {
    init_tracing();
    let calls = Arc::new(AtomicUsize::new(0));
    let context = ApplicationContext::with_components(
        ContainerConfig::default(),
        &[connection_factory(&calls, true)],
    )
    .unwrap();

    // 刷新只创建工厂自身
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    let factory = context.get_bean_by_name("&connection").unwrap();
    assert!(factory.downcast_ref::<ConnectionFactory>().is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let first = context.get_bean::<Connection>().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    for _ in 0..5 {
        let again = context.get_bean_named::<Connection>("connection").unwrap();
        assert!(Arc::ptr_eq(&first, &again));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.serial, 1);

    // 按工厂类型查找得到工厂自身
    let by_type = context.get_bean::<ConnectionFactory>().unwrap();
    assert!(by_type.singleton);
}

#[test]
fn test_non_singleton_factory_produces_every_time() {
    let calls = Arc::new(AtomicUsize::new(0));
    let context = ApplicationContext::with_components(
        ContainerConfig::default(),
        &[connection_factory(&calls, false)],
    )
    .unwrap();

    let first = context.get_bean::<Connection>().unwrap();
    let second = context.get_bean::<Connection>().unwrap();
    assert_ne!(first.serial, second.serial);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// 数据源配置
struct DataSourceConfig {
    url: String,
}

/// 连接池
struct Pool {
    url: String,
    size: usize,
}

/// 仓储
struct Repository {
    pool: Arc<Pool>,
}

#[test]
fn test_bean_methods_on_configuration() {
    let config = TypeDescriptor::new(TypeMetadata::of::<DataSourceConfig>())
        .configuration()
        .constructor(|_r| {
            Ok(DataSourceConfig {
                url: "postgres://localhost/orders".to_string(),
            })
        })
        .bean_method(FactoryMethodDescriptor::new(
            "pool",
            TypeMetadata::of::<Pool>(),
            |config: &DataSourceConfig, _r: &mut dyn BeanResolver| {
                Ok(Pool {
                    url: config.url.clone(),
                    size: 8,
                })
            },
        ))
        .bean_method(
            FactoryMethodDescriptor::new(
                "repository",
                TypeMetadata::of::<Repository>(),
                |_config: &DataSourceConfig, r: &mut dyn BeanResolver| {
                    Ok(Repository {
                        pool: r.get::<Pool>()?,
                    })
                },
            )
            .named("orderRepository")
            .lazy(),
        )
        .build();

    let context = ApplicationContext::with_components(ContainerConfig::default(), &[config]).unwrap();
    assert_eq!(
        context.get_bean_definition_names(),
        vec!["dataSourceConfig", "pool", "orderRepository"]
    );

    let pool = context.get_bean::<Pool>().unwrap();
    assert_eq!(pool.url, "postgres://localhost/orders");
    assert_eq!(pool.size, 8);
    let repository = context.get_bean_named::<Repository>("orderRepository").unwrap();
    assert!(Arc::ptr_eq(&repository.pool, &pool));
}

#[test]
fn test_failing_factory_method_reports_bean_name() {
    let config = TypeDescriptor::new(TypeMetadata::of::<DataSourceConfig>())
        .configuration()
        .constructor(|_r| {
            Ok(DataSourceConfig {
                url: String::new(),
            })
        })
        .bean_method(FactoryMethodDescriptor::new(
            "pool",
            TypeMetadata::of::<Pool>(),
            |config: &DataSourceConfig, _r: &mut dyn BeanResolver| -> anyhow::Result<Pool> {
                anyhow::ensure!(!config.url.is_empty(), "数据源地址为空");
                Ok(Pool {
                    url: config.url.clone(),
                    size: 1,
                })
            },
        ))
        .build();

    let err = ApplicationContext::with_components(ContainerConfig::default(), &[config])
        .err()
        .expect("刷新应当失败");
    assert!(
        matches!(err, ContainerError::BeanCreation { ref bean_name, .. } if bean_name == "pool"),
        "unexpected error: {err:?}"
    );
    assert!(format!("{err}").contains("pool"));
}
