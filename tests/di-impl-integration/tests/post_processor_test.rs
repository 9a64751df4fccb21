//! 后置处理器的集成测试
//!
//! 验证注册表后置处理器、工厂后置处理器和 bean 后置处理器在上下文刷新中的执行顺序。

use di_abstractions::{
    BeanDefinition, BeanDefinitionRegistry, BeanDefinitionRegistryPostProcessor,
    BeanFactoryPostProcessor, BeanPostProcessor, ConfigurableBeanFactory, TypeDescriptor,
};
use di_impl::{ApplicationContext, ContextBuilder};
use di_impl_integration_tests::init_tracing;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use weave_common::{
    capability, Bean, ContainerConfig, ContainerError, ContainerResult, OrderKind, TypeMetadata,
};

type Log = Arc<Mutex<Vec<String>>>;

/// 记录执行顺序的注册表后置处理器，可选地注册一个新的处理器
struct RecordingProcessor {
    label: String,
    spawn: Option<String>,
    log: Log,
}

impl BeanDefinitionRegistryPostProcessor for RecordingProcessor {
    fn post_process_bean_definition_registry(
        &self,
        registry: &dyn BeanDefinitionRegistry,
    ) -> ContainerResult<()> {
        self.log.lock().push(self.label.clone());
        if let Some(child) = &self.spawn {
            let descriptor = recording(child, OrderKind::Unordered, None, &self.log);
            registry.register_bean_definition(child, BeanDefinition::from_descriptor(&descriptor))?;
        }
        Ok(())
    }
}

fn recording(label: &str, order: OrderKind, spawn: Option<&str>, log: &Log) -> Arc<TypeDescriptor> {
    let label = label.to_string();
    let spawn = spawn.map(str::to_string);
    let log = log.clone();
    TypeDescriptor::new(
        TypeMetadata::of::<RecordingProcessor>().implements(capability!(
            RecordingProcessor => dyn BeanDefinitionRegistryPostProcessor
        )),
    )
    .named(label.clone())
    .order(order)
    .constructor(move |_r| {
        Ok(RecordingProcessor {
            label: label.clone(),
            spawn: spawn.clone(),
            log: log.clone(),
        })
    })
    .build()
}

#[test]
fn test_registry_processors_run_in_category_order() {
    init_tracing();
    let log: Log = Arc::default();
    let context = ApplicationContext::with_components(
        ContainerConfig::default(),
        &[
            recording("p3", OrderKind::Unordered, Some("p4"), &log),
            recording("p2", OrderKind::Ordered(10), None, &log),
            recording("p1", OrderKind::PriorityOrdered(0), None, &log),
        ],
    )
    .unwrap();

    assert_eq!(*log.lock(), vec!["p1", "p2", "p3", "p4"]);
    assert!(context.contains_bean("p4"));
}

/// 不断注册新处理器的处理器
struct Proliferating {
    generation: usize,
}

impl BeanDefinitionRegistryPostProcessor for Proliferating {
    fn post_process_bean_definition_registry(
        &self,
        registry: &dyn BeanDefinitionRegistry,
    ) -> ContainerResult<()> {
        let next = self.generation + 1;
        registry.register_bean_definition(
            &format!("proliferating{next}"),
            BeanDefinition::from_descriptor(&proliferating(next)),
        )
    }
}

fn proliferating(generation: usize) -> Arc<TypeDescriptor> {
    TypeDescriptor::new(
        TypeMetadata::of::<Proliferating>()
            .implements(capability!(Proliferating => dyn BeanDefinitionRegistryPostProcessor)),
    )
    .named(format!("proliferating{generation}"))
    .constructor(move |_r| Ok(Proliferating { generation }))
    .build()
}

#[test]
fn test_round_bound_from_config() {
    let config = ContainerConfig {
        max_post_processor_rounds: 5,
        ..ContainerConfig::default()
    };
    let err = ApplicationContext::with_components(config, &[proliferating(0)]).unwrap_err();
    assert!(
        matches!(err, ContainerError::PostProcessorNonTermination { rounds: 5 }),
        "unexpected error: {err:?}"
    );
}

/// 报表组件，构造代价高
struct ReportGenerator;

/// 把报表组件改为延迟初始化的工厂后置处理器
struct LazyReports;

impl BeanFactoryPostProcessor for LazyReports {
    fn post_process_bean_factory(&self, factory: &dyn ConfigurableBeanFactory) -> ContainerResult<()> {
        for name in factory.get_bean_definition_names() {
            if name.starts_with("report") {
                factory.update_bean_definition(&name, &mut |definition| definition.lazy = true)?;
            }
        }
        Ok(())
    }
}

#[test]
fn test_factory_processor_bean_changes_definitions() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = built.clone();
    let report = TypeDescriptor::new(TypeMetadata::of::<ReportGenerator>())
        .component()
        .constructor(move |_r| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(ReportGenerator)
        })
        .build();
    let lazy_reports = TypeDescriptor::new(
        TypeMetadata::of::<LazyReports>()
            .implements(capability!(LazyReports => dyn BeanFactoryPostProcessor)),
    )
    .constructor(|_r| Ok(LazyReports))
    .build();

    let context =
        ApplicationContext::with_components(ContainerConfig::default(), &[report, lazy_reports])
            .unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 0);
    context.get_bean::<ReportGenerator>().unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

/// 审计组件
struct AuditTrail;

/// 记录初始化过的 bean 名称
struct InitializationRecorder {
    log: Log,
}

impl BeanPostProcessor for InitializationRecorder {
    fn post_process_after_initialization(
        &self,
        bean: Bean,
        bean_name: &str,
        _definition: &BeanDefinition,
    ) -> ContainerResult<Bean> {
        self.log.lock().push(bean_name.to_string());
        Ok(bean)
    }
}

#[test]
fn test_bean_post_processors_see_every_singleton() {
    let programmatic: Log = Arc::default();
    let declared: Log = Arc::default();
    let declared_log = declared.clone();
    let recorder = TypeDescriptor::new(
        TypeMetadata::of::<InitializationRecorder>()
            .implements(capability!(InitializationRecorder => dyn BeanPostProcessor)),
    )
    .named("recorder")
    .constructor(move |_r| {
        Ok(InitializationRecorder {
            log: declared_log.clone(),
        })
    })
    .build();
    let audit = TypeDescriptor::new(TypeMetadata::of::<AuditTrail>())
        .component()
        .constructor(|_r| Ok(AuditTrail))
        .build();

    let _context = ContextBuilder::new()
        .with_config(ContainerConfig::default())
        .register(recorder)
        .register(audit)
        .add_bean_post_processor(Arc::new(InitializationRecorder {
            log: programmatic.clone(),
        }))
        .build()
        .unwrap();

    // 处理器自身在注册之前创建，不会被自己处理
    assert!(programmatic.lock().contains(&"auditTrail".to_string()));
    assert!(programmatic.lock().contains(&"recorder".to_string()));
    assert_eq!(*declared.lock(), vec!["auditTrail"]);
}
