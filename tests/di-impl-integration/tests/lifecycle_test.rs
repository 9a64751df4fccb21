//! 上下文生命周期与事件的集成测试

use di_abstractions::{ApplicationListener, ContextEvent, ContextEventKind, TypeDescriptor};
use di_impl::{ApplicationContext, ContextBuilder};
use di_impl_integration_tests::init_tracing;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use weave_common::{
    capability, ContainerConfig, ContainerError, ContextState, Lifecycle, TypeMetadata,
};

type Log = Arc<Mutex<Vec<String>>>;

/// 连接池，初始化和销毁时记录日志
struct ConnectionPool {
    log: Log,
}

/// 依赖连接池的仓储
struct OrderRepository {
    _pool: Arc<ConnectionPool>,
}

fn pool(log: &Log) -> Arc<TypeDescriptor> {
    let log = log.clone();
    TypeDescriptor::new(TypeMetadata::of::<ConnectionPool>())
        .component()
        .constructor(move |_r| Ok(ConnectionPool { log: log.clone() }))
        .init(|pool: &ConnectionPool| {
            pool.log.lock().push("init:pool".to_string());
            Ok(())
        })
        .destroy(|pool: &ConnectionPool| {
            pool.log.lock().push("destroy:pool".to_string());
            Ok(())
        })
        .build()
}

fn repository(log: &Log) -> Arc<TypeDescriptor> {
    let log = log.clone();
    TypeDescriptor::new(TypeMetadata::of::<OrderRepository>())
        .component()
        .constructor(|r| {
            Ok(OrderRepository {
                _pool: r.get::<ConnectionPool>()?,
            })
        })
        .destroy(move |_repository: &OrderRepository| {
            log.lock().push("destroy:repository".to_string());
            Ok(())
        })
        .build()
}

#[test]
fn test_destroy_callbacks_run_in_reverse_creation_order() {
    init_tracing();
    let log: Log = Arc::default();
    let context = ApplicationContext::with_components(
        ContainerConfig::default(),
        &[repository(&log), pool(&log)],
    )
    .unwrap();
    assert_eq!(*log.lock(), vec!["init:pool"]);

    context.close();
    assert_eq!(
        *log.lock(),
        vec!["init:pool", "destroy:repository", "destroy:pool"]
    );
    assert_eq!(context.state(), ContextState::Closed);
    assert!(matches!(
        context.get_bean::<ConnectionPool>(),
        Err(ContainerError::Lifecycle { .. })
    ));

    // 重复关闭没有效果
    context.close();
    assert_eq!(log.lock().len(), 3);
}

/// 可启停的后台任务
struct Scheduler {
    running: AtomicBool,
}

impl Lifecycle for Scheduler {
    fn start(&self) -> anyhow::Result<()> {
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> anyhow::Result<()> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

fn scheduler() -> Arc<TypeDescriptor> {
    TypeDescriptor::new(
        TypeMetadata::of::<Scheduler>().implements(capability!(Scheduler => dyn Lifecycle)),
    )
    .component()
    .constructor(|_r| {
        Ok(Scheduler {
            running: AtomicBool::new(false),
        })
    })
    .build()
}

#[test]
fn test_stop_and_start_keep_singletons() {
    let context =
        ApplicationContext::with_components(ContainerConfig::default(), &[scheduler()]).unwrap();
    let before = context.get_bean::<Scheduler>().unwrap();

    context.start().unwrap();
    assert!(before.is_running());
    context.stop().unwrap();
    assert!(!before.is_running());
    assert_eq!(context.state(), ContextState::Stopped);
    assert!(!context.is_running());

    // 停止后仍然可以获取 bean
    let during = context.get_bean::<Scheduler>().unwrap();
    assert!(Arc::ptr_eq(&before, &during));
    context.stop().unwrap();

    context.start().unwrap();
    assert!(context.is_running());
    let after = context.get_bean::<Scheduler>().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert!(after.is_running());

    context.close();
    assert!(!after.is_running());
    assert!(matches!(context.start(), Err(ContainerError::Lifecycle { .. })));
}

#[test]
fn test_close_then_refresh_gives_new_instances() {
    let context = ApplicationContext::with_components(
        ContainerConfig::default().refreshable(true),
        &[scheduler()],
    )
    .unwrap();
    let first = context.get_bean::<Scheduler>().unwrap();

    context.close();
    context.refresh().unwrap();
    assert_eq!(context.state(), ContextState::Active);
    let second = context.get_bean::<Scheduler>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_non_refreshable_context_rejects_second_refresh() {
    let context =
        ApplicationContext::with_components(ContainerConfig::default(), &[scheduler()]).unwrap();
    assert!(matches!(context.refresh(), Err(ContainerError::Lifecycle { .. })));
    assert_eq!(context.state(), ContextState::Active);

    context.close();
    assert!(matches!(context.refresh(), Err(ContainerError::Lifecycle { .. })));
}

/// 以 bean 形式声明的监听器
struct AuditListener {
    log: Log,
}

impl ApplicationListener for AuditListener {
    fn on_event(&self, event: &ContextEvent) -> anyhow::Result<()> {
        let entry = match &event.kind {
            ContextEventKind::Custom { name, payload } => format!("{name}:{payload}"),
            _ => event.name().to_string(),
        };
        self.log.lock().push(entry);
        Ok(())
    }
}

/// 只关心自定义事件的监听器，处理时总是失败
struct FailingListener;

impl ApplicationListener for FailingListener {
    fn on_event(&self, _event: &ContextEvent) -> anyhow::Result<()> {
        anyhow::bail!("监听器故障")
    }

    fn supports(&self, event: &ContextEvent) -> bool {
        matches!(event.kind, ContextEventKind::Custom { .. })
    }
}

#[test]
fn test_listener_beans_receive_context_events() {
    let log: Log = Arc::default();
    let listener_log = log.clone();
    let listener = TypeDescriptor::new(
        TypeMetadata::of::<AuditListener>()
            .implements(capability!(AuditListener => dyn ApplicationListener)),
    )
    .component()
    .constructor(move |_r| {
        Ok(AuditListener {
            log: listener_log.clone(),
        })
    })
    .build();

    let context = ContextBuilder::new()
        .with_config(ContainerConfig::default())
        .register(listener)
        .add_listener(Arc::new(FailingListener))
        .build()
        .unwrap();

    // 监听器失败不影响发布者和其他监听器
    context
        .publish_event("order-created", json!({ "id": 7 }))
        .unwrap();
    context.start().unwrap();
    context.stop().unwrap();
    context.close();

    assert_eq!(
        *log.lock(),
        vec![
            "ContextRefreshedEvent",
            r#"order-created:{"id":7}"#,
            "ContextStartedEvent",
            "ContextStoppedEvent",
            "ContextClosedEvent",
        ]
    );
}
