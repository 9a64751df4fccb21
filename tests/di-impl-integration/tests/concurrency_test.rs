//! 并发获取 bean 的集成测试

use di_abstractions::TypeDescriptor;
use di_impl::ApplicationContext;
use di_impl_integration_tests::{init_tracing, order_service, OrderService};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use weave_aop::Advisor;
use weave_common::{ContainerConfig, ContainerError, TypeMetadata};

/// 构造较慢的缓存组件
struct WarmCache {
    serial: usize,
}

fn warm_cache(built: &Arc<AtomicUsize>) -> Arc<TypeDescriptor> {
    let built = built.clone();
    TypeDescriptor::new(TypeMetadata::of::<WarmCache>())
        .component()
        .lazy()
        .constructor(move |_r| {
            std::thread::sleep(Duration::from_millis(20));
            Ok(WarmCache {
                serial: built.fetch_add(1, Ordering::SeqCst),
            })
        })
        .build()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_lazy_singleton_created_once() {
    init_tracing();
    let built = Arc::new(AtomicUsize::new(0));
    let context = Arc::new(
        ApplicationContext::with_components(ContainerConfig::default(), &[warm_cache(&built)])
            .unwrap(),
    );
    assert_eq!(built.load(Ordering::SeqCst), 0);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let context = context.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            context.get_bean::<WarmCache>().unwrap()
        }));
    }

    let mut beans = Vec::new();
    for handle in handles {
        beans.push(handle.await.unwrap());
    }
    assert_eq!(built.load(Ordering::SeqCst), 1);
    assert!(beans.iter().all(|bean| Arc::ptr_eq(bean, &beans[0])));
    assert_eq!(beans[0].serial, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_through_proxy() {
    let created = Arc::new(AtomicU64::new(0));
    let advised = Arc::new(AtomicUsize::new(0));
    let counter = advised.clone();
    let advisor = Advisor::new("countingAdvisor", "bean(orderServiceImpl)")
        .unwrap()
        .before(move |_jp| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

    let context = ApplicationContext::new(ContainerConfig::default());
    context.register(&[order_service(created.clone()).build()]).unwrap();
    context.add_advisor(Arc::new(advisor)).unwrap();
    context.refresh().unwrap();
    let context = Arc::new(context);

    let mut handles = Vec::new();
    for worker in 0..8 {
        let context = context.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let service = context.get_bean::<dyn OrderService>().unwrap();
            for i in 0..10 {
                service.new_order(&format!("item-{worker}-{i}")).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(created.load(Ordering::SeqCst), 80);
    assert_eq!(advised.load(Ordering::SeqCst), 80);
}

/// 依赖发件箱的收件箱
struct Inbox {
    _outbox: Arc<Outbox>,
}

/// 依赖收件箱的发件箱
struct Outbox {
    _inbox: Arc<Inbox>,
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cross_thread_cycle_reported_as_circular_dependency() {
    init_tracing();
    let inbox = TypeDescriptor::new(TypeMetadata::of::<Inbox>())
        .component()
        .lazy()
        .constructor(|r| {
            std::thread::sleep(Duration::from_millis(100));
            Ok(Inbox {
                _outbox: r.get::<Outbox>()?,
            })
        })
        .build();
    let outbox = TypeDescriptor::new(TypeMetadata::of::<Outbox>())
        .component()
        .lazy()
        .constructor(|r| {
            std::thread::sleep(Duration::from_millis(100));
            Ok(Outbox {
                _inbox: r.get::<Inbox>()?,
            })
        })
        .build();
    let context = Arc::new(
        ApplicationContext::with_components(ContainerConfig::default(), &[inbox, outbox]).unwrap(),
    );

    let first = context.clone();
    let inbox_task = tokio::task::spawn_blocking(move || first.get_bean::<Inbox>().map(|_| ()));
    let second = context.clone();
    let outbox_task = tokio::task::spawn_blocking(move || second.get_bean::<Outbox>().map(|_| ()));

    for result in [inbox_task.await.unwrap(), outbox_task.await.unwrap()] {
        match result {
            Err(ContainerError::CircularDependency { chain }) => {
                assert!(chain.iter().any(|name| name == "inbox"), "chain: {chain:?}");
                assert!(chain.iter().any(|name| name == "outbox"), "chain: {chain:?}");
                assert_eq!(chain.first(), chain.last());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
