//! 切面织入的集成测试

use di_abstractions::TypeDescriptor;
use di_impl::ContextBuilder;
use di_impl_integration_tests::{
    init_tracing, message_service, order_service, MessageService, OrderService,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use weave_aop::{Advisor, AopProxy, ProxyKind};
use weave_common::{ContainerConfig, TypeMetadata};

fn counting_advisor(counter: &Arc<AtomicUsize>) -> Advisor {
    let counter = counter.clone();
    Advisor::new(
        "countingAdvisor",
        "execution(* *ServiceImpl.*(..)) && !bean(messageServiceImpl)",
    )
    .unwrap()
    .before(move |_jp| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

#[test]
fn test_pointcut_selects_beans_by_type_and_name() {
    init_tracing();
    let created = Arc::new(AtomicU64::new(0));
    let advised = Arc::new(AtomicUsize::new(0));
    let context = ContextBuilder::new()
        .with_config(ContainerConfig::default())
        .register(order_service(created.clone()).build())
        .register(message_service().build())
        .add_advisor(counting_advisor(&advised))
        .build()
        .unwrap();

    let orders = context.get_bean_by_name("orderServiceImpl").unwrap();
    let proxy = orders.downcast_ref::<AopProxy>().expect("订单服务应当被代理");
    assert_eq!(proxy.kind(), ProxyKind::Interface);
    assert_eq!(proxy.advisor_names(), ["countingAdvisor"]);

    let messages = context.get_bean_by_name("messageServiceImpl").unwrap();
    assert!(messages.downcast_ref::<AopProxy>().is_none());

    let order_service = context.get_bean::<dyn OrderService>().unwrap();
    assert_eq!(order_service.new_order("book").unwrap(), 1);
    assert_eq!(order_service.new_order("pen").unwrap(), 2);
    assert_eq!(advised.load(Ordering::SeqCst), 2);

    let message_service = context.get_bean::<dyn MessageService>().unwrap();
    assert_eq!(message_service.get_message().unwrap(), "hello");
    assert_eq!(advised.load(Ordering::SeqCst), 2);
}

#[test]
fn test_around_advice_can_skip_target() {
    let created = Arc::new(AtomicU64::new(0));
    let blocking = Advisor::new("blockingAdvisor", "execution(* OrderServiceImpl.newOrder(..))")
        .unwrap()
        .around(|_pjp| Ok(Value::from(0)));
    let context = ContextBuilder::new()
        .with_config(ContainerConfig::default())
        .register(order_service(created.clone()).build())
        .add_advisor(blocking)
        .build()
        .unwrap();

    let service = context.get_bean::<dyn OrderService>().unwrap();
    assert_eq!(service.new_order("book").unwrap(), 0);
    assert_eq!(created.load(Ordering::SeqCst), 0);
}

#[test]
fn test_advice_order_and_argument_rewriting() {
    let created = Arc::new(AtomicU64::new(0));
    let trace: Arc<Mutex<Vec<String>>> = Arc::default();

    let outer_trace = trace.clone();
    let outer = Advisor::new("outer", "within(*OrderServiceImpl)")
        .unwrap()
        .order(1)
        .around(move |pjp| {
            outer_trace.lock().push(format!("outer:{}", pjp.short_description()));
            pjp.proceed_with(vec![Value::from("rewritten")])
        });
    let inner_trace = trace.clone();
    let inner = Advisor::new("inner", "bean(orderServiceImpl)")
        .unwrap()
        .order(2)
        .before(move |jp| {
            inner_trace.lock().push(format!("inner:{}", jp.args()[0]));
            Ok(())
        });

    let context = ContextBuilder::new()
        .with_config(ContainerConfig::default())
        .register(order_service(created).build())
        .add_advisor(inner)
        .add_advisor(outer)
        .build()
        .unwrap();

    context.get_bean::<dyn OrderService>().unwrap().new_order("book").unwrap();
    assert_eq!(
        *trace.lock(),
        vec!["outer:OrderServiceImpl.newOrder", "inner:\"rewritten\""]
    );
}

/// 启用自动代理并声明切面的配置类
struct AuditAspectConfig;

#[test]
fn test_configuration_declared_aspect() {
    let created = Arc::new(AtomicU64::new(0));
    let returned: Arc<Mutex<Vec<Value>>> = Arc::default();
    let failures = Arc::new(AtomicUsize::new(0));

    let returned_log = returned.clone();
    let failure_count = failures.clone();
    let aspect = Advisor::new("auditAdvisor", "execution(* *ServiceImpl.*(..))")
        .unwrap()
        .after_returning(move |_jp, value| {
            returned_log.lock().push(value.clone());
            Ok(())
        })
        .after_throwing(move |_jp, _err| {
            failure_count.fetch_add(1, Ordering::SeqCst);
        });
    let config = TypeDescriptor::new(TypeMetadata::of::<AuditAspectConfig>())
        .configuration()
        .enable_auto_proxy()
        .advisor(aspect)
        .constructor(|_r| Ok(AuditAspectConfig))
        .build();

    let context = ContextBuilder::new()
        .with_config(ContainerConfig::default())
        .register(config)
        .register(order_service(created).build())
        .build()
        .unwrap();

    assert!(context.contains_bean("auditAdvisor"));
    let service = context.get_bean::<dyn OrderService>().unwrap();
    service.new_order("book").unwrap();
    service.new_order("pen").unwrap();
    assert_eq!(*returned.lock(), vec![Value::from(1), Value::from(2)]);
    assert_eq!(failures.load(Ordering::SeqCst), 0);

    let proxy = context.get_bean_by_name("orderServiceImpl").unwrap();
    let proxy = proxy.downcast_ref::<AopProxy>().unwrap();
    assert!(proxy.is_advised("newOrder"));
    assert!(proxy.invoke("cancelOrder", Vec::new()).is_err());
    assert_eq!(failures.load(Ordering::SeqCst), 0);
}

#[test]
fn test_no_weaving_without_advisors() {
    let created = Arc::new(AtomicU64::new(0));
    let context = ContextBuilder::new()
        .with_config(ContainerConfig::default())
        .register(order_service(created).build())
        .build()
        .unwrap();
    let bean = context.get_bean_by_name("orderServiceImpl").unwrap();
    assert!(bean.downcast_ref::<AopProxy>().is_none());
}
