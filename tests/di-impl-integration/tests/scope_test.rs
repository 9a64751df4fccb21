//! 作用域的集成测试

use di_abstractions::{Scope, TypeDescriptor};
use di_impl::{ApplicationContext, ContextBuilder};
use di_impl_integration_tests::init_tracing;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use weave_aop::{proxy_view, AopProxy};
use weave_common::{
    capability, Bean, ContainerConfig, ContainerError, ContainerResult, MethodSignature,
    TypeMetadata, SCOPE_THREAD,
};

/// 计数器组件
struct Ticket {
    number: u64,
}

fn ticket(next: Arc<AtomicU64>) -> TypeDescriptor {
    TypeDescriptor::new(TypeMetadata::of::<Ticket>())
        .component()
        .constructor(move |_r| {
            Ok(Ticket {
                number: next.fetch_add(1, Ordering::SeqCst),
            })
        })
}

/// 会话信息
trait SessionInfo: Send + Sync {
    fn id(&self) -> anyhow::Result<u64>;
}

struct Session {
    id: u64,
}

impl SessionInfo for Session {
    fn id(&self) -> anyhow::Result<u64> {
        Ok(self.id)
    }
}

struct SessionView(Arc<AopProxy>);

impl From<Arc<AopProxy>> for SessionView {
    fn from(proxy: Arc<AopProxy>) -> Self {
        Self(proxy)
    }
}

impl SessionInfo for SessionView {
    fn id(&self) -> anyhow::Result<u64> {
        self.0.invoke_as("id", Vec::new())
    }
}

fn session(next: Arc<AtomicU64>) -> TypeDescriptor {
    TypeDescriptor::new(
        TypeMetadata::of::<Session>()
            .implements(
                capability!(Session => dyn SessionInfo)
                    .with_proxy_view(proxy_view!(dyn SessionInfo => SessionView)),
            )
            .method(MethodSignature::new("id").returns("u64"))
            .with_invoker(|session: &Session, method, _args| match method {
                "id" => Ok(Value::from(session.id()?)),
                other => anyhow::bail!("Session 没有方法 {other}"),
            }),
    )
    .component()
    .scope(SCOPE_THREAD)
    .constructor(move |_r| {
        Ok(Session {
            id: next.fetch_add(1, Ordering::SeqCst),
        })
    })
}

#[test]
fn test_singleton_identity() {
    init_tracing();
    let next = Arc::new(AtomicU64::new(1));
    let context =
        ApplicationContext::with_components(ContainerConfig::default(), &[ticket(next.clone()).build()])
            .unwrap();

    let first = context.get_bean::<Ticket>().unwrap();
    let second = context.get_bean_named::<Ticket>("ticket").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.number, 1);
    assert_eq!(next.load(Ordering::SeqCst), 2);
}

#[test]
fn test_prototype_distinctness() {
    let next = Arc::new(AtomicU64::new(1));
    let context = ApplicationContext::with_components(
        ContainerConfig::default(),
        &[ticket(next.clone()).prototype().build()],
    )
    .unwrap();

    // 原型不参与预实例化
    assert_eq!(next.load(Ordering::SeqCst), 1);
    let first = context.get_bean::<Ticket>().unwrap();
    let second = context.get_bean::<Ticket>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_ne!(first.number, second.number);
    assert!(context.is_prototype("ticket").unwrap());
}

#[test]
fn test_thread_scope_gives_one_instance_per_thread() {
    let next = Arc::new(AtomicU64::new(1));
    let context = Arc::new(
        ApplicationContext::with_components(ContainerConfig::default(), &[session(next).build()])
            .unwrap(),
    );

    let here = context.get_bean::<dyn SessionInfo>().unwrap().id().unwrap();
    let again = context.get_bean::<dyn SessionInfo>().unwrap().id().unwrap();
    assert_eq!(here, again);

    let other = {
        let context = context.clone();
        thread::spawn(move || context.get_bean::<dyn SessionInfo>().unwrap().id().unwrap())
            .join()
            .unwrap()
    };
    assert_ne!(here, other);
}

#[test]
fn test_scoped_proxy_resolves_target_per_call() {
    let next = Arc::new(AtomicU64::new(1));
    let context = Arc::new(
        ApplicationContext::with_components(
            ContainerConfig::default(),
            &[session(next.clone()).scoped_proxy().build()],
        )
        .unwrap(),
    );
    // 作用域代理不会提前创建目标
    assert_eq!(next.load(Ordering::SeqCst), 1);

    let proxy = context.get_bean_by_name("session").unwrap();
    assert!(proxy.downcast_ref::<AopProxy>().is_some_and(AopProxy::is_dynamic));
    assert!(context.contains_bean("scopedTarget.session"));

    let shared = context.get_bean::<dyn SessionInfo>().unwrap();
    let here = shared.id().unwrap();
    let there = {
        let shared = shared.clone();
        thread::spawn(move || shared.id().unwrap()).join().unwrap()
    };
    assert_ne!(here, there);
    assert_eq!(shared.id().unwrap(), here);
}

/// 以名称为键的简单作用域
#[derive(Default)]
struct TenantScope {
    instances: Mutex<HashMap<String, Bean>>,
}

impl Scope for TenantScope {
    fn get(
        &self,
        name: &str,
        object_factory: &mut dyn FnMut() -> ContainerResult<Bean>,
    ) -> ContainerResult<Bean> {
        if let Some(bean) = self.instances.lock().get(name) {
            return Ok(bean.clone());
        }
        let bean = object_factory()?;
        self.instances.lock().insert(name.to_string(), bean.clone());
        Ok(bean)
    }

    fn remove(&self, name: &str) -> Option<Bean> {
        self.instances.lock().remove(name)
    }
}

#[test]
fn test_custom_scope() {
    let next = Arc::new(AtomicU64::new(1));
    let scope = Arc::new(TenantScope::default());
    let context = ContextBuilder::new()
        .with_config(ContainerConfig::default())
        .register(ticket(next.clone()).scope("tenant").build())
        .register_scope("tenant", scope.clone())
        .build()
        .unwrap();

    let first = context.get_bean::<Ticket>().unwrap();
    let second = context.get_bean::<Ticket>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    assert!(scope.remove("ticket").is_some());
    let third = context.get_bean::<Ticket>().unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
}

#[test]
fn test_unknown_scope_fails_refresh() {
    let err = ApplicationContext::with_components(
        ContainerConfig::default(),
        &[ticket(Arc::new(AtomicU64::new(1))).scope("conversation").build()],
    )
    .unwrap_err();
    assert!(
        matches!(err, ContainerError::DefinitionValidation { ref name, .. } if name == "ticket"),
        "unexpected error: {err:?}"
    );
}
