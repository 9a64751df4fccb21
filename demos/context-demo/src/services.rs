//! 演示用的组件

use di_abstractions::{
    ApplicationContextAware, ApplicationListener, BeanLookup, BeanNameAware, ContextEvent,
    FactoryBean, TypeDescriptor,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use weave_aop::{proxy_view, subclass_view, Advisor, AopProxy};
use weave_common::{
    capability, Bean, ContainerError, ContainerResult, Lifecycle, MethodSignature, TypeMetadata,
};

/// 取出第 `index` 个参数并反序列化
fn arg<T: serde::de::DeserializeOwned>(args: &[Value], index: usize) -> anyhow::Result<T> {
    Ok(serde_json::from_value(
        args.get(index).cloned().unwrap_or_default(),
    )?)
}

/// 消息服务
pub trait MessageService: Send + Sync {
    /// 获取问候消息
    fn get_message(&self) -> anyhow::Result<String>;
}

/// 消息服务实现
pub struct MessageServiceImpl;

impl MessageService for MessageServiceImpl {
    fn get_message(&self) -> anyhow::Result<String> {
        Ok("欢迎使用 Weave".to_string())
    }
}

struct MessageServiceView(Arc<AopProxy>);

impl From<Arc<AopProxy>> for MessageServiceView {
    fn from(proxy: Arc<AopProxy>) -> Self {
        Self(proxy)
    }
}

impl MessageService for MessageServiceView {
    fn get_message(&self) -> anyhow::Result<String> {
        self.0.invoke_as("getMessage", Vec::new())
    }
}

fn message_service() -> Arc<TypeDescriptor> {
    TypeDescriptor::new(
        TypeMetadata::of::<MessageServiceImpl>()
            .implements(
                capability!(MessageServiceImpl => dyn MessageService)
                    .with_proxy_view(proxy_view!(dyn MessageService => MessageServiceView)),
            )
            .method(MethodSignature::new("getMessage").returns("String"))
            .with_invoker(|service: &MessageServiceImpl, method, _args| match method {
                "getMessage" => Ok(Value::from(service.get_message()?)),
                other => anyhow::bail!("MessageServiceImpl 没有方法 {other}"),
            }),
    )
    .service()
    .constructor(|_r| Ok(MessageServiceImpl))
    .build()
}

/// 订单服务
pub trait OrderService: Send + Sync {
    /// 下单，返回订单摘要
    fn place_order(&self, item: &str, quantity: u32) -> anyhow::Result<String>;
}

/// 订单服务实现，由工厂 bean 生产
pub struct OrderServiceImpl {
    message: Arc<dyn MessageService>,
    sequence: AtomicU64,
}

impl OrderService for OrderServiceImpl {
    fn place_order(&self, item: &str, quantity: u32) -> anyhow::Result<String> {
        anyhow::ensure!(quantity > 0, "商品 {item} 的数量必须大于 0");
        let id = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!(
            "订单#{id}: {item} x{quantity} ({})",
            self.message.get_message()?
        ))
    }
}

struct OrderServiceView(Arc<AopProxy>);

impl From<Arc<AopProxy>> for OrderServiceView {
    fn from(proxy: Arc<AopProxy>) -> Self {
        Self(proxy)
    }
}

impl OrderService for OrderServiceView {
    fn place_order(&self, item: &str, quantity: u32) -> anyhow::Result<String> {
        self.0
            .invoke_as("placeOrder", vec![Value::from(item), Value::from(quantity)])
    }
}

/// 订单服务工厂
pub struct OrderServiceFactoryBean {
    message: Arc<dyn MessageService>,
}

impl FactoryBean for OrderServiceFactoryBean {
    fn get_object(&self) -> anyhow::Result<Bean> {
        info!("OrderServiceFactoryBean 生产订单服务");
        Ok(Arc::new(OrderServiceImpl {
            message: self.message.clone(),
            sequence: AtomicU64::new(0),
        }))
    }
}

fn order_service_metadata() -> TypeMetadata {
    TypeMetadata::of::<OrderServiceImpl>()
        .implements(
            capability!(OrderServiceImpl => dyn OrderService)
                .with_proxy_view(proxy_view!(dyn OrderService => OrderServiceView)),
        )
        .method(
            MethodSignature::new("placeOrder")
                .param("String")
                .param("u32")
                .returns("String"),
        )
        .with_invoker(|service: &OrderServiceImpl, method, args| match method {
            "placeOrder" => {
                let item: String = arg(args, 0)?;
                let quantity: u32 = arg(args, 1)?;
                Ok(Value::from(service.place_order(&item, quantity)?))
            }
            other => anyhow::bail!("OrderServiceImpl 没有方法 {other}"),
        })
}

fn order_service_factory() -> Arc<TypeDescriptor> {
    TypeDescriptor::new(TypeMetadata::of::<OrderServiceFactoryBean>())
        .component()
        .named("orderService")
        .factory_bean::<OrderServiceFactoryBean>(order_service_metadata())
        .constructor(|r| {
            Ok(OrderServiceFactoryBean {
                message: r.get::<dyn MessageService>()?,
            })
        })
        .build()
}

/// 用户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// 用户ID
    pub id: u64,
    /// 用户名
    pub name: String,
}

/// 用户服务
pub trait UserService: Send + Sync {
    /// 按ID查找用户
    fn find_user(&self, id: u64) -> anyhow::Result<User>;
}

/// 用户服务实现
pub struct UserServiceImpl;

impl UserService for UserServiceImpl {
    fn find_user(&self, id: u64) -> anyhow::Result<User> {
        Ok(User {
            id,
            name: format!("user-{id}"),
        })
    }
}

struct UserServiceView(Arc<AopProxy>);

impl From<Arc<AopProxy>> for UserServiceView {
    fn from(proxy: Arc<AopProxy>) -> Self {
        Self(proxy)
    }
}

impl UserService for UserServiceView {
    fn find_user(&self, id: u64) -> anyhow::Result<User> {
        self.0.invoke_as("findUser", vec![Value::from(id)])
    }
}

fn user_service() -> Arc<TypeDescriptor> {
    TypeDescriptor::new(
        TypeMetadata::of::<UserServiceImpl>()
            .implements(
                capability!(UserServiceImpl => dyn UserService)
                    .with_proxy_view(proxy_view!(dyn UserService => UserServiceView)),
            )
            .method(MethodSignature::new("findUser").param("u64").returns("User"))
            .with_invoker(|service: &UserServiceImpl, method, args| match method {
                "findUser" => Ok(serde_json::to_value(service.find_user(arg(args, 0)?)?)?),
                other => anyhow::bail!("UserServiceImpl 没有方法 {other}"),
            }),
    )
    .service()
    .constructor(|_r| Ok(UserServiceImpl))
    .build()
}

/// 没有接口的服务，只能以子类方式代理
pub struct TestServiceImpl;

impl TestServiceImpl {
    fn echo(&self, text: &str) -> String {
        format!("echo: {text}")
    }
}

/// `TestServiceImpl` 的委托包装类型
pub struct TestServiceView(Arc<AopProxy>);

impl From<Arc<AopProxy>> for TestServiceView {
    fn from(proxy: Arc<AopProxy>) -> Self {
        Self(proxy)
    }
}

impl TestServiceView {
    /// 回显文本
    pub fn echo(&self, text: &str) -> anyhow::Result<String> {
        self.0.invoke_as("echo", vec![Value::from(text)])
    }

    /// 底层代理
    pub fn proxy(&self) -> &AopProxy {
        &self.0
    }
}

fn test_service() -> Arc<TypeDescriptor> {
    TypeDescriptor::new(
        TypeMetadata::of::<TestServiceImpl>()
            .method(MethodSignature::new("echo").param("String").returns("String"))
            .with_subclass_view(subclass_view!(TestServiceView))
            .with_invoker(|service: &TestServiceImpl, method, args| match method {
                "echo" => Ok(Value::from(service.echo(&arg::<String>(args, 0)?))),
                other => anyhow::bail!("TestServiceImpl 没有方法 {other}"),
            }),
    )
    .service()
    .constructor(|_r| Ok(TestServiceImpl))
    .build()
}

/// 感知上下文的 bean，汇总容器中的定义
#[derive(Default)]
pub struct BeanInventory {
    name: OnceCell<String>,
    context: OnceCell<Arc<dyn BeanLookup>>,
}

impl BeanInventory {
    /// 生成容器概要
    pub fn summary(&self) -> ContainerResult<String> {
        let context = self
            .context
            .get()
            .ok_or_else(|| ContainerError::lifecycle("BeanInventory 尚未获得上下文"))?;
        Ok(format!(
            "{} 看到上下文 {} 中的 {} 个定义: {:?}",
            self.name.get().map_or("?", String::as_str),
            context.context_id(),
            context.get_bean_definition_count(),
            context.get_bean_definition_names()
        ))
    }
}

impl BeanNameAware for BeanInventory {
    fn set_bean_name(&self, name: &str) {
        let _ = self.name.set(name.to_string());
    }
}

impl ApplicationContextAware for BeanInventory {
    fn set_application_context(&self, context: Arc<dyn BeanLookup>) {
        let _ = self.context.set(context);
    }
}

fn bean_inventory() -> Arc<TypeDescriptor> {
    TypeDescriptor::new(
        TypeMetadata::of::<BeanInventory>()
            .implements(capability!(BeanInventory => dyn BeanNameAware))
            .implements(capability!(BeanInventory => dyn ApplicationContextAware)),
    )
    .component()
    .named("inventory")
    .constructor(|_r| Ok(BeanInventory::default()))
    .build()
}

/// 记录上下文事件的监听器
pub struct StartupListener;

impl ApplicationListener for StartupListener {
    fn on_event(&self, event: &ContextEvent) -> anyhow::Result<()> {
        info!(
            "收到事件 {} (上下文 {}, {})",
            event.name(),
            event.context_id,
            event.timestamp.format("%H:%M:%S%.3f")
        );
        Ok(())
    }
}

fn startup_listener() -> Arc<TypeDescriptor> {
    TypeDescriptor::new(
        TypeMetadata::of::<StartupListener>()
            .implements(capability!(StartupListener => dyn ApplicationListener)),
    )
    .component()
    .constructor(|_r| Ok(StartupListener))
    .build()
}

/// 随上下文启停的心跳任务
pub struct HeartbeatTask {
    running: AtomicBool,
}

impl Lifecycle for HeartbeatTask {
    fn start(&self) -> anyhow::Result<()> {
        info!("心跳任务启动");
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> anyhow::Result<()> {
        info!("心跳任务停止");
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

fn heartbeat_task() -> Arc<TypeDescriptor> {
    TypeDescriptor::new(
        TypeMetadata::of::<HeartbeatTask>()
            .implements(capability!(HeartbeatTask => dyn Lifecycle)),
    )
    .component()
    .constructor(|_r| {
        Ok(HeartbeatTask {
            running: AtomicBool::new(false),
        })
    })
    .build()
}

/// 切面配置：计时和审计
pub struct DemoAspectConfig;

fn aspect_config() -> anyhow::Result<Arc<TypeDescriptor>> {
    let timing = Advisor::new(
        "timingAdvisor",
        "execution(* *ServiceImpl.*(..)) && !bean(messageServiceImpl)",
    )?
    .order(1)
    .around(|pjp| {
        let started = Instant::now();
        let result = pjp.proceed();
        info!(
            "{} 耗时 {:?}",
            pjp.short_description(),
            started.elapsed()
        );
        result
    });
    let audit = Advisor::new("auditAdvisor", "execution(* *ServiceImpl.*(..))")?
        .order(2)
        .after_returning(|jp, value| {
            info!("{} 返回 {}", jp.short_description(), value);
            Ok(())
        })
        .after_throwing(|jp, err| {
            tracing::warn!("{} 抛出异常: {:#}", jp.short_description(), err);
        });

    Ok(TypeDescriptor::new(TypeMetadata::of::<DemoAspectConfig>())
        .configuration()
        .enable_auto_proxy()
        .advisor(timing)
        .advisor(audit)
        .constructor(|_r| Ok(DemoAspectConfig))
        .build())
}

/// 演示应用的全部组件
pub fn components() -> anyhow::Result<Vec<Arc<TypeDescriptor>>> {
    Ok(vec![
        aspect_config()?,
        message_service(),
        order_service_factory(),
        user_service(),
        test_service(),
        bean_inventory(),
        startup_listener(),
        heartbeat_task(),
    ])
}
