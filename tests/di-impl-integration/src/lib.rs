//! 集成测试共用的组件
//!
//! 订单服务和消息服务都声明了方法分派表和接口代理视图，可以被切面织入。

use di_abstractions::TypeDescriptor;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use weave_aop::{proxy_view, AopProxy};
use weave_common::{capability, MethodSignature, TypeMetadata};

/// 初始化测试日志，重复调用无效果
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// 订单服务
pub trait OrderService: Send + Sync {
    /// 创建订单，返回订单号
    fn new_order(&self, item: &str) -> anyhow::Result<u64>;
}

/// 订单服务实现，每创建一个订单计数加一
pub struct OrderServiceImpl {
    created: Arc<AtomicU64>,
}

impl OrderService for OrderServiceImpl {
    fn new_order(&self, item: &str) -> anyhow::Result<u64> {
        tracing::debug!("创建订单: {}", item);
        Ok(self.created.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// 订单服务的代理视图
pub struct OrderServiceView(Arc<AopProxy>);

impl From<Arc<AopProxy>> for OrderServiceView {
    fn from(proxy: Arc<AopProxy>) -> Self {
        Self(proxy)
    }
}

impl OrderService for OrderServiceView {
    fn new_order(&self, item: &str) -> anyhow::Result<u64> {
        self.0.invoke_as("newOrder", vec![Value::from(item)])
    }
}

/// 订单服务描述符，`created` 记录目标方法的实际执行次数
pub fn order_service(created: Arc<AtomicU64>) -> TypeDescriptor {
    TypeDescriptor::new(
        TypeMetadata::of::<OrderServiceImpl>()
            .implements(
                capability!(OrderServiceImpl => dyn OrderService)
                    .with_proxy_view(proxy_view!(dyn OrderService => OrderServiceView)),
            )
            .method(MethodSignature::new("newOrder").param("String").returns("u64"))
            .with_invoker(|service: &OrderServiceImpl, method, args| match method {
                "newOrder" => {
                    let item: String =
                        serde_json::from_value(args.first().cloned().unwrap_or_default())?;
                    Ok(Value::from(service.new_order(&item)?))
                }
                other => anyhow::bail!("OrderServiceImpl 没有方法 {other}"),
            }),
    )
    .service()
    .constructor(move |_r| {
        Ok(OrderServiceImpl {
            created: created.clone(),
        })
    })
}

/// 消息服务
pub trait MessageService: Send + Sync {
    /// 获取消息
    fn get_message(&self) -> anyhow::Result<String>;
}

/// 消息服务实现
pub struct MessageServiceImpl;

impl MessageService for MessageServiceImpl {
    fn get_message(&self) -> anyhow::Result<String> {
        Ok("hello".to_string())
    }
}

/// 消息服务的代理视图
pub struct MessageServiceView(Arc<AopProxy>);

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

/// 消息服务描述符
pub fn message_service() -> TypeDescriptor {
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
}
