//! # 应用上下文演示
//!
//! 演示组件注册、工厂 bean、接口代理与子类代理、上下文感知 bean、事件监听以及上下文的启停。

mod services;

use clap::Parser;
use di_impl::{ApplicationContext, ContextBuilder, LoggingConfig};
use serde_json::json;
use services::{BeanInventory, MessageService, OrderService, TestServiceView, UserService};
use std::path::PathBuf;
use tracing::{error, info};
use weave_aop::AopProxy;
use weave_common::ContainerConfig;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "context-demo")]
#[command(about = "Weave 应用上下文演示")]
struct Args {
    /// 容器配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 使用 JSON 格式输出日志
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut logging = if args.json {
        LoggingConfig::production()
    } else {
        LoggingConfig::development()
    };
    logging.level = parse_log_level(&args.log_level);

    let builder = ContextBuilder::new().with_logging(logging);
    let builder = match &args.config {
        Some(path) => builder.with_config_file(path),
        None => builder.with_config(ContainerConfig {
            display_name: "context-demo".to_string(),
            ..ContainerConfig::default()
        }),
    };
    let context = builder.register_all(services::components()?).build()?;
    info!("启动 Weave 演示应用，上下文: {}", context.id());

    if let Err(e) = run(&context) {
        error!("演示失败: {:#}", e);
        context.close();
        return Err(e);
    }

    context.close();
    info!("应用已关闭");
    Ok(())
}

fn run(context: &ApplicationContext) -> anyhow::Result<()> {
    context.start()?;

    demonstrate_plain_bean(context)?;
    demonstrate_factory_bean(context)?;
    demonstrate_interface_proxy(context)?;
    demonstrate_subclass_proxy(context)?;
    demonstrate_context_aware(context)?;

    context.publish_event("demo-finished", json!({ "beans": context.get_bean_definition_count() }))?;

    // 停止后 bean 仍可获取，重新启动时不会重建
    context.stop()?;
    let message = context.get_bean::<dyn MessageService>()?;
    info!("停止状态下获取消息: {}", message.get_message()?);
    context.start()?;
    Ok(())
}

/// 未被代理的普通 bean
fn demonstrate_plain_bean(context: &ApplicationContext) -> anyhow::Result<()> {
    let raw = context.get_bean_by_name("messageServiceImpl")?;
    info!(
        "messageServiceImpl 被代理: {}",
        raw.downcast_ref::<AopProxy>().is_some()
    );
    let message = context.get_bean::<dyn MessageService>()?;
    info!("消息服务: {}", message.get_message()?);
    Ok(())
}

/// 工厂 bean 与工厂产品
fn demonstrate_factory_bean(context: &ApplicationContext) -> anyhow::Result<()> {
    let factory = context.get_bean_by_name("&orderService")?;
    info!(
        "&orderService 是工厂: {}",
        factory
            .downcast_ref::<services::OrderServiceFactoryBean>()
            .is_some()
    );

    let orders = context.get_bean::<dyn OrderService>()?;
    info!("{}", orders.place_order("键盘", 1)?);
    info!("{}", orders.place_order("显示器", 2)?);
    if let Err(e) = orders.place_order("鼠标", 0) {
        info!("预期的下单失败: {}", e);
    }

    let product = context.get_bean_by_name("orderService")?;
    if let Some(proxy) = product.downcast_ref::<AopProxy>() {
        info!(
            "orderService 产品代理: {:?}, 通知器: {:?}",
            proxy.kind(),
            proxy.advisor_names()
        );
    }
    Ok(())
}

/// 实现了接口的 bean 以接口方式代理
fn demonstrate_interface_proxy(context: &ApplicationContext) -> anyhow::Result<()> {
    let users = context.get_bean::<dyn UserService>()?;
    let user = users.find_user(42)?;
    info!("查找用户: {:?}", user);

    let raw = context.get_bean_by_name("userServiceImpl")?;
    if let Some(proxy) = raw.downcast_ref::<AopProxy>() {
        info!("userServiceImpl 代理类型: {:?}", proxy.kind());
    }
    Ok(())
}

/// 没有接口的 bean 以子类方式代理
fn demonstrate_subclass_proxy(context: &ApplicationContext) -> anyhow::Result<()> {
    let service = context.get_bean::<TestServiceView>()?;
    info!("{}", service.echo("weave")?);
    info!(
        "testServiceImpl 代理类型: {:?}, 通知器: {:?}",
        service.proxy().kind(),
        service.proxy().advisor_names()
    );
    Ok(())
}

/// 获得上下文句柄的 bean
fn demonstrate_context_aware(context: &ApplicationContext) -> anyhow::Result<()> {
    let inventory = context.get_bean::<BeanInventory>()?;
    info!("{}", inventory.summary()?);
    Ok(())
}

/// 解析日志级别
fn parse_log_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
