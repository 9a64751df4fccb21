//! 容器配置文件的集成测试

use di_abstractions::TypeDescriptor;
use di_impl::ContextBuilder;
use di_impl_integration_tests::init_tracing;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;
use weave_common::{ContainerConfig, ContainerError, TypeMetadata};

fn config_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// 会话存储
struct SessionStore;

fn session_store(released: &Arc<AtomicUsize>) -> Arc<TypeDescriptor> {
    let released = released.clone();
    TypeDescriptor::new(TypeMetadata::of::<SessionStore>())
        .component()
        .constructor(|_r| Ok(SessionStore))
        .destroy(move |_store: &SessionStore| {
            released.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .build()
}

#[test]
fn test_config_file_controls_context() {
    init_tracing();
    let file = config_file(
        r#"
        id = "orders-1"
        display_name = "orders"
        refreshable = true
        allow_definition_overriding = false
        "#,
    );
    let released = Arc::new(AtomicUsize::new(0));

    let context = ContextBuilder::new()
        .with_config_file(file.path())
        .register(session_store(&released))
        .build()
        .unwrap();
    assert_eq!(context.id(), "orders-1");
    assert_eq!(context.display_name(), "orders");
    assert!(!context.config().allow_definition_overriding);
    assert!(context.startup_date().is_some());

    // 可刷新的上下文重新刷新时销毁旧的单例
    context.refresh().unwrap();
    assert_eq!(released.load(Ordering::SeqCst), 1);

    drop(context);
    assert_eq!(released.load(Ordering::SeqCst), 2);
}

#[test]
fn test_generated_id_uses_display_name() {
    let context = ContextBuilder::new()
        .with_config(ContainerConfig {
            display_name: "billing".to_string(),
            ..ContainerConfig::default()
        })
        .build()
        .unwrap();
    assert!(context.id().starts_with("billing-"));
    assert_eq!(context.get_bean_definition_count(), 0);
}

#[test]
fn test_invalid_config_file_rejected() {
    let file = config_file("max_post_processor_rounds = 0\n");
    let err = ContextBuilder::new()
        .with_config_file(file.path())
        .build()
        .unwrap_err();
    assert!(
        matches!(err, ContainerError::Configuration { .. }),
        "unexpected error: {err:?}"
    );

    let malformed = config_file("refreshable = \"sometimes\"\n");
    let err = ContextBuilder::new()
        .with_config_file(malformed.path())
        .build()
        .unwrap_err();
    assert!(matches!(err, ContainerError::Configuration { .. }));
}

#[test]
fn test_config_and_file_are_exclusive() {
    let file = config_file("display_name = \"orders\"\n");
    let err = ContextBuilder::new()
        .with_config(ContainerConfig::default())
        .with_config_file(file.path())
        .build_unrefreshed()
        .unwrap_err();
    assert!(matches!(err, ContainerError::Configuration { .. }));
}
