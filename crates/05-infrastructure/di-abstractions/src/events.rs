//! 上下文事件

use chrono::{DateTime, Utc};
use serde_json::Value;

/// 事件类型
#[derive(Debug, Clone, PartialEq)]
pub enum ContextEventKind {
    /// 刷新完成
    Refreshed,
    /// 已启动
    Started,
    /// 已停止
    Stopped,
    /// 已关闭
    Closed,
    /// 自定义事件
    Custom {
        /// 事件名称
        name: String,
        /// 事件数据
        payload: Value,
    },
}

/// 上下文事件
#[derive(Debug, Clone)]
pub struct ContextEvent {
    /// 事件类型
    pub kind: ContextEventKind,
    /// 发布事件的上下文ID
    pub context_id: String,
    /// 发布时间
    pub timestamp: DateTime<Utc>,
}

impl ContextEvent {
    /// 创建事件
    pub fn new(kind: ContextEventKind, context_id: impl Into<String>) -> Self {
        Self {
            kind,
            context_id: context_id.into(),
            timestamp: Utc::now(),
        }
    }

    /// 事件名称
    pub fn name(&self) -> &str {
        match &self.kind {
            ContextEventKind::Refreshed => "ContextRefreshedEvent",
            ContextEventKind::Started => "ContextStartedEvent",
            ContextEventKind::Stopped => "ContextStoppedEvent",
            ContextEventKind::Closed => "ContextClosedEvent",
            ContextEventKind::Custom { name, .. } => name,
        }
    }
}

/// 事件监听器
pub trait ApplicationListener: Send + Sync {
    /// 处理事件
    fn on_event(&self, event: &ContextEvent) -> anyhow::Result<()>;

    /// 是否关心该事件
    fn supports(&self, _event: &ContextEvent) -> bool {
        true
    }
}
