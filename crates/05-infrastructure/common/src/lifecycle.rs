//! 生命周期管理

use std::cmp::Ordering;

/// 上下文生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContextState {
    /// 尚未刷新
    #[default]
    Uninitialized,
    /// 正在刷新，只有刷新线程可以获取 bean
    Refreshing,
    /// 刷新完成，运行中
    Active,
    /// 已停止，可再次启动
    Stopped,
    /// 已关闭
    Closed,
    /// 刷新失败
    Failed,
}

impl ContextState {
    /// 是否可以获取 bean
    pub fn is_usable(self) -> bool {
        matches!(self, Self::Active | Self::Stopped)
    }
}

/// 单个 bean 的创建状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CreationState {
    /// 未创建
    #[default]
    NotCreated,
    /// 创建中
    InCreation,
    /// 已创建
    Created,
    /// 创建失败
    Failed,
}

/// 最高优先级
pub const HIGHEST_PRECEDENCE: i32 = i32::MIN;

/// 最低优先级
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

/// 排序类别
///
/// `PriorityOrdered` 总是排在 `Ordered` 之前，`Unordered` 排在最后；
/// 同一类别内按数值升序排列。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderKind {
    /// 最高优先级类别
    PriorityOrdered(i32),
    /// 有序类别
    Ordered(i32),
    /// 无序
    #[default]
    Unordered,
}

impl OrderKind {
    /// 排序数值
    pub fn value(self) -> i32 {
        match self {
            Self::PriorityOrdered(order) | Self::Ordered(order) => order,
            Self::Unordered => LOWEST_PRECEDENCE,
        }
    }

    fn rank(self) -> u8 {
        match self {
            Self::PriorityOrdered(_) => 0,
            Self::Ordered(_) => 1,
            Self::Unordered => 2,
        }
    }
}

impl PartialOrd for OrderKind {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderKind {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| self.value().cmp(&other.value()))
    }
}

/// 可启停的 bean
///
/// 单例 bean 通过能力表暴露 `dyn Lifecycle` 后，会随上下文的 `start`/`stop` 被启动和停止。
pub trait Lifecycle: Send + Sync {
    /// 启动
    fn start(&self) -> anyhow::Result<()>;

    /// 停止
    fn stop(&self) -> anyhow::Result<()>;

    /// 是否运行中
    fn is_running(&self) -> bool;

    /// 启动阶段，数值小的先启动、后停止
    fn phase(&self) -> i32 {
        0
    }
}
