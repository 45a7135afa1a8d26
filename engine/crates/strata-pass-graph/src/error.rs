//! 错误类型
//!
//! 这些错误都代表集成/使用错误：一旦出现，当前的构建或执行立即中止，不做重试。

use crate::handle::Handle;

pub type GraphResult<T> = Result<T, GraphError>;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// 拓扑排序时重新进入了仍处于 visiting 状态的 Pass
    ///
    /// `visiting` 为检测时所有标记为 visiting 的 Pass，`cycle` 为还原出的环路径。
    #[error("cycle detected, visiting passes: [{}], cycle: [{}]", .visiting.join(", "), .cycle.join(" -> "))]
    CycleDetected { visiting: Vec<String>, cycle: Vec<String> },

    /// 使用了已被新版本取代的句柄
    #[error("stale handle {handle} used for resource '{resource}', superseded by {superseded_by}")]
    StaleHandleUse {
        resource: String,
        handle: Handle,
        superseded_by: Handle,
    },

    /// Internal 资源当前没有绑定物理实例（尚未 acquire 或已 release）
    #[error("resource '{resource}' is not available (not acquired)")]
    ResourceNotAvailable { resource: String },

    #[error("resource '{resource}' acquired twice")]
    DoubleAcquire { resource: String },

    #[error("resource '{resource}' released twice or never acquired")]
    DoubleRelease { resource: String },

    /// 句柄的资源或版本超出注册表范围
    ///
    /// 只检查下标，来自其他 graph 且下标恰好在范围内的句柄无法识别。
    #[error("handle {0} is out of range for this graph")]
    UnknownHandle(Handle),

    #[error("pass id {0} does not belong to this graph")]
    UnknownPass(u32),

    #[error("pass '{0}' cannot require itself")]
    SelfDependency(String),

    /// Pass 在执行时访问了未声明的资源
    #[error("pass '{pass}' accessed resource '{resource}' without declaring it")]
    UndeclaredAccess { pass: String, resource: String },

    #[error("allocator failed for resource '{resource}'")]
    AllocatorFailure {
        resource: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("pass '{pass}' failed")]
    PassFailed {
        pass: String,
        #[source]
        source: anyhow::Error,
    },
}
