//! 资源记录
//!
//! 资源只有两种：由 graph 管理生命周期的 Internal 资源，以及调用方持有的 External 资源。

use std::collections::BTreeSet;

use crate::allocator::ResourceAllocator;
use crate::handle::{Handle, PassId, ResourceId};

/// Internal 资源的物理绑定状态
pub enum Binding<T> {
    /// 尚未 acquire
    Unbound,
    Bound(T),
    Released,
}

/// 资源种类
pub enum ResourceKind<'a, A: ResourceAllocator> {
    /// graph 管理的临时资源
    Internal {
        descriptor: A::Descriptor,
        /// 创建该资源的 Pass，`None` 表示在构建开始时创建
        creator: Option<PassId>,
        binding: Binding<A::Resource>,
    },
    /// 调用方持有的资源，graph 从不 acquire / release
    External { value: &'a mut A::Resource },
}

/// 某个版本的记录
#[derive(Debug, Default, Clone)]
pub struct VersionRecord {
    /// 写出该版本的 Pass
    pub creator: Option<PassId>,
    /// 声明读取该版本的 Pass
    pub readers: BTreeSet<PassId>,
    /// 取代该版本的新句柄，仅用于诊断
    pub superseded_by: Option<Handle>,
}

/// graph 中的一个资源
pub struct Resource<'a, A: ResourceAllocator> {
    pub(crate) id: ResourceId,
    pub(crate) name: String,
    pub(crate) kind: ResourceKind<'a, A>,
    /// 按版本号排列
    pub(crate) versions: Vec<VersionRecord>,
    /// 执行阶段已经写出（创建者执行完毕）的最新版本
    pub(crate) settled_version: u32,
}

impl<'a, A: ResourceAllocator> Resource<'a, A> {
    pub(crate) fn internal(
        id: ResourceId,
        name: impl Into<String>,
        descriptor: A::Descriptor,
        creator: Option<PassId>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind: ResourceKind::Internal {
                descriptor,
                creator,
                binding: Binding::Unbound,
            },
            versions: vec![VersionRecord {
                creator,
                ..Default::default()
            }],
            settled_version: 0,
        }
    }

    pub(crate) fn external(id: ResourceId, name: impl Into<String>, value: &'a mut A::Resource) -> Self {
        Self {
            id,
            name: name.into(),
            kind: ResourceKind::External { value },
            versions: vec![VersionRecord::default()],
            settled_version: 0,
        }
    }

    #[inline]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> &ResourceKind<'a, A> {
        &self.kind
    }

    #[inline]
    pub fn is_internal(&self) -> bool {
        matches!(self.kind, ResourceKind::Internal { .. })
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        matches!(self.kind, ResourceKind::External { .. })
    }

    /// 当前是否持有物理实例
    pub fn is_acquired(&self) -> bool {
        match &self.kind {
            ResourceKind::Internal { binding, .. } => matches!(binding, Binding::Bound(_)),
            ResourceKind::External { .. } => true,
        }
    }

    /// 最新版本的句柄
    #[inline]
    pub fn latest(&self) -> Handle {
        Handle {
            resource: self.id,
            version: (self.versions.len() - 1) as u32,
        }
    }

    #[inline]
    pub fn versions(&self) -> &[VersionRecord] {
        &self.versions
    }

    /// 物理值；Internal 资源未绑定时返回 `None`
    pub(crate) fn value(&self) -> Option<&A::Resource> {
        match &self.kind {
            ResourceKind::Internal { binding, .. } => match binding {
                Binding::Bound(value) => Some(value),
                _ => None,
            },
            ResourceKind::External { value } => Some(&**value),
        }
    }
}
