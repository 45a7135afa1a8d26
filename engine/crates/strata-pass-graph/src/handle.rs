//! Pass / 资源标识与版本化句柄
//!
//! 所有 id 都是创建顺序下的下标，graph 内部用它们直接索引 `Vec`。
//! `Handle` 只记录 `(资源, 版本)`，版本的创建者、读取者等信息保存在
//! `ResourceRegistry` 中。

use std::fmt;

/// Pass 标识，值等于 Pass 的创建顺序
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PassId(pub(crate) u32);

impl PassId {
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pass({})", self.0)
    }
}

/// 资源标识，值等于资源的创建顺序
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(pub(crate) u32);

impl ResourceId {
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Res({})", self.0)
    }
}

/// 资源在某个时间点的值的引用
///
/// 每次写入（`reads_and_writes`）都会产生一个版本号 +1 的新句柄，
/// 旧句柄随之失效，之后不能再用来声明读写。
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle {
    pub(crate) resource: ResourceId,
    pub(crate) version: u32,
}

impl Handle {
    #[inline]
    pub(crate) fn new(resource: ResourceId) -> Self {
        Self { resource, version: 0 }
    }

    /// 所属资源
    #[inline]
    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    /// 版本号，每次写操作后递增
    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// 写操作后的下一个版本
    #[inline]
    pub(crate) fn next_version(&self) -> Self {
        Self {
            resource: self.resource,
            version: self.version + 1,
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}.v{})", self.resource.0, self.version)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.v{}", self.resource.0, self.version)
    }
}
