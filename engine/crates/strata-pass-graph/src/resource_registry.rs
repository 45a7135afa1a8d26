use std::mem;

use crate::allocator::ResourceAllocator;
use crate::error::{GraphError, GraphResult};
use crate::handle::{Handle, PassId, ResourceId};
use crate::resource::{Binding, Resource, ResourceKind, VersionRecord};

/// 资源注册表
///
/// 持有一次构建中的全部资源记录（Internal 与 External），发放版本化句柄，
/// 并在执行阶段维护 Internal 资源的物理绑定。资源按创建顺序存放，
/// `ResourceId` 即下标。
pub struct ResourceRegistry<'a, A: ResourceAllocator> {
    resources: Vec<Resource<'a, A>>,
}

impl<A: ResourceAllocator> Default for ResourceRegistry<'_, A> {
    fn default() -> Self {
        Self { resources: Vec::new() }
    }
}

// new & init
impl<A: ResourceAllocator> ResourceRegistry<'_, A> {
    pub fn new() -> Self {
        Self::default()
    }
}

// register
impl<'a, A: ResourceAllocator> ResourceRegistry<'a, A> {
    /// 注册 Internal 资源，返回版本 0 的句柄
    ///
    /// `creator` 为 `None` 时资源没有创建者依赖。
    pub fn create_internal(
        &mut self,
        name: impl Into<String>,
        descriptor: A::Descriptor,
        creator: Option<PassId>,
    ) -> Handle {
        let id = self.next_id();
        self.resources.push(Resource::internal(id, name, descriptor, creator));
        Handle::new(id)
    }

    /// 导入调用方持有的资源，返回版本 0 的句柄
    pub fn import_external(&mut self, name: impl Into<String>, value: &'a mut A::Resource) -> Handle {
        let id = self.next_id();
        self.resources.push(Resource::external(id, name, value));
        Handle::new(id)
    }

    fn next_id(&self) -> ResourceId {
        ResourceId(self.resources.len() as u32)
    }
}

// versions
impl<A: ResourceAllocator> ResourceRegistry<'_, A> {
    /// 检查句柄属于本注册表且尚未被取代
    pub fn validate(&self, handle: Handle) -> GraphResult<&VersionRecord> {
        let resource = self.resource_of(handle)?;
        let record = &resource.versions[handle.version as usize];
        match record.superseded_by {
            Some(superseded_by) => Err(GraphError::StaleHandleUse {
                resource: resource.name.clone(),
                handle,
                superseded_by,
            }),
            None => Ok(record),
        }
    }

    /// 登记 `pass` 读取 `handle` 对应的版本，返回该版本的创建者
    pub(crate) fn add_reader(&mut self, handle: Handle, pass: PassId) -> GraphResult<Option<PassId>> {
        self.validate(handle)?;
        let record = &mut self.resources[handle.resource.index()].versions[handle.version as usize];
        record.readers.insert(pass);
        Ok(record.creator)
    }

    /// 由 `pass` 写出 `handle` 的下一个版本，旧句柄随即失效
    pub(crate) fn write(&mut self, handle: Handle, pass: PassId) -> GraphResult<Handle> {
        self.validate(handle)?;
        let next = handle.next_version();
        let resource = &mut self.resources[handle.resource.index()];
        resource.versions[handle.version as usize].superseded_by = Some(next);
        resource.versions.push(VersionRecord {
            creator: Some(pass),
            ..Default::default()
        });
        Ok(next)
    }

    /// 执行阶段：`handle` 的创建者已经执行完毕，更早的版本从此过期
    pub(crate) fn settle(&mut self, handle: Handle) {
        if let Some(resource) = self.resources.get_mut(handle.resource.index()) {
            resource.settled_version = resource.settled_version.max(handle.version);
        }
    }

    fn resource_of(&self, handle: Handle) -> GraphResult<&Resource<'_, A>> {
        match self.resources.get(handle.resource.index()) {
            Some(resource) if (handle.version as usize) < resource.versions.len() => Ok(resource),
            _ => Err(GraphError::UnknownHandle(handle)),
        }
    }

    /// 执行阶段的过期检查：已有更新的版本被写出
    fn check_live(&self, handle: Handle) -> GraphResult<()> {
        let resource = self.resource_of(handle)?;
        if handle.version < resource.settled_version {
            return Err(GraphError::StaleHandleUse {
                resource: resource.name.clone(),
                handle,
                superseded_by: Handle {
                    resource: handle.resource,
                    version: resource.settled_version,
                },
            });
        }
        Ok(())
    }
}

// value access
impl<A: ResourceAllocator> ResourceRegistry<'_, A> {
    /// 获取句柄对应的物理值
    ///
    /// Internal 资源未 acquire 时返回 `ResourceNotAvailable`；
    /// 句柄已被执行过的写入取代时返回 `StaleHandleUse`。
    pub fn current_value(&self, handle: Handle) -> GraphResult<&A::Resource> {
        self.check_live(handle)?;
        let resource = &self.resources[handle.resource.index()];
        resource.value().ok_or_else(|| GraphError::ResourceNotAvailable {
            resource: resource.name.clone(),
        })
    }

    pub fn current_value_mut(&mut self, handle: Handle) -> GraphResult<&mut A::Resource> {
        self.check_live(handle)?;
        let resource = &mut self.resources[handle.resource.index()];
        let name = &resource.name;
        match &mut resource.kind {
            ResourceKind::Internal {
                binding: Binding::Bound(value),
                ..
            } => Ok(value),
            ResourceKind::External { value } => Ok(&mut **value),
            _ => Err(GraphError::ResourceNotAvailable { resource: name.clone() }),
        }
    }
}

// acquire & release
impl<A: ResourceAllocator> ResourceRegistry<'_, A> {
    /// 通过 allocator 为 Internal 资源绑定物理实例
    ///
    /// External 资源由调用方持有，这里不做任何事。
    pub fn acquire(&mut self, id: ResourceId, allocator: &mut A) -> GraphResult<()> {
        let resource = self.get_mut(id)?;
        let name = &resource.name;
        let ResourceKind::Internal { descriptor, binding, .. } = &mut resource.kind else {
            log::trace!("skip acquire of external resource '{}'", name);
            return Ok(());
        };
        if !matches!(binding, Binding::Unbound) {
            return Err(GraphError::DoubleAcquire { resource: name.clone() });
        }

        let instance = allocator.acquire(descriptor).map_err(|source| GraphError::AllocatorFailure {
            resource: name.clone(),
            source,
        })?;
        *binding = Binding::Bound(instance);
        log::trace!("acquired '{}'", name);
        Ok(())
    }

    /// 将物理实例交还给 allocator
    pub fn release(&mut self, id: ResourceId, allocator: &mut A) -> GraphResult<()> {
        let resource = self.get_mut(id)?;
        let name = &resource.name;
        let ResourceKind::Internal { descriptor, binding, .. } = &mut resource.kind else {
            log::trace!("skip release of external resource '{}'", name);
            return Ok(());
        };

        let instance = match mem::replace(binding, Binding::Released) {
            Binding::Bound(instance) => instance,
            previous => {
                *binding = previous;
                return Err(GraphError::DoubleRelease { resource: name.clone() });
            }
        };
        allocator.release(descriptor, instance).map_err(|source| GraphError::AllocatorFailure {
            resource: name.clone(),
            source,
        })?;
        log::trace!("released '{}'", name);
        Ok(())
    }
}

// getter & iter
impl<'a, A: ResourceAllocator> ResourceRegistry<'a, A> {
    #[inline]
    pub fn get(&self, id: ResourceId) -> Option<&Resource<'a, A>> {
        self.resources.get(id.index())
    }

    fn get_mut(&mut self, id: ResourceId) -> GraphResult<&mut Resource<'a, A>> {
        self.resources
            .get_mut(id.index())
            .ok_or(GraphError::UnknownHandle(Handle::new(id)))
    }

    /// 资源名称，未知 id 返回 `"<unknown>"`
    #[inline]
    pub fn name(&self, id: ResourceId) -> &str {
        self.get(id).map(|r| r.name.as_str()).unwrap_or("<unknown>")
    }

    /// 资源当前最新版本的句柄
    #[inline]
    pub fn latest(&self, id: ResourceId) -> Option<Handle> {
        self.get(id).map(|r| r.latest())
    }

    /// 句柄对应的版本记录
    #[inline]
    pub fn version(&self, handle: Handle) -> Option<&VersionRecord> {
        self.get(handle.resource).and_then(|r| r.versions.get(handle.version as usize))
    }

    #[inline]
    pub fn is_internal(&self, id: ResourceId) -> bool {
        self.get(id).is_some_and(|r| r.is_internal())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Resource<'a, A>> {
        self.resources.iter()
    }
}
