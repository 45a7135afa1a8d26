//! Pass 定义和构建器
//!
//! 提供 `PassBuilder` 用于在构建阶段声明 Pass 的资源读写与依赖，
//! `PassContext` 用于在执行阶段访问声明过的物理资源，
//! 以及 `GraphPass` trait 用于以结构体形式定义 Pass。

use std::collections::BTreeSet;

use crate::allocator::ResourceAllocator;
use crate::error::{GraphError, GraphResult};
use crate::handle::{Handle, PassId, ResourceId};
use crate::resource_registry::ResourceRegistry;

/// Pass 的延迟执行体
pub type PassBody<'a, A> = Box<dyn FnOnce(&mut PassContext<'_, 'a, A>) -> anyhow::Result<()> + 'a>;

/// Pass 节点数据
pub struct PassNode<'a, A: ResourceAllocator> {
    pub(crate) id: PassId,
    pub(crate) name: String,

    /// 该 Pass 使用的所有资源（创建、读取、读写）
    pub(crate) required_resources: BTreeSet<ResourceId>,
    /// 显式依赖 + 由读取推导出的创建者依赖
    pub(crate) required_passes: BTreeSet<PassId>,
    /// 被该 Pass 写入而失效的旧版本
    pub(crate) overwrites: Vec<Handle>,
    /// 该 Pass 写出的版本
    pub(crate) produces: Vec<Handle>,

    pub(crate) never_cull: bool,
    pub(crate) body: Option<PassBody<'a, A>>,
}

impl<'a, A: ResourceAllocator> PassNode<'a, A> {
    pub(crate) fn new(id: PassId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            required_resources: BTreeSet::new(),
            required_passes: BTreeSet::new(),
            overwrites: Vec::new(),
            produces: Vec::new(),
            never_cull: false,
            body: None,
        }
    }

    #[inline]
    pub fn id(&self) -> PassId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn required_resources(&self) -> &BTreeSet<ResourceId> {
        &self.required_resources
    }

    #[inline]
    pub fn required_passes(&self) -> &BTreeSet<PassId> {
        &self.required_passes
    }

    #[inline]
    pub fn overwrites(&self) -> &[Handle] {
        &self.overwrites
    }

    #[inline]
    pub fn produces(&self) -> &[Handle] {
        &self.produces
    }

    #[inline]
    pub fn is_culling_disabled(&self) -> bool {
        self.never_cull
    }

    #[inline]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

/// Pass 构建器
///
/// 由 `FrameGraph::add_pass` / `FrameGraph::edit_pass` 返回，声明 Pass 的资源依赖。
/// 所有声明操作都会立即校验句柄，使用过期句柄会直接返回 `StaleHandleUse`。
pub struct PassBuilder<'g, 'a, A: ResourceAllocator> {
    pub(crate) id: PassId,
    pub(crate) registry: &'g mut ResourceRegistry<'a, A>,
    pub(crate) passes: &'g mut Vec<PassNode<'a, A>>,
}

impl<'a, A: ResourceAllocator> PassBuilder<'_, 'a, A> {
    #[inline]
    pub fn id(&self) -> PassId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.passes[self.id.index()].name
    }

    #[inline]
    fn node(&mut self) -> &mut PassNode<'a, A> {
        &mut self.passes[self.id.index()]
    }

    /// 创建由该 Pass 产出的 Internal 资源
    pub fn creates_internal(&mut self, name: impl Into<String>, descriptor: A::Descriptor) -> Handle {
        let handle = self.registry.create_internal(name, descriptor, Some(self.id));
        let node = self.node();
        node.required_resources.insert(handle.resource);
        node.produces.push(handle);
        handle
    }

    /// 声明读取 `handle` 对应的版本
    ///
    /// 若该版本由其他 Pass 写出，则自动依赖那个 Pass。
    ///
    /// # 返回
    /// 返回相同的句柄
    pub fn reads(&mut self, handle: Handle) -> GraphResult<Handle> {
        let id = self.id;
        let creator = self.registry.add_reader(handle, id)?;
        let node = self.node();
        node.required_resources.insert(handle.resource);
        if let Some(creator) = creator
            && creator != id
        {
            node.required_passes.insert(creator);
        }
        Ok(handle)
    }

    /// 声明读写：先读取 `handle`，再写出同一资源的新版本
    ///
    /// 旧句柄失效，之后的读写必须使用返回的新句柄。
    pub fn reads_and_writes(&mut self, handle: Handle) -> GraphResult<Handle> {
        self.reads(handle)?;
        let new_handle = self.registry.write(handle, self.id)?;
        let node = self.node();
        node.overwrites.push(handle);
        node.produces.push(new_handle);
        Ok(new_handle)
    }

    /// 显式依赖另一个 Pass，不涉及任何数据
    pub fn requires(&mut self, other: PassId) -> GraphResult<&mut Self> {
        if other.index() >= self.passes.len() {
            return Err(GraphError::UnknownPass(other.0));
        }
        if other == self.id {
            return Err(GraphError::SelfDependency(self.name().to_string()));
        }
        self.node().required_passes.insert(other);
        Ok(self)
    }

    /// 该 Pass 不参与剔除，常用于写向 graph 之外的终端 Pass
    pub fn disable_culling(&mut self) -> &mut Self {
        self.node().never_cull = true;
        self
    }

    /// 设置执行体，重复调用时以最后一次为准
    pub fn executes<F>(&mut self, body: F) -> &mut Self
    where
        F: FnOnce(&mut PassContext<'_, 'a, A>) -> anyhow::Result<()> + 'a,
    {
        self.node().body = Some(Box::new(body));
        self
    }
}

/// Pass 执行时的上下文
///
/// 只暴露当前 Pass 声明过的资源。
pub struct PassContext<'r, 'a, A: ResourceAllocator> {
    pub(crate) pass_name: &'r str,
    pub(crate) declared: &'r BTreeSet<ResourceId>,
    pub(crate) registry: &'r mut ResourceRegistry<'a, A>,
    pub(crate) strict_access: bool,
}

impl<A: ResourceAllocator> PassContext<'_, '_, A> {
    #[inline]
    pub fn pass_name(&self) -> &str {
        self.pass_name
    }

    /// 获取资源的物理值
    pub fn get(&self, handle: Handle) -> GraphResult<&A::Resource> {
        self.check_declared(handle)?;
        self.registry.current_value(handle)
    }

    /// 获取资源的可变物理值
    pub fn get_mut(&mut self, handle: Handle) -> GraphResult<&mut A::Resource> {
        self.check_declared(handle)?;
        self.registry.current_value_mut(handle)
    }

    fn check_declared(&self, handle: Handle) -> GraphResult<()> {
        if self.strict_access && !self.declared.contains(&handle.resource) {
            return Err(GraphError::UndeclaredAccess {
                pass: self.pass_name.to_string(),
                resource: self.registry.name(handle.resource).to_string(),
            });
        }
        Ok(())
    }
}

/// 以结构体形式定义的 Pass
///
/// # 示例
///
/// ```ignore
/// struct BlurPass {
///     input: Handle,
///     output: Option<Handle>,
/// }
///
/// impl GraphPass<TexturePool> for BlurPass {
///     fn setup(&mut self, builder: &mut PassBuilder<'_, '_, TexturePool>) -> GraphResult<()> {
///         builder.reads(self.input)?;
///         self.output = Some(builder.creates_internal("blurred", TextureDesc::new_2d(1920, 1080)));
///         Ok(())
///     }
///
///     fn execute(&mut self, ctx: &mut PassContext<'_, '_, TexturePool>) -> anyhow::Result<()> {
///         let input = ctx.get(self.input)?;
///         // 录制命令...
///         Ok(())
///     }
/// }
/// ```
pub trait GraphPass<A: ResourceAllocator> {
    /// 声明 Pass 的资源依赖
    fn setup(&mut self, builder: &mut PassBuilder<'_, '_, A>) -> GraphResult<()>;

    /// 执行 Pass 的逻辑
    fn execute(&mut self, ctx: &mut PassContext<'_, '_, A>) -> anyhow::Result<()>;
}
