//! Strata Pass Graph - 单帧的声明式 Pass 调度
//!
//! 调用方声明一组读写共享资源的 Pass，graph 负责：
//!
//! - 剔除不影响任何输出的 Pass
//! - 在保留的 Pass 上求出确定的执行顺序，并检测循环依赖
//! - 为临时资源计算 acquire / release 的时机，使其只在首次使用到最后一次使用之间存活
//!
//! # 核心概念
//!
//! - **Handle**: 资源某个版本的引用，每次写入产生新版本，旧句柄失效
//! - **Internal / External 资源**: 前者由 graph 通过 `ResourceAllocator` 管理，后者由调用方持有
//! - **PassBuilder**: 声明 Pass 的读写与显式依赖
//! - **FrameGraph**: 构建入口，`execute` 后被消耗
//! - **Inspector**: 可选的执行过程观察者
//!
//! # 使用示例
//!
//! ```ignore
//! use strata_pass_graph::*;
//!
//! let mut backbuffer = swapchain.current_image();
//! let mut graph = FrameGraph::<TexturePool>::new();
//! let output = graph.import_external("backbuffer", &mut backbuffer);
//!
//! // 1. gbuffer pass 创建临时资源
//! let mut gbuffer = graph.add_pass("gbuffer");
//! let albedo = gbuffer.creates_internal("albedo", TextureDesc::new_2d(1920, 1080));
//! gbuffer.executes(move |ctx| {
//!     let albedo = ctx.get_mut(albedo)?;
//!     // 录制命令...
//!     Ok(())
//! });
//!
//! // 2. lighting pass 读取 albedo 并写入 backbuffer，写 External 资源的 Pass 不会被剔除
//! let mut lighting = graph.add_pass("lighting");
//! lighting.reads(albedo)?;
//! let output = lighting.reads_and_writes(output)?;
//! lighting.executes(move |ctx| {
//!     let albedo = ctx.get(albedo)?;
//!     let output = ctx.get_mut(output)?;
//!     Ok(())
//! });
//!
//! // 3. 执行：剔除 -> 排序 -> 生命周期分配 -> 逐个执行
//! graph.execute(&mut texture_pool)?;
//! ```
//!
//! # 模块结构
//!
//! - `handle`: Pass / 资源 id 与版本化句柄
//! - `resource` / `resource_registry`: 资源记录与注册表
//! - `allocator`: 物理资源分配器接口
//! - `pass`: Pass 节点、构建器、执行上下文
//! - `graph`: 剔除与拓扑排序
//! - `lifetime`: 资源生命周期分配
//! - `inspector`: 执行观察钩子
//! - `executor`: `FrameGraph` 与执行计划

mod allocator;
mod error;
mod executor;
mod graph;
mod handle;
mod inspector;
mod lifetime;
mod pass;
mod resource;
mod resource_registry;
mod settings;

#[cfg(test)]
mod test_utils;

pub use allocator::ResourceAllocator;
pub use error::{GraphError, GraphResult};
pub use executor::{ExecutionPlan, FrameGraph};
pub use graph::DependencyResolver;
pub use handle::{Handle, PassId, ResourceId};
pub use inspector::{Inspector, LogInspector, NoopInspector};
pub use lifetime::{LifetimeAssigner, PassStep, ResourceLifetime, ResourceSchedule};
pub use pass::{GraphPass, PassBody, PassBuilder, PassContext, PassNode};
pub use resource::{Binding, Resource, ResourceKind, VersionRecord};
pub use resource_registry::ResourceRegistry;
pub use settings::FrameGraphSettings;
