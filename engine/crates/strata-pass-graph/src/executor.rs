//! FrameGraph 构建入口与执行器
//!
//! 提供 `FrameGraph` 用于声明 Pass 与资源，
//! `ExecutionPlan` 保存剔除、排序、生命周期分配的结果。

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::allocator::ResourceAllocator;
use crate::error::{GraphError, GraphResult};
use crate::graph::DependencyResolver;
use crate::handle::{Handle, PassId, ResourceId};
use crate::inspector::{Inspector, NoopInspector};
use crate::lifetime::{LifetimeAssigner, PassStep, ResourceLifetime, ResourceSchedule};
use crate::pass::{GraphPass, PassBuilder, PassContext, PassNode};
use crate::resource_registry::ResourceRegistry;
use crate::settings::FrameGraphSettings;

/// 一次构建-执行周期的 Pass 图
///
/// # 使用流程
///
/// 1. 创建: `FrameGraph::new()`
/// 2. 导入外部资源: `graph.import_external(...)`
/// 3. 添加 Pass: `graph.add_pass("name")` 或 `graph.add_pass_with("name", pass)`
/// 4. 执行: `graph.execute(&mut allocator)`，graph 随之被消耗
///
/// # 生命周期
///
/// `'a` 是 External 资源以及 Pass 执行体借用的外部数据的生命周期。
pub struct FrameGraph<'a, A: ResourceAllocator> {
    registry: ResourceRegistry<'a, A>,
    /// 按添加顺序，`PassId` 即下标
    passes: Vec<PassNode<'a, A>>,
    settings: FrameGraphSettings,
}

impl<A: ResourceAllocator> Default for FrameGraph<'_, A> {
    fn default() -> Self {
        Self::new()
    }
}

// new & init
impl<A: ResourceAllocator> FrameGraph<'_, A> {
    pub fn new() -> Self {
        Self::with_settings(FrameGraphSettings::default())
    }

    pub fn with_settings(settings: FrameGraphSettings) -> Self {
        Self {
            registry: ResourceRegistry::new(),
            passes: Vec::new(),
            settings,
        }
    }
}

// build
impl<'a, A: ResourceAllocator> FrameGraph<'a, A> {
    /// 导入调用方持有的资源
    ///
    /// 写入 External 资源的 Pass 不会被剔除。
    pub fn import_external(&mut self, name: impl Into<String>, value: &'a mut A::Resource) -> Handle {
        self.registry.import_external(name, value)
    }

    /// 创建没有创建者的 Internal 资源
    pub fn create_internal(&mut self, name: impl Into<String>, descriptor: A::Descriptor) -> Handle {
        self.registry.create_internal(name, descriptor, None)
    }

    /// 添加 Pass，返回用于声明依赖的构建器
    pub fn add_pass(&mut self, name: impl Into<String>) -> PassBuilder<'_, 'a, A> {
        let id = PassId(self.passes.len() as u32);
        self.passes.push(PassNode::new(id, name));
        PassBuilder {
            id,
            registry: &mut self.registry,
            passes: &mut self.passes,
        }
    }

    /// 添加结构体形式的 Pass
    ///
    /// 先调用 `setup` 声明依赖，再把 `execute` 作为执行体。
    pub fn add_pass_with<P: GraphPass<A> + 'a>(&mut self, name: impl Into<String>, mut pass: P) -> GraphResult<PassId> {
        let mut builder = self.add_pass(name);
        pass.setup(&mut builder)?;
        builder.executes(move |ctx| pass.execute(ctx));
        Ok(builder.id())
    }

    /// 重新打开已经添加的 Pass
    pub fn edit_pass(&mut self, id: PassId) -> GraphResult<PassBuilder<'_, 'a, A>> {
        if id.index() >= self.passes.len() {
            return Err(GraphError::UnknownPass(id.0));
        }
        Ok(PassBuilder {
            id,
            registry: &mut self.registry,
            passes: &mut self.passes,
        })
    }
}

// getter
impl<'a, A: ResourceAllocator> FrameGraph<'a, A> {
    #[inline]
    pub fn registry(&self) -> &ResourceRegistry<'a, A> {
        &self.registry
    }

    #[inline]
    pub fn passes(&self) -> &[PassNode<'a, A>] {
        &self.passes
    }

    #[inline]
    pub fn pass(&self, id: PassId) -> Option<&PassNode<'a, A>> {
        self.passes.get(id.index())
    }

    #[inline]
    pub fn settings(&self) -> &FrameGraphSettings {
        &self.settings
    }
}

// compile & execute
impl<'a, A: ResourceAllocator> FrameGraph<'a, A> {
    /// 剔除、排序并计算资源生命周期，不执行任何 Pass
    pub fn compile(&self) -> GraphResult<ExecutionPlan> {
        let resolver = DependencyResolver::new(&self.passes, &self.registry);
        let kept = resolver.cull();
        let order = resolver.sort(&kept)?;
        let schedule = LifetimeAssigner::assign(&order, &self.passes, &self.registry);

        for &pass in &order {
            let node = &self.passes[pass.index()];
            if !node.has_body() {
                log::warn!("pass '{}' is kept but has no body", node.name);
            }
        }

        let plan = ExecutionPlan {
            culled: self.passes.iter().map(|p| p.id).filter(|p| !kept[p.index()]).collect(),
            order,
            schedule,
        };
        if self.settings.print_plan {
            plan.print_execution_plan(self);
        }
        Ok(plan)
    }

    /// 执行 graph，不观察执行过程
    pub fn execute(self, allocator: &mut A) -> GraphResult<()> {
        self.execute_with_inspector(allocator, &mut NoopInspector)
    }

    /// 执行 graph
    ///
    /// 任何错误都会立即中止剩余的执行；已经 acquire 的资源不会再交还给 allocator。
    pub fn execute_with_inspector(self, allocator: &mut A, inspector: &mut dyn Inspector) -> GraphResult<()> {
        let plan = self.compile()?;
        let Self {
            mut registry,
            mut passes,
            settings,
        } = self;

        for step in plan.steps() {
            let pass = &mut passes[step.pass.index()];

            for &resource in &step.acquires {
                let name = registry.name(resource).to_string();
                inspector.before_acquire(&name);
                registry.acquire(resource, allocator)?;
                inspector.after_acquire(&name);
            }

            inspector.before_pass(&pass.name);
            if let Some(body) = pass.body.take() {
                let mut ctx = PassContext {
                    pass_name: &pass.name,
                    declared: &pass.required_resources,
                    registry: &mut registry,
                    strict_access: settings.strict_access,
                };
                body(&mut ctx).map_err(|source| GraphError::PassFailed {
                    pass: pass.name.clone(),
                    source,
                })?;
            }
            for &handle in &pass.produces {
                registry.settle(handle);
            }
            inspector.after_pass(&pass.name);

            for &resource in &step.releases {
                let name = registry.name(resource).to_string();
                inspector.before_release(&name);
                registry.release(resource, allocator)?;
                inspector.after_release(&name);
            }
        }

        Ok(())
    }
}

/// 编译结果
///
/// 包含执行顺序、每一步的 acquire / release，以及被剔除的 Pass。
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    order: Vec<PassId>,
    schedule: ResourceSchedule,
    culled: Vec<PassId>,
}

impl ExecutionPlan {
    /// 执行顺序
    #[inline]
    pub fn order(&self) -> &[PassId] {
        &self.order
    }

    #[inline]
    pub fn steps(&self) -> &[PassStep] {
        &self.schedule.steps
    }

    /// 被剔除的 Pass，按 id 升序
    #[inline]
    pub fn culled(&self) -> &[PassId] {
        &self.culled
    }

    #[inline]
    pub fn lifetimes(&self) -> &BTreeMap<ResourceId, ResourceLifetime> {
        &self.schedule.lifetimes
    }

    #[inline]
    pub fn is_alive(&self, resource: ResourceId, step: usize) -> bool {
        self.schedule.is_alive(resource, step)
    }
}

// 调试方法
impl ExecutionPlan {
    /// 打印执行计划（用于调试）
    ///
    /// 输出每个 Pass 的执行顺序、使用的资源、acquire / release 时机，以及被剔除的 Pass。
    pub fn print_execution_plan<A: ResourceAllocator>(&self, graph: &FrameGraph<'_, A>) {
        let pass_name = |id: PassId| graph.pass(id).map(|p| p.name()).unwrap_or("<unknown>");
        let registry = graph.registry();

        log::info!("╔══════════════════════════════════════════════════════════════════╗");
        log::info!("║              FrameGraph Execution Plan                           ║");
        log::info!("╠══════════════════════════════════════════════════════════════════╣");
        log::info!(
            "║ Total Passes: {}  |  Culled: {}  |  Execution Order: [{}]",
            graph.passes().len(),
            self.culled.len(),
            self.order.iter().map(|&p| pass_name(p)).join(" → ")
        );
        log::info!("╚══════════════════════════════════════════════════════════════════╝");

        for (order, step) in self.steps().iter().enumerate() {
            log::info!("");
            log::info!("┌─────────────────────────────────────────────────────────────────┐");
            log::info!("│ [{}/{}] Pass: \"{}\"", order + 1, self.order.len(), pass_name(step.pass));
            log::info!("├─────────────────────────────────────────────────────────────────┤");

            if let Some(pass) = graph.pass(step.pass) {
                log::info!("│ Resources:");
                for &resource in pass.required_resources() {
                    let kind = if registry.is_internal(resource) { "internal" } else { "external" };
                    log::info!("│   \"{}\" ({})", registry.name(resource), kind);
                }
            }

            if !step.acquires.is_empty() {
                log::info!("│ Acquire: {}", step.acquires.iter().map(|&r| format!("\"{}\"", registry.name(r))).join(", "));
            }
            if !step.releases.is_empty() {
                log::info!("│ Release: {}", step.releases.iter().map(|&r| format!("\"{}\"", registry.name(r))).join(", "));
            }

            log::info!("└─────────────────────────────────────────────────────────────────┘");
        }

        if !self.culled.is_empty() {
            log::info!("");
            log::info!("Culled passes: [{}]", self.culled.iter().map(|&p| pass_name(p)).join(", "));
        }

        log::info!("");
        log::info!("═══════════════════════ End of Execution Plan ═══════════════════════");
    }
}
