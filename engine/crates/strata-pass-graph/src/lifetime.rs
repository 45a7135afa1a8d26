//! 资源生命周期分配
//!
//! 沿最终执行顺序单次前向扫描：Internal 资源在首次使用的 Pass 之前 acquire，
//! 在最后一次使用的 Pass 之后 release。External 资源不参与。

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::allocator::ResourceAllocator;
use crate::handle::{PassId, ResourceId};
use crate::pass::PassNode;
use crate::resource_registry::ResourceRegistry;

/// 资源的存活区间，以执行顺序中的步骤下标表示（闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLifetime {
    pub first_use: usize,
    pub last_use: usize,
}

/// 执行顺序中的一步
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassStep {
    pub pass: PassId,
    /// 在该 Pass 之前 acquire 的资源
    pub acquires: Vec<ResourceId>,
    /// 在该 Pass 之后 release 的资源
    pub releases: Vec<ResourceId>,
}

impl PassStep {
    fn new(pass: PassId) -> Self {
        Self {
            pass,
            acquires: Vec::new(),
            releases: Vec::new(),
        }
    }
}

/// 生命周期分配的结果
#[derive(Debug, Clone, Default)]
pub struct ResourceSchedule {
    pub steps: Vec<PassStep>,
    pub lifetimes: BTreeMap<ResourceId, ResourceLifetime>,
}

pub struct LifetimeAssigner;

impl LifetimeAssigner {
    pub fn assign<A: ResourceAllocator>(
        order: &[PassId],
        passes: &[PassNode<'_, A>],
        registry: &ResourceRegistry<'_, A>,
    ) -> ResourceSchedule {
        let mut steps = order.iter().map(|&pass| PassStep::new(pass)).collect::<Vec<_>>();
        let mut lifetimes: BTreeMap<ResourceId, ResourceLifetime> = BTreeMap::new();

        for (step, &pass) in order.iter().enumerate() {
            for &resource in &passes[pass.index()].required_resources {
                if !registry.is_internal(resource) {
                    continue;
                }
                match lifetimes.entry(resource) {
                    Entry::Vacant(entry) => {
                        entry.insert(ResourceLifetime {
                            first_use: step,
                            last_use: step,
                        });
                        steps[step].acquires.push(resource);
                    }
                    // release 推迟到更晚的使用者之后
                    Entry::Occupied(mut entry) => entry.get_mut().last_use = step,
                }
            }
        }

        for (&resource, lifetime) in &lifetimes {
            steps[lifetime.last_use].releases.push(resource);
        }

        ResourceSchedule { steps, lifetimes }
    }
}

impl ResourceSchedule {
    /// 资源在第 `step` 步是否存活
    pub fn is_alive(&self, resource: ResourceId, step: usize) -> bool {
        self.lifetimes
            .get(&resource)
            .is_some_and(|lifetime| step >= lifetime.first_use && step <= lifetime.last_use)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FrameGraph;
    use crate::graph::DependencyResolver;
    use crate::test_utils::RecordingAllocator;

    fn schedule(graph: &FrameGraph<'_, RecordingAllocator>) -> ResourceSchedule {
        let resolver = DependencyResolver::new(graph.passes(), graph.registry());
        let kept = resolver.cull();
        let order = resolver.sort(&kept).unwrap();
        LifetimeAssigner::assign(&order, graph.passes(), graph.registry())
    }

    #[test]
    fn test_acquire_first_release_last() {
        let mut graph = FrameGraph::<RecordingAllocator>::new();

        let r0 = graph.add_pass("p1").creates_internal("r", 4);
        let r1 = graph.add_pass("p2").reads_and_writes(r0).unwrap();
        let mut p3 = graph.add_pass("p3");
        p3.reads(r1).unwrap();
        p3.disable_culling();

        let schedule = schedule(&graph);
        let r = r0.resource();

        assert_eq!(schedule.steps.len(), 3);
        assert_eq!(schedule.steps[0].acquires, vec![r]);
        assert!(schedule.steps[0].releases.is_empty());
        assert!(schedule.steps[1].acquires.is_empty() && schedule.steps[1].releases.is_empty());
        assert_eq!(schedule.steps[2].releases, vec![r]);
        assert_eq!(schedule.lifetimes[&r], ResourceLifetime { first_use: 0, last_use: 2 });
        assert!(schedule.is_alive(r, 1));
        assert!(!schedule.is_alive(r, 3));
    }

    #[test]
    fn test_disjoint_lifetimes() {
        let mut graph = FrameGraph::<RecordingAllocator>::new();

        let a = graph.add_pass("make_a").creates_internal("a", 1);
        let mut use_a = graph.add_pass("use_a");
        use_a.reads(a).unwrap();
        let b = use_a.creates_internal("b", 1);
        let mut use_b = graph.add_pass("use_b");
        use_b.reads(b).unwrap();
        use_b.disable_culling();

        let schedule = schedule(&graph);
        let (a, b) = (a.resource(), b.resource());

        assert_eq!(schedule.lifetimes[&a], ResourceLifetime { first_use: 0, last_use: 1 });
        assert_eq!(schedule.lifetimes[&b], ResourceLifetime { first_use: 1, last_use: 2 });
        assert_eq!(schedule.steps[1].acquires, vec![b]);
        assert_eq!(schedule.steps[1].releases, vec![a]);
    }

    #[test]
    fn test_external_not_scheduled() {
        let mut target = vec![0u32; 4];
        let mut graph = FrameGraph::<RecordingAllocator>::new();
        let target = graph.import_external("target", &mut target);
        graph.add_pass("present").reads_and_writes(target).unwrap();

        let schedule = schedule(&graph);
        assert_eq!(schedule.steps.len(), 1);
        assert!(schedule.steps[0].acquires.is_empty());
        assert!(schedule.steps[0].releases.is_empty());
        assert!(schedule.lifetimes.is_empty());
    }
}
