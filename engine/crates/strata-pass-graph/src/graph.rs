//! 依赖解析：剔除与拓扑排序
//!
//! 1. 剔除：从"写入 External 资源的 Pass"和"禁用剔除的 Pass"出发，
//!    沿显式依赖与创建者依赖做可达性遍历，不可达的 Pass 被丢弃。
//! 2. 排序：在保留集合上做深度优先的后序拓扑排序（显式栈实现），
//!    依赖集合总是按 id 升序遍历，保证结果确定。

use std::collections::VecDeque;

use itertools::Itertools;

use crate::allocator::ResourceAllocator;
use crate::error::{GraphError, GraphResult};
use crate::handle::PassId;
use crate::pass::PassNode;
use crate::resource_registry::ResourceRegistry;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// 显式栈中的一帧
struct Frame {
    pass: PassId,
    deps: Vec<PassId>,
    cursor: usize,
}

impl Frame {
    fn next_dep(&mut self) -> Option<PassId> {
        let dep = self.deps.get(self.cursor).copied();
        self.cursor += 1;
        dep
    }
}

/// 依赖解析器
pub struct DependencyResolver<'g, 'a, A: ResourceAllocator> {
    passes: &'g [PassNode<'a, A>],
    registry: &'g ResourceRegistry<'a, A>,
}

impl<'g, 'a, A: ResourceAllocator> DependencyResolver<'g, 'a, A> {
    pub fn new(passes: &'g [PassNode<'a, A>], registry: &'g ResourceRegistry<'a, A>) -> Self {
        Self { passes, registry }
    }

    /// 剔除阶段的根：写过 External 资源的 Pass，以及禁用剔除的 Pass
    fn roots(&self) -> Vec<PassId> {
        let external_writers = self
            .registry
            .iter()
            .filter(|r| r.is_external())
            .flat_map(|r| r.versions().iter().filter_map(|v| v.creator));
        let never_cull = self.passes.iter().filter(|p| p.never_cull).map(|p| p.id);

        external_writers.chain(never_cull).sorted().dedup().collect_vec()
    }

    /// 计算保留集合，返回值按 Pass id 索引
    pub fn cull(&self) -> Vec<bool> {
        let mut kept = vec![false; self.passes.len()];
        let mut queue = VecDeque::new();

        for root in self.roots() {
            if !kept[root.index()] {
                kept[root.index()] = true;
                queue.push_back(root);
            }
        }

        while let Some(pass) = queue.pop_front() {
            for &dep in &self.passes[pass.index()].required_passes {
                if !kept[dep.index()] {
                    kept[dep.index()] = true;
                    queue.push_back(dep);
                }
            }
        }

        log::debug!(
            "culling kept {}/{} passes, dropped: [{}]",
            kept.iter().filter(|k| **k).count(),
            self.passes.len(),
            self.passes.iter().filter(|p| !kept[p.id.index()]).map(|p| p.name.as_str()).join(", ")
        );
        kept
    }

    /// 排序时需要先于 `pass` 的 Pass
    ///
    /// 先是显式/推导依赖（按 id 升序），然后按覆盖的先后，
    /// 依次是每个被覆盖版本的其他读取者（版本内按 id 升序）。只保留 `kept` 中的 Pass。
    fn ordering_deps(&self, pass: PassId, kept: &[bool]) -> Vec<PassId> {
        let node = &self.passes[pass.index()];
        let required = node.required_passes.iter().copied().filter(|p| kept[p.index()]);
        // 按写入的先后逐个版本展开，版本内的读取者已按 id 升序
        let readers = node
            .overwrites
            .iter()
            .filter_map(|&handle| self.registry.version(handle))
            .flat_map(|record| record.readers.iter().copied())
            .filter(|&reader| reader != pass && kept[reader.index()]);

        required.chain(readers).unique().collect_vec()
    }

    /// 在保留集合上做拓扑排序
    pub fn sort(&self, kept: &[bool]) -> GraphResult<Vec<PassId>> {
        let mut marks = vec![Mark::Unvisited; self.passes.len()];
        let mut order = Vec::with_capacity(kept.iter().filter(|k| **k).count());
        let mut stack: Vec<Frame> = Vec::new();

        for root in self.passes.iter().map(|p| p.id).filter(|p| kept[p.index()]) {
            if marks[root.index()] != Mark::Unvisited {
                continue;
            }
            marks[root.index()] = Mark::Visiting;
            stack.push(Frame {
                pass: root,
                deps: self.ordering_deps(root, kept),
                cursor: 0,
            });

            while let Some(frame) = stack.last_mut() {
                let pass = frame.pass;
                match frame.next_dep() {
                    Some(dep) => match marks[dep.index()] {
                        Mark::Unvisited => {
                            marks[dep.index()] = Mark::Visiting;
                            stack.push(Frame {
                                pass: dep,
                                deps: self.ordering_deps(dep, kept),
                                cursor: 0,
                            });
                        }
                        Mark::Visiting => return Err(self.cycle_error(&marks, &stack, dep)),
                        Mark::Done => {}
                    },
                    None => {
                        stack.pop();
                        marks[pass.index()] = Mark::Done;
                        order.push(pass);
                    }
                }
            }
        }

        log::debug!("pass order: [{}]", order.iter().map(|p| self.passes[p.index()].name.as_str()).join(" -> "));
        Ok(order)
    }

    fn cycle_error(&self, marks: &[Mark], stack: &[Frame], revisited: PassId) -> GraphError {
        let name = |p: PassId| self.passes[p.index()].name.clone();

        let visiting = marks
            .iter()
            .enumerate()
            .filter(|(_, m)| **m == Mark::Visiting)
            .map(|(i, _)| self.passes[i].name.clone())
            .collect_vec();
        let start = stack.iter().position(|f| f.pass == revisited).unwrap_or(0);
        let cycle = stack[start..].iter().map(|f| name(f.pass)).chain(std::iter::once(name(revisited))).collect_vec();

        log::error!("cycle detected: {}", cycle.join(" -> "));
        GraphError::CycleDetected { visiting, cycle }
    }
}
