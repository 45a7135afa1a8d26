#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use strata_pass_graph::ResourceAllocator;

/// Pass 执行与资源分配共用的时间线
pub type Timeline = Rc<RefCell<Vec<String>>>;

pub fn timeline() -> Timeline {
    Rc::new(RefCell::new(Vec::new()))
}

#[derive(Debug, Clone)]
pub struct BufferDesc {
    pub label: &'static str,
    pub len: usize,
}

impl BufferDesc {
    pub fn new(label: &'static str, len: usize) -> Self {
        Self { label, len }
    }
}

/// 把每次 acquire / release 写入时间线的分配器
pub struct BufferPool {
    pub timeline: Timeline,
    pub live: usize,
    /// 对该 label 的 acquire 返回错误
    pub fail_on: Option<&'static str>,
}

impl BufferPool {
    pub fn new(timeline: &Timeline) -> Self {
        Self {
            timeline: timeline.clone(),
            live: 0,
            fail_on: None,
        }
    }
}

impl ResourceAllocator for BufferPool {
    type Descriptor = BufferDesc;
    type Resource = Vec<u32>;

    fn acquire(&mut self, desc: &BufferDesc) -> anyhow::Result<Vec<u32>> {
        if self.fail_on == Some(desc.label) {
            anyhow::bail!("no memory left for '{}'", desc.label);
        }
        self.live += 1;
        self.timeline.borrow_mut().push(format!("acquire {}", desc.label));
        Ok(vec![0; desc.len])
    }

    fn release(&mut self, desc: &BufferDesc, _buffer: Vec<u32>) -> anyhow::Result<()> {
        self.live -= 1;
        self.timeline.borrow_mut().push(format!("release {}", desc.label));
        Ok(())
    }
}

/// 执行体：把 `run <name>` 写入时间线
pub fn record(timeline: &Timeline, name: &str) -> impl FnOnce(&mut strata_pass_graph::PassContext<'_, '_, BufferPool>) -> anyhow::Result<()> + 'static {
    let timeline = timeline.clone();
    let entry = format!("run {name}");
    move |_| {
        timeline.borrow_mut().push(entry);
        Ok(())
    }
}
