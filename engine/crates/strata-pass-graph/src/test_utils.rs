//! 单元测试共用的替身实现

use crate::allocator::ResourceAllocator;
use crate::inspector::Inspector;

pub(crate) use strata_crate_tools::init_log::init_test_log;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AllocatorEvent {
    Acquire(usize),
    Release(usize),
}

/// 以 `usize` 为长度创建 `Vec<u32>`，并记录每一次 acquire / release
#[derive(Default)]
pub(crate) struct RecordingAllocator {
    pub events: Vec<AllocatorEvent>,
    /// 对该长度的 acquire 返回错误
    pub fail_on: Option<usize>,
}

impl ResourceAllocator for RecordingAllocator {
    type Descriptor = usize;
    type Resource = Vec<u32>;

    fn acquire(&mut self, descriptor: &usize) -> anyhow::Result<Vec<u32>> {
        if self.fail_on == Some(*descriptor) {
            anyhow::bail!("out of memory for {} elements", descriptor);
        }
        self.events.push(AllocatorEvent::Acquire(*descriptor));
        Ok(vec![0; *descriptor])
    }

    fn release(&mut self, descriptor: &usize, _resource: Vec<u32>) -> anyhow::Result<()> {
        self.events.push(AllocatorEvent::Release(*descriptor));
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingInspector {
    pub events: Vec<String>,
}

impl Inspector for RecordingInspector {
    fn before_acquire(&mut self, resource: &str) {
        self.events.push(format!("before_acquire {resource}"));
    }
    fn after_acquire(&mut self, resource: &str) {
        self.events.push(format!("after_acquire {resource}"));
    }
    fn before_pass(&mut self, pass: &str) {
        self.events.push(format!("before_pass {pass}"));
    }
    fn after_pass(&mut self, pass: &str) {
        self.events.push(format!("after_pass {pass}"));
    }
    fn before_release(&mut self, resource: &str) {
        self.events.push(format!("before_release {resource}"));
    }
    fn after_release(&mut self, resource: &str) {
        self.events.push(format!("after_release {resource}"));
    }
}
