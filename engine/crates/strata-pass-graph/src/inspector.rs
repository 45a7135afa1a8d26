//! 执行阶段的观察钩子
//!
//! Inspector 只接收名称，不能影响执行流程。

/// 执行过程的观察者，所有方法默认什么也不做
pub trait Inspector {
    fn before_acquire(&mut self, _resource: &str) {}
    fn after_acquire(&mut self, _resource: &str) {}

    fn before_pass(&mut self, _pass: &str) {}
    fn after_pass(&mut self, _pass: &str) {}

    fn before_release(&mut self, _resource: &str) {}
    fn after_release(&mut self, _resource: &str) {}
}

/// 默认的空实现
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInspector;

impl Inspector for NoopInspector {}

/// 将每个事件以 debug 级别输出到日志
#[derive(Debug, Default, Clone, Copy)]
pub struct LogInspector;

impl Inspector for LogInspector {
    fn before_acquire(&mut self, resource: &str) {
        log::debug!("acquire '{}'", resource);
    }

    fn before_pass(&mut self, pass: &str) {
        log::debug!("begin pass '{}'", pass);
    }

    fn after_pass(&mut self, pass: &str) {
        log::debug!("end pass '{}'", pass);
    }

    fn after_release(&mut self, resource: &str) {
        log::debug!("release '{}'", resource);
    }
}
