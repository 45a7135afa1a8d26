/// `FrameGraph` 的行为开关
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameGraphSettings {
    /// 为 true 时，Pass 只能访问自己声明过的资源
    pub strict_access: bool,
    /// 为 true 时，编译完成后打印执行计划
    pub print_plan: bool,
}

impl Default for FrameGraphSettings {
    fn default() -> Self {
        Self {
            strict_access: true,
            print_plan: false,
        }
    }
}

// builder
impl FrameGraphSettings {
    /// 设置访问检查（链式调用）
    #[inline]
    pub fn with_strict_access(mut self, strict_access: bool) -> Self {
        self.strict_access = strict_access;
        self
    }

    /// 设置是否打印执行计划（链式调用）
    #[inline]
    pub fn with_print_plan(mut self, print_plan: bool) -> Self {
        self.print_plan = print_plan;
        self
    }
}
