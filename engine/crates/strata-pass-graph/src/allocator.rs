//! 物理资源分配器接口
//!
//! graph 只负责决定"何时" acquire / release，具体如何创建物理资源由调用方实现。
//! `Descriptor` 对 graph 完全不透明。

/// 由调用方提供的资源分配器
///
/// # 示例
///
/// ```ignore
/// struct TexturePool { /* ... */ }
///
/// impl ResourceAllocator for TexturePool {
///     type Descriptor = TextureDesc;
///     type Resource = Texture;
///
///     fn acquire(&mut self, desc: &TextureDesc) -> anyhow::Result<Texture> {
///         self.take_or_create(desc)
///     }
///
///     fn release(&mut self, desc: &TextureDesc, texture: Texture) -> anyhow::Result<()> {
///         self.give_back(desc, texture);
///         Ok(())
///     }
/// }
/// ```
pub trait ResourceAllocator {
    /// 资源创建参数
    type Descriptor;
    /// 物理资源实例，External 资源也以同一类型导入
    type Resource;

    fn acquire(&mut self, descriptor: &Self::Descriptor) -> anyhow::Result<Self::Resource>;

    fn release(&mut self, descriptor: &Self::Descriptor, resource: Self::Resource) -> anyhow::Result<()>;
}
