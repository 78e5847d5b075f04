//! 核心宏定义

/// 为配置结构体实现 Default trait 的宏
///
/// 使用示例:
/// ```rust
/// use particle_field::impl_default;
///
/// struct Knobs {
///     radius: f32,
///     label: String,
/// }
///
/// impl_default!(Knobs {
///     radius: 0.4,
///     label: String::from("field"),
/// });
///
/// assert_eq!(Knobs::default().radius, 0.4);
/// ```
#[macro_export]
macro_rules! impl_default {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }
    };
}
