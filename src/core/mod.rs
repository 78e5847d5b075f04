//! 核心模块
//!
//! - `session` - 粒子场会话与生命周期
//! - `animation` - 逐帧动画循环与取消信号
//! - `app` - winit 宿主事件循环
//! - `error` - 错误类型定义

pub mod animation;
pub mod app;
pub mod error;
pub mod session;
#[macro_use]
pub mod macros;

// 重新导出错误类型
pub use error::{
    AssetError, AssetResult, ColorError, FieldError, FieldResult, RenderError, RenderResult,
};

pub use animation::{AnimationLoop, CancelSignal, TickOutcome};
pub use app::{initialize_logging, App, UserEvent};
pub use session::{FieldSession, SessionState};
