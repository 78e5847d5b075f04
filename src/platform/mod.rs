//! 平台层
//!
//! - `pointer`：指针坐标归一化与平滑
//! - `winit`：原生窗口

pub mod pointer;
pub mod winit;

pub use self::pointer::{PointerState, PointerTracker, POINTER_SENTINEL};
pub use self::winit::WinitWindow;
