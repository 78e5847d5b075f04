//! 统一错误处理模块
//!
//! 提供粒子场范围内的统一错误类型定义
//!
//! ## 错误类型分层
//!
//! - **渲染层错误** (`RenderError`): 绘制上下文、着色器编译、管线链接、表面错误
//! - **资源层错误** (`AssetError`): 源图像尚未解码、图像加载失败、像素数据不完整
//! - **颜色错误** (`ColorError`): 在本地恢复为白色，不向上传播
//!
//! `FieldError` 可以同时承载以上所有错误以及配置和窗口错误。
//! 所有错误对当前渲染会话是终止性的，但不会导致宿主崩溃。

use thiserror::Error;

use crate::config::ConfigError;

/// 粒子场顶层错误类型
#[derive(Error, Debug)]
pub enum FieldError {
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Window creation failed: {0}")]
    Window(String),

    #[error("Event loop error: {0}")]
    EventLoop(String),

    #[error("Invalid session state: {0}")]
    InvalidState(String),
}

/// 渲染系统错误
#[derive(Error, Debug, Clone)]
pub enum RenderError {
    /// 表面无法提供所需的 GPU 上下文（无适配器、无设备、无法创建表面）
    #[error("Drawing context unavailable: {0}")]
    DrawingContextUnavailable(String),

    #[error("Shader compilation failed: {0}")]
    ShaderCompileFailed(String),

    #[error("Program link failed: {0}")]
    ProgramLinkFailed(String),

    #[error("Surface error: {0}")]
    Surface(String),
}

/// 资源管理错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    /// 源图像尚未完成解码，图像采样分布需要延迟初始化
    #[error("Source image has not finished decoding")]
    ImageDecodeIncomplete,

    #[error("Failed to load image: {path}, reason: {reason}")]
    LoadFailed { path: String, reason: String },

    #[error("Invalid pixel buffer: expected {expected} bytes, got {actual}")]
    InvalidPixels { expected: usize, actual: usize },
}

/// 颜色解析错误（调用方通常回退为白色）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("Invalid color: {0:?}")]
    InvalidColor(String),
}

/// 粒子场结果类型别名
pub type FieldResult<T> = Result<T, FieldError>;
pub type RenderResult<T> = Result<T, RenderError>;
pub type AssetResult<T> = Result<T, AssetError>;
