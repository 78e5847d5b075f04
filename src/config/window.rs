use super::{ConfigError, ConfigResult};
use crate::impl_default;
use serde::{Deserialize, Serialize};

/// 窗口与绘制表面配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// 窗口标题
    pub title: String,
    /// 初始逻辑宽度
    pub width: u32,
    /// 初始逻辑高度
    pub height: u32,
    /// 垂直同步
    pub vsync: bool,
    /// 多重采样抗锯齿（4x，设备不支持时回退为 1x）
    pub antialias: bool,
    /// 背景清屏颜色
    pub background: String,
}

impl_default!(WindowConfig {
    title: "Particle Field".to_string(),
    width: 960,
    height: 720,
    vsync: true,
    antialias: true,
    background: "#000000".to_string(),
});

impl WindowConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ValidationError(
                "Invalid window size".to_string(),
            ));
        }
        Ok(())
    }
}
