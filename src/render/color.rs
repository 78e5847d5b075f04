//! 颜色模型
//!
//! 将十六进制颜色或调色板解析为归一化的 0-1 RGB 三元组。
//! 归一化统一在主机端完成，着色器只接收 0-1 浮点数。

use glam::Vec3;

use crate::core::error::ColorError;

/// 解析失败时的回退颜色（不透明白色）
pub const FALLBACK_COLOR: Vec3 = Vec3::ONE;

/// 严格解析 6 位十六进制颜色，可带 `#` 前缀
pub fn try_parse_hex(input: &str) -> Result<Vec3, ColorError> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidColor(input.to_string()));
    }
    let value =
        u32::from_str_radix(digits, 16).map_err(|_| ColorError::InvalidColor(input.to_string()))?;
    let [_, r, g, b] = value.to_be_bytes();
    Ok(Vec3::new(r as f32, g as f32, b as f32) / 255.0)
}

/// 解析颜色，格式错误时静默回退为白色
pub fn parse_hex(input: &str) -> Vec3 {
    match try_parse_hex(input) {
        Ok(color) => color,
        Err(err) => {
            tracing::debug!(target: "field", "{}, falling back to white", err);
            FALLBACK_COLOR
        }
    }
}

/// 解析调色板，每个条目使用与 [`parse_hex`] 相同的规则
pub fn parse_palette<S: AsRef<str>>(entries: &[S]) -> Vec<Vec3> {
    entries.iter().map(|e| parse_hex(e.as_ref())).collect()
}

/// 转回 0-255 整数三元组
pub fn to_rgb8(color: Vec3) -> [u8; 3] {
    let c = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    [c.x as u8, c.y as u8, c.z as u8]
}

/// 转换为 wgpu 清屏颜色
pub fn to_clear_color(color: Vec3) -> wgpu::Color {
    wgpu::Color {
        r: color.x as f64,
        g: color.y as f64,
        b: color.z as f64,
        a: 1.0,
    }
}
