//! 统一配置系统
//!
//! 提供TOML/JSON配置文件、环境变量覆盖和加载时验证
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::impl_default;

pub mod field;
pub mod window;

pub use field::{DistributionKind, FieldConfig, MAX_PARTICLES};
pub use window::WindowConfig;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "particle_field.toml";

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 配置来源，用于在日志系统初始化之后报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

/// 应用主配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 窗口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 粒子场配置
    #[serde(default)]
    pub field: FieldConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// 按扩展名加载配置文件（`.json` 为 JSON，其余按 TOML 解析）
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// 从任意键值来源覆盖配置（便于测试）
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(raw: Option<String>) -> Option<T> {
            raw.and_then(|v| v.trim().parse().ok())
        }

        let field = &mut self.field;
        if let Some(color) = lookup("PARTICLE_FIELD_COLOR") {
            field.color = color;
        }
        if let Some(count) = parsed(lookup("PARTICLE_FIELD_COUNT")) {
            field.particle_count = count;
        }
        if let Some(size) = parsed(lookup("PARTICLE_FIELD_POINT_SIZE")) {
            field.point_size = size;
        }
        if let Some(radius) = parsed(lookup("PARTICLE_FIELD_RADIUS")) {
            field.interaction_radius = radius;
        }
        if let Some(glow) = parsed(lookup("PARTICLE_FIELD_GLOW")) {
            field.glow_enabled = glow;
        }
        if let Some(image) = lookup("PARTICLE_FIELD_IMAGE") {
            field.source_image = Some(PathBuf::from(image));
            field.distribution = DistributionKind::ImageSampled;
        }
        if let Some(kind) = lookup("PARTICLE_FIELD_DISTRIBUTION") {
            let quoted = format!("\"{}\"", kind.trim());
            if let Ok(kind) = serde_json::from_str::<DistributionKind>(&quoted) {
                field.distribution = kind;
            }
        }
        if let Some(level) = lookup("PARTICLE_FIELD_LOG_LEVEL") {
            let quoted = format!("\"{}\"", level.trim());
            if let Ok(level) = serde_json::from_str::<LogLevel>(&quoted) {
                self.logging.level = level;
            }
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.window.validate()?;
        self.field.validate()?;
        Ok(())
    }

    /// 加载配置
    ///
    /// 按以下顺序查找：
    /// 1. 显式传入的路径（不存在或解析失败即报错）
    /// 2. ./particle_field.toml
    /// 3. 使用默认配置
    ///
    /// 之后应用环境变量覆盖并验证。
    pub fn load(explicit: Option<&Path>) -> ConfigResult<(Self, ConfigSource)> {
        let (mut config, source) = match explicit {
            Some(path) => (Self::from_file(path)?, ConfigSource::File(path.to_path_buf())),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    (
                        Self::from_toml_file(fallback)?,
                        ConfigSource::File(fallback.to_path_buf()),
                    )
                } else {
                    (Self::default(), ConfigSource::Defaults)
                }
            }
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok((config, source))
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,

    /// 额外的 EnvFilter 指令，例如 `"wgpu_core=warn"`
    pub directives: Vec<String>,
}

impl_default!(LoggingConfig {
    level: LogLevel::Info,
    directives: vec!["wgpu_core=warn".to_string(), "wgpu_hal=warn".to_string()],
});

impl LoggingConfig {
    /// 组装 `tracing_subscriber::EnvFilter` 指令串
    pub fn filter_directives(&self) -> String {
        let mut parts = vec![self.level.as_str().to_string()];
        parts.extend(self.directives.iter().cloned());
        parts.join(",")
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}
