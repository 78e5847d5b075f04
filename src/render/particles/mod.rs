//! 粒子数据
//!
//! - `particle`：粒子记录与 GPU 实例布局
//! - `distribution`：初始分布生成
//! - `image`：图像采样模式的像素来源

pub mod distribution;
pub mod image;
pub mod particle;

pub use distribution::{sample_disc, DistributionGenerator};
pub use self::image::{ImagePixels, ALPHA_THRESHOLD};
pub use particle::{pack_instances, GpuParticle, Particle};
