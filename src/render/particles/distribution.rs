//! 粒子分布生成
//!
//! 三种策略：
//! - **Uniform / DiscDensityCorrected**：圆盘内按面积均匀分布。半径取 `sqrt(u)·R`
//!   而不是 `u·R`，后者会在圆心附近形成明显的密度尖峰。
//! - **ImageSampled**：按步长遍历源图像网格，alpha > 128 的像素各生成一个粒子，
//!   粒子数量由图像数据决定，与 `particle_count` 无关。

use glam::{Vec2, Vec3};
use rand::Rng;
use std::f32::consts::TAU;

use super::image::ImagePixels;
use super::particle::Particle;
use crate::config::{DistributionKind, FieldConfig};
use crate::core::error::{AssetError, AssetResult};
use crate::render::color;

/// 圆盘内按面积均匀采样一点
pub fn sample_disc<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> Vec2 {
    let theta = rng.gen::<f32>() * TAU;
    let r = rng.gen::<f32>().sqrt() * radius;
    Vec2::new(theta.cos() * r, theta.sin() * r)
}

/// 尺寸抖动上限
const MAX_SIZE_JITTER: f32 = 0.99;

/// 分布生成器
///
/// 不要求配置已通过验证：非法的抖动值会被夹取到 `[0, MAX_SIZE_JITTER]`。
pub struct DistributionGenerator<'a> {
    config: &'a FieldConfig,
    palette: Vec<Vec3>,
    jitter: f32,
}

impl<'a> DistributionGenerator<'a> {
    pub fn new(config: &'a FieldConfig) -> Self {
        let jitter = if config.size_jitter.is_finite() {
            config.size_jitter.clamp(0.0, MAX_SIZE_JITTER)
        } else {
            0.0
        };
        Self {
            config,
            palette: color::parse_palette(&config.color_palette),
            jitter,
        }
    }

    /// 生成粒子
    ///
    /// 图像采样模式下若图像尚未就绪，返回 [`AssetError::ImageDecodeIncomplete`]，
    /// 调用方应等待解码完成后重试，而不是生成一个空的粒子场。
    pub fn generate<R: Rng + ?Sized>(
        &self,
        image: Option<&ImagePixels>,
        rng: &mut R,
    ) -> AssetResult<Vec<Particle>> {
        let particles = match self.config.distribution {
            DistributionKind::Uniform | DistributionKind::DiscDensityCorrected => {
                self.generate_disc(rng)
            }
            DistributionKind::ImageSampled => {
                let image = image.ok_or(AssetError::ImageDecodeIncomplete)?;
                self.generate_from_image(image, rng)
            }
        };
        tracing::debug!(
            target: "field",
            "Generated {} particles ({:?})",
            particles.len(),
            self.config.distribution
        );
        Ok(particles)
    }

    fn generate_disc<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Particle> {
        (0..self.config.particle_count)
            .map(|_| {
                let origin = sample_disc(rng, self.config.disc_radius);
                self.make_particle(origin, None, rng)
            })
            .collect()
    }

    fn generate_from_image<R: Rng + ?Sized>(
        &self,
        image: &ImagePixels,
        rng: &mut R,
    ) -> Vec<Particle> {
        let scale = self.config.image_scale;
        image
            .visible_cells(self.config.sampling_stride)
            .map(|(x, y)| {
                let tint = if self.config.use_image_colors {
                    image.rgb_at(x, y).map(Vec3::from_array)
                } else {
                    None
                };
                self.make_particle(image.to_field(x, y, scale), tint, rng)
            })
            .collect()
    }

    fn make_particle<R: Rng + ?Sized>(
        &self,
        origin: Vec2,
        color: Option<Vec3>,
        rng: &mut R,
    ) -> Particle {
        let jitter = self.jitter;
        let size = self.config.point_size * (1.0 + rng.gen_range(-jitter..=jitter));
        let phase = rng.gen::<f32>() * TAU;
        let color = color.unwrap_or_else(|| self.pick_color(rng));
        Particle {
            origin,
            size,
            phase,
            color,
        }
    }

    fn pick_color<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        if self.palette.is_empty() {
            Vec3::ONE
        } else {
            self.palette[rng.gen_range(0..self.palette.len())]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    fn opaque_image(width: u32, height: u32) -> ImagePixels {
        ImagePixels::new(width, height, [255, 255, 255, 255].repeat((width * height) as usize))
            .unwrap()
    }

    #[test]
    fn test_disc_count_and_bounds() {
        let config = FieldConfig {
            particle_count: 500,
            distribution: DistributionKind::Uniform,
            disc_radius: 0.3,
            ..Default::default()
        };
        let particles = DistributionGenerator::new(&config)
            .generate(None, &mut rng())
            .unwrap();
        assert_eq!(particles.len(), 500);
        assert!(particles.iter().all(|p| p.origin.length() <= 0.3 + 1e-6));
    }

    #[test]
    fn test_radial_density_is_uniform() {
        let radius = 1.0;
        let n = 200_000;
        let bins = 10;
        let mut counts = vec![0usize; bins];
        let mut r = rng();
        for _ in 0..n {
            let d = sample_disc(&mut r, radius).length();
            let bin = ((d / radius) * bins as f32).min(bins as f32 - 1.0) as usize;
            counts[bin] += 1;
        }
        // 每个环带的面积比例为 (2i+1)/bins²，按面积归一化后的密度应近似相等
        let densities: Vec<f32> = counts
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let area_share = (2 * i + 1) as f32 / (bins * bins) as f32;
                c as f32 / (n as f32 * area_share)
            })
            .collect();
        for (i, d) in densities.iter().enumerate() {
            assert!((d - 1.0).abs() < 0.1, "bin {} density {}", i, d);
        }
        // 朴素的 u·R 采样会让最内环密度约为平均值的 10 倍
        assert!(densities[0] < 1.1);
    }

    #[test]
    fn test_size_jitter_bounds() {
        let config = FieldConfig {
            particle_count: 2000,
            point_size: 4.0,
            size_jitter: 0.25,
            ..Default::default()
        };
        let particles = DistributionGenerator::new(&config)
            .generate(None, &mut rng())
            .unwrap();
        assert!(particles.iter().all(|p| (3.0..=5.0).contains(&p.size)));
        let min = particles.iter().map(|p| p.size).fold(f32::MAX, f32::min);
        let max = particles.iter().map(|p| p.size).fold(f32::MIN, f32::max);
        assert!(max - min > 1.0, "sizes are not jittered");
    }

    #[test]
    fn test_invalid_jitter_is_clamped() {
        for jitter in [-0.1, f32::NAN, f32::INFINITY, 3.0] {
            let config = FieldConfig {
                particle_count: 200,
                point_size: 2.0,
                size_jitter: jitter,
                ..Default::default()
            };
            let particles = DistributionGenerator::new(&config)
                .generate(None, &mut rng())
                .unwrap();
            assert_eq!(particles.len(), 200);
            assert!(
                particles.iter().all(|p| p.size.is_finite() && p.size >= 0.0),
                "jitter {} produced invalid sizes",
                jitter
            );
        }

        let config = FieldConfig {
            particle_count: 50,
            size_jitter: -0.5,
            ..Default::default()
        };
        let particles = DistributionGenerator::new(&config)
            .generate(None, &mut rng())
            .unwrap();
        assert!(particles.iter().all(|p| p.size == config.point_size));
    }

    #[test]
    fn test_palette_colors_are_assigned() {
        let config = FieldConfig {
            particle_count: 400,
            color_palette: vec!["#ff0000".to_string(), "#0000ff".to_string()],
            ..Default::default()
        };
        let particles = DistributionGenerator::new(&config)
            .generate(None, &mut rng())
            .unwrap();
        let red = particles.iter().filter(|p| p.color == Vec3::X).count();
        let blue = particles.iter().filter(|p| p.color == Vec3::Z).count();
        assert_eq!(red + blue, 400);
        assert!(red > 100 && blue > 100);
    }

    #[test]
    fn test_image_mode_without_pixels_defers() {
        let config = FieldConfig {
            distribution: DistributionKind::ImageSampled,
            ..Default::default()
        };
        let err = DistributionGenerator::new(&config)
            .generate(None, &mut rng())
            .unwrap_err();
        assert_eq!(err, AssetError::ImageDecodeIncomplete);
    }

    #[test]
    fn test_image_particles_come_from_visible_pixels() {
        // 左半透明度 255，右半透明度 128（恰好在阈值上，不可见）
        let (w, h) = (32u32, 16u32);
        let mut rgba = Vec::with_capacity((w * h * 4) as usize);
        for _y in 0..h {
            for x in 0..w {
                let alpha = if x < w / 2 { 255 } else { 128 };
                rgba.extend_from_slice(&[255, 255, 255, alpha]);
            }
        }
        let image = ImagePixels::new(w, h, rgba).unwrap();
        let config = FieldConfig {
            distribution: DistributionKind::ImageSampled,
            sampling_stride: 2,
            image_scale: 1.0,
            ..Default::default()
        };
        let particles = DistributionGenerator::new(&config)
            .generate(Some(&image), &mut rng())
            .unwrap();
        assert_eq!(particles.len(), (8 * 8) as usize);
        // 左半图像映射到场空间 x < 0
        assert!(particles.iter().all(|p| p.origin.x < 0.0));
        assert!(particles
            .iter()
            .all(|p| (0.0..TAU).contains(&p.phase)));
    }

    #[test]
    fn test_image_count_scales_with_inverse_stride_squared() {
        let image = opaque_image(64, 64);
        let counts: Vec<usize> = [1u32, 2, 4, 8]
            .iter()
            .map(|&stride| {
                let config = FieldConfig {
                    distribution: DistributionKind::ImageSampled,
                    sampling_stride: stride,
                    ..Default::default()
                };
                DistributionGenerator::new(&config)
                    .generate(Some(&image), &mut rng())
                    .unwrap()
                    .len()
            })
            .collect();
        assert_eq!(counts, vec![4096, 1024, 256, 64]);
    }

    #[test]
    fn test_image_colors_follow_source_pixels() {
        let image = ImagePixels::new(1, 1, vec![255, 0, 0, 255]).unwrap();
        let config = FieldConfig {
            distribution: DistributionKind::ImageSampled,
            sampling_stride: 1,
            use_image_colors: true,
            ..Default::default()
        };
        let particles = DistributionGenerator::new(&config)
            .generate(Some(&image), &mut rng())
            .unwrap();
        assert_eq!(particles.len(), 1);
        assert_eq!(particles[0].color, Vec3::X);
        assert_eq!(particles[0].origin, Vec2::ZERO);
    }
}
