//! 指针力场模型（主机端参考实现）
//!
//! 与 `shader_particles.wgsl` 中顶点阶段的实现逐项对应，CPU 参考后端和测试都使用这里的函数。

use glam::Vec2;

/// 方向向量归一化的最小长度，低于该值位移为零
pub const DIRECTION_EPSILON: f32 = 1e-6;

/// 衰减项：距离 0 处为 1，距离 >= radius 处恰好为 0，中间为 smoothstep 平滑过渡
#[inline]
pub fn falloff(distance: f32, radius: f32) -> f32 {
    if !(radius > 0.0) || distance.is_nan() {
        return 0.0;
    }
    let t = (distance / radius).clamp(0.0, 1.0);
    1.0 - t * t * (3.0 - 2.0 * t)
}

/// 单个粒子在当前帧的计算结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Displaced {
    /// 位移后的位置（场空间）
    pub position: Vec2,
    /// 尺寸缩放
    pub size_scale: f32,
    /// 不透明度
    pub alpha: f32,
}

/// 计算粒子受指针排斥后的位置、尺寸与不透明度
///
/// 位移量上限为 `strength`；粒子与指针重合时方向向量为零，结果不会出现 NaN。
pub fn displace(origin: Vec2, pointer: Vec2, radius: f32, strength: f32) -> Displaced {
    let delta = origin - pointer;
    let distance = delta.length();
    let f = falloff(distance, radius);
    let direction = if distance > DIRECTION_EPSILON {
        delta / distance
    } else {
        Vec2::ZERO
    };
    Displaced {
        position: origin + direction * f * strength,
        size_scale: 1.0 - f,
        alpha: 1.0 - f,
    }
}

/// 图像模式闲置动画的尺寸因子，范围 `[1 - amount, 1 + amount]`
#[inline]
pub fn pulse_size(time: f32, speed: f32, phase: f32, amount: f32) -> f32 {
    1.0 + amount * (time * speed + phase).sin()
}

/// 图像模式闲置动画的不透明度因子，范围 `[1 - amount, 1]`
#[inline]
pub fn pulse_alpha(time: f32, speed: f32, phase: f32, amount: f32) -> f32 {
    1.0 - amount * 0.5 * (1.0 - (time * speed + phase).sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_falloff_endpoints() {
        assert_eq!(falloff(0.0, 0.4), 1.0);
        assert_eq!(falloff(0.4, 0.4), 0.0);
        assert_eq!(falloff(3.0, 0.4), 0.0);
        assert!((falloff(0.2, 0.4) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_falloff_degenerate_radius() {
        assert_eq!(falloff(0.0, 0.0), 0.0);
        assert_eq!(falloff(0.1, -1.0), 0.0);
        assert_eq!(falloff(f32::NAN, 0.4), 0.0);
    }

    #[test]
    fn test_zero_distance_has_no_nan() {
        let p = Vec2::new(0.1, -0.2);
        let d = displace(p, p, 0.4, 0.1);
        assert_eq!(d.position, p);
        assert_eq!(d.size_scale, 0.0);
        assert_eq!(d.alpha, 0.0);
        assert!(d.position.is_finite());
    }

    #[test]
    fn test_far_pointer_leaves_particle_untouched() {
        let origin = Vec2::new(0.25, 0.1);
        let d = displace(origin, Vec2::new(10.0, 10.0), 0.3, 0.1);
        assert_eq!(d.position, origin);
        assert_eq!(d.size_scale, 1.0);
        assert_eq!(d.alpha, 1.0);
    }

    #[test]
    fn test_displacement_pushes_away_from_pointer() {
        let d = displace(Vec2::new(0.1, 0.0), Vec2::ZERO, 0.4, 0.1);
        assert!(d.position.x > 0.1);
        assert_eq!(d.position.y, 0.0);
    }

    #[test]
    fn test_pulse_ranges() {
        for i in 0..64 {
            let t = i as f32 * 0.37;
            let s = pulse_size(t, 1.5, 0.3, 0.3);
            let a = pulse_alpha(t, 1.5, 0.3, 0.3);
            assert!((0.7 - 1e-5..=1.3 + 1e-5).contains(&s));
            assert!((0.7 - 1e-5..=1.0 + 1e-5).contains(&a));
        }
        assert_eq!(pulse_size(5.0, 1.0, 0.0, 0.0), 1.0);
    }

    proptest! {
        #[test]
        fn falloff_is_monotone_and_bounded(
            a in 0.0f32..2.0,
            b in 0.0f32..2.0,
            radius in 0.01f32..1.5
        ) {
            let (near, far) = if a <= b { (a, b) } else { (b, a) };
            let f_near = falloff(near, radius);
            let f_far = falloff(far, radius);
            prop_assert!((0.0..=1.0).contains(&f_near));
            prop_assert!(f_far <= f_near + 1e-6);
            if far >= radius {
                prop_assert_eq!(f_far, 0.0);
            }
        }

        #[test]
        fn displacement_is_bounded(
            ox in -1.0f32..1.0, oy in -1.0f32..1.0,
            px in -1.0f32..1.0, py in -1.0f32..1.0,
            radius in 0.0f32..1.0,
            strength in 0.0f32..0.5
        ) {
            let origin = Vec2::new(ox, oy);
            let d = displace(origin, Vec2::new(px, py), radius, strength);
            prop_assert!(d.position.is_finite());
            prop_assert!((d.position - origin).length() <= strength + 1e-5);
            prop_assert!((0.0..=1.0).contains(&d.alpha));
        }
    }
}
