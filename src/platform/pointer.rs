//! 指针跟踪
//!
//! 把相对于绘制表面的设备像素坐标转换为归一化坐标（[-1, 1]，原点居中，y 轴向上），
//! 维护原始目标值和逐帧指数平滑后的值。

use glam::Vec2;

/// 指针离开表面时的哨兵坐标，远在归一化范围之外，使力场衰减为零
pub const POINTER_SENTINEL: Vec2 = Vec2::new(10.0, 10.0);

/// 默认平滑系数
pub const DEFAULT_SMOOTHING: f32 = 0.08;

/// 平滑系数上限，α 必须严格小于 1
pub const MAX_SMOOTHING: f32 = 0.999;

/// 指针状态（归一化设备坐标）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    /// 最近一次指针事件的目标位置
    pub target: Vec2,
    /// 平滑后的位置
    pub smoothed: Vec2,
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            target: POINTER_SENTINEL,
            smoothed: POINTER_SENTINEL,
        }
    }
}

/// 设备像素 → 归一化坐标
///
/// 坐标先夹取到表面范围内，因此结果每个分量都在 [-1, 1]。表面尺寸为零时返回 `None`。
pub fn to_normalized(px: f32, py: f32, width: f32, height: f32) -> Option<Vec2> {
    if !(width > 0.0 && height > 0.0) || !px.is_finite() || !py.is_finite() {
        return None;
    }
    let x = px.clamp(0.0, width) / width;
    let y = py.clamp(0.0, height) / height;
    Some(Vec2::new(x * 2.0 - 1.0, -(y * 2.0 - 1.0)))
}

/// 指针跟踪器
#[derive(Debug, Clone)]
pub struct PointerTracker {
    state: PointerState,
    alpha: f32,
    surface: (f32, f32),
    snap_on_enter: bool,
}

impl PointerTracker {
    pub fn new(alpha: f32) -> Self {
        let alpha = if alpha.is_finite() {
            alpha.clamp(1e-3, MAX_SMOOTHING)
        } else {
            DEFAULT_SMOOTHING
        };
        Self {
            state: PointerState::default(),
            alpha,
            surface: (0.0, 0.0),
            snap_on_enter: false,
        }
    }

    /// 指针从表面外进入时平滑值直接跳到目标
    pub fn with_snap_on_enter(mut self, snap: bool) -> Self {
        self.snap_on_enter = snap;
        self
    }

    pub fn state(&self) -> PointerState {
        self.state
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// 设置表面尺寸（与指针事件使用同一像素单位）
    pub fn set_surface_size(&mut self, width: f32, height: f32) {
        self.surface = (width, height);
    }

    /// 指针移动事件：仅更新目标值
    pub fn on_move(&mut self, px: f32, py: f32) {
        let Some(target) = to_normalized(px, py, self.surface.0, self.surface.1) else {
            return;
        };
        let entering = self.state.target == POINTER_SENTINEL;
        self.state.target = target;
        if self.snap_on_enter && entering {
            self.snap();
        }
    }

    /// 指针离开表面：目标重置为哨兵
    pub fn on_leave(&mut self) {
        self.state.target = POINTER_SENTINEL;
    }

    /// 每帧平滑一步：`smoothed += (target - smoothed) * α`
    pub fn step(&mut self) -> Vec2 {
        let PointerState { target, smoothed } = self.state;
        let next = smoothed + (target - smoothed) * self.alpha;
        self.state.smoothed = if next.is_finite() { next } else { target };
        self.state.smoothed
    }

    /// 平滑值直接跳到目标
    pub fn snap(&mut self) {
        self.state.smoothed = self.state.target;
    }
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalized_corners() {
        assert_eq!(to_normalized(0.0, 0.0, 200.0, 100.0), Some(Vec2::new(-1.0, 1.0)));
        assert_eq!(to_normalized(200.0, 100.0, 200.0, 100.0), Some(Vec2::new(1.0, -1.0)));
        assert_eq!(to_normalized(100.0, 50.0, 200.0, 100.0), Some(Vec2::ZERO));
        assert_eq!(to_normalized(10.0, 10.0, 0.0, 100.0), None);
    }

    #[test]
    fn test_out_of_bounds_positions_are_clamped() {
        let p = to_normalized(-50.0, 500.0, 200.0, 100.0).unwrap();
        assert_eq!(p, Vec2::new(-1.0, -1.0));
    }

    #[test]
    fn test_move_updates_target_only() {
        let mut tracker = PointerTracker::new(0.1);
        tracker.set_surface_size(200.0, 200.0);
        tracker.on_move(100.0, 100.0);
        assert_eq!(tracker.state().target, Vec2::ZERO);
        assert_eq!(tracker.state().smoothed, POINTER_SENTINEL);
    }

    #[test]
    fn test_leave_resets_target_to_sentinel() {
        let mut tracker = PointerTracker::new(0.1);
        tracker.set_surface_size(200.0, 200.0);
        tracker.on_move(50.0, 50.0);
        tracker.on_leave();
        assert_eq!(tracker.state().target, POINTER_SENTINEL);
    }

    #[test]
    fn test_snap_on_enter() {
        let mut tracker = PointerTracker::new(0.05).with_snap_on_enter(true);
        tracker.set_surface_size(100.0, 100.0);
        tracker.on_move(50.0, 50.0);
        assert_eq!(tracker.state().smoothed, Vec2::ZERO);
        // 仅在从哨兵进入时跳变
        tracker.on_move(100.0, 50.0);
        assert_eq!(tracker.state().smoothed, Vec2::ZERO);
    }

    #[test]
    fn test_invalid_alpha_is_sanitized() {
        assert_eq!(PointerTracker::new(f32::NAN).alpha(), DEFAULT_SMOOTHING);
        assert_eq!(PointerTracker::new(5.0).alpha(), MAX_SMOOTHING);
        assert!(PointerTracker::new(1.0).alpha() < 1.0);
        assert!(PointerTracker::new(0.0).alpha() > 0.0);
    }

    proptest! {
        #[test]
        fn smoothing_converges_without_overshoot(
            tx in -1.0f32..1.0, ty in -1.0f32..1.0,
            sx in -10.0f32..10.0, sy in -10.0f32..10.0,
            alpha in 0.01f32..0.99,
            ticks in 1usize..200
        ) {
            let mut tracker = PointerTracker::new(alpha);
            tracker.state = PointerState { target: Vec2::new(tx, ty), smoothed: Vec2::new(sx, sy) };
            let target = Vec2::new(tx, ty);
            let initial = (Vec2::new(sx, sy) - target).abs();
            let mut previous = initial;
            for _ in 0..ticks {
                let s = tracker.step();
                let gap = (s - target).abs();
                prop_assert!(gap.x <= previous.x + 1e-6);
                prop_assert!(gap.y <= previous.y + 1e-6);
                // 不越过目标
                prop_assert!((s.x - tx) * (sx - tx) >= -1e-6);
                prop_assert!((s.y - ty) * (sy - ty) >= -1e-6);
                previous = gap;
            }
            let total_initial = initial.length();
            if total_initial > 1e-3 {
                prop_assert!(previous.length() < total_initial);
            }
        }
    }
}
