//! Decorative starfield: twinkling background stars and shooting stars.
//!
//! Everything here is generated from an injected random source and carries no
//! shared state, so a renderer can call it on any timer it likes.

use rand::Rng;
use std::ops::Range;
use std::time::Duration;

/// Stars created per page.
pub const STAR_COUNT: usize = 250;
/// Interval of the shooting-star spawn attempt.
pub const SHOOTING_STAR_INTERVAL: Duration = Duration::from_secs(2);
/// Opacity twinkling stars rest at between pulses.
pub const TWINKLE_REST_OPACITY: f64 = 0.3;

const TWINKLE_CHANCE: f64 = 0.7;
const SIZE_PX: Range<f64> = 0.5..2.5;
const EDGE_OFFSET_PX: f64 = 50.0;
const TRAVEL_FACTOR: f64 = 1.5;
const SPEED_PX_S: Range<f64> = 500.0..1100.0;
const TRAIL_PX: Range<f64> = 100.0..250.0;

/// Page whose star parameters to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageProfile {
    Landing,
    Btc,
    School,
}

impl PageProfile {
    fn twinkle_duration_s(&self) -> Range<f64> {
        match self {
            PageProfile::School => 3.0..8.0,
            PageProfile::Landing | PageProfile::Btc => 5.0..12.0,
        }
    }

    fn twinkle_delay_s(&self) -> Range<f64> {
        match self {
            PageProfile::School => 0.0..3.0,
            PageProfile::Landing | PageProfile::Btc => 0.0..15.0,
        }
    }

    fn brightness(&self) -> Range<f64> {
        match self {
            PageProfile::School => 0.2..0.7,
            PageProfile::Landing | PageProfile::Btc => 0.3..1.0,
        }
    }

    fn fade_in_after(&self, returning: bool) -> Duration {
        match (self, returning) {
            (PageProfile::School, _) | (_, true) => Duration::from_millis(300),
            _ => Duration::from_millis(500),
        }
    }
}

// ─── Background stars ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StarLook {
    Twinkle { duration_s: f64, delay_s: f64 },
    Fixed { brightness: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    /// Horizontal position, percent of the container width.
    pub x_pct: f64,
    /// Vertical position, percent of the container height.
    pub y_pct: f64,
    pub size_px: f64,
    pub look: StarLook,
}

impl Star {
    /// Opacity the star fades in to.
    pub fn resting_opacity(&self) -> f64 {
        match self.look {
            StarLook::Twinkle { .. } => TWINKLE_REST_OPACITY,
            StarLook::Fixed { brightness } => brightness,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Starfield {
    pub stars: Vec<Star>,
    /// All stars start transparent and fade in together after this delay.
    pub fade_in_after: Duration,
}

/// `count` randomly placed stars. `returning` is set when the visitor comes
/// back from the BTC page.
pub fn create_stars(
    count: usize,
    returning: bool,
    profile: PageProfile,
    rng: &mut impl Rng,
) -> Starfield {
    let stars = (0..count)
        .map(|_| {
            let x_pct = rng.gen_range(0.0..100.0);
            let y_pct = rng.gen_range(0.0..100.0);
            let size_px = rng.gen_range(SIZE_PX);
            let look = if rng.gen_bool(TWINKLE_CHANCE) {
                StarLook::Twinkle {
                    duration_s: rng.gen_range(profile.twinkle_duration_s()),
                    delay_s: rng.gen_range(profile.twinkle_delay_s()),
                }
            } else {
                StarLook::Fixed {
                    brightness: rng.gen_range(profile.brightness()),
                }
            };
            Star {
                x_pct,
                y_pct,
                size_px,
                look,
            }
        })
        .collect();
    Starfield {
        stars,
        fade_in_after: profile.fade_in_after(returning),
    }
}

// ─── Shooting stars ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn diagonal(&self) -> f64 {
        self.width.hypot(self.height)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShootingStar {
    pub edge: Edge,
    pub start: (f64, f64),
    pub end: (f64, f64),
    /// Heading in degrees, clockwise from the positive x axis.
    pub angle_deg: f64,
    pub distance: f64,
    pub speed_px_s: f64,
    pub duration_s: f64,
    pub max_trail_px: f64,
    pub fade_in_after: Duration,
}

impl ShootingStar {
    fn progress(&self, elapsed_s: f64) -> f64 {
        if self.duration_s <= 0.0 {
            return 1.0;
        }
        (elapsed_s / self.duration_s).clamp(0.0, 1.0)
    }

    /// Head position after `elapsed_s` seconds of flight.
    pub fn position_at(&self, elapsed_s: f64) -> (f64, f64) {
        let p = self.progress(elapsed_s);
        (
            self.start.0 + (self.end.0 - self.start.0) * p,
            self.start.1 + (self.end.1 - self.start.1) * p,
        )
    }

    /// Trail grows with the distance flown, up to its cap.
    pub fn trail_length_at(&self, elapsed_s: f64) -> f64 {
        (self.distance * self.progress(elapsed_s)).min(self.max_trail_px)
    }

    pub fn is_finished(&self, elapsed_s: f64) -> bool {
        elapsed_s >= self.duration_s
    }
}

/// Flip a coin and, on heads, launch a shooting star from a random edge.
pub fn spawn_shooting_star(
    viewport: Viewport,
    returning: bool,
    rng: &mut impl Rng,
) -> Option<ShootingStar> {
    if !rng.gen_bool(0.5) {
        return None;
    }
    let (w, h) = (viewport.width, viewport.height);

    let mut from_top = |rng: &mut _| {
        let x = gen(rng, -0.25 * w..1.25 * w);
        let angle = gen(rng, 30.0..60.0);
        let angle = if x > w / 2.0 { -angle } else { angle };
        (Edge::Top, (x, -EDGE_OFFSET_PX), angle)
    };

    let (edge, start, angle_deg) = match rng.gen_range(0..4) {
        0 => from_top(rng),
        1 => (
            Edge::Right,
            (w + EDGE_OFFSET_PX, gen(rng, 0.0..h * 0.7)),
            rng.gen_range(150.0..180.0),
        ),
        2 if rng.gen_bool(0.3) => (
            Edge::Bottom,
            (gen(rng, 0.0..w), h + EDGE_OFFSET_PX),
            rng.gen_range(-120.0..-90.0),
        ),
        2 => from_top(rng),
        _ => (
            Edge::Left,
            (-EDGE_OFFSET_PX, gen(rng, 0.0..h * 0.7)),
            rng.gen_range(0.0..30.0),
        ),
    };

    let distance = viewport.diagonal() * TRAVEL_FACTOR;
    let rad = angle_deg.to_radians();
    let end = (start.0 + rad.cos() * distance, start.1 + rad.sin() * distance);
    let speed_px_s = rng.gen_range(SPEED_PX_S);

    Some(ShootingStar {
        edge,
        start,
        end,
        angle_deg,
        distance,
        speed_px_s,
        duration_s: distance / speed_px_s,
        max_trail_px: rng.gen_range(TRAIL_PX),
        fade_in_after: PageProfile::Landing.fade_in_after(returning),
    })
}

/// `gen_range` that tolerates an empty range (zero-sized viewport).
fn gen(rng: &mut impl Rng, range: Range<f64>) -> f64 {
    if range.start < range.end {
        rng.gen_range(range)
    } else {
        range.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_create_stars_ranges() {
        let mut rng = StdRng::seed_from_u64(1);
        let field = create_stars(STAR_COUNT, false, PageProfile::Landing, &mut rng);
        assert_eq!(field.stars.len(), 250);
        assert_eq!(field.fade_in_after, Duration::from_millis(500));
        for star in &field.stars {
            assert!((0.0..100.0).contains(&star.x_pct));
            assert!((0.0..100.0).contains(&star.y_pct));
            assert!((0.5..2.5).contains(&star.size_px));
            match star.look {
                StarLook::Twinkle { duration_s, delay_s } => {
                    assert!((5.0..12.0).contains(&duration_s));
                    assert!((0.0..15.0).contains(&delay_s));
                    assert_eq!(star.resting_opacity(), 0.3);
                }
                StarLook::Fixed { brightness } => {
                    assert!((0.3..1.0).contains(&brightness));
                }
            }
        }
    }

    #[test]
    fn test_twinkle_share_is_about_seventy_percent() {
        let mut rng = StdRng::seed_from_u64(2);
        let field = create_stars(5_000, false, PageProfile::Btc, &mut rng);
        let twinkling = field
            .stars
            .iter()
            .filter(|s| matches!(s.look, StarLook::Twinkle { .. }))
            .count();
        assert!((3_300..3_700).contains(&twinkling), "{}", twinkling);
    }

    #[test]
    fn test_fade_delays() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(
            create_stars(1, true, PageProfile::Landing, &mut rng).fade_in_after,
            Duration::from_millis(300)
        );
        assert_eq!(
            create_stars(1, false, PageProfile::School, &mut rng).fade_in_after,
            Duration::from_millis(300)
        );
    }

    #[test]
    fn test_school_profile_ranges() {
        let mut rng = StdRng::seed_from_u64(4);
        let field = create_stars(500, false, PageProfile::School, &mut rng);
        for star in &field.stars {
            match star.look {
                StarLook::Twinkle { duration_s, delay_s } => {
                    assert!((3.0..8.0).contains(&duration_s));
                    assert!((0.0..3.0).contains(&delay_s));
                }
                StarLook::Fixed { brightness } => assert!((0.2..0.7).contains(&brightness)),
            }
        }
    }

    #[test]
    fn test_shooting_star_flight() {
        let mut rng = StdRng::seed_from_u64(5);
        let viewport = Viewport::new(1000.0, 750.0);
        let mut spawned = 0;
        for _ in 0..200 {
            let Some(star) = spawn_shooting_star(viewport, false, &mut rng) else {
                continue;
            };
            spawned += 1;
            assert!((star.distance - 1875.0).abs() < 1e-9);
            assert!((500.0..1100.0).contains(&star.speed_px_s));
            assert!((star.duration_s - star.distance / star.speed_px_s).abs() < 1e-9);
            assert_eq!(star.position_at(0.0), star.start);
            let (x, y) = star.position_at(star.duration_s);
            assert!((x - star.end.0).abs() < 1e-6 && (y - star.end.1).abs() < 1e-6);
            assert_eq!(star.trail_length_at(0.0), 0.0);
            assert_eq!(star.trail_length_at(star.duration_s), star.max_trail_px);
            assert!(!star.is_finished(star.duration_s / 2.0));
            assert!(star.is_finished(star.duration_s));
            match star.edge {
                Edge::Right => assert!((150.0..180.0).contains(&star.angle_deg)),
                Edge::Left => assert!((0.0..30.0).contains(&star.angle_deg)),
                Edge::Bottom => assert!((-120.0..-90.0).contains(&star.angle_deg)),
                Edge::Top => assert!((30.0..60.0).contains(&star.angle_deg.abs())),
            }
        }
        assert!((60..140).contains(&spawned), "{}", spawned);
    }

    #[test]
    fn test_zero_viewport_does_not_panic() {
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..50 {
            if let Some(star) = spawn_shooting_star(Viewport::new(0.0, 0.0), true, &mut rng) {
                assert!(star.is_finished(0.0));
                assert_eq!(star.position_at(1.0), star.start);
            }
        }
    }
}
