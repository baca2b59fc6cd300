use rand::seq::SliceRandom;
use rand::Rng;

const SYMBOLS: [char; 7] = ['*', '•', '◆', '▲', '■', '✦', '●'];
const GRAVITY: f64 = 18.0;
const DRAG: f64 = 0.96;
/// Fixed timestep per animation tick, in seconds
const DT: f64 = 0.1;

/// Shape of a confetti burst: how many pieces, the cone they fly out in and
/// where on screen they start (fraction of the height from the top)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfettiBurst {
    pub particle_count: usize,
    pub spread_degrees: f64,
    pub origin_y: f64,
}

impl Default for ConfettiBurst {
    fn default() -> Self {
        Self {
            particle_count: 100,
            spread_degrees: 70.0,
            origin_y: 0.6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfettiPiece {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
}

impl ConfettiPiece {
    fn launch<R: Rng>(rng: &mut R, x: f64, y: f64, spread_degrees: f64) -> Self {
        // angle measured from straight up
        let half = spread_degrees.to_radians() / 2.0;
        let angle = rng.gen_range(-half..=half);
        let speed = rng.gen_range(8.0..16.0);

        Self {
            x,
            y,
            // terminal cells are roughly twice as tall as wide
            vel_x: angle.sin() * speed * 2.0,
            vel_y: -angle.cos() * speed,
            symbol: *SYMBOLS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(1.5..3.0),
        }
    }

    fn update(&mut self, dt: f64) -> bool {
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        self.vel_x *= DRAG;
        self.vel_y += GRAVITY * dt;
        self.age += dt;
        self.age < self.max_age
    }

    /// 1.0 when fresh, 0.0 at end of life
    pub fn life(&self) -> f64 {
        (1.0 - self.age / self.max_age).clamp(0.0, 1.0)
    }
}

/// Confetti played when the final question is answered correctly
#[derive(Debug)]
pub struct Confetti {
    pub pieces: Vec<ConfettiPiece>,
    pub is_active: bool,
    burst: ConfettiBurst,
    ticks_left: u32,
    width: f64,
    height: f64,
}

impl Confetti {
    /// Total animation length in ticks
    pub const DURATION_TICKS: u32 = 30;

    pub fn new() -> Self {
        Self::with_burst(ConfettiBurst::default())
    }

    pub fn with_burst(burst: ConfettiBurst) -> Self {
        Self {
            pieces: Vec::new(),
            is_active: false,
            burst,
            ticks_left: 0,
            width: 80.0,
            height: 24.0,
        }
    }

    pub fn fire(&mut self, width: u16, height: u16) {
        let mut rng = rand::thread_rng();

        self.width = width as f64;
        self.height = height as f64;
        self.ticks_left = Self::DURATION_TICKS;
        self.is_active = true;

        let origin_x = self.width / 2.0;
        let origin_y = self.height * self.burst.origin_y;
        self.pieces = (0..self.burst.particle_count)
            .map(|_| ConfettiPiece::launch(&mut rng, origin_x, origin_y, self.burst.spread_degrees))
            .collect();
    }

    pub fn update(&mut self) {
        if !self.is_active {
            return;
        }

        self.ticks_left = self.ticks_left.saturating_sub(1);
        if self.ticks_left == 0 {
            self.stop();
            return;
        }

        let (width, height) = (self.width, self.height);
        self.pieces.retain_mut(|piece| {
            let alive = piece.update(DT);
            let buffer = 5.0;
            let off_screen =
                piece.y > height + buffer || piece.x < -buffer || piece.x > width + buffer;
            alive && !off_screen
        });

        if self.pieces.is_empty() {
            self.stop();
        }
    }

    pub fn stop(&mut self) {
        self.is_active = false;
        self.pieces.clear();
    }
}

impl Default for Confetti {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_default_burst_shape() {
        let burst = ConfettiBurst::default();
        assert_eq!(burst.particle_count, 100);
        assert_eq!(burst.spread_degrees, 70.0);
        assert_eq!(burst.origin_y, 0.6);
    }

    #[test]
    fn test_piece_launches_upward_within_cone() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let piece = ConfettiPiece::launch(&mut rng, 40.0, 14.0, 70.0);
            assert!(piece.vel_y < 0.0, "confetti should start moving up");
            // tan(35°) * 2 for the aspect correction
            let ratio = piece.vel_x.abs() / piece.vel_y.abs();
            assert!(ratio <= 35f64.to_radians().tan() * 2.0 + 1e-9);
        }
    }

    #[test]
    fn test_gravity_pulls_pieces_down() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut piece = ConfettiPiece::launch(&mut rng, 10.0, 10.0, 70.0);
        let initial_vel_y = piece.vel_y;
        assert!(piece.update(0.1));
        assert!(piece.vel_y > initial_vel_y);
        assert!(piece.life() < 1.0);
    }

    #[test]
    fn test_fire_activates_and_spawns_pieces() {
        let mut confetti = Confetti::new();
        assert!(!confetti.is_active);
        assert!(confetti.pieces.is_empty());

        confetti.fire(80, 24);
        assert!(confetti.is_active);
        assert_eq!(confetti.pieces.len(), 100);
        for piece in &confetti.pieces {
            assert_eq!(piece.x, 40.0);
            assert!((piece.y - 14.4).abs() < 1e-9);
        }
    }

    #[test]
    fn test_animation_ends_after_duration() {
        let mut confetti = Confetti::new();
        confetti.fire(80, 24);
        for _ in 0..Confetti::DURATION_TICKS {
            confetti.update();
        }
        assert!(!confetti.is_active);
        assert!(confetti.pieces.is_empty());
    }

    #[test]
    fn test_pieces_removed_when_off_screen() {
        let mut confetti = Confetti::with_burst(ConfettiBurst {
            particle_count: 5,
            ..ConfettiBurst::default()
        });
        confetti.fire(20, 10);
        confetti.pieces[0].x = 100.0;
        confetti.pieces[0].vel_x = 0.0;
        confetti.update();
        assert!(confetti.pieces.len() <= 4);
        for piece in &confetti.pieces {
            assert!(piece.x <= 25.0 && piece.x >= -5.0);
        }
    }

    #[test]
    fn test_update_when_inactive_is_noop() {
        let mut confetti = Confetti::new();
        confetti.update();
        assert!(!confetti.is_active);
    }
}
