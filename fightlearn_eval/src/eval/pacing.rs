use std::thread;
use std::time::{Duration, Instant};

pub const DEFAULT_FPS: f64 = 90.0;

/// Holds the loop to a fixed frame rate by sleeping whatever is left of the frame budget
/// since the previous frame.
#[derive(Debug)]
pub struct FramePacer {
    budget: Duration,
    last_frame: Option<Instant>,
}

impl FramePacer {
    /// A non-positive or non-finite `fps` disables pacing.
    pub fn new(fps: f64) -> Self {
        let budget = if fps.is_finite() && fps > 0.0 {
            Duration::from_secs_f64(1.0 / fps)
        } else {
            Duration::ZERO
        };
        Self {
            budget,
            last_frame: None,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn shortfall(&self, elapsed: Duration) -> Duration {
        self.budget.saturating_sub(elapsed)
    }

    pub fn wait(&mut self) {
        if let Some(last_frame) = self.last_frame {
            let shortfall = self.shortfall(last_frame.elapsed());
            if !shortfall.is_zero() {
                thread::sleep(shortfall);
            }
        }
        self.last_frame = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortfall() {
        let pacer = FramePacer::new(100.0);
        assert_eq!(pacer.budget(), Duration::from_millis(10));
        assert_eq!(
            pacer.shortfall(Duration::from_millis(4)),
            Duration::from_millis(6)
        );
        assert_eq!(pacer.shortfall(Duration::from_millis(25)), Duration::ZERO);
    }

    #[test]
    fn test_zero_fps_disables_pacing() {
        let mut pacer = FramePacer::new(0.0);
        assert_eq!(pacer.shortfall(Duration::ZERO), Duration::ZERO);
        let start = Instant::now();
        pacer.wait();
        pacer.wait();
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_wait_holds_frame_rate() {
        let mut pacer = FramePacer::new(50.0);
        pacer.wait();
        let start = Instant::now();
        pacer.wait();
        assert!(start.elapsed() >= Duration::from_millis(15));
    }
}
