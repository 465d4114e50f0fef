/// Wall-clock instant of the current tick or handler, captured once so
/// every decision inside one critical section sees the same time.
/// Tests fabricate values directly.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GameTime {
    pub now_ms: i64,
}

impl GameTime {
    pub fn now() -> Self {
        Self {
            now_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn from_ms(now_ms: i64) -> Self {
        Self { now_ms }
    }

    pub fn seconds_since(&self, past_ms: i64) -> f32 {
        (self.now_ms - past_ms) as f32 / 1000.0
    }

    pub fn plus_seconds(&self, seconds: f32) -> i64 {
        self.now_ms + (seconds * 1000.0) as i64
    }
}
