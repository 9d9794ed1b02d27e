use crate::workflow::config::ScenarioConfig;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Seeded source of synthetic smoke and temperature readings.
pub struct ReadingProfile {
    rng: StdRng,
    smoke_baseline: f64,
    smoke_noise: f64,
    smoke_spike: f64,
    spike_after_ticks: Option<u32>,
    temp_ambient: f64,
    temp_ramp: f64,
    smoke_ticks: u32,
    temp_checks: u32,
}

impl ReadingProfile {
    pub fn new(config: &ScenarioConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            smoke_baseline: config.smoke_baseline,
            smoke_noise: config.smoke_noise.abs(),
            smoke_spike: config.smoke_spike,
            spike_after_ticks: config.spike_after_ticks,
            temp_ambient: config.temp_ambient,
            temp_ramp: config.temp_ramp,
            smoke_ticks: 0,
            temp_checks: 0,
        }
    }

    fn jitter(&mut self, amplitude: f64) -> f64 {
        if amplitude > 0.0 {
            self.rng.gen_range(-amplitude..amplitude)
        } else {
            0.0
        }
    }

    /// Baseline plus noise until the configured tick, the spike value after it.
    pub fn next_smoke(&mut self) -> f64 {
        self.smoke_ticks += 1;
        let spiking = self
            .spike_after_ticks
            .map(|after| self.smoke_ticks > after)
            .unwrap_or(false);
        let noise = self.jitter(self.smoke_noise);
        let level = if spiking {
            self.smoke_spike + noise.abs()
        } else {
            self.smoke_baseline + noise
        };
        level.max(0.0).round()
    }

    /// Temperature climbs by the ramp on every fallback check.
    pub fn next_temperature(&mut self) -> f64 {
        self.temp_checks += 1;
        let noise = self.jitter(0.5);
        let value = self.temp_ambient + self.temp_ramp * self.temp_checks as f64 + noise;
        (value * 10.0).round() / 10.0
    }

    /// Starts a fresh smoke/temperature episode after the pipeline loops back.
    pub fn reset_episode(&mut self) {
        self.smoke_ticks = 0;
        self.temp_checks = 0;
    }
}
