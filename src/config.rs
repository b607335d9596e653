//! System configuration parameters.
//!
//! All tunable parameters for the logger.  Values can be overridden via NVS;
//! the defaults reproduce the original field deployment (61 samples per slot,
//! half-hour cadence inside three daily windows, light sleep overnight).

use serde::{Deserialize, Serialize};

use crate::scheduler::SchedulerPolicy;

/// Maximum length of the site tag used in record rows and file names.
pub const MAX_SITE_LEN: usize = 16;

/// Core logger configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Deployment site tag.  Empty = no site column in records and no site
    /// prefix on file names.
    pub site: heapless::String<MAX_SITE_LEN>,
    /// Which slots are due and when.
    pub scheduler: SchedulerPolicy,
    /// How one acquisition cycle samples the sensor.
    pub sampling: SamplingConfig,
    /// Sleep-mode selection and timing.
    pub power: PowerPolicy,
}

/// Parameters of the purge → settle → sample pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Samples per batch.  Must be odd so the production batch has a true
    /// middle element.
    pub sample_count: u16,
    /// Wait between consecutive samples (milliseconds).
    pub sample_interval_ms: u32,
    /// Per-frame response timeout (milliseconds).
    pub frame_timeout_ms: u32,
    /// Fan run time before sampling (seconds).
    pub purge_secs: u16,
    /// Still-air settle delay after the fan stops (milliseconds).
    pub settle_ms: u32,
    /// Plausible concentration bounds (ppm, inclusive).  Values outside are
    /// recorded as invalid samples.
    pub ppm_min: u16,
    pub ppm_max: u16,
}

impl SamplingConfig {
    /// Floor for the derived watchdog timeout (milliseconds).
    pub const WDT_FLOOR_MS: u32 = 10_000;

    /// Watchdog timeout derived from the sampling budget: four times the
    /// longest single blocking wait of a cycle — one frame timeout plus one
    /// inter-sample interval, or the settle delay, whichever is larger —
    /// never below [`Self::WDT_FLOOR_MS`].
    pub fn watchdog_timeout_ms(&self) -> u32 {
        let per_sample = self.frame_timeout_ms.saturating_add(self.sample_interval_ms);
        per_sample
            .max(self.settle_ms)
            .saturating_mul(4)
            .max(Self::WDT_FLOOR_MS)
    }
}

/// Sleep-mode policy for the power state controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerPolicy {
    /// Start of the daytime span (inclusive), e.g. 06:30.
    pub day_start_hour: u8,
    pub day_start_min: u8,
    /// End of the daytime span (exclusive), e.g. 18:30.
    pub day_end_hour: u8,
    pub day_end_min: u8,
    /// Computed sleep durations below this are implausible (the boundary is
    /// effectively now) — fall back instead of spinning.
    pub guard_secs: u32,
    /// Sleep duration used whenever the real one cannot be computed.
    pub fallback_secs: u32,
    /// Opt-in: power the whole process down between cycles.  Always arms
    /// both a timer wake and the operator button wake.
    pub deep_sleep: bool,
    /// How long a button wake keeps the system awake with the preview path
    /// live (seconds).
    pub operator_window_secs: u32,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            site: heapless::String::new(),
            scheduler: SchedulerPolicy::default(),
            sampling: SamplingConfig::default(),
            power: PowerPolicy::default(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            sample_count: 61,
            sample_interval_ms: 1000,
            frame_timeout_ms: 1000,
            purge_secs: 9,
            settle_ms: 2000,
            ppm_min: 300,
            ppm_max: 5000,
        }
    }
}

impl Default for PowerPolicy {
    fn default() -> Self {
        Self {
            day_start_hour: 6,
            day_start_min: 30,
            day_end_hour: 18,
            day_end_min: 30,
            guard_secs: 5,
            fallback_secs: 60,
            deep_sleep: false,
            operator_window_secs: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::SlotCadence;

    #[test]
    fn default_config_is_sane() {
        let c = LoggerConfig::default();
        assert!(c.sampling.sample_count % 2 == 1, "batch must be odd");
        assert!(c.sampling.ppm_min < c.sampling.ppm_max);
        assert!(c.sampling.purge_secs > 0);
        assert!(c.power.guard_secs < c.power.fallback_secs);
        assert_eq!(c.scheduler.cadence, SlotCadence::HalfHour);
        assert_eq!(c.scheduler.windows.len(), 3);
        assert!(c.site.is_empty());
    }

    #[test]
    fn serde_roundtrip() {
        let mut c = LoggerConfig::default();
        c.site.push_str("greenhouse-2").unwrap();
        let json = serde_json::to_string(&c).unwrap();
        let c2: LoggerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn postcard_roundtrip() {
        let c = LoggerConfig::default();
        let bytes = postcard::to_allocvec(&c).unwrap();
        let c2: LoggerConfig = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn watchdog_timeout_tracks_sampling_budget() {
        // Default budget (1 s timeout + 1 s interval) sits on the floor.
        let c = SamplingConfig::default();
        assert_eq!(c.watchdog_timeout_ms(), SamplingConfig::WDT_FLOOR_MS);
        assert!(c.watchdog_timeout_ms() > 4 * (c.frame_timeout_ms + c.sample_interval_ms));

        // A slow bench profile pushes the timeout up with it.
        let slow = SamplingConfig {
            frame_timeout_ms: 5_000,
            sample_interval_ms: 10_000,
            ..SamplingConfig::default()
        };
        assert_eq!(slow.watchdog_timeout_ms(), 60_000);

        // A long settle delay is itself a single blocking wait.
        let settled = SamplingConfig {
            settle_ms: 30_000,
            ..SamplingConfig::default()
        };
        assert_eq!(settled.watchdog_timeout_ms(), 120_000);
    }
}
