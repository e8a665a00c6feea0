//! Process resource usage, logged after each cycle phase with `--monitor`.

#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

/// CPU and resident memory of this process at one point in a cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSample {
    pub cpu_percent: f32,
    pub resident_mb: u64,
}

#[cfg(feature = "cli")]
pub struct SystemMonitor {
    /// `None` when monitoring is off or the own pid is unknown.
    sampler: Option<Mutex<(System, Pid)>>,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let sampler = if enabled {
            sysinfo::get_current_pid()
                .ok()
                .map(|pid| Mutex::new((System::new(), pid)))
        } else {
            None
        };
        Self { sampler }
    }

    pub fn is_enabled(&self) -> bool {
        self.sampler.is_some()
    }

    pub fn sample(&self) -> Option<ResourceSample> {
        let mut sampler = self.sampler.as_ref()?.lock().ok()?;
        let (system, pid) = &mut *sampler;
        system.refresh_processes(ProcessesToUpdate::Some(&[*pid]), true);

        let process = system.process(*pid)?;
        Some(ResourceSample {
            cpu_percent: process.cpu_usage(),
            resident_mb: process.memory() / 1024 / 1024,
        })
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(sample) = self.sample() {
            tracing::info!(
                phase,
                cpu_percent = sample.cpu_percent,
                resident_mb = sample.resident_mb,
                "📊 Resource usage"
            );
        }
    }
}

#[cfg(not(feature = "cli"))]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn is_enabled(&self) -> bool {
        false
    }

    pub fn sample(&self) -> Option<ResourceSample> {
        None
    }

    pub fn log_stats(&self, _phase: &str) {}
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_takes_no_samples() {
        let monitor = SystemMonitor::new(false);
        assert!(!monitor.is_enabled());
        assert!(monitor.sample().is_none());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_enabled_monitor_samples_own_process() {
        let monitor = SystemMonitor::new(true);
        assert!(monitor.is_enabled());

        let sample = monitor.sample().unwrap();
        assert!(sample.resident_mb < 1024 * 1024);
        assert!(sample.cpu_percent >= 0.0);
    }
}
