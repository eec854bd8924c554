//! Statistical time-remaining estimate
//!
//! The estimate multiplies the mean observed per-file copy time by an
//! estimated count of remaining files, itself derived from the average size of
//! the folders seen so far. It does not look at which files in upcoming
//! folders are already present, so it can be far off when folder sizes vary a
//! lot or most upcoming files already exist.
//!
//! Both multipliers below are uncalibrated and can be overridden through the
//! `eta` section of the config file.

use std::fmt;
use std::time::Duration;

/// Overhead for remote directory scans that per-file timing does not capture
pub const DEFAULT_SCAN_OVERHEAD: f64 = 1.2;

/// Inflation of the average folder size; later rolls tend to be larger
pub const DEFAULT_FOLDER_SIZE_SKEW: f64 = 1.2;

/// An estimate of the remaining run time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Eta {
    /// No copy has been timed yet, or no folder has finished
    NotAvailable,
    Estimated { seconds: f64 },
}

impl Eta {
    pub fn seconds(&self) -> Option<f64> {
        match self {
            Eta::NotAvailable => None,
            Eta::Estimated { seconds } => Some(*seconds),
        }
    }
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eta::NotAvailable => write!(f, "Calculating..."),
            Eta::Estimated { seconds } => write!(f, "{} (approx)", format_duration(*seconds)),
        }
    }
}

/// Running sample of per-file copy durations for the whole run
#[derive(Debug, Clone)]
pub struct EtaEstimator {
    samples: Vec<Duration>,
    scan_overhead: f64,
    folder_size_skew: f64,
}

impl Default for EtaEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_OVERHEAD, DEFAULT_FOLDER_SIZE_SKEW)
    }
}

impl EtaEstimator {
    pub fn new(scan_overhead: f64, folder_size_skew: f64) -> Self {
        Self {
            samples: Vec::new(),
            scan_overhead,
            folder_size_skew,
        }
    }

    /// Append the duration of one successful copy
    pub fn record_sample(&mut self, duration: Duration) {
        self.samples.push(duration);
    }

    pub fn samples(&self) -> &[Duration] {
        &self.samples
    }

    /// Mean seconds per file, if any sample exists
    pub fn average_seconds_per_file(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let total: f64 = self.samples.iter().map(Duration::as_secs_f64).sum();
        Some(total / self.samples.len() as f64)
    }

    /// Skewed average folder size, to feed [`estimate_remaining`](Self::estimate_remaining)
    ///
    /// Zero when no folder seen so far contained files.
    pub fn average_files_per_folder(&self, files_seen: usize, folders_with_files: usize) -> f64 {
        if folders_with_files == 0 {
            return 0.0;
        }
        files_seen as f64 / folders_with_files as f64 * self.folder_size_skew
    }

    pub fn estimate_remaining(
        &self,
        folders_done: usize,
        folders_total: usize,
        avg_files_per_folder: f64,
    ) -> Eta {
        let Some(avg_seconds) = self.average_seconds_per_file() else {
            return Eta::NotAvailable;
        };
        if folders_done == 0 {
            return Eta::NotAvailable;
        }

        let folders_remaining = folders_total.saturating_sub(folders_done);
        let files_remaining = folders_remaining as f64 * avg_files_per_folder;

        Eta::Estimated {
            seconds: files_remaining * avg_seconds * self.scan_overhead,
        }
    }
}

/// Render seconds as "N seconds", "M minutes and S seconds" or
/// "H hours and M minutes", truncating each unit
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };

    if !seconds.is_finite() || seconds < 60.0 {
        format!("{} seconds", total)
    } else if seconds < 3600.0 {
        format!("{} minutes and {} seconds", total / 60, total % 60)
    } else {
        format!("{} hours and {} minutes", total / 3600, (total % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_available_without_samples() {
        let estimator = EtaEstimator::default();

        assert_eq!(estimator.estimate_remaining(0, 10, 5.0), Eta::NotAvailable);
        assert_eq!(estimator.estimate_remaining(3, 10, 5.0), Eta::NotAvailable);
        assert_eq!(estimator.estimate_remaining(9, 10, 100.0), Eta::NotAvailable);
        assert_eq!(Eta::NotAvailable.to_string(), "Calculating...");
    }

    #[test]
    fn test_not_available_before_first_folder() {
        let mut estimator = EtaEstimator::default();
        estimator.record_sample(Duration::from_secs(1));

        assert_eq!(estimator.estimate_remaining(0, 4, 10.0), Eta::NotAvailable);
    }

    #[test]
    fn test_single_sample_estimate() {
        let mut estimator = EtaEstimator::default();
        estimator.record_sample(Duration::from_secs_f64(2.0));

        let eta = estimator.estimate_remaining(1, 2, 10.0);
        let seconds = eta.seconds().unwrap();

        assert!((seconds - 24.0).abs() < 1e-9);
        assert_eq!(format_duration(seconds), "24 seconds");
        assert_eq!(eta.to_string(), "24 seconds (approx)");
    }

    #[test]
    fn test_mean_over_samples() {
        let mut estimator = EtaEstimator::new(1.0, 1.0);
        estimator.record_sample(Duration::from_secs(1));
        estimator.record_sample(Duration::from_secs(3));

        assert_eq!(estimator.average_seconds_per_file(), Some(2.0));
        assert_eq!(estimator.samples().len(), 2);

        let eta = estimator.estimate_remaining(2, 5, 4.0);
        assert_eq!(eta.seconds(), Some(24.0));
    }

    #[test]
    fn test_average_files_per_folder() {
        let estimator = EtaEstimator::default();

        assert_eq!(estimator.average_files_per_folder(0, 0), 0.0);
        let avg = estimator.average_files_per_folder(30, 3);
        assert!((avg - 12.0).abs() < 1e-9);

        let unskewed = EtaEstimator::new(1.2, 1.0);
        assert_eq!(unskewed.average_files_per_folder(30, 3), 10.0);
    }

    #[test]
    fn test_no_folders_remaining() {
        let mut estimator = EtaEstimator::default();
        estimator.record_sample(Duration::from_secs(5));

        assert_eq!(estimator.estimate_remaining(3, 3, 10.0).seconds(), Some(0.0));
    }

    #[test]
    fn test_format_boundaries() {
        assert_eq!(format_duration(0.0), "0 seconds");
        assert_eq!(format_duration(59.0), "59 seconds");
        assert_eq!(format_duration(59.99), "59 seconds");
        assert_eq!(format_duration(60.0), "1 minutes and 0 seconds");
        assert_eq!(format_duration(3599.0), "59 minutes and 59 seconds");
        assert_eq!(format_duration(3600.0), "1 hours and 0 minutes");
        assert_eq!(format_duration(7325.0), "2 hours and 2 minutes");
    }

    #[test]
    fn test_format_non_finite() {
        assert_eq!(format_duration(f64::NAN), "0 seconds");
        assert_eq!(format_duration(f64::INFINITY), "0 seconds");
        assert_eq!(format_duration(f64::NEG_INFINITY), "0 seconds");
        assert_eq!(format_duration(-5.0), "0 seconds");
    }
}
