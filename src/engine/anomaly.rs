//! Feature construction for attendance anomaly detection.
//!
//! Each record becomes `[status_code, check_in_minutes, work_minutes]`.
//! Scoring is delegated to an [`OutlierDetector`]; the engine only owns the
//! features and the insufficient-data cutoff.

use crate::engine::aggregation::FlatRecord;
use crate::model::attendance::AttendanceStatus;

pub const MIN_RECORDS: usize = 10;
pub const DEFAULT_CONTAMINATION: f64 = 0.1;

pub type FeatureVector = [f64; 3];

pub trait OutlierDetector {
    /// Indices of `features` judged to be outliers, ascending.
    fn outliers(&self, features: &[FeatureVector], contamination: f64) -> Vec<usize>;
}

fn status_code(status: AttendanceStatus) -> f64 {
    match status {
        AttendanceStatus::Present => 0.0,
        AttendanceStatus::Late => 1.0,
        AttendanceStatus::HalfDay => 2.0,
        AttendanceStatus::Leave => 3.0,
        AttendanceStatus::Absent => 4.0,
    }
}

/// Missing check-in encodes as 0; missing either time gives 0 work minutes.
pub fn features(record: &FlatRecord) -> FeatureVector {
    let entry = record.to_entry();
    [
        status_code(record.status),
        record.check_in.map_or(0.0, |t| f64::from(t.minutes())),
        entry.work_duration_minutes().map_or(0.0, f64::from),
    ]
}

/// Outlier positions within the employee's own records (in input order),
/// or `None` when fewer than [`MIN_RECORDS`] exist for the employee.
pub fn anomaly_candidates<D: OutlierDetector + ?Sized>(
    employee_id: &str,
    records: &[FlatRecord],
    contamination: f64,
    detector: &D,
) -> Option<Vec<usize>> {
    let vectors: Vec<FeatureVector> = records
        .iter()
        .filter(|r| r.employee_id == employee_id)
        .map(features)
        .collect();

    if vectors.len() < MIN_RECORDS {
        return None;
    }

    Some(detector.outliers(&vectors, contamination))
}

/// Scores each vector by its distance from the mean after per-feature
/// standardisation and flags the top `contamination` share.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardScoreDetector;

impl OutlierDetector for StandardScoreDetector {
    fn outliers(&self, features: &[FeatureVector], contamination: f64) -> Vec<usize> {
        let n = features.len();
        if n == 0 {
            return Vec::new();
        }

        let mut mean = [0.0; 3];
        for v in features {
            for (m, x) in mean.iter_mut().zip(v) {
                *m += x;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n as f64);

        let mut std = [0.0; 3];
        for v in features {
            for ((s, x), m) in std.iter_mut().zip(v).zip(&mean) {
                *s += (x - m).powi(2) / n as f64;
            }
        }
        std.iter_mut().for_each(|s| *s = s.sqrt());

        let mut scored: Vec<(usize, f64)> = features
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let score = v
                    .iter()
                    .zip(&mean)
                    .zip(&std)
                    .map(|((x, m), s)| if *s > f64::EPSILON { ((x - m) / s).powi(2) } else { 0.0 })
                    .sum::<f64>()
                    .sqrt();
                (i, score)
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let budget = (n as f64 * contamination).ceil() as usize;
        let mut flagged: Vec<usize> = scored
            .into_iter()
            .take(budget)
            .filter(|(_, score)| *score > 0.0)
            .map(|(i, _)| i)
            .collect();
        flagged.sort_unstable();
        flagged
    }
}
