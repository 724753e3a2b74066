//! Cross-trial aggregation.
//!
//! A [`BatchAggregate`] keeps every per-trial sample and only orders them when
//! summarized, so the summary does not depend on the order trials finished or
//! how partial aggregates were merged. A metric a trial never recorded counts
//! as zero for that trial.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sim_core::{MetricKey, TrialMetrics, UnitId};

/// Distribution of one metric across a batch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub count: u64,
    pub mean: f64,
    /// Sample variance (n - 1 denominator); zero for a single trial.
    pub variance: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
}

impl MetricSummary {
    /// Summarizes `samples`, which must be sorted ascending. `None` if empty.
    pub fn from_sorted(samples: &[f64]) -> Option<Self> {
        let (&min, &max) = (samples.first()?, samples.last()?);
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = if samples.len() > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)
        } else {
            0.0
        };

        Some(Self {
            count: samples.len() as u64,
            mean,
            variance,
            std_dev: variance.sqrt(),
            min,
            max,
            p50: percentile(samples, 0.50),
            p90: percentile(samples, 0.90),
            p99: percentile(samples, 0.99),
        })
    }
}

/// Nearest-rank percentile of sorted, non-empty `samples`.
fn percentile(samples: &[f64], fraction: f64) -> f64 {
    let rank = (fraction * samples.len() as f64).ceil() as usize;
    samples[rank.clamp(1, samples.len()) - 1]
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    pub key: MetricKey,
    /// `unit#0.damage.ability#101`
    pub label: String,
    pub summary: MetricSummary,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitDps {
    pub unit: UnitId,
    pub summary: MetricSummary,
}

/// Final statistics of a batch, sorted by key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub trials: u64,
    pub metrics: Vec<MetricEntry>,
    pub dps: Vec<UnitDps>,
    pub events: MetricSummary,
}

impl BatchSummary {
    pub fn get(&self, key: &MetricKey) -> Option<&MetricSummary> {
        self.metrics
            .binary_search_by(|entry| entry.key.cmp(key))
            .ok()
            .map(|index| &self.metrics[index].summary)
    }

    pub fn dps_of(&self, unit: UnitId) -> Option<&MetricSummary> {
        self.dps
            .iter()
            .find(|entry| entry.unit == unit)
            .map(|entry| &entry.summary)
    }
}

/// Per-trial samples gathered so far.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchAggregate {
    trials: u64,
    metrics: BTreeMap<MetricKey, Vec<f64>>,
    dps: BTreeMap<UnitId, Vec<f64>>,
    events: Vec<f64>,
}

impl BatchAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn is_empty(&self) -> bool {
        self.trials == 0
    }

    /// Adds one finished trial.
    pub fn add_trial(&mut self, metrics: &TrialMetrics) {
        self.trials += 1;
        self.events.push(metrics.events() as f64);

        // Keys are ordered by unit first.
        let mut units = Vec::new();
        for (key, &value) in metrics.iter() {
            self.metrics.entry(*key).or_default().push(value);
            if units.last() != Some(&key.unit) {
                units.push(key.unit);
            }
        }
        for unit in units {
            self.dps.entry(unit).or_default().push(metrics.dps(unit));
        }
    }

    /// Folds `other` into `self`.
    pub fn merge(&mut self, other: BatchAggregate) {
        self.trials += other.trials;
        self.events.extend(other.events);
        for (key, samples) in other.metrics {
            self.metrics.entry(key).or_default().extend(samples);
        }
        for (unit, samples) in other.dps {
            self.dps.entry(unit).or_default().extend(samples);
        }
    }

    pub fn summarize(&self) -> BatchSummary {
        let metrics = self
            .metrics
            .iter()
            .filter_map(|(key, samples)| {
                Some(MetricEntry {
                    key: *key,
                    label: key.to_string(),
                    summary: self.summarize_samples(samples)?,
                })
            })
            .collect();
        let dps = self
            .dps
            .iter()
            .filter_map(|(&unit, samples)| {
                Some(UnitDps {
                    unit,
                    summary: self.summarize_samples(samples)?,
                })
            })
            .collect();
        let events = self.summarize_samples(&self.events).unwrap_or(MetricSummary {
            count: 0,
            mean: 0.0,
            variance: 0.0,
            std_dev: 0.0,
            min: 0.0,
            max: 0.0,
            p50: 0.0,
            p90: 0.0,
            p99: 0.0,
        });

        BatchSummary {
            trials: self.trials,
            metrics,
            dps,
            events,
        }
    }

    /// Pads `samples` with a zero for every trial that did not record it.
    fn summarize_samples(&self, samples: &[f64]) -> Option<MetricSummary> {
        let missing = (self.trials as usize).saturating_sub(samples.len());
        let mut sorted = Vec::with_capacity(samples.len() + missing);
        sorted.extend_from_slice(samples);
        sorted.resize(samples.len() + missing, 0.0);
        sorted.sort_by(f64::total_cmp);
        MetricSummary::from_sorted(&sorted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sim_core::{AbilityId, MetricKind, MetricSink, MetricSource};

    fn damage(unit: u32) -> MetricKey {
        MetricKey::new(UnitId(unit), MetricKind::Damage, MetricSource::Ability(AbilityId(1)))
    }

    fn trial(values: &[(MetricKey, f64)]) -> TrialMetrics {
        let mut metrics = TrialMetrics::new();
        for &(key, value) in values {
            metrics.record(key, value);
        }
        metrics
    }

    #[test]
    fn missing_metric_counts_as_zero() {
        let mut batch = BatchAggregate::new();
        batch.add_trial(&trial(&[(damage(0), 100.0)]));
        batch.add_trial(&trial(&[(damage(0), 300.0), (damage(1), 50.0)]));

        let summary = batch.summarize();
        assert_eq!(summary.trials, 2);
        assert_eq!(summary.get(&damage(0)).unwrap().mean, 200.0);
        let late = summary.get(&damage(1)).unwrap();
        assert_eq!((late.count, late.min, late.mean), (2, 0.0, 25.0));
        assert!(summary.get(&damage(2)).is_none());
    }

    #[test]
    fn summary_of_known_samples() {
        let samples: Vec<f64> = (1..=10).map(f64::from).collect();
        let summary = MetricSummary::from_sorted(&samples).unwrap();
        assert_eq!(summary.count, 10);
        assert_eq!(summary.mean, 5.5);
        assert!((summary.variance - 55.0 / 6.0).abs() < 1e-12);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 10.0);
        assert_eq!(summary.p50, 5.0);
        assert_eq!(summary.p90, 9.0);
        assert_eq!(summary.p99, 10.0);
    }

    #[test]
    fn single_sample_has_no_spread() {
        let summary = MetricSummary::from_sorted(&[42.0]).unwrap();
        assert_eq!(summary.variance, 0.0);
        assert_eq!(summary.p99, 42.0);
        assert!(MetricSummary::from_sorted(&[]).is_none());
    }

    proptest! {
        #[test]
        fn percentiles_are_ordered(mut samples in prop::collection::vec(-1e6f64..1e6, 1..200)) {
            samples.sort_by(f64::total_cmp);
            let s = MetricSummary::from_sorted(&samples).unwrap();
            prop_assert!(s.min <= s.p50 && s.p50 <= s.p90 && s.p90 <= s.p99 && s.p99 <= s.max);
            prop_assert!(s.variance >= 0.0);
        }

        #[test]
        fn merge_order_does_not_change_the_summary(
            values in prop::collection::vec((0u32..3, 0.0f64..1e4), 1..60),
            split in 0usize..60,
        ) {
            let trials: Vec<TrialMetrics> =
                values.iter().map(|&(unit, v)| trial(&[(damage(unit), v)])).collect();
            let split = split.min(trials.len());

            let mut sequential = BatchAggregate::new();
            for t in &trials {
                sequential.add_trial(t);
            }

            let mut left = BatchAggregate::new();
            let mut right = BatchAggregate::new();
            for t in &trials[..split] {
                left.add_trial(t);
            }
            for t in trials[split..].iter().rev() {
                right.add_trial(t);
            }
            right.merge(left);

            prop_assert_eq!(sequential.summarize(), right.summarize());
        }
    }
}
