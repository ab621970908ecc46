//! Plateau search over a single heating-step series.
//!
//! For every non-excluded start step we scan forward over non-excluded end
//! steps:
//!
//! ```text
//! overlap(start, end)     fails -> stop scanning this start
//! nsteps(start, end)      fails -> try the next end
//! released(start, end)    fails -> try the next end
//! otherwise               end becomes the furthest end for this start
//! ```
//!
//! Each start yields at most one candidate `(start, furthest_end)`. The widest
//! candidate (`end - start`) wins; on ties the earliest start is kept.

use log::debug;

use crate::domain::{ExcludedSet, PlateauConfig, PlateauSpan, StepSeries, check_lengths};
use crate::error::PlateauError;

/// Borrowed view of one step series prepared for the search.
///
/// The total signal is computed once at construction and stays fixed for the
/// lifetime of the finder.
#[derive(Debug, Clone)]
pub struct PlateauFinder<'a> {
    ages: &'a [f64],
    errors: &'a [f64],
    signals: &'a [f64],
    exclude: &'a ExcludedSet,
    config: PlateauConfig,
    total_signal: f64,
}

impl<'a> PlateauFinder<'a> {
    pub fn new(
        ages: &'a [f64],
        errors: &'a [f64],
        signals: &'a [f64],
        exclude: &'a ExcludedSet,
        config: PlateauConfig,
    ) -> Result<Self, PlateauError> {
        check_lengths(ages, errors, signals)?;
        config.validate()?;

        let total_signal = signals
            .iter()
            .enumerate()
            .filter(|(i, _)| !exclude.contains(*i))
            .map(|(_, s)| s)
            .sum();

        Ok(Self {
            ages,
            errors,
            signals,
            exclude,
            config,
            total_signal,
        })
    }

    pub fn len(&self) -> usize {
        self.ages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ages.is_empty()
    }

    /// Sum of signals over non-excluded steps.
    pub fn total_signal(&self) -> f64 {
        self.total_signal
    }

    pub fn config(&self) -> &PlateauConfig {
        &self.config
    }

    /// Run the search and return the widest qualifying span.
    pub fn find(&self) -> Option<PlateauSpan> {
        let best = select_widest(self.candidates());
        match best {
            Some(span) => debug!("plateau selected: steps {}..={}", span.start, span.end),
            None => debug!("no plateau among {} steps", self.len()),
        }
        best
    }

    /// All per-start candidates in scan order.
    pub fn candidates(&self) -> Vec<PlateauSpan> {
        (0..self.len())
            .filter(|&start| !self.exclude.contains(start))
            .filter_map(|start| self.scan_from(start).map(|end| PlateauSpan::new(start, end)))
            .collect()
    }

    /// Furthest qualifying end for `start`, if any.
    fn scan_from(&self, start: usize) -> Option<usize> {
        let mut potential_end = None;
        for end in start..self.len() {
            if self.exclude.contains(end) {
                continue;
            }
            if !self.check_overlap(start, end) {
                debug!("start {start}: overlap failed at {end}");
                break;
            }
            if !self.check_nsteps(start, end) {
                continue;
            }
            if !self.check_percent_released(start, end) {
                continue;
            }
            potential_end = Some(end);
        }
        potential_end
    }

    /// Whether the `overlap_sigma`-widened error bars of `start` and `end`
    /// intersect. Touching bars do not overlap.
    pub fn check_overlap(&self, start: usize, end: usize) -> bool {
        let sigma = self.config.overlap_sigma;
        let (a1, a2) = (self.ages[start], self.ages[end]);
        let e1 = self.errors[start] * sigma;
        let e2 = self.errors[end] * sigma;
        a1 - e1 < a2 + e2 && a1 + e1 > a2 - e2
    }

    /// `end - start >= nsteps`, with at least `nsteps` non-excluded steps in
    /// the span.
    pub fn check_nsteps(&self, start: usize, end: usize) -> bool {
        let nsteps = self.config.nsteps;
        if end - start < nsteps {
            return false;
        }
        let valid = (start..=end).filter(|&i| !self.exclude.contains(i)).count();
        valid >= nsteps
    }

    /// Whether the span releases at least `min_fraction_released` of the
    /// total signal. Always false when the total is not positive.
    pub fn check_percent_released(&self, start: usize, end: usize) -> bool {
        self.fraction_released(start, end)
            .is_some_and(|f| f >= self.config.min_fraction_released)
    }

    /// Signal in `[start, end]` over the total signal.
    ///
    /// Every index of the literal span is summed, excluded or not.
    pub fn fraction_released(&self, start: usize, end: usize) -> Option<f64> {
        if !(self.total_signal > 0.0) {
            return None;
        }
        let span: f64 = self.signals[start..=end].iter().sum();
        Some(span / self.total_signal)
    }
}

/// Widest span; the first one seen wins ties.
pub fn select_widest<I>(candidates: I) -> Option<PlateauSpan>
where
    I: IntoIterator<Item = PlateauSpan>,
{
    let mut best: Option<PlateauSpan> = None;
    for candidate in candidates {
        if best.is_none_or(|b| candidate.width() > b.width()) {
            best = Some(candidate);
        }
    }
    best
}

/// Find the plateau span in parallel `ages`/`errors`/`signals` columns.
///
/// Returns `Ok(None)` when no span qualifies (including empty input, all
/// steps excluded, or zero total signal).
pub fn find_plateau(
    ages: &[f64],
    errors: &[f64],
    signals: &[f64],
    exclude: &ExcludedSet,
    config: &PlateauConfig,
) -> Result<Option<PlateauSpan>, PlateauError> {
    let finder = PlateauFinder::new(ages, errors, signals, exclude, *config)?;
    Ok(finder.find())
}

/// [`find_plateau`] over a [`StepSeries`].
pub fn find_plateau_in(
    series: &StepSeries,
    exclude: &ExcludedSet,
    config: &PlateauConfig,
) -> Result<Option<PlateauSpan>, PlateauError> {
    let (ages, errors, signals) = (series.ages(), series.errors(), series.signals());
    find_plateau(&ages, &errors, &signals, exclude, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand::rngs::StdRng;

    fn run(
        ages: &[f64],
        errors: &[f64],
        signals: &[f64],
        exclude: &[usize],
        config: PlateauConfig,
    ) -> Option<PlateauSpan> {
        let exclude: ExcludedSet = exclude.iter().copied().collect();
        find_plateau(ages, errors, signals, &exclude, &config).unwrap()
    }

    #[test]
    fn finds_leading_plateau_before_outlier() {
        let ages = [10.0, 10.0, 10.0, 10.0, 50.0];
        let errors = [1.0; 5];
        let signals = [10.0; 5];

        let span = run(&ages, &errors, &signals, &[], PlateauConfig::default());
        assert_eq!(span, Some(PlateauSpan::new(0, 3)));
    }

    #[test]
    fn excluded_step_inside_span_is_skipped() {
        let ages = [10.0, 10.0, 10.0, 10.0, 50.0];
        let errors = [1.0; 5];
        let signals = [10.0; 5];
        let exclude = ExcludedSet::from([2]);

        let finder =
            PlateauFinder::new(&ages, &errors, &signals, &exclude, PlateauConfig::default()).unwrap();
        assert_eq!(finder.total_signal(), 40.0);
        assert!(finder.check_nsteps(0, 3));
        assert_eq!(finder.fraction_released(0, 3), Some(1.0));

        let span = finder.find().unwrap();
        assert_eq!(span, PlateauSpan::new(0, 3));
        let used: Vec<usize> = span.included_steps(&exclude).collect();
        assert_eq!(used, vec![0, 1, 3]);
    }

    #[test]
    fn empty_series_has_no_plateau() {
        assert_eq!(run(&[], &[], &[], &[], PlateauConfig::default()), None);
    }

    #[test]
    fn all_excluded_has_no_plateau() {
        let ages = [10.0; 6];
        let errors = [1.0; 6];
        let signals = [5.0; 6];
        let span = run(&ages, &errors, &signals, &[0, 1, 2, 3, 4, 5], PlateauConfig::default());
        assert_eq!(span, None);
    }

    #[test]
    fn zero_total_signal_has_no_plateau() {
        let ages = [10.0; 6];
        let errors = [1.0; 6];
        let signals = [0.0; 6];
        assert_eq!(run(&ages, &errors, &signals, &[], PlateauConfig::default()), None);
    }

    #[test]
    fn mismatched_lengths_are_invalid_input() {
        let exclude = ExcludedSet::new();
        let err = find_plateau(&[1.0, 2.0], &[0.1, 0.1], &[1.0], &exclude, &PlateauConfig::default())
            .unwrap_err();
        assert!(matches!(err, PlateauError::InvalidInput(_)));
    }

    #[test]
    fn negative_overlap_sigma_is_invalid_input() {
        let exclude = ExcludedSet::new();
        let config = PlateauConfig::default().with_overlap_sigma(-2.0);
        let err = find_plateau(&[1.0], &[0.1], &[1.0], &exclude, &config).unwrap_err();
        assert!(matches!(err, PlateauError::InvalidInput(_)));
    }

    #[test]
    fn touching_error_bars_do_not_overlap() {
        // 10 + 2*1 == 14 - 2*1
        let ages = [10.0, 14.0];
        let errors = [1.0, 1.0];
        let signals = [1.0, 1.0];
        let exclude = ExcludedSet::new();
        let finder =
            PlateauFinder::new(&ages, &errors, &signals, &exclude, PlateauConfig::default()).unwrap();
        assert!(!finder.check_overlap(0, 1));
        assert!(!finder.check_overlap(1, 0));

        let ages = [10.0, 13.999];
        let finder =
            PlateauFinder::new(&ages, &errors, &signals, &exclude, PlateauConfig::default()).unwrap();
        assert!(finder.check_overlap(0, 1));
    }

    #[test]
    fn touching_bars_end_the_plateau() {
        let ages = [10.0, 10.0, 10.0, 14.0, 14.0];
        let errors = [1.0; 5];
        let signals = [10.0; 5];
        let config = PlateauConfig::default().with_nsteps(2);
        assert_eq!(run(&ages, &errors, &signals, &[], config), Some(PlateauSpan::new(0, 2)));
    }

    #[test]
    fn exactly_half_the_signal_qualifies() {
        // Two disjoint equal-width runs, each releasing exactly 50%.
        let ages = [10.0, 10.0, 10.0, 10.0, 50.0, 50.0, 50.0, 50.0];
        let errors = [1.0; 8];
        let signals = [1.0; 8];
        let span = run(&ages, &errors, &signals, &[], PlateauConfig::default());
        assert_eq!(span, Some(PlateauSpan::new(0, 3)));
    }

    #[test]
    fn just_under_half_the_signal_does_not_qualify() {
        let ages = [10.0, 10.0, 10.0, 10.0, 50.0, 50.0, 50.0, 50.0];
        let errors = [1.0; 8];
        let signals = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0001];

        let exclude = ExcludedSet::new();
        let finder =
            PlateauFinder::new(&ages, &errors, &signals, &exclude, PlateauConfig::default()).unwrap();
        assert!(!finder.check_percent_released(0, 3));
        assert!(finder.check_percent_released(4, 7));
        assert_eq!(finder.find(), Some(PlateauSpan::new(4, 7)));
    }

    #[test]
    fn equal_width_tie_goes_to_earliest_start() {
        let ages = [10.0, 10.0, 10.0, 10.0, 50.0, 50.0, 50.0, 50.0];
        let errors = [1.0; 8];
        let signals = [1.0; 8];
        let exclude = ExcludedSet::new();
        let finder =
            PlateauFinder::new(&ages, &errors, &signals, &exclude, PlateauConfig::default()).unwrap();

        let candidates = finder.candidates();
        assert_eq!(candidates, vec![PlateauSpan::new(0, 3), PlateauSpan::new(4, 7)]);
        assert_eq!(finder.find(), Some(PlateauSpan::new(0, 3)));
    }

    #[test]
    fn select_widest_prefers_wider_then_first() {
        let picked = select_widest([
            PlateauSpan::new(0, 2),
            PlateauSpan::new(1, 5),
            PlateauSpan::new(3, 7),
        ]);
        assert_eq!(picked, Some(PlateauSpan::new(1, 5)));
        assert_eq!(select_widest(Vec::new()), None);
    }

    #[test]
    fn overlap_failure_stops_the_scan_for_that_start() {
        // Step 1 breaks the scan from 0 even though steps 2..=4 agree with 0.
        let ages = [10.0, 30.0, 10.0, 10.0, 10.0];
        let errors = [1.0; 5];
        let signals = [10.0; 5];
        let config = PlateauConfig::default().with_nsteps(2);
        assert_eq!(run(&ages, &errors, &signals, &[], config), Some(PlateauSpan::new(2, 4)));
    }

    #[test]
    fn excluding_the_outlier_restores_the_full_span() {
        let ages = [10.0, 30.0, 10.0, 10.0, 10.0];
        let errors = [1.0; 5];
        let signals = [10.0; 5];
        let config = PlateauConfig::default().with_nsteps(2);
        assert_eq!(run(&ages, &errors, &signals, &[1], config), Some(PlateauSpan::new(0, 4)));
    }

    #[test]
    fn too_few_valid_steps_never_qualify() {
        // Span 0..=3 has width 3 but only two valid steps.
        let ages = [10.0; 4];
        let errors = [1.0; 4];
        let signals = [10.0; 4];
        assert_eq!(run(&ages, &errors, &signals, &[1, 2], PlateauConfig::default()), None);
    }

    #[test]
    fn zero_nsteps_allows_single_step_at_index_zero() {
        let ages = [10.0, 50.0];
        let errors = [1.0, 1.0];
        let signals = [10.0, 1.0];
        let config = PlateauConfig::default().with_nsteps(0);
        assert_eq!(run(&ages, &errors, &signals, &[], config), Some(PlateauSpan::new(0, 0)));
    }

    #[test]
    fn search_is_deterministic() {
        let ages = [10.1, 10.3, 9.9, 10.0, 10.2, 12.5, 10.1];
        let errors = [0.2, 0.1, 0.3, 0.1, 0.2, 0.1, 0.4];
        let signals = [1.0, 4.0, 6.0, 8.0, 5.0, 2.0, 1.0];
        let first = run(&ages, &errors, &signals, &[6], PlateauConfig::default());
        for _ in 0..10 {
            assert_eq!(run(&ages, &errors, &signals, &[6], PlateauConfig::default()), first);
        }
    }

    #[test]
    fn results_respect_every_predicate_on_random_series() {
        let mut rng = StdRng::seed_from_u64(7);
        for trial in 0..200 {
            let n = rng.gen_range(0..16);
            let ages: Vec<f64> = (0..n).map(|_| rng.gen_range(9.0..11.0)).collect();
            let errors: Vec<f64> = (0..n).map(|_| rng.gen_range(0.05..0.6)).collect();
            let signals: Vec<f64> = (0..n).map(|_| rng.gen_range(0.0..10.0)).collect();
            let exclude: ExcludedSet = (0..n).filter(|_| rng.gen_bool(0.15)).collect();
            let nsteps = rng.gen_range(1..6);
            let config = PlateauConfig::default().with_nsteps(nsteps);

            let finder = PlateauFinder::new(&ages, &errors, &signals, &exclude, config).unwrap();
            let Some(span) = finder.find() else {
                continue;
            };

            assert!(span.start <= span.end && span.end < n, "trial {trial}");
            assert!(!exclude.contains(span.start) && !exclude.contains(span.end));
            assert!(span.width() >= nsteps, "trial {trial}: width below nsteps");
            assert!(span.included_steps(&exclude).count() >= nsteps);
            assert!(finder.check_overlap(span.start, span.end));
            assert!(finder.check_percent_released(span.start, span.end));

            let widest = finder.candidates().iter().map(|c| c.width()).max();
            assert_eq!(widest, Some(span.width()));
        }
    }
}
