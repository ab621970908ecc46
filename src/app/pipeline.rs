//! Shared plateau pipeline: search + age for each analysis group.
//!
//! Groups are independent, so they are processed in parallel; output order
//! matches input order.

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::domain::{ExcludedSet, GroupOutcome, PlateauConfig};
use crate::error::PlateauError;
use crate::io::ingest::AnalysisGroup;
use crate::plateau::{find_plateau_in, plateau_age, step_statuses};

/// Run the search for one group.
pub fn process_group(group: &AnalysisGroup, config: &PlateauConfig) -> Result<GroupOutcome, PlateauError> {
    let span = find_plateau_in(&group.series, &group.exclude, config)?;
    let age = match span {
        Some(span) => match plateau_age(&group.series, span, &group.exclude) {
            Ok(age) => Some(age),
            Err(PlateauError::Numeric(message)) => {
                warn!("{}: plateau age unavailable: {message}", group.name);
                None
            }
            Err(err) => return Err(err),
        },
        None => None,
    };

    match (&span, &age) {
        (Some(s), Some(a)) => info!(
            "{}: plateau steps {}..={} age {:.4} \u{00b1} {:.4}",
            group.name, s.start, s.end, a.age, a.error
        ),
        (Some(s), None) => info!("{}: plateau steps {}..={} without age", group.name, s.start, s.end),
        _ => info!("{}: no plateau", group.name),
    }

    Ok(GroupOutcome {
        group: group.name.clone(),
        labels: group.labels.clone(),
        span,
        statuses: step_statuses(group.series.len(), span, &group.exclude),
        age,
    })
}

/// Run the search for every group, in parallel.
pub fn process_groups(
    groups: &[AnalysisGroup],
    config: &PlateauConfig,
) -> Result<Vec<GroupOutcome>, PlateauError> {
    debug!("processing {} groups", groups.len());
    groups.par_iter().map(|g| process_group(g, config)).collect()
}

/// Add `extra` indices to every group's excluded set.
pub fn apply_extra_exclusions(groups: &mut [AnalysisGroup], extra: &[usize]) {
    if extra.is_empty() {
        return;
    }
    for group in groups {
        let merged: ExcludedSet = group.exclude.iter().chain(extra.iter().copied()).collect();
        group.exclude = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PlateauSpan, Step, StepSeries, StepStatus};

    fn group(name: &str, ages: &[f64]) -> AnalysisGroup {
        let mut g = AnalysisGroup::new(name);
        g.labels = (0..ages.len()).map(crate::domain::step_letter).collect();
        g.series = StepSeries::new(ages.iter().map(|&a| Step::new(a, 1.0, 10.0)).collect());
        g
    }

    #[test]
    fn outcomes_keep_group_order() {
        let groups: Vec<AnalysisGroup> = (0..8)
            .map(|i| group(&format!("G{i}"), &[10.0, 10.0, 10.0, 10.0, 50.0]))
            .collect();
        let outcomes = process_groups(&groups, &PlateauConfig::default()).unwrap();

        let names: Vec<&str> = outcomes.iter().map(|o| o.group.as_str()).collect();
        assert_eq!(names, vec!["G0", "G1", "G2", "G3", "G4", "G5", "G6", "G7"]);
        for o in &outcomes {
            assert_eq!(o.span, Some(PlateauSpan::new(0, 3)));
            assert_eq!(o.span_label().as_deref(), Some("A-D"));
            let age = o.age.unwrap();
            assert!((age.age - 10.0).abs() < 1e-12);
            assert!((age.percent_released - 80.0).abs() < 1e-9);
        }
    }

    #[test]
    fn no_plateau_is_not_an_error() {
        let outcome = process_group(&group("G", &[10.0, 50.0, 90.0]), &PlateauConfig::default()).unwrap();
        assert_eq!(outcome.span, None);
        assert_eq!(outcome.age, None);
        assert!(outcome.statuses.iter().all(|s| *s == StepStatus::Outside));
    }

    #[test]
    fn zero_error_group_keeps_span_without_age_and_others_still_run() {
        let good = group("GOOD", &[10.0, 10.0, 10.0, 10.0, 50.0]);
        let mut bad = group("BAD", &[10.0, 10.0, 10.0, 10.0]);
        bad.series.steps[1].error = 0.0;

        let outcomes = process_groups(&[good, bad], &PlateauConfig::default()).unwrap();
        assert_eq!(outcomes.len(), 2);

        assert_eq!(outcomes[0].span, Some(PlateauSpan::new(0, 3)));
        assert!(outcomes[0].age.is_some());

        assert_eq!(outcomes[1].span, Some(PlateauSpan::new(0, 3)));
        assert_eq!(outcomes[1].age, None);
        assert!(crate::report::format_plateau_line(&outcomes[1]).contains("age unavailable"));
    }

    #[test]
    fn extra_exclusions_merge_into_every_group() {
        let mut groups = vec![group("A", &[10.0; 5]), group("B", &[10.0; 5])];
        groups[0].exclude.insert(1);
        apply_extra_exclusions(&mut groups, &[4]);

        assert!(groups[0].exclude.contains(1) && groups[0].exclude.contains(4));
        assert!(groups[1].exclude.contains(4) && !groups[1].exclude.contains(1));
    }
}
