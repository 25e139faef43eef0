use super::variables::{BatchScope, CandidateVar};
use crate::data::{Hour, Problem, SessionKind};
use crate::grid::TimeGrid;
use good_lp::{Expression, SolverModel, Variable, constraint};
use itertools::Itertools;
use log::info;
use std::collections::BTreeSet;

// Hours a single unit may occupy per batch per day.
const DAILY_HOUR_CAP: Hour = 2;
// Longest stretch a teacher may teach inside any fatigue window.
const FATIGUE_WINDOW: Hour = 4;
const FATIGUE_MAX_HOURS: Hour = 3;

/// At most one covering candidate per (room, day, hour).
pub fn room_exclusivity(
    model: &mut impl SolverModel,
    vars: &[CandidateVar],
    problem: &Problem,
    grid: &TimeGrid,
) {
    info!("Adding 'no room overlap' constraints...");
    for room in 0..problem.rooms.len() {
        for slot in grid.slots() {
            let covering: Vec<Variable> = vars
                .iter()
                .filter(|v| v.room == room && v.covers(slot.day, slot.start_hour))
                .map(|v| v.var)
                .collect();
            if covering.is_empty() {
                continue;
            }
            let occupied: Expression = covering.into_iter().sum();
            model.add_constraint(constraint!(occupied <= 1));
        }
    }
}

/// At most one covering candidate per (batch, day, hour). Class-scoped
/// theory candidates count against every batch, which is what makes a
/// theory block occupy the whole year.
pub fn batch_exclusivity(
    model: &mut impl SolverModel,
    vars: &[CandidateVar],
    problem: &Problem,
    grid: &TimeGrid,
) {
    info!("Adding 'no batch overlap' constraints...");
    for batch in 0..problem.batches.len() {
        for slot in grid.slots() {
            let covering: Vec<Variable> = vars
                .iter()
                .filter(|v| v.scope.includes(batch) && v.covers(slot.day, slot.start_hour))
                .map(|v| v.var)
                .collect();
            if covering.is_empty() {
                continue;
            }
            let busy: Expression = covering.into_iter().sum();
            model.add_constraint(constraint!(busy <= 1));
        }
    }
}

/// For each practical unit and (day, start_hour): every pair of batches
/// starts the same number of sessions there (0 or 1 after exclusivity).
/// Combined with room exclusivity this forces simultaneous practicals in
/// distinct labs.
pub fn practical_synchrony(
    model: &mut impl SolverModel,
    vars: &[CandidateVar],
    problem: &Problem,
    grid: &TimeGrid,
) {
    info!("Adding 'batch synchronization' constraints...");
    for (course, unit) in problem.units.iter().enumerate() {
        if unit.kind != SessionKind::Practical {
            continue;
        }
        for slot in grid.slots() {
            let starts_here = |batch: usize| -> Vec<Variable> {
                vars.iter()
                    .filter(|v| {
                        v.course == course
                            && v.scope == BatchScope::Single(batch)
                            && v.day == slot.day
                            && v.start_hour == slot.start_hour
                    })
                    .map(|v| v.var)
                    .collect()
            };
            if starts_here(0).is_empty() {
                continue;
            }
            for (a, b) in (0..problem.batches.len()).tuple_combinations() {
                let lhs: Expression = starts_here(a).into_iter().sum();
                let rhs: Expression = starts_here(b).into_iter().sum();
                model.add_constraint(constraint!(lhs == rhs));
            }
        }
    }
}

/// A unit may occupy at most two hours per day for any batch, so one block
/// per day is the ceiling and theory can never stack three consecutive
/// hours out of its duration-1 and duration-2 candidates.
pub fn daily_hour_cap(model: &mut impl SolverModel, vars: &[CandidateVar], problem: &Problem) {
    info!("Adding 'daily per-subject cap' constraints...");
    for course in 0..problem.units.len() {
        for batch in 0..problem.batches.len() {
            for day in 0..problem.week.days.len() {
                let terms: Vec<Expression> = vars
                    .iter()
                    .filter(|v| v.course == course && v.day == day && v.scope.includes(batch))
                    .map(|v| f64::from(v.duration) * v.var)
                    .collect();
                if terms.is_empty() {
                    continue;
                }
                let hours: Expression = terms.into_iter().sum();
                let cap = f64::from(DAILY_HOUR_CAP);
                model.add_constraint(constraint!(hours <= cap));
            }
        }
    }
}

/// Every (unit, batch) must receive exactly its weekly hour quota. The only
/// equality family; this is the principal feasibility gate.
pub fn weekly_quota(model: &mut impl SolverModel, vars: &[CandidateVar], problem: &Problem) {
    info!("Adding 'weekly quota' constraints...");
    for (course, unit) in problem.units.iter().enumerate() {
        for batch in 0..problem.batches.len() {
            let hours: Expression = vars
                .iter()
                .filter(|v| v.course == course && v.scope.includes(batch))
                .map(|v| f64::from(v.duration) * v.var)
                .sum();
            let quota = f64::from(unit.hours_per_week);
            model.add_constraint(constraint!(hours == quota));
        }
    }
}

/// For every labelled teacher, day, and 4-hour window: at most 3 taught
/// hours inside the window. Practical batches run in lockstep, so the first
/// batch carries the teacher's clock and the others are not re-counted.
/// Posts nothing when no subject carries a teacher label.
pub fn teacher_fatigue(model: &mut impl SolverModel, vars: &[CandidateVar], problem: &Problem) {
    let teachers: BTreeSet<&str> = problem
        .units
        .iter()
        .filter_map(|u| u.teacher.as_deref())
        .collect();
    if teachers.is_empty() {
        return;
    }
    info!(
        "Adding 'teacher fatigue' constraints for {} teachers...",
        teachers.len()
    );
    let week = &problem.week;
    if week.end_hour < week.start_hour + FATIGUE_WINDOW {
        return;
    }
    for teacher in teachers {
        for day in 0..week.days.len() {
            for win_start in week.start_hour..=(week.end_hour - FATIGUE_WINDOW) {
                let win_end = win_start + FATIGUE_WINDOW;
                let terms: Vec<Expression> = vars
                    .iter()
                    .filter(|v| {
                        problem.units[v.course].teacher.as_deref() == Some(teacher)
                            && matches!(v.scope, BatchScope::Class | BatchScope::Single(0))
                            && v.overlap(day, win_start, win_end) > 0
                    })
                    .map(|v| f64::from(v.overlap(day, win_start, win_end)) * v.var)
                    .collect();
                if terms.is_empty() {
                    continue;
                }
                let taught: Expression = terms.into_iter().sum();
                let cap = f64::from(FATIGUE_MAX_HOURS);
                model.add_constraint(constraint!(taught <= cap));
            }
        }
    }
}
