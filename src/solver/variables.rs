use crate::data::{Hour, Problem, SessionKind};
use crate::grid::TimeGrid;
use good_lp::{ProblemVariables, Variable, variable};
use log::trace;

/// Who a candidate schedules: the whole class at once (theory) or a single
/// batch (practicals).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchScope {
    Class,
    Single(usize),
}

impl BatchScope {
    /// Class-wide candidates occupy every batch's calendar.
    pub fn includes(self, batch: usize) -> bool {
        match self {
            BatchScope::Class => true,
            BatchScope::Single(b) => b == batch,
        }
    }
}

/// One boolean decision: "this unit occupies `duration` hours starting at
/// (day, start_hour) in `room`, for `scope`". Course, room, and day are
/// indices into the problem's sorted vectors.
#[derive(Debug, Clone, Copy)]
pub struct CandidateVar {
    pub var: Variable,
    pub course: usize,
    pub kind: SessionKind,
    pub scope: BatchScope,
    pub room: usize,
    pub day: usize,
    pub start_hour: Hour,
    pub duration: Hour,
}

impl CandidateVar {
    pub fn end_hour(&self) -> Hour {
        self.start_hour + self.duration
    }

    /// A duration-d candidate starting at h covers hours {h, .., h+d-1}.
    pub fn covers(&self, day: usize, hour: Hour) -> bool {
        self.day == day && hour >= self.start_hour && hour < self.end_hour()
    }

    /// Number of covered hours falling inside [win_start, win_end) on `day`.
    pub fn overlap(&self, day: usize, win_start: Hour, win_end: Hour) -> Hour {
        if self.day != day {
            return 0;
        }
        let lo = self.start_hour.max(win_start);
        let hi = self.end_hour().min(win_end);
        hi.saturating_sub(lo)
    }
}

/// Enumerates every legal candidate and materializes one binary variable per
/// candidate. Enumeration order is deterministic: units by name, rooms by
/// name, days in working order, start hours ascending, durations ascending,
/// batches in input order. Room-type matching and the duration shape rule
/// are enforced here by construction.
pub fn build_variables(
    problem: &Problem,
    grid: &TimeGrid,
    model_vars: &mut ProblemVariables,
) -> Vec<CandidateVar> {
    let mut candidates = Vec::new();
    for (course, unit) in problem.units.iter().enumerate() {
        for (room, room_info) in problem.rooms.iter().enumerate() {
            if room_info.room_type != unit.kind.room_type() {
                continue;
            }
            for day in 0..problem.week.days.len() {
                for start_hour in problem.week.start_hour..problem.week.end_hour {
                    for &duration in unit.kind.allowed_durations() {
                        if !grid.block_fits(day, start_hour, duration) {
                            continue;
                        }
                        match unit.kind {
                            SessionKind::Theory => candidates.push(CandidateVar {
                                var: model_vars.add(variable().binary()),
                                course,
                                kind: unit.kind,
                                scope: BatchScope::Class,
                                room,
                                day,
                                start_hour,
                                duration,
                            }),
                            SessionKind::Practical => {
                                for batch in 0..problem.batches.len() {
                                    candidates.push(CandidateVar {
                                        var: model_vars.add(variable().binary()),
                                        course,
                                        kind: unit.kind,
                                        scope: BatchScope::Single(batch),
                                        room,
                                        day,
                                        start_hour,
                                        duration,
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }
        trace!(
            "Unit '{}' has {} candidate placements so far",
            unit.name,
            candidates.iter().filter(|c| c.course == course).count()
        );
    }
    candidates
}
