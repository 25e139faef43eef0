use super::variables::{BatchScope, CandidateVar};
use crate::data::{Hour, Problem, ScheduledSession, SolveStats};
use good_lp::Solution;
use itertools::Itertools;
use log::trace;

fn format_hour(hour: Hour) -> String {
    format!("{hour:02}:00")
}

/// Reads the satisfying assignment back out of the model. Class-scoped
/// theory variables expand into one session per real batch, all sharing the
/// same room and time.
pub fn extract_timetable(
    solution: &impl Solution,
    vars: &[CandidateVar],
    problem: &Problem,
) -> (Vec<ScheduledSession>, SolveStats) {
    let mut entries: Vec<(usize, ScheduledSession)> = Vec::new();
    for candidate in vars {
        if solution.value(candidate.var) < 0.9 {
            continue;
        }
        match candidate.scope {
            BatchScope::Class => {
                for batch in 0..problem.batches.len() {
                    entries.push((candidate.day, session_for(candidate, batch, problem)));
                }
            }
            BatchScope::Single(batch) => {
                entries.push((candidate.day, session_for(candidate, batch, problem)));
            }
        }
    }

    entries.sort_by(|(day_a, a), (day_b, b)| {
        (day_a, a.start_hour, &a.subject, &a.batch).cmp(&(day_b, b.start_hour, &b.subject, &b.batch))
    });
    let timetable: Vec<ScheduledSession> = entries.into_iter().map(|(_, s)| s).collect();
    for session in &timetable {
        trace!("Scheduled {session}");
    }

    let stats = SolveStats {
        total_slots: timetable.iter().map(|s| s.duration).sum(),
        subjects_scheduled: timetable.iter().map(|s| s.subject.as_str()).unique().count(),
        batches_scheduled: timetable.iter().map(|s| s.batch.as_str()).unique().count(),
    };
    (timetable, stats)
}

fn session_for(candidate: &CandidateVar, batch: usize, problem: &Problem) -> ScheduledSession {
    let unit = &problem.units[candidate.course];
    ScheduledSession {
        subject: unit.name.clone(),
        batch: problem.batches[batch].clone(),
        room: problem.rooms[candidate.room].name.clone(),
        day: problem.week.days[candidate.day].clone(),
        start_hour: candidate.start_hour,
        end_hour: candidate.end_hour(),
        duration: candidate.duration,
        kind: candidate.kind,
        start_time: format_hour(candidate.start_hour),
        end_time: format_hour(candidate.end_hour()),
    }
}
