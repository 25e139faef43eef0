use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

// Hours are whole clock hours; minutes are truncated at the wire boundary.
pub type Hour = u32;

/// What a room physically is; decides which session kinds it can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Classroom,
    Lab,
}

/// Subject classification as it arrives on the wire. The composite
/// `theory+lab` variant is split into two units during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum SubjectType {
    #[serde(rename = "theory")]
    Theory,
    #[serde(rename = "practical")]
    Practical,
    #[serde(rename = "theory+lab")]
    TheoryLab,
}

/// Kind of a schedulable unit after normalization. Theory runs class-wide
/// in a classroom; practicals run per-batch in labs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Theory,
    Practical,
}

impl SessionKind {
    pub fn room_type(self) -> RoomType {
        match self {
            SessionKind::Theory => RoomType::Classroom,
            SessionKind::Practical => RoomType::Lab,
        }
    }

    /// Legal block lengths: theory may run 1 or 2 hours, practicals exactly 2.
    pub fn allowed_durations(self) -> &'static [Hour] {
        match self {
            SessionKind::Theory => &[1, 2],
            SessionKind::Practical => &[2],
        }
    }
}

/// Shape of the working week as supplied by the caller.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WeekConfig {
    pub working_days: Vec<String>,
    pub week_start_time: String,
    pub week_end_time: String,
    pub lunch_start: String,
    pub lunch_end: String,
}

/// A subject to be scheduled.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubjectSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SubjectType,
    pub hours_per_week: u32,
    pub teacher: Option<String>,
}

/// A room available for scheduling. Capacity and location are carried as
/// opaque metadata; no constraint reads them.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoomSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub capacity: Option<u32>,
    pub location: Option<String>,
}

/// The complete input for one solve call.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SolveRequest {
    pub week_config: WeekConfig,
    pub subjects: Vec<SubjectSpec>,
    pub rooms: Vec<RoomSpec>,
    #[serde(default = "default_batches")]
    pub batches: Vec<String>,
}

fn default_batches() -> Vec<String> {
    vec![
        "Batch A".to_string(),
        "Batch B".to_string(),
        "Batch C".to_string(),
    ]
}

/// One scheduled session in the output timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledSession {
    pub subject: String,
    pub batch: String,
    pub room: String,
    pub day: String,
    pub start_hour: Hour,
    pub end_hour: Hour,
    pub duration: Hour,
    #[serde(rename = "type")]
    pub kind: SessionKind,
    pub start_time: String,
    pub end_time: String,
}

impl fmt::Display for ScheduledSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} {}-{} in {}",
            self.subject, self.batch, self.day, self.start_time, self.end_time, self.room
        )
    }
}

/// Summary counters attached to a successful solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolveStats {
    /// Scheduled slot-hours across all sessions.
    pub total_slots: u32,
    pub subjects_scheduled: usize,
    pub batches_scheduled: usize,
}

/// The single union-typed result of a solve. Non-success variants carry a
/// one-sentence reason and an empty timetable; no error escapes as a panic.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SolveOutcome {
    Success {
        timetable: Vec<ScheduledSession>,
        stats: SolveStats,
    },
    Failed {
        reason: String,
        timetable: Vec<ScheduledSession>,
    },
    Infeasible {
        reason: String,
        timetable: Vec<ScheduledSession>,
    },
    Timeout {
        reason: String,
        timetable: Vec<ScheduledSession>,
    },
    Error {
        reason: String,
        timetable: Vec<ScheduledSession>,
    },
}

impl SolveOutcome {
    pub fn success(timetable: Vec<ScheduledSession>, stats: SolveStats) -> Self {
        SolveOutcome::Success { timetable, stats }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        SolveOutcome::Failed {
            reason: reason.into(),
            timetable: Vec::new(),
        }
    }

    pub fn infeasible(reason: impl Into<String>) -> Self {
        SolveOutcome::Infeasible {
            reason: reason.into(),
            timetable: Vec::new(),
        }
    }

    pub fn timeout(reason: impl Into<String>) -> Self {
        SolveOutcome::Timeout {
            reason: reason.into(),
            timetable: Vec::new(),
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        SolveOutcome::Error {
            reason: reason.into(),
            timetable: Vec::new(),
        }
    }
}

/// Rejected input, reported before any model is built.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("invalid time \"{0}\": expected HH:MM")]
    InvalidTime(String),
    #[error("working_days must not be empty")]
    EmptyWorkingDays,
    #[error("batches must not be empty")]
    EmptyBatches,
    #[error("week_start_time must be before week_end_time")]
    EmptyWeek,
    #[error("subject \"{0}\" must have a positive hours_per_week")]
    NonPositiveHours(String),
    #[error("duplicate subject name \"{0}\"")]
    DuplicateSubject(String),
    #[error("duplicate room name \"{0}\"")]
    DuplicateRoom(String),
}

/// Validated week bounds, in whole hours. Start is inclusive, end exclusive;
/// hours starting in [lunch_start, lunch_end) are not teachable.
#[derive(Debug, Clone, Hash)]
pub struct Week {
    pub days: Vec<String>,
    pub start_hour: Hour,
    pub end_hour: Hour,
    pub lunch_start: Hour,
    pub lunch_end: Hour,
}

impl Week {
    pub fn from_config(config: &WeekConfig) -> Result<Self, InputError> {
        if config.working_days.is_empty() {
            return Err(InputError::EmptyWorkingDays);
        }
        let start_hour = parse_hour(&config.week_start_time)?;
        let end_hour = parse_hour(&config.week_end_time)?;
        let lunch_start = parse_hour(&config.lunch_start)?;
        let lunch_end = parse_hour(&config.lunch_end)?;
        if start_hour >= end_hour {
            return Err(InputError::EmptyWeek);
        }
        Ok(Week {
            days: config.working_days.clone(),
            start_hour,
            end_hour,
            lunch_start,
            lunch_end,
        })
    }
}

// Truncates to the whole hour; "16:30" becomes 16.
fn parse_hour(text: &str) -> Result<Hour, InputError> {
    NaiveTime::parse_from_str(text, "%H:%M")
        .map(|t| t.hour())
        .map_err(|_| InputError::InvalidTime(text.to_string()))
}

/// One schedulable unit after normalization. Composite subjects contribute
/// two units; each unit owns its weekly hour quota.
#[derive(Debug, Clone, Hash)]
pub struct CourseUnit {
    pub name: String,
    pub kind: SessionKind,
    pub hours_per_week: u32,
    pub teacher: Option<String>,
}

#[derive(Debug, Clone, Hash)]
pub struct RoomInfo {
    pub name: String,
    pub room_type: RoomType,
    pub capacity: Option<u32>,
    pub location: Option<String>,
}

/// The fully validated, normalized problem the solver works on. Units and
/// rooms are sorted by name so equivalent requests enumerate identical
/// variable sets.
#[derive(Debug, Clone, Hash)]
pub struct Problem {
    pub week: Week,
    pub units: Vec<CourseUnit>,
    pub rooms: Vec<RoomInfo>,
    pub batches: Vec<String>,
}

impl Problem {
    pub fn from_request(request: &SolveRequest) -> Result<Self, InputError> {
        let week = Week::from_config(&request.week_config)?;
        if request.batches.is_empty() {
            return Err(InputError::EmptyBatches);
        }

        let mut seen_subjects = HashSet::new();
        let mut units = Vec::new();
        for subject in &request.subjects {
            if !seen_subjects.insert(subject.name.as_str()) {
                return Err(InputError::DuplicateSubject(subject.name.clone()));
            }
            if subject.hours_per_week == 0 {
                return Err(InputError::NonPositiveHours(subject.name.clone()));
            }
            match subject.kind {
                SubjectType::Theory => units.push(CourseUnit {
                    name: subject.name.clone(),
                    kind: SessionKind::Theory,
                    hours_per_week: subject.hours_per_week,
                    teacher: subject.teacher.clone(),
                }),
                SubjectType::Practical => units.push(CourseUnit {
                    name: subject.name.clone(),
                    kind: SessionKind::Practical,
                    hours_per_week: subject.hours_per_week,
                    teacher: subject.teacher.clone(),
                }),
                SubjectType::TheoryLab => {
                    // Partition rule: theory gets the larger half.
                    let theory_hours = subject.hours_per_week.div_ceil(2);
                    let lab_hours = subject.hours_per_week / 2;
                    units.push(CourseUnit {
                        name: format!("{} (Theory)", subject.name),
                        kind: SessionKind::Theory,
                        hours_per_week: theory_hours,
                        teacher: subject.teacher.clone(),
                    });
                    if lab_hours > 0 {
                        units.push(CourseUnit {
                            name: format!("{} (Lab)", subject.name),
                            kind: SessionKind::Practical,
                            hours_per_week: lab_hours,
                            teacher: subject.teacher.clone(),
                        });
                    }
                }
            }
        }
        units.sort_by(|a, b| a.name.cmp(&b.name));

        let mut seen_rooms = HashSet::new();
        let mut rooms = Vec::new();
        for room in &request.rooms {
            if !seen_rooms.insert(room.name.as_str()) {
                return Err(InputError::DuplicateRoom(room.name.clone()));
            }
            rooms.push(RoomInfo {
                name: room.name.clone(),
                room_type: room.room_type,
                capacity: room.capacity,
                location: room.location.clone(),
            });
        }
        rooms.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Problem {
            week,
            units,
            rooms,
            batches: request.batches.clone(),
        })
    }
}
