mod constraints;
mod extract;
mod variables;

pub use variables::{BatchScope, CandidateVar, build_variables};

use crate::data::{Problem, RoomType, SolveOutcome, SolveRequest, SolveStats};
use crate::grid::TimeGrid;
use good_lp::{Expression, ProblemVariables, ResolutionError, SolverModel, default_solver};
use log::info;
use std::collections::HashSet;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::Instant;

const TIME_LIMIT_SECS: u32 = 180;
const WORKER_THREADS: i32 = 4;

const INFEASIBLE_REASON: &str = "No feasible solution under current constraints";

/// Solves a timetable request end to end: validate, expand the grid,
/// pre-check supply, build the boolean model, search, extract. Always
/// returns a tagged outcome; never a partial timetable, never a panic on
/// user input.
pub fn solve(request: &SolveRequest) -> SolveOutcome {
    match Problem::from_request(request) {
        Ok(problem) => solve_problem(&problem),
        Err(err) => SolveOutcome::failed(err.to_string()),
    }
}

pub fn solve_problem(problem: &Problem) -> SolveOutcome {
    let start_time = Instant::now();
    let grid = TimeGrid::build(&problem.week);

    if problem.units.is_empty() {
        return SolveOutcome::success(
            Vec::new(),
            SolveStats {
                total_slots: 0,
                subjects_scheduled: 0,
                batches_scheduled: 0,
            },
        );
    }

    if let Some(reason) = precheck(problem, &grid) {
        return SolveOutcome::failed(reason);
    }

    info!(
        "Setting up ILP model with {} units, {} rooms, and {} slots...",
        problem.units.len(),
        problem.rooms.len(),
        grid.len()
    );
    let mut model_vars = ProblemVariables::new();
    let vars = build_variables(problem, &grid, &mut model_vars);
    info!("Materialized {} decision variables", vars.len());

    // A unit with no candidate at all can never meet its quota; skip the
    // engine and report the search verdict directly.
    for course in 0..problem.units.len() {
        if !vars.iter().any(|v| v.course == course) {
            return SolveOutcome::infeasible(INFEASIBLE_REASON);
        }
    }

    let workers = if std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        > 1
    {
        WORKER_THREADS
    } else {
        1
    };
    let mut model = model_vars
        .maximise(Expression::from(0.0))
        .using(default_solver)
        .set_option("time_limit", f64::from(TIME_LIMIT_SECS))
        .set_option("threads", workers)
        .set_option("random_seed", problem_seed(problem))
        .set_option("log_to_console", false);

    constraints::room_exclusivity(&mut model, &vars, problem, &grid);
    constraints::batch_exclusivity(&mut model, &vars, problem, &grid);
    constraints::practical_synchrony(&mut model, &vars, problem, &grid);
    constraints::daily_hour_cap(&mut model, &vars, problem);
    constraints::weekly_quota(&mut model, &vars, problem);
    constraints::teacher_fatigue(&mut model, &vars, problem);

    info!("Starting ILP search...");
    match model.solve() {
        Ok(solution) => {
            info!("Solution found in {:.2?}", start_time.elapsed());
            let (timetable, stats) = extract::extract_timetable(&solution, &vars, problem);
            SolveOutcome::success(timetable, stats)
        }
        Err(ResolutionError::Infeasible) => SolveOutcome::infeasible(INFEASIBLE_REASON),
        Err(err) => {
            let message = err.to_string();
            if message.to_ascii_lowercase().contains("time") {
                SolveOutcome::timeout(format!("Solver timed out after {TIME_LIMIT_SECS}s"))
            } else {
                SolveOutcome::error(message)
            }
        }
    }
}

/// Advisory counting check: weekly demand against slot supply in compatible
/// rooms. Passing proves nothing; failing proves infeasibility.
fn precheck(problem: &Problem, grid: &TimeGrid) -> Option<String> {
    let demand: u32 = problem.units.iter().map(|u| u.hours_per_week).sum();
    let needed_types: HashSet<RoomType> = problem
        .units
        .iter()
        .map(|u| u.kind.room_type())
        .collect();
    let compatible_rooms = problem
        .rooms
        .iter()
        .filter(|r| needed_types.contains(&r.room_type))
        .count();
    let supply = grid.len() * compatible_rooms;
    if demand as usize > supply {
        Some(format!("Need {demand}h but only {supply} slots available"))
    } else {
        None
    }
}

// Hash of the normalized problem; equivalent requests search identically.
fn problem_seed(problem: &Problem) -> i32 {
    let mut hasher = DefaultHasher::new();
    problem.hash(&mut hasher);
    (hasher.finish() % i32::MAX as u64) as i32
}
