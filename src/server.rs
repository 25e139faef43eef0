use crate::data::{SolveOutcome, SolveRequest};
use crate::solver;
use axum::{Json, Router, routing::post};

// The outcome carries its own status tag, so every solve answers 200.
async fn solve_handler(Json(request): Json<SolveRequest>) -> Json<SolveOutcome> {
    Json(solver::solve(&request))
}

pub async fn run_server() {
    let app = Router::new().route("/v1/timetable/solve", post(solve_handler));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080")
        .await
        .unwrap();

    println!("Server running at http://{}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
