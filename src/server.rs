use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::election::Election;
use crate::error::VoteError;

pub struct AppState {
    /// Held for the whole of a submission so block indexes and links are
    /// assigned one append at a time.
    pub election: Mutex<Election>,
}

impl AppState {
    pub fn new(election: Election) -> Self {
        AppState {
            election: Mutex::new(election),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct VoteRequest {
    pub voter: String,
    pub choice: String,
}

fn status_for(err: &VoteError) -> StatusCode {
    match err {
        VoteError::InvalidVoter(_) => StatusCode::FORBIDDEN,
        VoteError::DuplicateVote(_) => StatusCode::CONFLICT,
        VoteError::UnknownCandidate(_) => StatusCode::BAD_REQUEST,
        VoteError::ElectionClosed { .. } => StatusCode::GONE,
    }
}

async fn handle_vote(data: web::Data<AppState>, vote: web::Json<VoteRequest>) -> impl Responder {
    let mut election = data.election.lock().await;
    match election.submit(&vote.voter, &vote.choice) {
        Ok(receipt) => HttpResponse::Ok().json(receipt),
        Err(err) => HttpResponse::build(status_for(&err)).json(json!({
            "error": err.kind(),
            "message": err.to_string(),
        })),
    }
}

async fn get_history(data: web::Data<AppState>) -> impl Responder {
    let election = data.election.lock().await;
    HttpResponse::Ok().json(election.blocks())
}

async fn get_results(data: web::Data<AppState>) -> impl Responder {
    let election = data.election.lock().await;
    HttpResponse::Ok().json(json!({
        "election": election.config().name,
        "tally": election.tally(),
        "winner": election.winner(),
    }))
}

async fn verify_chain(data: web::Data<AppState>) -> impl Responder {
    let election = data.election.lock().await;
    let chain = election.chain();
    match chain.verify() {
        Ok(()) => HttpResponse::Ok().json(json!({
            "valid": true,
            "length": chain.len(),
        })),
        Err(err) => HttpResponse::Ok().json(json!({
            "valid": false,
            "index": err.index,
            "kind": err.kind,
        })),
    }
}

async fn get_voter(
    data: web::Data<AppState>,
    query: web::Query<HashMap<String, String>>,
) -> impl Responder {
    let voter = match query.get("voter_id") {
        Some(voter) => voter.clone(),
        None => return HttpResponse::BadRequest().body("Missing voter_id parameter"),
    };
    let election = data.election.lock().await;
    HttpResponse::Ok().json(json!({
        "voter": voter,
        "eligible": election.is_eligible(&voter),
        "voted": election.has_voted(&voter),
    }))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/vote", web::post().to(handle_vote))
        .route("/history", web::get().to(get_history))
        .route("/results", web::get().to(get_results))
        .route("/verify", web::get().to(verify_chain))
        .route("/voter", web::get().to(get_voter));
}
