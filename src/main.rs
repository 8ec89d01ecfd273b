use actix_web::{web, App, HttpServer};
use log::info;
use std::io;

use ballot_chain::server::{routes, AppState};
use ballot_chain::{Election, ServerConfig};

fn config_error(err: ballot_chain::ConfigError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, err)
}

#[tokio::main]
async fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let server_config = ServerConfig::from_env().map_err(config_error)?;
    let election_config = server_config.election().map_err(config_error)?;
    info!(
        "starting {}: {} candidates, {} eligible voters, {} votes to win",
        election_config.name,
        election_config.candidates.len(),
        election_config.voters.len(),
        election_config.win_threshold
    );

    let mut election = Election::new(election_config).map_err(config_error)?;
    election.on_victory(|victory| {
        let tally: Vec<String> = victory
            .tally
            .iter()
            .map(|(candidate, votes)| format!("{}: {}", candidate, votes))
            .collect();
        info!("WINNER: {} ({})", victory.winner, tally.join(", "));
    });

    let state = web::Data::new(AppState::new(election));

    info!("listening on {}:{}", server_config.host, server_config.port);
    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes))
        .bind((server_config.host.as_str(), server_config.port))?
        .run()
        .await
}
