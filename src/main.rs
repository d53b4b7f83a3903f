mod api;
mod blockchain;
mod canonical;
mod config;
mod error;
mod mining;
mod network;
mod node;
mod transaction;
mod wallet;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::info;
use std::io;
use tokio::sync::mpsc::unbounded_channel;

use api::AppState;
use blockchain::Block;
use config::NodeConfig;
use mining::MiningWorker;

#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = NodeConfig::from_env();
    println!(
        "⛓️ Starting ledger node at http://{}:{} (difficulty={}, public={})",
        config.host, config.port, config.difficulty, config.public_addr
    );

    let (results, mut mined) = unbounded_channel::<Block>();
    let miner = MiningWorker::spawn(config.difficulty, config.mining_workers, results)?;
    let state = web::Data::new(AppState::new(&config, miner).map_err(io::Error::other)?);

    // Blocks sealed by the local mining thread enter through the same path
    // as submitted ones.
    let consumer = state.clone();
    actix_web::rt::spawn(async move {
        while let Some(block) = mined.recv().await {
            consumer.submit_block(block);
        }
    });

    if let Some(bootstrap) = config.bootstrap_peer.clone() {
        info!("joining network via {}", bootstrap);
        actix_web::rt::spawn(node::join_network(state.clone(), bootstrap));
    }

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
