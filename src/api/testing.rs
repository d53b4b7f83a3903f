//! Node fixtures shared by handler and cross-node tests.

use actix_web::dev::ServerHandle;
use actix_web::{App, HttpServer, web};
use tokio::sync::mpsc::unbounded_channel;

use super::{AppState, init_routes};
use crate::config::NodeConfig;
use crate::mining::MiningWorker;

/// Difficulty-1 node state announcing itself as `public_addr`.
pub fn state(public_addr: &str) -> web::Data<AppState> {
    let config = NodeConfig {
        difficulty: 1,
        public_addr: public_addr.into(),
        ..NodeConfig::default()
    };
    let (results, _rx) = unbounded_channel();
    let miner = MiningWorker::spawn(config.difficulty, 1, results).unwrap();
    web::Data::new(AppState::new(&config, miner).unwrap())
}

/// Serve `state` on an ephemeral local port. Returns the base URL.
pub fn serve(state: web::Data<AppState>) -> (String, ServerHandle) {
    let server = HttpServer::new(move || App::new().app_data(state.clone()).configure(init_routes))
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .unwrap();
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    (format!("http://{addr}"), handle)
}
