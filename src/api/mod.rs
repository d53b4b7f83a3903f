mod balance;
mod chain;
mod mining;
pub mod models;
mod peers;
#[cfg(test)]
pub(crate) mod testing;
mod tx;
mod wallet;

use actix_web::web::ServiceConfig;

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(peers::alive)
        .service(peers::join)
        .service(peers::broadcast_peer)
        .service(peers::get_peers)
        .service(chain::get_blockchain)
        .service(chain::post_block)
        .service(chain::broadcast_block)
        .service(chain::get_last_block)
        .service(chain::get_pow_check)
        .service(mining::get_mining_data)
        .service(mining::post_mine)
        .service(tx::post_transaction)
        .service(tx::broadcast_tx)
        .service(tx::get_prize)
        .service(tx::get_pool)
        .service(balance::get_balance)
        .service(wallet::create_wallet);
}
