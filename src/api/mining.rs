use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info, warn};

use super::models::AppState;
use crate::mining::MiningJob;
use crate::transaction::{Transaction, TransactionRecord};

/// Pending transactions plus a fresh reward for `miner_addr`, for external
/// miners. Empty when there is nothing to mine.
#[get("/mining_data/{miner_addr}")]
pub async fn get_mining_data(
    state: web::Data<AppState>,
    path: web::Path<(String,)>,
) -> impl Responder {
    let miner_addr = path.into_inner().0;
    let set = {
        let mut core = state.core.write().expect("rwlock poisoned");
        core.prepare_mining_set(&miner_addr)
    };
    debug!("GET /mining_data - {} txs for {}", set.len(), miner_addr);
    let records: Vec<TransactionRecord> = set.iter().map(Transaction::to_record).collect();
    HttpResponse::Ok().json(records)
}

/// Queue a job on this node's own mining thread. The sealed block is
/// submitted asynchronously; the answer only says whether work was queued.
#[post("/mine/{miner_addr}")]
pub async fn post_mine(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let miner_addr = path.into_inner().0;
    let job = {
        let mut core = state.core.write().expect("rwlock poisoned");
        let set = core.prepare_mining_set(&miner_addr);
        if set.is_empty() {
            None
        } else {
            Some(MiningJob::new(core.ledger.last_block().cloned(), set))
        }
    };

    let Some(job) = job else {
        debug!("POST /mine - pool empty, nothing to mine");
        return HttpResponse::Ok().json(false);
    };

    let id = job.id;
    let index = job.target_index();
    if !state.miner.submit(job) {
        warn!("POST /mine - mining thread unavailable");
        return HttpResponse::ServiceUnavailable().json(false);
    }
    info!("POST /mine - job {} queued for block #{}", id, index);
    HttpResponse::Ok().json(true)
}
