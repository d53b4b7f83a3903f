use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info};
use std::time::Instant;

use super::models::AppState;
use crate::error::LedgerError;
use crate::transaction::{Transaction, TransactionRecord};

fn admit(state: &AppState, tx: Transaction) -> bool {
    let t0 = Instant::now();
    let hash = tx.hash().to_string();
    let accepted = {
        let mut core = state.core.write().expect("rwlock poisoned");
        core.add_transaction(tx)
    };
    info!(
        "tx {} {} ({} ms)",
        hash,
        if accepted { "queued" } else { "rejected" },
        t0.elapsed().as_millis()
    );
    accepted
}

/// Submit a signed transaction into the pool.
#[post("/transaction")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    body: web::Json<TransactionRecord>,
) -> Result<HttpResponse, LedgerError> {
    let tx = Transaction::from_record(body.into_inner())?;
    debug!("POST /transaction - hash={}", tx.hash());
    Ok(HttpResponse::Ok().json(admit(&state, tx)))
}

/// Same as `/transaction`, for transactions relayed by another node.
#[post("/broadcast/tx")]
pub async fn broadcast_tx(
    state: web::Data<AppState>,
    body: web::Json<TransactionRecord>,
) -> Result<HttpResponse, LedgerError> {
    let mut tx = Transaction::from_record(body.into_inner())?;
    tx.mark_from_peer();
    debug!("POST /broadcast/tx - hash={}", tx.hash());
    Ok(HttpResponse::Ok().json(admit(&state, tx)))
}

/// DEV faucet: airdrop the configured amount to `addr` via the pool.
#[get("/prize/{addr}")]
pub async fn get_prize(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let addr = path.into_inner().0;
    let granted = {
        let mut core = state.core.write().expect("rwlock poisoned");
        core.grant_airdrop(&addr, state.airdrop_amount)
    };
    HttpResponse::Ok().json(granted)
}

/// Unconfirmed transactions, in pool order. Confirmed entries awaiting the
/// next prune are hidden.
#[get("/pool")]
pub async fn get_pool(state: web::Data<AppState>) -> impl Responder {
    let core = state.core.read().expect("rwlock poisoned");
    let records: Vec<TransactionRecord> = core
        .pool
        .pending()
        .iter()
        .filter(|t| !t.is_confirmed())
        .map(Transaction::to_record)
        .collect();
    HttpResponse::Ok().json(records)
}
