use actix_web::{HttpResponse, Responder, get, post, web};
use log::debug;

use super::models::AppState;
use crate::blockchain::{Block, BlockRecord};
use crate::error::LedgerError;

/// Download the whole chain as canonical (sorted-key) JSON text.
#[get("/blockchain")]
pub async fn get_blockchain(state: web::Data<AppState>) -> impl Responder {
    let text = {
        let core = state.core.read().expect("rwlock poisoned");
        core.ledger.to_canonical_text()
    };
    HttpResponse::Ok()
        .content_type("application/json")
        .body(text)
}

/// Submit a mined block. Tampered records fail with 400; valid records that
/// break a chain rule come back as `false`.
#[post("/block")]
pub async fn post_block(
    state: web::Data<AppState>,
    body: web::Json<BlockRecord>,
) -> Result<HttpResponse, LedgerError> {
    let block = Block::from_record(body.into_inner())?;
    debug!("POST /block - #{} hash={}", block.index(), block.hash());
    Ok(HttpResponse::Ok().json(state.submit_block(block)))
}

/// Same as `/block`, for blocks relayed by another node.
#[post("/broadcast/block")]
pub async fn broadcast_block(
    state: web::Data<AppState>,
    body: web::Json<BlockRecord>,
) -> Result<HttpResponse, LedgerError> {
    let mut block = Block::from_record(body.into_inner())?;
    block.mark_from_peer();
    debug!("POST /broadcast/block - #{} hash={}", block.index(), block.hash());
    Ok(HttpResponse::Ok().json(state.submit_block(block)))
}

#[get("/last_block")]
pub async fn get_last_block(state: web::Data<AppState>) -> impl Responder {
    let core = state.core.read().expect("rwlock poisoned");
    HttpResponse::Ok().json(core.ledger.last_block().map(Block::to_record))
}

/// The PoW prefix a block hash must start with.
#[get("/pow_check")]
pub async fn get_pow_check(state: web::Data<AppState>) -> impl Responder {
    let core = state.core.read().expect("rwlock poisoned");
    HttpResponse::Ok().json(core.ledger.pow_target())
}
