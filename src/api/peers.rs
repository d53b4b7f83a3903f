use actix_web::{HttpResponse, Responder, get, post, web};
use log::info;

use super::models::AppState;
use crate::error::LedgerError;
use crate::network::{Peer, PeerRecord};

#[get("/alive")]
pub async fn alive() -> impl Responder {
    HttpResponse::Ok().json(true)
}

/// Register the calling node and answer with every peer we know, ourselves
/// and the caller included.
#[post("/join")]
pub async fn join(
    state: web::Data<AppState>,
    body: web::Json<PeerRecord>,
) -> Result<HttpResponse, LedgerError> {
    let peer = Peer::from_record(body.into_inner())?;
    let addr = peer.addr().to_string();

    let mut registry = state.peers.write().expect("rwlock poisoned");
    let added = registry.add(peer);
    info!("POST /join - {} (new={}, known={})", addr, added, registry.len());
    Ok(HttpResponse::Ok().json(registry.records()))
}

/// Peer info relayed by another node.
#[post("/broadcast/peer")]
pub async fn broadcast_peer(
    state: web::Data<AppState>,
    body: web::Json<PeerRecord>,
) -> Result<HttpResponse, LedgerError> {
    let peer = Peer::from_record(body.into_inner())?;
    let added = state.peers.write().expect("rwlock poisoned").add(peer);
    Ok(HttpResponse::Ok().json(added))
}

#[get("/peers")]
pub async fn get_peers(state: web::Data<AppState>) -> impl Responder {
    let registry = state.peers.read().expect("rwlock poisoned");
    HttpResponse::Ok().json(registry.records())
}
