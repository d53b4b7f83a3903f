use actix_web::{HttpResponse, Responder, post};

use super::models::NewWalletResponse;
use crate::wallet::generate_keypair_hex;

/// DEV helper: a fresh keypair. The public key is the address.
#[post("/wallet/new")]
pub async fn create_wallet() -> impl Responder {
    let (private_key, public_key) = generate_keypair_hex();
    HttpResponse::Ok().json(NewWalletResponse {
        private_key,
        public_key,
    })
}
