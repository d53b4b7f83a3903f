use actix_web::{HttpResponse, Responder, get, web};

use super::models::AppState;

/// Chain-derived balance; pending pool entries do not count.
#[get("/balance/{addr}")]
pub async fn get_balance(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let address = path.into_inner().0;
    let balance = {
        let core = state.core.read().expect("rwlock poisoned");
        core.ledger.compute_balance(&address)
    };
    HttpResponse::Ok().json(balance)
}
