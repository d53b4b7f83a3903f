pub mod model;
pub mod pool;

pub use model::{Transaction, TransactionRecord};
pub use pool::TransactionPool;
