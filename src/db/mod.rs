pub mod models;
pub mod stock_store;

pub use stock_store::StockStore;
