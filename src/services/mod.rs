pub mod draw_service;
pub mod lottery_service;

pub use draw_service::*;
pub use lottery_service::*;
