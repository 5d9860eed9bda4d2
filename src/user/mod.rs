mod error;
mod guard;
mod mapper;
mod memory;
mod model;
mod postgres;
mod repository;
mod service;

pub use error::*;
pub use guard::*;
pub use mapper::*;
pub use memory::*;
pub use model::*;
pub use postgres::*;
pub use repository::*;
pub use service::*;
