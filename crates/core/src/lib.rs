#![forbid(unsafe_code)]

//! Domain model and workflows for listing and bulk-deleting unmanaged solutions.

pub mod deletion;
pub mod dispatch;
pub mod error;
pub mod inventory;
pub mod mapper;
pub mod memory;
pub mod model;
pub mod query;
pub mod record;
pub mod selection;
pub mod service;
pub mod session;
pub mod settings;

mod util;

pub use deletion::*;
pub use dispatch::*;
pub use error::*;
pub use inventory::*;
pub use mapper::*;
pub use memory::*;
pub use model::*;
pub use query::*;
pub use record::*;
pub use selection::*;
pub use service::*;
pub use session::*;
pub use settings::*;
pub use util::{new_ulid, now_ms};
