pub mod remote;
pub mod repository;

pub use remote::{Protocol, Remote, RemoteGroup};
pub use repository::Repository;
