pub mod attach;
pub mod download;
pub mod home;
pub mod jump;
pub mod keywords;
pub mod list;
pub mod remove;
pub mod run;
pub mod sync;

pub use attach::*;
pub use download::*;
pub use home::*;
pub use jump::*;
pub use keywords::*;
pub use list::*;
pub use remove::*;
pub use run::*;
pub use sync::*;
