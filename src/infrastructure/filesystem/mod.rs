/// ファイルシステム上の永続化と探索
pub mod codec;
pub mod config_store;
pub mod discover;
pub mod keyword_store;
pub mod workspace_index;

pub use config_store::{ConfigPaths, ConfigStore, GroveConfig};
pub use keyword_store::KeywordStore;
pub use workspace_index::WorkspaceIndex;
