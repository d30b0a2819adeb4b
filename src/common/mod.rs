/// 共通モジュール
///
/// エラー型、Result型エイリアス、並列タスク実行エンジン
pub mod error;
pub mod executor;
pub mod result;

pub use error::GroveError;
pub use result::GroveResult;
