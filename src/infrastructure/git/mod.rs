/// gitリポジトリのクローン
pub mod clone;

pub use clone::CloneSpec;
