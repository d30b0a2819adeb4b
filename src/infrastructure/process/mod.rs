/// 外部プロセスの実行
pub mod command;
pub mod job;

pub use command::run_captured;
pub use job::JobSpec;
