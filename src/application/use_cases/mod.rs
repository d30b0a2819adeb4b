/// CLIの各コマンドに対応するユースケース
pub mod download_assets;
pub mod home;
pub mod jump;
pub mod run_job;
pub mod sync_repositories;
