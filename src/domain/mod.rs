/// Domain layer
///
/// リポジトリとリモートのエンティティ、名前の値オブジェクトを定義する。
/// I/Oは一切行わない。
pub mod entities;
pub mod value_objects;
