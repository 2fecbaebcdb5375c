//! label-forms CLI
//!
//! 共通ライブラリのフォームモデルをコマンドラインから使う。

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod render;
