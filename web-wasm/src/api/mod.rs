//! サーバーAPI連携

pub mod extraction;
