pub mod mode_controller;
pub mod operator;
pub mod wallet_monitor;
