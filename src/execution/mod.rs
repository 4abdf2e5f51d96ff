pub mod copy_engine;
pub mod order_executor;
pub mod position_sizer;
pub mod risk_manager;
pub mod strategy;
