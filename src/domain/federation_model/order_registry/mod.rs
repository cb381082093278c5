pub mod order_registry;
pub mod order_state_transitioner;
