pub mod closed_processor;
pub mod fulfilled_processor;
pub mod open_processor;
pub mod order_processor;
pub mod processor_runner;
pub mod spawning_processor;
