pub mod broker;
pub mod cloud_connector;
pub mod facade;
pub mod intercomponent;
pub mod order;
pub mod order_controller;
pub mod order_queue;
pub mod order_registry;
pub mod plugins;
pub mod processors;
pub mod utils;
