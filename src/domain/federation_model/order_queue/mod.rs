pub mod synchronized_order_queue;
