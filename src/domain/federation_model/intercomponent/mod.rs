pub mod codec;
pub mod in_process_channel;
pub mod protocol;
pub mod remote_facade;
pub mod rpc_channel;
pub mod tcp_channel;
