pub mod simulated_cloud;
