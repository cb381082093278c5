pub mod federation_model;
