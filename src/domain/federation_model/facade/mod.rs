pub mod application_facade;
