pub mod broker_config_dto;
