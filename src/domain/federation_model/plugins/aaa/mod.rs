pub mod aaa_controller;
pub mod aaa_plugin_trait;
pub mod allow_all_authorization_plugin;
pub mod issuer_authentication_plugin;
pub mod remote_authorization_plugin;
