pub mod cloud_plugin_trait;
