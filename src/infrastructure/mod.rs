// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod rrdtool_engine;
pub mod run_lock;
pub mod speedtest_cli;
pub mod webdav_publisher;
