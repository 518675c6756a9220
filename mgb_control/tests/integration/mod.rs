mod adaptation;
mod concurrency;
mod config_loading;
mod control_accuracy;
mod monitoring_loop;
