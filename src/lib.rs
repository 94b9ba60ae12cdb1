pub mod aggregate;
pub mod anomaly;
pub mod cli;
pub mod config;
pub mod distribution;
pub mod draw;
pub mod draw_store;
pub mod error;
pub mod frequency_rank;
pub mod html_table;
pub mod http_client;
pub mod logging;
pub mod page_cache;
pub mod persist;
pub mod pipeline;
pub mod results_table;
pub mod stats;
pub mod synthetic;
pub mod tsv;
pub mod workbook;
