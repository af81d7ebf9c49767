//! Interactive mode for the server.
//!
//! Prompts for bind address, port, and dataset before starting the server.

use accident_map_source::registry::all_datasets;
use dialoguer::{Confirm, Input, Select};

use crate::ServerConfig;

/// Runs the server in interactive mode, prompting for configuration.
///
/// Starts from [`ServerConfig::from_env`], lets the user override the bind
/// address, port, and dataset, and delegates to [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("Accident Hotspot Server");
    println!();

    let mut config = ServerConfig::from_env();

    config.bind_addr = Input::new()
        .with_prompt("Bind address")
        .default(config.bind_addr.clone())
        .interact_text()
        .unwrap_or(config.bind_addr);

    config.port = Input::new()
        .with_prompt("Port")
        .default(config.port)
        .interact_text()
        .unwrap_or(config.port);

    let datasets = all_datasets();
    if datasets.len() > 1 {
        let labels: Vec<String> = datasets
            .iter()
            .map(|d| format!("{} ({})", d.name(), d.id()))
            .collect();
        let current = datasets
            .iter()
            .position(|d| d.id() == config.dataset_id)
            .unwrap_or(0);
        if let Ok(idx) = Select::new()
            .with_prompt("Dataset")
            .items(&labels)
            .default(current)
            .interact()
        {
            config.dataset_id = datasets[idx].id().to_string();
        }
    }

    if !Confirm::new()
        .with_prompt(format!(
            "Start server on {}:{} serving {}?",
            config.bind_addr, config.port, config.dataset_id
        ))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server(config).await
}
