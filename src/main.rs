use anyhow::Result;
use std::env;
use std::io::Write;
use tracing::{error, warn};

use chatmd::api::client::ChatClient;
use chatmd::core::config::AppConfig;
use chatmd::session::run_question;

#[tokio::main]
async fn main() -> Result<()> {
    chatmd::setup_logging();

    let question = env::args().skip(1).collect::<Vec<_>>().join(" ");
    if question.trim().is_empty() {
        eprintln!("usage: chatmd <question>");
        std::process::exit(2);
    }

    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {e}");
        anyhow::anyhow!(e)
    })?;
    let model = config.model.clone();

    let client = ChatClient::new(config)?;

    if let Some(model) = model
        && let Err(e) = client.set_model(&model).await
    {
        warn!("failed to set model {model}, continuing with the topic default: {e}");
    }

    let result = run_question(&client, &question, &[], |fragment| {
        print!("{fragment}");
        let _ = std::io::stdout().flush();
    })
    .await;
    println!();

    if result.is_err() {
        // The terminal fragment was already printed; exit nonzero for scripts.
        std::process::exit(1);
    }
    Ok(())
}
