//! TUI-less "say" command

use std::error::Error;

use crate::core::cancel::CancelSlot;
use crate::core::completion::{ClientConfig, CompletionClient};
use crate::core::transcript::Transcript;

pub async fn run_say(
    prompt: Vec<String>,
    client_config: ClientConfig,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    let Some(transcript) = Transcript::new().append_user(prompt) else {
        eprintln!("Usage: gemchat say <prompt>");
        std::process::exit(1);
    };

    let client = CompletionClient::new(client_config);
    let cancel = CancelSlot::new();

    let request = client.complete_detailed(&transcript, &cancel);
    tokio::pin!(request);
    let result = loop {
        tokio::select! {
            result = &mut request => break result,
            signal = tokio::signal::ctrl_c() => {
                signal?;
                cancel.cancel();
            }
        }
    };

    match result {
        Ok(reply) => {
            println!("{reply}");
            Ok(())
        }
        Err(err) => {
            if !err.is_cancelled() {
                tracing::error!(kind = ?err.kind(), "completion request failed: {err}");
            }
            eprintln!("{}", err.user_message());
            std::process::exit(1);
        }
    }
}
