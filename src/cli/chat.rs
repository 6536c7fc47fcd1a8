//! Line-oriented chat loop.
//!
//! Reads one message per line from stdin and prints each reply as it settles.
//! Ctrl+C while a reply is pending cancels it and pauses the session; at the
//! prompt it leaves the chat.

use std::error::Error;
use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::core::completion::{ClientConfig, CompletionClient};
use crate::core::message::Role;
use crate::core::session::{ChatSession, RejectReason, SubmitOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input<'a> {
    Message(&'a str),
    Pause,
    Resume,
    Help,
    Quit,
    Unknown(&'a str),
}

pub fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    if !trimmed.starts_with('/') {
        return Input::Message(line);
    }
    match trimmed {
        "/pause" => Input::Pause,
        "/resume" => Input::Resume,
        "/help" => Input::Help,
        "/quit" | "/exit" => Input::Quit,
        other => Input::Unknown(other),
    }
}

pub fn speaker_label(role: Role) -> &'static str {
    if role.is_user() {
        "You"
    } else {
        "Bot"
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /pause    Pause the chat, cancelling any pending reply");
    println!("  /resume   Accept messages again after a pause");
    println!("  /help     Show this help");
    println!("  /quit     Leave the chat");
    println!("Ctrl+C cancels a pending reply.");
}

fn prompt(paused: bool) -> io::Result<()> {
    let mut stdout = io::stdout();
    if paused {
        write!(stdout, "(paused) > ")?;
    } else {
        write!(stdout, "> ")?;
    }
    stdout.flush()
}

pub async fn run_chat(client_config: ClientConfig) -> Result<(), Box<dyn Error>> {
    eprintln!("🚀 Starting gemchat");
    eprintln!("📡 Using model: {}", client_config.model);
    eprintln!("💡 Type /help for commands, Ctrl+C or /quit to leave");

    let mut session = ChatSession::new(CompletionClient::new(client_config));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt(session.is_paused())?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            signal = tokio::signal::ctrl_c() => {
                signal?;
                println!();
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        match parse_input(&line) {
            Input::Quit => break,
            Input::Help => print_help(),
            Input::Pause => {
                session.pause();
                println!("⏸ Paused. Type /resume to continue.");
            }
            Input::Resume => {
                session.resume();
                println!("▶️ Resumed.");
            }
            Input::Unknown(command) => {
                println!("Unknown command: {command} (try /help)");
            }
            Input::Message(text) => {
                let cancel = session.cancel_handle();
                let mut interrupted = false;
                let outcome = {
                    let submit = session.submit(text);
                    tokio::pin!(submit);
                    loop {
                        tokio::select! {
                            outcome = &mut submit => break outcome,
                            signal = tokio::signal::ctrl_c() => {
                                signal?;
                                interrupted = true;
                                cancel.cancel();
                            }
                        }
                    }
                };
                if interrupted {
                    session.pause();
                }

                match outcome {
                    SubmitOutcome::Replied(reply) => {
                        println!("{}: {reply}", speaker_label(Role::Assistant));
                    }
                    SubmitOutcome::Rejected(RejectReason::Paused) => {
                        println!("⏸ Chat is paused. Type /resume to continue.");
                    }
                    SubmitOutcome::Rejected(RejectReason::Blank) => {}
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_messages() {
        assert_eq!(parse_input("hello there"), Input::Message("hello there"));
        assert_eq!(parse_input("  spaced "), Input::Message("  spaced "));
        assert_eq!(parse_input(""), Input::Message(""));
    }

    #[test]
    fn slash_commands_are_recognized() {
        assert_eq!(parse_input("/pause"), Input::Pause);
        assert_eq!(parse_input(" /resume "), Input::Resume);
        assert_eq!(parse_input("/help"), Input::Help);
        assert_eq!(parse_input("/quit"), Input::Quit);
        assert_eq!(parse_input("/exit"), Input::Quit);
        assert_eq!(parse_input("/frobnicate"), Input::Unknown("/frobnicate"));
    }

    #[test]
    fn speakers_are_labelled_like_the_transcript_view() {
        assert_eq!(speaker_label(Role::User), "You");
        assert_eq!(speaker_label(Role::Assistant), "Bot");
    }
}
