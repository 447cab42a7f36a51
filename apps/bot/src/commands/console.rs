//! Console chat adapter
//!
//! Reads `<user> /command` lines and prints replies. Stands in for a real
//! chat platform during local development.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::warn;

use super::dispatcher::CommandInvocation;

const USAGE: &str = "usage: <user> /command   (e.g. `alice /nowplaying`)";

/// Feed console lines to the dispatcher until input ends
pub async fn run_console<R, W>(
    input: R,
    mut output: W,
    sender: mpsc::Sender<CommandInvocation>,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((user_id, text)) = line.split_once(char::is_whitespace) else {
            output.write_all(format!("{}\n", USAGE).as_bytes()).await?;
            continue;
        };

        let (invocation, reply) = CommandInvocation::new(user_id, text.trim());
        if sender.send(invocation).await.is_err() {
            warn!("Dispatcher is gone; stopping console");
            break;
        }

        match reply.await {
            Ok(reply) => {
                output
                    .write_all(format!("{}\n\n", reply.render()).as_bytes())
                    .await?
            }
            Err(_) => warn!("Command task ended without a reply"),
        }
        output.flush().await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Reply;

    #[tokio::test]
    async fn test_console_forwards_lines_and_prints_replies() {
        let (sender, mut receiver) = mpsc::channel::<CommandInvocation>(4);

        let responder = tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(invocation) = receiver.recv().await {
                seen.push((invocation.user_id.clone(), invocation.text.clone()));
                let _ = invocation.reply_to.send(Reply::new("Echo").line(invocation.text));
            }
            seen
        });

        let input: &[u8] = b"alice /help\n\nbroken\nbob   /recent\n";
        let mut output = Vec::new();
        run_console(input, &mut output, sender).await.unwrap();

        let seen = responder.await.unwrap();
        assert_eq!(
            seen,
            vec![
                ("alice".to_string(), "/help".to_string()),
                ("bob".to_string(), "/recent".to_string())
            ]
        );

        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("**Echo**\n/help"));
        assert!(printed.contains(USAGE));
    }
}
