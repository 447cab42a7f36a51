//! Command dispatch
//!
//! Any chat-platform adapter feeds [`CommandInvocation`]s into the channel
//! returned by [`Dispatcher::channel`]. Each invocation runs on its own task,
//! so a slow provider or model call never holds up the next command.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::handlers::CommandHandler;
use super::reply::Reply;

/// One chat message to execute as a command
#[derive(Debug)]
pub struct CommandInvocation {
    /// Chat-platform identity of the sender
    pub user_id: String,
    /// Raw message text
    pub text: String,
    /// Where the reply goes
    pub reply_to: oneshot::Sender<Reply>,
}

impl CommandInvocation {
    /// Build an invocation and the receiver its reply will arrive on
    pub fn new(
        user_id: impl Into<String>,
        text: impl Into<String>,
    ) -> (Self, oneshot::Receiver<Reply>) {
        let (reply_to, reply) = oneshot::channel();
        (
            Self {
                user_id: user_id.into(),
                text: text.into(),
                reply_to,
            },
            reply,
        )
    }
}

/// Receives invocations and runs each on a spawned task
pub struct Dispatcher {
    handler: Arc<CommandHandler>,
    receiver: mpsc::Receiver<CommandInvocation>,
}

impl Dispatcher {
    /// Create a dispatcher and the sender adapters submit invocations on
    pub fn channel(
        handler: Arc<CommandHandler>,
        buffer: usize,
    ) -> (mpsc::Sender<CommandInvocation>, Self) {
        let (sender, receiver) = mpsc::channel(buffer);
        (sender, Self { handler, receiver })
    }

    /// Run until every sender has been dropped
    pub async fn run(mut self) {
        info!("Command dispatcher started");

        while let Some(invocation) = self.receiver.recv().await {
            let handler = self.handler.clone();
            tokio::spawn(async move {
                let CommandInvocation {
                    user_id,
                    text,
                    reply_to,
                } = invocation;

                let reply = handler.handle_text(&user_id, &text).await;
                if reply_to.send(reply).is_err() {
                    debug!(user_id = %user_id, "Requester went away before the reply");
                }
            });
        }

        info!("Command dispatcher stopped");
    }
}
