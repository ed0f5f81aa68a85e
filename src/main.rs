//! Terminal client for the chat widget
//!
//! Opens the widget against the configured backend and relays stdin lines as
//! chat messages. Lines starting with `/` are widget commands.

use chat_widget::config::CLIENT_LOG_FILTER;
use chat_widget::render::entry_to_terminal;
use chat_widget::{
    spawn_controller, ChatContext, ChatHandle, ChatView, HttpGateway, LoggingGateway, MessageId,
    Notice, WidgetConfig,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "Commands: /reset  /close  /open  /quit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout stays the transcript
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| CLIENT_LOG_FILTER.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();

    let config = WidgetConfig::from_env()?;
    tracing::info!(
        backend = %config.backend_url,
        brand = %config.brand_id,
        timeout = ?config.request_timeout,
        "Starting chat client"
    );

    let gateway = LoggingGateway::new(HttpGateway::new(
        &config.backend_url,
        config.request_timeout,
    )?);
    let handle = spawn_controller(ChatContext::from(&config), gateway);

    tokio::spawn(print_transcript(handle.clone()));
    tokio::spawn(print_notices(handle.clone()));

    eprintln!("{HELP}");
    handle.open().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/reset" => {
                handle.reset().await?;
                handle.open().await?;
            }
            "/close" => handle.close().await?,
            "/open" => handle.open().await?,
            "/help" => eprintln!("{HELP}"),
            _ => {
                handle.set_draft(line.clone()).await?;
                handle.send_message(line).await?;
            }
        }
    }

    Ok(())
}

/// Print entries as they are appended
async fn print_transcript(handle: ChatHandle) {
    let mut view_rx = handle.subscribe();
    let mut printed: Option<MessageId> = None;
    let mut typing_shown = false;

    loop {
        let view: ChatView = view_rx.borrow_and_update().clone();

        if view.visible {
            for entry in &view.entries {
                if entry.is_typing() {
                    if !typing_shown {
                        println!("{}", entry_to_terminal(entry, &view.title));
                        typing_shown = true;
                    }
                } else if printed.map_or(true, |last| entry.id > last) {
                    println!("{}", entry_to_terminal(entry, &view.title));
                    printed = Some(entry.id);
                }
            }
        }
        if !view.is_typing() {
            typing_shown = false;
        }

        if view_rx.changed().await.is_err() {
            break;
        }
    }
}

async fn print_notices(handle: ChatHandle) {
    let mut notices = handle.notices();
    loop {
        match notices.recv().await {
            Ok(Notice::Rejected { reason }) => eprintln!("! {reason}"),
            Ok(Notice::ConnectivityError { message }) => {
                eprintln!("! Could not reach the chat backend: {message}");
            }
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
}
