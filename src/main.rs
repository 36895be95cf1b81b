//! Terminal front end for the chat widget
//!
//! Renders the conversation line by line on stdout. Type a message and press
//! enter to send it, `/status` to re-check connectivity, `/quit` to leave.

use chat_widget::messages::Sender;
use chat_widget::{ChatController, HttpTransport, LoggingTransport, ViewEvent, WidgetConfig};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; stdout belongs to the chat view
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_widget=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = WidgetConfig::from_env();
    tracing::info!(base_url = %config.base_url, "Connecting to chat service");

    let transport = LoggingTransport::new(HttpTransport::new(&config.base_url));
    let (mut controller, handle) = ChatController::new(config.context(), transport);
    if let Some(period) = config.health_poll_interval {
        controller = controller.with_health_poll(period);
    }

    let renderer = tokio::spawn(render(handle.subscribe()));
    let task = controller.spawn();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/status" => handle.refresh_status().await?,
            _ => handle.submit(line.as_str()).await?,
        }
    }

    handle.shutdown();
    task.await?;
    renderer.abort();
    Ok(())
}

/// Print view events as they arrive
async fn render(mut views: broadcast::Receiver<ViewEvent>) {
    let mut stdout = std::io::stdout();
    loop {
        let event = match views.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "View fell behind");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        let _ = match event {
            ViewEvent::MessageAppended { message } if message.text.is_empty() => {
                write!(stdout, "bot> ")
            }
            ViewEvent::MessageAppended { message } => {
                let prefix = match (message.sender, message.is_error) {
                    (Sender::User, _) => "you>",
                    (Sender::Bot, false) => "bot>",
                    (Sender::Bot, true) => "bot!",
                };
                writeln!(stdout, "{prefix} {}", message.text)
            }
            // Redraw the streaming welcome line
            ViewEvent::MessageUpdated { message } => write!(stdout, "\rbot> {}", message.text),
            ViewEvent::StatusChanged { status } => writeln!(stdout, "\n[status: {status}]"),
            ViewEvent::InputEnabled { enabled: true } => writeln!(stdout),
            ViewEvent::Rejected { reason } => writeln!(stdout, "[{reason}]"),
            ViewEvent::InputEnabled { enabled: false } | ViewEvent::InputCleared => Ok(()),
        };
        let _ = stdout.flush();
    }
}
