use clap::Parser;
use dotenv::dotenv;
use f9_assistant::models::chat::Role;
use f9_assistant::session::{ SessionEvent, SessionOptions, SessionState, TurnOutcome };
use f9_assistant::session::transport::{ ChatTransport, HttpTransport };
use f9_assistant::widget::fallback::FallbackWidget;
use f9_assistant::widget::panel::{ ChatPanel, ScrollHost };
use f9_assistant::widget::{ open_widget, ChatWidget };
use log::{ debug, error };
use std::error::Error;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{ AsyncBufReadExt, BufReader };

#[derive(Parser, Debug)]
#[command(author, version, about = "Chat with the F9 Productions assistant from a terminal", long_about = None)]
struct ChatArgs {
    /// Chat proxy endpoint.
    #[arg(long, env = "CHAT_ENDPOINT", default_value = "http://127.0.0.1:3000/api/chatbot")]
    endpoint: String,

    /// Use the fallback widget instead of the primary one.
    #[arg(long, default_value = "false")]
    fallback: bool,

    /// Optional request timeout in seconds.
    #[arg(long, env = "CHAT_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,
}

struct TerminalScreen;

impl ScrollHost for TerminalScreen {
    fn lock_scroll(&self) {
        debug!("chat window opened");
    }

    fn unlock_scroll(&self) {
        debug!("chat window closed");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = ChatArgs::parse();

    let transport: Arc<dyn ChatTransport> = match args.timeout_secs {
        Some(secs) => Arc::new(HttpTransport::with_timeout(&args.endpoint, Duration::from_secs(secs))?),
        None => Arc::new(HttpTransport::new(&args.endpoint)?),
    };
    let widget: Box<dyn ChatWidget> = if args.fallback {
        Box::new(FallbackWidget::new(transport.clone(), SessionOptions::fallback()))
    } else {
        open_widget(transport.clone())
    };

    let mut panel = ChatPanel::new(widget, transport, Arc::new(TerminalScreen));
    let mut events = panel.widget().session().subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if event == SessionEvent::StateChanged(SessionState::Sending) {
                println!("(F9 Architecture Assistant is typing...)");
            }
        }
    });

    panel.open();
    for message in panel.widget().session().history() {
        if message.role == Role::Assistant {
            println!("assistant> {}\n", message.content);
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;
        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };
        if matches!(line.trim(), "/quit" | "/exit") {
            break;
        }

        match panel.send(&line).await {
            Ok(TurnOutcome::Replied(reply)) | Ok(TurnOutcome::Failed(reply)) => {
                println!("assistant> {}\n", reply.content);
            }
            Err(e) => error!("{}", e),
        }
    }

    panel.close();
    Ok(())
}
