use anyhow::{Context, Result};
use chat_client::config::get_configuration;
use chat_client::extract::analyze_message;
use chat_client::models::user::{LoginRequest, RegisterRequest};
use chat_client::services::document_client::FileUpload;
use chat_client::session::{AuthSession, FileTokenStore};
use chat_client::upload::UploadStatus;
use chat_client::AppState;
use chat_core::observability::init_tracing;
use chat_core::ClientError;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "chat-client")]
#[command(about = "Chat with your documents from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "DOCCHAT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "DOCCHAT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// List conversations
    Conversations,
    NewConversation {
        title: String,
    },
    Messages {
        conversation_id: String,
    },
    /// Send a message and print the reply with any detected visualization
    Ask {
        conversation_id: String,
        message: String,
    },
    /// Upload a document and wait until it is processed
    Upload {
        conversation_id: String,
        file: PathBuf,
    },
    Search {
        query: String,
        #[arg(long)]
        conversation_id: Option<String>,
        #[arg(long, default_value = "5")]
        limit: u32,
    },
    /// Check whether the document processor is available
    Health,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ClientError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(state: &AppState, command: Command) -> Result<(), ClientError> {
    match command {
        Command::Login { email, password } => {
            let user = state.auth.login(&LoginRequest { email, password }).await?;
            let name = user.map(|u| u.display_name()).unwrap_or_default();
            println!("Logged in {}", name);
        }
        Command::Register {
            name,
            email,
            password,
        } => {
            state
                .auth
                .register(&RegisterRequest {
                    name,
                    email,
                    password,
                })
                .await?;
            println!("Account created");
        }
        Command::Logout => {
            state.auth.logout().await?;
            println!("Logged out");
        }
        Command::Conversations => {
            for conversation in state.chat.list_conversations().await? {
                println!("{}\t{}", conversation.id, conversation.display_title());
            }
        }
        Command::NewConversation { title } => {
            let conversation = state.chat.create_conversation(&title).await?;
            println!("{}", conversation.id);
        }
        Command::Messages { conversation_id } => {
            for message in state.chat.get_messages(&conversation_id).await? {
                println!("[{:?}] {}", message.role, message.content);
            }
        }
        Command::Ask {
            conversation_id,
            message,
        } => {
            let reply = state.chat.send_message(&conversation_id, &message).await?;
            println!("{}", reply.content);
            for source in &reply.sources {
                println!(
                    "  source: {} ({:.2})",
                    source.document_name.as_deref().unwrap_or("unknown"),
                    source.score.unwrap_or_default()
                );
            }

            let insights = analyze_message(&reply.content);
            if insights.visualization.is_some() || !insights.references.is_empty() {
                print_json(&insights)?;
            }
        }
        Command::Upload {
            conversation_id,
            file,
        } => {
            let upload = FileUpload::from_path(&file).await?;
            let mut updates = state.processor.subscribe();
            let watcher = tokio::spawn(async move {
                while updates.changed().await.is_ok() {
                    let session = updates.borrow().clone();
                    if session.status != UploadStatus::Idle {
                        eprintln!("{:?} {}%", session.status, session.progress);
                    }
                }
            });

            let outcome = state
                .processor
                .process_document(&upload, &conversation_id)
                .await;
            watcher.abort();
            print_json(&outcome)?;
        }
        Command::Search {
            query,
            conversation_id,
            limit,
        } => {
            let chunks = state
                .documents
                .search(&query, conversation_id.as_deref(), limit)
                .await?;
            print_json(&chunks)?;
        }
        Command::Health => {
            let health = state.documents.processor_health().await?;
            print_json(&health)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = get_configuration().context("Failed to load configuration")?;

    init_tracing(
        "chat-client",
        &settings.logging.level,
        settings.logging.otlp_endpoint.as_deref(),
    )?;

    let store = Arc::new(FileTokenStore::new(settings.auth.token_path.clone()));
    let session = Arc::new(AuthSession::init(store).await?);
    let state = AppState::new(&settings, session)?;

    match run(&state, cli.command).await {
        Ok(()) => Ok(()),
        Err(e @ ClientError::Unauthorized(_)) => {
            tracing::warn!(error = %e, "Not authenticated");
            anyhow::bail!("{} Run `chat-client login`.", e.user_message())
        }
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            Err(anyhow::anyhow!(e.user_message()))
        }
    }
}
