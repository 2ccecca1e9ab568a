use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use lexrag::config::AppConfig;
use lexrag::history::ConversationHistory;
use lexrag::llm::ChatModel;
use lexrag::llm::HttpChatClient;
use lexrag::pipeline::RagPipeline;
use lexrag::pipeline::TitleStage;
use lexrag::search::ElasticClient;
use lexrag::setup::Setup;

#[derive(Parser)]
#[command(name = "lexrag")]
#[command(about = "Grounded legal question answering over a private document index")]
#[command(version)]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question and print the grounded answer with its sources
    Ask {
        /// The question to answer
        question: String,
        /// Do not print stage progress
        #[arg(long)]
        quiet: bool,
        /// Persist the exchange as a new conversation
        #[arg(long)]
        save: bool,
    },
    /// Verify the Elasticsearch indices exist, creating missing ones
    Setup,
    /// List stored conversations
    History {
        /// Show the messages of one conversation instead
        #[arg(long)]
        show: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    lexrag::logging::init_logging(Some(&config))?;

    match cli.command {
        Commands::Ask {
            question,
            quiet,
            save,
        } => ask(&config, &question, quiet, save).await?,
        Commands::Setup => {
            let es = Arc::new(ElasticClient::new(&config.elasticsearch)?);
            Setup::new(es, config).verify().await?;
            println!("All indices verified.");
        }
        Commands::History { show } => history(&config, show).await?,
    }

    Ok(())
}

async fn ask(config: &AppConfig, question: &str, quiet: bool, save: bool) -> anyhow::Result<()> {
    let pipeline = RagPipeline::new(config)?;

    let progress = |message: &str| println!("  {message}");
    let response = pipeline
        .process(question, if quiet { None } else { Some(&progress) })
        .await;

    if let Some(error) = &response.error {
        println!("\nError: {error}");
        if let Some(details) = &response.details {
            println!("Details: {details}");
        }
    } else {
        println!("\n{}", response.answer);
        if response.degraded {
            println!("(degraded answer: generation failed)");
        }
        if let Some(sources) = &response.source_documents {
            let hits: Vec<_> = sources.iter().flat_map(|set| set.hits.iter()).collect();
            if !hits.is_empty() {
                println!("\nSources:");
                for (idx, hit) in hits.iter().enumerate() {
                    println!("  {}. {} (score: {:.3})", idx + 1, hit.title(), hit.score);
                }
            }
        }
    }

    if save {
        let es = Arc::new(ElasticClient::new(&config.elasticsearch)?);
        let chat: Arc<dyn ChatModel> = Arc::new(HttpChatClient::new(&config.llm)?);
        let history = ConversationHistory::new(
            es,
            config.elasticsearch.history_index.clone(),
            config.elasticsearch.message_index.clone(),
            TitleStage::new(chat, &config.llm),
        );
        let conversation_id = history.create_conversation(question).await?;
        history
            .record_exchange(&conversation_id, question, &response)
            .await?;
        println!("\nSaved as conversation {conversation_id}");
    }

    Ok(())
}

async fn history(config: &AppConfig, show: Option<String>) -> anyhow::Result<()> {
    let es = Arc::new(ElasticClient::new(&config.elasticsearch)?);
    let chat: Arc<dyn ChatModel> = Arc::new(HttpChatClient::new(&config.llm)?);
    let history = ConversationHistory::new(
        es,
        config.elasticsearch.history_index.clone(),
        config.elasticsearch.message_index.clone(),
        TitleStage::new(chat, &config.llm),
    );

    if let Some(conversation_id) = show {
        for message in history.load_messages(&conversation_id).await? {
            println!("[{}] {}", message.role, message.content);
        }
    } else {
        for conversation in history.list_conversations().await? {
            println!(
                "{}  {}  {}",
                conversation.id, conversation.created_at, conversation.title
            );
        }
    }

    Ok(())
}
