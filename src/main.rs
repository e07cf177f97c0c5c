use clap::{Args as ClapArgs, Parser, Subcommand};
use dotenv::dotenv;
use fable_rs::adk::model::gemini::GeminiModel;
use fable_rs::fable::config::FableConfig;
use fable_rs::fable::grammar::LocalGrammar;
use fable_rs::fable::store::FileStore;
use fable_rs::fable::workflow::StoryWorkflow;
use fable_rs::fable::{SessionView, StoryService};

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Write a story with an LLM, revise it with your feedback",
    long_about = None
)]
struct Args {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ClapArgs, Debug)]
struct GlobalOpts {
    /// YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Gemini model name (overrides config and FABLE_MODEL)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Directory holding session checkpoints
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Run the local grammar pass after the first draft
    #[arg(long, global = true)]
    grammar: bool,

    /// Print sessions as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a new story session
    Start {
        /// The story prompt
        #[arg(short, long)]
        prompt: String,

        /// Use this session id instead of a generated one
        #[arg(short, long)]
        session_id: Option<String>,
    },
    /// Give feedback on a suspended session, or "done" to finish it
    Feedback {
        #[arg(short, long)]
        session_id: String,

        #[arg(short, long)]
        text: String,
    },
    /// Show the current state of a session
    Show {
        #[arg(short, long)]
        session_id: String,
    },
    /// List stored sessions
    List,
    /// Run a whole session in the terminal, reading feedback from stdin
    Interactive {
        #[arg(short, long)]
        prompt: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = resolve_config(&args.global)?;

    log::info!(
        "Using model {} with store {:?} (grammar pass: {})",
        config.model,
        config.store_dir,
        config.grammar_pass
    );

    let service = build_service(&config)?;
    let json = args.global.json;

    match args.command {
        Commands::Start { prompt, session_id } => {
            let view = service.start(&prompt, session_id).await?;
            print_view(&view, json)?;
        }
        Commands::Feedback { session_id, text } => {
            let view = service.resume(&session_id, &text).await?;
            print_view(&view, json)?;
        }
        Commands::Show { session_id } => {
            let view = service.get(&session_id).await?;
            print_view(&view, json)?;
        }
        Commands::List => {
            for id in service.list().await? {
                println!("{}", id);
            }
        }
        Commands::Interactive { prompt } => {
            run_interactive(&service, &prompt, json).await?;
        }
    }

    Ok(())
}

fn resolve_config(
    opts: &GlobalOpts,
) -> Result<FableConfig, Box<dyn std::error::Error + Send + Sync>> {
    let mut config = FableConfig::load(opts.config.as_deref())?;
    if let Some(model) = &opts.model {
        config.model = model.clone();
    }
    if let Some(dir) = &opts.store_dir {
        config.store_dir = dir.clone();
    }
    if opts.grammar {
        config.grammar_pass = true;
    }
    config.validate()?;
    Ok(config)
}

fn build_service(
    config: &FableConfig,
) -> Result<StoryService, Box<dyn std::error::Error + Send + Sync>> {
    let model = Arc::new(GeminiModel::new(config.model.clone())?);

    let mut workflow = StoryWorkflow::new(model, &config.prompts)
        .with_generation_config(config.generation.clone());
    if config.grammar_pass {
        workflow = workflow.with_grammar(Arc::new(LocalGrammar::new()));
    }

    let store = Arc::new(FileStore::new(config.store_dir.clone()));
    Ok(StoryService::new(workflow, store))
}

async fn run_interactive(
    service: &StoryService,
    prompt: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut view = service.start(prompt, None).await?;
    print_view(&view, json)?;

    let stdin = io::stdin();
    while view.requires_feedback {
        print!("\nProvide feedback (or type 'done' to finish revisions): ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!(
                "\nSession {} saved; resume it with `fable feedback`.",
                view.session_id
            );
            return Ok(());
        }

        let feedback = line.trim_end_matches(['\r', '\n']);
        match service.resume(&view.session_id, feedback).await {
            Ok(next) => {
                view = next;
                print_view(&view, json)?;
            }
            Err(fable_rs::fable::StoryError::EmptyFeedback) => {
                println!("Feedback must not be empty.");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

fn print_view(
    view: &SessionView,
    json: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }

    println!("Session:   {}", view.session_id);
    println!("Revisions: {}", view.revision_count);
    if let Some(title) = &view.title {
        println!("Title:     {}", title);
    }
    println!("\n{}\n", view.story.trim());
    if let Some(moral) = &view.moral {
        println!("Moral: {}\n", moral);
    }
    println!("History:");
    for entry in &view.history {
        println!("  - {}", entry);
    }
    println!("\n{}", view.message);
    Ok(())
}
