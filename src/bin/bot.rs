use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kissbot_wows_stats::{
    channel::{ChatChannel, ConsoleChannel, DiscordChannel},
    AdmissionGate, CommandHandler, Config, MatchMonitor, MatchPipeline, StatsClient,
    WargamingProvider,
};

#[derive(Parser)]
#[command(name = "wows-bot")]
#[command(about = "World of Warships match stats bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to config/config.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the replay folder and post stats of every match
    Run {
        /// Print messages instead of posting them to Discord
        #[arg(long)]
        dry_run: bool,
    },

    /// Look up one player's stats in one ship
    Lookup {
        player: String,

        /// Ship name, may be several words
        #[arg(required = true, num_args = 1..)]
        ship: Vec<String>,
    },

    /// Resolve a (possibly misspelled) ship name
    Ship {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
}

fn stats_client(config: &Config) -> anyhow::Result<Arc<StatsClient>> {
    let gate = Arc::new(AdmissionGate::per_second(config.rate_limit()?));
    let provider = WargamingProvider::new(
        config.wargaming.region,
        config.wargaming.application_id.clone(),
        gate,
        config.request_timeout(),
    )?;
    Ok(Arc::new(StatsClient::new(Arc::new(provider))))
}

async fn run(config: Config, dry_run: bool) -> anyhow::Result<()> {
    config.validate(!dry_run)?;

    let client = stats_client(&config)?;
    let channel: Arc<dyn ChatChannel> = if dry_run {
        Arc::new(ConsoleChannel::new())
    } else {
        Arc::new(DiscordChannel::new(
            config.discord.token.clone(),
            config.discord.channel_id.clone(),
            config.discord.max_message_length,
        )?)
    };
    tracing::info!("✅ Posting to {} ({} region)", channel.name(), config.wargaming.region);

    let pipeline = Arc::new(MatchPipeline::new(
        Arc::clone(&client),
        Arc::clone(&channel),
        config.pipeline_options(),
    ));
    let commands = CommandHandler::new(client, config.commands.prefix.clone());

    let (_monitor, mut events) = if config.monitor.enabled {
        let (monitor, events) = MatchMonitor::spawn(&config.monitor.replay_folder, config.quiet_period())?;
        (Some(monitor), Some(events))
    } else {
        tracing::warn!("⚠️ Match monitor disabled, only answering commands");
        (None, None)
    };

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("🛑 Received Ctrl-C, shutting down...");
                break;
            }
            Some(event) = async { events.as_mut()?.recv().await }, if events.is_some() => {
                pipeline.handle_event(event);
            }
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if let Some(reply) = commands.handle(&line).await {
                        if let Err(e) = channel.send(reply).await {
                            tracing::error!("Failed to send command reply: {}", e);
                        }
                    }
                }
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::warn!("Stopped reading commands from stdin: {}", e);
                    stdin_open = false;
                }
            },
        }
    }

    pipeline.abandon();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kissbot_wows_stats=debug,wows_bot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { dry_run } => run(config, dry_run).await?,

        Commands::Lookup { player, ship } => {
            config.validate_api()?;
            let commands = CommandHandler::new(stats_client(&config)?, config.commands.prefix.clone());
            let content = format!("{} {} {}", commands.prefix(), player, ship.join(" "));

            if let Some(reply) = commands.handle(&content).await {
                println!("{}", ConsoleChannel::render(&reply));
            }
        }

        Commands::Ship { name } => {
            config.validate_api()?;
            let name = name.join(" ");
            let ship = stats_client(&config)?.resolve_ship_id(&name).await?;

            println!("🚢 {} (ID {})", ship.name, ship.ship_id);
            if let Some(warning) = ship.warning {
                println!("   {}", warning);
            }
        }
    }

    Ok(())
}
