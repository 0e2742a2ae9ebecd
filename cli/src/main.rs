use clap::{Parser, Subcommand};
use critbot_cli::CliContext;
use critbot_cli::commands;
use critbot_cli::logging;
use critbot_cli::readline;
use std::io::Write;

#[tokio::main]
async fn main() -> Result<(), String> {
    let _log_guard = logging::init();
    let ctx = CliContext::new();

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &ctx).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                writeln!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(version, about = "critbot console")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current configuration.
    Config,
    /// Change one battle setting and save.
    Set {
        #[arg(short, long)]
        field: String,
        #[arg(short, long)]
        value: String,
    },
    /// Print the full-HP capture-rate table.
    Rates,
    /// Dry-run one battle against a scripted client.
    Simulate {
        /// Capture rate shown at full HP, in percent.
        #[arg(short, long)]
        rate: f32,
    },
    Pause,
    Resume,
    Stop,
    Exit,
}

async fn respond(line: &str, ctx: &CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "critbot".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match &cli.command {
        Some(Commands::Config) => commands::show_config(ctx).await,
        Some(Commands::Set { field, value }) => commands::set_field(ctx, field, value).await?,
        Some(Commands::Rates) => commands::show_rates(),
        Some(Commands::Simulate { rate }) => commands::simulate(ctx, *rate).await?,
        Some(Commands::Pause) => commands::pause(ctx),
        Some(Commands::Resume) => commands::resume(ctx),
        Some(Commands::Stop) => commands::stop(ctx),
        Some(Commands::Exit) => {
            commands::exit();
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
