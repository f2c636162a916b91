//! CLI entry point, the composition root.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use mcpvisor_cli::handlers::{self, add::AddArgs};
use mcpvisor_cli::{Cli, CliConfig, CliError, Commands, bootstrap};

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(mut cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command.take() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = CliConfig::from_cli(&cli)?;
    let ctx = bootstrap(config).await?;

    match command {
        Commands::List => handlers::list::execute(&ctx).await?,
        Commands::Templates { category } => {
            handlers::templates::execute(&ctx, category.as_deref())?;
        }
        Commands::Add {
            name,
            command,
            args,
            env,
            provider_type,
            description,
            no_auto_start,
        } => {
            let args = AddArgs {
                name,
                command,
                args,
                env,
                provider_type,
                description,
                auto_start: !no_auto_start,
            };
            handlers::add::execute(&ctx, args).await?;
        }
        Commands::AddTemplate {
            template,
            args,
            name,
            env,
        } => handlers::add::from_template(&ctx, &template, name, args, env).await?,
        Commands::Remove { provider } => handlers::remove::execute(&ctx, &provider).await?,
        Commands::Enable { provider } => handlers::toggle::execute(&ctx, &provider, true).await?,
        Commands::Disable { provider } => {
            handlers::toggle::execute(&ctx, &provider, false).await?;
        }
        Commands::Test { provider } => handlers::test::execute(&ctx, &provider).await?,
        Commands::Export { output } => {
            handlers::transfer::export(&ctx, output.as_deref()).await?;
        }
        Commands::Import { file } => handlers::transfer::import(&ctx, &file).await?,
        Commands::Run => handlers::run::execute(&ctx).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before clap reads them
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let code = err
                .downcast_ref::<CliError>()
                .map_or(1, CliError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
