use dependabot_rebase::{GitHub, actions, parse_args, run};

/// Prints help or version output and exits; any other clap error is left
/// for the caller to report as a failed run.
fn handle_clap_help_version(clap_err: &clap::Error) {
    use clap::error::ErrorKind;
    if matches!(
        clap_err.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    ) {
        print!("{clap_err}");
        std::process::exit(0);
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn execute() -> anyhow::Result<()> {
    let spec = match parse_args(std::env::args()) {
        Ok(spec) => spec,
        Err(err) => {
            if let Some(clap_err) = err.downcast_ref::<clap::Error>() {
                handle_clap_help_version(clap_err);
            }
            return Err(err);
        }
    };

    let github = GitHub::from_env()?;
    let report = run(&spec, &github).await?;

    let failures = report.failures();
    if !failures.is_empty() {
        let numbers: Vec<String> = failures.iter().map(|(n, _)| format!("#{n}")).collect();
        anyhow::bail!("Failed to process pull requests {}", numbers.join(", "));
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    execute().await.inspect_err(|err| actions::set_failed(&format!("{err:#}")))
}
