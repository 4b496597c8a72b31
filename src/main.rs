use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use tokio_util::sync::CancellationToken;

use lhimpact_core::{GithubConfig, ImpactConfig};
use lhimpact_github::generator::CommandReportGenerator;
use lhimpact_github::gists::GistStore;
use lhimpact_github::pipeline::{ImpactPipeline, PipelineOptions, RunOutcome};
use lhimpact_github::pulls::{parse_pr_reference, GitHubPrClient};

#[derive(Parser)]
#[command(
    name = "lhimpact",
    version,
    about = "Report the Lighthouse score impact of merging a pull request",
    long_about = "lhimpact measures a pull request twice — on its base branch and after merging\n\
                   its head branch — and publishes the score difference as a pull-request\n\
                   comment, with both raw reports stored as gists for the Lighthouse viewer.\n\n\
                   Examples:\n  \
                     lhimpact report --pr owner/repo#42 --report-command 'node ./lighthouse.mjs'\n  \
                     lhimpact init                 Write a .lhimpact.toml template\n  \
                     lhimpact completions bash     Generate shell completions"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .lhimpact.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Measure a pull request and publish the impact comment
    #[command(long_about = "Measure a pull request and publish the impact comment.\n\n\
        Checks out the PR's base branch, installs dependencies, generates a Lighthouse\n\
        report, merges the head branch, measures again, then creates or updates two\n\
        gists and one pull-request comment.\n\n\
        Examples:\n  lhimpact report --pr owner/repo#42\n  \
        lhimpact report --pr owner/repo#42 --report-path lighthouse-report.json")]
    Report {
        /// Pull request to report on (format: owner/repo#123)
        #[arg(
            long,
            long_help = "Pull request to report on.\n\nFormat: owner/repo#123\nRequires GITHUB_TOKEN or --github-token."
        )]
        pr: String,

        /// Project directory the git and build commands run in
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Command that produces a Lighthouse report
        #[arg(
            long,
            long_help = "Command that produces a Lighthouse report.\n\nRun once per branch state. Writes JSON to --report-path, or to stdout\nwhen no path is configured."
        )]
        report_command: Option<String>,

        /// File the report command writes its JSON to
        #[arg(long)]
        report_path: Option<PathBuf>,

        /// Dependency installation command (default: npm install)
        #[arg(long)]
        install_command: Option<String>,

        /// GitHub token for gists and comments (default: GITHUB_TOKEN env var)
        #[arg(long)]
        github_token: Option<String>,

        /// Token used only for gists (default: the GitHub token)
        #[arg(long)]
        gist_token: Option<String>,

        /// Token used only for comments (default: the GitHub token)
        #[arg(long)]
        comment_token: Option<String>,

        /// Create the report gists as secret gists
        #[arg(long)]
        secret_gists: bool,

        /// Output format for the run result
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Write a .lhimpact.toml configuration template
    Init,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Machine-readable JSON with camelCase keys
    Json,
}

const DEFAULT_CONFIG: &str = r#"# lhimpact configuration
# See: https://github.com/lhimpact/lhimpact

[github]
# Primary token, used wherever a more specific one is not set.
# Usually provided via GITHUB_TOKEN instead.
# token = "ghp_xxxx"
# gist_token = "ghp_xxxx"
# comment_token = "ghp_xxxx"

[commands]
# install = "npm install"
# report = "node ./generate-lighthouse-report.mjs"
# report_path = "lighthouse-report.json"
"#;

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => ImpactConfig::from_file(path).into_diagnostic()?,
        None => {
            let default_path = std::path::Path::new(".lhimpact.toml");
            if default_path.exists() {
                ImpactConfig::from_file(default_path).into_diagnostic()?
            } else {
                ImpactConfig::default()
            }
        }
    };

    match cli.command {
        Command::Report {
            pr,
            project_dir,
            report_command,
            report_path,
            install_command,
            github_token,
            gist_token,
            comment_token,
            secret_gists,
            format,
        } => {
            let locator = parse_pr_reference(&pr).into_diagnostic()?;

            let github = GithubConfig {
                token: github_token
                    .or_else(|| std::env::var("GITHUB_TOKEN").ok())
                    .or(config.github.token),
                gist_token: gist_token
                    .or_else(|| std::env::var("LHIMPACT_GIST_TOKEN").ok())
                    .or(config.github.gist_token),
                comment_token: comment_token
                    .or_else(|| std::env::var("LHIMPACT_COMMENT_TOKEN").ok())
                    .or(config.github.comment_token),
            };
            let credentials = github.credentials().into_diagnostic()?;

            let report_command =
                report_command
                    .or(config.commands.report)
                    .ok_or_else(|| {
                        miette::miette!(
                            "no report command configured; pass --report-command or set \
                             [commands].report in .lhimpact.toml"
                        )
                    })?;
            let report_path = report_path.or(config.commands.report_path);
            let install_command = install_command.unwrap_or(config.commands.install);

            let cancel = CancellationToken::new();
            let signal_cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received, cancelling");
                    signal_cancel.cancel();
                }
            });

            let pull =
                GitHubPrClient::new(&credentials.comment_token, locator.clone()).into_diagnostic()?;
            let runner = lhimpact_github::exec::ShellRunner::new(&project_dir, cancel.clone());
            let generator = CommandReportGenerator::new(
                report_command,
                &project_dir,
                report_path,
                cancel.clone(),
            );
            let artifacts = GistStore::new(credentials.gist_token);
            let comments =
                GitHubPrClient::new(&credentials.comment_token, locator.clone()).into_diagnostic()?;

            let pipeline = ImpactPipeline::new(
                pull,
                runner,
                generator,
                artifacts,
                comments,
                PipelineOptions {
                    locator,
                    install_command,
                    secret_gists,
                },
            );

            match pipeline.run(&cancel).await.into_diagnostic()? {
                RunOutcome::Published(impact) => match format {
                    OutputFormat::Text => {
                        println!("base report:  {}", impact.base_gist.html_url);
                        println!("head report:  {}", impact.head_gist.html_url);
                        println!("comment:      {}", impact.comment.html_url);
                    }
                    OutputFormat::Json => {
                        println!(
                            "{}",
                            serde_json::to_string_pretty(&impact).into_diagnostic()?
                        );
                    }
                },
                RunOutcome::CommentCorrupted => {
                    eprintln!(
                        "A previous impact comment exists but its gist markers are gone; \
                         nothing was published. Delete the comment and re-run."
                    );
                }
                RunOutcome::Cancelled => {
                    eprintln!("Cancelled; partially published artifacts were left in place.");
                }
            }
        }
        Command::Init => {
            let path = std::path::Path::new(".lhimpact.toml");
            if path.exists() {
                miette::bail!(".lhimpact.toml already exists, not overwriting");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Wrote .lhimpact.toml");
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lhimpact={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
