//! Marketing analytics report CLI.

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::{ColorChoice, Parser};
use pulse_model::ReportKind;
use tracing::level_filters::LevelFilter;

use pulse_cli::cli::{Cli, Command, LogFormatArg, LogLevelArg, RenderArg};
use pulse_cli::commands::{
    CommandOutput, run_campaigns, run_compare, run_config_check, run_pagesense, run_posts,
    run_report, run_videos,
};
use pulse_cli::logging::{LogConfig, LogFormat, init_logging};
use pulse_cli::summary::{config_status_table, print_headlines, print_report, print_warnings};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> Result<i32> {
    let output = match &cli.command {
        Command::ConfigCheck(args) => {
            let results = run_config_check(cli.config.as_deref(), args)?;
            println!("{}", config_status_table(&results));
            let complete = results.iter().all(|(_, result)| result.is_ok());
            return Ok(if complete { 0 } else { 1 });
        }
        Command::Compare(args) => run_compare(args)?,
        Command::Pagesense(args) => run_pagesense(args)?,
        Command::Campaigns(args) => run_campaigns(args)?,
        Command::Posts(args) => run_posts(args)?,
        Command::Videos(args) => run_videos(args)?,
        Command::Traffic(args) => run_report(ReportKind::Traffic, args)?,
        Command::Search(args) => run_report(ReportKind::Search, args)?,
        Command::Pages(args) => run_report(ReportKind::TopPages, args)?,
        Command::Keywords(args) => run_report(ReportKind::Keywords, args)?,
        Command::LandingPages(args) => run_report(ReportKind::LandingPages, args)?,
        Command::Channels(args) => run_report(ReportKind::Channels, args)?,
    };
    print_output(&output, cli.render)?;
    Ok(0)
}

fn print_output(output: &CommandOutput, render: RenderArg) -> Result<()> {
    print_warnings(&output.warnings);
    for (idx, section) in output.sections.iter().enumerate() {
        if idx > 0 {
            println!();
        }
        print_headlines(&section.headlines);
        print_report(&section.title, &section.table, render)?;
    }
    Ok(())
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
