//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;
use std::path::Path;

fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

#[test]
fn cli_parse_resolve() {
    match parse(&["streamfind", "resolve", "https://example.com/canal.html"]) {
        CliCommand::Resolve { page_url, name } => {
            assert_eq!(page_url, "https://example.com/canal.html");
            assert_eq!(name, "cli");
        }
        _ => panic!("expected Resolve"),
    }
}

#[test]
fn cli_parse_resolve_name() {
    match parse(&["streamfind", "resolve", "sitio.com/c", "--name", "Canal 10"]) {
        CliCommand::Resolve { page_url, name } => {
            assert_eq!(page_url, "sitio.com/c");
            assert_eq!(name, "Canal 10");
        }
        _ => panic!("expected Resolve with --name"),
    }
}

#[test]
fn cli_parse_run_defaults() {
    match parse(&["streamfind", "run"]) {
        CliCommand::Run { jobs, output } => {
            assert!(jobs.is_none());
            assert!(output.is_none());
        }
        _ => panic!("expected Run"),
    }
}

#[test]
fn cli_parse_run_jobs_and_output() {
    match parse(&["streamfind", "run", "--jobs", "4", "--output", "/tmp/varios.m3u"]) {
        CliCommand::Run { jobs, output } => {
            assert_eq!(jobs, Some(4));
            assert_eq!(output.as_deref(), Some(Path::new("/tmp/varios.m3u")));
        }
        _ => panic!("expected Run with options"),
    }
}

#[test]
fn cli_parse_channels() {
    assert!(matches!(parse(&["streamfind", "channels"]), CliCommand::Channels));
}

#[test]
fn cli_rejects_missing_url_and_bad_jobs() {
    assert!(Cli::try_parse_from(["streamfind", "resolve"]).is_err());
    assert!(Cli::try_parse_from(["streamfind", "run", "--jobs", "many"]).is_err());
    assert!(Cli::try_parse_from(["streamfind", "import-har", "x.har"]).is_err());
}
