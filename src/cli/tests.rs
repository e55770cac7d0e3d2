//! Unit tests for CLI commands

use crate::cli::{parse_key_value, run_cli, Cli, Commands};
use clap::Parser;

#[test]
fn test_routes_command_parses() {
    let cli = Cli::try_parse_from(["brrtrouting", "routes", "--manifest", "routes.toml"]).unwrap();
    match cli.command {
        Commands::Routes { manifest } => assert_eq!(manifest.to_string_lossy(), "routes.toml"),
        _ => panic!("Expected Routes command"),
    }
}

#[test]
fn test_match_command_defaults_to_get() {
    let cli = Cli::try_parse_from(["brrtrouting", "match", "-m", "r.toml", "/users/1"]).unwrap();
    match cli.command {
        Commands::Match {
            method, host, path, ..
        } => {
            assert_eq!(method, "GET");
            assert!(host.is_none());
            assert_eq!(path, "/users/1");
        }
        _ => panic!("Expected Match command"),
    }
}

#[test]
fn test_link_command_collects_values() {
    let cli = Cli::try_parse_from([
        "brrtrouting",
        "link",
        "--manifest",
        "r.toml",
        "--name",
        "user",
        "--ambient",
        "controller=Home",
        "id=5",
        "q=a=b",
    ])
    .unwrap();
    match cli.command {
        Commands::Link {
            name, ambient, values, ..
        } => {
            assert_eq!(name.as_deref(), Some("user"));
            assert_eq!(ambient, vec![("controller".to_string(), "Home".to_string())]);
            assert_eq!(
                values,
                vec![
                    ("id".to_string(), "5".to_string()),
                    ("q".to_string(), "a=b".to_string())
                ]
            );
        }
        _ => panic!("Expected Link command"),
    }
}

#[test]
fn test_invalid_arguments_are_rejected() {
    assert!(
        Cli::try_parse_from(["brrtrouting", "link", "--manifest", "r.toml", "novalue"]).is_err()
    );
    assert!(Cli::try_parse_from(["brrtrouting", "parse", "--manifest", "r.toml", "/a"]).is_err());
    assert!(Cli::try_parse_from(["brrtrouting", "routes"]).is_err());
    assert!(parse_key_value("=x").is_err());
    assert_eq!(parse_key_value("k=").unwrap(), ("k".to_string(), String::new()));
}

#[test]
fn test_run_cli_against_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("routes.toml");
    std::fs::write(
        &manifest,
        "[[endpoints]]\ntemplate = \"/users/{id:int}\"\nname = \"user\"\n",
    )
    .unwrap();
    let path = manifest.to_string_lossy().to_string();

    for args in [
        vec!["brrtrouting", "routes", "--manifest", path.as_str()],
        vec!["brrtrouting", "match", "--manifest", path.as_str(), "/users/3"],
        vec!["brrtrouting", "link", "--manifest", path.as_str(), "--name", "user", "id=3"],
        vec!["brrtrouting", "parse", "--manifest", path.as_str(), "--name", "user", "/users/3"],
    ] {
        run_cli(Cli::try_parse_from(args).unwrap()).unwrap();
    }

    let bad_method = Cli::try_parse_from([
        "brrtrouting",
        "match",
        "--manifest",
        path.as_str(),
        "--method",
        "G T",
        "/users/3",
    ])
    .unwrap();
    assert!(run_cli(bad_method).is_err());

    let missing =
        Cli::try_parse_from(["brrtrouting", "routes", "--manifest", "/nonexistent/routes.toml"])
            .unwrap();
    assert!(run_cli(missing).is_err());
}
