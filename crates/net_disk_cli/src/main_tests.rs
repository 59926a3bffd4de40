use super::*;
use clap::CommandFactory;

#[test]
fn test_cli_definition_is_valid() {
    Cli::command().debug_assert();
}

#[test]
fn test_global_options_after_subcommand() {
    let cli = Cli::try_parse_from([
        "net-disk",
        "ls",
        "notes",
        "docs",
        "--config",
        "/tmp/nd.toml",
        "--token",
        "abc",
    ])
    .unwrap();

    assert_eq!(cli.config.as_deref(), Some("/tmp/nd.toml"));
    assert_eq!(cli.token.as_deref(), Some("abc"));
    match cli.command {
        Commands::Ls(args) => {
            assert_eq!(args.repo, "notes");
            assert_eq!(args.path.as_deref(), Some("docs"));
        }
        _ => panic!("Expected ls"),
    }
}

#[test]
fn test_upload_arguments() {
    let cli = Cli::try_parse_from([
        "net-disk", "upload", "notes", "a.txt", "photos", "--dest", "img", "-y", "-m", "Import",
    ])
    .unwrap();

    match cli.command {
        Commands::Upload(args) => {
            assert_eq!(args.paths.len(), 2);
            assert_eq!(args.dest.as_deref(), Some("img"));
            assert!(args.yes);
            assert!(!args.flat);
            assert_eq!(args.message.as_deref(), Some("Import"));
        }
        _ => panic!("Expected upload"),
    }
}

#[test]
fn test_upload_requires_paths() {
    assert!(Cli::try_parse_from(["net-disk", "upload", "notes"]).is_err());
}

#[test]
fn test_repos_create_flags() {
    let cli = Cli::try_parse_from([
        "net-disk",
        "repos",
        "create",
        "archive",
        "--private",
        "--no-readme",
    ])
    .unwrap();

    match cli.command {
        Commands::Repos(ReposCommands::Create {
            name,
            description,
            private,
            no_readme,
        }) => {
            assert_eq!(name, "archive");
            assert_eq!(description, "");
            assert!(private);
            assert!(no_readme);
        }
        _ => panic!("Expected repos create"),
    }
}

#[test]
fn test_exit_codes() {
    assert_eq!(exit_code(&Error::InvalidArguments("x".to_string())), 2);
    assert_eq!(exit_code(&Error::Auth("x".to_string())), 1);
}
