use wikiwalk::commands::command_argument_builder;
use wikiwalk::handlers::{handle_model, handle_play, handle_walk, init_logging, print_banner};

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    init_logging(quiet);

    let result = match chosen_command.subcommand() {
        Some(("walk", primary_command)) => handle_walk(primary_command, quiet).await,
        Some(("play", primary_command)) => handle_play(primary_command, quiet).await,
        Some(("model", primary_command)) => handle_model(primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}
