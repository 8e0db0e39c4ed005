use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;
use wikiwalk_core::site::WIKIPEDIA_PREFIX;

pub const DEFAULT_MODEL_PATH: &str = "./en_wiki_word2vec.txt";

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("wikiwalk")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("wikiwalk")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and progress log lines")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(walk_limit_args(
            command!("walk")
                .about("Play one game from a start page to a target page")
                .arg(
                    arg!(-s --"strategy" <STRATEGY>)
                        .required(false)
                        .help("How the next link is picked")
                        .value_parser(["random", "semantic"])
                        .default_value("random"),
                )
                .arg(
                    arg!(--"start" <URL>)
                        .required(true)
                        .help("Article to start from")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(--"target" <URL>)
                        .required(true)
                        .help("Article to reach")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-m --"model" <PATH>)
                        .required(false)
                        .help("word2vec text model, needed by the semantic strategy")
                        .default_value(DEFAULT_MODEL_PATH),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        ))
        .subcommand(walk_limit_args(
            command!("play")
                .about("Interactive wiki game: pick a strategy, a start and a target, repeat")
                .arg(
                    arg!(-m --"model" <PATH>)
                        .required(false)
                        .help("word2vec text model; without it only the random strategy is offered"),
                ),
        ))
        .subcommand(
            command!("model")
                .about("Load a word2vec model and check which words it knows")
                .arg(
                    arg!(-m --"model" <PATH>)
                        .required(false)
                        .help("word2vec text model")
                        .default_value(DEFAULT_MODEL_PATH),
                )
                .arg(
                    arg!([WORDS] ...)
                        .required(false)
                        .help("Words or article URLs to look up"),
                ),
        )
}

/// Limits shared by every command that walks.
fn walk_limit_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        arg!(--"site" <PREFIX>)
            .required(false)
            .help("Article prefix of the wiki to play on")
            .default_value(WIKIPEDIA_PREFIX),
    )
    .arg(
        arg!(--"max-steps" <STEPS>)
            .required(false)
            .help("Give up after this many hops")
            .value_parser(clap::value_parser!(usize))
            .default_value("500"),
    )
    .arg(
        arg!(--"max-time" <SECONDS>)
            .required(false)
            .help("Give up after this many seconds")
            .value_parser(clap::value_parser!(u64)),
    )
    .arg(
        arg!(--"timeout" <SECONDS>)
            .required(false)
            .help("Request timeout in seconds")
            .value_parser(clap::value_parser!(u64))
            .default_value("10"),
    )
    .arg(
        arg!(--"retries" <COUNT>)
            .required(false)
            .help("Extra attempts for a failed page fetch")
            .value_parser(clap::value_parser!(u32))
            .default_value("2"),
    )
    .arg(
        arg!(--"seed" <SEED>)
            .required(false)
            .help("Seed for the random strategy, for reproducible walks")
            .value_parser(clap::value_parser!(u64)),
    )
    .arg(
        arg!(--"lenient")
            .required(false)
            .help("Only warn about start/target pages that are not articles")
            .action(clap::ArgAction::SetTrue),
    )
}
