use anyhow::Result;
use clap::{arg, command, value_parser, ArgAction, ArgMatches, Command};
use colored::Colorize;
use gurlz::execute::{
    add_request, edit_request, format_added, format_details, format_list, list_requests,
    ping_request, remove_request, show_request, RequestEdit,
};
use gurlz::http_request_executor::render_response;
use gurlz::logger::init_logger;
use gurlz::storage::StorageManager;
use std::path::PathBuf;

fn cli() -> Command {
    let request_args = |cmd: Command| {
        cmd.arg(
            arg!(-X --method <METHOD>)
                .help("HTTP method")
                .value_parser(value_parser!(String)),
        )
        .arg(
            arg!(-H --header <HEADER>)
                .help("HTTP headers as 'Key: Value' (can be used multiple times)")
                .value_parser(value_parser!(String))
                .action(ArgAction::Append),
        )
        .arg(
            arg!(-d --data <BODY>)
                .help("Request body data")
                .value_parser(value_parser!(String)),
        )
    };

    Command::new("gurlz")
        .author(clap::crate_authors!())
        .version(clap::crate_version!())
        .about(clap::crate_description!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(arg!(-v --verbose "Print debug logs to stderr").global(true))
        .arg(arg!(--"no-color" "Disable colored output").global(true))
        .arg(
            arg!(--dir <DIR>)
                .help("Storage directory (defaults to ~/.gurlz)")
                .env("GURLZ_HOME")
                .global(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .subcommand(request_args(
            command!("add")
                .about("Add a new request")
                .arg(arg!(<NAME> "request name"))
                .arg(arg!(<URL> "request url")),
        ))
        .subcommand(command!("list").alias("ls").about("List saved requests"))
        .subcommand(
            command!("show")
                .about("Show a saved request")
                .arg(arg!(<NAME> "request name")),
        )
        .subcommand(request_args(
            command!("edit")
                .about("Change a saved request; headers given replace all existing ones")
                .arg(arg!(<NAME> "request name"))
                .arg(arg!(--name <NEW_NAME> "rename the request").id("rename"))
                .arg(arg!(--url <URL> "new url")),
        ))
        .subcommand(
            command!("remove")
                .alias("rm")
                .about("Remove a saved request")
                .arg(arg!(<NAME> "request name")),
        )
        .subcommand(
            command!("ping")
                .about("Execute a saved request and print the response")
                .arg(arg!(<NAME> "request name")),
        )
        .subcommand(
            command!("config")
                .about("Inspect settings")
                .subcommand_required(true)
                .subcommand(command!("show").about("Print the effective config"))
                .subcommand(command!("path").about("Print storage file paths")),
        )
}

fn string_arg(matches: &ArgMatches, id: &str) -> Option<String> {
    matches.get_one::<String>(id).cloned()
}

fn headers_arg(matches: &ArgMatches) -> Vec<String> {
    matches
        .get_many::<String>("header")
        .map(|it| it.cloned().collect())
        .unwrap_or_default()
}

fn run(matches: &ArgMatches, storage: &StorageManager) -> Result<()> {
    match matches.subcommand() {
        Some(("add", m)) => {
            let request = add_request(
                storage,
                m.get_one::<String>("NAME").expect("required"),
                m.get_one::<String>("URL").expect("required"),
                m.get_one::<String>("method").map(String::as_str),
                &headers_arg(m),
                m.get_one::<String>("data").map(String::as_str).unwrap_or(""),
            )?;
            println!("{}", format_added(&request));
        }
        Some(("list", _)) => println!("{}", format_list(&list_requests(storage)?)),
        Some(("show", m)) => {
            let request = show_request(storage, m.get_one::<String>("NAME").expect("required"))?;
            println!("{}", format_details(&request));
        }
        Some(("edit", m)) => {
            let edit = RequestEdit {
                name: string_arg(m, "rename"),
                url: string_arg(m, "url"),
                method: string_arg(m, "method"),
                headers: m.contains_id("header").then(|| headers_arg(m)),
                body: string_arg(m, "data"),
            };
            let request = edit_request(storage, m.get_one::<String>("NAME").expect("required"), edit)?;
            println!("✏️  Updated request '{}'", request.name);
            println!("{}", format_details(&request));
        }
        Some(("remove", m)) => {
            let request = remove_request(storage, m.get_one::<String>("NAME").expect("required"))?;
            println!("🗑️  Removed request '{}'", request.name);
        }
        Some(("ping", m)) => {
            let (response, config) =
                ping_request(storage, m.get_one::<String>("NAME").expect("required"))?;
            if !config.color_output {
                colored::control::set_override(false);
            }
            println!("{}", render_response(&response, &config.output_format)?);
        }
        Some(("config", m)) => match m.subcommand() {
            Some(("show", _)) => print!("{}", serde_yaml::to_string(&storage.load_config()?)?),
            Some(("path", _)) => {
                println!("requests: {}", storage.requests_path().display());
                println!("config:   {}", storage.config_path().display());
            }
            _ => unreachable!("this should've been prevented"),
        },
        _ => unreachable!("this should've been prevented"),
    }
    Ok(())
}

fn main() {
    let matches = cli().get_matches();

    if matches.get_flag("no-color") {
        colored::control::set_override(false);
    }
    if let Err(e) = init_logger(matches.get_flag("verbose")) {
        eprintln!("{}", e);
    }

    let storage = match matches.get_one::<PathBuf>("dir") {
        Some(dir) => StorageManager::with_dir(dir),
        None => StorageManager::new(),
    };
    let result = storage
        .map_err(anyhow::Error::from)
        .and_then(|storage| run(&matches, &storage));

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
