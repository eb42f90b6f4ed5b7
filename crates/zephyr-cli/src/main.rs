use clap::Parser;
use zephyr_cli::{cmd, logging, Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.debug, cli.trace, cli.no_color);

    let code = match cli.command.unwrap_or(Commands::Load) {
        Commands::Load => cmd::load::load(cli.shell),
        Commands::List { json, pretty, filter, graph } => {
            cmd::list::list(json, pretty, filter.as_deref(), graph.as_deref())
        }
        Commands::Validate => cmd::validate::validate(),
        Commands::Init { name } => cmd::init::init(&name),
        Commands::Scan { source, json, pretty } => cmd::scan::scan(&source, json, pretty),
        Commands::Install { source, flags } => cmd::install::install(&source, flags),
        Commands::Update { name, flags } => cmd::update::update(name.as_deref(), flags),
        Commands::Uninstall { name, force, yes } => cmd::uninstall::uninstall(&name, force, yes),
        Commands::ShowSigningKey => cmd::show_signing_key::show_signing_key(),
        Commands::Verify { path } => cmd::verify::verify(&path),
    };

    std::process::exit(code);
}
