//! nothelm's main application entry point.
//! Parses the command line and hands the parsed inputs to the library.

use nothelm::{
    cli::{get_args, Commands},
    deploy::deploy,
    env::EnvSnapshot,
    error::{default_error_handler, Result},
    hooks::ShellInvoker,
    logger::init_logger,
};

/// Main application entry point.
fn main() {
    let args = get_args();

    let verbosity = match &args.command {
        Commands::Deploy(deploy_args) => deploy_args.verbose,
    };
    init_logger(verbosity);

    if let Err(err) = run(args.command) {
        default_error_handler(err);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Deploy(deploy_args) => {
            let env = EnvSnapshot::from_process();
            deploy(&deploy_args.to_options(), &env, &ShellInvoker)
        }
    }
}
