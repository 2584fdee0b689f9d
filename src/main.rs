mod cmd;
mod opt;
mod repl;

use std::error::Error;
use std::path::Path;
use std::process;

use clap::Parser;
use log::{error, info, LevelFilter};

use lambda_calc_rpc::{server, Client, Server};
use opt::{Cli, Commands, EvalArgs, ServeArgs};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let command = cli
        .command
        .unwrap_or_else(|| Commands::Serve(ServeArgs::from_env()));
    let result = match command {
        Commands::Serve(args) => serve(&args),
        Commands::Eval { expression, eval } => evaluate(&expression, &eval),
        Commands::Send { expression, socket } => send(&expression, &socket),
        Commands::Repl { eval } => {
            repl::read_eval_print_loop(eval.evaluator());
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn serve(args: &ServeArgs) -> Result<(), Box<dyn Error>> {
    let config = args.config();
    info!(
        "starting lambda_calc_rpc v{} (max steps: {:?}, max depth: {:?}, head spine reduction: {})",
        env!("CARGO_PKG_VERSION"),
        config.max_steps,
        config.max_depth,
        config.reduce_head_spine
    );

    let server = Server::bind(&config)?;
    let signals = server::install_signal_handler(server.shutdown_handle())?;
    server.run();
    signals.close();

    info!("server stopped");
    Ok(())
}

fn evaluate(expression: &str, eval: &EvalArgs) -> Result<(), Box<dyn Error>> {
    let result = eval.evaluator().evaluate_expression(expression)?;
    println!("{}", result);
    Ok(())
}

fn send(expression: &str, socket: &Path) -> Result<(), Box<dyn Error>> {
    let mut client = Client::connect(socket)?;
    let result = client.evaluate(expression)?;
    println!("{}", result);
    Ok(())
}
