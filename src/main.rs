use std::{env, process};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("DUTY_LOG", "warn")).init();

    if let Err(e) = duty::runner::install_interrupt_handler() {
        log::warn!("Failed to set the Ctrl-C handler: {}", e);
    }

    process::exit(duty::cli::main(env::args().skip(1)));
}
