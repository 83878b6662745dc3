use clap::Parser;
use ferry_cli::Cli;

fn main() {
    let cli = Cli::parse();
    let exit_code = match ferry_cli::run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}
