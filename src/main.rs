use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

use husk::{Emulator, ShellConfig};

#[derive(Parser)]
#[command(name = "husk")]
#[command(about = "A sandboxed shell emulator with an audit trail")]
#[command(version)]
struct Cli {
    /// YAML configuration file
    #[arg()]
    config: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let config = match ShellConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut emulator = match Emulator::new(&config) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Error: cannot initialize line editor: {}", e);
            std::process::exit(1);
        }
    };

    loop {
        match rl.readline(&emulator.prompt()) {
            Ok(line) => {
                let line = line.trim();
                if !line.is_empty() {
                    let _ = rl.add_history_entry(line);
                }
                let outcome = match emulator.execute(line) {
                    Ok(o) => o,
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                };
                print!("{}", outcome.output);
                if outcome.should_exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C (type 'exit' to quit)");
            }
            Err(ReadlineError::Eof) => {
                match emulator.close() {
                    Ok(outcome) => print!("{}", outcome.output),
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                }
                break;
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
