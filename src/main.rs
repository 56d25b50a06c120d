use std::env;
use std::fs::File;
use std::io::{self, BufRead, Read, Write};
use std::process::exit;

use lox_interpreter_rs::error::{self, Error};
use lox_interpreter_rs::{run, Interpreter};

struct Lox {
    interpreter: Interpreter,
}

impl Lox {
    fn new() -> Self {
        Lox {
            interpreter: Interpreter::new(),
        }
    }

    fn run_file(&mut self, file_path: &String) -> Result<(), Error> {
        log::info!("loading script {file_path}");
        let mut file = File::open(file_path)?;
        let mut contents = String::new();

        file.read_to_string(&mut contents)?;

        run(contents, &mut self.interpreter, false)
    }

    fn run_prompt(&mut self) -> Result<(), Error> {
        log::info!("starting REPL session");
        let stdin = io::stdin();
        let handle = stdin.lock();

        print!("> ");
        io::stdout().flush().ok();

        for line in handle.lines() {
            let line = line?;
            if line == "quit" {
                break;
            }

            match run(line, &mut self.interpreter, true) {
                Ok(()) => (),
                Err(Error::Runtime { token, message }) => {
                    error::runtime_error(&token, &message);
                }
                Err(Error::Parse) => (),
                Err(Error::Return { .. }) => unreachable!("return can't escape a function call"),
                Err(Error::Io(e)) => return Err(Error::Io(e)),
            }

            // A bad line shouldn't poison the rest of the REPL session.
            error::reset();

            print!("> ");
            io::stdout().flush().ok();
        }

        log::info!("ending REPL session");
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error + 'static>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut lox = Lox::new();
    match &args[..] {
        [_, file_path] => match lox.run_file(file_path) {
            Ok(()) => {
                if error::had_runtime_error() {
                    exit(70);
                }
                if error::had_static_error() {
                    exit(65);
                }
            }
            Err(Error::Runtime { token, message }) => {
                error::runtime_error(&token, &message);
                exit(70);
            }
            Err(Error::Parse) => exit(65),
            Err(Error::Return { .. }) => unreachable!("return can't escape a function call"),
            Err(Error::Io(e)) => return Err(Box::new(e)),
        },
        [_] => lox.run_prompt()?,
        _ => {
            eprintln!("Usage: lox-interpreter-rs [script]");
            exit(64)
        }
    }
    Ok(())
}
