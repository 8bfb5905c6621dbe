//! Punto de entrada ("driver").
//!
//! Este módulo expone una CLI sobre las operaciones de compilación.

use anyhow::{self, Context};
use arduinoscript::{
    compile,
    driver::{self, DriverError},
    error::Diagnostics,
};
use clap::{self, crate_version, Arg, Command};

use std::{
    fs,
    io::{self, Write},
    path::Path,
    process,
};

fn main() -> anyhow::Result<()> {
    // Parsing de CLI
    let args = Command::new("ArduinoScript compiler")
        .version(crate_version!())
        .arg(
            Arg::new("input")
                .required(true)
                .value_name("INPUT")
                .help("Source file"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .value_name("FILE")
                .help("Output file (defaults to INPUT with .ino extension, '-' for stdout)"),
        )
        .get_matches();

    let input = args.value_of("input").context("Missing input file")?;
    let input = Path::new(input);

    match args.value_of("output") {
        // Salida a stdout
        Some("-") => {
            let text = fs::read_to_string(input)
                .with_context(|| format!("Failed to read source file: {}", input.display()))?;

            match compile(&text) {
                Ok(generated) => io::stdout()
                    .write_all(generated.as_bytes())
                    .context("Failed to write to stdout")?,

                Err(error) => report(Diagnostics::from(error).within(input.display().to_string(), text)),
            }
        }

        // Salida a archivo
        output => match driver::try_compile_file(input, output.map(Path::new)) {
            Ok(_) => (),
            Err(DriverError::Syntax(_, diagnostics)) => report(diagnostics),
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("Failed to compile: {}", input.display()))
            }
        },
    };

    Ok(())
}

fn report(diagnostics: Diagnostics) -> ! {
    eprint!("{}", diagnostics);
    process::exit(1)
}
