//! Operaciones de compilación de alto nivel.
//!
//! [`compile`] traduce texto a texto sin efectos externos.
//! [`compile_file`] agrega lectura y escritura de archivos; la salida se
//! escribe primero a un archivo temporal en el directorio destino y solo
//! se mueve a su ruta final cuando la compilación tuvo éxito, de modo que
//! un fallo nunca deja un archivo parcial ni reemplaza una salida previa.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::{NamedTempFile, PersistError};
use thiserror::Error;

use crate::{
    codegen,
    error::Diagnostics,
    lex,
    parse::{self, SyntaxError},
    symbols::SymbolTable,
};

/// Extensión de los archivos generados.
pub const OUTPUT_EXTENSION: &str = "ino";

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Failed to read source file {}", .0.display())]
    Read(PathBuf, #[source] io::Error),

    #[error("Compilation of {} failed", .0.display())]
    Syntax(PathBuf, #[source] Diagnostics),

    #[error("Failed to write output file {}", .0.display())]
    Write(PathBuf, #[source] io::Error),

    #[error("Failed to persist output file {}", .0.display())]
    Persist(PathBuf, #[source] PersistError),
}

/// Compila un programa completo.
///
/// Cada invocación construye su propia tabla de símbolos, por lo que
/// compilaciones independientes pueden ocurrir en paralelo.
pub fn compile(text: &str) -> Result<String, SyntaxError> {
    let tokens = lex::tokenize(text);

    let mut symbols = SymbolTable::new();
    let ast = parse::parse(&tokens, &mut symbols)?;

    Ok(codegen::generate(&ast, &symbols))
}

/// Compila `input` hacia `output`, o hacia `input` con extensión `.ino`
/// si no se indica salida.
///
/// Retorna `false` ante cualquier fallo, luego de reportarlo en stderr.
pub fn compile_file(input: &Path, output: Option<&Path>) -> bool {
    match try_compile_file(input, output) {
        Ok(_) => true,
        Err(DriverError::Syntax(_, diagnostics)) => {
            eprint!("{}", diagnostics);
            false
        }

        Err(error) => {
            eprintln!("error: {}", error);
            if let Some(cause) = std::error::Error::source(&error) {
                eprintln!("caused by: {}", cause);
            }

            false
        }
    }
}

/// Como [`compile_file`], pero retorna la ruta escrita o la causa del fallo.
pub fn try_compile_file(input: &Path, output: Option<&Path>) -> Result<PathBuf, DriverError> {
    let text =
        fs::read_to_string(input).map_err(|error| DriverError::Read(input.to_owned(), error))?;

    let generated = compile(&text).map_err(|error| {
        let diagnostics = Diagnostics::from(error).within(input.display().to_string(), text.as_str());
        DriverError::Syntax(input.to_owned(), diagnostics)
    })?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(input));

    write_atomically(&output, &generated)?;
    Ok(output)
}

/// Ruta de salida por omisión: la entrada con la extensión reemplazada.
pub fn default_output(input: &Path) -> PathBuf {
    input.with_extension(OUTPUT_EXTENSION)
}

fn write_atomically(path: &Path, contents: &str) -> Result<(), DriverError> {
    let write_error = |error| DriverError::Write(path.to_owned(), error);

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(directory).map_err(write_error)?;
    file.write_all(contents.as_bytes()).map_err(write_error)?;
    file.flush().map_err(write_error)?;

    file.persist(path)
        .map_err(|error| DriverError::Persist(path.to_owned(), error))?;

    Ok(())
}
