//! Reporte de errores al usuario.
//!
//! [`Diagnostics`] agrupa uno o más errores ubicados y los presenta con
//! un extracto del código fuente, al estilo de un compilador.

use crate::source::{Located, Position};
use std::{
    error::Error,
    fmt::{self, Debug, Display},
};

mod sealed {
    pub trait Sealed {}
}

pub trait LocatedError: sealed::Sealed + Send + Sync {
    fn source(&self) -> &dyn Error;
    fn position(&self) -> Position;
}

pub struct Diagnostics {
    kind: &'static str,
    file: Option<String>,
    text: Option<String>,
    errors: Vec<Box<dyn 'static + LocatedError>>,
}

impl Diagnostics {
    pub fn kind(self, kind: &'static str) -> Self {
        Diagnostics { kind, ..self }
    }

    /// Asocia los errores al archivo del cual provienen, lo cual habilita
    /// la impresión de extractos.
    pub fn within<N, T>(self, file: N, text: T) -> Self
    where
        N: Into<String>,
        T: Into<String>,
    {
        Diagnostics {
            file: Some(file.into()),
            text: Some(text.into()),
            ..self
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    fn line(&self, number: u32) -> Option<&str> {
        let index = (number as usize).checked_sub(1)?;
        self.text.as_deref()?.lines().nth(index)
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Diagnostics {
            kind: "error",
            file: None,
            text: None,
            errors: Default::default(),
        }
    }
}

impl<E: 'static + LocatedError> From<E> for Diagnostics {
    fn from(error: E) -> Self {
        Diagnostics {
            errors: vec![Box::new(error)],
            ..Default::default()
        }
    }
}

impl<E: 'static + LocatedError> From<Vec<E>> for Diagnostics {
    fn from(errors: Vec<E>) -> Self {
        let errors = errors
            .into_iter()
            .map(|error| {
                let error: Box<dyn LocatedError> = Box::new(error);
                error
            })
            .collect();

        Diagnostics {
            errors,
            ..Default::default()
        }
    }
}

impl Display for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Diagnostics {
            kind, file, errors, ..
        } = self;

        if errors.is_empty() {
            return writeln!(fmt, "No errors were reported");
        }

        for error in errors {
            writeln!(fmt, "{}: {}", kind, error.source())?;

            let position = error.position();
            match file {
                Some(file) => writeln!(fmt, " --> {}:{}", file, position)?,
                None => writeln!(fmt, " --> {}", position)?,
            }

            if let Some(line) = self.line(position.line()) {
                let digits = position.line().to_string().chars().count();
                let skip = position.column().saturating_sub(1) as usize;

                writeln!(fmt, "{:digits$} |", "", digits = digits)?;
                writeln!(fmt, "{:>digits$} | {}", position.line(), line, digits = digits)?;
                writeln!(
                    fmt,
                    "{:digits$} | {:skip$}^",
                    "",
                    "",
                    digits = digits,
                    skip = skip
                )?;
            }

            writeln!(fmt)?;
        }

        let error_or_errors = if errors.len() == 1 { "error" } else { "errors" };
        writeln!(
            fmt,
            "Build failed with {} {}",
            errors.len(),
            error_or_errors
        )
    }
}

impl Debug for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, fmt)
    }
}

impl Error for Diagnostics {}

impl<E: Error + Send + Sync> sealed::Sealed for Located<E> {}

impl<E: Error + Send + Sync> LocatedError for Located<E> {
    fn source(&self) -> &dyn Error {
        self.as_ref()
    }

    fn position(&self) -> Position {
        Located::position(self)
    }
}
