//! Rastreo de ubicaciones originales en código fuente.
//!
//! Los tokens y los errores que el compilador construye deben llevar
//! cuenta de la posición donde se originaron en el texto fuente, lo
//! cual permite señalar el punto exacto donde ocurre un error.

use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
};

/// Un objeto cualquiera con una posición original asociada.
#[derive(Debug, Clone, PartialEq)]
pub struct Located<T> {
    position: Position,
    value: T,
}

impl<T> Located<T> {
    /// Obtiene el valor.
    pub fn val(&self) -> &T {
        &self.value
    }

    /// Obtiene la posición.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Número de línea de la posición.
    pub fn line(&self) -> u32 {
        self.position.line
    }

    /// Número de columna de la posición.
    pub fn column(&self) -> u32 {
        self.position.column
    }

    /// Descarta la posición y toma ownership del valor.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Descompone y toma ownership de las dos partes.
    pub fn split(self) -> (Position, T) {
        (self.position, self.value)
    }

    /// Construye a partir de un valor y una posición.
    pub fn at(value: T, position: Position) -> Self {
        Located { value, position }
    }
}

impl<T> AsRef<T> for Located<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

impl<E: Display> Display for Located<E> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {}", self.position, self.value)
    }
}

impl<E: Error + 'static> Error for Located<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.value.source()
    }
}

/// Una posición línea-columna en un archivo.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Position {
    line: u32,
    column: u32,
}

impl Position {
    /// Construye una posición arbitraria.
    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }

    /// Obtiene el número de línea.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Obtiene el número de columna.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Incrementa el número de columna.
    pub fn advance(self) -> Position {
        self.advance_by(1)
    }

    /// Incrementa el número de columna en `count` posiciones.
    pub fn advance_by(self, count: u32) -> Position {
        Position {
            line: self.line,
            column: self.column + count,
        }
    }

    /// Incrementa el número de línea y retorna a la columna 1.
    pub fn newline(self) -> Position {
        Position {
            line: self.line + 1,
            column: 1,
        }
    }

    /// Avanza sobre un fragmento arbitrario de texto consumido.
    pub fn skip(self, text: &str) -> Position {
        text.chars().fold(self, |position, c| match c {
            '\n' => position.newline(),
            _ => position.advance(),
        })
    }
}

impl Default for Position {
    fn default() -> Self {
        Position { line: 1, column: 1 }
    }
}

impl Display for Position {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.line, self.column)
    }
}

impl Debug for Position {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        <Self as Display>::fmt(self, formatter)
    }
}
