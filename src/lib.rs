//! Compilador de ArduinoScript.
//!
//! ArduinoScript es un lenguaje de palabras clave en ruso para describir
//! el comportamiento de un microcontrolador: configuración de pines,
//! entrada y salida digital o analógica, temporización, comunicación
//! serial y control de flujo simple. El compilador lo traduce a un sketch
//! de Arduino con sus rutinas `setup()` y `loop()`.
//!
//! # Fases
//! El texto fuente se somete primero a análisis léxico en [`lex`], de lo
//! cual se obtiene un flujo de tokens. El flujo de tokens se dispone en
//! un AST por medio de análisis sintáctico en [`parse`], el cual además
//! llena una [`symbols::SymbolTable`] provista por el llamador. Finalmente,
//! [`codegen`] recorre el árbol y emite el texto objetivo, consultando las
//! tablas de la plataforma en [`arduino`].
//!
//! [`driver`] encadena las fases y expone las operaciones públicas
//! [`compile`] y [`compile_file`].

#[macro_use]
mod macros;

pub mod arduino;
pub mod codegen;
pub mod driver;
pub mod error;
pub mod lex;
pub mod parse;
pub mod source;
pub mod symbols;

pub use driver::{compile, compile_file};
