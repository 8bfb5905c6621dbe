//! Análisis léxico.
//!
//! # Tokenization
//! Esta es la primera fase del compilador. Descompone el texto fuente en
//! unidades léxicas denominadas tokens. Los espacios en blanco y los
//! comentarios se descartan durante esta operación. Cada token emitido
//! está asociado a una posición en el código fuente original, lo cual
//! permite rastrear errores en fases posteriores.
//!
//! # Clasificación
//! En cada punto se elige la coincidencia más larga entre todos los
//! patrones léxicos del lenguaje. Por ejemplo, `==` es un único token
//! y `0x1F` es un único literal hexadecimal. En caso de empate entre un
//! literal de pin (`D13`, `A0`) y un identificador, gana el literal de pin.
//!
//! # Contenido de un token
//! Operadores y puntuación se identifican por lo que son y no incluyen
//! lexemas. Los identificadores incluyen su lexema original. Las constantes
//! literales se resuelven a sus valores, y los literales de texto pierden
//! sus delimitadores.
//!
//! # Reglas importantes del lenguaje
//! - Los identificadores pueden usar letras latinas o cirílicas, `_`, y
//!   dígitos después del primer carácter.
//! - Las palabras clave son case-insensitive, por lo cual tanto `цикл`
//!   como `ЦИКЛ` y `Цикл` resultan en [`Keyword::Loop`]. Los
//!   identificadores preservan su escritura original.
//!
//! # Errores
//! El lexer nunca falla. Un carácter que no pertenece a ningún patrón se
//! descarta sin emitir token, aunque sí avanza la columna de modo que las
//! posiciones posteriores permanecen exactas.

use crate::source::{Located, Position};
use lazy_static::lazy_static;
use std::{
    collections::HashMap,
    fmt::{self, Display},
    str::FromStr,
};

use unicase::UniCase;

/// Un identificador.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Identifier(name.into())
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(&self.0)
    }
}

/// Objeto resultante del análisis léxico.
///
/// Un token contiene suficiente información para describir completamente
/// a una entidad léxica en el programa fuente.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identificador.
    Id(Identifier),

    /// Palabra clave.
    Keyword(Keyword),

    /// Pin con prefijo digital o analógico, como `D13` o `A0`.
    PinLiteral(String),

    /// Literal entero, sea decimal, hexadecimal o binario.
    IntLiteral(i64),

    /// Literal de punto flotante.
    FloatLiteral(f64),

    /// Literal de texto, sin comillas.
    StrLiteral(String),

    /// Literal de carácter, sin comillas.
    CharLiteral(char),

    /// `=`
    Assign,

    /// `+`
    Plus,

    /// `-`
    Minus,

    /// `*`
    Times,

    /// `/`
    Slash,

    /// `%`
    Percent,

    /// `**`
    Power,

    /// `==`
    Equal,

    /// `!=`
    NotEqual,

    /// `<`
    Less,

    /// `<=`
    LessOrEqual,

    /// `>`
    Greater,

    /// `>=`
    GreaterOrEqual,

    /// `&&`
    And,

    /// `||`
    Or,

    /// `!`
    Not,

    /// `(`
    OpenParen,

    /// `)`
    CloseParen,

    /// `{`
    OpenCurly,

    /// `}`
    CloseCurly,

    /// `[`
    OpenSquare,

    /// `]`
    CloseSquare,

    /// `,`
    Comma,

    /// `:`
    Colon,

    /// `;`
    Semicolon,

    /// `.`
    Period,

    /// `->`
    Arrow,

    /// Fin de la entrada. Siempre es el último token.
    Eof,
}

impl Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Token::*;

        match self {
            Id(id) => write!(fmt, "identifier `{}`", id),
            Keyword(keyword) => write!(fmt, "keyword `{}`", keyword),
            PinLiteral(pin) => write!(fmt, "pin `{}`", pin),
            IntLiteral(integer) => write!(fmt, "literal `{}`", integer),
            FloatLiteral(float) => write!(fmt, "literal `{}`", float),
            StrLiteral(string) => write!(fmt, "string \"{}\"", string),
            CharLiteral(c) => write!(fmt, "character '{}'", c),
            Assign => fmt.write_str("`=`"),
            Plus => fmt.write_str("`+`"),
            Minus => fmt.write_str("`-`"),
            Times => fmt.write_str("`*`"),
            Slash => fmt.write_str("`/`"),
            Percent => fmt.write_str("`%`"),
            Power => fmt.write_str("`**`"),
            Equal => fmt.write_str("`==`"),
            NotEqual => fmt.write_str("`!=`"),
            Less => fmt.write_str("`<`"),
            LessOrEqual => fmt.write_str("`<=`"),
            Greater => fmt.write_str("`>`"),
            GreaterOrEqual => fmt.write_str("`>=`"),
            And => fmt.write_str("`&&`"),
            Or => fmt.write_str("`||`"),
            Not => fmt.write_str("`!`"),
            OpenParen => fmt.write_str("`(`"),
            CloseParen => fmt.write_str("`)`"),
            OpenCurly => fmt.write_str("`{`"),
            CloseCurly => fmt.write_str("`}`"),
            OpenSquare => fmt.write_str("`[`"),
            CloseSquare => fmt.write_str("`]`"),
            Comma => fmt.write_str("`,`"),
            Colon => fmt.write_str("`:`"),
            Semicolon => fmt.write_str("`;`"),
            Period => fmt.write_str("`.`"),
            Arrow => fmt.write_str("`->`"),
            Eof => fmt.write_str("end of input"),
        }
    }
}

keywords! {
    // Construcciones principales
    Loop => "цикл",
    Function => "функция",
    If => "если",
    Else => "иначе",
    Elif => "иначе_если",
    For => "для",
    While => "пока",
    Break => "прервать",
    Continue => "продолжить",
    Return => "вернуть",
    End => "конец",

    // Tipos de datos
    Int => "целое",
    Float => "дробное",
    Bool => "булево",
    Char => "символ",
    Str => "строка",
    Array => "массив",
    Void => "пусто",

    // Constantes
    True => "истина",
    False => "ложь",
    High => "высоко",
    Low => "низко",
    On => "включено",
    Off => "выключено",

    // Modos de pin
    Input => "вход",
    Output => "выход",
    InputPullup => "вход_подтяжка",
    Analog => "аналог",
    Pwm => "шим",

    // Comandos de placa
    Pin => "пин",
    PinMode => "режим",
    DigitalWrite => "цифрзапись",
    DigitalRead => "цифрчтение",
    AnalogWrite => "аналогзапись",
    AnalogRead => "аналогчтение",
    Delay => "ждать",
    Millis => "миллис",
    Micros => "микрос",
    AttachInterrupt => "прерывание",
    DetachInterrupt => "отключить_прерывание",
    Pause => "пауза",
    Random => "случайное",

    // Puerto serial
    Serial => "последовательный",
    SerialBegin => "начать_последовательный",
    Print => "печать",
    Println => "печать_строка",
    Available => "доступно",
    Read => "читать",
    Find => "найти",
    FindUntil => "найти_до",
    Flush => "очистить",

    // Matemática
    Pi => "пи",
    Max => "макс",
    Min => "мин",
    Constrain => "ограничить",
    Map => "отобразить",
    Pow => "степень",
    Sq => "квадрат",
    Sqrt => "корень",
    Abs => "абсолют",
    Sin => "синус",
    Cos => "косинус",
    Tan => "тангенс",
    RandomSeed => "случайное_семя",

    // Operaciones de bits
    BitRead => "бит_читать",
    BitWrite => "бит_записать",
    BitSet => "бит_установить",
    BitClear => "бит_очистить",

    // Modos de interrupción
    Change => "изменить",
    Rising => "возрастание",
    Falling => "убывание",

    // Unidades de tiempo
    Seconds => "секунды",
    Minutes => "минуты",
    Hours => "часы",

    // Operadores en palabras
    And => "и",
    Or => "или",
    Not => "не",
    Greater => "больше",
    Less => "меньше",
    Equal => "равно",
    NotEqual => "не_равно",
    GreaterOrEqual => "больше_равно",
    LessOrEqual => "меньше_равно",
}

lazy_static! {
    /// Tabla de palabras clave, construida una única vez por proceso.
    static ref KEYWORDS: HashMap<UniCase<String>, Keyword> = Keyword::ALL
        .iter()
        .map(|&(text, keyword)| (UniCase::new(text.to_owned()), keyword))
        .collect();
}

impl Display for Keyword {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

impl FromStr for Keyword {
    type Err = ();

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        KEYWORDS
            .get(&UniCase::new(string.to_owned()))
            .copied()
            .ok_or(())
    }
}

/// Descompone un texto fuente completo en tokens.
///
/// La secuencia resultante siempre termina en exactamente un
/// [`Token::Eof`], cuya posición es la última alcanzada.
pub fn tokenize(input: &str) -> Vec<Located<Token>> {
    Lexer::new(input).exhaustive()
}

/// Cursor sobre el texto fuente.
///
/// El lexer avanza sobre el texto consumiendo en cada paso la
/// coincidencia más larga posible a partir de la posición actual.
pub struct Lexer<'a> {
    input: &'a str,
    offset: usize,
    next: Position,
}

/// Resultado de examinar el inicio del texto restante.
///
/// La longitud se expresa en bytes.
enum Scan {
    /// Se consume texto sin emitir token: espacios, comentarios y
    /// caracteres desconocidos.
    Skip(usize),

    /// Se consume texto y se emite un token.
    Emit(usize, Token),
}

impl<'a> Lexer<'a> {
    /// Crea un lexer posicionado al inicio del texto.
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            offset: 0,
            next: Position::default(),
        }
    }

    /// Consume toda la entrada y agrega el token final.
    pub fn exhaustive(mut self) -> Vec<Located<Token>> {
        let mut tokens: Vec<_> = self.by_ref().collect();
        tokens.push(Located::at(Token::Eof, self.next));

        tokens
    }

    /// Intenta construir un siguiente token.
    fn lex(&mut self) -> Option<Located<Token>> {
        loop {
            let rest = &self.input[self.offset..];
            let start = self.next;

            match scan(rest)? {
                Scan::Skip(length) => self.consume(length),
                Scan::Emit(length, token) => {
                    self.consume(length);
                    break Some(Located::at(token, start));
                }
            }
        }
    }

    /// Avanza el cursor y la posición sobre `length` bytes.
    fn consume(&mut self, length: usize) {
        let text = &self.input[self.offset..self.offset + length];

        self.offset += length;
        self.next = self.next.skip(text);
    }
}

impl Iterator for Lexer<'_> {
    type Item = Located<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lex()
    }
}

/// Switch table principal del lexer.
///
/// Determina qué patrón léxico corresponde al inicio de `rest`. Retorna
/// `None` únicamente cuando la entrada se ha agotado.
fn scan(rest: &str) -> Option<Scan> {
    use Scan::*;
    use Token::*;

    let mut chars = rest.chars();
    let first = chars.next()?;
    let second = chars.next();

    let scan = match (first, second) {
        // Espacios en blanco
        (c, _) if is_blank(c) => Skip(prefix_len(rest, is_blank)),

        // Comentarios de línea y de bloque. Un `/*` sin cierre no es
        // comentario, por lo que se trata como un `/` aislado
        ('/', Some('/')) => Skip(rest.find('\n').unwrap_or_else(|| rest.len())),
        ('/', Some('*')) => match rest[2..].find("*/") {
            Some(end) => Skip(end + 4),
            None => Emit(1, Slash),
        },

        // Operadores de dos caracteres
        ('*', Some('*')) => Emit(2, Power),
        ('=', Some('=')) => Emit(2, Equal),
        ('!', Some('=')) => Emit(2, NotEqual),
        ('<', Some('=')) => Emit(2, LessOrEqual),
        ('>', Some('=')) => Emit(2, GreaterOrEqual),
        ('&', Some('&')) => Emit(2, And),
        ('|', Some('|')) => Emit(2, Or),
        ('-', Some('>')) => Emit(2, Arrow),

        // Tokens triviales
        ('=', _) => Emit(1, Assign),
        ('+', _) => Emit(1, Plus),
        ('-', _) => Emit(1, Minus),
        ('*', _) => Emit(1, Times),
        ('/', _) => Emit(1, Slash),
        ('%', _) => Emit(1, Percent),
        ('<', _) => Emit(1, Less),
        ('>', _) => Emit(1, Greater),
        ('!', _) => Emit(1, Not),
        ('(', _) => Emit(1, OpenParen),
        (')', _) => Emit(1, CloseParen),
        ('{', _) => Emit(1, OpenCurly),
        ('}', _) => Emit(1, CloseCurly),
        ('[', _) => Emit(1, OpenSquare),
        (']', _) => Emit(1, CloseSquare),
        (',', _) => Emit(1, Comma),
        (':', _) => Emit(1, Colon),
        (';', _) => Emit(1, Semicolon),
        ('.', _) => Emit(1, Period),

        // Literales de texto. Sin comilla de cierre, la comilla de
        // apertura es un carácter desconocido
        ('"', _) => match rest[1..].find('"') {
            Some(end) => Emit(end + 2, StrLiteral(rest[1..end + 1].to_owned())),
            None => Skip(1),
        },

        ('\'', Some(c)) if c != '\'' && rest[1 + c.len_utf8()..].starts_with('\'') => {
            Emit(c.len_utf8() + 2, CharLiteral(c))
        }

        // Constantes numéricas
        ('0', Some('x')) if radix_len(&rest[2..], 16) > 0 => {
            let digits = &rest[2..2 + radix_len(&rest[2..], 16)];
            Emit(digits.len() + 2, IntLiteral(parse_int(digits, 16)))
        }

        ('0', Some('b')) if radix_len(&rest[2..], 2) > 0 => {
            let digits = &rest[2..2 + radix_len(&rest[2..], 2)];
            Emit(digits.len() + 2, IntLiteral(parse_int(digits, 2)))
        }

        (c, _) if c.is_ascii_digit() => number(rest),

        // Identificadores, palabras clave y pines
        (c, _) if is_word_start(c) => {
            let word = &rest[..prefix_len(rest, is_word_char)];
            let token = if is_pin_literal(word) {
                PinLiteral(word.to_owned())
            } else if let Ok(keyword) = word.parse() {
                Token::Keyword(keyword)
            } else {
                Id(Identifier::new(word))
            };

            Emit(word.len(), token)
        }

        // Caracteres inesperados: se descartan en silencio
        (c, _) => Skip(c.len_utf8()),
    };

    Some(scan)
}

/// Escanea un literal entero o flotante decimal. Al igual que los
/// enteros, los flotantes fuera de rango se saturan.
fn number(rest: &str) -> Scan {
    let integral = radix_len(rest, 10);
    let after = &rest[integral..];

    let fraction = match after.strip_prefix('.') {
        Some(fraction) => radix_len(fraction, 10),
        None => 0,
    };

    if fraction > 0 {
        let text = &rest[..integral + 1 + fraction];
        let value = text
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .unwrap_or(f64::MAX);
        Scan::Emit(text.len(), Token::FloatLiteral(value))
    } else {
        let value = parse_int(&rest[..integral], 10);
        Scan::Emit(integral, Token::IntLiteral(value))
    }
}

/// Interpreta dígitos ya validados. Los valores fuera de rango se saturan.
fn parse_int(digits: &str, radix: u32) -> i64 {
    i64::from_str_radix(digits, radix).unwrap_or(i64::MAX)
}

/// Longitud en bytes del prefijo de dígitos válidos en la base dada.
fn radix_len(text: &str, radix: u32) -> usize {
    prefix_len(text, |c| c.is_digit(radix))
}

/// Longitud en bytes del prefijo cuyos caracteres cumplen `predicate`.
fn prefix_len<F>(text: &str, predicate: F) -> usize
where
    F: Fn(char) -> bool,
{
    text.char_indices()
        .find(|&(_, c)| !predicate(c))
        .map(|(index, _)| index)
        .unwrap_or_else(|| text.len())
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn is_cyrillic(c: char) -> bool {
    matches!(c, 'а'..='я' | 'А'..='Я' | 'ё' | 'Ё')
}

/// Determina si un carácter puede iniciar un término.
fn is_word_start(c: char) -> bool {
    c.is_ascii_alphabetic() || is_cyrillic(c) || c == '_'
}

/// Determina si un carácter puede pertenecer a un término.
fn is_word_char(c: char) -> bool {
    is_word_start(c) || c.is_ascii_digit()
}

/// `D13`, `A0` y similares.
fn is_pin_literal(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(chars.next(), Some('D') | Some('A'))
        && !chars.as_str().is_empty()
        && chars.all(|c| c.is_ascii_digit())
}
