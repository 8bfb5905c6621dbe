//! Análisis sintáctico.
//!
//! El parser es descendente recursivo, de una sola pasada y sin
//! retroceso. Observa como máximo dos tokens hacia adelante: el actual
//! y el siguiente, lo cual basta para distinguir `x = ...` de `x(...)`.
//!
//! # Recuperación
//! En el nivel superior y dentro de bloques, los tokens que no inician
//! una construcción reconocida se descartan sin error. En cambio, una
//! construcción ya iniciada que no encuentra un token obligatorio
//! produce un [`SyntaxError`] fatal para la compilación.
//!
//! # Tabla de símbolos
//! Cada pin, variable y función se registra en la [`SymbolTable`] que
//! provee el llamador, en el orden en que aparecen sus declaraciones.

use std::fmt::{self, Display};

use thiserror::Error;

use crate::{
    arduino,
    lex::{Identifier, Keyword, Token},
    source::{Located, Position},
    symbols::{Symbol, SymbolTable},
};

/// Nombre del método serial que inicializa el puerto.
const SERIAL_BEGIN_METHOD: &str = "начать";

/// Raíz del árbol: la secuencia de construcciones del programa.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Ast(Vec<Node>);

impl Ast {
    pub fn new(nodes: Vec<Node>) -> Self {
        Ast(nodes)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    PinDeclaration {
        pin: Pin,
        mode: PinMode,
        value: Option<Value>,
    },

    DigitalWrite {
        pin: Pin,
        value: Expr,
    },

    DigitalRead {
        pin: Pin,
    },

    AnalogWrite {
        pin: Pin,
        value: Expr,
    },

    AnalogRead {
        pin: Pin,
    },

    Delay {
        duration: Expr,
    },

    SerialBegin {
        baud_rate: i64,
    },

    SerialPrint {
        value: Option<Expr>,
        newline: bool,
    },

    /// Bloque de ejecución repetida.
    Loop {
        body: Vec<Node>,
    },

    If {
        condition: Expr,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },

    While {
        condition: Expr,
        body: Vec<Node>,
    },

    For {
        init: Option<Box<Node>>,
        condition: Expr,
        step: Option<Box<Node>>,
        body: Vec<Node>,
    },

    VariableDeclaration {
        name: Identifier,
        typ: Type,
        value: Option<Value>,
    },

    Assignment {
        name: Identifier,
        value: Expr,
    },

    /// Llamada genérica. El nombre ya está traducido a la API objetivo
    /// cuando proviene de una palabra clave.
    FunctionCall {
        name: String,
        args: Vec<Expr>,
    },

    FunctionDeclaration {
        name: Identifier,
        parameters: Vec<Parameter>,
        returns: Type,
        body: Vec<Node>,
    },

    Return(Option<Expr>),

    Break,

    Continue,

    BinaryOp {
        left: Expr,
        op: BinOp,
        right: Expr,
    },
}

/// Operando, argumento o condición.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Value(Value),

    /// Lecturas, llamadas u operaciones binarias.
    Node(Box<Node>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Char(char),

    /// Niveles lógicos y booleanos: `высоко`, `истина`, `включено`, etc.
    Logic(bool),

    /// Palabra clave con una constante asociada en la API objetivo.
    Constant(Keyword),

    /// Literal de pin con prefijo, como `D13`.
    Pin(String),

    Name(Identifier),
}

/// Identificación de un pin tal como aparece en el código fuente.
#[derive(Debug, Clone, PartialEq)]
pub enum Pin {
    Number(i64),
    Prefixed(String),
    Named(Identifier),
}

impl Pin {
    /// Convierte un argumento en pin, si tiene forma de pin.
    fn from_expr(expr: &Expr) -> Option<Pin> {
        match expr {
            Expr::Value(Value::Int(number)) => Some(Pin::Number(*number)),
            Expr::Value(Value::Pin(pin)) => Some(Pin::Prefixed(pin.clone())),
            Expr::Value(Value::Name(name)) => Some(Pin::Named(name.clone())),
            _ => None,
        }
    }
}

impl Display for Pin {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pin::Number(number) => write!(fmt, "{}", number),
            Pin::Prefixed(pin) => fmt.write_str(pin),
            Pin::Named(name) => write!(fmt, "{}", name),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PinMode {
    Input,
    Output,
    InputPullup,
    Analog,
    Pwm,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Float,
    Bool,
    Char,
    Str,
    Array,
    Void,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub typ: Type,
    pub name: Identifier,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    And,
    Or,
}

impl BinOp {
    /// Determina si el operador compara sus operandos.
    pub fn is_comparison(self) -> bool {
        use BinOp::*;
        matches!(
            self,
            Equal | NotEqual | Less | LessOrEqual | Greater | GreaterOrEqual
        )
    }
}

impl Display for BinOp {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BinOp::*;
        let string = match self {
            Add            => "+",
            Sub            => "-",
            Mul            => "*",
            Div            => "/",
            Mod            => "%",
            Equal          => "==",
            NotEqual       => "!=",
            Less           => "<",
            LessOrEqual    => "<=",
            Greater        => ">",
            GreaterOrEqual => ">=",
            And            => "&&",
            Or             => "||",
        };

        fmt.write_str(string)
    }
}

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParserError {
    #[error("Expected {0}, found {1} instead")]
    UnexpectedToken(Token, Token),

    #[error("Expected a pin number, pin name or identifier, found {0} instead")]
    ExpectedPin(Token),

    #[error("Expected a pin mode (`выход`, `вход`, `вход_подтяжка`, `аналог`, `шим`), found {0} instead")]
    ExpectedPinMode(Token),

    #[error("Expected an initial pin level or integer, found {0} instead")]
    ExpectedPinValue(Token),

    #[error("Expected a baud rate, found {0} instead")]
    ExpectedBaudRate(Token),

    #[error("Expected identifier, found {0} instead")]
    ExpectedId(Token),

    #[error("Expected a type, found {0} instead")]
    ExpectedType(Token),

    #[error("Expected a literal value, found {0} instead")]
    ExpectedLiteral(Token),

    #[error("Expected an operand, found {0} instead")]
    ExpectedOperand(Token),

    #[error("Expected a serial method (`начать`, `печать`, `печать_строка`), found {0} instead")]
    ExpectedSerialMethod(Token),
}

/// Error sintáctico con la posición del token ofensor.
pub type SyntaxError = Located<ParserError>;

type Parse<T> = Result<T, SyntaxError>;

/// Construye el AST a partir de una secuencia de tokens.
///
/// La secuencia debería terminar en [`Token::Eof`], tal como la produce
/// [`crate::lex::tokenize`]. Los símbolos declarados se agregan a
/// `symbols`.
pub fn parse(tokens: &[Located<Token>], symbols: &mut SymbolTable) -> Parse<Ast> {
    if tokens.is_empty() {
        return Ok(Ast::default());
    }

    let mut parser = Parser {
        tokens,
        cursor: 0,
        symbols,
    };

    parser.program()
}

struct Parser<'a, 's> {
    tokens: &'a [Located<Token>],
    cursor: usize,
    symbols: &'s mut SymbolTable,
}

impl Parser<'_, '_> {
    fn program(&mut self) -> Parse<Ast> {
        use Keyword::*;

        let mut nodes = Vec::new();
        while !self.at_eof() {
            let node = match (self.peek(), self.peek_second()) {
                (Token::Keyword(Keyword::Pin), _) => self.pin_declaration()?,
                (Token::Keyword(Function), _) => self.function_declaration()?,
                (Token::Keyword(Loop), _) => self.loop_block()?,
                (Token::Keyword(SerialBegin), _) => self.serial_begin()?,
                (Token::Keyword(Serial), Token::Period) => self.serial_method()?,
                (Token::Keyword(keyword), _) if is_type(*keyword) => {
                    self.variable_declaration()?
                }
                (Token::Id(_), Token::Assign) => self.assignment()?,
                (token, second) if starts_call(token, second) => self.call()?,

                _ => {
                    self.next();
                    continue;
                }
            };

            nodes.push(node);
        }

        Ok(Ast(nodes))
    }

    /// Sentencias admitidas dentro de bloques. Retorna `None` si el
    /// token actual no inicia ninguna, sin consumirlo.
    fn statement(&mut self) -> Parse<Option<Node>> {
        use Keyword::*;

        let node = match (self.peek(), self.peek_second()) {
            (Token::Keyword(Keyword::Pin), _) => self.pin_declaration()?,
            (Token::Keyword(If), _) => self.if_statement()?,
            (Token::Keyword(While), _) => self.while_statement()?,
            (Token::Keyword(For), _) => self.for_statement()?,
            (Token::Keyword(SerialBegin), _) => self.serial_begin()?,
            (Token::Keyword(Serial), Token::Period) => self.serial_method()?,
            (Token::Keyword(keyword), _) if is_type(*keyword) => self.variable_declaration()?,
            (Token::Id(_), Token::Assign) => self.assignment()?,
            (token, second) if starts_call(token, second) => self.call()?,

            (Token::Keyword(Break), _) => {
                self.next();
                Node::Break
            }

            (Token::Keyword(Continue), _) => {
                self.next();
                Node::Continue
            }

            (Token::Keyword(Return), _) => {
                self.next();
                let value = if starts_operand(self.peek()) {
                    Some(self.expr()?)
                } else {
                    None
                };

                Node::Return(value)
            }

            _ => return Ok(None),
        };

        Ok(Some(node))
    }

    /// Acumula sentencias hasta alguna de las palabras clave de cierre,
    /// sin consumirla, o hasta el final de la entrada.
    fn block(&mut self, closers: &[Keyword]) -> Parse<Vec<Node>> {
        let mut body = Vec::new();
        while !self.at_eof() && !self.at_any(closers) {
            match self.statement()? {
                Some(node) => body.push(node),
                None => {
                    self.next();
                }
            }
        }

        Ok(body)
    }

    fn pin_declaration(&mut self) -> Parse<Node> {
        self.keyword(Keyword::Pin)?;

        let (position, token) = self.next().split();
        let pin = match token {
            Token::IntLiteral(number) => Pin::Number(number),
            Token::PinLiteral(pin) => Pin::Prefixed(pin),
            Token::Id(id) => Pin::Named(id),
            found => return fail(ParserError::ExpectedPin(found), position),
        };

        self.expect(Token::Assign)?;

        let (position, token) = self.next().split();
        let mode = match token {
            Token::Keyword(Keyword::Output) => PinMode::Output,
            Token::Keyword(Keyword::Input) => PinMode::Input,
            Token::Keyword(Keyword::InputPullup) => PinMode::InputPullup,
            Token::Keyword(Keyword::Analog) => PinMode::Analog,
            Token::Keyword(Keyword::Pwm) => PinMode::Pwm,
            found => return fail(ParserError::ExpectedPinMode(found), position),
        };

        let value = if self.at(&Token::Assign) {
            self.next();

            let (position, token) = self.next().split();
            match token {
                Token::IntLiteral(level) => Some(Value::Int(level)),
                Token::Keyword(keyword) => match logic_level(keyword) {
                    Some(level) => Some(Value::Logic(level)),
                    None => {
                        let found = Token::Keyword(keyword);
                        return fail(ParserError::ExpectedPinValue(found), position);
                    }
                },

                found => return fail(ParserError::ExpectedPinValue(found), position),
            }
        } else {
            None
        };

        self.symbols.declare(pin.to_string(), Symbol::Pin { mode });
        Ok(Node::PinDeclaration { pin, mode, value })
    }

    fn function_declaration(&mut self) -> Parse<Node> {
        self.keyword(Keyword::Function)?;
        let name = self.id()?;

        self.expect(Token::OpenParen)?;

        let mut parameters = Vec::new();
        if !self.at(&Token::CloseParen) {
            loop {
                let typ = self.typ()?;
                let name = self.id()?;
                parameters.push(Parameter { typ, name });

                if !self.at(&Token::Comma) {
                    break;
                }

                self.next();
            }
        }

        self.expect(Token::CloseParen)?;

        let returns = if self.at(&Token::Arrow) {
            self.next();
            self.typ()?
        } else {
            Type::Void
        };

        self.expect(Token::Colon)?;

        let symbol = Symbol::Function {
            parameters: parameters.iter().map(|parameter| parameter.typ).collect(),
            returns,
        };

        self.symbols.declare(name.to_string(), symbol);

        let body = self.block(&[Keyword::End])?;
        self.keyword(Keyword::End)?;

        Ok(Node::FunctionDeclaration {
            name,
            parameters,
            returns,
            body,
        })
    }

    fn loop_block(&mut self) -> Parse<Node> {
        self.keyword(Keyword::Loop)?;
        self.expect(Token::Colon)?;

        let body = self.block(&[Keyword::End])?;
        if self.at_any(&[Keyword::End]) {
            self.next();
        }

        Ok(Node::Loop { body })
    }

    fn if_statement(&mut self) -> Parse<Node> {
        self.keyword(Keyword::If)?;
        let conditional = self.conditional()?;
        self.keyword(Keyword::End)?;

        Ok(conditional)
    }

    /// Condición, cuerpo y ramas alternativas de un `если` o de un
    /// `иначе_если`. Toda la cadena comparte un único `конец`, el
    /// cual no se consume aquí.
    fn conditional(&mut self) -> Parse<Node> {
        use Keyword::{Elif, Else, End};

        let condition = self.expr()?;
        self.expect(Token::Colon)?;

        let body = self.block(&[End, Else, Elif])?;

        let otherwise = if self.at_any(&[Elif]) {
            self.next();
            vec![self.conditional()?]
        } else if self.at_any(&[Else]) {
            self.next();
            self.expect(Token::Colon)?;
            self.block(&[End])?
        } else {
            Vec::new()
        };

        Ok(Node::If {
            condition,
            body,
            otherwise,
        })
    }

    fn while_statement(&mut self) -> Parse<Node> {
        self.keyword(Keyword::While)?;

        let condition = self.expr()?;
        self.expect(Token::Colon)?;

        let body = self.block(&[Keyword::End])?;
        self.keyword(Keyword::End)?;

        Ok(Node::While { condition, body })
    }

    fn for_statement(&mut self) -> Parse<Node> {
        self.keyword(Keyword::For)?;
        self.expect(Token::OpenParen)?;

        let init = match self.peek() {
            Token::Keyword(keyword) if is_type(*keyword) => {
                Some(Box::new(self.variable_declaration()?))
            }

            Token::Id(_) => Some(Box::new(self.assignment()?)),
            _ => None,
        };

        self.expect(Token::Semicolon)?;
        let condition = self.expr()?;
        self.expect(Token::Semicolon)?;

        let step = match self.peek() {
            Token::Id(_) => Some(Box::new(self.assignment()?)),
            _ => None,
        };

        self.expect(Token::CloseParen)?;
        self.expect(Token::Colon)?;

        let body = self.block(&[Keyword::End])?;
        self.keyword(Keyword::End)?;

        Ok(Node::For {
            init,
            condition,
            step,
            body,
        })
    }

    fn variable_declaration(&mut self) -> Parse<Node> {
        let typ = self.typ()?;
        let name = self.id()?;

        let value = if self.at(&Token::Assign) {
            self.next();
            Some(self.literal()?)
        } else {
            None
        };

        let symbol = Symbol::Variable {
            typ,
            value: value.clone(),
        };

        self.symbols.declare(name.to_string(), symbol);
        Ok(Node::VariableDeclaration { name, typ, value })
    }

    fn assignment(&mut self) -> Parse<Node> {
        let name = self.id()?;
        self.expect(Token::Assign)?;
        let value = self.expr()?;

        Ok(Node::Assignment { name, value })
    }

    fn serial_begin(&mut self) -> Parse<Node> {
        self.keyword(Keyword::SerialBegin)?;
        self.baud_rate()
    }

    /// `последовательный.начать(...)`, `последовательный.печать(...)`
    /// y `последовательный.печать_строка(...)`.
    fn serial_method(&mut self) -> Parse<Node> {
        self.keyword(Keyword::Serial)?;
        self.expect(Token::Period)?;

        match self.peek() {
            Token::Id(method) if is_serial_begin(method) => {
                self.next();
                self.baud_rate()
            }

            Token::Keyword(Keyword::Print) | Token::Keyword(Keyword::Println) => self.call(),

            _ => {
                let (position, found) = self.next().split();
                fail(ParserError::ExpectedSerialMethod(found), position)
            }
        }
    }

    fn baud_rate(&mut self) -> Parse<Node> {
        self.expect(Token::OpenParen)?;

        let (position, token) = self.next().split();
        let baud_rate = match token {
            Token::IntLiteral(baud_rate) => baud_rate,
            found => return fail(ParserError::ExpectedBaudRate(found), position),
        };

        self.expect(Token::CloseParen)?;
        Ok(Node::SerialBegin { baud_rate })
    }

    /// Llamada a función con argumentos entre paréntesis.
    ///
    /// Las llamadas a lecturas, escrituras, `ждать` e impresiones se
    /// traducen directamente a sus nodos especializados siempre que
    /// sus argumentos tengan la forma esperada. Cualquier otra se
    /// convierte en un [`Node::FunctionCall`].
    fn call(&mut self) -> Parse<Node> {
        let (position, callee) = self.next().split();
        let (keyword, name) = match &callee {
            Token::Keyword(keyword) => {
                let name = arduino::function_name(*keyword).unwrap_or_else(|| keyword.as_str());
                (Some(*keyword), name.to_owned())
            }

            Token::Id(id) => (None, id.to_string()),
            _ => return fail(ParserError::ExpectedId(callee.clone()), position),
        };

        self.expect(Token::OpenParen)?;

        let mut args = Vec::new();
        if !self.at(&Token::CloseParen) {
            loop {
                args.push(self.expr()?);
                if !self.at(&Token::Comma) {
                    break;
                }

                self.next();
            }
        }

        self.expect(Token::CloseParen)?;

        let pin = args.first().and_then(Pin::from_expr);
        let node = match (keyword, pin, args.len()) {
            (Some(Keyword::DigitalWrite), Some(pin), count) if count >= 2 => Node::DigitalWrite {
                pin,
                value: args.swap_remove(1),
            },

            (Some(Keyword::AnalogWrite), Some(pin), count) if count >= 2 => Node::AnalogWrite {
                pin,
                value: args.swap_remove(1),
            },

            (Some(Keyword::DigitalRead), Some(pin), _) => Node::DigitalRead { pin },
            (Some(Keyword::AnalogRead), Some(pin), _) => Node::AnalogRead { pin },

            (Some(Keyword::Delay), _, count) if count >= 1 => Node::Delay {
                duration: args.swap_remove(0),
            },

            (Some(Keyword::Print), _, _) => Node::SerialPrint {
                value: args.into_iter().next(),
                newline: false,
            },

            (Some(Keyword::Println), _, _) => Node::SerialPrint {
                value: args.into_iter().next(),
                newline: true,
            },

            _ => Node::FunctionCall { name, args },
        };

        Ok(node)
    }

    /// Un operando, opcionalmente seguido de un operador binario y un
    /// segundo operando. No hay precedencia ni anidamiento.
    fn expr(&mut self) -> Parse<Expr> {
        let left = self.operand()?;

        let op = match binary_operator(self.peek()) {
            Some(op) => op,
            None => return Ok(left),
        };

        self.next();
        let right = self.operand()?;

        Ok(Expr::Node(Box::new(Node::BinaryOp { left, op, right })))
    }

    fn operand(&mut self) -> Parse<Expr> {
        if starts_call(self.peek(), self.peek_second()) {
            return Ok(Expr::Node(Box::new(self.call()?)));
        }

        let (position, token) = self.next().split();
        let value = match token {
            Token::Id(id) => Value::Name(id),
            Token::PinLiteral(pin) => Value::Pin(pin),
            Token::Keyword(keyword) if arduino::constant_name(keyword).is_some() => {
                Value::Constant(keyword)
            }

            token => match self.literal_value(token) {
                Ok(value) => value,
                Err(found) => return fail(ParserError::ExpectedOperand(found), position),
            },
        };

        Ok(Expr::Value(value))
    }

    /// Literal para inicializaciones de variables.
    fn literal(&mut self) -> Parse<Value> {
        let (position, token) = self.next().split();
        self.literal_value(token)
            .or_else(|found| fail(ParserError::ExpectedLiteral(found), position))
    }

    /// Interpreta un token ya consumido como literal. Un `-` seguido de
    /// un literal numérico produce el valor negado.
    fn literal_value(&mut self, token: Token) -> Result<Value, Token> {
        let value = match token {
            Token::IntLiteral(integer) => Value::Int(integer),
            Token::FloatLiteral(float) => Value::Float(float),
            Token::StrLiteral(string) => Value::Str(string),
            Token::CharLiteral(c) => Value::Char(c),

            Token::Keyword(keyword) => match logic_level(keyword) {
                Some(level) => Value::Logic(level),
                None => return Err(Token::Keyword(keyword)),
            },

            Token::Minus => match self.peek().clone() {
                Token::IntLiteral(integer) => {
                    self.next();
                    Value::Int(integer.saturating_neg())
                }

                Token::FloatLiteral(float) => {
                    self.next();
                    Value::Float(-float)
                }

                _ => return Err(Token::Minus),
            },

            found => return Err(found),
        };

        Ok(value)
    }

    fn typ(&mut self) -> Parse<Type> {
        let (position, token) = self.next().split();
        let typ = match token {
            Token::Keyword(Keyword::Int) => Type::Int,
            Token::Keyword(Keyword::Float) => Type::Float,
            Token::Keyword(Keyword::Bool) => Type::Bool,
            Token::Keyword(Keyword::Char) => Type::Char,
            Token::Keyword(Keyword::Str) => Type::Str,
            Token::Keyword(Keyword::Array) => Type::Array,
            Token::Keyword(Keyword::Void) => Type::Void,
            found => return fail(ParserError::ExpectedType(found), position),
        };

        Ok(typ)
    }

    fn id(&mut self) -> Parse<Identifier> {
        let (position, token) = self.next().split();
        match token {
            Token::Id(id) => Ok(id),
            found => fail(ParserError::ExpectedId(found), position),
        }
    }

    fn keyword(&mut self, keyword: Keyword) -> Parse<()> {
        self.expect(Token::Keyword(keyword))
    }

    fn expect(&mut self, token: Token) -> Parse<()> {
        let (position, found) = self.next().split();
        if found == token {
            Ok(())
        } else {
            fail(ParserError::UnexpectedToken(token, found), position)
        }
    }

    fn at(&self, token: &Token) -> bool {
        self.peek() == token
    }

    fn at_any(&self, keywords: &[Keyword]) -> bool {
        match self.peek() {
            Token::Keyword(keyword) => keywords.contains(keyword),
            _ => false,
        }
    }

    fn at_eof(&self) -> bool {
        self.cursor >= self.tokens.len() || self.at(&Token::Eof)
    }

    fn peek(&self) -> &Token {
        self.nth(0).val()
    }

    fn peek_second(&self) -> &Token {
        self.nth(1).val()
    }

    /// Token a `offset` posiciones del cursor. Más allá del final se
    /// repite el último token, que normalmente es [`Token::Eof`].
    fn nth(&self, offset: usize) -> &Located<Token> {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.cursor + offset).min(last)]
    }

    /// Consume el token actual.
    fn next(&mut self) -> Located<Token> {
        let token = self.nth(0).clone();
        self.cursor += 1;

        token
    }
}

fn fail<T>(error: ParserError, position: Position) -> Parse<T> {
    Err(Located::at(error, position))
}

fn is_serial_begin(method: &Identifier) -> bool {
    let method: &str = method.as_ref();
    unicase::eq(method, SERIAL_BEGIN_METHOD)
}

fn is_type(keyword: Keyword) -> bool {
    use Keyword::*;
    matches!(keyword, Int | Float | Bool | Char | Str)
}

/// Valor lógico de `высоко`/`низко`, `истина`/`ложь` y `включено`/`выключено`.
fn logic_level(keyword: Keyword) -> Option<bool> {
    use Keyword::*;

    match keyword {
        High | True | On => Some(true),
        Low | False | Off => Some(false),
        _ => None,
    }
}

/// Determina si los dos próximos tokens inician una llamada.
///
/// Las palabras clave de lectura, escritura, espera e impresión siempre
/// se tratan como llamadas, de modo que un paréntesis faltante se
/// reporta como error. Lo mismo aplica a los identificadores que nombran
/// funciones reconocidas de la plataforma, como `tone`. Las demás
/// palabras clave invocables y los identificadores requieren `(` a
/// continuación.
fn starts_call(token: &Token, second: &Token) -> bool {
    use Keyword::*;

    match token {
        Token::Keyword(DigitalWrite)
        | Token::Keyword(DigitalRead)
        | Token::Keyword(AnalogWrite)
        | Token::Keyword(AnalogRead)
        | Token::Keyword(Delay)
        | Token::Keyword(Print)
        | Token::Keyword(Println) => true,

        Token::Keyword(keyword) => {
            *second == Token::OpenParen && arduino::function_name(*keyword).is_some()
        }

        Token::Id(id) => *second == Token::OpenParen || arduino::is_builtin(id.as_ref()),
        _ => false,
    }
}

fn starts_operand(token: &Token) -> bool {
    match token {
        Token::Id(_)
        | Token::PinLiteral(_)
        | Token::IntLiteral(_)
        | Token::FloatLiteral(_)
        | Token::StrLiteral(_)
        | Token::CharLiteral(_)
        | Token::Minus => true,

        Token::Keyword(keyword) => {
            logic_level(*keyword).is_some()
                || arduino::constant_name(*keyword).is_some()
                || arduino::function_name(*keyword).is_some()
        }

        _ => false,
    }
}

fn binary_operator(token: &Token) -> Option<BinOp> {
    let op = match token {
        Token::Plus => BinOp::Add,
        Token::Minus => BinOp::Sub,
        Token::Times => BinOp::Mul,
        Token::Slash => BinOp::Div,
        Token::Percent => BinOp::Mod,
        Token::Equal | Token::Keyword(Keyword::Equal) => BinOp::Equal,
        Token::NotEqual | Token::Keyword(Keyword::NotEqual) => BinOp::NotEqual,
        Token::Less | Token::Keyword(Keyword::Less) => BinOp::Less,
        Token::LessOrEqual | Token::Keyword(Keyword::LessOrEqual) => BinOp::LessOrEqual,
        Token::Greater | Token::Keyword(Keyword::Greater) => BinOp::Greater,
        Token::GreaterOrEqual | Token::Keyword(Keyword::GreaterOrEqual) => BinOp::GreaterOrEqual,
        Token::And | Token::Keyword(Keyword::And) => BinOp::And,
        Token::Or | Token::Keyword(Keyword::Or) => BinOp::Or,
        _ => return None,
    };

    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::tokenize;

    fn parse_source(source: &str) -> Parse<(Ast, SymbolTable)> {
        let mut symbols = SymbolTable::new();
        let ast = parse(&tokenize(source), &mut symbols)?;
        Ok((ast, symbols))
    }

    fn nodes(source: &str) -> Vec<Node> {
        parse_source(source).unwrap().0.nodes().to_vec()
    }

    fn int(value: i64) -> Expr {
        Expr::Value(Value::Int(value))
    }

    fn name(name: &str) -> Identifier {
        Identifier::new(name)
    }

    #[test]
    fn blink() {
        let source = "пин 13 = выход\nцикл:\n  цифрзапись(13, высоко)\n  ждать(1000)\n  цифрзапись(13, низко)\n  ждать(500)\nконец";
        let (ast, symbols) = parse_source(source).unwrap();

        let expected = vec![
            Node::PinDeclaration {
                pin: Pin::Number(13),
                mode: PinMode::Output,
                value: None,
            },
            Node::Loop {
                body: vec![
                    Node::DigitalWrite {
                        pin: Pin::Number(13),
                        value: Expr::Value(Value::Logic(true)),
                    },
                    Node::Delay { duration: int(1000) },
                    Node::DigitalWrite {
                        pin: Pin::Number(13),
                        value: Expr::Value(Value::Logic(false)),
                    },
                    Node::Delay { duration: int(500) },
                ],
            },
        ];

        assert_eq!(ast.nodes(), &expected[..]);
        assert!(symbols.is_pin("13"));
    }

    #[test]
    fn empty_program() {
        assert_eq!(nodes(""), vec![]);
        assert_eq!(parse(&[], &mut SymbolTable::new()), Ok(Ast::default()));
    }

    #[test]
    fn missing_pin_mode_reports_offending_token() {
        let error = parse_source("пин 13 =\nцикл:\nконец").unwrap_err();

        assert_eq!(error.position(), Position::new(2, 1));
        assert_eq!(
            error.val(),
            &ParserError::ExpectedPinMode(Token::Keyword(Keyword::Loop))
        );
    }

    #[test]
    fn truncated_input_reports_end_of_input() {
        let error = parse_source("пин 13").unwrap_err();
        assert_eq!(
            error.val(),
            &ParserError::UnexpectedToken(Token::Assign, Token::Eof)
        );

        let error = parse_source("цифрзапись(13, ").unwrap_err();
        assert_eq!(error.val(), &ParserError::ExpectedOperand(Token::Eof));
    }

    #[test]
    fn initial_pin_level() {
        let expected = Node::PinDeclaration {
            pin: Pin::Prefixed("D7".into()),
            mode: PinMode::Output,
            value: Some(Value::Logic(false)),
        };

        assert_eq!(nodes("пин D7 = выход = низко"), vec![expected]);

        let error = parse_source("пин 7 = выход = цикл").unwrap_err();
        assert_eq!(
            error.val(),
            &ParserError::ExpectedPinValue(Token::Keyword(Keyword::Loop))
        );
    }

    #[test]
    fn unknown_tokens_are_skipped() {
        let source = "42 ) пин 2 = вход\nцикл: ; 7 ждать(10) конец";
        let found = nodes(source);

        assert_eq!(found.len(), 2);
        assert_eq!(
            found[1],
            Node::Loop {
                body: vec![Node::Delay { duration: int(10) }]
            }
        );
    }

    #[test]
    fn loop_without_end_runs_to_end_of_input() {
        let found = nodes("цикл:\nждать(1)");
        assert_eq!(
            found,
            vec![Node::Loop {
                body: vec![Node::Delay { duration: int(1) }]
            }]
        );
    }

    #[test]
    fn conditional_chain() {
        let source = "цикл:
            если цифрчтение(2) == высоко:
                цифрзапись(13, высоко)
            иначе_если x > 3:
                ждать(1)
            иначе:
                прервать
            конец
        конец";

        let found = nodes(source);
        let body = match &found[..] {
            [Node::Loop { body }] => body,
            other => panic!("unexpected nodes: {:?}", other),
        };

        let (condition, otherwise) = match &body[..] {
            [Node::If {
                condition,
                body,
                otherwise,
            }] => {
                assert_eq!(body.len(), 1);
                (condition, otherwise)
            }

            other => panic!("unexpected body: {:?}", other),
        };

        let read = Expr::Node(Box::new(Node::DigitalRead { pin: Pin::Number(2) }));
        assert_eq!(
            condition,
            &Expr::Node(Box::new(Node::BinaryOp {
                left: read,
                op: BinOp::Equal,
                right: Expr::Value(Value::Logic(true)),
            }))
        );

        match &otherwise[..] {
            [Node::If { body, otherwise, .. }] => {
                assert_eq!(body, &vec![Node::Delay { duration: int(1) }]);
                assert_eq!(otherwise, &vec![Node::Break]);
            }

            other => panic!("unexpected alternative: {:?}", other),
        }
    }

    #[test]
    fn word_operators() {
        let found = nodes("цикл: пока x больше_равно 10: x = x - 1 конец конец");
        let expected = Node::While {
            condition: Expr::Node(Box::new(Node::BinaryOp {
                left: Expr::Value(Value::Name(name("x"))),
                op: BinOp::GreaterOrEqual,
                right: int(10),
            })),

            body: vec![Node::Assignment {
                name: name("x"),
                value: Expr::Node(Box::new(Node::BinaryOp {
                    left: Expr::Value(Value::Name(name("x"))),
                    op: BinOp::Sub,
                    right: int(1),
                })),
            }],
        };

        assert_eq!(found, vec![Node::Loop { body: vec![expected] }]);
    }

    #[test]
    fn counted_loop() {
        let found = nodes("цикл: для (целое i = 0; i < 3; i = i + 1): ждать(i) конец конец");
        let body = match &found[..] {
            [Node::Loop { body }] => body,
            other => panic!("unexpected nodes: {:?}", other),
        };

        match &body[..] {
            [Node::For {
                init: Some(init),
                step: Some(_),
                body,
                ..
            }] => {
                assert_eq!(
                    **init,
                    Node::VariableDeclaration {
                        name: name("i"),
                        typ: Type::Int,
                        value: Some(Value::Int(0)),
                    }
                );

                assert_eq!(body.len(), 1);
            }

            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn function_declaration_registers_symbol() {
        let source = "функция сумма(целое a, целое b) -> целое:\n  вернуть a + b\nконец";
        let (ast, symbols) = parse_source(source).unwrap();

        match ast.nodes() {
            [Node::FunctionDeclaration {
                name,
                parameters,
                returns,
                body,
            }] => {
                assert_eq!(name.as_ref(), "сумма");
                assert_eq!(parameters.len(), 2);
                assert_eq!(*returns, Type::Int);
                assert!(matches!(body[..], [Node::Return(Some(_))]));
            }

            other => panic!("unexpected nodes: {:?}", other),
        }

        assert_eq!(
            symbols.lookup("сумма"),
            Some(&Symbol::Function {
                parameters: vec![Type::Int, Type::Int],
                returns: Type::Int,
            })
        );
    }

    #[test]
    fn function_without_end_fails() {
        let error = parse_source("функция f():\n  ждать(1)\n").unwrap_err();
        assert_eq!(
            error.val(),
            &ParserError::UnexpectedToken(Token::Keyword(Keyword::End), Token::Eof)
        );
    }

    #[test]
    fn variables_are_registered() {
        let (ast, symbols) = parse_source("дробное k = -2.5\nстрока s = \"hola\"").unwrap();

        assert_eq!(ast.nodes().len(), 2);
        assert_eq!(symbols.variable_type("k"), Some(Type::Float));
        assert_eq!(
            symbols.lookup("s"),
            Some(&Symbol::Variable {
                typ: Type::Str,
                value: Some(Value::Str("hola".into())),
            })
        );
    }

    #[test]
    fn serial_forms() {
        let source = "последовательный.начать(9600)\nначать_последовательный(115200)\nцикл: последовательный.печать_строка(\"ok\") печать() конец";
        let found = nodes(source);

        assert_eq!(found[0], Node::SerialBegin { baud_rate: 9600 });
        assert_eq!(found[1], Node::SerialBegin { baud_rate: 115200 });
        assert_eq!(
            found[2],
            Node::Loop {
                body: vec![
                    Node::SerialPrint {
                        value: Some(Expr::Value(Value::Str("ok".into()))),
                        newline: true,
                    },
                    Node::SerialPrint {
                        value: None,
                        newline: false,
                    },
                ]
            }
        );

        let error = parse_source("последовательный.закрыть()").unwrap_err();
        assert!(matches!(error.val(), ParserError::ExpectedSerialMethod(_)));
    }

    #[test]
    fn serial_begin_inside_blocks() {
        let found = nodes("цикл:\n  начать_последовательный(9600)\nконец");
        assert_eq!(
            found,
            vec![Node::Loop {
                body: vec![Node::SerialBegin { baud_rate: 9600 }]
            }]
        );
    }

    #[test]
    fn platform_functions_require_arguments() {
        let found = nodes("tone(8, 440)");
        assert_eq!(
            found,
            vec![Node::FunctionCall {
                name: "tone".into(),
                args: vec![int(8), int(440)],
            }]
        );

        let error = parse_source("цикл:\n  tone 8\nконец").unwrap_err();
        assert_eq!(
            error.val(),
            &ParserError::UnexpectedToken(Token::OpenParen, Token::IntLiteral(8))
        );
        assert_eq!(error.position(), Position::new(2, 8));
    }

    #[test]
    fn keyword_calls_use_target_names() {
        let found = nodes("режим(13, выход)\nмигать(2)");
        assert_eq!(
            found,
            vec![
                Node::FunctionCall {
                    name: "pinMode".into(),
                    args: vec![int(13), Expr::Value(Value::Constant(Keyword::Output))],
                },
                Node::FunctionCall {
                    name: "мигать".into(),
                    args: vec![int(2)],
                },
            ]
        );
    }

    #[test]
    fn missing_operand() {
        let error = parse_source("цикл: x = ) конец").unwrap_err();
        assert_eq!(error.val(), &ParserError::ExpectedOperand(Token::CloseParen));
        assert_eq!(error.position(), Position::new(1, 11));
    }
}
