//! Generación de código objetivo.
//!
//! El generador recorre el AST en dos fases. La primera visita todas las
//! construcciones de nivel superior y produce el cuerpo de `setup()`,
//! mientras acumula includes, variables globales y funciones de usuario.
//! La segunda produce el cuerpo de `loop()` a partir del primer bloque
//! `цикл`; cualquier bloque `цикл` adicional se ignora.

use std::{
    collections::{BTreeSet, HashSet},
    mem,
};

use crate::{
    arduino,
    parse::{Ast, BinOp, Expr, Node, Parameter, Pin, PinMode, Type, Value},
    symbols::SymbolTable,
};

const HEADER: &[&str] = &["// Сгенерировано ArduinoScript", "// Автоматически созданный код"];

const GLOBALS_COMMENT: &str = "// Глобальные переменные";

const BASE_INCLUDE: &str = "<Arduino.h>";

const SERIAL_INCLUDE: &str = "<SoftwareSerial.h>";

const INDENT: &str = "  ";

/// Tipo objetivo de los tipos sin correspondencia propia.
const DEFAULT_TYPE: &str = "int";

const TYPE_NAMES: &[(Type, &str)] = &[
    (Type::Int, "int"),
    (Type::Float, "float"),
    (Type::Bool, "bool"),
    (Type::Char, "char"),
    (Type::Str, "String"),
    (Type::Void, "void"),
];

macro_rules! emit {
    ($self:expr, $($format:tt)*) => {{
        let line = format!($($format)*);
        $self.line(line)
    }};
}

/// Genera el texto fuente objetivo de un programa.
///
/// `symbols` debe ser la tabla que llenó el parser al construir `ast`.
pub fn generate(ast: &Ast, symbols: &SymbolTable) -> String {
    let mut generator = Generator::new(symbols);

    for node in ast.nodes() {
        generator.top_level(node);
    }

    let setup = generator.take_block();

    let first_loop = ast.nodes().iter().find_map(|node| match node {
        Node::Loop { body } => Some(body),
        _ => None,
    });

    if let Some(body) = first_loop {
        generator.statements(body);
    }

    let repeat = generator.take_block();
    generator.finish(setup, repeat)
}

/// Nombre del tipo objetivo. Los tipos sin correspondencia en la tabla
/// se representan como enteros.
pub fn c_type(typ: Type) -> &'static str {
    TYPE_NAMES
        .iter()
        .find(|(known, _)| *known == typ)
        .map(|(_, name)| *name)
        .unwrap_or(DEFAULT_TYPE)
}

/// Contexto en el cual se representa un valor.
#[derive(Copy, Clone, Debug, PartialEq)]
enum Context {
    /// Niveles lógicos como `HIGH`/`LOW`.
    Pin,

    /// Niveles lógicos como `true`/`false`.
    General,

    /// Valor destinado a una variable del tipo dado.
    Typed(Type),
}

struct Generator<'s> {
    symbols: &'s SymbolTable,
    includes: BTreeSet<&'static str>,
    globals: Vec<String>,
    global_names: HashSet<String>,
    functions: Vec<String>,
    block: Vec<String>,
    depth: usize,
}

impl<'s> Generator<'s> {
    fn new(symbols: &'s SymbolTable) -> Self {
        let mut includes = BTreeSet::new();
        includes.insert(BASE_INCLUDE);

        Generator {
            symbols,
            includes,
            globals: Vec::new(),
            global_names: HashSet::new(),
            functions: Vec::new(),
            block: Vec::new(),
            depth: 1,
        }
    }

    fn line(&mut self, text: String) {
        let mut line = INDENT.repeat(self.depth);
        line.push_str(&text);
        self.block.push(line);
    }

    fn take_block(&mut self) -> Vec<String> {
        mem::take(&mut self.block)
    }

    fn finish(self, setup: Vec<String>, repeat: Vec<String>) -> String {
        let mut lines: Vec<String> = HEADER.iter().map(|line| line.to_string()).collect();
        lines.push(String::new());

        lines.extend(
            self.includes
                .iter()
                .map(|include| format!("#include {}", include)),
        );

        lines.push(String::new());

        if !self.globals.is_empty() {
            lines.push(GLOBALS_COMMENT.to_owned());
            lines.extend(self.globals);
            lines.push(String::new());
        }

        lines.extend(self.functions);

        lines.push("void setup() {".to_owned());
        lines.extend(setup);
        lines.push("}".to_owned());
        lines.push(String::new());

        lines.push("void loop() {".to_owned());
        lines.extend(repeat);
        lines.push("}".to_owned());

        let mut output = lines.join("\n");
        output.push('\n');
        output
    }

    /// Primera fase: construcciones de nivel superior.
    fn top_level(&mut self, node: &Node) {
        match node {
            Node::Loop { .. } => (),

            Node::VariableDeclaration { name, .. } => {
                if self.global_names.insert(name.to_string()) {
                    let declaration = self.inline(node);
                    self.globals.push(format!("{};", declaration));
                }
            }

            _ => self.statement(node),
        }
    }

    fn statements(&mut self, nodes: &[Node]) {
        for node in nodes {
            self.statement(node);
        }
    }

    fn nested(&mut self, nodes: &[Node]) {
        self.depth += 1;
        self.statements(nodes);
        self.depth -= 1;
    }

    fn statement(&mut self, node: &Node) {
        match node {
            Node::PinDeclaration { pin, mode, value } => {
                let pin = self.pin(pin);
                let mode = pin_mode(*mode);
                emit!(self, "pinMode({}, {});", pin, mode);

                if let (Some(value), "OUTPUT") = (value, mode) {
                    let value = self.value(value, Context::Pin);
                    emit!(self, "digitalWrite({}, {});", pin, value);
                }
            }

            // Solo alcanzable para bloques anidados; su cuerpo se ejecuta en línea
            Node::Loop { body } => self.statements(body),

            Node::If {
                condition,
                body,
                otherwise,
            } => {
                let condition = self.expr(condition, Context::General);
                emit!(self, "if ({}) {{", condition);
                self.nested(body);
                self.otherwise(otherwise);
                emit!(self, "}}");
            }

            Node::While { condition, body } => {
                let condition = self.expr(condition, Context::General);
                emit!(self, "while ({}) {{", condition);
                self.nested(body);
                emit!(self, "}}");
            }

            Node::For {
                init,
                condition,
                step,
                body,
            } => {
                let init = init.as_deref().map(|init| self.inline(init)).unwrap_or_default();
                let condition = self.expr(condition, Context::General);
                let step = step.as_deref().map(|step| self.inline(step)).unwrap_or_default();

                emit!(self, "for ({}; {}; {}) {{", init, condition, step);
                self.nested(body);
                emit!(self, "}}");
            }

            Node::FunctionDeclaration {
                name,
                parameters,
                returns,
                body,
            } => self.function(name.as_ref(), parameters, *returns, body),

            Node::Return(value) => match value {
                Some(value) => {
                    let value = self.expr(value, Context::General);
                    emit!(self, "return {};", value);
                }

                None => emit!(self, "return;"),
            },

            Node::Break => emit!(self, "break;"),
            Node::Continue => emit!(self, "continue;"),

            Node::SerialBegin { .. } => {
                self.includes.insert(SERIAL_INCLUDE);
                let call = self.inline(node);
                emit!(self, "{};", call);
            }

            Node::DigitalWrite { .. }
            | Node::DigitalRead { .. }
            | Node::AnalogWrite { .. }
            | Node::AnalogRead { .. }
            | Node::Delay { .. }
            | Node::SerialPrint { .. }
            | Node::VariableDeclaration { .. }
            | Node::Assignment { .. }
            | Node::FunctionCall { .. }
            | Node::BinaryOp { .. } => {
                let text = self.inline(node);
                emit!(self, "{};", text);
            }
        }
    }

    /// Ramas `else` y `else if` de un condicional.
    fn otherwise(&mut self, otherwise: &[Node]) {
        match otherwise {
            [] => (),

            [Node::If {
                condition,
                body,
                otherwise,
            }] => {
                let condition = self.expr(condition, Context::General);
                emit!(self, "}} else if ({}) {{", condition);
                self.nested(body);
                self.otherwise(otherwise);
            }

            _ => {
                emit!(self, "}} else {{");
                self.nested(otherwise);
            }
        }
    }

    /// Emite una función de usuario en el ámbito del archivo.
    fn function(&mut self, name: &str, parameters: &[Parameter], returns: Type, body: &[Node]) {
        let outer = self.take_block();
        let depth = mem::replace(&mut self.depth, 1);

        self.statements(body);

        let body = mem::replace(&mut self.block, outer);
        self.depth = depth;

        let parameters: Vec<String> = parameters
            .iter()
            .map(|parameter| format!("{} {}", c_type(parameter.typ), parameter.name))
            .collect();

        self.functions.push(format!(
            "{} {}({}) {{",
            c_type(returns),
            name,
            parameters.join(", ")
        ));

        self.functions.extend(body);
        self.functions.push("}".to_owned());
        self.functions.push(String::new());
    }

    /// Representación sin terminador de nodos que caben en una línea.
    fn inline(&self, node: &Node) -> String {
        match node {
            Node::DigitalWrite { pin, value } => {
                let value = self.expr(value, Context::Pin);
                format!("digitalWrite({}, {})", self.pin(pin), value)
            }

            Node::DigitalRead { pin } => format!("digitalRead({})", self.pin(pin)),

            Node::AnalogWrite { pin, value } => {
                let value = self.expr(value, Context::General);
                format!("analogWrite({}, {})", self.pin(pin), value)
            }

            Node::AnalogRead { pin } => format!("analogRead({})", self.analog_pin(pin)),

            Node::Delay { duration } => {
                format!("delay({})", self.expr(duration, Context::General))
            }

            Node::SerialBegin { baud_rate } => format!("Serial.begin({})", baud_rate),

            Node::SerialPrint { value, newline } => {
                let method = if *newline { "println" } else { "print" };
                let value = value
                    .as_ref()
                    .map(|value| self.expr(value, Context::General))
                    .unwrap_or_default();

                format!("Serial.{}({})", method, value)
            }

            Node::VariableDeclaration { name, typ, value } => {
                let typ_name = c_type(*typ);
                match value {
                    Some(value) => {
                        let value = self.value(value, Context::Typed(*typ));
                        format!("{} {} = {}", typ_name, name, value)
                    }

                    None => format!("{} {}", typ_name, name),
                }
            }

            Node::Assignment { name, value } => {
                let context = self
                    .symbols
                    .variable_type(name.as_ref())
                    .map(Context::Typed)
                    .unwrap_or(Context::General);

                format!("{} = {}", name, self.expr(value, context))
            }

            Node::FunctionCall { name, args } => {
                let args: Vec<String> = args
                    .iter()
                    .map(|arg| self.expr(arg, Context::General))
                    .collect();

                format!("{}({})", name, args.join(", "))
            }

            Node::BinaryOp { left, op, right } => self.binary(left, *op, right),

            Node::PinDeclaration { .. }
            | Node::Loop { .. }
            | Node::If { .. }
            | Node::While { .. }
            | Node::For { .. }
            | Node::FunctionDeclaration { .. }
            | Node::Return(_)
            | Node::Break
            | Node::Continue => String::new(),
        }
    }

    fn binary(&self, left: &Expr, op: BinOp, right: &Expr) -> String {
        let context = if op.is_comparison() && (self.is_pin_expr(left) || self.is_pin_expr(right)) {
            Context::Pin
        } else {
            Context::General
        };

        format!(
            "{} {} {}",
            self.expr(left, context),
            op,
            self.expr(right, context)
        )
    }

    /// Determina si una expresión denota el estado de un pin digital.
    fn is_pin_expr(&self, expr: &Expr) -> bool {
        match expr {
            Expr::Node(node) => matches!(**node, Node::DigitalRead { .. }),
            Expr::Value(Value::Pin(_)) => true,
            Expr::Value(Value::Name(name)) => {
                let name: &str = name.as_ref();
                self.symbols.is_pin(name) || arduino::pin_alias(name).is_some()
            }

            Expr::Value(_) => false,
        }
    }

    fn expr(&self, expr: &Expr, context: Context) -> String {
        match expr {
            Expr::Value(value) => self.value(value, context),
            Expr::Node(node) => self.inline(node),
        }
    }

    fn value(&self, value: &Value, context: Context) -> String {
        match value {
            Value::Int(integer) => integer.to_string(),
            Value::Float(float) => format!("{:?}", float),
            Value::Str(string) => quote(string),

            Value::Char(c) => match context {
                Context::Typed(Type::Str) => quote(&c.to_string()),
                _ => format!("'{}'", escape(*c)),
            },

            Value::Logic(level) => logic(*level, context).to_owned(),

            Value::Constant(keyword) => arduino::constant_name(*keyword)
                .unwrap_or_else(|| keyword.as_str())
                .to_owned(),

            Value::Pin(pin) => normalize_pin(pin),
            Value::Name(name) => match arduino::pin_alias(name.as_ref()) {
                Some(pin) => normalize_pin(pin),
                None => name.to_string(),
            },
        }
    }

    fn pin(&self, pin: &Pin) -> String {
        match pin {
            Pin::Number(number) => number.to_string(),
            Pin::Prefixed(pin) => normalize_pin(pin),
            Pin::Named(name) => normalize_pin(name.as_ref()),
        }
    }

    /// Pin de una lectura analógica: un número sin prefijo denota un
    /// canal analógico.
    fn analog_pin(&self, pin: &Pin) -> String {
        let pin = self.pin(pin);
        if is_digits(&pin) {
            format!("A{}", pin)
        } else {
            pin
        }
    }
}

fn pin_mode(mode: PinMode) -> &'static str {
    match mode {
        PinMode::Output | PinMode::Pwm => "OUTPUT",
        PinMode::Input | PinMode::Analog => "INPUT",
        PinMode::InputPullup => "INPUT_PULLUP",
    }
}

fn logic(level: bool, context: Context) -> &'static str {
    match (context, level) {
        (Context::Pin, true) => "HIGH",
        (Context::Pin, false) => "LOW",
        (_, true) => "true",
        (_, false) => "false",
    }
}

/// Resuelve alias y normaliza prefijos: `D13` es `13` y `a0` es `A0`.
fn normalize_pin(pin: &str) -> String {
    let pin = arduino::pin_alias(pin).unwrap_or(pin);

    let mut chars = pin.chars();
    let prefix = chars.next();
    let number = chars.as_str();

    match prefix {
        Some('D') | Some('d') if is_digits(number) => number.to_owned(),
        Some('A') | Some('a') if is_digits(number) => format!("A{}", number),
        _ => pin.to_owned(),
    }
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// Literal de texto entre comillas. Los saltos de línea se escapan.
fn quote(string: &str) -> String {
    let mut quoted = String::with_capacity(string.len() + 2);
    quoted.push('"');

    for c in string.chars() {
        match c {
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            c => quoted.push(c),
        }
    }

    quoted.push('"');
    quoted
}

fn escape(c: char) -> String {
    match c {
        '\\' => "\\\\".to_owned(),
        '\n' => "\\n".to_owned(),
        '\r' => "\\r".to_owned(),
        '\t' => "\\t".to_owned(),
        c => c.to_string(),
    }
}
