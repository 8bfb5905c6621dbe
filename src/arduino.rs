//! Conocimiento estático sobre la plataforma objetivo.
//!
//! Este módulo reúne las tablas de solo lectura que describen la API de
//! Arduino: alias simbólicos de pines, el registro de funciones de
//! biblioteca reconocidas y la correspondencia entre palabras clave del
//! lenguaje y los nombres de la API objetivo. Todas las tablas se
//! construyen una única vez por proceso y se comparten entre
//! compilaciones.

use crate::lex::Keyword;
use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};
use unicase::UniCase;

/// Alias de dispositivos comunes y el pin al que se conectan por defecto.
const PIN_ALIASES: &[(&str, &str)] = &[
    ("светодиод", "13"),
    ("кнопка", "2"),
    ("потенциометр", "A0"),
    ("термистор", "A1"),
    ("фоторезистор", "A2"),
    ("зуммер", "3"),
    ("серво", "9"),
    ("ультразвук_триггер", "10"),
    ("ультразвук_эхо", "11"),
    ("дисплей_sda", "A4"),
    ("дисплей_scl", "A5"),
];

/// Funciones de biblioteca reconocidas.
///
/// Este registro sirve de referencia y validación; el generador no
/// rechaza llamadas a funciones ausentes de esta lista.
const BUILTIN_FUNCTIONS: &[&str] = &[
    "pinMode",
    "digitalWrite",
    "digitalRead",
    "analogWrite",
    "analogRead",
    "delay",
    "delayMicroseconds",
    "millis",
    "micros",
    "attachInterrupt",
    "detachInterrupt",
    "random",
    "randomSeed",
    "map",
    "constrain",
    "abs",
    "sin",
    "cos",
    "tan",
    "sqrt",
    "sq",
    "pow",
    "min",
    "max",
    "bitRead",
    "bitWrite",
    "bitSet",
    "bitClear",
    "Serial.begin",
    "Serial.print",
    "Serial.println",
    "Serial.available",
    "Serial.read",
    "Serial.find",
    "Serial.findUntil",
    "Serial.flush",
    "tone",
    "noTone",
    "pulseIn",
    "shiftOut",
    "shiftIn",
    "analogReference",
];

lazy_static! {
    static ref ALIASES: HashMap<UniCase<String>, &'static str> = PIN_ALIASES
        .iter()
        .map(|&(alias, pin)| (UniCase::new(alias.to_owned()), pin))
        .collect();

    static ref BUILTINS: HashSet<&'static str> = BUILTIN_FUNCTIONS.iter().copied().collect();
}

/// Resuelve un alias simbólico de dispositivo a su pin canónico.
pub fn pin_alias(name: &str) -> Option<&'static str> {
    ALIASES.get(&UniCase::new(name.to_owned())).copied()
}

/// Determina si un nombre pertenece al registro de funciones reconocidas.
pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(name)
}

/// Nombre en la API objetivo de una palabra clave invocable como función.
///
/// Las lecturas, escrituras, `ждать` y las impresiones tienen nodos
/// propios y no pasan por aquí.
pub fn function_name(keyword: Keyword) -> Option<&'static str> {
    use Keyword::*;

    let name = match keyword {
        PinMode => "pinMode",
        DigitalWrite => "digitalWrite",
        DigitalRead => "digitalRead",
        AnalogWrite => "analogWrite",
        AnalogRead => "analogRead",
        Delay | Pause => "delay",
        Millis => "millis",
        Micros => "micros",
        AttachInterrupt => "attachInterrupt",
        DetachInterrupt => "detachInterrupt",
        Random => "random",
        RandomSeed => "randomSeed",
        Max => "max",
        Min => "min",
        Constrain => "constrain",
        Map => "map",
        Pow => "pow",
        Sq => "sq",
        Sqrt => "sqrt",
        Abs => "abs",
        Sin => "sin",
        Cos => "cos",
        Tan => "tan",
        BitRead => "bitRead",
        BitWrite => "bitWrite",
        BitSet => "bitSet",
        BitClear => "bitClear",
        Print => "Serial.print",
        Println => "Serial.println",
        Available => "Serial.available",
        Read => "Serial.read",
        Find => "Serial.find",
        FindUntil => "Serial.findUntil",
        Flush => "Serial.flush",
        _ => return None,
    };

    Some(name)
}

/// Constante de la API objetivo asociada a una palabra clave usada como valor.
pub fn constant_name(keyword: Keyword) -> Option<&'static str> {
    use Keyword::*;

    let name = match keyword {
        Input | Analog => "INPUT",
        Output | Pwm => "OUTPUT",
        InputPullup => "INPUT_PULLUP",
        Change => "CHANGE",
        Rising => "RISING",
        Falling => "FALLING",
        Pi => "PI",
        _ => return None,
    };

    Some(name)
}
