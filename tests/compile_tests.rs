//! Compilación de extremo a extremo, en memoria y sobre archivos.

use std::{fs, path::Path, thread};

use arduinoscript::{compile, compile_file, driver, parse::ParserError};

const BLINK: &str = "пин 13 = выход\nцикл:\n  цифрзапись(13, высоко)\n  ждать(1000)\n  цифрзапись(13, низко)\n  ждать(500)\nконец";

/// Líneas del cuerpo de una rutina, sin indentación.
fn routine<'a>(output: &'a str, signature: &str) -> Vec<&'a str> {
    output
        .lines()
        .skip_while(|line| *line != signature)
        .skip(1)
        .take_while(|line| *line != "}")
        .map(str::trim)
        .collect()
}

#[test]
fn blink_orders_loop_body() {
    let output = compile(BLINK).unwrap();

    assert_eq!(routine(&output, "void setup() {"), vec!["pinMode(13, OUTPUT);"]);
    assert_eq!(
        routine(&output, "void loop() {"),
        vec![
            "digitalWrite(13, HIGH);",
            "delay(1000);",
            "digitalWrite(13, LOW);",
            "delay(500);",
        ]
    );
}

#[test]
fn delay_argument_is_unchanged() {
    for duration in &[0u32, 1, 250, 1000, 60000, 4294967295] {
        let output = compile(&format!("цикл:\n  ждать({})\nконец", duration)).unwrap();
        assert_eq!(
            routine(&output, "void loop() {"),
            vec![format!("delay({});", duration)]
        );
    }
}

#[test]
fn output_pin_without_level_is_only_configured() {
    for pin in &["2", "7", "13", "A0"] {
        let output = compile(&format!("пин {} = выход", pin)).unwrap();
        let setup = routine(&output, "void setup() {");

        assert_eq!(setup, vec![format!("pinMode({}, OUTPUT);", pin)]);
        assert!(!output.contains("digitalWrite"));
    }
}

#[test]
fn no_loop_leaves_loop_empty() {
    let output = compile("пин 3 = вход\nцелое x = 4").unwrap();
    assert!(output.ends_with("void loop() {\n}\n"));
}

#[test]
fn only_first_loop_is_used() {
    let source = "цикл:\n  ждать(1)\nконец\nцикл:\n  ждать(2)\nконец\nцикл:\n  ждать(3)\nконец";
    let output = compile(source).unwrap();

    assert_eq!(routine(&output, "void loop() {"), vec!["delay(1);"]);
    assert!(!output.contains("delay(2)"));
    assert!(!output.contains("delay(3)"));
}

#[test]
fn missing_mode_is_located() {
    let error = compile("пин 13 =\nцикл:\nконец").unwrap_err();

    assert_eq!((error.line(), error.column()), (2, 1));
    assert!(matches!(error.val(), ParserError::ExpectedPinMode(_)));
}

#[test]
fn empty_program() {
    let expected = "\
// Сгенерировано ArduinoScript
// Автоматически созданный код

#include <Arduino.h>

void setup() {
}

void loop() {
}
";

    assert_eq!(compile("").unwrap(), expected);
    assert_eq!(compile("  // solo un comentario\n").unwrap(), expected);
}

#[test]
fn keywords_and_aliases_ignore_case() {
    let output = compile("ПИН Светодиод = ВЫХОД\nЦИКЛ:\n  ЦифрЗапись(светодиод, Высоко)\nКОНЕЦ").unwrap();

    assert_eq!(routine(&output, "void setup() {"), vec!["pinMode(13, OUTPUT);"]);
    assert_eq!(routine(&output, "void loop() {"), vec!["digitalWrite(13, HIGH);"]);
}

#[test]
fn concurrent_compilations_are_independent() {
    let handles: Vec<_> = (0..8)
        .map(|n| {
            thread::spawn(move || {
                let source = format!("целое v{0} = {0}\nцикл:\n  ждать({0})\nконец", n);
                (n, compile(&source).unwrap())
            })
        })
        .collect();

    for handle in handles {
        let (n, output) = handle.join().unwrap();

        assert!(output.contains(&format!("int v{0} = {0};", n)));
        assert_eq!(output.matches("int v").count(), 1);
        assert_eq!(
            routine(&output, "void loop() {"),
            vec![format!("delay({});", n)]
        );
    }
}

#[test]
fn compile_file_writes_default_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("blink.as");
    fs::write(&input, BLINK).unwrap();

    assert!(compile_file(&input, None));

    let written = fs::read_to_string(dir.path().join("blink.ino")).unwrap();
    assert_eq!(written, compile(BLINK).unwrap());
}

#[test]
fn compile_file_writes_explicit_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("blink.as");
    let output = dir.path().join("sketch.cpp");
    fs::write(&input, BLINK).unwrap();

    let written = driver::try_compile_file(&input, Some(output.as_path())).unwrap();

    assert_eq!(written, output);
    assert!(output.exists());
    assert!(!dir.path().join("blink.ino").exists());
}

#[test]
fn failed_compile_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.as");
    fs::write(&input, "пин 13 =\n").unwrap();

    assert!(!compile_file(&input, None));
    assert!(!dir.path().join("broken.ino").exists());
    assert_eq!(entries(dir.path()), 1);
}

#[test]
fn failed_compile_keeps_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("blink.as");
    let output = dir.path().join("blink.ino");

    fs::write(&input, BLINK).unwrap();
    assert!(compile_file(&input, None));
    let previous = fs::read_to_string(&output).unwrap();

    fs::write(&input, "цикл:\n  x = )\nконец").unwrap();
    assert!(!compile_file(&input, None));

    assert_eq!(fs::read_to_string(&output).unwrap(), previous);
    assert_eq!(entries(dir.path()), 2);
}

#[test]
fn missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(!compile_file(&dir.path().join("nothing.as"), None));
    assert_eq!(entries(dir.path()), 0);
}

fn entries(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}
