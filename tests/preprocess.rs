use std::fs;
use std::path::Path;

use pypp::{Config, PreprocessError, Token, TokenKind, expand, preprocess, tokenize};

fn config_for(dir: &Path) -> Config {
    Config::with_roots([dir])
}

#[test]
fn test_plain_source_is_unchanged() {
    let src = "def f(a):\n    return a + 1\n";
    let tokens = tokenize(src).unwrap();
    let result = expand(tokens.clone(), &Config::new()).unwrap();
    assert_eq!(result.tokens, tokens);
    assert!(result.definitions.is_empty());
}

#[test]
fn test_keyword_alias() {
    let src = "!define unless if not\nunless x:\n    pass\n";
    let processed = preprocess(src, &Config::new()).unwrap();
    assert_eq!(processed.source, "\nif not x :\n    pass \n");
}

#[test]
fn test_synthetic_block() {
    let src = "!define `do_twice` for _ in range(2): ?NEWLINE ?INDENT\ndo_twice print(1)\n";
    let processed = preprocess(src, &Config::new()).unwrap();
    assert_eq!(processed.source, "\nfor _ in range (2 ):\n  print (1 )\n");
}

#[test]
fn test_include_splices_tokens_and_definitions() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("defs.py"), "!define Y 42\na = 1\n").unwrap();

    let src = "x = 0\n!include defs.py\nprint(Y)\n";
    let processed = preprocess(src, &config_for(dir.path())).unwrap();

    assert_eq!(processed.source, "x =0 \n\na =1 \n\nprint (42 )\n");
    assert_eq!(processed.definitions.len(), 1);
    // the included ENDMARKER is dropped, the including one survives
    let end_markers = processed
        .tokens
        .iter()
        .filter(|t| t.kind == TokenKind::EndMarker)
        .count();
    assert_eq!(end_markers, 1);
}

#[test]
fn test_include_macro_not_visible_before_inclusion() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("defs.py"), "!define Y 42\n").unwrap();

    let src = "print(Y)\n!include 'defs.py'\nprint(Y)\n";
    let processed = preprocess(src, &config_for(dir.path())).unwrap();
    assert_eq!(processed.source, "print (Y )\n\n\nprint (42 )\n");
}

#[test]
fn test_nested_includes_merge_in_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("lib")).unwrap();
    fs::write(dir.path().join("lib/inner.py"), "!define Z 7\n").unwrap();
    fs::write(
        dir.path().join("outer.py"),
        "!include \"lib/inner.py\"\n!define W Z Z\n",
    )
    .unwrap();

    let src = "!include outer.py\nW\n";
    let processed = preprocess(src, &config_for(dir.path())).unwrap();

    let names: Vec<String> = processed
        .definitions
        .iter()
        .map(|d| d.name_text())
        .collect();
    assert_eq!(names, vec!["Z", "W"]);
    // W expands to Z Z, which expands again
    let numbers: Vec<&Token> = processed
        .tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Number)
        .collect();
    assert_eq!(numbers, vec![&Token::number("7"), &Token::number("7")]);
}

#[test]
fn test_include_searches_roots_in_order() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    fs::write(second.path().join("only_here.py"), "!define V 1\n").unwrap();

    let config = Config::with_roots([first.path(), second.path()]);
    let processed = preprocess("!include only_here.py\nV\n", &config).unwrap();
    assert!(processed.tokens.contains(&Token::number("1")));
}

#[test]
fn test_unresolvable_include_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = preprocess("!include missing.py\nx\n", &config_for(dir.path())).unwrap_err();
    match err {
        PreprocessError::IncludeResolution { reference, roots } => {
            assert_eq!(reference, "missing.py");
            assert_eq!(roots, vec![dir.path().to_path_buf()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_include_cycle_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.py"), "!include b.py\n").unwrap();
    fs::write(dir.path().join("b.py"), "!include a.py\n").unwrap();

    let err = preprocess("!include a.py\n", &config_for(dir.path())).unwrap_err();
    assert!(matches!(err, PreprocessError::InInclude { .. }));
    assert!(matches!(
        err.root_cause(),
        PreprocessError::IncludeCycle { .. }
    ));
}

#[test]
fn test_error_in_included_file_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bad.py"), "!define `A B C\n").unwrap();

    let err = preprocess("!include bad.py\n", &config_for(dir.path())).unwrap_err();
    match &err {
        PreprocessError::InInclude { path, source } => {
            assert!(path.ends_with("bad.py"));
            assert!(matches!(**source, PreprocessError::DefinitionSyntax { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_debug_report_does_not_change_output() {
    let src = "!define X 1\ny = X\n";
    let plain = preprocess(src, &Config::new()).unwrap();
    let debug = preprocess(src, &Config::new().with_debug(true)).unwrap();

    assert!(plain.report.is_none());
    assert_eq!(plain.tokens, debug.tokens);
    assert_eq!(plain.source, debug.source);

    let report = debug.report.unwrap();
    assert!(report.contains(" BEGIN PYPP MACROS "));
    assert!(report.contains("X [NAME] => 1 [NUMBER]"));
    assert!(report.contains(&debug.source));
}

#[test]
fn test_coding_marker_is_removed() {
    let src = "# -*- coding: pypp -*-\n!define X 1\nX\n";
    let processed = preprocess(src, &Config::new()).unwrap();
    assert!(!processed.source.contains("coding"));
    assert_eq!(processed.source, "\n1 \n");
}

#[test]
fn test_directive_line_break_survives_newline_macro() {
    let processed = preprocess("!define ?NEWLINE ;\nx\n", &Config::new()).unwrap();
    assert_eq!(
        processed.tokens,
        vec![
            Token::new(TokenKind::Newline, "\n"),
            Token::name("x"),
            Token::op(";"),
            Token::new(TokenKind::EndMarker, ""),
        ]
    );
}

#[test]
fn test_include_current_dir_is_unresolvable() {
    let dir = tempfile::tempdir().unwrap();
    let err = preprocess("!include .\n", &config_for(dir.path())).unwrap_err();
    assert!(matches!(err, PreprocessError::IncludeResolution { .. }));
}

#[test]
fn test_unreadable_include_fails_with_io_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("pkg")).unwrap();

    let err = preprocess("!include pkg\n", &config_for(dir.path())).unwrap_err();
    match err {
        PreprocessError::Io { path, .. } => assert!(path.ends_with("pkg")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_dedent_from_macro_without_open_block() {
    let err = preprocess("!define close ?DEDENT\nclose\n", &Config::new()).unwrap_err();
    assert!(matches!(err, PreprocessError::MalformedIndentation));
}
