//! End-to-end tests for the console
//!
//! Every test drives the public `Console` API with an explicit clock, so
//! nothing here sleeps.

use std::time::Duration;

use mochi_console::core::{ColorToken, ScrollDirection};
use mochi_console::input::{
    CommandHistory, HistoryEntry, KeyValueStore, LineState, MemoryStore, StoreError,
    HISTORY_BACKUP_KEY,
};
use mochi_console::intro::{IntroPhase, BANNER};
use mochi_console::renderer::{FrameRecorder, SoftwareRenderer};
use mochi_console::{Console, ConsoleConfig, Key, LogArg, LogLevel};
use serde_json::json;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Ten columns by four rows, intro skipped
fn small_config() -> ConsoleConfig {
    ConsoleConfig {
        canvas_width: 120,
        canvas_height: 120,
        skip_intro_animation: true,
        capture_panics: false,
        ..Default::default()
    }
}

fn keyboard_config() -> ConsoleConfig {
    ConsoleConfig {
        keyboard_events_input: true,
        canvas_width: 1080,
        ..small_config()
    }
}

fn started(config: ConsoleConfig) -> Console {
    let mut console = Console::new(config).unwrap();
    console.tick(ms(0));
    console
}

fn type_line(console: &mut Console, text: &str) {
    for c in text.chars() {
        console.handle_key(Key::Char(c));
    }
    console.handle_key(Key::Enter);
}

fn line_texts(console: &Console) -> Vec<String> {
    console.engine().lines().map(|l| l.text.clone()).collect()
}

#[test]
fn test_wrap_at_ten_columns() {
    let mut console = started(small_config());
    console.log(LogLevel::Log, vec!["abcdefghijkl".into()]);
    assert_eq!(line_texts(&console), vec!["abcdefghij", "kl"]);
}

#[test]
fn test_styled_log_fragments_share_a_row() {
    let mut console = started(ConsoleConfig {
        canvas_width: 1080,
        ..small_config()
    });
    console.log(
        LogLevel::Log,
        vec!["%cred%cblue".into(), "color: red".into(), "color: blue".into()],
    );

    let snapshot = console.snapshot();
    assert_eq!(snapshot.view.len(), 1);
    let fragments = &snapshot.view[0].fragments;
    assert_eq!(fragments.len(), 2);
    assert_eq!((fragments[0].text.as_str(), fragments[0].color), ("red", ColorToken::RED));
    assert_eq!(
        (fragments[1].text.as_str(), fragments[1].color),
        ("blue", ColorToken::Rgb(0, 0, 255))
    );

    let lines: Vec<bool> = console
        .engine()
        .lines()
        .map(|l| l.continues_prior_line)
        .collect();
    assert_eq!(lines, vec![false, true]);
}

#[test]
fn test_structured_arguments() {
    let mut console = started(ConsoleConfig {
        canvas_width: 1080,
        ..small_config()
    });
    console.log(LogLevel::Log, vec!["count".into(), json!(3).into()]);
    console.log(
        LogLevel::Log,
        vec![LogArg::unserializable(vec!["parent".into()], "cycle")],
    );
    assert_eq!(
        line_texts(&console),
        vec!["count 3", "<could not stringify> {parent}"]
    );
}

#[test]
fn test_error_stack_hidden_unless_enabled() {
    let mut console = started(ConsoleConfig {
        canvas_width: 1080,
        ..small_config()
    });
    console.log(LogLevel::Error, vec!["boom".into()]);
    assert_eq!(console.engine().raw_len(), 2);
    assert_eq!(line_texts(&console), vec!["boom"]);

    let shown = ConsoleConfig {
        show_stack_traces: true,
        ..console.config().clone()
    };
    console.update_config(shown).unwrap();
    assert!(console.engine().line_count() > 1);
    assert!(console.engine().lines().skip(1).all(|l| l.color == ColorToken::RED));
}

#[test]
fn test_two_plus_two() {
    let mut console = started(keyboard_config());
    type_line(&mut console, "2+2");

    let last = console.engine().lines().last().unwrap();
    assert_eq!(last.text, "4");
    assert_eq!(last.color, console.config().return_color);
}

#[test]
fn test_syntax_error_does_not_break_later_commands() {
    let mut console = started(keyboard_config());
    type_line(&mut console, "2 +");
    let error = console.engine().lines().last().unwrap().clone();
    assert!(error.text.starts_with("SyntaxError"), "{}", error.text);
    assert_eq!(error.color, console.config().error_color);

    type_line(&mut console, "let x = 20");
    type_line(&mut console, "x * 2 + 2");
    assert_eq!(console.engine().lines().last().unwrap().text, "42");
}

#[test]
fn test_runtime_error_is_reported() {
    let mut console = started(keyboard_config());
    type_line(&mut console, "nope");
    let last = console.engine().lines().last().unwrap();
    assert!(last.text.starts_with("ReferenceError"), "{}", last.text);
}

#[test]
fn test_history_up_down_restores_empty_buffer() {
    let mut history = CommandHistory::new();
    history.push(HistoryEntry {
        text: "ls".to_string(),
        color: ColorToken::Default,
    });
    let mut console = Console::with_history(keyboard_config(), history).unwrap();
    console.tick(ms(0));

    console.handle_key(Key::Up);
    assert_eq!(console.command_line().text(), "ls");
    assert_eq!(console.command_line().state(), LineState::HistoryBrowsing);

    console.handle_key(Key::Down);
    assert_eq!(console.command_line().text(), "");
    assert_eq!(console.command_line().state(), LineState::Idle);
    assert_eq!(console.command_line().history().len(), 1);
}

#[test]
fn test_repeated_command_not_duplicated() {
    let mut console = started(keyboard_config());
    type_line(&mut console, "1");
    type_line(&mut console, "1");
    type_line(&mut console, "2");
    let texts: Vec<&str> = console
        .command_line()
        .history()
        .iter()
        .map(|e| e.text.as_str())
        .collect();
    assert_eq!(texts, vec!["1", "2"]);
}

#[test]
fn test_history_survives_restart() {
    let store = MemoryStore::new();
    {
        let mut console =
            Console::with_history_store(keyboard_config(), Box::new(store.clone())).unwrap();
        console.tick(ms(0));
        type_line(&mut console, "1 + 1");
    }

    let backup = store.get(HISTORY_BACKUP_KEY).unwrap().unwrap();
    assert!(backup.contains("1 + 1"));

    let mut console = Console::with_history_store(keyboard_config(), Box::new(store)).unwrap();
    console.tick(ms(0));
    console.handle_key(Key::Up);
    assert_eq!(console.command_line().text(), "1 + 1");
}

#[test]
fn test_corrupt_history_backup_is_an_error() {
    let mut store = MemoryStore::new();
    store.set(HISTORY_BACKUP_KEY, "not json").unwrap();
    assert!(Console::with_history_store(keyboard_config(), Box::new(store)).is_err());
}

#[test]
fn test_scroll_bounds() {
    let mut console = started(small_config());
    for i in 0..10 {
        console.log(LogLevel::Log, vec![format!("line {}", i).into()]);
    }
    // 10 rows, 4 visible
    assert!(!console.scroll(ScrollDirection::Down));
    for _ in 0..6 {
        assert!(console.scroll(ScrollDirection::Up));
    }
    assert!(!console.scroll(ScrollDirection::Up));
    assert_eq!(console.scroll_offset(), 6);
    assert_eq!(
        console.snapshot().to_text(),
        "line 0\nline 1\nline 2\nline 3"
    );

    console.scroll(ScrollDirection::Down);
    assert_eq!(console.scroll_offset(), 5);
}

#[test]
fn test_scroll_counts_command_rows() {
    let mut console = started(ConsoleConfig {
        keyboard_events_input: true,
        ..small_config()
    });
    for i in 0..4 {
        console.log(LogLevel::Log, vec![format!("{}", i).into()]);
    }
    // 4 history rows + 1 prompt row
    assert_eq!(console.total_rows(), 5);
    assert!(console.scroll(ScrollDirection::Up));
    assert!(!console.scroll(ScrollDirection::Up));

    // Typing returns to the live bottom
    console.handle_key(Key::Char('a'));
    assert_eq!(console.scroll_offset(), 0);
    assert_eq!(console.snapshot().view.last().unwrap().text(), "> a");
}

#[test]
fn test_intro_buffers_logs_until_done() {
    let mut console = Console::new(ConsoleConfig {
        capture_panics: false,
        ..Default::default()
    })
    .unwrap();

    console.log(LogLevel::Log, vec!["first".into()]);
    console.tick(ms(0));
    assert_eq!(console.intro_phase(), IntroPhase::Playing);
    console.log(LogLevel::Warn, vec!["second".into()]);
    assert_eq!(console.engine().raw_len(), 1);
    assert_eq!(line_texts(&console), vec![BANNER[0]]);

    console.tick(ms(10_000));
    assert!(console.is_ready());
    assert_eq!(line_texts(&console), vec!["first", "second"]);
    assert_eq!(console.engine().line(1).unwrap().color, ColorToken::YELLOW);
}

#[test]
fn test_keep_logo_keeps_banner() {
    let mut console = Console::new(ConsoleConfig {
        keep_logo: true,
        capture_panics: false,
        ..Default::default()
    })
    .unwrap();
    console.tick(ms(0));
    console.tick(ms(10_000));
    assert_eq!(console.engine().raw_len(), BANNER.len());
}

#[test]
fn test_intro_shrinks_font_on_narrow_canvas() {
    let mut console = Console::new(ConsoleConfig {
        canvas_width: 200,
        capture_panics: false,
        ..Default::default()
    })
    .unwrap();
    let original = console.metrics().font_size;

    console.tick(ms(0));
    assert!(console.metrics().font_size < original);
    let widest = BANNER.iter().map(|l| l.chars().count()).max().unwrap();
    assert!(console.metrics().max_line_width_chars >= widest);

    console.tick(ms(10_000));
    assert_eq!(console.metrics().font_size, original);
}

#[test]
fn test_keys_ignored_during_intro() {
    let mut console = Console::new(ConsoleConfig {
        keyboard_events_input: true,
        capture_panics: false,
        ..Default::default()
    })
    .unwrap();
    console.tick(ms(0));
    assert!(!console.handle_key(Key::Char('a')));
}

#[test]
fn test_history_limit_evicts_oldest() {
    let mut console = started(ConsoleConfig {
        history: 3,
        ..small_config()
    });
    for i in 0..5 {
        console.log(LogLevel::Log, vec![format!("entry {}", i).into()]);
    }
    let raw: Vec<&str> = console
        .engine()
        .raw_entries()
        .map(|e| e.text.as_str())
        .collect();
    assert_eq!(raw, vec!["entry 2", "entry 3", "entry 4"]);
    assert_eq!(console.engine().line_count(), 3);
}

#[test]
fn test_snapshot_is_deterministic() {
    let run = || {
        let mut console = started(keyboard_config());
        console.log(LogLevel::Log, vec!["hello".into()]);
        type_line(&mut console, r#""a" + "b""#);
        console.snapshot()
    };
    let a = run();
    let b = run();
    assert_eq!(a, b);
    assert!(a.to_text().lines().any(|line| line == "ab"));
}

#[test]
fn test_software_renderer_draws_console() {
    let mut console = started(small_config());
    console.log(LogLevel::Log, vec!["x".into()]);

    let mut recorder = FrameRecorder::default();
    console.redraw(&mut recorder);
    let frame = &recorder.frames[0];
    assert_eq!((frame.width, frame.height), (120, 120));
    assert_eq!(frame.runs.len(), 1);

    let mut renderer = SoftwareRenderer::new(1, 1);
    console.redraw(&mut renderer);
    assert_eq!(renderer.surface().dimensions(), (120, 120));
    let run = &frame.runs[0];
    let px = renderer
        .surface()
        .pixel(
            (run.x + frame.metrics.char_width_px / 2.0) as u32,
            (run.y + frame.metrics.line_height_px / 2.0) as u32,
        )
        .unwrap();
    // Default entries take the configured text color
    assert_eq!(&px[..3], &[0, 128, 0]);
}

#[test]
fn test_javascript_builtins_evaluate() {
    let mut console = started(keyboard_config());
    type_line(&mut console, r#""abc".toUpperCase()"#);
    assert_eq!(console.engine().lines().last().unwrap().text, "ABC");

    type_line(&mut console, "const add = (a, b) => a + b");
    type_line(&mut console, "add(40, 2)");
    assert_eq!(console.engine().lines().last().unwrap().text, "42");

    type_line(&mut console, "throw new TypeError('bad')");
    let last = console.engine().lines().last().unwrap();
    assert_eq!(last.text, "TypeError: bad");
    assert_eq!(last.color, console.config().error_color);
}

#[test]
fn test_oversized_font_is_rejected() {
    let config = ConsoleConfig {
        font_size: 1e9,
        ..small_config()
    };
    assert!(Console::new(config).is_err());

    let mut console = started(small_config());
    let huge = ConsoleConfig {
        font_size: 1e9,
        ..console.config().clone()
    };
    assert!(console.update_config(huge).is_err());
    console.tick(ms(10));
    assert!(console.is_ready());
}

#[test]
fn test_wide_text_keeps_fragment_columns() {
    let mut console = started(ConsoleConfig {
        canvas_width: 1080,
        ..small_config()
    });
    console.log(
        LogLevel::Log,
        vec!["%c你好%cx".into(), "color: red".into(), "color: blue".into()],
    );

    let mut recorder = FrameRecorder::default();
    console.redraw(&mut recorder);
    let frame = &recorder.frames[0];
    let cols: Vec<usize> = frame.runs.iter().map(|r| r.col).collect();
    assert_eq!(cols, vec![0, 2]);

    let mut renderer = SoftwareRenderer::new(1, 1);
    console.redraw(&mut renderer);
    let m = &frame.metrics;
    let rgb_at = |col: usize| {
        let (x, y) = m.cell_origin(col, frame.runs[0].row);
        let px = renderer
            .surface()
            .pixel((x + m.char_width_px / 2.0) as u32, (y + m.line_height_px / 2.0) as u32)
            .unwrap();
        [px[0], px[1], px[2]]
    };
    assert_eq!(rgb_at(1), [255, 0, 0]);
    assert_eq!(rgb_at(2), [0, 0, 255]);
}

/// Store whose writes always fail
struct ReadOnlyStore;

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn set(&mut self, key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::InvalidKey(key.to_string()))
    }

    fn remove(&mut self, _key: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

#[test]
fn test_console_diagnostics_stay_out_of_history() {
    use tracing_subscriber::layer::SubscriberExt;

    let mut console =
        Console::with_history_store(keyboard_config(), Box::new(ReadOnlyStore)).unwrap();
    let subscriber = tracing_subscriber::registry().with(console.capture_handle().layer());

    tracing::subscriber::with_default(subscriber, || {
        console.tick(ms(0));
        // The failed history backup warns from inside the crate
        type_line(&mut console, "1");
        tracing::warn!(target: "host", "from host");
        console.tick(ms(1));
    });

    let texts = line_texts(&console);
    assert!(texts.iter().any(|t| t == "from host"), "{:?}", texts);
    assert!(!texts.iter().any(|t| t.contains("back up")), "{:?}", texts);
}
