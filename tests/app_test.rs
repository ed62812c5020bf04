use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use lotedit::persist::SavedEdits;
use lotedit::{
    App, AppEvent, BorderToken, Drain, InputMode, Inventory, JsonFileSink, MemorySink,
    StartOptions, Theme,
};
use std::sync::mpsc::{channel, Receiver, Sender};
use tempfile::TempDir;

fn sample_app() -> (App, Receiver<AppEvent>) {
    let (tx, rx) = channel();
    let mut app = App::new(tx).with_sink(Box::new(MemorySink::default()));
    app.load(Inventory::sample());
    (app, rx)
}

fn press(app: &mut App, code: KeyCode) -> Option<AppEvent> {
    app.event(&AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        press(app, KeyCode::Char(c));
    }
}

/// Deliver events the editors queued, as the main loop would
fn pump(app: &mut App, rx: &Receiver<AppEvent>) {
    while let Ok(event) = rx.try_recv() {
        if let Some(follow_up) = app.event(&event) {
            app.event(&follow_up);
        }
    }
}

/// Replace the selected row's mileage with `text` and press Enter
fn edit_selected(app: &mut App, rx: &Receiver<AppEvent>, text: &str) {
    press(app, KeyCode::Char('e'));
    for _ in 0..app.selected_editor().map(|e| e.text().len()).unwrap_or(0) {
        press(app, KeyCode::Backspace);
    }
    type_text(app, text);
    press(app, KeyCode::Enter);
    press(app, KeyCode::Esc);
    pump(app, rx);
}

#[test]
fn test_commit_records_edit_and_marks_editor() {
    let (mut app, rx) = sample_app();
    edit_selected(&mut app, &rx, "12345");

    assert_eq!(app.tracker().edited(0), Some(12345.0));
    assert_eq!(app.tracker().edited_count(), 1);
    let editor = app.selected_editor().unwrap();
    assert_eq!(editor.border(), BorderToken::Edited);
    assert_eq!(editor.current_value(), 12345.0);
    assert_eq!(app.input_mode, InputMode::Normal);
}

#[test]
fn test_later_commit_replaces_earlier() {
    let (mut app, rx) = sample_app();
    edit_selected(&mut app, &rx, "100");
    edit_selected(&mut app, &rx, "250");
    assert_eq!(app.tracker().edited(0), Some(250.0));
    assert_eq!(app.tracker().edited_count(), 1);
}

#[test]
fn test_letters_are_rolled_back() {
    let (mut app, rx) = sample_app();
    press(&mut app, KeyCode::Char('e'));
    press(&mut app, KeyCode::Backspace);
    type_text(&mut app, "42");
    press(&mut app, KeyCode::Char('x'));

    let editor = app.selected_editor().unwrap();
    assert!(editor.has_error());
    assert!(!editor.text().contains('x'));
    pump(&mut app, &rx);
    assert_eq!(app.tracker().edited_count(), 0);
}

#[test]
fn test_touch_counts() {
    let (mut app, _rx) = sample_app();
    press(&mut app, KeyCode::Char(' '));
    assert_eq!(app.tracker().touches(0), Some(0));
    press(&mut app, KeyCode::Char(' '));
    press(&mut app, KeyCode::Char(' '));
    assert_eq!(app.tracker().touches(0), Some(2));

    press(&mut app, KeyCode::Char('j'));
    assert_eq!(app.tracker().touches(1), None);
    press(&mut app, KeyCode::Char('e'));
    assert_eq!(app.tracker().touches(1), Some(0));
    assert_eq!(app.tracker().touched_count(), 2);
}

#[test]
fn test_page_change_keeps_edits_and_resets_borders() {
    let (mut app, rx) = sample_app();
    edit_selected(&mut app, &rx, "777");
    assert_eq!(app.selected_editor().unwrap().border(), BorderToken::Edited);

    press(&mut app, KeyCode::Char('n'));
    assert_eq!(app.table().page(), 1);
    assert_eq!(app.editors()[0].field_id(), 15);
    assert!(app
        .editors()
        .iter()
        .all(|e| e.border() == BorderToken::Neutral));

    press(&mut app, KeyCode::Char('p'));
    assert_eq!(app.table().page(), 0);
    let editor = app.selected_editor().unwrap();
    assert_eq!(editor.text(), "777");
    assert_eq!(editor.border(), BorderToken::Neutral);
    assert_eq!(app.tracker().edited(0), Some(777.0));
}

#[test]
fn test_cursor_continues_onto_next_page() {
    let (mut app, _rx) = sample_app();
    for _ in 0..15 {
        press(&mut app, KeyCode::Down);
    }
    assert_eq!(app.table().page(), 1);
    assert_eq!(app.table().selected_row().unwrap().carid, 15);
    assert_eq!(app.editors()[0].field_id(), 15);

    press(&mut app, KeyCode::Up);
    assert_eq!(app.table().page(), 0);
    assert_eq!(app.table().selected_row().unwrap().carid, 14);
}

#[test]
fn test_sort_resets_to_first_page() {
    let (mut app, _rx) = sample_app();
    press(&mut app, KeyCode::Char('n'));
    press(&mut app, KeyCode::Char('s'));
    assert_eq!(app.table().page(), 0);
    assert!(app.table().sort_state().is_some());

    let years: Vec<u16> = app.table().page_rows().iter().map(|c| c.year).collect();
    assert!(years.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_save_writes_edits_in_row_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("edits.json");
    let (tx, rx) = channel();
    let mut app = App::new(tx).with_sink(Box::new(JsonFileSink::new(&path)));
    app.load(Inventory::sample());

    press(&mut app, KeyCode::Char('j'));
    press(&mut app, KeyCode::Char('j'));
    edit_selected(&mut app, &rx, "900");
    press(&mut app, KeyCode::Char('k'));
    edit_selected(&mut app, &rx, "800");

    let save = press(&mut app, KeyCode::Char('w'));
    assert!(matches!(save, Some(AppEvent::Save)));
    app.event(&AppEvent::Save);

    let saved = SavedEdits::read(&path).unwrap();
    let pairs: Vec<(i64, f64)> = saved.edits.iter().map(|e| (e.row_id, e.value)).collect();
    assert_eq!(pairs, vec![(1, 800.0), (2, 900.0)]);
    assert!(app.status().unwrap().starts_with("Saved 2 edits to "));
    // saving does not clear the edit set
    assert_eq!(app.tracker().edited_count(), 2);
}

#[test]
fn test_log_only_save_goes_to_log() {
    let (tx, rx) = channel();
    let opts = StartOptions {
        log_only: true,
        ..StartOptions::default()
    };
    let mut app = App::new_with_config(tx, Theme::default(), &opts);
    app.load(Inventory::sample());
    edit_selected(&mut app, &rx, "321");

    app.event(&AppEvent::Save);
    assert_eq!(app.status(), Some("Logged 1 edit"));
}

fn send_key(tx: &Sender<AppEvent>, code: KeyCode) {
    tx.send(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
        .unwrap();
}

#[test]
fn test_drain_records_commit_before_next_key() {
    let (tx, rx) = channel();
    let mut app = App::new(tx.clone()).with_sink(Box::new(MemorySink::default()));
    app.load(Inventory::sample());

    for code in [
        KeyCode::Char('e'),
        KeyCode::Backspace,
        KeyCode::Char('5'),
        KeyCode::Enter,
        KeyCode::Esc,
    ] {
        send_key(&tx, code);
    }
    assert_eq!(app.drain_events(&rx).unwrap(), Drain::Updated);
    // the Enter's edit was handled in the same pass
    assert_eq!(app.tracker().edited(0), Some(5.0));
    assert!(rx.try_recv().is_err());

    // rebuilding the page right after shows the committed value
    send_key(&tx, KeyCode::Char('r'));
    send_key(&tx, KeyCode::Char('r'));
    app.drain_events(&rx).unwrap();
    assert_eq!(app.selected_editor().unwrap().text(), "5");
}

#[test]
fn test_drain_reports_idle_and_exit() {
    let (tx, rx) = channel();
    let mut app = App::new(tx.clone()).with_sink(Box::new(MemorySink::default()));
    assert_eq!(app.drain_events(&rx).unwrap(), Drain::Idle);

    send_key(&tx, KeyCode::Char('q'));
    assert_eq!(app.drain_events(&rx).unwrap(), Drain::Exit);

    tx.send(AppEvent::Crash("boom".to_string())).unwrap();
    assert!(app.drain_events(&rx).is_err());
}
