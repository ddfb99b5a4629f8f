use quill_core::{CommandLog, EditCommand, PieceTable};

#[test]
fn test_execute_undo_is_identity() {
    let commands = [
        EditCommand::insert(2, &b"XY"[..]),
        EditCommand::delete(1, 3),
        EditCommand::composite(vec![
            EditCommand::delete(4, 1),
            EditCommand::insert(4, &b"z"[..]),
        ]),
    ];

    for command in commands {
        let mut doc = PieceTable::from_bytes(&b"abcdef"[..]);
        let mut log = CommandLog::new();

        log.execute(&mut doc, command).unwrap();
        assert!(log.undo(&mut doc).unwrap());
        assert_eq!(doc.to_bytes(), b"abcdef");
    }
}

#[test]
fn test_undo_redo_is_identity() {
    let mut doc = PieceTable::from_bytes(&b"abc"[..]);
    let mut log = CommandLog::new();

    log.execute(&mut doc, EditCommand::insert(3, &b"d"[..])).unwrap();
    log.execute(&mut doc, EditCommand::delete(0, 2)).unwrap();
    let before = doc.to_bytes();

    assert!(log.undo(&mut doc).unwrap());
    assert!(log.redo(&mut doc).unwrap());
    assert_eq!(doc.to_bytes(), before);
}

#[test]
fn test_scenario_insert_insert_undo_undo_redo_redo() {
    let mut doc = PieceTable::from_bytes(&b"abc"[..]);
    let mut log = CommandLog::new();

    log.execute(&mut doc, EditCommand::insert(3, &b"d"[..])).unwrap();
    log.execute(&mut doc, EditCommand::insert(4, &b"e"[..])).unwrap();

    assert!(log.undo(&mut doc).unwrap());
    assert!(log.undo(&mut doc).unwrap());
    assert_eq!(doc.to_bytes(), b"abc");

    assert!(log.redo(&mut doc).unwrap());
    assert!(log.redo(&mut doc).unwrap());
    assert_eq!(doc.to_bytes(), b"abcde");
}

#[test]
fn test_no_redo_after_fresh_execute() {
    let mut doc = PieceTable::new();
    let mut log = CommandLog::new();

    log.execute(&mut doc, EditCommand::insert(0, &b"a"[..])).unwrap();
    assert!(!log.redo(&mut doc).unwrap());
}

#[test]
fn test_execute_discards_undone_suffix() {
    let mut doc = PieceTable::new();
    let mut log = CommandLog::new();

    log.execute(&mut doc, EditCommand::insert(0, &b"a"[..])).unwrap();
    log.execute(&mut doc, EditCommand::insert(1, &b"b"[..])).unwrap();
    log.execute(&mut doc, EditCommand::insert(2, &b"c"[..])).unwrap();

    log.undo(&mut doc).unwrap();
    log.undo(&mut doc).unwrap();
    assert_eq!(log.redo_count(), 2);

    log.execute(&mut doc, EditCommand::insert(1, &b"z"[..])).unwrap();
    assert_eq!(doc.to_bytes(), b"az");
    assert_eq!(log.redo_count(), 0);
    assert!(!log.redo(&mut doc).unwrap());
}

#[test]
fn test_delete_restores_literal_prefix_after_other_edits() {
    // The captured bytes restore exactly, even though a later command
    // changed another region in between.
    let mut doc = PieceTable::from_bytes(&b"alpha beta gamma"[..]);
    let mut log = CommandLog::new();

    log.execute(&mut doc, EditCommand::delete(0, 6)).unwrap();
    assert_eq!(doc.to_bytes(), b"beta gamma");

    log.execute(&mut doc, EditCommand::insert(5, &b"XX "[..])).unwrap();
    assert_eq!(doc.to_bytes(), b"beta XX gamma");

    log.undo(&mut doc).unwrap();
    log.undo(&mut doc).unwrap();
    assert_eq!(doc.to_bytes(), b"alpha beta gamma");
}

#[test]
fn test_history_bound_adjusts_current() {
    let mut doc = PieceTable::new();
    let mut log = CommandLog::with_max_depth(3);

    for i in 0..10u8 {
        let ch = [b'a' + i];
        let len = doc.len();
        log.execute(&mut doc, EditCommand::insert(len, &ch[..])).unwrap();
    }

    assert_eq!(log.undo_count(), 3);
    while log.undo(&mut doc).unwrap() {}
    assert_eq!(doc.to_bytes(), b"abcdefg");
}

#[test]
fn test_idempotent_execute_undo_execute() {
    let mut doc = PieceTable::from_bytes(&b"hello"[..]);
    let mut log = CommandLog::new();

    log.execute(&mut doc, EditCommand::delete(1, 3)).unwrap();
    let after_execute = doc.to_bytes();

    log.undo(&mut doc).unwrap();
    log.redo(&mut doc).unwrap();
    assert_eq!(doc.to_bytes(), after_execute);

    log.undo(&mut doc).unwrap();
    assert_eq!(doc.to_bytes(), b"hello");
}
