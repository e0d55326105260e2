use kuching::domain::TaskStatus;

#[test]
fn given_status_strings_when_parsed_then_round_trip() {
    for (text, status) in [
        ("todo", TaskStatus::Todo),
        ("in_progress", TaskStatus::InProgress),
        ("review", TaskStatus::Review),
        ("done", TaskStatus::Done),
        ("canceled", TaskStatus::Canceled),
    ] {
        let parsed: TaskStatus = text.parse().unwrap();
        assert_eq!(parsed, status);
        assert_eq!(status.as_str(), text);
    }
}

#[test]
fn given_terminal_statuses_when_checked_then_only_done_and_canceled() {
    assert!(TaskStatus::Done.is_terminal());
    assert!(TaskStatus::Canceled.is_terminal());
    assert!(!TaskStatus::Todo.is_terminal());
    assert!(!TaskStatus::InProgress.is_terminal());
    assert!(!TaskStatus::Review.is_terminal());
}
