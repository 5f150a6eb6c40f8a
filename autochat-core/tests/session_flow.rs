use autochat_core::{
    ChatTranscript, ChatView, HistoryView, LocalStorage, MemoryStorage, Message, SelectOutcome,
    Sender, SessionStore, SidebarState,
};
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_fresh_storage_end_to_end() {
    let storage = Arc::new(MemoryStorage::new());
    let store = SessionStore::new(storage.clone());

    store.initialize_session().unwrap();
    assert_eq!(storage.raw().unwrap(), "[[]]");

    store
        .append_message(Message {
            text: "hi".to_string(),
            sender: Sender::User,
            is_image: false,
        })
        .unwrap();
    assert_eq!(
        storage.raw().unwrap(),
        r#"[[{"text":"hi","sender":"user","isImage":false}]]"#
    );

    let summaries = store.list_session_summaries();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].index, 0);
    assert_eq!(summaries[0].preview, "hi...");

    let session = store.get_session(0).unwrap();
    assert_eq!(session.messages(), &[Message::user("hi")]);
    assert!(store.get_session(5).is_none());
}

#[test]
fn test_malformed_storage_recovers_on_next_write() {
    let storage = Arc::new(MemoryStorage::with_raw("{not valid"));
    let store = SessionStore::new(storage.clone());

    assert!(store.list_session_summaries().is_empty());
    store.initialize_session().unwrap();
    assert_eq!(storage.raw().unwrap(), "[[]]");
}

#[test]
fn test_chat_then_browse_history_on_disk() {
    let temp_dir = TempDir::new().unwrap();

    // First visit: a short conversation.
    {
        let store = SessionStore::new(Arc::new(LocalStorage::in_dir(temp_dir.path())));
        store.initialize_session().unwrap();
        let mut chat = ChatView::new(store, ChatTranscript::new());
        chat.append_to_transcript("Hello!", Sender::Bot, false, false).unwrap();
        chat.append_to_transcript("What does the ABS light mean?", Sender::User, false, true)
            .unwrap();
        chat.append_to_transcript("It signals an **ABS fault**.", Sender::Bot, false, true)
            .unwrap();
    }

    // Second visit: open the sidebar and go back to the first conversation.
    let store = SessionStore::new(Arc::new(LocalStorage::in_dir(temp_dir.path())));
    store.initialize_session().unwrap();
    let before = store.sessions();

    let mut chat = ChatView::new(store.clone(), ChatTranscript::new());
    chat.append_to_transcript("Hello!", Sender::Bot, false, false).unwrap();

    let mut history = HistoryView::new(store.clone());
    assert_eq!(history.toggle_sidebar(), SidebarState::Expanded);
    assert_eq!(history.entries().len(), 1);
    assert_eq!(
        history.entries()[0].label(),
        "Session 1: What does the ABS light mean?..."
    );

    let outcome = history.activate(0, chat.transcript_mut()).unwrap();
    assert_eq!(outcome, SelectOutcome::Loaded { index: 0, messages: 2 });
    assert_eq!(chat.transcript().len(), 2);
    assert_eq!(chat.transcript().messages()[0].sender, Sender::User);

    assert_eq!(store.sessions(), before);
    assert_eq!(store.sessions().len(), 2);
}
