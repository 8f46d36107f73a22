use keyboard_core::persistence::MemoryStore;
use keyboard_core::providers::EmptyBootstrap;
use keyboard_core::{EngineConfig, FileStore, GesturePath, ImeEngine, KeyboardLayout, PersistencePort};
use std::sync::Arc;

fn file_engine(dir: &std::path::Path) -> ImeEngine {
    ImeEngine::builder()
        .storage(Arc::new(FileStore::open(dir).unwrap()))
        .build()
        .unwrap()
}

#[test]
fn learning_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut engine = file_engine(dir.path());
        engine.learn_sentence("the quokka smiled at the camera");
        engine.add_to_user_dictionary("Quokkas");
        for _ in 0..4 {
            engine.learn_word("quokka");
        }
    }

    let engine = file_engine(dir.path());
    assert!(engine.is_in_user_dictionary("quokkas"));
    assert!(engine.word_index().contains("quokka"));
    assert!(engine.word_index().frequency_of("quokka") >= 5);
    assert_eq!(engine.context_model().frequency("quokka", "smiled"), 1);

    let suggestions = engine.get_suggestions(Some("quo"), None);
    assert_eq!(suggestions[0], "quokkas");
    assert!(suggestions.contains(&"quokka".to_string()));
}

#[test]
fn removal_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut engine = file_engine(dir.path());
        engine.add_to_user_dictionary("zorblax");
        engine.remove_word("zorblax");
    }
    let engine = file_engine(dir.path());
    assert!(!engine.is_in_user_dictionary("zorblax"));
    assert!(!engine.word_index().contains("zorblax"));
}

#[test]
fn first_run_keeps_bootstrap_context() {
    let dir = tempfile::tempdir().unwrap();
    let engine = file_engine(dir.path());
    assert!(engine.get_suggestions(None, Some("nice to meet")).contains(&"you".to_string()));
}

#[test]
fn context_prediction_after_learning() {
    let mut engine = ImeEngine::builder()
        .storage(Arc::new(MemoryStore::new()))
        .bootstrap(EmptyBootstrap)
        .build()
        .unwrap();
    engine.learn_from_input("how are you today");
    engine.learn_from_input("how are you doing");
    assert!(engine.context_model().predict_next("how are").contains(&"you".to_string()));
}

#[test]
fn punctuation_hints() {
    let engine = ImeEngine::builder()
        .storage(Arc::new(MemoryStore::new()))
        .build()
        .unwrap();
    assert!(engine.get_suggestions(None, Some("what time is it")).contains(&"?".to_string()));
    let model = engine.context_model();
    assert_eq!(model.suggest_punctuation("this is a very long sentence without end")[0], ".");
}

#[test]
fn suggestions_are_deterministic() {
    let engine = ImeEngine::builder()
        .storage(Arc::new(MemoryStore::new()))
        .build()
        .unwrap();
    let first = engine.get_suggestions(Some("th"), Some("I am going to"));
    for _ in 0..5 {
        assert_eq!(engine.get_suggestions(Some("th"), Some("I am going to")), first);
    }
}

#[test]
fn input_learning_is_batched_and_flushed_on_drop() {
    let store = Arc::new(MemoryStore::new());
    let port: Arc<dyn PersistencePort> = store.clone();
    {
        let mut engine = ImeEngine::builder().storage(port).build().unwrap();
        engine.learn_from_input("hello there");
        engine.learn_from_input("hello again");
    }
    assert_eq!(store.write_count(), 1);
    let words = store.load_word_entries().unwrap();
    assert!(words.iter().any(|e| e.text == "again"));
}

#[test]
fn swiped_word_is_decoded() {
    let layout = KeyboardLayout::default();
    let mut path = GesturePath::starting_at(0);
    for (i, key) in "tesy".chars().enumerate() {
        let pos = layout.position(key).unwrap();
        path.add_point_at(pos.x, pos.y, i as u64 * 20);
        path.add_point_at(pos.x + 1.0, pos.y + 1.0, i as u64 * 20 + 10);
    }
    path.finish();

    let engine = ImeEngine::builder()
        .storage(Arc::new(MemoryStore::new()))
        .layout(layout)
        .build()
        .unwrap();
    let decoded = engine.decode_gesture(&path, &["test", "zebra"]);
    assert_eq!(decoded.first().map(String::as_str), Some("test"));
}

#[test]
fn config_file_limits_suggestions() {
    let config = EngineConfig::from_toml_str("[suggestions]\nmax_suggestions = 2\n").unwrap();
    let engine = ImeEngine::builder()
        .config(config)
        .storage(Arc::new(MemoryStore::new()))
        .build()
        .unwrap();
    assert_eq!(engine.get_suggestions(Some("w"), None).len(), 2);
}

#[test]
fn committed_word_is_stored_without_punctuation() {
    let mut engine = ImeEngine::builder()
        .storage(Arc::new(MemoryStore::new()))
        .bootstrap(EmptyBootstrap)
        .build()
        .unwrap();
    engine.learn_word("Hello!");
    assert!(engine.word_index().contains("hello"));
    assert!(!engine.word_index().contains("hello!"));
    let suggestions = engine.get_suggestions(Some("hel"), None);
    assert!(suggestions.contains(&"hello".to_string()));
    assert!(!suggestions.contains(&"hello!".to_string()));
}

#[test]
fn very_long_token_does_not_break_suggestions() {
    let mut engine = ImeEngine::builder()
        .storage(Arc::new(MemoryStore::new()))
        .build()
        .unwrap();
    let long = "a".repeat(30_000);
    engine.learn_word(&long);
    assert!(!engine.word_index().contains(&long));
    assert!(!engine.get_suggestions(Some("b"), None).contains(&long));
    assert!(!engine.get_suggestions(Some(&long), None).contains(&long));
}

#[test]
fn punctuation_only_input_is_never_written() {
    let store = Arc::new(MemoryStore::new());
    let port: Arc<dyn PersistencePort> = store.clone();
    {
        let mut engine = ImeEngine::builder().storage(port).build().unwrap();
        engine.learn_sentence("...");
        for _ in 0..10 {
            engine.learn_from_input("?!");
        }
    }
    assert_eq!(store.write_count(), 0);
}
