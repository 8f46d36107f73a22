// File: src/c_api.rs
//! C entry points for keyboard hosts. Every call goes through an explicit
//! handle from `kb_engine_new`; the host must not use one handle from two
//! threads at once. Strings returned to the host are JSON and must be
//! released with `kb_free_string`.
use crate::config::EngineConfig;
use crate::persistence::FileStore;
use crate::ImeEngine;
use std::ffi::{c_char, CStr, CString};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::ptr;
use std::sync::Arc;
use tracing::{error, info, warn};

unsafe fn str_arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

fn json_out<T: serde::Serialize>(value: &T, fallback: &str) -> *mut c_char {
    let json = serde_json::to_string(value).unwrap_or_else(|_| fallback.to_string());
    CString::new(json).unwrap_or_default().into_raw()
}

fn open_engine(storage_dir: Option<&str>) -> crate::Result<ImeEngine> {
    let config = EngineConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "unreadable config, using defaults");
        EngineConfig::default()
    });
    let dir = storage_dir
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| config.persistence.storage_dir.clone());
    let store = FileStore::open(&dir)?;
    info!(dir = %dir.display(), "opening keyboard engine");
    ImeEngine::builder().config(config).storage(Arc::new(store)).build()
}

/// Opens an engine persisting under `storage_dir`, or the configured
/// directory when null or empty. Returns null on failure.
#[no_mangle]
pub extern "C" fn kb_engine_new(storage_dir: *const c_char) -> *mut ImeEngine {
    let dir = unsafe { str_arg(storage_dir) };
    let result = catch_unwind(|| open_engine(dir));
    match result {
        Ok(Ok(engine)) => Box::into_raw(Box::new(engine)),
        Ok(Err(e)) => {
            error!(error = %e, "failed to open keyboard engine");
            ptr::null_mut()
        }
        Err(_) => {
            error!("panic during keyboard engine initialization");
            ptr::null_mut()
        }
    }
}

/// Writes out pending state and releases the engine.
#[no_mangle]
pub extern "C" fn kb_engine_free(handle: *mut ImeEngine) {
    if handle.is_null() {
        return;
    }
    let engine = unsafe { Box::from_raw(handle) };
    if catch_unwind(AssertUnwindSafe(move || drop(engine))).is_err() {
        error!("panic while shutting down keyboard engine");
    }
}

fn with_engine<T>(handle: *mut ImeEngine, fallback: T, f: impl FnOnce(&mut ImeEngine) -> T) -> T {
    let Some(engine) = (unsafe { handle.as_mut() }) else {
        return fallback;
    };
    match catch_unwind(AssertUnwindSafe(|| f(engine))) {
        Ok(value) => value,
        Err(_) => {
            error!("panic inside keyboard engine call");
            fallback
        }
    }
}

/// JSON array of suggestions. Either string may be null.
#[no_mangle]
pub extern "C" fn kb_get_suggestions(
    handle: *mut ImeEngine,
    current_word: *const c_char,
    previous_context: *const c_char,
) -> *mut c_char {
    let current = unsafe { str_arg(current_word) };
    let context = unsafe { str_arg(previous_context) };
    let suggestions = with_engine(handle, Vec::new(), |engine| engine.get_suggestions(current, context));
    json_out(&suggestions, "[]")
}

#[no_mangle]
pub extern "C" fn kb_learn_input(handle: *mut ImeEngine, text: *const c_char) {
    if let Some(text) = unsafe { str_arg(text) } {
        with_engine(handle, (), |engine| engine.learn_from_input(text));
    }
}

#[no_mangle]
pub extern "C" fn kb_learn_word(handle: *mut ImeEngine, word: *const c_char) {
    if let Some(word) = unsafe { str_arg(word) } {
        with_engine(handle, (), |engine| engine.learn_word(word));
    }
}

#[no_mangle]
pub extern "C" fn kb_learn_sentence(handle: *mut ImeEngine, sentence: *const c_char) {
    if let Some(sentence) = unsafe { str_arg(sentence) } {
        with_engine(handle, (), |engine| engine.learn_sentence(sentence));
    }
}

#[no_mangle]
pub extern "C" fn kb_add_user_word(handle: *mut ImeEngine, word: *const c_char) {
    if let Some(word) = unsafe { str_arg(word) } {
        with_engine(handle, (), |engine| engine.add_to_user_dictionary(word));
    }
}

#[no_mangle]
pub extern "C" fn kb_remove_word(handle: *mut ImeEngine, word: *const c_char) {
    if let Some(word) = unsafe { str_arg(word) } {
        with_engine(handle, (), |engine| engine.remove_word(word));
    }
}

#[no_mangle]
pub extern "C" fn kb_is_user_word(handle: *mut ImeEngine, word: *const c_char) -> bool {
    match unsafe { str_arg(word) } {
        Some(word) => with_engine(handle, false, |engine| engine.is_in_user_dictionary(word)),
        None => false,
    }
}

#[no_mangle]
pub extern "C" fn kb_flush(handle: *mut ImeEngine) {
    with_engine(handle, (), ImeEngine::flush);
}

/// JSON object with word and context counts.
#[no_mangle]
pub extern "C" fn kb_engine_stats(handle: *mut ImeEngine) -> *mut c_char {
    match with_engine(handle, None, |engine| Some(engine.stats())) {
        Some(stats) => json_out(&stats, "{}"),
        None => json_out(&serde_json::json!({}), "{}"),
    }
}

#[no_mangle]
pub extern "C" fn kb_free_string(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            drop(CString::from_raw(s));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
        kb_free_string(ptr);
        s
    }

    #[test]
    fn handle_lifecycle_persists_user_words() {
        let dir = tempfile::tempdir().unwrap();
        let dir_arg = CString::new(dir.path().to_str().unwrap()).unwrap();
        let word = CString::new("Ferris").unwrap();

        let handle = kb_engine_new(dir_arg.as_ptr());
        assert!(!handle.is_null());
        kb_add_user_word(handle, word.as_ptr());
        assert!(kb_is_user_word(handle, word.as_ptr()));
        kb_engine_free(handle);

        let handle = kb_engine_new(dir_arg.as_ptr());
        assert!(kb_is_user_word(handle, word.as_ptr()));
        let prefix = CString::new("fer").unwrap();
        let json = take_string(kb_get_suggestions(handle, prefix.as_ptr(), ptr::null()));
        let suggestions: Vec<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(suggestions.first().map(String::as_str), Some("ferris"));
        kb_engine_free(handle);
    }

    #[test]
    fn null_arguments_are_tolerated() {
        assert_eq!(take_string(kb_get_suggestions(ptr::null_mut(), ptr::null(), ptr::null())), "[]");
        assert!(!kb_is_user_word(ptr::null_mut(), ptr::null()));
        kb_learn_word(ptr::null_mut(), ptr::null());
        kb_engine_free(ptr::null_mut());
        kb_free_string(ptr::null_mut());
    }

    #[test]
    fn stats_are_json() {
        let dir = tempfile::tempdir().unwrap();
        let dir_arg = CString::new(dir.path().to_str().unwrap()).unwrap();
        let handle = kb_engine_new(dir_arg.as_ptr());
        let stats: serde_json::Value = serde_json::from_str(&take_string(kb_engine_stats(handle))).unwrap();
        assert!(stats["words"].as_u64().unwrap() > 0);
        kb_engine_free(handle);
    }
}
