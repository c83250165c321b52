//! FFI bindings for Aloft
//!
//! This module provides C-compatible functions for calling the decision engine
//! from the mobile and server hosts. Snapshots and decisions cross the boundary
//! as JSON in null-terminated C strings. Returned strings are allocated here and
//! must be freed by the caller using `aloft_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::pipeline::{check_proactive_json, decide_json, DecisionEngine};
use crate::types::UserState;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Required string argument, or an error naming it
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Result<String, EngineError> {
    cstr_to_string(ptr)
        .ok_or_else(|| EngineError::ParseError(format!("Invalid {name} string pointer")))
}

/// NULL means the default configuration
unsafe fn config_arg(ptr: *const c_char) -> Result<EngineConfig, EngineError> {
    if ptr.is_null() {
        return Ok(EngineConfig::default());
    }
    EngineConfig::from_json(&required_arg(ptr, "config_json")?)
}

/// A NULL message is an empty one
unsafe fn message_arg(ptr: *const c_char) -> String {
    cstr_to_string(ptr).unwrap_or_default()
}

/// Hand a result across the boundary: a new string, or NULL plus last error
fn into_c_result(result: Result<String, EngineError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Decide how to respond to a message.
///
/// # Safety
/// - `state_json` must be a valid null-terminated C string.
/// - `message` may be NULL (treated as empty).
/// - `config_json` may be NULL for the default configuration.
/// - Returns a newly allocated `EngineOutput` JSON string that must be freed with
///   `aloft_free_string`.
/// - Returns NULL on error; call `aloft_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn aloft_decide(
    message: *const c_char,
    state_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let message = message_arg(message);
    let state_json = required_arg(state_json, "state_json");
    let config = config_arg(config_json);
    let result = state_json
        .and_then(|json| config.and_then(|config| decide_json(&message, &json, &config)));
    into_c_result(result)
}

/// Decide whether to reach out unprompted.
///
/// # Safety
/// - `state_json` must be a valid null-terminated C string.
/// - `config_json` may be NULL for the default configuration.
/// - Returns a newly allocated decision JSON string that must be freed with `aloft_free_string`.
/// - Returns NULL on error; call `aloft_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn aloft_check_proactive(
    state_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let state_json = required_arg(state_json, "state_json");
    let config = config_arg(config_json);
    let result =
        state_json.and_then(|json| config.and_then(|config| check_proactive_json(&json, &config)));
    into_c_result(result)
}

// ============================================================================
// Engine handle API
// ============================================================================

/// Opaque handle to a DecisionEngine
pub struct AloftEngineHandle {
    engine: DecisionEngine,
}

/// Create an engine, parsing its configuration once.
///
/// # Safety
/// - `config_json` may be NULL for the default configuration.
/// - Must be freed with `aloft_engine_free`.
/// - Returns NULL if the configuration is invalid; call `aloft_last_error`.
#[no_mangle]
pub unsafe extern "C" fn aloft_engine_new(config_json: *const c_char) -> *mut AloftEngineHandle {
    clear_last_error();

    match config_arg(config_json).and_then(DecisionEngine::with_config) {
        Ok(engine) => Box::into_raw(Box::new(AloftEngineHandle { engine })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free an engine.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `aloft_engine_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn aloft_engine_free(engine: *mut AloftEngineHandle) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Decide with an engine handle.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `aloft_engine_new`.
/// - `state_json` must be a valid null-terminated C string; `message` may be NULL.
/// - Returns a newly allocated string that must be freed with `aloft_free_string`.
/// - Returns NULL on error; call `aloft_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn aloft_engine_decide(
    engine: *const AloftEngineHandle,
    message: *const c_char,
    state_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &*engine;

    let message = message_arg(message);
    let result = required_arg(state_json, "state_json")
        .and_then(|json| handle.engine.decide_json(&message, &json));
    into_c_result(result)
}

/// Proactive check with an engine handle.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `aloft_engine_new`.
/// - `state_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `aloft_free_string`.
/// - Returns NULL on error; call `aloft_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn aloft_engine_check_proactive(
    engine: *const AloftEngineHandle,
    state_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &*engine;

    let result = required_arg(state_json, "state_json")
        .and_then(|json| handle.engine.check_proactive_json(&json));
    into_c_result(result)
}

/// Full unsolicited-message decision, or the JSON literal `null` when the
/// monitor holds off.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `aloft_engine_new`.
/// - `state_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `aloft_free_string`.
/// - Returns NULL on error; call `aloft_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn aloft_engine_proactive_output(
    engine: *const AloftEngineHandle,
    state_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &*engine;

    let result = required_arg(state_json, "state_json").and_then(|json| {
        let state: UserState = serde_json::from_str(&json)?;
        let output = handle.engine.proactive_output(&state);
        serde_json::to_string(&output).map_err(|e| EngineError::EncodingError(e.to_string()))
    });
    into_c_result(result)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Aloft functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an Aloft function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn aloft_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Aloft function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn aloft_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Aloft library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn aloft_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_state_json() -> CString {
        CString::new(
            r#"{
                "user_id": "ffi-user",
                "age": 41,
                "anxiety_level": 8.5,
                "anxiety_history": [7, 8, 8.5],
                "cognitive": { "panic_language": true },
                "flight": { "phase": "takeoff", "time_in_phase_sec": 30 }
            }"#,
        )
        .unwrap()
    }

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        aloft_free_string(ptr);
        s
    }

    #[test]
    fn test_ffi_decide() {
        let state = sample_state_json();
        let message = CString::new("I'm freaking out").unwrap();

        unsafe {
            let result = take_string(aloft_decide(message.as_ptr(), state.as_ptr(), ptr::null()));
            let value: serde_json::Value = serde_json::from_str(&result).unwrap();
            assert_eq!(value["mode"], "SOFT");
            assert_eq!(value["detected_anxiety"], 8.5);
        }
    }

    #[test]
    fn test_ffi_null_message_is_empty() {
        let state = sample_state_json();
        unsafe {
            let result = take_string(aloft_decide(ptr::null(), state.as_ptr(), ptr::null()));
            assert!(result.contains("\"crisis_detected\":false"));
        }
    }

    #[test]
    fn test_ffi_custom_config() {
        let state = CString::new(r#"{"age": 15, "anxiety_level": 3}"#).unwrap();
        let config = CString::new(r#"{"youth_age_threshold": 18}"#).unwrap();
        unsafe {
            let result = take_string(aloft_decide(ptr::null(), state.as_ptr(), config.as_ptr()));
            assert!(result.contains("\"mode\":\"KID\""));
        }
    }

    #[test]
    fn test_ffi_engine_lifecycle() {
        unsafe {
            let engine = aloft_engine_new(ptr::null());
            assert!(!engine.is_null());

            let state = sample_state_json();
            let message = CString::new("").unwrap();
            let decision =
                take_string(aloft_engine_decide(engine, message.as_ptr(), state.as_ptr()));
            assert!(decision.contains("\"timestamp\""));

            let proactive = take_string(aloft_engine_check_proactive(engine, state.as_ptr()));
            assert!(proactive.contains("\"intervene\""));

            let output = take_string(aloft_engine_proactive_output(engine, state.as_ptr()));
            assert!(output == "null" || output.contains("\"proactive\":true"));

            aloft_engine_free(engine);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();
            let result = aloft_decide(ptr::null(), invalid_json.as_ptr(), ptr::null());
            assert!(result.is_null());

            let error = aloft_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());

            let result = aloft_check_proactive(ptr::null(), ptr::null());
            assert!(result.is_null());
            let error_str = CStr::from_ptr(aloft_last_error()).to_str().unwrap();
            assert!(error_str.contains("state_json"));

            let bad_config = CString::new(r#"{"bands": {"crisis": 2}}"#).unwrap();
            assert!(aloft_engine_new(bad_config.as_ptr()).is_null());
            assert!(aloft_engine_decide(ptr::null(), ptr::null(), ptr::null()).is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = aloft_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
