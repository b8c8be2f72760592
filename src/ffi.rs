//! FFI bindings for the assessment engine
//!
//! This module provides C-compatible functions for calling the engine from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `tc_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::EngineConfig;
use crate::error::AssessmentError;
use crate::pipeline::{summarize_session_json, SessionAssessor};
use crate::quiz::{score_quiz, QuizData};
use crate::triage::{respond, FallbackPolicy};
use crate::types::ChatTurn;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
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

/// Hand a result back across the boundary, recording the error on failure
fn finish(result: Result<String, AssessmentError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Parse an optional JSON transcript; NULL means no turns
unsafe fn transcript_arg(ptr: *const c_char) -> Result<Vec<ChatTurn>, AssessmentError> {
    if ptr.is_null() {
        return Ok(Vec::new());
    }
    let json = cstr_to_string(ptr)
        .ok_or_else(|| AssessmentError::ParseError("Invalid transcript string pointer".to_string()))?;
    Ok(serde_json::from_str(&json)?)
}

fn score_quiz_json(quiz_json: &str, transcript: &[ChatTurn]) -> Result<String, AssessmentError> {
    let quiz: QuizData = serde_json::from_str(quiz_json)?;
    let assessment = score_quiz(&quiz, transcript);
    Ok(serde_json::to_string(&assessment)?)
}

// ============================================================================
// Stateless API
// ============================================================================

/// Aggregate a `{source, raw_data}` session document into report JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `tc_free_string`.
/// - Returns NULL on error; call `tc_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn tc_summarize_session(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    finish(summarize_session_json(&json_str))
}

/// Score quiz telemetry and return the assessment JSON.
///
/// # Safety
/// - `quiz_json` must be a valid null-terminated C string.
/// - `transcript_json` must be a valid null-terminated C string holding a JSON
///   array of chat turns, or NULL.
/// - Returns a newly allocated string that must be freed with `tc_free_string`.
/// - Returns NULL on error; call `tc_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn tc_score_quiz(
    quiz_json: *const c_char,
    transcript_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let quiz_str = match cstr_to_string(quiz_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid quiz string pointer");
            return ptr::null_mut();
        }
    };

    let transcript = match transcript_arg(transcript_json) {
        Ok(t) => t,
        Err(e) => return finish(Err(e)),
    };

    finish(score_quiz_json(&quiz_str, &transcript))
}

/// Answer one triage turn with the fallback policy only.
///
/// # Safety
/// - `history_json` must be a valid null-terminated C string holding a JSON
///   array of prior chat turns, or NULL.
/// - `input` must be a valid null-terminated C string.
/// - Returns a newly allocated reply JSON that must be freed with `tc_free_string`.
/// - Returns NULL on error; call `tc_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn tc_triage_turn(
    history_json: *const c_char,
    input: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let input_str = match cstr_to_string(input) {
        Some(s) => s,
        None => {
            set_last_error("Invalid input string pointer");
            return ptr::null_mut();
        }
    };

    let history = match transcript_arg(history_json) {
        Ok(h) => h,
        Err(e) => return finish(Err(e)),
    };

    let reply = respond(&history, &input_str, None, &FallbackPolicy::default());
    finish(serde_json::to_string(&reply).map_err(AssessmentError::JsonError))
}

// ============================================================================
// Stateful Assessor API
// ============================================================================

/// Opaque handle to a SessionAssessor
pub struct AssessorHandle {
    assessor: SessionAssessor,
}

/// Create a new assessor from a JSON config (NULL for defaults).
///
/// When `apply_env` is true, `TEENCARE_*` environment variables are applied
/// on top of the config; otherwise the config is used as given.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string, or NULL.
/// - Returns a pointer to a newly allocated assessor.
/// - Must be freed with `tc_assessor_free`.
/// - Returns NULL on error; call `tc_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn tc_assessor_new(
    config_json: *const c_char,
    apply_env: bool,
) -> *mut AssessorHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        Ok(EngineConfig::default())
    } else {
        match cstr_to_string(config_json) {
            Some(s) => EngineConfig::from_json(&s),
            None => Err(AssessmentError::ConfigError("Invalid config string pointer".to_string())),
        }
    };

    let config = if apply_env {
        config.and_then(EngineConfig::with_env_overrides)
    } else {
        config
    };

    match config {
        Ok(config) => {
            let handle = Box::new(AssessorHandle {
                assessor: SessionAssessor::new(&config),
            });
            Box::into_raw(handle)
        }
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free an assessor.
///
/// # Safety
/// - `assessor` must be a valid pointer returned by `tc_assessor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn tc_assessor_free(assessor: *mut AssessorHandle) {
    if !assessor.is_null() {
        drop(Box::from_raw(assessor));
    }
}

/// Answer one triage turn, using the assessor's model when available.
///
/// # Safety
/// - `assessor` must be a valid pointer returned by `tc_assessor_new`.
/// - `history_json` must be a valid null-terminated C string holding a JSON
///   array of prior chat turns, or NULL.
/// - `input` must be a valid null-terminated C string.
/// - Returns a newly allocated reply JSON that must be freed with `tc_free_string`.
/// - Returns NULL on error; call `tc_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn tc_assessor_triage_turn(
    assessor: *mut AssessorHandle,
    history_json: *const c_char,
    input: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if assessor.is_null() {
        set_last_error("Null assessor pointer");
        return ptr::null_mut();
    }

    let input_str = match cstr_to_string(input) {
        Some(s) => s,
        None => {
            set_last_error("Invalid input string pointer");
            return ptr::null_mut();
        }
    };

    let history = match transcript_arg(history_json) {
        Ok(h) => h,
        Err(e) => return finish(Err(e)),
    };

    let handle = &*assessor;
    let policy = FallbackPolicy::new(handle.assessor.config().closing_depth);
    let reply = respond(
        &history,
        &input_str,
        handle.assessor.model().conversational(),
        &policy,
    );
    finish(serde_json::to_string(&reply).map_err(AssessmentError::JsonError))
}

/// Return decision-task scenarios as a JSON array.
///
/// # Safety
/// - `assessor` must be a valid pointer returned by `tc_assessor_new`.
/// - `context` must be a valid null-terminated C string, or NULL.
/// - Returns a newly allocated string that must be freed with `tc_free_string`.
/// - Returns NULL on error; call `tc_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn tc_assessor_questions(
    assessor: *mut AssessorHandle,
    context: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if assessor.is_null() {
        set_last_error("Null assessor pointer");
        return ptr::null_mut();
    }

    let context_str = cstr_to_string(context).unwrap_or_default();
    let handle = &*assessor;
    let questions = handle.assessor.questions(&context_str);
    finish(serde_json::to_string(&questions).map_err(AssessmentError::JsonError))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by engine functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an engine function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn tc_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next engine function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn tc_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the engine library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn tc_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
