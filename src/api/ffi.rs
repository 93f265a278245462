//! C-compatible API for embedding the single-case predictor.
//!
//! Ownership rules: handles returned by [`reimburse_open`] must be released
//! with [`reimburse_close`]; strings returned by [`reimburse_last_error`] must
//! be released with [`reimburse_free_str`]. Failures are reported as
//! [`ErrorCode`] values, with the message kept in a thread-local buffer.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::PathBuf;

use crate::common::config::AppCfg;
use crate::common::error::{ErrorCode, ReimburseError, ReimburseResult};
use crate::data::domain::TripRecord;
use crate::inference::domain::Predictor;
use crate::inference::service::open_predictor;

/// ABI version to coordinate with embedding hosts.
pub const API_VERSION: u32 = 1;

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Opaque predictor handle.
pub struct ReimburseHandle {
    predictor: Predictor,
}

#[no_mangle]
pub extern "C" fn reimburse_api_version() -> u32 {
    API_VERSION
}

/// Load the model in `model_dir`. `profile` may be null to use the profile
/// the model declares. Returns null on failure.
///
/// # Safety
///
/// `model_dir` must be a valid NUL-terminated string; `profile` must be null
/// or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn reimburse_open(
    model_dir: *const c_char,
    profile: *const c_char,
) -> *mut ReimburseHandle {
    let result = (|| {
        let model_dir = c_str(model_dir, "model_dir")?;
        let profile = if profile.is_null() {
            None
        } else {
            Some(c_str(profile, "profile")?)
        };
        let cfg = AppCfg {
            model_dir: PathBuf::from(model_dir),
            profile,
            ..AppCfg::default()
        };
        open_predictor(&cfg)
    })();

    match result {
        Ok(predictor) => {
            clear_error();
            Box::into_raw(Box::new(ReimburseHandle { predictor }))
        }
        Err(err) => {
            record_error(&err);
            std::ptr::null_mut()
        }
    }
}

/// Predict one trip and store the result in `out`. Returns an [`ErrorCode`].
///
/// # Safety
///
/// `handle` must come from [`reimburse_open`] and not be closed; `out` must
/// point to writable memory for one `f64`.
#[no_mangle]
pub unsafe extern "C" fn reimburse_predict(
    handle: *const ReimburseHandle,
    trip_duration_days: f64,
    miles_traveled: f64,
    total_receipts_amount: f64,
    out: *mut f64,
) -> u32 {
    if handle.is_null() || out.is_null() {
        record_error(&ReimburseError::invalid("null handle or output pointer"));
        return ErrorCode::InvalidInput as u32;
    }
    let handle = &*handle;

    let result = TripRecord::new(trip_duration_days, miles_traveled, total_receipts_amount)
        .and_then(|record| handle.predictor.predict_one(&record));

    match result {
        Ok(value) => {
            *out = value;
            clear_error();
            ErrorCode::Ok as u32
        }
        Err(err) => {
            record_error(&err);
            err.code() as u32
        }
    }
}

/// Release a handle. Null is ignored.
///
/// # Safety
///
/// `handle` must come from [`reimburse_open`] and not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn reimburse_close(handle: *mut ReimburseHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Message of the last failure on this thread, or null. Caller frees.
#[no_mangle]
pub extern "C" fn reimburse_last_error() -> *mut c_char {
    LAST_ERROR.with(|slot| match slot.borrow().as_deref() {
        Some(msg) => string_to_raw(msg),
        None => std::ptr::null_mut(),
    })
}

/// Free strings allocated by this library.
///
/// # Safety
///
/// `ptr` must be null or come from [`reimburse_last_error`].
#[no_mangle]
pub unsafe extern "C" fn reimburse_free_str(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

unsafe fn c_str(ptr: *const c_char, field: &str) -> ReimburseResult<String> {
    if ptr.is_null() {
        return Err(ReimburseError::invalid(format!("{field} is null")));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(str::to_owned)
        .map_err(|_| ReimburseError::invalid(format!("{field} is not valid UTF-8")))
}

fn record_error(err: &ReimburseError) {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(err.to_string()));
}

fn clear_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}

fn string_to_raw(msg: &str) -> *mut c_char {
    // Interior NULs cannot cross the boundary; replace them.
    let sanitized = msg.replace('\0', " ");
    CString::new(sanitized)
        .map(CString::into_raw)
        .unwrap_or(std::ptr::null_mut())
}
