//! C-compatible FFI API so a host application can render documents
//! in-process.
//!
//! # ABI Contract
//!
//! All exported functions use `extern "C"` calling convention and `#[no_mangle]`
//! to ensure stable symbol names.
//!
//! ## Memory management
//! - Buffers returned by `ef_*` functions are allocated on the Rust heap.
//! - Callers **must** free them with `ef_free_buffer` / `ef_free_string`.
//! - Passing a null pointer to a free function is a no-op.
//!
//! ## Error handling
//! Functions that can fail return a `c_int`:
//!
//! | code | meaning                                        |
//! |------|------------------------------------------------|
//! | 0    | success                                        |
//! | 1    | null pointer argument                          |
//! | 2    | invalid UTF-8                                  |
//! | 3    | invalid input (document kind, JSON, context)   |
//! | 4    | render failure                                 |
//!
//! Details are available from `ef_last_error` on the same thread.
//!
//! ## Usage from PHP (FFI extension)
//! ```php
//! $ef = FFI::cdef(file_get_contents('include/estate_forge.h'), 'libestate_forge.so');
//! $buf = FFI::new('uint8_t*'); $len = FFI::new('uint32_t');
//! $rc = $ef->ef_render_document('spa', $json, null, FFI::addr($buf), FFI::addr($len));
//! $pdf = FFI::string($buf, $len->cdata);
//! $ef->ef_free_buffer($buf, $len->cdata);
//! ```

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::slice;

use crate::config::RenderOptions;
use crate::context::DocumentContext;
use crate::documents::{compose_html, DocumentKind};
use crate::error::RenderError;
use crate::layout_config::LayoutConfig;
use crate::pipeline::{generate_pdf, render_document, PipelineConfig};
use crate::render::render_pdf;

pub const EF_OK: c_int = 0;
pub const EF_ERR_NULL: c_int = 1;
pub const EF_ERR_UTF8: c_int = 2;
pub const EF_ERR_INPUT: c_int = 3;
pub const EF_ERR_RENDER: c_int = 4;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg.replace('\0', " ")).ok();
    });
}

/// Record `err` and return its code.
fn fail(err: &RenderError) -> c_int {
    set_last_error(&err.to_string());
    match err {
        RenderError::Json(_)
        | RenderError::ContextMismatch { .. }
        | RenderError::UnknownDocument(_)
        | RenderError::UnknownLocale(_) => EF_ERR_INPUT,
        _ => EF_ERR_RENDER,
    }
}

/// Run an entry point, turning a panic into `EF_ERR_RENDER` so it never
/// unwinds into the host.
fn guarded(f: impl FnOnce() -> c_int) -> c_int {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(code) => code,
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            set_last_error(&format!("Internal error: {msg}"));
            EF_ERR_RENDER
        }
    }
}

/// Borrow a null-terminated UTF-8 argument.
///
/// # Safety
/// `s` must be null or point to a null-terminated string.
unsafe fn c_str<'a>(s: *const c_char, what: &str) -> Result<&'a str, c_int> {
    if s.is_null() {
        set_last_error(&format!("Null pointer argument: {what}"));
        return Err(EF_ERR_NULL);
    }
    CStr::from_ptr(s).to_str().map_err(|e| {
        set_last_error(&format!("Invalid UTF-8 in {what}: {e}"));
        EF_ERR_UTF8
    })
}

/// Options JSON, or defaults when `s` is null.
///
/// # Safety
/// As for [`c_str`].
unsafe fn options_from_c(s: *const c_char) -> Result<RenderOptions, c_int> {
    if s.is_null() {
        return Ok(RenderOptions::default());
    }
    let json = c_str(s, "options_json")?;
    RenderOptions::from_json(json).map_err(|e| fail(&e))
}

/// # Safety
/// `kind` and `context_json` must be null or null-terminated strings.
unsafe fn context_from_c(
    kind: *const c_char,
    context_json: *const c_char,
) -> Result<(DocumentKind, DocumentContext), c_int> {
    let kind: DocumentKind = c_str(kind, "kind")?.parse().map_err(|e| fail(&e))?;
    let json = c_str(context_json, "context_json")?;
    let context = DocumentContext::from_json(kind, json).map_err(|e| fail(&e.into()))?;
    Ok((kind, context))
}

/// Hand `bytes` to the caller.
///
/// # Safety
/// `out_buf` and `out_len` must be valid, non-null pointers.
unsafe fn write_buffer(bytes: Vec<u8>, out_buf: *mut *mut u8, out_len: *mut u32) -> c_int {
    let len = match u32::try_from(bytes.len()) {
        Ok(len) => len,
        Err(_) => {
            set_last_error("Output larger than 4 GiB");
            return EF_ERR_RENDER;
        }
    };
    let buf = bytes.into_boxed_slice();
    *out_buf = Box::into_raw(buf) as *mut u8;
    *out_len = len;
    EF_OK
}

/// # Safety
/// `out_str` must be a valid, non-null pointer.
unsafe fn write_string(s: String, out_str: *mut *mut c_char) -> c_int {
    match CString::new(s) {
        Ok(cs) => {
            *out_str = cs.into_raw();
            EF_OK
        }
        Err(_) => {
            set_last_error("Output contained a null byte");
            EF_ERR_RENDER
        }
    }
}

// ---------------------------------------------------------------------------
// Core API
// ---------------------------------------------------------------------------

/// Compose and print a document.
///
/// # Parameters
/// - `kind`: document slug (`broker-agreement`, `reservation-form`,
///   `sales-offer`, `spa`)
/// - `context_json`: the document context as JSON
/// - `options_json`: render options as JSON, or `NULL` for defaults
/// - `out_buf`, `out_len`: receive the PDF bytes
///
/// # Safety
/// - String arguments must be null-terminated UTF-8 (`options_json` may be null).
/// - `out_buf` and `out_len` must be valid pointers.
/// - The caller must free `*out_buf` with `ef_free_buffer`.
#[no_mangle]
pub unsafe extern "C" fn ef_render_document(
    kind: *const c_char,
    context_json: *const c_char,
    options_json: *const c_char,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
) -> c_int {
    guarded(|| {
        if out_buf.is_null() || out_len.is_null() {
            set_last_error("Null pointer argument");
            return EF_ERR_NULL;
        }
        let (kind, context) = match context_from_c(kind, context_json) {
            Ok(v) => v,
            Err(code) => return code,
        };
        let options = match options_from_c(options_json) {
            Ok(o) => o,
            Err(code) => return code,
        };

        match render_document(kind, &context, &options) {
            Ok(doc) => write_buffer(doc.pdf, out_buf, out_len),
            Err(e) => fail(&e),
        }
    })
}

/// Compose a document to HTML without printing it.
///
/// # Safety
/// As for `ef_render_document`. `*out_str` must be freed with `ef_free_string`.
#[no_mangle]
pub unsafe extern "C" fn ef_compose_html(
    kind: *const c_char,
    context_json: *const c_char,
    options_json: *const c_char,
    out_str: *mut *mut c_char,
) -> c_int {
    guarded(|| {
        if out_str.is_null() {
            set_last_error("Null pointer argument");
            return EF_ERR_NULL;
        }
        let (kind, context) = match context_from_c(kind, context_json) {
            Ok(v) => v,
            Err(code) => return code,
        };
        let options = match options_from_c(options_json) {
            Ok(o) => o,
            Err(code) => return code,
        };

        match compose_html(kind, &context, &options) {
            Ok(html) => write_string(html, out_str),
            Err(e) => fail(&e),
        }
    })
}

/// Print raw HTML with default A4 settings.
///
/// # Safety
/// - `html_ptr` must point to `html_len` valid bytes.
/// - `out_buf` and `out_len` must be valid pointers.
/// - The caller must free `*out_buf` with `ef_free_buffer`.
#[no_mangle]
pub unsafe extern "C" fn ef_generate_pdf(
    html_ptr: *const u8,
    html_len: u32,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
) -> c_int {
    guarded(|| {
        if html_ptr.is_null() || out_buf.is_null() || out_len.is_null() {
            set_last_error("Null pointer argument");
            return EF_ERR_NULL;
        }

        let html_bytes = slice::from_raw_parts(html_ptr, html_len as usize);
        let html = match std::str::from_utf8(html_bytes) {
            Ok(s) => s,
            Err(e) => {
                set_last_error(&format!("Invalid UTF-8: {e}"));
                return EF_ERR_UTF8;
            }
        };

        match generate_pdf(html, &PipelineConfig::default()) {
            Ok((pdf_bytes, _)) => write_buffer(pdf_bytes, out_buf, out_len),
            Err(e) => fail(&e),
        }
    })
}

/// Render a PDF from a layout JSON previously produced by the print stage.
///
/// # Safety
/// `json_ptr` must be a null-terminated string; `out_buf` and `out_len` must
/// be valid pointers. Free `*out_buf` with `ef_free_buffer`.
#[no_mangle]
pub unsafe extern "C" fn ef_render_from_layout(
    json_ptr: *const c_char,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
) -> c_int {
    guarded(|| {
        if out_buf.is_null() || out_len.is_null() {
            set_last_error("Null pointer argument");
            return EF_ERR_NULL;
        }
        let json = match c_str(json_ptr, "layout_json") {
            Ok(s) => s,
            Err(code) => return code,
        };
        let layout = match LayoutConfig::from_json(json) {
            Ok(c) => c,
            Err(e) => return fail(&e),
        };
        match render_pdf(&layout) {
            Ok(pdf_bytes) => write_buffer(pdf_bytes, out_buf, out_len),
            Err(e) => fail(&e),
        }
    })
}

// ---------------------------------------------------------------------------
// Memory management
// ---------------------------------------------------------------------------

/// Free a buffer returned by `ef_render_document` or `ef_generate_pdf`.
///
/// # Safety
/// `buf` must come from one of those calls and `len` must be its length.
#[no_mangle]
pub unsafe extern "C" fn ef_free_buffer(buf: *mut u8, len: u32) {
    if !buf.is_null() {
        let _ = Box::from_raw(slice::from_raw_parts_mut(buf, len as usize));
    }
}

/// Free a string returned by `ef_compose_html`.
///
/// # Safety
/// `s` must have been returned by Rust's `CString::into_raw`.
#[no_mangle]
pub unsafe extern "C" fn ef_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = CString::from_raw(s);
    }
}

/// Last error message on this thread, or null.
///
/// The pointer stays valid until the next failing `ef_*` call on the same
/// thread. Do **not** free it.
#[no_mangle]
pub extern "C" fn ef_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(cs) => cs.as_ptr(),
        None => ptr::null(),
    })
}

/// Library version as a static null-terminated string. Do **not** free it.
#[no_mangle]
pub extern "C" fn ef_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const OFFER: &str = r#"{"sales_offer": {"reference": "SO-7", "original_price": 900000,
        "unit": {"unit_no": "B-204"}}}"#;

    fn last_error() -> String {
        let p = ef_last_error();
        assert!(!p.is_null());
        unsafe { CStr::from_ptr(p) }.to_str().unwrap().to_string()
    }

    #[test]
    fn ffi_render_document() {
        let kind = CString::new("sales-offer").unwrap();
        let ctx = CString::new(OFFER).unwrap();
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;

        let rc = unsafe {
            ef_render_document(
                kind.as_ptr(),
                ctx.as_ptr(),
                ptr::null(),
                &mut out_buf,
                &mut out_len,
            )
        };

        assert_eq!(rc, EF_OK, "{}", last_error());
        let bytes = unsafe { slice::from_raw_parts(out_buf, out_len as usize) };
        assert_eq!(&bytes[0..5], b"%PDF-");
        unsafe { ef_free_buffer(out_buf, out_len) };
    }

    #[test]
    fn ffi_compose_html_with_options() {
        let kind = CString::new("sales-offer").unwrap();
        let ctx = CString::new(OFFER).unwrap();
        let opts = CString::new(r#"{"locale": "ar"}"#).unwrap();
        let mut out: *mut c_char = ptr::null_mut();

        let rc = unsafe { ef_compose_html(kind.as_ptr(), ctx.as_ptr(), opts.as_ptr(), &mut out) };

        assert_eq!(rc, EF_OK);
        let html = unsafe { CStr::from_ptr(out) }.to_str().unwrap().to_string();
        assert!(html.contains(r#"dir="rtl""#));
        assert!(html.contains("B-204"));
        unsafe { ef_free_string(out) };
    }

    #[test]
    fn panics_become_render_errors() {
        let rc = guarded(|| panic!("layout exploded"));
        assert_eq!(rc, EF_ERR_RENDER);
        assert!(last_error().contains("layout exploded"));
    }

    #[test]
    fn ffi_spa_with_huge_price_renders() {
        let kind = CString::new("spa").unwrap();
        let ctx = CString::new(r#"{"booking": {"price": 5e15, "unit": {"unit_no": "P-1"}}}"#)
            .unwrap();
        let mut out: *mut c_char = ptr::null_mut();
        let rc = unsafe { ef_compose_html(kind.as_ptr(), ctx.as_ptr(), ptr::null(), &mut out) };
        assert_eq!(rc, EF_OK);
        let html = unsafe { CStr::from_ptr(out) }.to_str().unwrap().to_string();
        assert!(html.contains("Five Thousand Trillion"));
        unsafe { ef_free_string(out) };
    }

    #[test]
    fn ffi_unknown_kind_is_input_error() {
        let kind = CString::new("lease").unwrap();
        let ctx = CString::new("{}").unwrap();
        let mut out: *mut c_char = ptr::null_mut();
        let rc = unsafe { ef_compose_html(kind.as_ptr(), ctx.as_ptr(), ptr::null(), &mut out) };
        assert_eq!(rc, EF_ERR_INPUT);
        assert!(last_error().contains("lease"));
    }

    #[test]
    fn ffi_bad_json_is_input_error() {
        let kind = CString::new("spa").unwrap();
        let ctx = CString::new("{not json").unwrap();
        let mut out: *mut c_char = ptr::null_mut();
        let rc = unsafe { ef_compose_html(kind.as_ptr(), ctx.as_ptr(), ptr::null(), &mut out) };
        assert_eq!(rc, EF_ERR_INPUT);
    }

    #[test]
    fn ffi_generate_pdf() {
        let html = b"<h1>Hello FFI</h1>";
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;

        let rc = unsafe {
            ef_generate_pdf(
                html.as_ptr(),
                html.len() as u32,
                &mut out_buf,
                &mut out_len,
            )
        };

        assert_eq!(rc, EF_OK);
        assert!(out_len > 100);
        let bytes = unsafe { slice::from_raw_parts(out_buf, out_len as usize) };
        assert_eq!(&bytes[0..5], b"%PDF-");
        unsafe { ef_free_buffer(out_buf, out_len) };
    }

    #[test]
    fn ffi_invalid_utf8() {
        let html = [0x3c, 0xff, 0xfe];
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;
        let rc = unsafe { ef_generate_pdf(html.as_ptr(), 3, &mut out_buf, &mut out_len) };
        assert_eq!(rc, EF_ERR_UTF8);
    }

    #[test]
    fn ffi_null_input() {
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;
        let rc = unsafe { ef_generate_pdf(ptr::null(), 0, &mut out_buf, &mut out_len) };
        assert_eq!(rc, EF_ERR_NULL);

        let rc = unsafe {
            ef_render_document(ptr::null(), ptr::null(), ptr::null(), &mut out_buf, &mut out_len)
        };
        assert_eq!(rc, EF_ERR_NULL);
    }

    #[test]
    fn ffi_render_from_layout() {
        let json = CString::new(LayoutConfig::a4().to_json().unwrap()).unwrap();
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;
        let rc = unsafe { ef_render_from_layout(json.as_ptr(), &mut out_buf, &mut out_len) };
        assert_eq!(rc, EF_OK);
        unsafe { ef_free_buffer(out_buf, out_len) };
    }

    #[test]
    fn ffi_version() {
        let version = unsafe { CStr::from_ptr(ef_version()) }.to_str().unwrap();
        assert_eq!(version, env!("CARGO_PKG_VERSION"));
    }
}
