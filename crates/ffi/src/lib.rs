// ABOUTME: C FFI bindings for the wayfarer content core.
// ABOUTME: Exposes arena-allocated node views and an editor placeholder session to native hosts.

use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::slice;

use bumpalo::Bump;
use log::error;
use wayfarer_content::{
    from_placeholder_html, parse_html_to_nodes, to_body, to_media_rail, to_placeholder_html,
    ContentNode, PlaceholderTable,
};

/// FFI version constant for ABI compatibility checking.
pub const WAYFARER_FFI_VERSION: u32 = 1;

/// Returns the FFI ABI version number.
/// Consumers should check this matches their expected version.
#[no_mangle]
pub extern "C" fn wayfarer_ffi_version() -> u32 {
    WAYFARER_FFI_VERSION
}

// ----------------------------------------------------------------------------
// Error handling
// ----------------------------------------------------------------------------

/// Error codes matching the C ABI WErrorCode enum.
#[repr(u32)]
pub enum DErrorCode {
    Ok = 0,
    Invalid = 4,
    Internal = 255,
}

/// UTF-8 string slice for FFI. Not null-terminated.
/// Consumer must not mutate or free; memory owned by the arena or static.
#[derive(Copy, Clone)]
#[repr(C)]
pub struct DString {
    pub data: *const u8,
    pub len: usize,
}

impl DString {
    /// Creates an empty DString with null pointer and zero length.
    pub const fn empty() -> Self {
        DString {
            data: ptr::null(),
            len: 0,
        }
    }

    const fn from_static(s: &'static str) -> Self {
        DString {
            data: s.as_ptr(),
            len: s.len(),
        }
    }
}

impl Default for DString {
    fn default() -> Self {
        Self::empty()
    }
}

/// FFI error struct matching C ABI DError.
/// Messages are static strings and stay valid for the life of the process.
#[repr(C)]
pub struct DError {
    pub code: u32,
    pub message: DString,
}

impl DError {
    /// Creates a success (W_OK) error with empty message.
    pub const fn ok() -> Self {
        DError {
            code: DErrorCode::Ok as u32,
            message: DString::empty(),
        }
    }
}

// ----------------------------------------------------------------------------
// Node views
// ----------------------------------------------------------------------------

/// Node kinds matching the C ABI WNodeKind enum.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DNodeKind {
    Text = 0,
    Image = 1,
    Video = 2,
    Link = 3,
}

/// One content node.
///
/// `content` holds the markup for text nodes and the anchor text for links.
/// `url` holds the image url, video src, or link target. `poster` is empty
/// unless a video has one.
#[derive(Copy, Clone)]
#[repr(C)]
pub struct DContentNode {
    pub kind: u32,
    pub content: DString,
    pub url: DString,
    pub poster: DString,
}

/// The full node sequence plus the media rail and body views.
#[repr(C)]
pub struct DContentView {
    pub nodes: *const DContentNode,
    pub nodes_len: usize,
    pub rail: *const DContentNode,
    pub rail_len: usize,
    pub body: *const DContentNode,
    pub body_len: usize,
}

/// Arena holding a decomposed document.
/// All allocations for the view live in the bump allocator.
pub struct DNodesArena {
    #[allow(dead_code)]
    bump: Bump,
    view: *const DContentView,
}

/// Arena holding one transformed HTML string.
pub struct DHtmlArena {
    #[allow(dead_code)]
    bump: Bump,
    html: DString,
}

/// One editor session: owns the placeholder side table until freed.
pub struct DEditSession {
    table: PlaceholderTable,
}

// ----------------------------------------------------------------------------
// Helper functions
// ----------------------------------------------------------------------------

/// Copies a string into the arena and returns a DString pointing to it.
fn copy_str_to_arena(bump: &Bump, s: &str) -> DString {
    if s.is_empty() {
        return DString::empty();
    }
    let bytes = bump.alloc_slice_copy(s.as_bytes());
    DString {
        data: bytes.as_ptr(),
        len: bytes.len(),
    }
}

fn make_node(bump: &Bump, node: &ContentNode) -> DContentNode {
    match node {
        ContentNode::Text { content } => DContentNode {
            kind: DNodeKind::Text as u32,
            content: copy_str_to_arena(bump, content),
            url: DString::empty(),
            poster: DString::empty(),
        },
        ContentNode::Image { url } => DContentNode {
            kind: DNodeKind::Image as u32,
            content: DString::empty(),
            url: copy_str_to_arena(bump, url),
            poster: DString::empty(),
        },
        ContentNode::Video { src, poster } => DContentNode {
            kind: DNodeKind::Video as u32,
            content: DString::empty(),
            url: copy_str_to_arena(bump, src),
            poster: poster
                .as_deref()
                .map_or(DString::empty(), |p| copy_str_to_arena(bump, p)),
        },
        ContentNode::Link { url, text } => DContentNode {
            kind: DNodeKind::Link as u32,
            content: copy_str_to_arena(bump, text),
            url: copy_str_to_arena(bump, url),
            poster: DString::empty(),
        },
    }
}

fn make_nodes<'a>(bump: &'a Bump, nodes: &[ContentNode]) -> (&'a [DContentNode], usize) {
    let converted: Vec<DContentNode> = nodes.iter().map(|n| make_node(bump, n)).collect();
    let slice = bump.alloc_slice_copy(&converted);
    let len = slice.len();
    (slice, len)
}

fn make_content_view(bump: &Bump, nodes: &[ContentNode]) -> *const DContentView {
    let (all, nodes_len) = make_nodes(bump, nodes);
    let (rail, rail_len) = make_nodes(bump, &to_media_rail(nodes));
    let (body, body_len) = make_nodes(bump, &to_body(nodes));
    let view = bump.alloc(DContentView {
        nodes: all.as_ptr(),
        nodes_len,
        rail: rail.as_ptr(),
        rail_len,
        body: body.as_ptr(),
        body_len,
    });
    view as *const DContentView
}

/// Reads caller bytes as text. A null pointer with zero length is the empty
/// document; invalid UTF-8 is replaced rather than rejected.
unsafe fn read_html(data: *const u8, len: usize) -> Option<String> {
    if data.is_null() {
        return if len == 0 { Some(String::new()) } else { None };
    }
    let bytes = slice::from_raw_parts(data, len);
    Some(String::from_utf8_lossy(bytes).into_owned())
}

/// Sets the out_err with the given code and static message.
/// If out_err is null, this is a no-op.
unsafe fn set_error(out_err: *mut DError, code: DErrorCode, message: &'static str) {
    if !out_err.is_null() {
        (*out_err).code = code as u32;
        (*out_err).message = DString::from_static(message);
    }
}

/// Sets out_err to success (W_OK with empty message).
/// If out_err is null, this is a no-op.
unsafe fn set_success(out_err: *mut DError) {
    if !out_err.is_null() {
        (*out_err).code = DErrorCode::Ok as u32;
        (*out_err).message = DString::empty();
    }
}

unsafe fn into_html_arena(html: &str, out_err: *mut DError) -> *mut DHtmlArena {
    let bump = Bump::new();
    let html = copy_str_to_arena(&bump, html);
    set_success(out_err);
    Box::into_raw(Box::new(DHtmlArena { bump, html }))
}

// ----------------------------------------------------------------------------
// Decomposition FFI functions
// ----------------------------------------------------------------------------

/// Decomposes article HTML into nodes. Returns an arena with all three views.
///
/// # Arguments
/// * `html` - HTML bytes (UTF-8); may be null when `html_len` is 0
/// * `html_len` - Length of HTML in bytes
/// * `out_err` - Output error struct (may be null)
///
/// # Returns
/// Pointer to DNodesArena on success, null on failure.
///
/// # Safety
/// `html` must point to `html_len` readable bytes. Caller must free the
/// returned arena via wayfarer_free_nodes.
#[no_mangle]
pub unsafe extern "C" fn wayfarer_parse_nodes(
    html: *const u8,
    html_len: usize,
    out_err: *mut DError,
) -> *mut DNodesArena {
    let html = match read_html(html, html_len) {
        Some(h) => h,
        None => {
            set_error(out_err, DErrorCode::Invalid, "html is null");
            return ptr::null_mut();
        }
    };

    let nodes = match panic::catch_unwind(|| parse_html_to_nodes(&html)) {
        Ok(nodes) => nodes,
        Err(_) => {
            error!("panic during content decomposition");
            set_error(out_err, DErrorCode::Internal, "panic during decomposition");
            return ptr::null_mut();
        }
    };

    let bump = Bump::new();
    let view = make_content_view(&bump, &nodes);
    set_success(out_err);
    Box::into_raw(Box::new(DNodesArena { bump, view }))
}

/// Returns the content view for a given nodes arena.
///
/// # Safety
/// `arena` must be null or a pointer returned by wayfarer_parse_nodes.
#[no_mangle]
pub unsafe extern "C" fn wayfarer_nodes_result(arena: *const DNodesArena) -> *const DContentView {
    if arena.is_null() {
        return ptr::null();
    }
    (*arena).view
}

/// Frees a nodes arena.
///
/// # Safety
/// `arena` must be null or a pointer returned by wayfarer_parse_nodes, freed once.
#[no_mangle]
pub unsafe extern "C" fn wayfarer_free_nodes(arena: *mut DNodesArena) {
    if !arena.is_null() {
        drop(Box::from_raw(arena));
    }
}

// ----------------------------------------------------------------------------
// Editor session FFI functions
// ----------------------------------------------------------------------------

/// Starts an edit session with an empty placeholder table.
#[no_mangle]
pub extern "C" fn wayfarer_session_new() -> *mut DEditSession {
    Box::into_raw(Box::new(DEditSession {
        table: PlaceholderTable::new(),
    }))
}

/// Number of placeholders registered in the session.
///
/// # Safety
/// `session` must be null or a live pointer from wayfarer_session_new.
#[no_mangle]
pub unsafe extern "C" fn wayfarer_session_len(session: *const DEditSession) -> usize {
    if session.is_null() {
        return 0;
    }
    (*session).table.len()
}

/// Ends an edit session, discarding its placeholder table.
///
/// # Safety
/// `session` must be null or a pointer from wayfarer_session_new, freed once.
#[no_mangle]
pub unsafe extern "C" fn wayfarer_session_free(session: *mut DEditSession) {
    if !session.is_null() {
        drop(Box::from_raw(session));
    }
}

/// Converts stored HTML into editor HTML, registering each video in the session.
///
/// # Safety
/// `session` must be a live session; `html` must point to `html_len` readable
/// bytes. Caller must free the returned arena via wayfarer_free_html.
#[no_mangle]
pub unsafe extern "C" fn wayfarer_session_to_placeholder(
    session: *mut DEditSession,
    html: *const u8,
    html_len: usize,
    out_err: *mut DError,
) -> *mut DHtmlArena {
    if session.is_null() {
        set_error(out_err, DErrorCode::Invalid, "session is null");
        return ptr::null_mut();
    }
    let html = match read_html(html, html_len) {
        Some(h) => h,
        None => {
            set_error(out_err, DErrorCode::Invalid, "html is null");
            return ptr::null_mut();
        }
    };

    let table = &mut (*session).table;
    match panic::catch_unwind(AssertUnwindSafe(|| to_placeholder_html(&html, table))) {
        Ok(out) => into_html_arena(&out, out_err),
        Err(_) => {
            error!("panic during placeholder conversion");
            set_error(out_err, DErrorCode::Internal, "panic during placeholder conversion");
            ptr::null_mut()
        }
    }
}

/// Converts editor HTML back into stored HTML using the session's table.
///
/// # Safety
/// Same contract as wayfarer_session_to_placeholder.
#[no_mangle]
pub unsafe extern "C" fn wayfarer_session_from_placeholder(
    session: *const DEditSession,
    html: *const u8,
    html_len: usize,
    out_err: *mut DError,
) -> *mut DHtmlArena {
    if session.is_null() {
        set_error(out_err, DErrorCode::Invalid, "session is null");
        return ptr::null_mut();
    }
    let html = match read_html(html, html_len) {
        Some(h) => h,
        None => {
            set_error(out_err, DErrorCode::Invalid, "html is null");
            return ptr::null_mut();
        }
    };

    let table = &(*session).table;
    match panic::catch_unwind(AssertUnwindSafe(|| from_placeholder_html(&html, table))) {
        Ok(out) => into_html_arena(&out, out_err),
        Err(_) => {
            error!("panic during placeholder restore");
            set_error(out_err, DErrorCode::Internal, "panic during placeholder restore");
            ptr::null_mut()
        }
    }
}

/// Returns the HTML held by an arena.
///
/// # Safety
/// `arena` must be null or a pointer returned by a session transform.
#[no_mangle]
pub unsafe extern "C" fn wayfarer_html_result(arena: *const DHtmlArena) -> DString {
    if arena.is_null() {
        return DString::empty();
    }
    (*arena).html
}

/// Frees an HTML arena.
///
/// # Safety
/// `arena` must be null or a pointer returned by a session transform, freed once.
#[no_mangle]
pub unsafe extern "C" fn wayfarer_free_html(arena: *mut DHtmlArena) {
    if !arena.is_null() {
        drop(Box::from_raw(arena));
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffi_version() {
        assert_eq!(wayfarer_ffi_version(), 1);
    }

    #[test]
    fn test_copy_str_to_arena() {
        let bump = Bump::new();
        let ds = copy_str_to_arena(&bump, "视频");
        assert!(!ds.data.is_null());
        assert_eq!(ds.len, 6);
        unsafe {
            let slice = std::slice::from_raw_parts(ds.data, ds.len);
            assert_eq!(std::str::from_utf8(slice).unwrap(), "视频");
        }
    }

    #[test]
    fn test_copy_empty_str_to_arena() {
        let bump = Bump::new();
        let ds = copy_str_to_arena(&bump, "");
        assert!(ds.data.is_null());
        assert_eq!(ds.len, 0);
    }

    #[test]
    fn test_make_node_video_without_poster() {
        let bump = Bump::new();
        let node = make_node(&bump, &ContentNode::video("https://x/v.mp4", None));
        assert_eq!(node.kind, DNodeKind::Video as u32);
        assert_eq!(node.url.len, "https://x/v.mp4".len());
        assert!(node.poster.data.is_null());
    }

    #[test]
    fn test_read_html_null_handling() {
        unsafe {
            assert_eq!(read_html(ptr::null(), 0), Some(String::new()));
            assert_eq!(read_html(ptr::null(), 3), None);
            let bad = [0x66u8, 0xff, 0x6f];
            assert_eq!(read_html(bad.as_ptr(), bad.len()), Some("f\u{fffd}o".to_string()));
        }
    }
}
