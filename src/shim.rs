// src/shim.rs
//! Forward-compatibility snippet hook for the legacy format.
//!
//! Carts using the 60 fps callback carry one of two fixed fallback snippets
//! appended to their source so that runtimes predating the callback still
//! behave. The hook is pure byte preprocessing around the codec: `inject`
//! may run before legacy compression, and the legacy decoder always calls
//! `strip` so a suffixed cart decompresses back to its original text.

/// Substring whose presence triggers injection.
pub const MARKER: &[u8] = b"_update60";

/// Snippet appended by the first runtime revision.
pub const SNIPPET_V1: &[u8] = b"if(_update60)_update=function()_update60()_update60()end";
/// Snippet appended by later revisions (button-state fix).
pub const SNIPPET_V2: &[u8] =
    b"if(_update60)_update=function()_update60()_update_buttons()_update60()end";

/// Decompression buffer budget the injected result must still fit.
const CODE_ALLOC: usize = 0x10000 + 1;

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Appends [`SNIPPET_V2`] when the marker is present and the result still
/// fits the decompression budget; guarantees whitespace before the snippet.
/// Inputs without the marker (or too large) pass through unchanged.
pub fn inject(input: &[u8]) -> Vec<u8> {
    if !contains(input, MARKER) || input.len() >= CODE_ALLOC - (SNIPPET_V2.len() + 1) {
        return input.to_vec();
    }
    let mut out = input.to_vec();
    if !matches!(out.last(), Some(b' ') | Some(b'\n')) {
        out.push(b'\n');
    }
    out.extend_from_slice(SNIPPET_V2);
    out
}

/// Removes either snippet when it is an exact suffix of `out` (which covers
/// the degenerate case of the snippet being the entire text).
pub fn strip(mut out: Vec<u8>) -> Vec<u8> {
    for snippet in [SNIPPET_V1, SNIPPET_V2] {
        if out.ends_with(snippet) {
            let keep = out.len() - snippet.len();
            out.truncate(keep);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inject_appends_snippet_with_whitespace_guard() {
        // trailing space already separates; nothing extra is inserted
        let src = b"function _update60() s=s+1 end ";
        let got = inject(src);
        assert_eq!(got.len(), src.len() + SNIPPET_V2.len());
        assert_eq!(&got[..src.len()], src);
        assert!(got.ends_with(SNIPPET_V2));

        // no trailing whitespace: a newline keeps the snippet off the
        // preceding token
        let got = inject(b"function _update60() end--x");
        let body = &got[..got.len() - SNIPPET_V2.len()];
        assert_eq!(body.last(), Some(&b'\n'));
    }

    #[test]
    fn inject_skips_without_marker() {
        assert_eq!(inject(b"print('hi')"), b"print('hi')");
    }

    #[test]
    fn inject_skips_when_result_would_not_fit() {
        let mut big = vec![b'-'; CODE_ALLOC - SNIPPET_V2.len() - 1];
        big[..MARKER.len()].copy_from_slice(MARKER);
        assert_eq!(inject(&big), big);
    }

    #[test]
    fn strip_removes_exact_suffix_only() {
        let mut text = b"x=1\n".to_vec();
        text.extend_from_slice(SNIPPET_V2);
        assert_eq!(strip(text), b"x=1\n");

        // snippet in the middle stays
        let mut text = SNIPPET_V1.to_vec();
        text.extend_from_slice(b"\nx=1");
        assert_eq!(strip(text.clone()), text);
    }

    #[test]
    fn strip_handles_snippet_as_entire_text() {
        assert_eq!(strip(SNIPPET_V1.to_vec()), b"");
        assert_eq!(strip(SNIPPET_V2.to_vec()), b"");
    }

    #[test]
    fn inject_then_strip_restores_original() {
        let src = b"t=0 function _update60() t=t+1 end\n";
        assert_eq!(strip(inject(src)), src);
    }
}
