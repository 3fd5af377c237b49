/// Deterministic path-derived hue assignment.
///
/// Every node gets a hue in [0, 1) that is a pure function of its absolute
/// path: re-scans and zooms never re-randomize colors, and a child's hue is
/// a bounded perturbation of its parent's, so a zoomed-into subtree keeps a
/// recognizable color identity.
///
/// BLAKE3 rather than the std hasher: `std::hash` is randomly keyed per
/// process, which breaks the cross-run stability the hue contract requires.
use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// Maximum hue distance between a child and its parent (wrapped).
pub const HUE_SPREAD: f32 = 0.35;

/// Map arbitrary bytes to [0, 1) via the first 8 digest bytes.
fn unit_hash(bytes: &[u8]) -> f64 {
    let digest = blake3::hash(bytes);
    let mut word = [0u8; 8];
    word.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(word) as f64 / (u64::MAX as f64 + 1.0)
}

/// Derive a child's hue from its parent's hue and its final path component.
pub fn child_hue(parent_hue: f32, name: &OsStr) -> f32 {
    let shift = (unit_hash(name.as_bytes()) - 0.5) * HUE_SPREAD as f64;
    let hue = (parent_hue as f64 + shift).rem_euclid(1.0) as f32;
    // Two float boundaries land on exactly 1.0: rem_euclid of a tiny
    // negative sum, and an f64 just below 1.0 rounding up when narrowed
    // to f32. Both wrap to 0.0 to keep the half-open range.
    if hue >= 1.0 {
        0.0
    } else {
        hue
    }
}

/// Hue for an absolute path: fold [`child_hue`] over every path component.
///
/// Folding from the filesystem root makes the result independent of where
/// a scan started, so the same directory keeps its hue whether it is the
/// scan root or ten levels deep.
pub fn hue_for_path(path: &Path) -> f32 {
    let mut hue = 0.0f32;
    for component in path.components() {
        hue = child_hue(hue, component.as_os_str());
    }
    hue
}
