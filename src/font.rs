//! Font discovery and digit metrics.
//!
//! Cards only ever draw the characters `0-9`, so a face is considered usable
//! when it covers all ten digits. Fonts are resolved in configuration order:
//! explicit files, then explicit directories, then the platform font
//! directories (extendable via `BINGOPRESS_FONT_DIR`).

use crate::types::Pt;
use std::path::{Path, PathBuf};

/// Environment variable holding extra font directories (path-separator
/// delimited), searched after the platform defaults.
pub const FONT_DIR_ENV: &str = "BINGOPRESS_FONT_DIR";

const SYSTEM_SCAN_DEPTH: usize = 4;

// Well-known sans faces tried before falling back to any parseable file.
const PREFERRED_FILE_NAMES: [&str; 8] = [
    "dejavusans-bold.ttf",
    "dejavusans.ttf",
    "liberationsans-bold.ttf",
    "liberationsans-regular.ttf",
    "notosans-bold.ttf",
    "notosans-regular.ttf",
    "arialbd.ttf",
    "arial.ttf",
];

#[derive(Debug)]
pub(crate) struct RegisteredFont {
    pub(crate) name: String,
    pub(crate) data: Vec<u8>,
    pub(crate) metrics: FontMetrics,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FontMetrics {
    units_per_em: u16,
    cap_height: i16,
    digit_advances: [u16; 10],
}

impl FontMetrics {
    fn from_face(face: &ttf_parser::Face) -> Option<Self> {
        let units_per_em = face.units_per_em();
        if units_per_em == 0 {
            return None;
        }
        let mut digit_advances = [0u16; 10];
        for (slot, ch) in ('0'..='9').enumerate() {
            let gid = face.glyph_index(ch)?;
            let advance = face.glyph_hor_advance(gid)?;
            if advance == 0 {
                return None;
            }
            digit_advances[slot] = advance;
        }
        let ascent = face.ascender();
        let cap_height = face
            .capital_height()
            .filter(|h| *h > 0)
            .unwrap_or_else(|| (ascent as f32 * 0.7) as i16);
        Some(Self {
            units_per_em,
            cap_height,
            digit_advances,
        })
    }

    /// Advance width of `text` at `size`, in the same unit as `size`.
    /// Non-digit characters fall back to half an em.
    pub(crate) fn text_width(&self, size: Pt, text: &str) -> Pt {
        let upem = self.units_per_em as f32;
        let mut units = 0.0f32;
        for ch in text.chars() {
            units += match ch.to_digit(10) {
                Some(d) => self.digit_advances[d as usize] as f32,
                None => upem / 2.0,
            };
        }
        size * (units / upem)
    }

    pub(crate) fn cap_height(&self, size: Pt) -> Pt {
        size * (self.cap_height as f32 / self.units_per_em as f32)
    }
}

#[derive(Debug, Default)]
pub(crate) struct FontRegistry {
    fonts: Vec<RegisteredFont>,
}

impl FontRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// The face used for all card text: the first one registered.
    pub(crate) fn primary(&self) -> Option<&RegisteredFont> {
        self.fonts.first()
    }

    pub(crate) fn register_file(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let Some(ext) = path.extension().and_then(|v| v.to_str()) else {
            return false;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" {
            return false;
        }
        let Ok(data) = std::fs::read(path) else {
            return false;
        };
        self.register_bytes(data, path.file_stem().and_then(|v| v.to_str()))
    }

    pub(crate) fn register_bytes(&mut self, data: Vec<u8>, source_name: Option<&str>) -> bool {
        let Ok(face) = ttf_parser::Face::parse(&data, 0) else {
            return false;
        };
        let Some(metrics) = FontMetrics::from_face(&face) else {
            return false;
        };
        let name = source_name.unwrap_or("embedded").to_string();
        self.fonts.push(RegisteredFont {
            name,
            data,
            metrics,
        });
        true
    }

    /// Register every usable face directly inside `path` (not recursive;
    /// explicit directories are expected to be flat).
    pub(crate) fn register_dir(&mut self, path: impl AsRef<Path>) {
        let Ok(entries) = std::fs::read_dir(path.as_ref()) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                self.register_file(path);
            }
        }
    }

    /// Walk the platform font directories for a digit-capable face.
    /// Preferred sans faces win; otherwise the first parseable file is
    /// taken. Stops as soon as one face is registered.
    pub(crate) fn register_system_fallback(&mut self) {
        if !self.is_empty() {
            return;
        }
        let dirs = system_font_dirs();
        for preferred_pass in [true, false] {
            for dir in &dirs {
                if self.scan_dir(dir, SYSTEM_SCAN_DEPTH, preferred_pass) {
                    return;
                }
            }
        }
    }

    fn scan_dir(&mut self, dir: &Path, depth: usize, preferred_only: bool) -> bool {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return false;
        };
        let mut subdirs = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                subdirs.push(path);
                continue;
            }
            if preferred_only {
                let name = entry.file_name().to_string_lossy().to_ascii_lowercase();
                if !PREFERRED_FILE_NAMES.contains(&name.as_str()) {
                    continue;
                }
            }
            if self.register_file(&path) {
                return true;
            }
        }
        if depth > 0 {
            for sub in subdirs {
                if self.scan_dir(&sub, depth - 1, preferred_only) {
                    return true;
                }
            }
        }
        false
    }
}

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    #[cfg(target_os = "windows")]
    {
        dirs.push(PathBuf::from(r"C:\Windows\Fonts"));
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".fonts"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    if let Ok(extra) = std::env::var(FONT_DIR_ENV) {
        for path in std::env::split_paths(&extra) {
            if !path.as_os_str().is_empty() {
                dirs.push(path);
            }
        }
    }

    dirs
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Best-effort registry for tests; `None` when the host has no fonts.
    pub(crate) fn host_registry() -> Option<FontRegistry> {
        let mut registry = FontRegistry::new();
        registry.register_system_fallback();
        if registry.is_empty() {
            None
        } else {
            Some(registry)
        }
    }

    #[test]
    fn rejects_non_font_files() {
        let mut registry = FontRegistry::new();
        assert!(!registry.register_file("Cargo.toml"));
        assert!(!registry.register_bytes(vec![0u8; 16], Some("garbage")));
        assert!(registry.is_empty());
    }

    #[test]
    fn digit_metrics_scale_with_size() {
        let Some(registry) = host_registry() else {
            return;
        };
        let metrics = registry.primary().unwrap().metrics;
        let at_10 = metrics.text_width(Pt::from_f32(10.0), "42");
        let at_20 = metrics.text_width(Pt::from_f32(20.0), "42");
        assert!(at_10.to_f32() > 0.0);
        assert!((at_20.to_f32() - at_10.to_f32() * 2.0).abs() < 0.1);
        assert!(metrics.cap_height(Pt::from_f32(10.0)).to_f32() > 0.0);
    }

    #[test]
    fn wider_text_measures_wider() {
        let Some(registry) = host_registry() else {
            return;
        };
        let metrics = registry.primary().unwrap().metrics;
        let size = Pt::from_f32(16.0);
        let one = metrics.text_width(size, "7");
        let two = metrics.text_width(size, "77");
        assert!(two.to_f32() > one.to_f32());
    }
}
