//! Font discovery for the PDF backend.
//!
//! The PDF itself uses the built-in Helvetica and Courier faces, which need no
//! embedding but only cover Latin-1. `genpdf` still needs real glyph metrics
//! to measure text, so the metrically compatible Liberation Sans and
//! Liberation Mono TrueType files are loaded from disk.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::Error;
use genpdf::fonts::{self, Builtin, FontData, FontFamily};
use log::{debug, warn};

/// Environment variable that points at a directory holding the font files.
pub const FONTS_DIR_ENV: &str = "MDPDF_FONTS_DIR";

/// Environment variable that overrides the system font directory fallback.
pub const SYSTEM_FONTS_DIR_ENV: &str = "MDPDF_SYSTEM_FONTS_DIR";

/// Metrics family for the proportional face.
pub const SANS_FAMILY_NAME: &str = "LiberationSans";

/// Metrics family for the monospaced face.
pub const MONO_FAMILY_NAME: &str = "LiberationMono";

const STYLE_SUFFIXES: &[&str] = &["Regular", "Bold", "Italic", "BoldItalic"];

const SYSTEM_FONT_DIRECTORIES: &[&str] = &[
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/truetype/liberation2",
    "/usr/share/fonts/liberation-sans",
    "/usr/share/fonts/liberation-mono",
    "/usr/share/fonts/liberation",
    "/Library/Fonts",
];

/// The two font families the renderer needs.
pub struct FontSet {
    /// Proportional family, drawn as Helvetica.
    pub sans: FontFamily<FontData>,
    /// Monospaced family, drawn as Courier.
    pub mono: FontFamily<FontData>,
}

/// Directory next to the crate manifest where fonts can be dropped for development.
pub fn bundled_fonts_source_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var).and_then(|value| {
        let path = PathBuf::from(value);
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    })
}

fn push_unique(candidates: &mut Vec<PathBuf>, candidate: PathBuf) {
    if !candidates.iter().any(|existing| existing == &candidate) {
        candidates.push(candidate);
    }
}

fn bundled_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = env_path(FONTS_DIR_ENV) {
        candidates.push(path);
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            push_unique(&mut candidates, bin_dir.join("assets/fonts"));
        }
    }

    push_unique(&mut candidates, bundled_fonts_source_dir());
    candidates
}

fn system_directory_candidates() -> Vec<PathBuf> {
    if let Some(path) = env_path(SYSTEM_FONTS_DIR_ENV) {
        return vec![path];
    }
    SYSTEM_FONT_DIRECTORIES.iter().map(PathBuf::from).collect()
}

fn family_files(path: &Path, family: &str) -> Vec<PathBuf> {
    STYLE_SUFFIXES
        .iter()
        .map(|suffix| path.join(format!("{family}-{suffix}.ttf")))
        .collect()
}

fn missing_font_files(path: &Path, family: &str) -> Vec<PathBuf> {
    family_files(path, family)
        .into_iter()
        .filter(|candidate| !candidate.is_file())
        .collect()
}

fn find_family_directory(candidates: &[PathBuf], family: &str) -> Result<PathBuf, Vec<String>> {
    let mut attempts = Vec::new();

    for candidate in candidates {
        let exists = candidate.is_dir();
        let missing = missing_font_files(candidate, family);

        if exists && missing.is_empty() {
            return Ok(candidate.clone());
        }

        let reason = if !exists {
            "directory missing".to_owned()
        } else {
            let missing_list = missing
                .iter()
                .map(|path| path.file_name().unwrap_or_default().to_string_lossy())
                .collect::<Vec<_>>()
                .join(", ");
            format!("missing files [{}]", missing_list)
        };
        attempts.push(format!("{} ({})", candidate.display(), reason));
    }

    Err(attempts)
}

fn resolve_family_directory(family: &str) -> Result<PathBuf, Error> {
    let bundled = match find_family_directory(&bundled_directory_candidates(), family) {
        Ok(directory) => return Ok(directory),
        Err(attempts) => attempts,
    };

    match find_family_directory(&system_directory_candidates(), family) {
        Ok(directory) => {
            warn!(
                "Bundled '{}' fonts unavailable; falling back to system fonts in {}.",
                family,
                directory.display()
            );
            Ok(directory)
        }
        Err(system) => {
            let attempts = bundled.into_iter().chain(system).collect::<Vec<_>>();
            let summary = if attempts.is_empty() {
                "no search paths were available".to_owned()
            } else {
                attempts.join(", ")
            };
            Err(Error::new(
                format!(
                    "Unable to locate the '{}' font files. Checked: {}. See assets/fonts/README.md or set {}.",
                    family, summary, FONTS_DIR_ENV
                ),
                io::Error::new(io::ErrorKind::NotFound, "font directory not found"),
            ))
        }
    }
}

fn load_family(family: &str, builtin: Builtin) -> Result<FontFamily<FontData>, Error> {
    let directory = resolve_family_directory(family)?;
    debug!("loading '{}' metrics from {}", family, directory.display());

    fonts::from_files(&directory, family, Some(builtin)).map_err(|err| {
        Error::new(
            format!(
                "Failed to load font family '{}' from {}: {}",
                family,
                directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

/// Loads the metrics families backing the built-in Helvetica and Courier faces.
pub fn default_fonts() -> Result<FontSet, Error> {
    Ok(FontSet {
        sans: load_family(SANS_FAMILY_NAME, Builtin::Helvetica)?,
        mono: load_family(MONO_FAMILY_NAME, Builtin::Courier)?,
    })
}

/// Indicates whether both font families can be located on disk.
pub fn default_fonts_available() -> bool {
    [SANS_FAMILY_NAME, MONO_FAMILY_NAME]
        .iter()
        .all(|family| resolve_family_directory(family).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_files_cover_all_styles() {
        let files = family_files(Path::new("/fonts"), SANS_FAMILY_NAME);
        let names: Vec<_> = files
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "LiberationSans-Regular.ttf",
                "LiberationSans-Bold.ttf",
                "LiberationSans-Italic.ttf",
                "LiberationSans-BoldItalic.ttf",
            ]
        );
    }

    #[test]
    fn missing_directory_reports_every_attempt() {
        let candidates = vec![
            PathBuf::from("/__mdpdf_missing_a__"),
            PathBuf::from("/__mdpdf_missing_b__"),
        ];
        let attempts = find_family_directory(&candidates, MONO_FAMILY_NAME).unwrap_err();
        assert_eq!(attempts.len(), 2);
        assert!(attempts[0].contains("directory missing"));
    }

    #[test]
    fn incomplete_directory_lists_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("LiberationMono-Regular.ttf"), b"").unwrap();
        let attempts =
            find_family_directory(&[dir.path().to_path_buf()], MONO_FAMILY_NAME).unwrap_err();
        assert!(attempts[0].contains("LiberationMono-Bold.ttf"));
        assert!(!attempts[0].contains("LiberationMono-Regular.ttf"));
    }
}
