use crate::error::{Result, TableChartError};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

/// A parsed-once font program kept as raw bytes for glyph outlining.
#[derive(Debug, Clone)]
pub(crate) struct RegisteredFont {
    pub name: String,
    pub data: Arc<Vec<u8>>,
}

/// Fonts available to the PNG encoder, keyed by normalized family name.
#[derive(Debug, Default)]
pub(crate) struct FontRegistry {
    fonts: Vec<RegisteredFont>,
    lookup: HashMap<String, usize>,
}

impl FontRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let fallback = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("font")
            .to_string();
        let name = font_family_name(&bytes).unwrap_or(fallback);
        self.register_bytes(name, bytes)
    }

    pub(crate) fn register_bytes(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Result<()> {
        let name = name.into();
        if let Err(err) = ttf_parser::Face::parse(&bytes, 0) {
            return Err(TableChartError::invalid(format!(
                "font '{name}' cannot be parsed: {err}"
            )));
        }
        let index = self.fonts.len();
        self.lookup.insert(normalize_name(&name), index);
        self.fonts.push(RegisteredFont {
            name,
            data: Arc::new(bytes),
        });
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Resolves a CSS-style family list (`'Roboto Medium',sans-serif`) against
    /// the registered fonts, then the system font directories. When nothing
    /// matches by name, the first registered font is used.
    pub(crate) fn resolve(&self, family_list: &str) -> Option<RegisteredFont> {
        let families = split_family_list(family_list);
        for family in &families {
            if let Some(&index) = self.lookup.get(&normalize_name(family)) {
                return self.fonts.get(index).cloned();
            }
        }
        for family in &families {
            if let Some(data) = resolve_system_font_bytes(family) {
                return Some(RegisteredFont {
                    name: family.clone(),
                    data,
                });
            }
        }
        self.fonts.first().cloned()
    }
}

fn font_family_name(bytes: &[u8]) -> Option<String> {
    let face = ttf_parser::Face::parse(bytes, 0).ok()?;
    face.names()
        .into_iter()
        .filter(|name| name.name_id == ttf_parser::name_id::FULL_NAME)
        .find_map(|name| name.to_string())
}

fn split_family_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|part| part.trim().trim_matches(|c| c == '\'' || c == '"').trim())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

static SYSTEM_FONT_CACHE: OnceLock<Mutex<HashMap<String, Option<Arc<Vec<u8>>>>>> = OnceLock::new();

fn resolve_system_font_bytes(family: &str) -> Option<Arc<Vec<u8>>> {
    let key = normalize_name(family);
    if key.is_empty() {
        return None;
    }
    let cache = SYSTEM_FONT_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    if let Ok(guard) = cache.lock() {
        if let Some(entry) = guard.get(&key) {
            return entry.clone();
        }
    }

    let loaded = load_system_font(family);
    if let Ok(mut guard) = cache.lock() {
        guard.insert(key, loaded.clone());
    }
    loaded
}

fn load_system_font(family: &str) -> Option<Arc<Vec<u8>>> {
    let candidates = system_font_file_candidates(family);
    for dir in system_font_dirs() {
        for file_name in &candidates {
            let Some(path) = find_file(&dir, file_name, 3) else {
                continue;
            };
            let Ok(bytes) = fs::read(&path) else {
                continue;
            };
            if ttf_parser::Face::parse(&bytes, 0).is_ok() {
                log::debug!("resolved font '{}' to {}", family, path.display());
                return Some(Arc::new(bytes));
            }
        }
    }
    None
}

// Font directories nest vendor folders (`truetype/dejavu/...`), so search a few levels deep.
fn find_file(dir: &Path, file_name: &str, depth: usize) -> Option<PathBuf> {
    let direct = dir.join(file_name);
    if direct.is_file() {
        return Some(direct);
    }
    if depth == 0 {
        return None;
    }
    let mut subdirs: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    subdirs.sort();
    subdirs
        .iter()
        .find_map(|sub| find_file(sub, file_name, depth - 1))
}

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(extra) = std::env::var("TABLECHART_FONT_DIR") {
        for path in std::env::split_paths(&extra) {
            if !path.as_os_str().is_empty() {
                dirs.push(path);
            }
        }
    }

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
            dirs.push(PathBuf::from(&home).join(".fonts"));
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
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

    dirs
}

fn system_font_file_candidates(family: &str) -> Vec<String> {
    let generic_sans = [
        "Roboto-Medium.ttf",
        "Roboto-Regular.ttf",
        "DejaVuSans.ttf",
        "LiberationSans-Regular.ttf",
        "NotoSans-Regular.ttf",
        "arial.ttf",
        "Arial.ttf",
        "Helvetica.ttc",
    ];
    match normalize_name(family).as_str() {
        "sansserif" | "systemui" | "uisansserif" => {
            generic_sans.iter().map(|s| s.to_string()).collect()
        }
        "serif" => vec![
            "DejaVuSerif.ttf".to_string(),
            "LiberationSerif-Regular.ttf".to_string(),
            "times.ttf".to_string(),
        ],
        "monospace" => vec![
            "DejaVuSansMono.ttf".to_string(),
            "LiberationMono-Regular.ttf".to_string(),
            "consola.ttf".to_string(),
        ],
        _ => {
            // "Roboto Medium" -> Roboto-Medium.ttf, RobotoMedium.ttf
            let words: Vec<&str> = family.split_whitespace().collect();
            let mut out = Vec::new();
            if words.len() > 1 {
                out.push(format!("{}-{}.ttf", words[0], words[1..].join("")));
            }
            out.push(format!("{}.ttf", words.join("")));
            out.push(format!("{}-Regular.ttf", words.join("")));
            out
        }
    }
}
