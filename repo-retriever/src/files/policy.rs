//! Which files are kept, and how important they are.

/// Extensions (lowercase, with dot) whose files are never treated as text.
pub const BINARY_EXTENSIONS: &[&str] = &[
    // Images
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".ico", ".webp", ".tiff", ".tga",
    // Audio
    ".mp3", ".wav", ".flac", ".aac", ".ogg", ".wma", ".m4a",
    // Video
    ".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm", ".m4v",
    // Archives
    ".zip", ".tar", ".gz", ".bz2", ".xz", ".7z", ".rar",
    // Executables
    ".exe", ".dll", ".so", ".dylib", ".app", ".deb", ".rpm", ".msi", ".dmg",
    // Documents
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx",
    // Fonts
    ".ttf", ".otf", ".woff", ".woff2", ".eot",
    // Databases
    ".db", ".sqlite", ".sqlite3", ".mdb",
    // Other
    ".bin", ".dat", ".dump", ".img", ".iso", ".lock",
];

/// Path segments (lowercase) that exclude everything beneath them.
pub const EXCLUDED_DIRECTORIES: &[&str] = &[
    ".git", ".svn", ".hg", ".bzr",
    "node_modules", "__pycache__", ".pytest_cache", "venv", ".venv", "env", ".env",
    "build", "dist", "target", "out", "bin", "obj",
    ".idea", ".vscode", ".vs",
    "logs", "log", "tmp", "temp",
    ".tox", ".coverage", ".nyc_output",
    "vendor", "pods", ".next", ".nuxt", ".cache",
];

/// Priority given to files matching no rule.
pub const DEFAULT_PRIORITY: u32 = 100;

/// Exact file names (lowercase).
const FILE_NAME_PRIORITIES: &[(&str, u32)] = &[
    // Entry points
    ("main.py", 1000), ("app.py", 1000), ("index.js", 1000), ("index.ts", 1000),
    ("server.js", 1000), ("run.py", 1000), ("__main__.py", 1000), ("manage.py", 1000),
    ("cli.py", 950), ("wsgi.py", 950), ("asgi.py", 950),
    // Manifests and build files
    ("package.json", 900), ("pyproject.toml", 900), ("setup.py", 900),
    ("requirements.txt", 900), ("dockerfile", 900), ("docker-compose.yml", 900),
    ("makefile", 900), ("cmakelists.txt", 900), ("cargo.toml", 900), ("go.mod", 900),
    // Documentation
    ("readme.md", 800), ("readme.txt", 800), ("license", 800), ("license.txt", 800),
    ("license.md", 800), ("changelog.md", 800), ("contributing.md", 800),
    ("docs.md", 750), ("api.md", 750),
];

/// Directory segments, checked in order; the first match wins.
const DIRECTORY_PRIORITIES: &[(&str, u32)] = &[
    ("/src/", 700), ("/lib/", 600), ("/app/", 650), ("/core/", 620),
    ("/utils/", 580), ("/components/", 580), ("/modules/", 580), ("/api/", 620),
    ("/test/", 400), ("/tests/", 400), ("/spec/", 400),
    ("/.github/", 300), ("/scripts/", 300), ("/build/", 200), ("/dist/", 200),
    ("/node_modules/", 50), ("/.git/", 50), ("/__pycache__/", 50),
    ("/.pytest_cache/", 50), ("/venv/", 50), ("/.venv/", 50),
];

/// File name fragments.
const NAME_FRAGMENT_PRIORITIES: &[(&str, u32)] = &[("test_", 400), ("_test.", 400)];

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Whether any segment of `path` is an excluded directory name.
#[must_use]
pub fn is_excluded_path(path: &str) -> bool {
    path.split('/')
        .any(|segment| EXCLUDED_DIRECTORIES.contains(&segment.to_ascii_lowercase().as_str()))
}

/// Whether the file's last extension is classified binary.
#[must_use]
pub fn is_binary_path(path: &str) -> bool {
    let name = file_name(path).to_ascii_lowercase();
    match name.rfind('.') {
        // A leading dot alone (".gitignore") is not an extension.
        Some(0) | None => false,
        Some(index) => BINARY_EXTENSIONS.contains(&&name[index..]),
    }
}

/// Scores a path: exact names, then directory segments, then name fragments.
#[must_use]
pub fn file_priority(path: &str) -> u32 {
    let lower = path.to_ascii_lowercase();
    let name = file_name(&lower);

    if let Some((_, priority)) = FILE_NAME_PRIORITIES.iter().find(|(n, _)| *n == name) {
        return *priority;
    }

    let rooted = format!("/{lower}");
    if let Some((_, priority)) = DIRECTORY_PRIORITIES
        .iter()
        .find(|(segment, _)| rooted.contains(segment))
    {
        return *priority;
    }

    NAME_FRAGMENT_PRIORITIES
        .iter()
        .find(|(fragment, _)| name.contains(fragment))
        .map_or(DEFAULT_PRIORITY, |(_, priority)| *priority)
}
