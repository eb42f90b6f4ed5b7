//! Manifest Parser: reads a `module.toml` and produces a [`Module`].
//!
//! The grammar is a line-oriented *subset* of TOML, not full TOML: `#`
//! comments, `[section]` headers, `key = value` pairs whose value is either
//! a quoted string, a bare integer, or a bracketed comma-separated list of
//! quoted strings. This is deliberately hand-rolled rather than delegated to
//! the `toml` crate, because the fallback rules below (non-digit integers
//! silently default, a bare scalar is tolerated as a length-1 list, unknown
//! sections/keys are ignored) are both stricter and looser than a
//! conformant TOML parser in ways that would otherwise need suppressing.

use std::path::{Path, PathBuf};
use zephyr_schema::{Hooks, Module, ModuleName, Platforms};
use zephyr_schema::error::ParseError;

/// Parses `<dir>/module.toml` into a [`Module`] anchored at `dir`.
///
/// # Errors
///
/// Returns [`ParseError::FileNotFound`] if the manifest is absent,
/// [`ParseError::FileReadError`] if it cannot be read, and
/// [`ParseError::InvalidSchema`] if `module.name` is missing or invalid.
/// Malformed individual lines are tolerated (ignored), per the grammar's
/// forward-compatibility rule; only a missing name is a hard failure.
pub fn parse_module(dir: &Path) -> Result<Module, ParseError> {
    let manifest_path = dir.join("module.toml");
    if !manifest_path.exists() {
        return Err(ParseError::FileNotFound(manifest_path));
    }
    let text = std::fs::read_to_string(&manifest_path).map_err(|source| ParseError::FileReadError {
        path: manifest_path.clone(),
        source,
    })?;

    let doc = parse_document(&text);
    build_module(doc, dir, &manifest_path)
}

/// One `[section]` block: an ordered list of `(key, RawValue)` pairs.
#[derive(Debug, Default)]
struct Section {
    entries: Vec<(String, RawValue)>,
}

impl Section {
    fn get(&self, key: &str) -> Option<&RawValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

#[derive(Debug, Clone)]
enum RawValue {
    Str(String),
    Int(i64),
    List(Vec<String>),
}

impl RawValue {
    fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    fn as_list(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.clone(),
            Self::Str(s) => vec![s.clone()],
            Self::Int(n) => vec![n.to_string()],
        }
    }
}

fn parse_document(text: &str) -> Vec<(String, Section)> {
    let mut sections: Vec<(String, Section)> = Vec::new();
    let mut current: Option<(String, Section)> = None;

    for raw_line in text.lines() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = parse_section_header(line) {
            if let Some(done) = current.take() {
                sections.push(done);
            }
            current = Some((header, Section::default()));
            continue;
        }

        let Some((key, value)) = parse_key_value(line) else {
            continue;
        };
        if let Some((_, section)) = current.as_mut() {
            section.entries.push((key, value));
        }
        // A key=value line before any [section] header has no home; the
        // grammar has no top-level keys, so it is silently ignored.
    }

    if let Some(done) = current.take() {
        sections.push(done);
    }
    sections
}

fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes => return &line[..i],
            _ => {}
        }
    }
    line
}

fn parse_section_header(line: &str) -> Option<String> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?;
    let name = inner.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn parse_key_value(line: &str) -> Option<(String, RawValue)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let value = value.trim();
    Some((key.to_string(), parse_value(value)))
}

fn parse_value(value: &str) -> RawValue {
    if let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        let items = inner
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(unquote)
            .collect();
        return RawValue::List(items);
    }

    if let Some(unquoted) = try_unquote(value) {
        return RawValue::Str(unquoted);
    }

    // Greedy decimal integer parse: if the whole trimmed value is digits
    // (optionally signed), parse it; any non-digit anywhere falls back to
    // treating it as a bare (unquoted) string value instead.
    if value.chars().all(|c| c.is_ascii_digit())
        || (value.starts_with('-') && value[1..].chars().all(|c| c.is_ascii_digit()) && value.len() > 1)
    {
        if let Ok(n) = value.parse::<i64>() {
            return RawValue::Int(n);
        }
    }

    RawValue::Str(value.to_string())
}

fn try_unquote(value: &str) -> Option<String> {
    let value = value.trim();
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        Some(value[1..value.len() - 1].to_string())
    } else {
        None
    }
}

fn unquote(value: &str) -> String {
    try_unquote(value).unwrap_or_else(|| value.to_string())
}

fn build_module(doc: Vec<(String, Section)>, dir: &Path, manifest_path: &Path) -> Result<Module, ParseError> {
    let find = |name: &str| doc.iter().find(|(n, _)| n == name).map(|(_, s)| s);

    let module_section = find("module");
    let name_raw = module_section
        .and_then(|s| s.get("name"))
        .and_then(RawValue::as_str)
        .unwrap_or_default();

    if name_raw.trim().is_empty() {
        return Err(ParseError::InvalidSchema {
            path: manifest_path.to_path_buf(),
            reason: "module.name is required and must be non-empty".to_string(),
        });
    }
    let name = ModuleName::parse(name_raw.trim()).map_err(|e| ParseError::InvalidSchema {
        path: manifest_path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let version = module_section
        .and_then(|s| s.get("version"))
        .and_then(RawValue::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| Module::DEFAULT_VERSION.to_string());
    let description = module_section
        .and_then(|s| s.get("description"))
        .and_then(RawValue::as_str)
        .map(str::to_string);
    let author = module_section
        .and_then(|s| s.get("author"))
        .and_then(RawValue::as_str)
        .map(str::to_string);
    let license = module_section
        .and_then(|s| s.get("license"))
        .and_then(RawValue::as_str)
        .map(str::to_string);

    let deps_section = find("dependencies");
    let required_deps = parse_name_list(deps_section, "required");
    let optional_deps = parse_name_list(deps_section, "optional");

    let platforms_section = find("platforms");
    let platforms = Platforms {
        os: platforms_section.map(|s| s.get("os").map(RawValue::as_list).unwrap_or_default()).unwrap_or_default(),
        arch: platforms_section.map(|s| s.get("arch").map(RawValue::as_list).unwrap_or_default()).unwrap_or_default(),
        shell: platforms_section
            .and_then(|s| s.get("shell"))
            .and_then(RawValue::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        min_version: platforms_section
            .and_then(|s| s.get("min_version"))
            .and_then(RawValue::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    };

    let load_section = find("load");
    let priority = load_section
        .and_then(|s| s.get("priority"))
        .and_then(RawValue::as_int)
        .unwrap_or(Module::DEFAULT_PRIORITY);
    let files = load_section.map(|s| s.get("files").map(RawValue::as_list).unwrap_or_default()).unwrap_or_default();

    let hooks_section = find("hooks");
    let hooks = Hooks {
        pre_load: hooks_section
            .and_then(|s| s.get("pre_load"))
            .and_then(RawValue::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        post_load: hooks_section
            .and_then(|s| s.get("post_load"))
            .and_then(RawValue::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    };

    let settings = find("settings")
        .map(|s| {
            dedup_settings(
                s.entries
                    .iter()
                    .map(|(k, v)| (k.clone(), raw_value_as_setting(v)))
                    .collect(),
            )
        })
        .unwrap_or_default();

    Ok(Module {
        name,
        version,
        description,
        author,
        license,
        required_deps: dedup_names(required_deps),
        optional_deps: dedup_names(optional_deps),
        platforms,
        priority,
        files,
        hooks,
        settings,
        path: dir.to_path_buf(),
    })
}

fn raw_value_as_setting(value: &RawValue) -> String {
    match value {
        RawValue::Str(s) => s.clone(),
        RawValue::Int(n) => n.to_string(),
        RawValue::List(items) => items.join(","),
    }
}

fn parse_name_list(section: Option<&Section>, key: &str) -> Vec<ModuleName> {
    section
        .and_then(|s| s.get(key))
        .map(RawValue::as_list)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|raw| ModuleName::parse(&raw).ok())
        .collect()
}

fn dedup_names(names: Vec<ModuleName>) -> Vec<ModuleName> {
    let mut seen = std::collections::HashSet::new();
    names.into_iter().filter(|n| seen.insert(n.clone())).collect()
}

/// Dedupes `[settings]` entries on key, last-write-wins (matching TOML table
/// semantics), keeping each key at the position of its first occurrence so
/// emission order stays stable regardless of which duplicate supplied the
/// final value.
fn dedup_settings(entries: Vec<(String, String)>) -> Vec<(String, String)> {
    let mut order: Vec<String> = Vec::new();
    let mut values: std::collections::HashMap<String, String> = std::collections::HashMap::new();
    for (key, value) in entries {
        if !values.contains_key(&key) {
            order.push(key.clone());
        }
        values.insert(key, value);
    }
    order
        .into_iter()
        .map(|key| {
            let value = values.remove(&key).unwrap_or_default();
            (key, value)
        })
        .collect()
}

/// Convenience wrapper returning the manifest path a [`parse_module`] call
/// would use for `dir`, without reading or parsing it.
#[must_use]
pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join("module.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_manifest(dir: &Path, contents: &str) {
        let mut f = std::fs::File::create(dir.join("module.toml")).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn parses_full_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        write_manifest(
            tmp.path(),
            r#"
            [module]
            name = "git-tools"
            version = "1.2.0"
            description = "Git helpers"

            [dependencies]
            required = ["core", "utils"]
            optional = ["fzf"]

            [platforms]
            os = ["linux", "darwin"]
            arch = ["amd64", "arm64"]
            shell = "zsh"
            min_version = "5.8"

            [load]
            priority = 20
            files = ["init.zsh", "aliases.zsh"]

            [hooks]
            pre_load = "git_tools_pre"
            post_load = "git_tools_post"

            [settings]
            editor = "nvim"
            "#,
        );

        let module = parse_module(tmp.path()).unwrap();
        assert_eq!(module.name.as_str(), "git-tools");
        assert_eq!(module.version, "1.2.0");
        assert_eq!(module.required_deps.len(), 2);
        assert_eq!(module.optional_deps.len(), 1);
        assert_eq!(module.platforms.os, vec!["linux", "darwin"]);
        assert_eq!(module.priority, 20);
        assert_eq!(module.files, vec!["init.zsh", "aliases.zsh"]);
        assert_eq!(module.hooks.pre_load.as_deref(), Some("git_tools_pre"));
        assert_eq!(module.settings, vec![("editor".to_string(), "nvim".to_string())]);
    }

    #[test]
    fn missing_name_is_invalid_schema() {
        let tmp = tempfile::tempdir().unwrap();
        write_manifest(tmp.path(), "[module]\nversion = \"1.0\"\n");
        let err = parse_module(tmp.path()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidSchema { .. }));
    }

    #[test]
    fn missing_manifest_is_file_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let err = parse_module(tmp.path()).unwrap_err();
        assert!(matches!(err, ParseError::FileNotFound(_)));
    }

    #[test]
    fn non_digit_priority_falls_back_to_default() {
        let tmp = tempfile::tempdir().unwrap();
        write_manifest(
            tmp.path(),
            "[module]\nname = \"x\"\n[load]\npriority = abc\n",
        );
        let module = parse_module(tmp.path()).unwrap();
        assert_eq!(module.priority, Module::DEFAULT_PRIORITY);
    }

    #[test]
    fn bare_scalar_is_treated_as_length_one_list() {
        let tmp = tempfile::tempdir().unwrap();
        write_manifest(
            tmp.path(),
            "[module]\nname = \"x\"\n[dependencies]\nrequired = \"core\"\n",
        );
        let module = parse_module(tmp.path()).unwrap();
        assert_eq!(module.required_deps, vec![ModuleName::parse("core").unwrap()]);
    }

    #[test]
    fn unknown_sections_and_keys_are_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        write_manifest(
            tmp.path(),
            "[module]\nname = \"x\"\nfrobnicate = \"yes\"\n[bogus]\nkey = \"value\"\n",
        );
        let module = parse_module(tmp.path()).unwrap();
        assert_eq!(module.name.as_str(), "x");
    }

    #[test]
    fn duplicate_deps_are_deduplicated() {
        let tmp = tempfile::tempdir().unwrap();
        write_manifest(
            tmp.path(),
            "[module]\nname = \"x\"\n[dependencies]\nrequired = [\"a\", \"a\", \"b\"]\n",
        );
        let module = parse_module(tmp.path()).unwrap();
        assert_eq!(module.required_deps.len(), 2);
    }

    #[test]
    fn duplicate_settings_keys_keep_last_value_at_first_position() {
        let tmp = tempfile::tempdir().unwrap();
        write_manifest(
            tmp.path(),
            "[module]\nname = \"x\"\n[settings]\neditor = \"vim\"\ntheme = \"dark\"\neditor = \"nvim\"\n",
        );
        let module = parse_module(tmp.path()).unwrap();
        assert_eq!(
            module.settings,
            vec![("editor".to_string(), "nvim".to_string()), ("theme".to_string(), "dark".to_string())]
        );
    }

    #[test]
    fn no_string_sharing_across_parses() {
        let tmp = tempfile::tempdir().unwrap();
        write_manifest(tmp.path(), "[module]\nname = \"x\"\n");
        let a = parse_module(tmp.path()).unwrap();
        let b = parse_module(tmp.path()).unwrap();
        assert_eq!(a, b);
    }
}
