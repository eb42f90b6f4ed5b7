//! Shell Emitter: walks a resolved module order and writes sourcing
//! instructions for the target shell.
//!
//! The emitter never touches the filesystem; it trusts the resolved order
//! and each module's `path` field. Byte output is a pure function of the
//! input order, so the same resolved order always produces identical bytes.

use std::io::{self, Write};
use zephyr_schema::Module;

/// Target shell the emitted script is for.
///
/// zsh and bash share identical assignment/`source` syntax here, so both
/// variants emit the same bytes; the type exists to make the emitter's
/// contract (§4.3: "for `shell = bash`, identical syntax is used") explicit
/// rather than silently ignoring the distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Zsh,
    Bash,
}

/// Writes the sourcing script for `resolved` (in the given order) to
/// `sink`.
///
/// # Errors
///
/// Propagates any I/O error from writing to `sink`.
pub fn emit(resolved: &[Module], shell: Shell, sink: &mut dyn Write) -> io::Result<()> {
    let _ = shell; // zsh and bash share the emitted syntax, see [`Shell`].
    for module in resolved {
        writeln!(sink, "# === Module: {} v{} ===", module.name, module.version)?;

        for (key, value) in &module.settings {
            writeln!(
                sink,
                "export ZSH_MODULE_{}_{}=\"{}\"",
                module.name.shell_ident(),
                shell_ident(key),
                shell_escape(value)
            )?;
        }

        if let Some(pre_load) = &module.hooks.pre_load {
            writeln!(sink, "{pre_load}")?;
        }

        for file in &module.files {
            writeln!(sink, "source \"{}\"", shell_escape(&module.path.join(file).display().to_string()))?;
        }

        if let Some(post_load) = &module.hooks.post_load {
            writeln!(sink, "{post_load}")?;
        }
    }
    Ok(())
}

/// Uppercases a setting key and maps `-` to `_`, the same transform applied
/// to module names for the `ZSH_MODULE_<NAME>_<KEY>` prefix.
fn shell_ident(key: &str) -> String {
    key.chars()
        .map(|c| if c == '-' { '_' } else { c.to_ascii_uppercase() })
        .collect()
}

/// Escapes a value for embedding inside a double-quoted shell string:
/// backslash-escapes `"`, `\`, `` ` ``, and `$`.
fn shell_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '`' | '$') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use zephyr_schema::{Hooks, ModuleName, Platforms};
    use std::path::PathBuf;

    fn module() -> Module {
        Module {
            name: ModuleName::parse("git-tools").unwrap(),
            version: "1.0.0".into(),
            description: None,
            author: None,
            license: None,
            required_deps: vec![],
            optional_deps: vec![],
            platforms: Platforms::default(),
            priority: 100,
            files: vec!["init.zsh".to_string()],
            hooks: Hooks {
                pre_load: Some("git_tools_pre".to_string()),
                post_load: None,
            },
            settings: vec![("editor".to_string(), "nvim \"quoted\"".to_string())],
            path: PathBuf::from("/home/u/.zsh/modules/git-tools"),
        }
    }

    #[test]
    fn emits_header_settings_hooks_and_source_in_order() {
        let mut buf = Vec::new();
        emit(&[module()], Shell::Zsh, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# === Module: git-tools v1.0.0 ===");
        assert_eq!(lines[1], "export ZSH_MODULE_GIT_TOOLS_EDITOR=\"nvim \\\"quoted\\\"\"");
        assert_eq!(lines[2], "git_tools_pre");
        assert_eq!(lines[3], "source \"/home/u/.zsh/modules/git-tools/init.zsh\"");
    }

    #[test]
    fn same_order_produces_identical_bytes() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        emit(&[module()], Shell::Zsh, &mut a).unwrap();
        emit(&[module()], Shell::Zsh, &mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zsh_and_bash_emit_identical_syntax() {
        let mut zsh = Vec::new();
        let mut bash = Vec::new();
        emit(&[module()], Shell::Zsh, &mut zsh).unwrap();
        emit(&[module()], Shell::Bash, &mut bash).unwrap();
        assert_eq!(zsh, bash);
    }
}
