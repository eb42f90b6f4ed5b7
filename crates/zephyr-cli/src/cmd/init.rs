//! `zephyr init <name>`: scaffold a new module directory.
//!
//! Full scaffolding (templates, interactive prompts) is out of scope; this
//! presents the command's interface and produces the minimal manifest a
//! module needs to be discoverable.

use crate::exit;
use zephyr_schema::ModuleName;

pub fn init(name: &str) -> i32 {
    let Ok(module_name) = ModuleName::parse(name) else {
        eprintln!("zephyr: {name:?} is not a valid module name");
        return exit::INVALID_ARGS;
    };

    let dir = std::path::Path::new(&module_name);
    if dir.exists() {
        eprintln!("zephyr: {} already exists", dir.display());
        return exit::FAILURE;
    }

    if let Err(err) = std::fs::create_dir_all(dir) {
        eprintln!("zephyr: failed to create {}: {err}", dir.display());
        return exit::FAILURE;
    }

    let manifest = format!(
        "[module]\nname = \"{module_name}\"\nversion = \"0.1.0\"\n\n[load]\nfiles = [\"init.zsh\"]\n"
    );
    if let Err(err) = std::fs::write(dir.join("module.toml"), manifest) {
        eprintln!("zephyr: failed to write module.toml: {err}");
        return exit::FAILURE;
    }
    if let Err(err) = std::fs::write(dir.join("init.zsh"), "# new module\n") {
        eprintln!("zephyr: failed to write init.zsh: {err}");
        return exit::FAILURE;
    }

    println!("created {}", dir.display());
    exit::OK
}
