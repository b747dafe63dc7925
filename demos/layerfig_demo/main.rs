//! # layerfig demo application
//!
//! A small CLI that declares a schema, resolves it from every layer, and
//! prints the result. It exists to exercise the crate by hand.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example layerfig_demo
//! cargo run --example layerfig_demo -- --server.port 9000 -v
//! ```
//!
//! | Feature            | How to exercise it                                                    |
//! |--------------------|-----------------------------------------------------------------------|
//! | Option defaults    | `cargo run --example layerfig_demo`                                   |
//! | Config file (cwd)  | Create `layerfig-demo.toml` in cwd, then run                          |
//! | Config file (home) | Place the file under `~/.layerfig-demo/`                              |
//! | Env var override   | `LAYERFIG_DEMO__DISPLAY__COLOR=red cargo run --example layerfig_demo` |
//! | Long flag          | `cargo run --example layerfig_demo -- --display.format plain`         |
//! | Short flag         | `cargo run --example layerfig_demo -- -v`                             |
//! | Write config       | `cargo run --example layerfig_demo -- --write json`                   |

mod schema;

use std::io;

use layerfig::{Format, Layerfig, LayerfigError, Resolved, SearchPath};

fn ansi_color_code(name: &str) -> &str {
    match name {
        "red" => "\x1b[31m",
        "green" => "\x1b[32m",
        "yellow" => "\x1b[33m",
        "blue" => "\x1b[34m",
        "magenta" => "\x1b[35m",
        "cyan" => "\x1b[36m",
        _ => "\x1b[0m",
    }
}

const RESET: &str = "\x1b[0m";

fn text<'a>(config: &'a Resolved, key: &str) -> Result<&'a str, LayerfigError> {
    Ok(config.get(key)?.as_str().unwrap_or_default())
}

fn echo_all(config: &Resolved) -> Result<(), LayerfigError> {
    let color = ansi_color_code(text(config, "display.color")?);
    let plain = text(config, "display.format")? == "plain";

    if config.get("verbose")?.as_bool() == Some(true) {
        println!("{color}[verbose] Resolved configuration{RESET}");
        for unused in config.unused() {
            println!("{color}[verbose] ignored {} from {}{RESET}", unused.key, unused.origin);
        }
        println!();
    }

    let entries: Vec<(String, String)> = config
        .config()
        .leaves()
        .map(|entry| {
            let value = entry
                .option
                .value()
                .map(|v| entry.option.render(v))
                .unwrap_or_default();
            (entry.path, value)
        })
        .collect();

    if plain {
        for (key, value) in &entries {
            println!("{key}={value}");
        }
    } else {
        let width = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in &entries {
            println!("{color}{key:<width$}{RESET}  {value}");
        }
    }
    Ok(())
}

fn run() -> Result<(), LayerfigError> {
    let config = Layerfig::builder()
        .schema(schema::demo_schema()?)
        .app_name("layerfig-demo")
        .env_prefix("LAYERFIG_DEMO")
        .search_paths(vec![
            SearchPath::Platform,
            SearchPath::Home(".layerfig-demo"),
            SearchPath::Cwd,
        ])
        .argv(std::env::args().skip(1))
        .resolve()?;

    match text(&config, "write")? {
        "" => echo_all(&config),
        format => config.write(format.parse::<Format>()?, &mut io::stdout()),
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Failed to load config:\n{e}");
        std::process::exit(1);
    }
}
