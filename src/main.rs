// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Undine-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Undine and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Undine CLI entrypoint.
//!
//! Reads Mermaid flowchart text from a file (or stdin) and prints the
//! rendered character art. `--reverse` goes the other way: rendered art in,
//! Mermaid out.

use std::error::Error;
use std::io::Read as _;

use undine::config::GraphDirection;
use undine::{render_flowchart, render_flowchart_components, reverse_flowchart, RenderConfig};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<input.mmd>] [--ascii] [--direction <LR|RL|TD|TB|BT>] [--config <file.json>]\n  {program} [<input.txt>] --reverse\n  {program} [<input.mmd>] --split-components [--gap <n>]\n\nReads from stdin when no input file is given.\n\n--ascii renders with the plain ASCII charset instead of box drawing.\n--direction overrides the direction in the Mermaid header.\n--config loads render settings from a JSON file; flags win over the file.\n--reverse treats the input as rendered character art and prints Mermaid.\n--split-components renders each connected component separately and stacks\nthem with --gap blank cells (default 1)."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    input: Option<String>,
    ascii: bool,
    direction: Option<GraphDirection>,
    config_path: Option<String>,
    reverse: bool,
    split_components: bool,
    gap: Option<usize>,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--ascii" => {
                if options.ascii {
                    return Err(());
                }
                options.ascii = true;
            }
            "--reverse" => {
                if options.reverse {
                    return Err(());
                }
                options.reverse = true;
            }
            "--split-components" => {
                if options.split_components {
                    return Err(());
                }
                options.split_components = true;
            }
            "--direction" => {
                if options.direction.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                options.direction = Some(raw.parse().map_err(|_| ())?);
            }
            "--config" => {
                if options.config_path.is_some() {
                    return Err(());
                }
                options.config_path = Some(args.next().ok_or(())?);
            }
            "--gap" => {
                if options.gap.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                options.gap = Some(raw.parse().map_err(|_| ())?);
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.input.is_some() {
                    return Err(());
                }
                options.input = Some(arg);
            }
        }
    }

    if options.reverse
        && (options.ascii
            || options.direction.is_some()
            || options.split_components
            || options.gap.is_some())
    {
        return Err(());
    }
    if options.gap.is_some() && !options.split_components {
        return Err(());
    }

    Ok(options)
}

fn read_input(input: Option<&str>) -> Result<String, Box<dyn Error>> {
    match input {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "undine".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        let text = read_input(options.input.as_deref())?;

        if options.reverse {
            print!("{}", reverse_flowchart(&text));
            return Ok(());
        }

        let mut config = match &options.config_path {
            Some(path) => serde_json::from_str::<RenderConfig>(&std::fs::read_to_string(path)?)?,
            None => RenderConfig::default(),
        };
        if options.ascii {
            config.use_ascii = true;
        }
        if options.direction.is_some() {
            config.direction = options.direction;
        }

        let rendered = if options.split_components {
            render_flowchart_components(&text, &config, options.gap.unwrap_or(1))?
        } else {
            render_flowchart(&text, &config)?
        };
        println!("{rendered}");
        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("undine: {err}");
        std::process::exit(1);
    }
}
