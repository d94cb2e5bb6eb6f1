mod debug_report;

use promptsync::{Context, Metadata, NodeInfo, Options, PoolScope, PoolVar, VarType, transform_verbose_with};
use std::io::{self, IsTerminal, Read};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PROMPTSYNC_LOG";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let ctx = if config.with_metadata { Context::new().with_metadata(config.metadata) } else { Context::new() };
    let res = match transform_verbose_with(&config.input, &ctx, &Options::default()) {
        Ok(res) => res,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    if config.json {
        match res.result.document.to_json() {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("error: {err}");
                std::process::exit(1);
            }
        }
        return;
    }
    debug_report::print_run(&config.input, &res, config.color);
}

struct CliConfig {
    input: String,
    metadata: Metadata,
    /// False until a `--node` or pool flag is seen; entities then render pending.
    with_metadata: bool,
    json: bool,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut input: Option<String> = None;
    let mut metadata = Metadata::new();
    let mut with_metadata = false;
    let mut json = false;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1).peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("promptsync {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--json" => json = true,
            "--node" => {
                let value = args.next().ok_or_else(|| "error: --node expects id=Title".to_string())?;
                let (id, title) = parse_node(&value)?;
                metadata = metadata.with_node(id, NodeInfo::titled(title));
                with_metadata = true;
            }
            "--env" | "--conversation" | "--rag" => {
                let value = args.next().ok_or_else(|| format!("error: {arg} expects name[:type]"))?;
                let scope = match arg.as_str() {
                    "--env" => PoolScope::Environment,
                    "--conversation" => PoolScope::Conversation,
                    _ => PoolScope::Rag,
                };
                let var = parse_pool_var(&value)?;
                let mut pool = metadata.pool(scope).map(<[PoolVar]>::to_vec).unwrap_or_default();
                pool.push(var);
                metadata = metadata.with_pool(scope, pool);
                with_metadata = true;
            }
            "--input" | "-i" => {
                let value = args.next().ok_or_else(|| "error: --input expects a value".to_string())?;
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value);
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    if input.is_some() {
                        return Err("error: input provided multiple times".to_string());
                    }
                    input = Some(rest);
                }
                break;
            }
            _ if arg.starts_with("--input=") => {
                let value = arg.trim_start_matches("--input=");
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value.to_string());
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(rest);
                break;
            }
        }
    }

    let input = match input {
        Some(value) => value,
        None => read_stdin_input()?,
    };

    if input.trim().is_empty() {
        return Err(format!("error: no input provided\n\n{}", help_text()));
    }

    Ok(CliConfig { input, metadata, with_metadata, json, color })
}

fn parse_node(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((id, title)) if !id.is_empty() => Ok((id.to_string(), title.to_string())),
        _ => Err(format!("error: invalid --node '{value}' (expected id=Title)")),
    }
}

fn parse_pool_var(value: &str) -> Result<PoolVar, String> {
    let (name, ty) = value.split_once(':').unwrap_or((value, "string"));
    if name.is_empty() {
        return Err(format!("error: invalid pool variable '{value}'"));
    }
    let var_type: VarType = serde_json::from_value(serde_json::Value::String(ty.to_string()))
        .map_err(|_| format!("error: unknown variable type '{ty}'"))?;
    Ok(PoolVar::new(name, var_type))
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "promptsync {version}

Placeholder-to-entity transform CLI.

Usage:
  promptsync [OPTIONS] [--] <input...>
  promptsync [OPTIONS] --input <text>

Options:
  -i, --input <text>         Prompt text to transform. If omitted, reads remaining
                             args or stdin when no args are provided.
  --node <id=Title>          Declare a workflow node (repeatable).
  --env <name[:type]>        Declare an environment variable (repeatable).
  --conversation <name[:type]>
                             Declare a conversation variable (repeatable).
  --rag <name[:type]>        Declare a RAG pipeline variable (repeatable).
  --json                     Print the document snapshot as JSON.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  {log_env}=<filter>     tracing filter, e.g. promptsync=debug

Exit codes:
  0  Success.
  1  Internal error.
  2  Invalid arguments or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
        log_env = LOG_ENV,
    )
}
