// Command-line parsing for `bricks`.
//
// Hand-rolled `std::env::args()` matching, no clap. Parsing is separated from
// execution so it can be unit tested: `parse_args()` turns an argument list
// into a `Command`, or a usage message explaining what was wrong.

use std::path::PathBuf;

/// Default location of the file-backed map store.
pub const DEFAULT_STORE: &str = "maps_store.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerateArgs {
    /// Brick count; falls back to the config's `default_bricks`.
    pub bricks: Option<usize>,
    /// PRNG seed; falls back to the clock.
    pub seed: Option<u64>,
    pub max_height: Option<u32>,
    pub name: Option<String>,
    pub config: Option<PathBuf>,
    /// Save under this id in `store` as well as printing.
    pub save_as: Option<String>,
    pub store: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreAction {
    List,
    Show(String),
    Delete(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Generate(GenerateArgs),
    Validate(PathBuf),
    Describe(PathBuf),
    Store { action: StoreAction, store: PathBuf },
    Help,
}

/// Parse everything after the program name.
pub fn parse_args(args: &[String]) -> Result<Command, String> {
    let Some((command, rest)) = args.split_first() else {
        return Ok(Command::Help);
    };
    match command.as_str() {
        "generate" => parse_generate(rest).map(Command::Generate),
        "validate" => single_path(rest, "validate").map(Command::Validate),
        "describe" => single_path(rest, "describe").map(Command::Describe),
        "store" => parse_store(rest),
        "--help" | "-h" | "help" => Ok(Command::Help),
        other => Err(format!("Unknown command: {other}")),
    }
}

fn value<'a>(rest: &'a [String], i: usize, flag: &str) -> Result<&'a String, String> {
    rest.get(i).ok_or_else(|| format!("{flag} requires a value"))
}

fn number<T: std::str::FromStr>(rest: &[String], i: usize, flag: &str) -> Result<T, String> {
    value(rest, i, flag)?
        .parse()
        .map_err(|_| format!("{flag} requires a valid number"))
}

fn parse_generate(rest: &[String]) -> Result<GenerateArgs, String> {
    let mut args = GenerateArgs {
        bricks: None,
        seed: None,
        max_height: None,
        name: None,
        config: None,
        save_as: None,
        store: PathBuf::from(DEFAULT_STORE),
    };
    let mut i = 0;
    while i < rest.len() {
        let flag = rest[i].as_str();
        i += 1;
        match flag {
            "--bricks" | "-n" => args.bricks = Some(number(rest, i, flag)?),
            "--seed" => args.seed = Some(number(rest, i, flag)?),
            "--max-height" => args.max_height = Some(number(rest, i, flag)?),
            "--name" => args.name = Some(value(rest, i, flag)?.clone()),
            "--config" => args.config = Some(PathBuf::from(value(rest, i, flag)?)),
            "--save-as" => args.save_as = Some(value(rest, i, flag)?.clone()),
            "--store" => args.store = PathBuf::from(value(rest, i, flag)?),
            other => return Err(format!("Unknown argument: {other}")),
        }
        i += 1;
    }
    Ok(args)
}

fn single_path(rest: &[String], command: &str) -> Result<PathBuf, String> {
    match rest {
        [path] => Ok(PathBuf::from(path)),
        _ => Err(format!("{command} takes exactly one map file")),
    }
}

fn parse_store(rest: &[String]) -> Result<Command, String> {
    let mut store = PathBuf::from(DEFAULT_STORE);
    let mut positional = Vec::new();
    let mut i = 0;
    while i < rest.len() {
        if rest[i] == "--store" {
            store = PathBuf::from(value(rest, i + 1, "--store")?);
            i += 2;
        } else {
            positional.push(rest[i].as_str());
            i += 1;
        }
    }
    let action = match positional.as_slice() {
        ["list"] => StoreAction::List,
        ["show", id] => StoreAction::Show((*id).to_owned()),
        ["delete", id] => StoreAction::Delete((*id).to_owned()),
        _ => return Err("store expects `list`, `show <id>`, or `delete <id>`".into()),
    };
    Ok(Command::Store { action, store })
}

pub fn usage() -> &'static str {
    "Usage: bricks <COMMAND> [OPTIONS]

Commands:
  generate                Generate a random brick map and print it as JSON
    --bricks, -n <N>      Number of bricks (default: from config, 12)
    --seed <SEED>         PRNG seed (default: derived from the clock)
    --max-height <H>      Cap on the number of layers (default: none)
    --name <NAME>         Map name (default: from config)
    --config <FILE>       Generator config JSON
    --save-as <ID>        Also save the map under ID in the store
    --store <FILE>        Store file (default: maps_store.json)
  validate <FILE>         Check a map file for overlaps and unsupported bricks
  describe <FILE>         Print a map's occupied cells layer by layer
  store list              List stored map ids
  store show <ID>         Print a stored map
  store delete <ID>       Delete a stored map
    --store <FILE>        Store file (default: maps_store.json)
  help, --help, -h        Show this help"
}
