// Execution of parsed `bricks` commands.
//
// Each command returns an `Output` (text for stdout plus whether the command
// succeeded) or a `BrickError`; `main.rs` decides exit codes from those. No
// command prints directly, which keeps them testable.
//
// Generation stamps the map with the current UTC time (RFC 3339) and logs
// the seed it used, so any printed map can be regenerated with `--seed`.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use brick_map::config::GeneratorConfig;
use brick_map::generator::generate_map_with_retries;
use brick_map::map::BrickMap;
use brick_map::prng::BrickRng;
use brick_map::storage::{JsonFileStore, MapStore};
use brick_map::validator::validate;
use brick_map::Result;
use tracing::info;

use crate::args::{Command, GenerateArgs, StoreAction, usage};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Output {
    pub text: String,
    pub success: bool,
}

impl Output {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: true,
        }
    }
}

pub fn run(command: Command) -> Result<Output> {
    match command {
        Command::Generate(args) => generate(&args),
        Command::Validate(path) => validate_file(&path),
        Command::Describe(path) => Ok(Output::ok(read_map(&path)?.describe())),
        Command::Store { action, store } => store_action(&action, &JsonFileStore::open(store)?),
        Command::Help => Ok(Output::ok(usage())),
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn generate(args: &GenerateArgs) -> Result<Output> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::from_json(&fs::read_to_string(path)?)?,
        None => GeneratorConfig::default(),
    };
    if let Some(max_height) = args.max_height {
        config.max_height = Some(max_height);
    }
    if let Some(name) = &args.name {
        config.map_name = name.clone();
    }
    config.validate()?;

    let bricks = args.bricks.unwrap_or(config.default_bricks);
    let seed = args.seed.unwrap_or_else(clock_seed);
    info!(bricks, seed, "generating map");

    let mut rng = BrickRng::new(seed);
    let map = generate_map_with_retries(bricks, &config, &mut rng)?
        .with_timestamp(chrono::Utc::now().to_rfc3339());

    if let Some(id) = &args.save_as {
        JsonFileStore::open(&args.store)?.save(id, &map)?;
        info!(id = id.as_str(), store = %args.store.display(), "saved map");
    }
    Ok(Output::ok(map.to_json_pretty()?))
}

fn read_map(path: &Path) -> Result<BrickMap> {
    BrickMap::from_json(&fs::read_to_string(path)?)
}

fn validate_file(path: &Path) -> Result<Output> {
    let map = read_map(path)?;
    let violations = validate(&map);
    let report = serde_json::json!({
        "name": map.name(),
        "valid": violations.is_empty(),
        "violations": violations,
    });
    Ok(Output {
        text: serde_json::to_string_pretty(&report)?,
        success: violations.is_empty(),
    })
}

fn store_action(action: &StoreAction, store: &dyn MapStore) -> Result<Output> {
    match action {
        StoreAction::List => Ok(Output::ok(store.list()?.join("\n"))),
        StoreAction::Show(id) => Ok(Output::ok(store.load_existing(id)?.to_json_pretty()?)),
        StoreAction::Delete(id) => {
            store.delete(id)?;
            Ok(Output::ok(format!("Deleted map `{id}`.")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::DEFAULT_STORE;
    use brick_map::error::{BrickError, ErrorClass};
    use brick_map::types::Point;
    use std::path::PathBuf;

    fn generate_args(dir: &Path) -> GenerateArgs {
        GenerateArgs {
            bricks: Some(8),
            seed: Some(42),
            max_height: None,
            name: None,
            config: None,
            save_as: None,
            store: dir.join(DEFAULT_STORE),
        }
    }

    #[test]
    fn generate_prints_a_valid_timestamped_map() {
        let dir = tempfile::tempdir().unwrap();
        let output = run(Command::Generate(generate_args(dir.path()))).unwrap();
        assert!(output.success);

        let map = BrickMap::from_json(&output.text).unwrap();
        assert_eq!(map.brick_count(), 8);
        assert_eq!(map.name(), "generated");
        assert!(map.metadata.timestamp.is_some());
        assert!(validate(&map).is_empty());
    }

    #[test]
    fn same_seed_same_bricks() {
        let dir = tempfile::tempdir().unwrap();
        let a = run(Command::Generate(generate_args(dir.path()))).unwrap();
        let b = run(Command::Generate(generate_args(dir.path()))).unwrap();
        let a = BrickMap::from_json(&a.text).unwrap();
        let b = BrickMap::from_json(&b.text).unwrap();
        assert_eq!(a.bricks(), b.bricks());
    }

    #[test]
    fn generate_reads_config_file_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        fs::write(&config_path, r#"{"default_bricks": 5, "map_name": "from-file"}"#).unwrap();

        let mut args = generate_args(dir.path());
        args.bricks = None;
        args.config = Some(config_path);
        args.name = Some("override".into());
        let map = BrickMap::from_json(&run(Command::Generate(args)).unwrap().text).unwrap();
        assert_eq!(map.brick_count(), 5);
        assert_eq!(map.name(), "override");
    }

    #[test]
    fn generated_map_on_custom_plate_validates() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("wide.json");
        fs::write(&config_path, r#"{"baseplate_width": 9, "baseplate_depth": 7}"#).unwrap();
        let mut args = generate_args(dir.path());
        args.bricks = Some(16);
        args.config = Some(config_path);
        let generated = run(Command::Generate(args)).unwrap();

        let map_path = dir.path().join("wide_map.json");
        fs::write(&map_path, &generated.text).unwrap();
        let report = run(Command::Validate(map_path)).unwrap();
        assert!(report.success, "{}", report.text);
    }

    #[test]
    fn too_many_bricks_is_a_client_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = generate_args(dir.path());
        args.bricks = Some(29);
        let err = run(Command::Generate(args)).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Client);
    }

    #[test]
    fn generate_save_then_store_commands() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join(DEFAULT_STORE);
        let mut args = generate_args(dir.path());
        args.save_as = Some("first".into());
        let printed = run(Command::Generate(args)).unwrap();

        let listed = run(Command::Store {
            action: StoreAction::List,
            store: store.clone(),
        })
        .unwrap();
        assert_eq!(listed.text, "first");

        let shown = run(Command::Store {
            action: StoreAction::Show("first".into()),
            store: store.clone(),
        })
        .unwrap();
        assert_eq!(
            BrickMap::from_json(&shown.text).unwrap(),
            BrickMap::from_json(&printed.text).unwrap()
        );

        run(Command::Store {
            action: StoreAction::Delete("first".into()),
            store: store.clone(),
        })
        .unwrap();
        let err = run(Command::Store {
            action: StoreAction::Show("first".into()),
            store,
        })
        .unwrap_err();
        assert!(matches!(err, BrickError::MapNotFound(_)));
    }

    #[test]
    fn validate_reports_violations() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = BrickMap::new(6, 3, 6, "floating");
        map.add_brick(Point::new(0, 1, 0), 2, 2, "red").unwrap();
        let path = dir.path().join("floating.json");
        fs::write(&path, map.to_json().unwrap()).unwrap();

        let output = run(Command::Validate(path)).unwrap();
        assert!(!output.success);
        let report: serde_json::Value = serde_json::from_str(&output.text).unwrap();
        assert_eq!(report["valid"], false);
        assert_eq!(report["violations"][0]["kind"], "unsupported");
    }

    #[test]
    fn describe_lists_cells() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = BrickMap::new(6, 1, 6, "one");
        map.add_brick(Point::new(0, 0, 0), 1, 1, "blue").unwrap();
        let path = dir.path().join("one.json");
        fs::write(&path, map.to_json().unwrap()).unwrap();

        let output = run(Command::Describe(path)).unwrap();
        assert!(output.text.contains("A blue brick of size 1x1."));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = run(Command::Describe(PathBuf::from("/nonexistent/map.json"))).unwrap_err();
        assert!(matches!(err, BrickError::Io(_)));
    }
}
