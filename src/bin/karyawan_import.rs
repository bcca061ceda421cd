//! Karyawan bulk import: preview a workbook and optionally apply it.
//!
//! Usage:
//!   karyawan-import --config <config.json> --file <sheet.xlsx> --user <name> --role <id>
//!                   [--company <id>] [--department <id>] [--section <id>] [--position <id>]
//!                   [--confirm]
//!
//! Prints the preview (and, with `--confirm`, the import summary) as JSON on stdout.

use std::path::PathBuf;

use karyawan_lib::db::HrDb;
use karyawan_lib::import::{confirm_import, preview_import, read_workbook};
use karyawan_lib::scope::Caller;
use karyawan_lib::state::{AppState, RequestContext};
use karyawan_lib::types::load_config;

struct Args {
    config: PathBuf,
    file: PathBuf,
    caller: Caller,
    confirm: bool,
}

fn parse_id(flag: &str, value: Option<String>) -> anyhow::Result<i64> {
    let value = value.ok_or_else(|| anyhow::anyhow!("{flag} needs a value"))?;
    value
        .parse()
        .map_err(|e| anyhow::anyhow!("{flag} expects a numeric id, got '{value}': {e}"))
}

fn parse_args() -> anyhow::Result<Args> {
    let mut config = None;
    let mut file = None;
    let mut user = None;
    let mut role_id = None;
    let mut caller_scope = [None; 4];
    let mut confirm = false;

    let mut args = std::env::args().skip(1);
    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--config" => config = args.next().map(PathBuf::from),
            "--file" => file = args.next().map(PathBuf::from),
            "--user" => user = args.next(),
            "--role" => role_id = Some(parse_id("--role", args.next())?),
            "--company" => caller_scope[0] = Some(parse_id("--company", args.next())?),
            "--department" => caller_scope[1] = Some(parse_id("--department", args.next())?),
            "--section" => caller_scope[2] = Some(parse_id("--section", args.next())?),
            "--position" => caller_scope[3] = Some(parse_id("--position", args.next())?),
            "--confirm" => confirm = true,
            other => anyhow::bail!("Unknown argument: {other}"),
        }
    }

    let [company_id, department_id, section_id, position_id] = caller_scope;
    Ok(Args {
        config: config.ok_or_else(|| anyhow::anyhow!("--config is required"))?,
        file: file.ok_or_else(|| anyhow::anyhow!("--file is required"))?,
        caller: Caller {
            user: user.ok_or_else(|| anyhow::anyhow!("--user is required"))?,
            role_id: role_id.ok_or_else(|| anyhow::anyhow!("--role is required"))?,
            company_id,
            department_id,
            section_id,
            position_id,
        },
        confirm,
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;
    let config = load_config(&args.config)
        .map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;
    let db = HrDb::open_at(&config.database_path)
        .map_err(|e| anyhow::anyhow!("Failed to open database: {e}"))?;

    let ctx = RequestContext::resolve(&db, &config, args.caller, chrono::Utc::now())?;
    let state = AppState::new(config);

    let rows = read_workbook(&args.file)?;
    let preview = preview_import(&db, &state, &ctx, rows)?;
    println!("{}", serde_json::to_string_pretty(&preview)?);

    if args.confirm {
        let summary = confirm_import(&db, &state, &ctx, &preview.token)?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
