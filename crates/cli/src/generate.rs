// stainplan generate

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use stainplan_config::paths::{self, MAPPER_FILE, TEMPLATE_FILE};
use stainplan_config::RunSettingStore;
use stainplan_engine::{LayoutPreset, Plan, TableLayout};
use stainplan_io::{generate, prepare, GenerateRequest, PatchReport};

use crate::CliError;

#[derive(Args)]
pub struct GenerateArgs {
    /// Plan table (.xlsx, .xls, .xlsb, .ods, .csv, .tsv)
    pub table: PathBuf,

    /// Working directory for relative paths
    #[arg(long, short = 'C', default_value = ".")]
    pub workdir: PathBuf,

    /// Template XML [default: template_base.xml]
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Dye-to-filter mapping JSON [default: mapper.json]
    #[arg(long)]
    pub mapper: Option<PathBuf>,

    /// Run-setting record [default: <config dir>/stainplan/runsetting.json]
    #[arg(long, env = "STAINPLAN_RUN_SETTING")]
    pub config: Option<PathBuf>,

    /// Ignore any run-setting record
    #[arg(long)]
    pub no_run_setting: bool,

    /// Table layout file (TOML)
    #[arg(long, conflicts_with = "preset")]
    pub layout: Option<PathBuf>,

    /// Built-in table layout [default: single-sheet]
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Worksheet to read (overrides the layout's sheet)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Output path [default: the table path with an .xml extension]
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Build the document but do not write it
    #[arg(long)]
    pub dry_run: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PresetArg {
    SingleSheet,
    MultiSheet,
}

impl From<PresetArg> for LayoutPreset {
    fn from(p: PresetArg) -> Self {
        match p {
            PresetArg::SingleSheet => LayoutPreset::SingleSheet,
            PresetArg::MultiSheet => LayoutPreset::MultiSheet,
        }
    }
}

pub fn cmd_generate(args: GenerateArgs) -> Result<(), CliError> {
    let workdir = &args.workdir;
    if !workdir.is_dir() {
        return Err(CliError::usage(format!(
            "working directory not found: {}",
            workdir.display()
        )));
    }

    let resolve = |p: &Path| paths::resolve(workdir, p);
    let template = args
        .template
        .as_deref()
        .map(resolve)
        .unwrap_or_else(|| paths::find_asset(workdir, TEMPLATE_FILE));
    let mapper = args
        .mapper
        .as_deref()
        .map(resolve)
        .unwrap_or_else(|| paths::find_asset(workdir, MAPPER_FILE));

    let layout = load_layout(args.layout.as_deref().map(resolve), args.preset)?;
    log::info!("using layout '{}'", layout.name);

    let run_setting = if args.no_run_setting {
        None
    } else {
        let store = match args.config.as_deref() {
            Some(p) => RunSettingStore::at(resolve(p)),
            None => RunSettingStore::new(),
        };
        store.load_optional()
    };

    let request = GenerateRequest {
        table: resolve(&args.table),
        template,
        mapper,
        output: args.output.as_deref().map(resolve),
        sheet: args.sheet.clone(),
        layout,
        run_setting,
    };

    if args.dry_run {
        let prepared = prepare(&request).map_err(CliError::generate)?;
        print_summary(&prepared.output, &prepared.plan, &prepared.patch, true, args.json);
    } else {
        let report = generate(&request).map_err(CliError::generate)?;
        print_summary(&report.output, &report.plan, &report.patch, false, args.json);
    }
    Ok(())
}

fn load_layout(path: Option<PathBuf>, preset: Option<PresetArg>) -> Result<TableLayout, CliError> {
    let Some(path) = path else {
        let preset: LayoutPreset = preset.unwrap_or(PresetArg::SingleSheet).into();
        return Ok(preset.layout());
    };
    if !path.exists() {
        return Err(CliError::missing(format!("layout file not found: {}", path.display())));
    }
    let content = std::fs::read_to_string(&path)
        .map_err(|e| CliError::config(format!("failed to read {}: {}", path.display(), e)))?;
    TableLayout::from_toml(&content)
        .map_err(|e| CliError::config(format!("{}: {}", path.display(), e)))
}

fn print_summary(output: &Path, plan: &Plan, patch: &PatchReport, dry_run: bool, json: bool) {
    if json {
        let summary = serde_json::json!({
            "output": output.display().to_string(),
            "written": !dry_run,
            "layout": plan.layout,
            "rows": plan.rows,
            "step_keys": plan.groups_found,
            "steps": plan.steps.len(),
            "channel_steps": plan.channel_count(),
            "prep_steps": plan.prep_count(),
            "run_setting": {
                "written": patch.written,
                "skipped": patch.skipped,
            },
        });
        println!("{}", summary);
        return;
    }

    let verb = if dry_run { "would write" } else { "wrote" };
    println!(
        "{} {}: {} incubation step(s), {} channel step(s) ({} prep)",
        verb,
        output.display(),
        plan.steps.len(),
        plan.channel_count(),
        plan.prep_count()
    );
    if plan.groups_found > plan.steps.len() {
        println!(
            "  step count {} of {} step keys in the table",
            plan.steps.len(),
            plan.groups_found
        );
    }
    if patch.written > 0 || patch.skipped > 0 {
        println!(
            "  run setting: {} field(s) applied, {} not in template",
            patch.written, patch.skipped
        );
    }
}
