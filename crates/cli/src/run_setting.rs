// stainplan run-setting show|set|reset

use std::path::PathBuf;

use clap::{Args, Subcommand};
use stainplan_config::{parse_field_counts, RunSettingStore, RunSettingUpdate};
use stainplan_core::{RunSetting, VisualFieldConfig};
use stainplan_io::{read_run_setting, Document};

use crate::CliError;

#[derive(Args)]
pub struct StoreArgs {
    /// Run-setting record [default: <config dir>/stainplan/runsetting.json]
    #[arg(long, env = "STAINPLAN_RUN_SETTING")]
    pub config: Option<PathBuf>,
}

impl StoreArgs {
    fn store(&self) -> RunSettingStore {
        match &self.config {
            Some(p) => RunSettingStore::at(p),
            None => RunSettingStore::new(),
        }
    }
}

#[derive(Subcommand)]
pub enum RunSettingCommands {
    /// Print the stored record as JSON
    Show {
        #[command(flatten)]
        store: StoreArgs,

        /// Print the values currently in this template instead
        #[arg(long)]
        template: Option<PathBuf>,
    },

    /// Update fields of the stored record (unmentioned fields are kept)
    Set {
        #[command(flatten)]
        store: StoreArgs,

        /// Maximum number of incubation steps (0 = no limit)
        #[arg(long)]
        step_count: Option<u32>,

        #[arg(long)]
        visual_field_count: Option<u32>,

        /// Image counts NEG:POS for the next visual field, repeatable;
        /// replaces the stored list
        #[arg(long = "field", value_name = "NEG:POS", value_parser = parse_field_counts)]
        fields: Vec<VisualFieldConfig>,

        /// Remove all stored visual-field entries
        #[arg(long, conflicts_with = "fields")]
        clear_fields: bool,
    },

    /// Delete the stored record
    Reset {
        #[command(flatten)]
        store: StoreArgs,
    },
}

pub fn cmd_run_setting(command: RunSettingCommands) -> Result<(), CliError> {
    match command {
        RunSettingCommands::Show { store, template } => cmd_show(store, template),
        RunSettingCommands::Set {
            store,
            step_count,
            visual_field_count,
            fields,
            clear_fields,
        } => {
            let visual_field_configs = if clear_fields {
                Some(Vec::new())
            } else if fields.is_empty() {
                None
            } else {
                Some(fields)
            };
            let update = RunSettingUpdate { step_count, visual_field_count, visual_field_configs };
            cmd_set(store, update)
        }
        RunSettingCommands::Reset { store } => cmd_reset(store),
    }
}

fn cmd_show(store: StoreArgs, template: Option<PathBuf>) -> Result<(), CliError> {
    let setting = match template {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::missing(format!("template not found: {}", path.display())));
            }
            let doc = Document::load(&path).map_err(|e| CliError {
                code: crate::exit_codes::EXIT_TEMPLATE,
                message: format!("template {}: {}", path.display(), e),
                hint: None,
            })?;
            read_run_setting(&doc.root)
        }
        None => {
            let store = store.store();
            if !store.exists() {
                log::info!("no run setting at {}", store.path().display());
            }
            store.load()
        }
    };
    print_setting(&setting)
}

fn cmd_set(store: StoreArgs, update: RunSettingUpdate) -> Result<(), CliError> {
    if update.is_empty() {
        return Err(CliError::usage("nothing to set")
            .with_hint("pass --step-count, --visual-field-count, --field or --clear-fields"));
    }
    let store = store.store();
    let mut setting = store.load();
    update.apply(&mut setting);
    store.save(&setting)?;
    eprintln!("saved {}", store.path().display());
    print_setting(&setting)
}

fn cmd_reset(store: StoreArgs) -> Result<(), CliError> {
    let store = store.store();
    if store.reset()? {
        println!("removed {}", store.path().display());
    } else {
        println!("no run setting at {}", store.path().display());
    }
    Ok(())
}

fn print_setting(setting: &RunSetting) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(setting)
        .map_err(|e| CliError::config(format!("failed to encode run setting: {}", e)))?;
    println!("{}", json);
    Ok(())
}
