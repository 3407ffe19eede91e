// Generate pipeline: template + table + mapper -> instrument document

use std::path::{Path, PathBuf};

use stainplan_core::RunSetting;
use stainplan_engine::{DyeFilterMap, Plan, TableLayout};

use crate::error::GenerateError;
use crate::patch::{apply_run_setting, PatchReport};
use crate::render::append_steps;
use crate::table::load_table;
use crate::xml::Document;

/// Everything one generate run needs. Paths are used as given; resolving
/// them against a working directory is the caller's job.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub table: PathBuf,
    pub template: PathBuf,
    pub mapper: PathBuf,
    /// Defaults to the table path with an `.xml` extension.
    pub output: Option<PathBuf>,
    /// Overrides the layout's sheet.
    pub sheet: Option<String>,
    pub layout: TableLayout,
    pub run_setting: Option<RunSetting>,
}

impl GenerateRequest {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.table))
    }
}

/// A fully built document that has not been written yet.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub document: Document,
    pub plan: Plan,
    pub patch: PatchReport,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub output: PathBuf,
    pub plan: Plan,
    pub patch: PatchReport,
}

/// `plan.xlsx` -> `plan.xml`, next to the input.
pub fn default_output_path(table: &Path) -> PathBuf {
    table.with_extension("xml")
}

/// Run every stage except the final write.
///
/// Order: template, dye mapping, table. Any failure aborts before output is
/// touched.
pub fn prepare(request: &GenerateRequest) -> Result<Prepared, GenerateError> {
    let mut document = load_template(&request.template)?;
    let mapper = load_mapper(&request.mapper)?;

    let patch = match &request.run_setting {
        Some(setting) => apply_run_setting(&mut document.root, setting),
        None => PatchReport::default(),
    };

    let sheet = request.sheet.as_deref().or(request.layout.sheet.as_deref());
    let table = load_table(&request.table, sheet)?;

    let ceiling = request.run_setting.as_ref().and_then(RunSetting::step_ceiling);
    let plan = stainplan_engine::run(&table, &request.layout, &mapper, ceiling).map_err(|source| {
        GenerateError::Plan { path: request.table.clone(), source }
    })?;

    append_steps(&mut document.root, &plan.steps);

    Ok(Prepared { document, plan, patch, output: request.output_path() })
}

/// Build the document and write it atomically to the output path.
pub fn generate(request: &GenerateRequest) -> Result<GenerateReport, GenerateError> {
    let Prepared { document, plan, patch, output } = prepare(request)?;

    document
        .save(&output)
        .map_err(|source| GenerateError::Write { path: output.clone(), source })?;
    log::info!("wrote {} incubation step(s) to {}", plan.steps.len(), output.display());

    Ok(GenerateReport { output, plan, patch })
}

pub fn load_template(path: &Path) -> Result<Document, GenerateError> {
    if !path.exists() {
        return Err(GenerateError::TemplateNotFound(path.to_path_buf()));
    }
    Document::load(path).map_err(|source| GenerateError::Template { path: path.to_path_buf(), source })
}

pub fn load_mapper(path: &Path) -> Result<DyeFilterMap, GenerateError> {
    if !path.exists() {
        return Err(GenerateError::MapperNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)
        .map_err(|source| GenerateError::MapperRead { path: path.to_path_buf(), source })?;
    let mapper = DyeFilterMap::from_json(&content)
        .map_err(|source| GenerateError::Mapper { path: path.to_path_buf(), source })?;
    log::debug!("loaded {} dye mapping(s) from {}", mapper.len(), path.display());
    Ok(mapper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::patch::read_run_setting;
    use stainplan_core::VisualFieldConfig;
    use stainplan_engine::ColumnMap;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    const TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<experimentRun xmlns="http://www.meltec.de/2004/xschema" xmlns:xlink="http://www.w3.org/1999/xlink">
  <runSetting>
    <stepCount>10</stepCount>
    <visualFieldCount>3</visualFieldCount>
    <visualFieldConfig><stack><imageCountNegative>1</imageCountNegative><imageCountPositive>1</imageCountPositive></stack></visualFieldConfig>
  </runSetting>
</experimentRun>
"#;

    const PLAN: &str = "\
Step,Marker,Dye,Well,Bleach
1,CD3,FITC,C7,1500
,CD4,PE,,250
,,,,
2,CD8,PE,,100
,CD20,Cy5,,0
3,CD45,FITC,,300
";

    fn layout() -> TableLayout {
        TableLayout {
            skip_rows: 1,
            required_column: 1,
            columns: ColumnMap { step_key: 0, marker: 1, dye: 2, well: 3, bleach_time: 4 },
            ..TableLayout::single_sheet()
        }
    }

    fn setup() -> (TempDir, GenerateRequest) {
        let dir = tempdir().unwrap();
        let template = dir.path().join("template.xml");
        let mapper = dir.path().join("mapper.json");
        let table = dir.path().join("plan.csv");
        fs::write(&template, TEMPLATE).unwrap();
        fs::write(&mapper, r#"{"FITC": "GFP", "PE": "PE", "Cy5": "Cy5"}"#).unwrap();
        fs::write(&table, PLAN).unwrap();
        let request = GenerateRequest {
            table,
            template,
            mapper,
            output: None,
            sheet: None,
            layout: layout(),
            run_setting: None,
        };
        (dir, request)
    }

    #[test]
    fn test_generate_writes_next_to_input() {
        let (dir, request) = setup();
        let report = generate(&request).unwrap();
        assert_eq!(report.output, dir.path().join("plan.xml"));
        assert_eq!(report.plan.steps.len(), 3);

        let doc = Document::load(&report.output).unwrap();
        let steps: Vec<_> = doc.root.children_named("incStep").collect();
        assert_eq!(steps.len(), 3);
        let numbers: Vec<&str> = steps.iter().filter_map(|s| s.attr("stepNumber")).collect();
        assert_eq!(numbers, vec!["1", "2", "3"]);

        // Step 1 {FITC, PE} -> step 2 {PE, Cy5}: prep Cy5
        let channels: Vec<_> = steps[0].children_named("channelStep").collect();
        assert_eq!(channels.len(), 3);
        let prep = channels[2].child("marker").unwrap();
        assert_eq!(prep.attr("name"), Some("PBS-Cy5_450"));
        assert_eq!(channels[2].child("bleachTime").unwrap().text(), "0");
    }

    #[test]
    fn test_run_setting_patches_and_limits_steps() {
        let (_dir, mut request) = setup();
        request.run_setting = Some(RunSetting {
            step_count: Some(2),
            visual_field_count: Some(5),
            visual_field_configs: vec![VisualFieldConfig {
                image_count_negative: Some(9),
                image_count_positive: None,
            }],
        });
        let prepared = prepare(&request).unwrap();
        assert_eq!(prepared.plan.steps.len(), 2);
        assert_eq!(prepared.plan.groups_found, 3);
        assert_eq!(prepared.patch.written, 3);

        let current = read_run_setting(&prepared.document.root);
        assert_eq!(current.step_count, Some(2));
        assert_eq!(current.visual_field_count, Some(5));
        assert_eq!(current.visual_field_configs[0].image_count_negative, Some(9));
        assert_eq!(current.visual_field_configs[0].image_count_positive, Some(1));
    }

    #[test]
    fn test_explicit_output_path() {
        let (dir, mut request) = setup();
        let out = dir.path().join("out").join("run.xml");
        fs::create_dir(dir.path().join("out")).unwrap();
        request.output = Some(out.clone());
        let report = generate(&request).unwrap();
        assert_eq!(report.output, out);
        assert!(out.exists());
        assert!(!dir.path().join("plan.xml").exists());
    }

    #[test]
    fn test_missing_inputs_are_fatal() {
        let (dir, mut request) = setup();
        request.template = dir.path().join("nope.xml");
        assert!(matches!(generate(&request), Err(GenerateError::TemplateNotFound(_))));

        let (dir, mut request) = setup();
        request.mapper = dir.path().join("nope.json");
        assert!(matches!(generate(&request), Err(GenerateError::MapperNotFound(_))));

        let (dir, mut request) = setup();
        request.table = dir.path().join("nope.csv");
        assert!(matches!(
            generate(&request),
            Err(GenerateError::Table(LoadError::NotFound(_)))
        ));
    }

    #[test]
    fn test_failure_leaves_existing_output_untouched() {
        let (dir, request) = setup();
        let out = dir.path().join("plan.xml");
        fs::write(&out, "previous").unwrap();
        fs::write(&request.table, "Step,Marker,Dye,Well,Bleach\n1,CD3,FITC,,soon\n").unwrap();

        let err = generate(&request).unwrap_err();
        assert!(matches!(err, GenerateError::Plan { .. }));
        assert_eq!(fs::read_to_string(&out).unwrap(), "previous");
    }

    #[test]
    fn test_malformed_template_names_path() {
        let (_dir, request) = setup();
        fs::write(&request.template, "<experimentRun><runSetting></experimentRun>").unwrap();
        let err = generate(&request).unwrap_err();
        assert!(matches!(err, GenerateError::Template { .. }));
        assert!(err.to_string().contains("template.xml"));
    }
}
