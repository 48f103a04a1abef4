#![allow(dead_code)]

use chrono::NaiveDate;
use metacat_core::{Calculation, Model, Project, Region, Run, Units, Variable};

pub struct Scenario {
    pub project: Project,
    pub model: Model,
    pub run: Run,
    pub units: Units,
    pub variable: Variable,
    pub region: Region,
    pub calc: Calculation,
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Project `P` owning Model `M` owning Run `R`; Calculation `C` on `R`,
/// Variable `V` (Units `U`) and Region `G`.
pub fn scenario() -> Scenario {
    let project = Project::new("aero_3agcm", "/archive/Spencer.Hill/aero_3agcm/");
    let model = Model::new("am3", "AM3 atmosphere", project.clone());
    let mut run = Run::new("hurrell_cont", "Hurrell climatological SST", model.clone());
    run.start_date = Some(date(1981, 1, 1));
    run.end_date = Some(date(2000, 12, 31));
    run.input_directory = Some("/archive/am3/hurrell_cont/pp".to_string());
    let units = Units::new("K");
    let variable = Variable::new("t_surf", "Surface temperature", units.clone());
    let region = Region::new("globe", "Entire globe");
    let calc = Calculation::new(run.clone(), variable.clone(), date(1983, 1, 1), date(1998, 12, 31))
        .with_region(region.clone());

    Scenario {
        project,
        model,
        run,
        units,
        variable,
        region,
        calc,
    }
}
