// src/catalog/flags.rs

use crate::config::ConfigScope;
use crate::errors::{CycledagError, Result};
use crate::types::CycleGroup;

/// Feature switches that decide which tasks an experiment contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureFlags {
    pub app: String,
    pub coupled: bool,
    pub do_atm: bool,
    pub do_wave: bool,
    pub do_wave_bnd: bool,
    pub do_ocean: bool,
    pub do_ice: bool,
    pub do_aero: bool,
    pub do_hybvar: bool,
    pub do_jedivar: bool,
    pub do_jediens: bool,
    pub do_gldas: bool,
    pub do_bufrsnd: bool,
    pub do_gempak: bool,
    pub do_awips: bool,
    pub do_wafs: bool,
    pub do_vrfy: bool,
    pub do_metp: bool,
    pub do_post: bool,
    pub do_hpssarch: bool,
    pub do_tref: bool,
    pub do_omf: bool,
    pub do_analinc: bool,
    pub do_gcycle: bool,
    pub rungcycle: bool,
    pub do_chgres_fcst: bool,
    pub ensreplay: bool,
    pub gfsanl: bool,
    pub gdaspost: bool,
    pub warm_start: bool,
    pub lobsdiag_forenkf: bool,
    pub replay: i64,
    pub icdump: String,
    pub wave_groups: Vec<CycleGroup>,
    pub eupd_groups: Vec<CycleGroup>,
}

impl FeatureFlags {
    pub fn from_scope(base: &ConfigScope) -> Result<Self> {
        let app = base.string_or("APP", "ATM").to_uppercase();
        let coupled = app.starts_with("S2S");
        let do_wave = base.flag("DO_WAVE", app.contains('W'))?;
        let do_aero = base.flag("DO_AERO", app.ends_with('A'))?;

        Ok(Self {
            coupled,
            do_atm: base.flag("DO_ATM", true)?,
            do_wave,
            do_wave_bnd: base.flag("DOBNDPNT_WAVE", false)?,
            do_ocean: base.flag("DO_OCN", coupled)?,
            do_ice: base.flag("DO_ICE", coupled)?,
            do_aero,
            do_hybvar: base.flag("DOHYBVAR", false)?,
            do_jedivar: base.flag("DO_JEDIVAR", false)?,
            do_jediens: base.flag("DO_JEDIENS", false)?,
            do_gldas: base.flag("DO_GLDAS", false)?,
            do_bufrsnd: base.flag("DO_BUFRSND", false)?,
            do_gempak: base.flag("DO_GEMPAK", false)?,
            do_awips: base.flag("DO_AWIPS", false)?,
            do_wafs: base.flag("WAFSF", false)?,
            do_vrfy: base.flag("DO_VRFY", true)?,
            do_metp: base.flag("DO_METP", false)?,
            do_post: base.flag("DO_POST", true)?,
            do_hpssarch: base.flag("HPSSARCH", false)?,
            do_tref: base.flag("DO_TREF_TILE", false)?,
            do_omf: base.flag("DO_OmF", false)?,
            do_analinc: base.flag("do_analinc", false)?,
            do_gcycle: base.flag("DOGCYCLE", true)?,
            rungcycle: base.flag("rungcycle", true)?,
            do_chgres_fcst: base.flag("DO_CHGRES_FCST", false)?,
            ensreplay: base.flag("ENSREPLAY", false)?,
            gfsanl: base.flag("gfsanl", false)?,
            gdaspost: base.flag("gdaspost", false)?,
            warm_start: base.flag("EXP_WARM_START", false)?,
            lobsdiag_forenkf: base.flag("lobsdiag_forenkf", false)?,
            replay: base.int_or("replay", 1)?,
            icdump: base.string_or("ICDUMP", "gdas"),
            wave_groups: group_list(base, "WAVE_CDUMP", "gdas")?,
            eupd_groups: group_list(base, "EUPD_CYC", "gdas")?,
            app,
        })
    }

    pub fn waves_in(&self, group: CycleGroup) -> bool {
        self.do_wave && self.wave_groups.contains(&group)
    }

    pub fn ensemble_update_in(&self, group: CycleGroup) -> bool {
        self.do_hybvar && self.eupd_groups.contains(&group)
    }
}

/// `gdas`, `gfs` or `both`.
fn group_list(base: &ConfigScope, key: &str, default: &str) -> Result<Vec<CycleGroup>> {
    let text = base.string_or(key, default);
    match text.trim().to_lowercase().as_str() {
        "both" => Ok(vec![CycleGroup::Gdas, CycleGroup::Gfs]),
        "gdas" => Ok(vec![CycleGroup::Gdas]),
        "gfs" => Ok(vec![CycleGroup::Gfs]),
        _ => Err(CycledagError::invalid(key, text, "gdas, gfs or both")),
    }
}
