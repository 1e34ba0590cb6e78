// src/catalog/task.rs

use std::fmt;

use serde::Serialize;

/// Every task a workflow can contain.
///
/// The snake-case name doubles as the job script stem, the suffix of the
/// emitted task name (`gdas` + `fcst`) and the `[task.<name>]` section key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    CoupledIc,
    Getic,
    Getic4omg,
    Getfcst,
    Init,
    AerosolInit,
    Eget,
    Prep,
    Analinc,
    Atmanalprep,
    Atmanalrun,
    Atmanalpost,
    Anal,
    Analdiag,
    Sfcanl,
    Analcalc,
    Gldas,
    Waveinit,
    Waveprep,
    Fcst,
    Post,
    Ocnpost,
    Vrfy,
    Metp,
    Gomg,
    Archomg,
    Eobs,
    Eomg,
    Ediag,
    Eupd,
    Atmensanalprep,
    Atmensanalrun,
    Atmensanalpost,
    Echgres,
    Ecen,
    Esfc,
    Efcs,
    Epos,
    Earc,
    Wavepostsbs,
    Wavepostpnt,
    Wavepostbndpnt,
    Wavepostbndpntbll,
    Wavegempak,
    Waveawipsbulls,
    Waveawipsgridded,
    Postsnd,
    Gempak,
    Awips,
    Wafs,
    Wafsgcip,
    Wafsgrib2,
    Wafsgrib20p25,
    Wafsblending,
    Wafsblending0p25,
    Arch,
    Enspost,
    Ergpos,
    Archerg,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        use TaskKind::*;
        match self {
            CoupledIc => "coupled_ic",
            Getic => "getic",
            Getic4omg => "getic4omg",
            Getfcst => "getfcst",
            Init => "init",
            AerosolInit => "aerosol_init",
            Eget => "eget",
            Prep => "prep",
            Analinc => "analinc",
            Atmanalprep => "atmanalprep",
            Atmanalrun => "atmanalrun",
            Atmanalpost => "atmanalpost",
            Anal => "anal",
            Analdiag => "analdiag",
            Sfcanl => "sfcanl",
            Analcalc => "analcalc",
            Gldas => "gldas",
            Waveinit => "waveinit",
            Waveprep => "waveprep",
            Fcst => "fcst",
            Post => "post",
            Ocnpost => "ocnpost",
            Vrfy => "vrfy",
            Metp => "metp",
            Gomg => "gomg",
            Archomg => "archomg",
            Eobs => "eobs",
            Eomg => "eomg",
            Ediag => "ediag",
            Eupd => "eupd",
            Atmensanalprep => "atmensanalprep",
            Atmensanalrun => "atmensanalrun",
            Atmensanalpost => "atmensanalpost",
            Echgres => "echgres",
            Ecen => "ecen",
            Esfc => "esfc",
            Efcs => "efcs",
            Epos => "epos",
            Earc => "earc",
            Wavepostsbs => "wavepostsbs",
            Wavepostpnt => "wavepostpnt",
            Wavepostbndpnt => "wavepostbndpnt",
            Wavepostbndpntbll => "wavepostbndpntbll",
            Wavegempak => "wavegempak",
            Waveawipsbulls => "waveawipsbulls",
            Waveawipsgridded => "waveawipsgridded",
            Postsnd => "postsnd",
            Gempak => "gempak",
            Awips => "awips",
            Wafs => "wafs",
            Wafsgcip => "wafsgcip",
            Wafsgrib2 => "wafsgrib2",
            Wafsgrib20p25 => "wafsgrib20p25",
            Wafsblending => "wafsblending",
            Wafsblending0p25 => "wafsblending0p25",
            Arch => "arch",
            Enspost => "enspost",
            Ergpos => "ergpos",
            Archerg => "archerg",
        }
    }

    /// Data-movement tasks routed to the service queue.
    pub fn is_service(&self) -> bool {
        use TaskKind::*;
        matches!(
            self,
            Getic | Getic4omg | Getfcst | Arch | Archomg | Earc | Eget | Archerg
        )
    }

    /// Config sections layered over `[base]` for this task, in order.
    ///
    /// Ensemble and wave tasks share settings with a parent section.
    pub fn config_sections(&self) -> Vec<&'static str> {
        use TaskKind::*;
        match self {
            Eobs | Eomg | Ediag => vec!["anal", "eobs", self.as_str()],
            Eupd => vec!["anal", "eupd"],
            Efcs => vec!["fcst", "efcs"],
            Wavepostsbs | Wavepostpnt | Wavepostbndpnt | Wavepostbndpntbll | Wavegempak
            | Waveawipsbulls | Waveawipsgridded | Waveinit | Waveprep => {
                vec!["wave", self.as_str()]
            }
            _ => vec![self.as_str()],
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
