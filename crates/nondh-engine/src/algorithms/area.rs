//! Area Unit Conversion
//!
//! Canonical area is square meters. Acre-guntha views exist for input and
//! display only; 1 acre = 40 gunthas, 1 guntha = 101.1714 sqm.

use crate::domain::value_objects::{
    AcreGuntha, AcreGunthaDisplay, Area, AreaUnit, GUNTHAS_PER_ACRE, SQM_PER_ACRE,
    SQM_PER_GUNTHA,
};

/// Convert a value in `unit` to canonical area.
pub fn to_square_meters(value: f64, unit: AreaUnit) -> Area {
    let sqm = match unit {
        AreaUnit::Acre => value * SQM_PER_ACRE,
        AreaUnit::Guntha => value * SQM_PER_GUNTHA,
    };
    Area::from_sqm(sqm)
}

/// Express canonical area in `unit`.
pub fn from_square_meters(area: Area, unit: AreaUnit) -> f64 {
    match unit {
        AreaUnit::Acre => area.sqm() / SQM_PER_ACRE,
        AreaUnit::Guntha => area.sqm() / SQM_PER_GUNTHA,
    }
}

/// Combine an acre-guntha pair into canonical area.
pub fn from_acre_guntha(value: AcreGuntha) -> Area {
    to_square_meters(value.acres as f64, AreaUnit::Acre)
        + to_square_meters(value.gunthas, AreaUnit::Guntha)
}

/// Exact acre-guntha split. Negative areas are treated as zero.
pub fn to_acre_guntha(area: Area) -> AcreGuntha {
    let total_gunthas = from_square_meters(area, AreaUnit::Guntha).max(0.0);
    let mut acres = (total_gunthas / GUNTHAS_PER_ACRE).floor();
    let mut gunthas = total_gunthas - acres * GUNTHAS_PER_ACRE;

    // float error can leave a whole acre as 39.999... gunthas
    if gunthas >= GUNTHAS_PER_ACRE - 1e-9 {
        acres += 1.0;
        gunthas -= GUNTHAS_PER_ACRE;
    }

    AcreGuntha {
        acres: acres as u64,
        gunthas: gunthas.max(0.0),
    }
}

/// Rounded acre-guntha view. A guntha count that rounds to 40 carries into acres.
pub fn to_display(area: Area) -> AcreGunthaDisplay {
    let total_acres = from_square_meters(area, AreaUnit::Acre).max(0.0);
    let mut acres = total_acres.floor() as u64;
    let mut gunthas = ((total_acres - acres as f64) * GUNTHAS_PER_ACRE).round() as u32;

    if gunthas as f64 >= GUNTHAS_PER_ACRE {
        acres += 1;
        gunthas = 0;
    }

    AcreGunthaDisplay { acres, gunthas }
}
