//! Time-stepping and convergence parameters from TUNING.

use crate::deck::DeckKeyword;
use crate::error::DeckError;
use crate::item::DeckItem;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tuning {
    // record 1: time stepping
    pub tsinit: f64,
    pub tsmaxz: f64,
    pub tsminz: f64,
    pub tsmchp: f64,
    pub tsfmax: f64,
    pub tsfmin: f64,
    pub tsfcnv: f64,
    pub tfdiff: f64,
    pub thrupt: f64,
    pub tmaxwc: Option<f64>,
    // record 2: truncation and convergence targets
    pub trgtte: f64,
    pub trgcnv: f64,
    pub trgmbe: f64,
    pub trglcv: f64,
    pub xxxtte: f64,
    pub xxxcnv: f64,
    pub xxxmbe: f64,
    pub xxxlcv: f64,
    pub xxxwfl: f64,
    pub trgfip: f64,
    pub trgsft: Option<f64>,
    pub thionx: f64,
    pub trwght: i64,
    // record 3: iteration limits
    pub newtmx: i64,
    pub newtmn: i64,
    pub litmax: i64,
    pub litmin: i64,
    pub mxwsit: i64,
    pub mxwpit: i64,
    pub ddplim: f64,
    pub ddslim: f64,
    pub trgdpr: f64,
    pub xxxdpr: Option<f64>,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            tsinit: 1.0,
            tsmaxz: 365.0,
            tsminz: 0.1,
            tsmchp: 0.15,
            tsfmax: 3.0,
            tsfmin: 0.3,
            tsfcnv: 0.1,
            tfdiff: 1.25,
            thrupt: 1e20,
            tmaxwc: None,
            trgtte: 0.1,
            trgcnv: 0.001,
            trgmbe: 1e-7,
            trglcv: 0.0001,
            xxxtte: 10.0,
            xxxcnv: 0.01,
            xxxmbe: 1e-6,
            xxxlcv: 0.001,
            xxxwfl: 0.001,
            trgfip: 0.025,
            trgsft: None,
            thionx: 0.01,
            trwght: 1,
            newtmx: 12,
            newtmn: 1,
            litmax: 25,
            litmin: 1,
            mxwsit: 8,
            mxwpit: 8,
            ddplim: 1e6,
            ddslim: 1e6,
            trgdpr: 1e6,
            xxxdpr: None,
        }
    }
}

impl Tuning {
    /// Read all three records. Defaulted items without a schema default
    /// keep the built-in value.
    pub fn from_keyword(keyword: &DeckKeyword) -> Result<Tuning, DeckError> {
        let mut tuning = Tuning::default();
        for (index, record) in keyword.iter().enumerate() {
            for item in record.iter() {
                if !item.has_value(0) {
                    continue;
                }
                tuning.set(index, item)?;
            }
        }
        Ok(tuning)
    }

    fn set(&mut self, record: usize, item: &DeckItem) -> Result<(), DeckError> {
        match (record, item.name()) {
            (0, "TSINIT") => self.tsinit = item.get_double(0)?,
            (0, "TSMAXZ") => self.tsmaxz = item.get_double(0)?,
            (0, "TSMINZ") => self.tsminz = item.get_double(0)?,
            (0, "TSMCHP") => self.tsmchp = item.get_double(0)?,
            (0, "TSFMAX") => self.tsfmax = item.get_double(0)?,
            (0, "TSFMIN") => self.tsfmin = item.get_double(0)?,
            (0, "TSFCNV") => self.tsfcnv = item.get_double(0)?,
            (0, "TFDIFF") => self.tfdiff = item.get_double(0)?,
            (0, "THRUPT") => self.thrupt = item.get_double(0)?,
            (0, "TMAXWC") => self.tmaxwc = Some(item.get_double(0)?),
            (1, "TRGTTE") => self.trgtte = item.get_double(0)?,
            (1, "TRGCNV") => self.trgcnv = item.get_double(0)?,
            (1, "TRGMBE") => self.trgmbe = item.get_double(0)?,
            (1, "TRGLCV") => self.trglcv = item.get_double(0)?,
            (1, "XXXTTE") => self.xxxtte = item.get_double(0)?,
            (1, "XXXCNV") => self.xxxcnv = item.get_double(0)?,
            (1, "XXXMBE") => self.xxxmbe = item.get_double(0)?,
            (1, "XXXLCV") => self.xxxlcv = item.get_double(0)?,
            (1, "XXXWFL") => self.xxxwfl = item.get_double(0)?,
            (1, "TRGFIP") => self.trgfip = item.get_double(0)?,
            (1, "TRGSFT") => self.trgsft = Some(item.get_double(0)?),
            (1, "THIONX") => self.thionx = item.get_double(0)?,
            (1, "TRWGHT") => self.trwght = item.get_int(0)?,
            (2, "NEWTMX") => self.newtmx = item.get_int(0)?,
            (2, "NEWTMN") => self.newtmn = item.get_int(0)?,
            (2, "LITMAX") => self.litmax = item.get_int(0)?,
            (2, "LITMIN") => self.litmin = item.get_int(0)?,
            (2, "MXWSIT") => self.mxwsit = item.get_int(0)?,
            (2, "MXWPIT") => self.mxwpit = item.get_int(0)?,
            (2, "DDPLIM") => self.ddplim = item.get_double(0)?,
            (2, "DDSLIM") => self.ddslim = item.get_double(0)?,
            (2, "TRGDPR") => self.trgdpr = item.get_double(0)?,
            (2, "XXXDPR") => self.xxxdpr = Some(item.get_double(0)?),
            _ => {}
        }
        Ok(())
    }
}
