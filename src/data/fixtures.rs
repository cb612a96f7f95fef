//! In-memory CSV fixtures shaped like the four real source files.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::io::{self, Cursor, Read};

use super::loader::TableSource;
use super::registry::{DatasetDef, DatasetId};

/// Rows in [`VGSALES_CSV`] after the all-empty record is dropped.
pub const VGSALES_ROWS: usize = 12;

/// Regional columns add up exactly to `Global_Sales` on every row.
pub const VGSALES_CSV: &str = "\
Rank,Name,Platform,Year,Genre,Publisher,NA_Sales,EU_Sales,JP_Sales,Other_Sales,Global_Sales
1,Wii Sports,Wii,2006,Sports,Nintendo,40.0,28.0,3.5,8.5,80.0
2,Super Mario Bros.,NES,1985,Platform,Nintendo,29.0,3.5,6.75,0.75,40.0
3,Mario Kart Wii,Wii,2008,Racing,Nintendo,15.75,12.75,3.75,3.25,35.5
4,Wii Sports Resort,Wii,2009,Sports,Nintendo,15.75,11.0,3.25,3.0,33.0
5,FIFA 06,PS2,2005,Sports,Electronic Arts,0.5,3.0,0.25,0.25,4.0
6,Madden NFL 06,PS2,2005,Sports,Electronic Arts,4.5,0.25,0.0,0.25,5.0
7,Fight Night Round 3,X360,2006,Sports,Electronic Arts,1.0,0.5,0.0,0.5,2.0
8,Halo 3,X360,2007,Shooter,Microsoft Game Studios,7.0,2.0,0.0,1.0,10.0
9,Madden NFL 2004,PS2,N/A,Sports,Electronic Arts,4.25,0.25,0.0,0.5,5.0
,,,,,,,,,,
10,Gran Turismo 4,PS2,2005,Racing,Sony Computer Entertainment,3.0,4.0,1.0,2.0,10.0
11,\"Tony Hawk's Pro Skater, Remix\",PS,2006,Sports,Activision,1.25,0.25,0.25,0.25,2.0
12,Unknown Sports,PC,2006,Sports,,0.25,0.25,0.0,0.0,0.5
";

pub const TAXPAYERS_CSV: &str = "\
Regcode,Name,Registrets,Izslegts,Aktivs
40003000001,SIA Alfa, 01.09.2010,,ir
40003000002,SIA Beta,15.03.2011,31.12.2015,nav
40003000003,SIA Gamma,20.07.2011,,ir
40003000004,SIA Delta,02.02.2012,01.08.2014,nav
40003000005,SIA Epsilon,not a date,,ir
";

pub const COUPLES_CSV: &str = "\
caseid_new,q24_met_online,relationship_quality,how_long_relationship,age_difference
1,met online,excellent,2.5,3
2,met offline,good,10.25,1
3,met offline,excellent,20,0
4,met online,good,1.5,5
5,met offline,fair,,2
";

pub const EV_CSV: &str = "\
region,category,parameter,mode,powertrain,year,unit,value
World,Historical,EV sales,Cars,BEV,2020,Vehicles,2000000
World,Historical,EV sales,Cars,PHEV,2020,Vehicles,1000000
World,Historical,EV sales,Cars,BEV,2021,Vehicles,4600000
World,Historical,EV sales,Cars,PHEV,2021,Vehicles,1900000
World,Historical,EV sales share,Cars,EV,2020,percent,4.2
World,Historical,EV sales share,Cars,EV,2021,percent,8.7
World,Historical,EV stock share,Cars,EV,2021,percent,1.5
World,Historical,EV stock,Cars,BEV,2020,Vehicles,6800000
World,Historical,EV stock,Cars,BEV,2021,Vehicles,11000000
World,Historical,EV stock,Cars,PHEV,2021,Vehicles,5000000
Norway,Historical,EV sales,Cars,BEV,2021,Vehicles,110000
Norway,Historical,EV sales share,Cars,EV,2021,percent,86
Norway,Historical,EV stock share,Cars,EV,2021,percent,22
China,Historical,EV sales,Cars,BEV,2021,Vehicles,2700000
China,Historical,EV sales share,Cars,EV,2021,percent,16
China,Historical,EV stock share,Cars,EV,2020,percent,1.8
";

/// A [`TableSource`] backed by byte buffers. Counts every `open` call so
/// tests can check that cached tables are not re-read.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: BTreeMap<&'static str, Vec<u8>>,
    reads: Cell<usize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// All four datasets.
    pub fn with_fixtures() -> Self {
        Self::new()
            .with_file(DatasetId::VideoGameSales.def().file, VGSALES_CSV)
            .with_file(DatasetId::MicroenterpriseTaxpayers.def().file, TAXPAYERS_CSV)
            .with_file(DatasetId::CouplesSurvey.def().file, COUPLES_CSV)
            .with_file(DatasetId::EvSales.def().file, EV_CSV)
    }

    pub fn with_file(self, name: &'static str, contents: &str) -> Self {
        self.with_bytes(name, contents.as_bytes().to_vec())
    }

    pub fn with_bytes(mut self, name: &'static str, contents: Vec<u8>) -> Self {
        self.files.insert(name, contents);
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.files.remove(name);
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl TableSource for MemorySource {
    fn location(&self, def: &DatasetDef) -> String {
        format!("memory:{}", def.file)
    }

    fn open(&self, def: &DatasetDef) -> io::Result<Box<dyn Read + '_>> {
        self.reads.set(self.reads.get() + 1);
        let bytes = self
            .files
            .get(def.file)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, def.file))?;
        Ok(Box::new(Cursor::new(bytes.as_slice())))
    }
}
