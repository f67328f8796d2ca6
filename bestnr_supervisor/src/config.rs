//! Optional JSON configuration file.
//!
//! Any field may be left out; missing fields take the core defaults:
//!
//! ```json
//! { "snr_threshold": 6.0, "sngl_thresh": 4.0, "chisq_threshold": null,
//!   "reweight": { "index": 4.0, "nhigh": 3.0 } }
//! ```

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use bestnr_core::BestNrCfg;

use crate::error::SupervisorResult;

pub fn cfg_from_reader<R: io::Read>(rdr: R) -> SupervisorResult<BestNrCfg> {
    let cfg: BestNrCfg = serde_json::from_reader(rdr)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_cfg(path: impl AsRef<Path>) -> SupervisorResult<BestNrCfg> {
    let file = File::open(path)?;
    cfg_from_reader(BufReader::new(file))
}
