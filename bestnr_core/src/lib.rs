pub mod cfg;
pub mod error;
pub mod event;
pub mod reweight;
pub mod evaluate;

pub use cfg::{BestNrCfg, ReweightParams};
pub use error::{BestNrError, BestNrResult};
pub use event::{CandidateEvent, ChisqFamily, Family};
pub use reweight::{reduced_chisq, reweight_family, reweighted_snr};
pub use evaluate::{Cut, Evaluation, Reweighted, Verdict, bestnr, evaluate, evaluate_detailed};
