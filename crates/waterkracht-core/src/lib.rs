//! Domeinmodellen voor de waardering van pompaccumulatiecentrales.
//!
//! Deze crate bevat de pure datamodellen: het fysieke centralemodel met
//! simulatietoestand, het marktgrootboek met de drie cashflowpotten en de
//! prijsreeksen voor day-ahead en intraday. De optimalisatie- en
//! waarderingslogica leeft in `waterkracht-handel`.

pub mod centrale;
pub mod markt;
pub mod prijzen;

pub use centrale::{Actie, CentraleFout, CentraleToestand, Pompcentrale};
pub use markt::{IntradayMarkt, Markt};
pub use prijzen::{blokgemiddelde, PrijsFout, Prijsreeks};
