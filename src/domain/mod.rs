pub mod deadline;
pub mod fields;
pub mod numbering;
pub mod offer;
